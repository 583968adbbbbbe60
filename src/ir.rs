//! Miniature statement IR the checker runs on. Programs are built
//! programmatically; there is no surface-language parser.

use std::fmt;

use crate::diagnostics::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FnId(pub u32);

/// A local variable or parameter, an index into its function's local table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Var(pub u32);

/// A loan, which is just an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Loan(pub u32);

/// How a value is handed to a callee, mirroring `[move]` / `[mutable]`
/// style parameter annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassMode {
    Move,
    Borrow,
    BorrowMut,
}

impl fmt::Display for PassMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PassMode::Move => "move",
            PassMode::Borrow => "ref",
            PassMode::BorrowMut => "mut",
        })
    }
}

/// A straight-line statement. Control flow lives in [StmtKind].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Write to a variable, overwriting whatever it held.
    Assign(Var),
    /// Read a variable.
    Use(Var),
    /// `dest = &source`, issuing the given loan.
    Borrow { source: Var, dest: Var, loan: Loan },
    /// Move a variable's value out without a call.
    MoveOut(Var),
    Call {
        callee: String,
        args: Vec<(Var, PassMode)>,
    },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Assign(v) => write!(f, "assign v{}", v.0),
            Action::Use(v) => write!(f, "use v{}", v.0),
            Action::Borrow { source, dest, loan } => {
                write!(f, "v{} = &v{} [L{}]", dest.0, source.0, loan.0)
            }
            Action::MoveOut(v) => write!(f, "move v{}", v.0),
            Action::Call { callee, args } => {
                write!(f, "call {}(", callee)?;
                for (i, (v, mode)) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} v{}", mode, v.0)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StmtKind {
    Action(Action),
    If { then: Vec<Stmt>, els: Vec<Stmt> },
    For { body: Vec<Stmt> },
    Break,
    Return,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Option<Span>,
}

impl Stmt {
    pub fn action(action: Action) -> Self {
        Stmt {
            kind: StmtKind::Action(action),
            span: None,
        }
    }

    pub fn if_else(then: Vec<Stmt>, els: Vec<Stmt>) -> Self {
        Stmt {
            kind: StmtKind::If { then, els },
            span: None,
        }
    }

    pub fn loop_for(body: Vec<Stmt>) -> Self {
        Stmt {
            kind: StmtKind::For { body },
            span: None,
        }
    }

    pub fn brk() -> Self {
        Stmt {
            kind: StmtKind::Break,
            span: None,
        }
    }

    pub fn ret() -> Self {
        Stmt {
            kind: StmtKind::Return,
            span: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }
}

pub struct Function {
    pub name: String,
    /// Parameters, a prefix of the local table.
    pub params: Vec<(Var, PassMode)>,
    pub body: Vec<Stmt>,
    locals: Vec<String>,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Function {
            name: name.into(),
            params: Vec::new(),
            body: Vec::new(),
            locals: Vec::new(),
        }
    }

    pub fn param(&mut self, name: impl Into<String>, mode: PassMode) -> Var {
        let var = self.local(name);
        self.params.push((var, mode));
        var
    }

    pub fn local(&mut self, name: impl Into<String>) -> Var {
        let var = Var(self.locals.len() as u32);
        self.locals.push(name.into());
        var
    }

    pub fn var_name(&self, var: Var) -> &str {
        &self.locals[var.0 as usize]
    }

    pub fn local_count(&self) -> usize {
        self.locals.len()
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn {}(", self.name)?;
        for (i, (var, mode)) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} {}", mode, self.var_name(*var))?;
        }
        writeln!(f, ") {{")?;
        print_block(f, &self.body, 1)?;
        write!(f, "}}")
    }
}

fn print_block(f: &mut fmt::Formatter<'_>, stmts: &[Stmt], indent: usize) -> fmt::Result {
    for stmt in stmts {
        for _ in 0..indent {
            write!(f, "    ")?;
        }
        match &stmt.kind {
            StmtKind::Action(action) => writeln!(f, "{};", action)?,
            StmtKind::If { then, els } => {
                writeln!(f, "if {{")?;
                print_block(f, then, indent + 1)?;
                if !els.is_empty() {
                    for _ in 0..indent {
                        write!(f, "    ")?;
                    }
                    writeln!(f, "}} else {{")?;
                    print_block(f, els, indent + 1)?;
                }
                for _ in 0..indent {
                    write!(f, "    ")?;
                }
                writeln!(f, "}}")?;
            }
            StmtKind::For { body } => {
                writeln!(f, "for {{")?;
                print_block(f, body, indent + 1)?;
                for _ in 0..indent {
                    write!(f, "    ")?;
                }
                writeln!(f, "}}")?;
            }
            StmtKind::Break => writeln!(f, "break;")?,
            StmtKind::Return => writeln!(f, "return;")?,
        }
    }
    Ok(())
}

#[derive(Default)]
pub struct Program {
    functions: Vec<Function>,
}

impl Program {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_function(&mut self, function: Function) -> FnId {
        let id = FnId(self.functions.len() as u32);
        self.functions.push(function);
        id
    }

    pub fn function(&self, id: FnId) -> &Function {
        &self.functions[id.0 as usize]
    }

    pub fn functions(&self) -> impl Iterator<Item = (FnId, &Function)> {
        self.functions
            .iter()
            .enumerate()
            .map(|(i, f)| (FnId(i as u32), f))
    }

    /// The `index`-th function with the given name, counting from zero.
    pub fn find(&self, name: &str, index: u32) -> Option<FnId> {
        self.functions()
            .filter(|(_, f)| f.name == name)
            .map(|(id, _)| id)
            .nth(index as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locals_and_params() {
        let mut f = Function::new("f");
        let a = f.param("a", PassMode::Move);
        let b = f.local("b");

        assert_eq!(a, Var(0));
        assert_eq!(b, Var(1));
        assert_eq!(f.var_name(a), "a");
        assert_eq!(f.var_name(b), "b");
        assert_eq!(f.params, vec![(a, PassMode::Move)]);
    }

    #[test]
    fn find_by_name_and_index() {
        let mut p = Program::new();
        let a = p.add_function(Function::new("f"));
        let b = p.add_function(Function::new("g"));
        let c = p.add_function(Function::new("f"));

        assert_eq!(p.find("f", 0), Some(a));
        assert_eq!(p.find("f", 1), Some(c));
        assert_eq!(p.find("g", 0), Some(b));
        assert_eq!(p.find("f", 2), None);
        assert_eq!(p.find("h", 0), None);
    }

    #[test]
    fn function_printer() {
        let mut f = Function::new("demo");
        let x = f.param("x", PassMode::Move);
        f.body = vec![
            Stmt::action(Action::Use(x)),
            Stmt::loop_for(vec![Stmt::if_else(vec![Stmt::brk()], vec![])]),
            Stmt::ret(),
        ];

        let text = f.to_string();
        assert!(text.starts_with("fn demo(move x) {"));
        assert!(text.contains("use v0;"));
        assert!(text.contains("break;"));
    }
}
