//! Control-flow graph of a function's body, lowered straight from the
//! statement list. Nodes and edges live in index-based arenas.

use std::collections::VecDeque;
use std::io;

use crate::diagnostics::Span;
use crate::ir::{Action, Function, Stmt, StmtKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Start,
    Return,
    ImplicitReturn,
    Statement {
        action: Action,
        span: Option<Span>,
    },
    /// Connected to two successors, picked by a condition.
    ConditionalGoto,
}

impl Node {
    fn label(&self) -> String {
        match self {
            Node::Start => "Start".into(),
            Node::Return => "Return".into(),
            Node::ImplicitReturn => "ImplicitReturn".into(),
            Node::Statement { action, .. } => action.to_string(),
            Node::ConditionalGoto => "ConditionalGoto".into(),
        }
    }
}

/// Edge payload. Branch edges carry the polarity of the condition they
/// follow; plain fallthrough edges carry nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Seq,
    Branch(bool),
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Edge::Seq => "",
            Edge::Branch(true) => "if true",
            Edge::Branch(false) => "if false",
        })
    }
}

pub struct Cfg {
    nodes: Vec<Node>,
    edges: Vec<(NodeId, NodeId, Edge)>,
    start: NodeId,
}

impl Cfg {
    /// Lowers a function body. Statements chain backwards onto their
    /// successor; `if` introduces a conditional node with one edge per
    /// branch; `for` introduces a conditional heading the loop with the body
    /// looping back to it; `break` jumps to the loop's exit and `return` to a
    /// dedicated return node.
    pub fn build(func: &Function) -> Cfg {
        let mut cfg = Cfg {
            nodes: Vec::new(),
            edges: Vec::new(),
            start: NodeId(0),
        };

        let start = cfg.add_node(Node::Start);
        let exit = cfg.add_node(Node::ImplicitReturn);

        let entry = cfg.lower_block(&func.body, exit, exit);
        cfg.add_edge(start, entry, Edge::Seq);
        cfg.start = start;

        cfg
    }

    fn lower_block(&mut self, stmts: &[Stmt], next: NodeId, break_to: NodeId) -> NodeId {
        stmts.iter().rfold(next, |next, stmt| match &stmt.kind {
            StmtKind::Action(action) => {
                let node = self.add_node(Node::Statement {
                    action: action.clone(),
                    span: stmt.span.clone(),
                });
                self.add_edge(node, next, Edge::Seq);
                node
            }
            StmtKind::If { then, els } => {
                let node = self.add_node(Node::ConditionalGoto);

                let then_start = self.lower_block(then, next, break_to);
                let else_start = if els.is_empty() {
                    next
                } else {
                    self.lower_block(els, next, break_to)
                };

                self.add_edge(node, then_start, Edge::Branch(true));
                self.add_edge(node, else_start, Edge::Branch(false));

                node
            }
            StmtKind::For { body } => {
                let condition = self.add_node(Node::ConditionalGoto);

                // the body falls through back to the condition; `break`
                // inside it targets the loop's exit
                let body_start = self.lower_block(body, condition, next);

                self.add_edge(condition, body_start, Edge::Branch(true));
                self.add_edge(condition, next, Edge::Branch(false));

                condition
            }
            StmtKind::Break => break_to,
            StmtKind::Return => self.add_node(Node::Return),
        })
    }

    fn add_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    fn add_edge(&mut self, from: NodeId, to: NodeId, edge: Edge) {
        self.edges.push((from, to, edge));
    }

    pub fn start(&self) -> NodeId {
        self.start
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i as u32), n))
    }

    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.edges.iter().map(|&(a, b, _)| (a, b))
    }

    pub fn successors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.edges
            .iter()
            .filter(move |&&(from, _, _)| from == id)
            .map(|&(_, to, _)| to)
    }

    /// Nodes reachable from `from` by one or more edges. `from` itself is
    /// included only when it sits on a cycle.
    pub fn reachable_from(&self, from: NodeId) -> Vec<bool> {
        let mut seen = vec![false; self.nodes.len()];
        let mut queue: VecDeque<NodeId> = self.successors(from).collect();

        while let Some(node) = queue.pop_front() {
            if seen[node.index()] {
                continue;
            }
            seen[node.index()] = true;
            queue.extend(self.successors(node));
        }

        seen
    }

    pub fn write_dot(&self, mut write: impl io::Write) -> io::Result<()> {
        writeln!(write, "digraph {{")?;
        for (id, node) in self.nodes() {
            writeln!(write, "    {} [ label = \"{}\" ]", id.0, node.label())?;
        }
        for (from, to, edge) in &self.edges {
            writeln!(write, "    {} -> {} [ label = \"{}\" ]", from.0, to.0, edge)?;
        }
        writeln!(write, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Var;

    fn action_nodes(cfg: &Cfg) -> Vec<(NodeId, Action)> {
        cfg.nodes()
            .filter_map(|(id, n)| match n {
                Node::Statement { action, .. } => Some((id, action.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn straight_line_chains_in_order() {
        let mut f = Function::new("f");
        let a = f.local("a");
        let b = f.local("b");
        f.body = vec![
            Stmt::action(Action::Assign(a)),
            Stmt::action(Action::Use(a)),
            Stmt::action(Action::Assign(b)),
        ];

        let cfg = Cfg::build(&f);
        let actions = action_nodes(&cfg);
        assert_eq!(actions.len(), 3);

        // Start -> assign a -> use a -> assign b -> ImplicitReturn
        let assign_a = actions
            .iter()
            .find(|(_, a_)| *a_ == Action::Assign(a))
            .unwrap()
            .0;
        let reach = cfg.reachable_from(assign_a);
        for (id, action) in &actions {
            if *action != Action::Assign(a) {
                assert!(reach[id.index()], "{:?} not reachable", action);
            }
        }
    }

    #[test]
    fn if_branches_both_reach_the_join() {
        let mut f = Function::new("f");
        let x = f.local("x");
        f.body = vec![
            Stmt::if_else(
                vec![Stmt::action(Action::Use(x))],
                vec![Stmt::action(Action::Assign(x))],
            ),
            Stmt::action(Action::Use(x)),
        ];

        let cfg = Cfg::build(&f);
        let conds: Vec<_> = cfg
            .nodes()
            .filter(|(_, n)| matches!(n, Node::ConditionalGoto))
            .collect();
        assert_eq!(conds.len(), 1);

        let cond = conds[0].0;
        assert_eq!(cfg.successors(cond).count(), 2);

        // every action is reachable from the condition
        let reach = cfg.reachable_from(cond);
        for (id, _) in action_nodes(&cfg) {
            assert!(reach[id.index()]);
        }
    }

    #[test]
    fn loop_body_loops_back_and_break_exits() {
        let mut f = Function::new("f");
        let x = f.local("x");
        f.body = vec![
            Stmt::loop_for(vec![
                Stmt::action(Action::Assign(x)),
                Stmt::if_else(vec![Stmt::brk()], vec![]),
            ]),
            Stmt::action(Action::Use(x)),
        ];

        let cfg = Cfg::build(&f);
        let assign = action_nodes(&cfg)
            .iter()
            .find(|(_, a)| *a == Action::Assign(x))
            .unwrap()
            .0;

        // the body node sits on the loop cycle, so it reaches itself
        let reach = cfg.reachable_from(assign);
        assert!(reach[assign.index()]);

        // and the statement after the loop is reachable through the break
        let use_node = action_nodes(&cfg)
            .iter()
            .find(|(_, a)| *a == Action::Use(x))
            .unwrap()
            .0;
        assert!(reach[use_node.index()]);
    }

    #[test]
    fn return_node_has_no_successors() {
        let mut f = Function::new("f");
        let x = f.local("x");
        f.body = vec![Stmt::ret(), Stmt::action(Action::Use(x))];

        let cfg = Cfg::build(&f);
        let ret = cfg
            .nodes()
            .find(|(_, n)| matches!(n, Node::Return))
            .unwrap()
            .0;
        assert_eq!(cfg.successors(ret).count(), 0);

        // the statement after the return is dead
        let reach = cfg.reachable_from(cfg.start());
        let use_node = action_nodes(&cfg)[0].0;
        assert_eq!(action_nodes(&cfg)[0].1, Action::Use(Var(0)));
        assert!(!reach[use_node.index()]);
    }

    #[test]
    fn dot_output_names_every_node() {
        let mut f = Function::new("f");
        let x = f.local("x");
        f.body = vec![Stmt::loop_for(vec![Stmt::action(Action::Use(x))])];

        let cfg = Cfg::build(&f);
        let mut out = Vec::new();
        cfg.write_dot(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("digraph {"));
        assert!(text.contains("label = \"Start\""));
        assert!(text.contains("label = \"use v0\""));
        assert!(text.contains("if true"));
    }
}
