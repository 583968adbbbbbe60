//! The built-in demo: a list drained once for real, and the same program
//! modeled in the IR where the drain happens twice so the checker has
//! something to catch.

use crate::borrowck::{BorrowChecker, CheckError};
use crate::cfg::Cfg;
use crate::diagnostics::Span;
use crate::facts::AnalysisFacts;
use crate::ir::{Action, FnId, Function, PassMode, Program, Stmt};
use crate::list::{BoundedList, DEMO_CAPACITY};
use crate::sum::{clamped_triangular_sum, SumOutcome};

pub const DEMO_FILE: &str = "demo";

/// Listing the demo program's spans point into.
pub const DEMO_LISTING: &str = "\
fn list_into_inner(move self, mut dest);

fn clamped_sum(until) {
    let sum = 0;
    for i in 0..until {
        sum = sum + i;
        if sum == 42 {
            break;
        }
    }
    return sum;
}

fn main() {
    let list = bounded_list(1, 2, 3);
    let dest1 = buffer(256);
    list_into_inner(list, dest1);
    let dest2 = buffer(256);
    list_into_inner(list, dest2);
}
";

fn at(line: u32, cols: std::ops::Range<u32>) -> Span {
    Span::new(DEMO_FILE, line, cols)
}

/// Builds the demo program. `main` drains the same list twice, passing it by
/// move both times; the checker is expected to reject the second call.
pub fn demo_program() -> Program {
    let mut program = Program::new();

    let mut drain = Function::new("list_into_inner");
    drain.param("self", PassMode::Move);
    drain.param("dest", PassMode::BorrowMut);
    program.add_function(drain);

    let mut sum = Function::new("clamped_sum");
    sum.param("until", PassMode::Move);
    let s = sum.local("sum");
    sum.body = vec![
        Stmt::action(Action::Assign(s)).with_span(at(4, 9..12)),
        Stmt::loop_for(vec![
            Stmt::action(Action::Assign(s)).with_span(at(6, 9..12)),
            Stmt::if_else(vec![Stmt::brk()], vec![]),
        ]),
        Stmt::ret(),
    ];
    program.add_function(sum);

    let mut main = Function::new("main");
    let list = main.local("list");
    let dest1 = main.local("dest1");
    let dest2 = main.local("dest2");
    main.body = vec![
        Stmt::action(Action::Assign(list)).with_span(at(15, 9..13)),
        Stmt::action(Action::Assign(dest1)).with_span(at(16, 9..14)),
        Stmt::action(Action::Call {
            callee: "list_into_inner".into(),
            args: vec![(list, PassMode::Move), (dest1, PassMode::BorrowMut)],
        })
        .with_span(at(17, 21..25)),
        Stmt::action(Action::Assign(dest2)).with_span(at(18, 9..14)),
        Stmt::action(Action::Call {
            callee: "list_into_inner".into(),
            args: vec![(list, PassMode::Move), (dest2, PassMode::BorrowMut)],
        })
        .with_span(at(19, 21..25)),
    ];
    program.add_function(main);

    program
}

pub struct DemoReport {
    /// What the one legal drain produced.
    pub drained: Vec<i32>,
    pub sum: SumOutcome,
    pub sum_messages: Vec<String>,
    pub errors: Vec<(FnId, CheckError)>,
    /// One rendered diagnostic per error.
    pub rendered: Vec<String>,
}

/// Runs the whole demo: build the list, drain it once, run the clamped sum,
/// then check the modeled program and render whatever the checker finds.
pub fn run_demo() -> DemoReport {
    let list: BoundedList = BoundedList::from_slice(&[1, 2, 3]).expect("demo list fits");

    let mut dest = [0; DEMO_CAPACITY];
    let copied = list.drain_into(&mut dest);
    let drained = dest[..copied].to_vec();

    let mut sum_messages = Vec::new();
    let sum = clamped_triangular_sum(10, |msg| sum_messages.push(msg.to_owned()))
        .expect("demo range is valid");

    let program = demo_program();
    let mut errors = Vec::new();
    let mut rendered = Vec::new();

    for (id, func) in program.functions() {
        let cfg = Cfg::build(func);
        let facts = AnalysisFacts::extract(&cfg);

        for error in BorrowChecker::check(&facts) {
            rendered.push(error.to_diagnostic(func, &facts).render(DEMO_LISTING));
            errors.push((id, error));
        }
    }

    DemoReport {
        drained,
        sum,
        sum_messages,
        errors,
        rendered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_program_has_its_three_functions() {
        let program = demo_program();
        assert!(program.find("list_into_inner", 0).is_some());
        assert!(program.find("clamped_sum", 0).is_some());
        assert!(program.find("main", 0).is_some());
    }

    #[test]
    fn spans_point_at_the_listing() {
        // every span names a line that exists and covers `list` tokens in main
        let program = demo_program();
        let main = program.function(program.find("main", 0).unwrap());

        for stmt in &main.body {
            let span = stmt.span.as_ref().expect("main statements carry spans");
            let line = DEMO_LISTING
                .lines()
                .nth(span.line as usize - 1)
                .expect("span line exists");
            assert!(line.len() as u32 >= span.cols.end - 1);
        }
    }

    #[test]
    fn the_second_drain_is_the_only_error() {
        let report = run_demo();

        assert_eq!(report.errors.len(), 1);
        let (id, error) = &report.errors[0];

        let program = demo_program();
        assert_eq!(*id, program.find("main", 0).unwrap());
        assert!(matches!(error, CheckError::UseAfterMove { .. }));
    }
}
