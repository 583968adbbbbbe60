//! The checker itself: a datalog-flavored fixpoint over the loan tables,
//! plus a reachability pass for moves.

use ahash::{AHashMap, AHashSet};

use crate::diagnostics::Diagnostic;
use crate::facts::{AnalysisFacts, Point, Region};
use crate::ir::{Function, Loan, Var};

/// A borrowing or move error, reported in terms of program points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    UseAfterMove {
        var: Var,
        move_point: Point,
        use_point: Point,
    },
    LoanInvalidated {
        loan: Loan,
        /// The point at which the erroring borrow was created.
        borrow_point: Point,
        /// The point which makes the borrow invalid, a write to or move of
        /// the borrowed value.
        invalidation_point: Point,
        /// A later read of the reference, when one exists.
        use_point: Option<Point>,
    },
}

pub struct BorrowChecker<'f> {
    facts: &'f AnalysisFacts,
    subsets: Vec<(Region, Region, Point)>,
    subset_set: AHashSet<(Region, Region, Point)>,
    requires: Vec<(Region, Loan, Point)>,
    require_set: AHashSet<(Region, Loan, Point)>,
}

impl<'f> BorrowChecker<'f> {
    /// Runs both checks and returns every error found, ordered by point.
    pub fn check(facts: &'f AnalysisFacts) -> Vec<CheckError> {
        let bc = BorrowChecker::compute(facts);

        let mut errors = bc.loan_errors();
        errors.extend(bc.move_errors());
        errors.sort_by_key(|e| match *e {
            CheckError::UseAfterMove {
                move_point,
                use_point,
                ..
            } => (move_point, use_point),
            CheckError::LoanInvalidated {
                borrow_point,
                invalidation_point,
                ..
            } => (borrow_point, invalidation_point),
        });
        errors
    }

    /// Builds the engine and runs the fixpoint to completion.
    pub fn compute(facts: &'f AnalysisFacts) -> Self {
        let mut bc = BorrowChecker {
            facts,
            subsets: Vec::new(),
            subset_set: AHashSet::new(),
            requires: Vec::new(),
            require_set: AHashSet::new(),
        };

        bc.init_from_inputs();
        while !bc.stabilize_subsets() {}
        while !bc.stabilize_requires() {}

        bc
    }

    pub fn subsets(&self) -> &[(Region, Region, Point)] {
        &self.subsets
    }

    pub fn requires(&self) -> &[(Region, Loan, Point)] {
        &self.requires
    }

    fn init_from_inputs(&mut self) {
        for &(r1, r2, p) in &self.facts.base_subsets {
            self.insert_subset(r1, r2, p);
        }
        for &(r, l, p) in &self.facts.borrow_regions {
            self.insert_require(r, l, p);
        }
    }

    fn insert_subset(&mut self, r1: Region, r2: Region, p: Point) {
        if self.subset_set.insert((r1, r2, p)) {
            self.subsets.push((r1, r2, p));
        }
    }

    fn insert_require(&mut self, r: Region, l: Loan, p: Point) {
        if self.require_set.insert((r, l, p)) {
            self.requires.push((r, l, p));
        }
    }

    /// Returns true when the subsets are stable.
    fn stabilize_subsets(&mut self) -> bool {
        let before = self.subsets.len();
        let current = self.subsets.clone();

        // if we have R1: R2 and R2: R3, we have R1: R3
        for &(r1, r2, p) in &current {
            for &(r2_bis, r3, p_bis) in &current {
                if r2 == r2_bis && p == p_bis {
                    self.insert_subset(r1, r3, p);
                }
            }
        }

        // propagate the relations along the edges of the CFG
        for &(r1, r2, p) in &current {
            for &(p_bis, q) in &self.facts.cfg_edges {
                if p == p_bis {
                    self.insert_subset(r1, r2, q);
                }
            }
        }

        before == self.subsets.len()
    }

    /// Returns true when the requires are stable.
    fn stabilize_requires(&mut self) -> bool {
        let before = self.requires.len();
        let current = self.requires.clone();
        let subsets = self.subsets.clone();
        let facts = self.facts;

        // if R1: R2, R2 depends on all of R1's loans
        for &(r1, l, p) in &current {
            for &(r1_bis, r2, p_bis) in &subsets {
                if r1 == r1_bis && p == p_bis {
                    self.insert_require(r2, l, p);
                }
            }
        }

        // propagate requires along the edges of the CFG,
        // as long as the loan has not been killed
        'outer: for &(r, l, p) in &current {
            for &(l_bis, p_bis) in &facts.kills {
                if l_bis == l && p_bis == p {
                    continue 'outer;
                }
            }

            for &(p_bis, q) in &facts.cfg_edges {
                if p == p_bis {
                    self.insert_require(r, l, q);
                }
            }
        }

        before == self.requires.len()
    }

    fn loan_live_at(&self, l: Loan, p: Point) -> bool {
        for &(r, p_bis) in &self.facts.regions_live_at {
            if p_bis == p && self.require_set.contains(&(r, l, p)) {
                return true;
            }
        }
        false
    }

    fn loan_errors(&self) -> Vec<CheckError> {
        let mut errors = Vec::new();

        for &(p, l) in &self.facts.invalidates {
            if !self.loan_live_at(l, p) {
                continue;
            }

            let borrow_point = self
                .facts
                .borrow_regions
                .iter()
                .find(|&&(_, l_bis, _)| l_bis == l)
                .map(|&(_, _, p_bis)| p_bis)
                .unwrap_or(p);

            let use_point = self.facts.loan_info(l).and_then(|info| {
                let ahead = forward_closure(&self.facts.cfg_edges, p);
                self.facts
                    .uses
                    .iter()
                    .filter(|&&(v, q)| v == info.dest && ahead.contains(&q))
                    .map(|&(_, q)| q)
                    .min()
            });

            errors.push(CheckError::LoanInvalidated {
                loan: l,
                borrow_point,
                invalidation_point: p,
                use_point,
            });
        }

        errors
    }

    /// A variable touched at a point reachable from a point where it was
    /// moved out is a use-after-move.
    fn move_errors(&self) -> Vec<CheckError> {
        let mut errors = Vec::new();
        let mut reported = AHashSet::new();

        for &(var, move_point) in &self.facts.moves {
            let ahead = forward_closure(&self.facts.cfg_edges, move_point);

            // the closure is strict, so a same-point touch only shows up
            // when the move sits on a cycle
            let later_touches = self
                .facts
                .uses
                .iter()
                .chain(self.facts.moves.iter())
                .filter(|&&(v, q)| v == var && ahead.contains(&q));

            for &(_, use_point) in later_touches {
                if reported.insert((var, move_point, use_point)) {
                    errors.push(CheckError::UseAfterMove {
                        var,
                        move_point,
                        use_point,
                    });
                }
            }
        }

        errors
    }
}

/// Points reachable from `from` by one or more CFG edges.
fn forward_closure(edges: &[(Point, Point)], from: Point) -> AHashSet<Point> {
    let mut successors: AHashMap<Point, Vec<Point>> = AHashMap::new();
    for &(a, b) in edges {
        successors.entry(a).or_default().push(b);
    }

    let mut seen = AHashSet::new();
    let mut stack: Vec<Point> = successors.get(&from).cloned().unwrap_or_default();

    while let Some(p) = stack.pop() {
        if seen.insert(p) {
            if let Some(next) = successors.get(&p) {
                stack.extend(next.iter().copied());
            }
        }
    }

    seen
}

impl CheckError {
    pub fn to_diagnostic(&self, func: &Function, facts: &AnalysisFacts) -> Diagnostic {
        match *self {
            CheckError::UseAfterMove {
                var,
                move_point,
                use_point,
            } => {
                let name = func.var_name(var);
                let mut diag = Diagnostic::error(format!("use of moved value: `{}`", name));

                if let Some(span) = facts.spans.get(&use_point) {
                    diag = diag.with_span(span.clone());
                }
                diag = match facts.spans.get(&move_point) {
                    Some(span) => diag.with_note(format!("`{}` was moved at {}", name, span)),
                    None => diag.with_note(format!(
                        "`{}` was moved at point {}",
                        name, move_point
                    )),
                };

                diag
            }
            CheckError::LoanInvalidated {
                loan,
                borrow_point,
                invalidation_point,
                ..
            } => {
                let source = facts
                    .loan_info(loan)
                    .map(|info| func.var_name(info.source))
                    .unwrap_or("<unknown>");
                let mut diag = Diagnostic::error(format!(
                    "cannot write to or move `{}` while it is borrowed",
                    source
                ));

                if let Some(span) = facts.spans.get(&invalidation_point) {
                    diag = diag.with_span(span.clone());
                }
                diag = match facts.spans.get(&borrow_point) {
                    Some(span) => {
                        diag.with_note(format!("`{}` was borrowed at {}", source, span))
                    }
                    None => diag.with_note(format!(
                        "`{}` was borrowed at point {}",
                        source, borrow_point
                    )),
                };

                diag
            }
        }
    }
}
