//! Relation tables the checker consumes, extracted from a function's CFG.

use ahash::AHashMap;

use crate::cfg::{Cfg, Node, NodeId};
use crate::diagnostics::Span;
use crate::ir::{Action, Loan, PassMode, Var};

/// A point of the program: the id of a CFG node.
pub type Point = u32;

pub type Region = u32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanInfo {
    pub loan: Loan,
    /// The borrowed variable.
    pub source: Var,
    /// The variable holding the reference.
    pub dest: Var,
    pub issued_at: Point,
}

/// Inputs of the borrow and move check. The six loan tables follow the
/// classic datalog formulation; `moves` and `uses` feed the move check.
#[derive(Debug, Default, Clone)]
pub struct AnalysisFacts {
    pub cfg_edges: Vec<(Point, Point)>,
    pub base_subsets: Vec<(Region, Region, Point)>,
    pub borrow_regions: Vec<(Region, Loan, Point)>,
    pub regions_live_at: Vec<(Region, Point)>,
    pub kills: Vec<(Loan, Point)>,
    pub invalidates: Vec<(Point, Loan)>,

    pub moves: Vec<(Var, Point)>,
    pub uses: Vec<(Var, Point)>,

    pub loans: Vec<LoanInfo>,
    pub spans: AHashMap<Point, Span>,
}

impl AnalysisFacts {
    pub fn loan_info(&self, loan: Loan) -> Option<&LoanInfo> {
        self.loans.iter().find(|info| info.loan == loan)
    }

    /// Walks the CFG once and fills every table.
    ///
    /// * a call argument passed by `move` (or a bare move-out) records a move
    ///   of the variable at that point;
    /// * any appearance of a variable as a call argument, a read, or a borrow
    ///   source records a use;
    /// * a borrow issues its loan there, and its region is live at every
    ///   point that can still reach a read of the reference;
    /// * assigning the reference kills the loan, writing or moving the
    ///   borrowed variable invalidates it.
    pub fn extract(cfg: &Cfg) -> AnalysisFacts {
        let mut facts = AnalysisFacts::default();

        for (from, to) in cfg.edges() {
            facts.cfg_edges.push((from.0, to.0));
        }

        // first pass: loans and spans
        for (id, node) in cfg.nodes() {
            let Node::Statement { action, span } = node else {
                continue;
            };
            if let Some(span) = span {
                facts.spans.insert(id.0, span.clone());
            }
            if let Action::Borrow { source, dest, loan } = action {
                facts.loans.push(LoanInfo {
                    loan: *loan,
                    source: *source,
                    dest: *dest,
                    issued_at: id.0,
                });
                facts.borrow_regions.push((loan.0, *loan, id.0));
            }
        }

        // second pass: moves, uses, kills, invalidations
        for (id, node) in cfg.nodes() {
            let Node::Statement { action, .. } = node else {
                continue;
            };
            let p = id.0;

            match action {
                Action::Assign(var) => {
                    for info in &facts.loans {
                        if info.dest == *var {
                            facts.kills.push((info.loan, p));
                        }
                        if info.source == *var {
                            facts.invalidates.push((p, info.loan));
                        }
                    }
                }
                Action::Use(var) => {
                    facts.uses.push((*var, p));
                }
                Action::Borrow { source, .. } => {
                    facts.uses.push((*source, p));
                }
                Action::MoveOut(var) => {
                    facts.moves.push((*var, p));
                    facts.push_move_invalidations(*var, p);
                }
                Action::Call { args, .. } => {
                    for (var, mode) in args {
                        facts.uses.push((*var, p));
                        if *mode == PassMode::Move {
                            facts.moves.push((*var, p));
                            facts.push_move_invalidations(*var, p);
                        }
                    }
                }
            }
        }

        facts.compute_liveness(cfg);
        facts
    }

    fn push_move_invalidations(&mut self, var: Var, p: Point) {
        let invalidated: Vec<Loan> = self
            .loans
            .iter()
            .filter(|info| info.source == var)
            .map(|info| info.loan)
            .collect();
        for loan in invalidated {
            self.invalidates.push((p, loan));
        }
    }

    /// A loan's region is live at a point when some read of the reference
    /// is still ahead: the point itself reads it, or a read is reachable.
    fn compute_liveness(&mut self, cfg: &Cfg) {
        for info in &self.loans {
            let mut live = vec![false; cfg.node_count()];

            for &(var, p) in &self.uses {
                if var != info.dest {
                    continue;
                }
                live[p as usize] = true;
                for (id, reachable) in backward_closure(cfg, NodeId(p)).iter().enumerate() {
                    if *reachable {
                        live[id] = true;
                    }
                }
            }

            for (id, is_live) in live.iter().enumerate() {
                if *is_live {
                    self.regions_live_at.push((info.loan.0, id as Point));
                }
            }
        }
    }
}

/// Nodes from which `to` is reachable by one or more edges.
fn backward_closure(cfg: &Cfg, to: NodeId) -> Vec<bool> {
    let mut seen = vec![false; cfg.node_count()];
    let mut stack: Vec<NodeId> = predecessors(cfg, to);

    while let Some(node) = stack.pop() {
        if seen[node.index()] {
            continue;
        }
        seen[node.index()] = true;
        stack.extend(predecessors(cfg, node));
    }

    seen
}

fn predecessors(cfg: &Cfg, of: NodeId) -> Vec<NodeId> {
    cfg.edges()
        .filter(|&(_, to)| to == of)
        .map(|(from, _)| from)
        .collect()
}
