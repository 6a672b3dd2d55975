use crate::sat::formula::Lit;
use super::RestartState;
use super::arena::ClauseArena;
use super::assignment::{self, Assignment};
use super::decision_heuristic::VmtfOrder;
use super::watches::Watches;


/// First-UIP conflict analysis with recursive self-subsumption.
pub struct AnalyzeContext {
    buffer: Vec<Lit>,
    pub max_literals: u64,
    pub tot_literals: u64,
}

impl AnalyzeContext {
    pub fn new(n_vars: usize) -> AnalyzeContext {
        AnalyzeContext {
            buffer: Vec::with_capacity(n_vars),
            max_literals: 0,
            tot_literals: 0,
        }
    }

    // Description:
    //   Resolve the falsified clause at `confl` (a literals offset)
    //   backwards over the trail into a new lemma, unassign the conflict
    //   level and rewind the propagation cursor to the backjump point.
    //
    //   Post-conditions:
    //     * The lemma is stored as redundant; its first literal is the
    //       asserting literal, falsified under the pre-backjump assignment.
    //     * `processed == assigned`, indexing the slot the asserting
    //       assignment will be pushed into.
    //
    //   Returns the lemma's literals offset.
    pub fn analyze(
        &mut self,
        arena: &mut ClauseArena,
        watches: &mut Watches,
        assigns: &mut Assignment,
        order: &mut VmtfOrder,
        restart: &mut RestartState,
        confl: usize,
    ) -> usize {
        restart.res += 1;

        // Mark every literal of the falsified clause.
        let mut p = confl;
        while arena.db[p] != 0 {
            bump(assigns, order, Lit(arena.db[p]));
            p += 1;
        }

        // Walk the trail top-down. A marked propagated literal is either the
        // first UIP (no mark below it before a decision) or gets resolved
        // with its reason; everything passed over is unassigned.
        loop {
            assigns.assigned -= 1;
            let top = assigns.trail[assigns.assigned];
            if assigns.reason[top.var()] == 0 {
                break;
            }
            if assigns.falsified[top] == assignment::SOURCE {
                let mut check = assigns.assigned;
                let is_uip = loop {
                    check -= 1;
                    let below = assigns.trail[check];
                    if assigns.falsified[below] == assignment::SOURCE {
                        break false;
                    }
                    if assigns.reason[below.var()] == 0 {
                        break true;
                    }
                };
                if is_uip {
                    break;
                }
                // Mark the tail of the reason; its head is the assignment of
                // `top` itself.
                let mut r = assigns.reason[top.var()] as usize;
                while arena.db[r] != 0 {
                    bump(assigns, order, Lit(arena.db[r]));
                    r += 1;
                }
            }
            assigns.unassign(top);
        }

        // Build the lemma from the UIP down to the root boundary. Marked
        // literals whose falsity already follows from the other marks via
        // their reason chains are dropped. LBD counts the decision segments
        // that contributed a literal; the backjump target is the highest
        // decision at which the lemma was still unit.
        self.buffer.clear();
        let mut lbd: i64 = 0;
        let mut contributed = false;
        assigns.processed = assigns.assigned;
        let mut p = assigns.assigned as isize;
        while p >= assigns.forced as isize {
            let lit = assigns.trail[p as usize];
            if assigns.falsified[lit] == assignment::SOURCE {
                self.max_literals += 1;
                if !implied(arena, assigns, lit) {
                    self.buffer.push(lit);
                    contributed = true;
                }
            }
            if assigns.reason[lit.var()] == 0 {
                if contributed {
                    lbd += 1;
                }
                contributed = false;
                if self.buffer.len() == 1 {
                    assigns.processed = p as usize;
                }
            }
            assigns.falsified[lit] = assignment::FALSE;
            p -= 1;
        }
        self.tot_literals += self.buffer.len() as u64;

        restart.update(lbd);

        // Unassign everything from the old top down to the backjump slot.
        while assigns.assigned > assigns.processed {
            let lit = assigns.trail[assigns.assigned];
            assigns.unassign(lit);
            assigns.assigned -= 1;
        }
        let lit = assigns.trail[assigns.assigned];
        assigns.unassign(lit);

        arena.add_clause(watches, &self.buffer, false)
    }
}


/// Mark `lit` as part of the conflict and move its variable to the front of
/// the decision order. Root-level forced literals keep their tag and their
/// list position.
fn bump(assigns: &mut Assignment, order: &mut VmtfOrder, lit: Lit) {
    if assigns.falsified[lit] != assignment::REMOVABLE {
        assigns.falsified[lit] = assignment::SOURCE;
        order.to_front(lit.var());
    }
}


/// Does the falsity of `lit` already follow from marked literals through its
/// reason chain? Verdicts are cached in the truth array (REMOVABLE / FAILED)
/// so revisits along the implication graph stay constant-time.
fn implied(arena: &ClauseArena, assigns: &mut Assignment, lit: Lit) -> bool {
    if assigns.falsified[lit] > assignment::SOURCE {
        return assigns.falsified[lit] & assignment::SOURCE != 0;
    }
    if assigns.reason[lit.var()] == 0 {
        return false;
    }
    let mut r = assigns.reason[lit.var()] as usize;
    while arena.db[r] != 0 {
        let q = Lit(arena.db[r]);
        if (assigns.falsified[q] ^ assignment::SOURCE) != 0 && !implied(arena, assigns, q) {
            assigns.falsified[lit] = assignment::FAILED;
            return false;
        }
        r += 1;
    }
    assigns.falsified[lit] = assignment::REMOVABLE;
    true
}
