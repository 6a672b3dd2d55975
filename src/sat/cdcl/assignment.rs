use crate::sat::formula::{Lit, Var};
use crate::sat::formula::index_map::{LitVec, VarVec};


// Truth-array states, indexed by literal. Any non-zero value means the
// literal is falsified and sits on the trail. Values above SOURCE double as
// the redundancy cache of conflict analysis: REMOVABLE carries the SOURCE
// bit, FAILED does not, so `state & SOURCE` answers a cached query.
// Root-level forced literals are tagged REMOVABLE outright, which both
// keeps them out of lemmas and stops the cache walk from ever consulting
// their reasons.
pub const UNDEF: i32 = 0;
pub const FALSE: i32 = 1;
pub const SOURCE: i32 = 2;
pub const FAILED: i32 = REMOVABLE - 1;
pub const REMOVABLE: i32 = 6;


/// The current partial assignment: the falsification state per literal, the
/// saved phase per variable, reason offsets, and the trail of falsified
/// literals with its three cursors.
///
/// `forced <= processed <= assigned` holds at every quiescent point.
/// Literals below `forced` are entailed by the formula and never unassigned;
/// `processed` is the propagation cursor; `assigned` the top of the stack.
pub struct Assignment {
    pub(super) falsified: LitVec<i32>,
    pub(super) model: VarVec<bool>,
    /// Literals offset of the propagating clause, plus one; 0 for decisions.
    pub(super) reason: VarVec<u32>,
    pub(super) trail: Box<[Lit]>,
    pub(super) forced: usize,
    pub(super) processed: usize,
    pub(super) assigned: usize,
}

impl Assignment {
    pub fn new(n_vars: usize) -> Self {
        Assignment {
            falsified: LitVec::new(n_vars, UNDEF),
            model: VarVec::new(n_vars, false),
            reason: VarVec::new(n_vars, 0),
            trail: vec![Lit(0); n_vars + 1].into_boxed_slice(),
            forced: 0,
            processed: 0,
            assigned: 0,
        }
    }

    /// Make the first literal of the clause at `reason` true: falsify its
    /// negation, push it on the trail, record the reason and save the phase.
    pub fn assign(&mut self, db: &[i32], reason: usize, forced: bool) {
        let lit = Lit(db[reason]);
        self.falsified[!lit] = if forced { REMOVABLE } else { FALSE };
        self.trail[self.assigned] = !lit;
        self.assigned += 1;
        self.reason[lit.var()] = (reason + 1) as u32;
        self.model[lit.var()] = lit.is_pos();
    }

    /// Push a decision. Decisions carry no reason; the phase already matches
    /// the model, which is where the polarity came from.
    pub fn assign_decision(&mut self, lit: Lit) {
        self.falsified[!lit] = FALSE;
        self.trail[self.assigned] = !lit;
        self.assigned += 1;
        self.reason[lit.var()] = 0;
    }

    #[inline]
    pub fn unassign(&mut self, lit: Lit) {
        self.falsified[lit] = UNDEF;
    }

    /// Pop everything above the forced prefix and rewind the propagation
    /// cursor to it.
    pub fn restart(&mut self) {
        while self.assigned > self.forced {
            self.assigned -= 1;
            let lit = self.trail[self.assigned];
            self.unassign(lit);
        }
        self.processed = self.forced;
    }

    #[inline]
    pub fn is_assigned(&self, v: Var) -> bool {
        self.falsified[v.lit(true)] != UNDEF || self.falsified[v.lit(false)] != UNDEF
    }
}
