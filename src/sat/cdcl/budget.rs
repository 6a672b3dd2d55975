// Resource constraints for a single solve call. Exhaustion is reported as an
// interrupted (unknown) result, never an answer.
pub struct Budget {
    conflict_budget: i64,    // -1 means no budget.
    propagation_budget: i64, // -1 means no budget.
}

impl Budget {
    pub fn new() -> Budget {
        Budget {
            conflict_budget: -1,
            propagation_budget: -1,
        }
    }

    pub fn limit_conflicts(&mut self, x: u64) {
        self.conflict_budget = x as i64;
    }

    pub fn limit_propagations(&mut self, x: u64) {
        self.propagation_budget = x as i64;
    }

    pub fn off(&mut self) {
        self.conflict_budget = -1;
        self.propagation_budget = -1;
    }

    pub fn within(&self, conflicts: u64, propagations: u64) -> bool {
        (self.conflict_budget < 0 || conflicts < self.conflict_budget as u64)
            && (self.propagation_budget < 0 || propagations < self.propagation_budget as u64)
    }
}
