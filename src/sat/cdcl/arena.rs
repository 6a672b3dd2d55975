use crate::sat::formula::Lit;
use super::watches::Watches;


/// Packed clause store. A clause occupies `size + 3` cells: two link cells
/// chaining the clauses watched by its first two literals, the literals, and
/// a 0 terminator. Clauses are identified by the offset of their first link
/// cell; the literals start two cells later. Cell 0 holds a permanent 0 so
/// that no clause ever starts at offset 0 and the cell before any first link
/// cell is a terminator.
pub struct ClauseArena {
    pub(super) db: Vec<i32>,
    pub(super) mem_used: usize,
    mem_limit: usize,
    /// Boundary between irredundant clauses (below) and lemmas (at or above).
    pub(super) mem_fixed: usize,
    pub(super) n_lemmas: usize,
}

impl ClauseArena {
    pub fn new(mem_limit: usize) -> Self {
        let mut arena = ClauseArena {
            db: Vec::new(),
            mem_used: 0,
            mem_limit,
            mem_fixed: 0,
            n_lemmas: 0,
        };
        let sentinel = arena.alloc(1);
        arena.db[sentinel] = 0;
        arena.mem_fixed = arena.mem_used;
        arena
    }

    fn ensure_capacity(&mut self, min_capacity: usize) {
        if self.db.len() >= min_capacity {
            return;
        }

        let mut new_capacity = self.db.len().max(2);
        while new_capacity < min_capacity {
            let delta = ((new_capacity >> 1) + (new_capacity >> 3) + 2) & !1;
            new_capacity = match usize::checked_add(new_capacity, delta) {
                Some(res) => res,
                None => panic!("overflow"),
            };
        }

        self.db.resize(new_capacity.min(self.mem_limit), 0);
    }

    /// Reserve `size` cells and return their offset. Exhausting the arena
    /// limit is fatal.
    pub fn alloc(&mut self, size: usize) -> usize {
        if self.mem_used + size > self.mem_limit {
            panic!(
                "clause arena exhausted: {} + {} cells exceeds the {} limit",
                self.mem_used, size, self.mem_limit
            );
        }
        let offset = self.mem_used;
        self.mem_used += size;
        self.ensure_capacity(self.mem_used);
        offset
    }

    /// Write a new clause block and splice it into the watch chains of its
    /// first two literals. Unit clauses get no watches; the caller assigns
    /// them directly. Returns the offset of the literals region.
    pub fn add_clause(&mut self, watches: &mut Watches, lits: &[Lit], irredundant: bool) -> usize {
        let used = self.alloc(lits.len() + 3);
        if lits.len() > 1 {
            watches.watch(&mut self.db, lits[0], used);
            watches.watch(&mut self.db, lits[1], used + 1);
        }
        for (i, &lit) in lits.iter().enumerate() {
            self.db[used + 2 + i] = lit.0;
        }
        self.db[used + 2 + lits.len()] = 0;
        if irredundant {
            self.mem_fixed = self.mem_used;
        } else {
            self.n_lemmas += 1;
        }
        used + 2
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn lits(raw: &[i32]) -> Vec<Lit> {
        raw.iter().map(|&l| Lit::new(l)).collect()
    }

    #[test]
    fn clause_block_layout() {
        let mut arena = ClauseArena::new(1 << 16);
        let mut watches = Watches::new(3);

        let c = arena.add_clause(&mut watches, &lits(&[1, -2, 3]), true);
        // Sentinel, then two link cells, then the literals region.
        assert_eq!(c, 3);
        assert_eq!(arena.db[0], 0);
        assert_eq!(&arena.db[c..c + 4], &[1, -2, 3, 0]);
        assert_eq!(arena.mem_fixed, arena.mem_used);
        assert_eq!(arena.n_lemmas, 0);

        let d = arena.add_clause(&mut watches, &lits(&[-1, 2]), false);
        assert_eq!(d, c + 4 + 2);
        assert_eq!(&arena.db[d..d + 3], &[-1, 2, 0]);
        assert_eq!(arena.n_lemmas, 1);
        // The lemma did not move the irredundant boundary.
        assert_eq!(arena.mem_fixed, d - 2);
    }

    #[test]
    fn unit_clause_gets_no_watches() {
        let mut arena = ClauseArena::new(1 << 16);
        let mut watches = Watches::new(2);
        arena.add_clause(&mut watches, &lits(&[2]), true);
        for lit in watches.first.literals() {
            assert_eq!(watches.first[lit], super::super::watches::END);
        }
    }

    #[test]
    #[should_panic(expected = "clause arena exhausted")]
    fn arena_limit_is_fatal() {
        let mut arena = ClauseArena::new(7);
        let mut watches = Watches::new(4);
        arena.add_clause(&mut watches, &lits(&[1, 2, 3, 4]), true);
    }
}
