use crate::sat::formula::Lit;
use crate::sat::formula::index_map::LitVec;


/// Chain terminator. Distinct from every cell offset (offsets are positive,
/// offset 0 holds the arena sentinel) and from every literal a clause can
/// contain.
pub const END: i32 = -9;


/// Per-literal heads of the intrusive watch chains. A chain entry is the
/// offset of one of a clause's two link cells; the cell's value is the next
/// entry. A clause of size >= 2 sits in exactly the two chains of its two
/// watched literals, which are the first two literals of its body.
pub struct Watches {
    pub(super) first: LitVec<i32>,
}

impl Watches {
    pub fn new(n_vars: usize) -> Self {
        Watches { first: LitVec::new(n_vars, END) }
    }

    /// Prepend the link cell at `cell` to the chain of `lit`.
    #[inline]
    pub fn watch(&mut self, db: &mut [i32], lit: Lit, cell: usize) {
        db[cell] = self.first[lit];
        self.first[lit] = cell as i32;
    }

    /// Splice every entry pointing into the lemma region out of every chain.
    /// Entries of irredundant clauses are kept; the cursor descends into
    /// their link cells to keep walking.
    pub fn detach_lemmas(&mut self, db: &mut [i32], mem_fixed: usize) {
        for lit in self.first.literals() {
            let mut at_head = true;
            let mut cell = 0;
            loop {
                let entry = if at_head { self.first[lit] } else { db[cell] };
                if entry == END {
                    break;
                }
                if (entry as usize) < mem_fixed {
                    at_head = false;
                    cell = entry as usize;
                } else if at_head {
                    self.first[lit] = db[entry as usize];
                } else {
                    db[cell] = db[entry as usize];
                }
            }
        }
    }

    /// Offsets of the link cells on the chain of `lit`, in chain order.
    #[cfg(test)]
    pub fn chain(&self, db: &[i32], lit: Lit) -> Vec<usize> {
        let mut cells = Vec::new();
        let mut entry = self.first[lit];
        while entry != END {
            cells.push(entry as usize);
            entry = db[entry as usize];
        }
        cells
    }
}
