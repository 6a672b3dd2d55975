use std::cmp;
use log::{debug, trace};
use crate::sat::{SolveRes, Solver, Stats};
use crate::sat::formula::{Lit, Var};
use self::arena::ClauseArena;
use self::assignment::Assignment;
use self::conflict::AnalyzeContext;
use self::decision_heuristic::VmtfOrder;
use self::watches::Watches;

pub mod budget;
mod arena;
mod assignment;
mod conflict;
mod decision_heuristic;
mod watches;


#[derive(Clone, Copy, Debug)]
pub struct RestartStrategy {
    /// Initial value of both LBD averages; biases early restarts until the
    /// averages adapt. Tuned constant.
    pub ema_seed: i64,
    /// Restart when the fast average exceeds this percentage of the slow one.
    pub threshold_percent: i64,
}

impl Default for RestartStrategy {
    fn default() -> Self {
        RestartStrategy {
            ema_seed: 1 << 24,
            threshold_percent: 60,
        }
    }
}


#[derive(Clone, Copy, Debug)]
pub struct ReduceStrategy {
    /// Initial lemma limit.
    pub max_lemmas: usize,
    /// Limit growth per reduction.
    pub max_lemmas_inc: usize,
    /// Keep lemmas with fewer than this many literals satisfied by the
    /// saved phases.
    pub satisfied_bound: usize,
}

impl Default for ReduceStrategy {
    fn default() -> Self {
        ReduceStrategy {
            max_lemmas: 3000,
            max_lemmas_inc: 300,
            satisfied_bound: 6,
        }
    }
}


#[derive(Clone, Copy, Debug)]
pub struct Settings {
    pub restart: RestartStrategy,
    pub reduce: ReduceStrategy,
    /// Hard cap on the clause arena, in cells.
    pub arena_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            restart: RestartStrategy::default(),
            reduce: ReduceStrategy::default(),
            arena_limit: 1 << 30,
        }
    }
}


/// Exponential moving averages of lemma LBD, fixed-point scaled. The fast
/// window tracks roughly the last 32 conflicts, the slow one the last 32768.
pub(super) struct RestartState {
    pub fast: i64,
    pub slow: i64,
    /// Conflicts since the last restart.
    pub res: u64,
}

impl RestartState {
    fn new(seed: i64) -> Self {
        RestartState { fast: seed, slow: seed, res: 0 }
    }

    pub fn update(&mut self, lbd: i64) {
        self.fast -= self.fast >> 5;
        self.fast += lbd << 15;
        self.slow -= self.slow >> 15;
        self.slow += lbd << 5;
    }

    fn should_restart(&self, percent: i64) -> bool {
        self.fast > self.slow / 100 * percent
    }

    /// Damp the fast average back to the trigger threshold.
    fn damp(&mut self, percent: i64) {
        self.fast = self.slow / 100 * percent;
        self.res = 0;
    }
}


pub struct CoreSolver {
    /// If false, the constraints are already unsatisfiable.
    ok: bool,
    settings: Settings,
    n_vars: usize,
    n_clauses: usize,
    max_lemmas: usize,
    arena: ClauseArena,
    watches: Watches,
    assigns: Assignment,
    order: VmtfOrder,
    analyze: AnalyzeContext,
    restart: RestartState,
    stats: Stats,
}

impl Solver for CoreSolver {
    fn n_vars(&self) -> usize {
        self.n_vars
    }

    fn n_clauses(&self) -> usize {
        self.n_clauses
    }

    fn add_clause(&mut self, clause: &[Lit]) -> bool {
        if !self.ok {
            return false;
        }
        match clause.len() {
            0 => {
                self.ok = false;
            }

            1 => {
                let c = self.arena.add_clause(&mut self.watches, clause, true);
                let unit = clause[0];
                if self.assigns.falsified[unit] != assignment::UNDEF {
                    // The unit contradicts an already established one.
                    self.ok = false;
                } else if self.assigns.falsified[!unit] == assignment::UNDEF {
                    self.assigns.assign(&self.arena.db, c, true);
                }
            }

            _ => {
                self.arena.add_clause(&mut self.watches, clause, true);
            }
        }
        self.ok
    }

    fn solve_limited(self, budget: &budget::Budget) -> SolveRes<CoreSolver> {
        self.run(budget)
    }

    fn stats(&self) -> Stats {
        Stats {
            tot_literals: self.analyze.tot_literals,
            del_literals: self.analyze.max_literals - self.analyze.tot_literals,
            ..self.stats
        }
    }
}

impl CoreSolver {
    pub fn new(settings: Settings, n_vars: usize, n_clauses: usize) -> Self {
        let n = cmp::max(n_vars, 1);
        CoreSolver {
            ok: true,
            settings,
            n_vars: n,
            n_clauses,
            max_lemmas: settings.reduce.max_lemmas,
            arena: ClauseArena::new(settings.arena_limit),
            watches: Watches::new(n),
            assigns: Assignment::new(n),
            order: VmtfOrder::new(n),
            analyze: AnalyzeContext::new(n),
            restart: RestartState::new(settings.restart.ema_seed),
            stats: Stats::default(),
        }
    }

    fn model(&self) -> Vec<Lit> {
        (1..=self.n_vars as i32)
            .map(|v| Var(v).lit(self.assigns.model[Var(v)]))
            .collect()
    }

    fn run(mut self, budget: &budget::Budget) -> SolveRes<CoreSolver> {
        if !self.ok {
            return SolveRes::UnSAT(self.stats());
        }

        let mut decision = self.order.head;
        self.restart.res = 0;
        loop {
            if !budget.within(self.stats.conflicts, self.stats.propagations) {
                debug!("budget exhausted after {} conflicts", self.stats.conflicts);
                self.assigns.restart();
                let stats = self.stats();
                return SolveRes::Interrupted(stats, self);
            }

            let old_lemmas = self.arena.n_lemmas;
            if !self.propagate() {
                return SolveRes::UnSAT(self.stats());
            }

            if self.arena.n_lemmas > old_lemmas {
                // The last decision ran into a conflict; restart the
                // heuristic walk from the current head.
                decision = self.order.head;
                if self.restart.should_restart(self.settings.restart.threshold_percent) {
                    trace!(
                        "restarting after {} conflicts (fast {}, slow {})",
                        self.restart.res, self.restart.fast, self.restart.slow
                    );
                    self.stats.restarts += 1;
                    self.restart.damp(self.settings.restart.threshold_percent);
                    self.assigns.restart();
                    if self.arena.n_lemmas > self.max_lemmas {
                        self.reduce();
                    }
                }
            }

            // Walk the decision order past assigned variables. Slot 0 is
            // never assigned, so the walk stops at the sentinel by itself.
            while self.assigns.is_assigned(decision) {
                decision = self.order.prev[decision];
            }
            if decision == Var::UNDEF {
                let stats = self.stats();
                let model = self.model();
                return SolveRes::SAT(model, stats);
            }

            self.stats.decisions += 1;
            let lit = decision.lit(self.assigns.model[decision]);
            self.assigns.assign_decision(lit);
        }
    }

    // Description:
    //   Two-watched-literal unit propagation over the unprocessed tail of
    //   the trail. Conflicts below the root are resolved in place: the
    //   analyzer learns a lemma, rewinds the trail, and propagation resumes
    //   from the asserted literal. Returns false on a root-level conflict.
    //
    //   The `forced` flag starts out set iff the first unprocessed literal
    //   was propagated rather than decided; while it stays set every new
    //   assignment is entailed by the formula, and the root prefix marker is
    //   advanced over them on exit.
    fn propagate(&mut self) -> bool {
        let mut forced = {
            let at = self.assigns.trail[self.assigns.processed];
            self.assigns.reason[at.var()] != 0
        };

        'trail: while self.assigns.processed < self.assigns.assigned {
            let lit = self.assigns.trail[self.assigns.processed];
            self.assigns.processed += 1;
            self.stats.propagations += 1;

            // The chain cursor is either the head entry of `lit` or a link
            // cell of the previously kept clause.
            let mut at_head = true;
            let mut cell = 0;
            let mut w = self.watches.first[lit];
            while w != watches::END {
                // A clause is reached through one of its two link cells. The
                // cell before the first one is a 0 terminator (or the arena
                // sentinel); the cell before the second is a link, never 0.
                let mut body = w as usize + 1;
                if self.arena.db[body - 2] == 0 {
                    body += 1;
                }
                // Keep the other watched literal in front.
                if self.arena.db[body] == lit.0 {
                    self.arena.db[body] = self.arena.db[body + 1];
                }

                // Scan the non-watched literals for a non-false replacement.
                let mut unit = true;
                let mut i = body + 2;
                while unit && self.arena.db[i] != 0 {
                    let x = Lit(self.arena.db[i]);
                    if self.assigns.falsified[x] == assignment::UNDEF {
                        self.arena.db[body + 1] = x.0;
                        self.arena.db[i] = lit.0;
                        unit = false;
                        let next = self.arena.db[w as usize];
                        if at_head {
                            self.watches.first[lit] = next;
                        } else {
                            self.arena.db[cell] = next;
                        }
                        self.watches.watch(&mut self.arena.db, x, w as usize);
                        w = next;
                    }
                    i += 1;
                }

                if unit {
                    // No replacement: the clause is unit or conflicting.
                    self.arena.db[body + 1] = lit.0;
                    cell = w as usize;
                    at_head = false;
                    w = self.arena.db[cell];

                    let other = Lit(self.arena.db[body]);
                    if self.assigns.falsified[!other] != assignment::UNDEF {
                        continue; // already satisfied by the other watch
                    }
                    if self.assigns.falsified[other] == assignment::UNDEF {
                        self.assigns.assign(&self.arena.db, body, forced);
                    } else {
                        if forced {
                            return false; // root-level conflict
                        }
                        self.stats.conflicts += 1;
                        let lemma = self.analyze.analyze(
                            &mut self.arena,
                            &mut self.watches,
                            &mut self.assigns,
                            &mut self.order,
                            &mut self.restart,
                            body,
                        );
                        if self.arena.db[lemma + 1] == 0 {
                            forced = true; // unit lemma: entailed from here on
                        }
                        self.assigns.assign(&self.arena.db, lemma, forced);
                        continue 'trail;
                    }
                }
            }
        }

        if forced {
            self.assigns.forced = self.assigns.processed;
        }
        true
    }

    // Description:
    //   Drop lemmas that the saved phases satisfy broadly and keep the hard
    //   ones: detach all lemma watches, rewind the arena to the irredundant
    //   boundary, then re-add every old lemma with fewer than the bound's
    //   worth of satisfied literals to the compacted region.
    fn reduce(&mut self) {
        while self.arena.n_lemmas > self.max_lemmas {
            self.max_lemmas += self.settings.reduce.max_lemmas_inc;
        }
        self.arena.n_lemmas = 0;
        self.stats.reduces += 1;

        let mem_fixed = self.arena.mem_fixed;
        self.watches.detach_lemmas(&mut self.arena.db, mem_fixed);

        let old_used = self.arena.mem_used;
        self.arena.mem_used = mem_fixed;
        let bound = self.settings.reduce.satisfied_bound;
        let mut scratch = Vec::new();
        let mut i = mem_fixed + 2;
        while i < old_used {
            scratch.clear();
            let mut satisfied = 0;
            while self.arena.db[i] != 0 {
                let lit = Lit(self.arena.db[i]);
                i += 1;
                if lit.is_pos() == self.assigns.model[lit.var()] {
                    satisfied += 1;
                }
                scratch.push(lit);
            }
            if satisfied < bound {
                self.arena.add_clause(&mut self.watches, &scratch, false);
            }
            i += 3;
        }

        debug!(
            "reduced lemma database: {} kept, limit {}",
            self.arena.n_lemmas, self.max_lemmas
        );
    }
}
