use std::io;
use std::io::{Read, Seek, Write};
use tinysat_rust::sat::{dimacs, SolveRes, Solver};
use tinysat_rust::sat::cdcl::{budget::Budget, CoreSolver, Settings};
use tinysat_rust::sat::formula::Lit;


fn solver_for(n_vars: usize, clauses: &[Vec<i32>]) -> CoreSolver {
    let mut solver = CoreSolver::new(Settings::default(), n_vars, clauses.len());
    for clause in clauses {
        let lits: Vec<Lit> = clause.iter().map(|&l| Lit::new(l)).collect();
        solver.add_clause(&lits);
    }
    solver
}

fn solve(n_vars: usize, clauses: &[Vec<i32>]) -> SolveRes<CoreSolver> {
    solver_for(n_vars, clauses).solve_limited(&Budget::new())
}

fn assert_sat(result: SolveRes<CoreSolver>, clauses: &[Vec<i32>]) -> Vec<Lit> {
    match result {
        SolveRes::SAT(model, _) => {
            check_model(clauses, &model);
            model
        }
        SolveRes::UnSAT(_) => panic!("expected SAT, got UNSAT"),
        SolveRes::Interrupted(_, _) => panic!("expected SAT, got an interrupted run"),
    }
}

fn assert_unsat(result: SolveRes<CoreSolver>) {
    match result {
        SolveRes::UnSAT(_) => {}
        SolveRes::SAT(_, _) => panic!("expected UNSAT, got SAT"),
        SolveRes::Interrupted(_, _) => panic!("expected UNSAT, got an interrupted run"),
    }
}

fn check_model(clauses: &[Vec<i32>], model: &[Lit]) {
    for (i, lit) in model.iter().enumerate() {
        assert_eq!(lit.var().index(), i + 1, "model literals out of order");
    }
    for clause in clauses {
        let satisfied = clause
            .iter()
            .any(|&l| model[l.abs() as usize - 1].is_pos() == (l > 0));
        assert!(satisfied, "clause {:?} not satisfied by the model", clause);
    }
}

fn brute_force_sat(n_vars: usize, clauses: &[Vec<i32>]) -> bool {
    for mask in 0u32..(1 << n_vars) {
        let satisfied = clauses.iter().all(|clause| {
            clause
                .iter()
                .any(|&l| ((mask >> (l.abs() - 1)) & 1 == 1) == (l > 0))
        });
        if satisfied {
            return true;
        }
    }
    false
}

/// Standard pigeonhole encoding: variable (i - 1) * holes + j says pigeon i
/// sits in hole j.
fn pigeonhole(pigeons: i32, holes: i32) -> (usize, Vec<Vec<i32>>) {
    let var = |i: i32, j: i32| (i - 1) * holes + j;
    let mut clauses = Vec::new();
    for i in 1..=pigeons {
        clauses.push((1..=holes).map(|j| var(i, j)).collect());
    }
    for j in 1..=holes {
        for i in 1..=pigeons {
            for k in (i + 1)..=pigeons {
                clauses.push(vec![-var(i, j), -var(k, j)]);
            }
        }
    }
    ((pigeons * holes) as usize, clauses)
}


#[test]
fn empty_clause_set_is_sat() {
    let model = assert_sat(solve(1, &[]), &[]);
    assert_eq!(model, vec![Lit::new(-1)]);
}

#[test]
fn conflicting_units_surface_before_solving() {
    let mut solver = CoreSolver::new(Settings::default(), 1, 2);
    assert!(solver.add_clause(&[Lit::new(1)]));
    assert!(!solver.add_clause(&[Lit::new(-1)]));
    assert_unsat(solver.solve_limited(&Budget::new()));
}

#[test]
fn empty_clause_surfaces_before_solving() {
    let mut solver = CoreSolver::new(Settings::default(), 2, 1);
    assert!(!solver.add_clause(&[]));
    assert_unsat(solver.solve_limited(&Budget::new()));
}

#[test]
fn unit_chain_is_sat_without_decisions() {
    let clauses = vec![vec![1], vec![-1, 2], vec![-2, 3]];
    let result = solve(3, &clauses);
    let stats = match &result {
        SolveRes::SAT(_, stats) => *stats,
        _ => panic!("expected SAT"),
    };
    let model = assert_sat(result, &clauses);
    assert_eq!(model, vec![Lit::new(1), Lit::new(2), Lit::new(3)]);
    assert_eq!(stats.decisions, 0);
}

#[test]
fn two_sat_instance_has_model() {
    let clauses = vec![vec![1, 2], vec![-1, 3], vec![-2, -3]];
    assert_sat(solve(3, &clauses), &clauses);
}

#[test]
fn two_variable_contradiction_is_unsat() {
    let clauses = vec![vec![1, 2], vec![1, -2], vec![-1, 2], vec![-1, -2]];
    assert_unsat(solve(2, &clauses));
}

#[test]
fn pigeonhole_3_2_is_unsat() {
    let (n_vars, clauses) = pigeonhole(3, 2);
    assert_eq!(n_vars, 6);
    assert_eq!(clauses.len(), 9);
    assert_unsat(solve(n_vars, &clauses));
}

#[test]
fn xor_chain_is_unsat() {
    let clauses = vec![
        vec![1, 2],
        vec![-1, -2],
        vec![2, 3],
        vec![-2, -3],
        vec![3, 1],
        vec![-3, -1],
    ];
    assert_unsat(solve(3, &clauses));
}

#[test]
fn random_3sat_agrees_with_brute_force() {
    // Multiplicative congruential generator, fixed seed.
    struct Random {
        seed: f64,
    }

    impl Random {
        fn drand(&mut self) -> f64 {
            self.seed *= 1389796.0;
            let q = (self.seed / 2147483647.0) as i32;
            self.seed -= (q as f64) * 2147483647.0;
            self.seed / 2147483647.0
        }

        fn irand(&mut self, size: usize) -> usize {
            (self.drand() * (size as f64)) as usize
        }
    }

    let n_vars = 20;
    let mut rand = Random { seed: 91648253.0 };
    let mut clauses = Vec::new();
    while clauses.len() < 60 {
        let mut vars = Vec::new();
        while vars.len() < 3 {
            let v = rand.irand(n_vars) as i32 + 1;
            if !vars.contains(&v) {
                vars.push(v);
            }
        }
        clauses.push(
            vars.into_iter()
                .map(|v| if rand.drand() < 0.5 { -v } else { v })
                .collect::<Vec<i32>>(),
        );
    }

    let expected = brute_force_sat(n_vars, &clauses);
    match solve(n_vars, &clauses) {
        SolveRes::SAT(model, _) => {
            assert!(expected, "solver found a model for an unsatisfiable instance");
            check_model(&clauses, &model);
        }
        SolveRes::UnSAT(_) => {
            assert!(!expected, "solver reported UNSAT on a satisfiable instance");
        }
        SolveRes::Interrupted(_, _) => panic!("unbudgeted run was interrupted"),
    }
}

#[test]
fn conflict_budget_interrupts_the_search() {
    let (n_vars, clauses) = pigeonhole(4, 3);
    let mut budget = Budget::new();
    budget.limit_conflicts(1);
    match solver_for(n_vars, &clauses).solve_limited(&budget) {
        SolveRes::Interrupted(stats, solver) => {
            assert!(stats.conflicts >= 1);
            // The returned solver can finish the job with the budget lifted.
            assert_unsat(solver.solve_limited(&Budget::new()));
        }
        _ => panic!("expected an interrupted run"),
    }
}

#[test]
fn solved_pigeonhole_collects_search_stats() {
    let (n_vars, clauses) = pigeonhole(4, 3);
    match solver_for(n_vars, &clauses).solve_limited(&Budget::new()) {
        SolveRes::UnSAT(stats) => {
            assert!(stats.conflicts > 0);
            assert!(stats.decisions > 0);
            assert!(stats.propagations > 0);
            assert!(stats.tot_literals > 0);
        }
        _ => panic!("expected UNSAT"),
    }
}

#[test]
fn parses_dimacs_with_comments() {
    let input = "c sample instance\np cnf 3 3\nc body comment\n1 2 0\n-1 3 0\n-2 -3 0\n";
    let solver = dimacs::parse(io::Cursor::new(input), true, |vars, clauses| {
        assert_eq!(vars, 3);
        assert_eq!(clauses, 3);
        CoreSolver::new(Settings::default(), vars, clauses)
    })
    .expect("parse failed");

    let clauses = vec![vec![1, 2], vec![-1, 3], vec![-2, -3]];
    let model = assert_sat(solver.solve_limited(&Budget::new()), &clauses);
    assert!(dimacs::validate_model(io::Cursor::new(input), &model).expect("validate failed"));
}

#[test]
fn strict_mode_rejects_header_mismatch() {
    let input = "p cnf 2 2\n1 2 0\n";
    let result = dimacs::parse(io::Cursor::new(input), true, |vars, clauses| {
        CoreSolver::new(Settings::default(), vars, clauses)
    });
    assert!(result.is_err());
}

#[test]
fn literals_outside_declared_range_are_rejected() {
    let input = "p cnf 2 1\n1 7 0\n";
    let result = dimacs::parse(io::Cursor::new(input), false, |vars, clauses| {
        CoreSolver::new(Settings::default(), vars, clauses)
    });
    assert!(result.is_err());
}

#[test]
fn gzipped_input_is_decoded_transparently() {
    let input = "p cnf 2 2\n1 2 0\n-1 2 0\n";
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    {
        let mut encoder =
            flate2::write::GzEncoder::new(file.as_file_mut(), flate2::Compression::default());
        encoder.write_all(input.as_bytes()).expect("gz write");
        encoder.finish().expect("gz finish");
    }

    let solver = dimacs::parse_file(file.path(), true, |vars, clauses| {
        CoreSolver::new(Settings::default(), vars, clauses)
    })
    .expect("parse failed");

    let clauses = vec![vec![1, 2], vec![-1, 2]];
    let model = assert_sat(solver.solve_limited(&Budget::new()), &clauses);
    assert!(model.contains(&Lit::new(2)));
}

#[test]
fn result_files_round_trip() {
    let clauses = vec![vec![1], vec![-1, 2]];
    let result = solve(2, &clauses);

    let mut out = tempfile::tempfile().expect("temp file");
    dimacs::write_result(&mut out, &result).expect("write failed");
    out.seek(io::SeekFrom::Start(0)).expect("seek failed");

    let mut written = String::new();
    out.read_to_string(&mut written).expect("read failed");
    assert_eq!(written, "SAT\n1 2 0\n");

    let mut out = Vec::new();
    dimacs::write_result(&mut out, &solve(2, &[vec![1], vec![-1]])).expect("write failed");
    assert_eq!(out, b"UNSAT\n");
}
