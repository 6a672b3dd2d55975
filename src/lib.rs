use std::{fs, io, path};
use log::info;
use crate::sat::{dimacs, SolveRes, Solver, Stats};
use crate::sat::cdcl::{budget::Budget, CoreSolver, Settings};

pub mod sat;


pub struct MainOptions {
    pub strict: bool,
    pub max_conflicts: Option<u64>,
    pub in_path: path::PathBuf,
    pub out_path: Option<path::PathBuf>,
}


/// Parse, solve and report. Returns the process exit code: 10 for SAT, 20
/// for UNSAT, 0 for an interrupted run, per the DIMACS convention.
pub fn solve_file(options: MainOptions) -> io::Result<i32> {
    let initial_time = time::precise_time_s();

    info!("============================[ Problem Statistics ]=============================");
    info!("|                                                                             |");

    let solver = dimacs::parse_file(&options.in_path, options.strict, |vars, clauses| {
        CoreSolver::new(Settings::default(), vars, clauses)
    })?;

    info!("|  Number of variables:  {:12}                                         |", solver.n_vars());
    info!("|  Number of clauses:    {:12}                                         |", solver.n_clauses());

    let parsed_time = time::precise_time_s();
    info!("|  Parse time:           {:12.2} s                                       |", parsed_time - initial_time);
    info!("|                                                                             |");
    info!("===============================================================================");

    let mut budget = Budget::new();
    if let Some(conflicts) = options.max_conflicts {
        budget.limit_conflicts(conflicts);
    }

    let result = solver.solve_limited(&budget);
    print_stats(result_stats(&result), time::precise_time_s() - parsed_time);

    if let SolveRes::SAT(ref model, _) = result {
        assert!(
            dimacs::validate_model_file(&options.in_path, model)?,
            "SELF-CHECK FAILED!"
        );
    }

    if let Some(ref out_path) = options.out_path {
        let mut out = fs::File::create(out_path)?;
        dimacs::write_result(&mut out, &result)?;
    }

    match result {
        SolveRes::SAT(model, _) => {
            println!("s SATISFIABLE");
            print!("v");
            for lit in model.iter() {
                print!(" {}", lit);
            }
            println!(" 0");
            Ok(10)
        }

        SolveRes::UnSAT(_) => {
            println!("s UNSATISFIABLE");
            Ok(20)
        }

        SolveRes::Interrupted(_, _) => {
            println!("s UNKNOWN");
            Ok(0)
        }
    }
}


fn result_stats<S>(result: &SolveRes<S>) -> &Stats {
    match result {
        SolveRes::UnSAT(stats) => stats,
        SolveRes::SAT(_, stats) => stats,
        SolveRes::Interrupted(stats, _) => stats,
    }
}

fn print_stats(stats: &Stats, cpu_time: f64) {
    info!("restarts              : {:12}", stats.restarts);
    info!("reduces               : {:12}", stats.reduces);
    info!("conflicts             : {:12}   ({:.0} /sec)", stats.conflicts, (stats.conflicts as f64) / cpu_time);
    info!("decisions             : {:12}   ({:.0} /sec)", stats.decisions, (stats.decisions as f64) / cpu_time);
    info!("propagations          : {:12}   ({:.0} /sec)", stats.propagations, (stats.propagations as f64) / cpu_time);
    info!("conflict literals     : {:12}   ({:4.2} % deleted)",
        stats.tot_literals,
        (stats.del_literals as f64) * 100.0 / ((stats.del_literals + stats.tot_literals) as f64)
    );
    info!("CPU time              : {:12.3} s", cpu_time);
    info!("");
}
