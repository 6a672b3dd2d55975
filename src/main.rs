use std::{path, process};
use std::io::Write;
use clap::{crate_version, App, Arg};
use log::LevelFilter;
use tinysat_rust::{solve_file, MainOptions};


fn main() {
    let matches = App::new("tinysat")
        .version(crate_version!())
        .about("Minimalist CDCL SAT solver")
        .arg(Arg::with_name("verb").long("verb").takes_value(true).possible_values(&["0", "1", "2"]).help("Verbosity level (0=silent, 1=some, 2=more)"))
        .arg(Arg::with_name("strict").long("strict").help("Validate DIMACS header during parsing"))
        .arg(Arg::with_name("max-conflicts").long("max-conflicts").takes_value(true).help("Give up with an UNKNOWN answer after this many conflicts"))
        .arg(Arg::with_name("input").required(true))
        .arg(Arg::with_name("output").required(false))
        .get_matches();

    {
        let mut builder = env_logger::Builder::new();
        builder.format(|buf, record| writeln!(buf, "{}", record.args()));
        builder.filter(
            None,
            matches
                .value_of("verb")
                .map(|v| match v {
                    "1" => LevelFilter::Info,
                    "2" => LevelFilter::Trace,
                    _ => LevelFilter::Off,
                })
                .unwrap_or(LevelFilter::Info),
        );
        builder.init();
    }

    let options = MainOptions {
        strict: matches.is_present("strict"),
        max_conflicts: matches.value_of("max-conflicts").and_then(|s| s.parse().ok()),
        in_path: path::PathBuf::from(matches.value_of("input").unwrap()),
        out_path: matches.value_of("output").map(path::PathBuf::from),
    };

    match solve_file(options) {
        Ok(code) => {
            process::exit(code);
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            process::exit(1);
        }
    }
}
