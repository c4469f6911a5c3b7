use std::path::PathBuf;

use clap::Parser;
use log::info;

use portflow::models::multimodal::model::{ModelConfig, MultimodalSolver};
use portflow::models::multimodal::sets_and_parameters::{Parameters, Sets};
use portflow::{parse, report, solution};

/// Route a set of shipments through a multi-modal transportation network at
/// minimum total cost.
#[derive(Parser, Debug)]
#[clap(version, about)]
struct Args {
    /// Path to the JSON instance file
    instance: PathBuf,
    /// Where to write the plain-text report
    #[clap(short, long, default_value = "solution.txt")]
    output: PathBuf,
    /// Also write the decoded solution as JSON
    #[clap(long)]
    json: Option<PathBuf>,
    /// Weight of the secondary earliest-arrival objective; zero disables it
    #[clap(long, default_value_t = 1e-4)]
    arrival_tiebreak: f64,
    /// Show the solver log
    #[clap(long)]
    solver_output: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let problem = match parse::read_instance(&args.instance) {
        Ok(problem) => problem,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    info!(
        "{} shipments over {} ports and {} days",
        problem.shipments().len(),
        problem.ports().len(),
        problem.date_span()
    );

    let sets = Sets::new(&problem);
    let parameters = Parameters::new(&problem, &sets);
    let config = ModelConfig {
        arrival_tiebreak: args.arrival_tiebreak,
        solver_output: args.solver_output,
    };

    let solved = match MultimodalSolver::solve(&sets, &parameters, &config) {
        Ok(solved) => solved,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let solution = solution::decode(&problem, &sets, &parameters, &solved);
    let txt = report::render(&solution);

    if let Err(e) = std::fs::write(&args.output, &txt) {
        eprintln!("could not write {}: {}", args.output.display(), e);
        std::process::exit(1);
    }

    if let Some(path) = &args.json {
        let file = match std::fs::File::create(path) {
            Ok(file) => file,
            Err(e) => {
                eprintln!("could not write {}: {}", path.display(), e);
                std::process::exit(1);
            }
        };
        serde_json::to_writer_pretty(file, &solution).expect("writing failed");
    }

    println!("{}", txt);
}
