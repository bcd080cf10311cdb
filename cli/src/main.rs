//! Command-line runner for the QoS path-search engine.
//!
//! Wires flags to `qosroute_engine`'s `ExperimentRunner`; contains no search logic of its own,
//! only argument parsing, formatting, and exit-code translation (§6).

use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use log::{error, info, warn};

use qosroute_engine::error::FailureReason;
use qosroute_engine::experiment::{ExperimentRunner, ALL_ALGORITHMS};
use qosroute_engine::{graph, report, testcases};

/// `qosroute`: run the QoS-constrained path-search experiment matrix.
#[derive(Parser, Debug)]
#[command(name = "qosroute", author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a graph, run the experiment matrix, and write the report.
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Directory containing `nodes.csv` and `edges.csv` (§6 persisted formats).
    #[arg(long)]
    graph: PathBuf,
    /// Either `predefined` (the fixed 25-scenario deck) or a number of randomly generated cases.
    #[arg(long)]
    cases: String,
    /// Number of repeats per (case, algorithm) cell.
    #[arg(long, default_value_t = 5)]
    repeats: usize,
    /// Comma-separated algorithm names (`GA,ACO,PSO,SA,QL,SARSA`); defaults to all six.
    #[arg(long, value_delimiter = ',')]
    algos: Option<Vec<String>>,
    /// Master seed the whole run derives per-cell seeds from.
    #[arg(long, default_value_t = 42)]
    seed: u32,
    /// Per-cell timeout, in seconds. Unset means no timeout.
    #[arg(long)]
    timeout: Option<u64>,
    /// Output directory for `report.json` and `comparison.csv`.
    #[arg(long)]
    out: PathBuf,
}

/// Fraction of (case, algorithm, repeat) cells that must time out before the run is considered
/// a timeout failure (§6 exit code 4).
const TIMEOUT_EXIT_THRESHOLD: f64 = 0.5;

fn main() {
    pretty_env_logger::init();
    std::process::exit(run());
}

fn run() -> i32 {
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run_experiment(args),
    }
}

fn run_experiment(args: RunArgs) -> i32 {
    let node_path = args.graph.join("nodes.csv");
    let edge_path = args.graph.join("edges.csv");

    let node_file = match File::open(&node_path) {
        Ok(f) => f,
        Err(e) => {
            error!("cannot open {}: {e}", node_path.display());
            return 2;
        }
    };
    let edge_file = match File::open(&edge_path) {
        Ok(f) => f,
        Err(e) => {
            error!("cannot open {}: {e}", edge_path.display());
            return 2;
        }
    };

    let graph = match graph::Graph::from_csv(node_file, edge_file) {
        Ok(g) => g,
        Err(e) => {
            error!("failed to load graph: {e}");
            return 2;
        }
    };
    info!("loaded graph with {} nodes, {} edges", graph.node_count(), graph.edge_count());

    if !graph.is_connected() {
        error!("graph is disconnected; refusing to run the experiment matrix");
        return 3;
    }

    let test_cases = if args.cases.eq_ignore_ascii_case("predefined") {
        testcases::predefined_cases(&graph, args.seed)
    } else {
        match args.cases.parse::<usize>() {
            Ok(n) => testcases::random_cases(&graph, args.seed, n),
            Err(_) => {
                error!("--cases must be 'predefined' or a number, got '{}'", args.cases);
                return 2;
            }
        }
    };
    if test_cases.is_empty() {
        error!("no test cases to run (empty graph?)");
        return 2;
    }

    let algorithms = args.algos.unwrap_or_else(|| ALL_ALGORITHMS.iter().map(|s| s.to_string()).collect());
    let timeout = args.timeout.map(Duration::from_secs);

    let runner = ExperimentRunner::with_defaults();
    info!("running {} cases x {} algorithms x {} repeats", test_cases.len(), algorithms.len(), args.repeats);
    let experiment_report = runner.run(&graph, &test_cases, &algorithms, args.repeats, args.seed, timeout);

    if let Err(e) = std::fs::create_dir_all(&args.out) {
        error!("cannot create output directory {}: {e}", args.out.display());
        return 2;
    }

    let json_path = args.out.join("report.json");
    match report::to_json_string(&experiment_report) {
        Ok(json) => {
            if let Err(e) = std::fs::write(&json_path, json) {
                error!("cannot write {}: {e}", json_path.display());
                return 2;
            }
        }
        Err(e) => {
            error!("cannot serialize report: {e}");
            return 2;
        }
    }

    let csv_path = args.out.join("comparison.csv");
    match File::create(&csv_path) {
        Ok(f) => {
            if let Err(e) = report::write_comparison_csv(&experiment_report, f) {
                error!("cannot write {}: {e}", csv_path.display());
                return 2;
            }
        }
        Err(e) => {
            error!("cannot create {}: {e}", csv_path.display());
            return 2;
        }
    }

    info!("wrote {} and {}", json_path.display(), csv_path.display());
    print_comparison_table(&experiment_report);

    let total_cells = experiment_report.n_test_cases * algorithms.len() * experiment_report.n_repeats;
    let timeout_failures: usize = experiment_report
        .failure_report
        .details
        .iter()
        .filter(|d| d.reason == FailureReason::Timeout)
        .map(|d| d.count)
        .sum();
    if total_cells > 0 && timeout_failures as f64 / total_cells as f64 >= TIMEOUT_EXIT_THRESHOLD {
        warn!("timeout exhausted for >= {:.0}% of cells", TIMEOUT_EXIT_THRESHOLD * 100.0);
        return 4;
    }

    0
}

fn print_comparison_table(report: &report::ExperimentReport) {
    println!("{:<8} {:>8} {:>10} {:>12} {:>12} {:>10}", "algo", "success", "bw_ok", "avg_cost", "avg_ms", "best");
    for row in &report.comparison_table {
        println!(
            "{:<8} {:>7.0}% {:>9.0}% {:>12.4} {:>12.2} {:>10.4}",
            row.algorithm,
            row.success_rate * 100.0,
            row.bandwidth_satisfaction_rate * 100.0,
            row.overall_avg_cost,
            row.overall_avg_time_ms,
            row.best_cost,
        );
    }
}
