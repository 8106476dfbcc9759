use crate::{
    classify,
    config::{Config, Tool},
    corpus::{self, Benchmark},
    outcome::RunOutcome,
    supervise::{self, RunStatus},
    witness::WitnessChecker,
};
use log::{debug, error, info, warn};
use std::time::Duration;

/// Evaluate the whole corpus, one benchmark at a time. Concurrency exists
/// only inside a benchmark's tool cohort, never across benchmarks, so
/// unrelated benchmarks cannot contend for resources.
pub fn run(cfg: &Config) -> anyhow::Result<()> {
    let benchmarks = corpus::discover(&cfg.corpus)?;
    if benchmarks.is_empty() {
        warn!("no benchmarks found under {}", cfg.corpus.display());
        return Ok(());
    }
    info!(
        "{} benchmarks, {} tools, {} s timeout per cohort",
        benchmarks.len(),
        cfg.tools.len(),
        cfg.timeout
    );
    let checker = cfg
        .aigsim
        .as_ref()
        .map(|p| WitnessChecker::new(p, Duration::from_secs(cfg.timeout)));
    let width = cfg.tools.iter().map(|t| t.name.len() + 1).max().unwrap_or(0);
    for benchmark in benchmarks.iter() {
        run_benchmark(cfg, checker.as_ref(), benchmark, width);
    }
    Ok(())
}

fn run_benchmark(
    cfg: &Config,
    checker: Option<&WitnessChecker>,
    benchmark: &Benchmark,
    width: usize,
) {
    let statuses = supervise::run_cohort(&cfg.tools, benchmark, Duration::from_secs(cfg.timeout));
    println!("{}", benchmark.relative);
    for (tool, status) in cfg.tools.iter().zip(statuses) {
        let line = match status {
            Ok(status) => report_status(tool, benchmark, status, checker, cfg.timeout),
            Err(e) => harness_error(tool, benchmark, e),
        };
        println!("\t{:<width$} {}", format!("{}:", tool.name), line);
    }
}

fn report_status(
    tool: &Tool,
    benchmark: &Benchmark,
    status: RunStatus,
    checker: Option<&WitnessChecker>,
    timeout: u64,
) -> String {
    let outcome = match status {
        RunStatus::Timeout => RunOutcome::Timeout,
        RunStatus::Failure(status) => {
            debug!("{} on {}: exit {status:?}", tool.name, benchmark.relative);
            RunOutcome::Failure
        }
        RunStatus::Finished(output) => {
            match classify::classify(tool, benchmark, &output, checker) {
                Ok(outcome) => outcome,
                Err(e) => return harness_error(tool, benchmark, e),
            }
        }
    };
    outcome.describe(timeout)
}

fn harness_error(tool: &Tool, benchmark: &Benchmark, e: anyhow::Error) -> String {
    error!("{} on {}: {e:#}", tool.name, benchmark.relative);
    format!("harness error: {e:#}")
}
