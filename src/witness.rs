use crate::{corpus::Benchmark, outcome::RunOutcome};
use anyhow::Context;
use log::debug;
use process_control::{ChildExt, Control};
use std::{
    io::{self, Read, Write},
    path::PathBuf,
    process::{Command, Stdio},
    thread,
    time::Duration,
};

// The checker's last line is either
//   Trace is a witness for: { b0 }
// for a correct trace, or
//   Trace is a witness for: { }
// for a bad one.
const VERDICT_PREFIX: &str = "Trace is a witness for: {";

/// Independent counterexample checker, backed by an external `aigsim`
/// process.
pub struct WitnessChecker {
    aigsim: PathBuf,
    time_limit: Duration,
}

impl WitnessChecker {
    pub fn new(aigsim: impl Into<PathBuf>, time_limit: Duration) -> Self {
        Self {
            aigsim: aigsim.into(),
            time_limit,
        }
    }

    /// Feed `trace` to the checker with the benchmark path as argument and
    /// interpret its verdict: `Unsafe` for a confirmed trace, `Invalid` for
    /// a rejected one. Malformed checker output is a harness error.
    pub fn check(&self, benchmark: &Benchmark, trace: &str) -> anyhow::Result<RunOutcome> {
        let output = self.run_checker(benchmark, trace)?;
        verdict(&output)
    }

    fn run_checker(&self, benchmark: &Benchmark, trace: &str) -> anyhow::Result<String> {
        let (mut reader, writer) = io::pipe()?;
        let mut cmd = Command::new(&self.aigsim);
        cmd.arg("-w")
            .arg(&benchmark.path)
            .stdin(Stdio::piped())
            .stdout(writer.try_clone()?)
            .stderr(writer);
        let mut child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn witness checker {}", self.aigsim.display()))?;
        drop(cmd);
        let output = thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = reader.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        });
        // Fed from its own thread so a checker that never drains stdin
        // still hits the time limit below instead of wedging the harness.
        let stdin = child.stdin.take();
        let trace = trace.to_string();
        let feeder = thread::spawn(move || {
            if let Some(mut stdin) = stdin
                && let Err(e) = stdin.write_all(trace.as_bytes())
            {
                debug!("witness checker closed stdin early: {e}");
            }
        });
        let status = child
            .controlled()
            .time_limit(self.time_limit)
            .terminate_for_timeout()
            .wait()?;
        let Some(status) = status else {
            anyhow::bail!(
                "witness checker timed out after {} s",
                self.time_limit.as_secs()
            );
        };
        if !status.success() {
            debug!("witness checker exited with {status:?}");
        }
        let _ = feeder.join();
        output
            .join()
            .map_err(|_| anyhow::anyhow!("witness checker output reader panicked"))
    }
}

fn verdict(output: &str) -> anyhow::Result<RunOutcome> {
    let Some(last) = output.lines().rev().find(|l| !l.trim().is_empty()) else {
        anyhow::bail!("witness checker produced no output");
    };
    let tokens = last
        .trim()
        .strip_prefix(VERDICT_PREFIX)
        .and_then(|rest| rest.strip_suffix('}'))
        .ok_or_else(|| anyhow::anyhow!("malformed witness checker verdict: {last:?}"))?;
    if tokens.trim().starts_with("b0") {
        Ok(RunOutcome::Unsafe)
    } else {
        Ok(RunOutcome::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, os::unix::fs::PermissionsExt, path::Path};

    #[test]
    fn confirmed_trace_is_unsafe() {
        let out = "states simulated\nTrace is a witness for: { b0 }\n";
        assert_eq!(verdict(out).unwrap(), RunOutcome::Unsafe);
    }

    #[test]
    fn rejected_trace_is_invalid() {
        let out = "Trace is a witness for: {  }\n";
        assert_eq!(verdict(out).unwrap(), RunOutcome::Invalid);
        let out = "Trace is a witness for: { b1 }\n";
        assert_eq!(verdict(out).unwrap(), RunOutcome::Invalid);
    }

    #[test]
    fn malformed_verdict_is_an_error() {
        assert!(verdict("").is_err());
        assert!(verdict("\n  \n").is_err());
        assert!(verdict("simulation aborted\n").is_err());
    }

    #[test]
    fn verdict_reads_only_the_final_nonempty_line() {
        let out = "Trace is a witness for: { b0 }\nTrace is a witness for: {  }\n\n";
        assert_eq!(verdict(out).unwrap(), RunOutcome::Invalid);
    }

    fn fake_checker(dir: &Path, script: &str) -> PathBuf {
        let path = dir.join("aigsim");
        fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn bench() -> Benchmark {
        Benchmark {
            path: PathBuf::from("/corpus/a.aig"),
            relative: "a.aig".to_string(),
        }
    }

    #[test]
    fn runs_external_checker_with_trace_on_stdin() {
        let dir = tempfile::tempdir().unwrap();
        // Echoes b0 only if the trace arrived intact.
        let script = fake_checker(
            dir.path(),
            "trace=$(cat)\n\
             if [ \"$trace\" = \".i 1\" ]; then echo 'Trace is a witness for: { b0 }'; \
             else echo 'Trace is a witness for: {  }'; fi",
        );
        let checker = WitnessChecker::new(&script, Duration::from_secs(5));
        assert_eq!(
            checker.check(&bench(), ".i 1").unwrap(),
            RunOutcome::Unsafe
        );
        assert_eq!(
            checker.check(&bench(), ".i 2").unwrap(),
            RunOutcome::Invalid
        );
    }

    #[test]
    fn hung_checker_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let script = fake_checker(dir.path(), "sleep 30");
        let checker = WitnessChecker::new(&script, Duration::from_millis(200));
        assert!(checker.check(&bench(), "").is_err());
    }
}
