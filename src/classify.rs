use crate::{config::Tool, corpus::Benchmark, outcome::RunOutcome, witness::WitnessChecker};

/// Verdict encoded by a tool's output, before witness validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Safe,
    /// Claimed violation, carrying the candidate counterexample trace
    /// (the retained lines after the verdict line, joined with newlines).
    Unsafe(String),
    Unknown,
}

fn retained(output: &str) -> Vec<&str> {
    output
        .lines()
        .filter(|line| !line.starts_with(['c', 'u']) && !line.trim().is_empty())
        .map(str::trim)
        .collect()
}

/// Parse the verdict line out of a tool's full captured output.
///
/// Lines that are blank or start with the comment marker `c` or the
/// informational marker `u` are dropped; the first remaining line must be
/// one of the literal tokens `0`, `1` or `2`. Anything else is a
/// harness-level error, not a verification verdict.
pub fn parse_verdict(output: &str) -> anyhow::Result<Verdict> {
    let lines = retained(output);
    let Some((first, trace)) = lines.split_first() else {
        anyhow::bail!("tool produced no verdict line");
    };
    match *first {
        "0" => Ok(Verdict::Safe),
        "1" => Ok(Verdict::Unsafe(trace.join("\n"))),
        "2" => Ok(Verdict::Unknown),
        other => anyhow::bail!("unrecognized verdict line: {other:?}"),
    }
}

/// Classify the captured output of a zero-exit tool run. An `Unsafe` claim
/// from a tool with `validate` set is only trusted once the witness checker
/// corroborates the trace.
pub fn classify(
    tool: &Tool,
    benchmark: &Benchmark,
    output: &str,
    checker: Option<&WitnessChecker>,
) -> anyhow::Result<RunOutcome> {
    match parse_verdict(output)? {
        Verdict::Safe => Ok(RunOutcome::Safe),
        Verdict::Unknown => Ok(RunOutcome::Unknown),
        Verdict::Unsafe(_) if !tool.validate => Ok(RunOutcome::Unsafe),
        Verdict::Unsafe(trace) => {
            let Some(checker) = checker else {
                anyhow::bail!("tool {} requires witness validation, no checker", tool.name);
            };
            checker.check(benchmark, &trace)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn tool(validate: bool) -> Tool {
        Tool {
            name: "bmc".to_string(),
            cmd: vec!["bmc".to_string(), "$aiger".to_string()],
            validate,
        }
    }

    fn bench() -> Benchmark {
        Benchmark {
            path: PathBuf::from("/corpus/a.aig"),
            relative: "a.aig".to_string(),
        }
    }

    #[test]
    fn safe_unknown_tokens() {
        assert_eq!(parse_verdict("0\n").unwrap(), Verdict::Safe);
        assert_eq!(parse_verdict("2\n").unwrap(), Verdict::Unknown);
    }

    #[test]
    fn comment_and_blank_lines_are_skipped() {
        let out = "c solver banner\nu 10\nu 20\n\n   \n0\n";
        assert_eq!(parse_verdict(out).unwrap(), Verdict::Safe);
    }

    #[test]
    fn unsafe_carries_subsequent_retained_lines() {
        let out = "1\n.i 1\nc noise\n.o 0\n\n.end\n";
        assert_eq!(
            parse_verdict(out).unwrap(),
            Verdict::Unsafe(".i 1\n.o 0\n.end".to_string())
        );
    }

    #[test]
    fn empty_or_unrecognized_output_is_an_error() {
        assert!(parse_verdict("").is_err());
        assert!(parse_verdict("c only comments\nu 3\n\n").is_err());
        assert!(parse_verdict("3\n").is_err());
        assert!(parse_verdict("SAT\n").is_err());
    }

    #[test]
    fn parsing_is_idempotent() {
        let out = "c x\n1\n.s1\n";
        assert_eq!(parse_verdict(out).unwrap(), parse_verdict(out).unwrap());
    }

    #[test]
    fn unsafe_without_validation_is_trusted() {
        let out = "1\n.i 1\n";
        let res = classify(&tool(false), &bench(), out, None).unwrap();
        assert_eq!(res, RunOutcome::Unsafe);
    }

    #[test]
    fn classify_end_to_end_example() {
        let res = classify(&tool(false), &bench(), "c comment\n0\n", None).unwrap();
        assert_eq!(res, RunOutcome::Safe);
    }
}
