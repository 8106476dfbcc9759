/// Final result of running one tool on one benchmark.
///
/// Detection precedence: a process that exceeds the cohort deadline is
/// `Timeout` regardless of any partial output, a non-zero exit is `Failure`
/// regardless of output content, and only a clean zero-status exit reaches
/// output classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The tool asserts the property holds.
    Safe,
    /// The tool asserts a violation and its counterexample stands.
    Unsafe,
    /// The tool could not decide.
    Unknown,
    /// The process did not terminate within the cohort deadline.
    Timeout,
    /// The process exited with a non-zero status.
    Failure,
    /// The tool claimed unsafe but its counterexample failed validation.
    Invalid,
}

impl RunOutcome {
    /// Report rendering. `timeout` is the configured cohort deadline in
    /// seconds, shown only for `Timeout`.
    pub fn describe(self, timeout: u64) -> String {
        match self {
            RunOutcome::Safe => "safe".to_string(),
            RunOutcome::Unsafe => "unsafe".to_string(),
            RunOutcome::Unknown => "unknown".to_string(),
            RunOutcome::Timeout => format!("TIMEOUT after {timeout} s"),
            RunOutcome::Failure => "FAILED with non-zero exit code".to_string(),
            RunOutcome::Invalid => "claims unsafe, but with INCORRECT WITNESS".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_timeout_includes_deadline() {
        assert_eq!(RunOutcome::Timeout.describe(60), "TIMEOUT after 60 s");
        assert_eq!(RunOutcome::Timeout.describe(5), "TIMEOUT after 5 s");
    }

    #[test]
    fn describe_is_distinct_per_outcome() {
        let all = [
            RunOutcome::Safe,
            RunOutcome::Unsafe,
            RunOutcome::Unknown,
            RunOutcome::Timeout,
            RunOutcome::Failure,
            RunOutcome::Invalid,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in all.iter().skip(i + 1) {
                assert_ne!(a.describe(60), b.describe(60));
            }
        }
    }
}
