//! Per-location outcome summary of a batch run

use std::fmt::Display;
use std::process::ExitCode;
use tracing::{info, warn};

/// Result for a single location (or artifact) of a run
#[derive(Debug)]
pub struct Outcome<T, E> {
    /// Location name, or the artifact file name when no location is known
    pub key: String,
    pub result: Result<T, E>,
}

/// Ordered outcomes of one batch run, one per input
#[derive(Debug)]
pub struct RunReport<T, E> {
    stage: &'static str,
    outcomes: Vec<Outcome<T, E>>,
}

impl<T, E: Display> RunReport<T, E> {
    #[must_use]
    pub fn new(stage: &'static str) -> Self {
        Self {
            stage,
            outcomes: Vec::new(),
        }
    }

    /// Record an outcome, logging failures with their key
    pub fn record(&mut self, key: impl Into<String>, result: Result<T, E>) {
        let key = key.into();
        if let Err(e) = &result {
            warn!(stage = self.stage, location = %key, "Failed: {}", e);
        }
        self.outcomes.push(Outcome { key, result });
    }

    #[must_use]
    pub fn outcomes(&self) -> &[Outcome<T, E>] {
        &self.outcomes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// 0 when every location succeeded, 1 otherwise
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        if self.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }

    /// One line per outcome, then the totals
    pub fn log_summary(&self) {
        for outcome in &self.outcomes {
            match &outcome.result {
                Ok(_) => info!(stage = self.stage, location = %outcome.key, "ok"),
                Err(e) => warn!(stage = self.stage, location = %outcome.key, "FAILED: {}", e),
            }
        }
        info!(
            stage = self.stage,
            "{} of {} succeeded, {} failed",
            self.succeeded(),
            self.len(),
            self.failed()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let mut report: RunReport<u32, String> = RunReport::new("fetch");
        assert!(report.is_success());

        report.record("Zurich", Ok(1));
        report.record("Payerne", Err("timeout".to_string()));
        report.record("Lugano", Ok(3));

        assert_eq!(report.len(), 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_success());

        let keys: Vec<&str> = report.outcomes().iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["Zurich", "Payerne", "Lugano"]);
    }
}
