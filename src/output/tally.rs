//! Per-pass success and failure tally

use std::collections::BTreeMap;

/// Counts outcomes of one pass, failures grouped by a short kind label
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunTally {
    pub succeeded: u64,
    pub failures: BTreeMap<&'static str, u64>,
    /// Records deliberately left out (filtered names, unions)
    pub skipped: BTreeMap<&'static str, u64>,
}

impl RunTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, kind: &'static str) {
        *self.failures.entry(kind).or_insert(0) += 1;
    }

    pub fn record_skip(&mut self, reason: &'static str) {
        *self.skipped.entry(reason).or_insert(0) += 1;
    }

    pub fn failed(&self) -> u64 {
        self.failures.values().sum()
    }

    pub fn skipped_total(&self) -> u64 {
        self.skipped.values().sum()
    }

    /// Logs the tally and prints it to stdout
    pub fn report(&self, pass: &str) {
        tracing::info!(
            pass,
            succeeded = self.succeeded,
            failed = self.failed(),
            skipped = self.skipped_total(),
            "Pass finished"
        );

        println!("=== {} ===", pass);
        println!("  Succeeded: {}", self.succeeded);
        println!("  Failed: {}", self.failed());
        for (kind, count) in &self.failures {
            println!("    {}: {}", kind, count);
        }
        if !self.skipped.is_empty() {
            println!("  Skipped: {}", self.skipped_total());
            for (reason, count) in &self.skipped {
                println!("    {}: {}", reason, count);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_counts() {
        let mut tally = RunTally::new();
        tally.record_success();
        tally.record_success();
        tally.record_failure("arity_mismatch");
        tally.record_failure("arity_mismatch");
        tally.record_failure("fetch_failed");
        tally.record_skip("union_declaration");

        assert_eq!(tally.succeeded, 2);
        assert_eq!(tally.failed(), 3);
        assert_eq!(tally.failures["arity_mismatch"], 2);
        assert_eq!(tally.skipped_total(), 1);
    }
}
