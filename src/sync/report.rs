use std::fmt;

use crate::render::WriteOutcome;

/// A unit of work (one event, one date) that did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFailure {
    pub unit: String,
    pub reason: String,
}

impl fmt::Display for UnitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.unit, self.reason)
    }
}

/// Counts for one batch. Skipped units were left untouched on purpose
/// (malformed documents, unknown ids); failed units hit an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failures: Vec<UnitFailure>,
}

impl SyncReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: WriteOutcome) {
        match outcome {
            WriteOutcome::Created => self.created += 1,
            WriteOutcome::Updated => self.updated += 1,
        }
    }

    pub fn skip(&mut self, unit: impl Into<String>, reason: impl ToString) {
        self.skipped += 1;
        self.push_failure(unit.into(), reason.to_string());
    }

    pub fn fail(&mut self, unit: impl Into<String>, reason: impl ToString) {
        self.failed += 1;
        self.push_failure(unit.into(), reason.to_string());
    }

    fn push_failure(&mut self, unit: String, reason: String) {
        self.failures.push(UnitFailure { unit, reason });
    }

    pub fn merge(&mut self, other: SyncReport) {
        self.created += other.created;
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.failures.extend(other.failures);
    }

    pub fn has_failures(&self) -> bool {
        self.skipped + self.failed > 0
    }

    pub fn total(&self) -> usize {
        self.created + self.updated + self.skipped + self.failed
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} skipped, {} failed",
            self.created, self.updated, self.skipped, self.failed
        )
    }
}
