//! Batch summary.

use serde::Serialize;
use std::time::Duration;

use crate::types::ItemOutcome;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cache_hits: usize,
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[ItemOutcome], elapsed: Duration) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        Self {
            total: outcomes.len(),
            succeeded,
            failed: outcomes.len() - succeeded,
            cache_hits: outcomes.iter().filter(|o| o.served_from_cache).count(),
            elapsed,
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.total as f64
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}
