//! Reporting collaborator for batch runs.

use tracing::{debug, info, warn};

use crate::batch::BatchSummary;
use crate::extract::{FieldFailure, Rejection};

/// Receives per-record events from a [`BatchParser`](crate::BatchParser).
///
/// Injected rather than global so callers decide where diagnostics go.
/// Events arrive on the caller's thread in input order.
pub trait BatchReporter: Send + Sync {
    /// No pattern matched; the record was classified as `other`.
    fn unmatched(&self, index: usize, body: &str);

    /// A captured field could not be parsed and was set to `None`.
    fn field_failure(&self, index: usize, failure: &FieldFailure);

    /// The record was dropped.
    fn rejected(&self, index: usize, reason: &Rejection);

    /// Called once at the end of every non-empty batch.
    fn finished(&self, summary: &BatchSummary) {
        let _ = summary;
    }
}

/// Emits batch events as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl BatchReporter for TracingReporter {
    fn unmatched(&self, index: usize, body: &str) {
        debug!(index, body, "No pattern matched, classified as other");
    }

    fn field_failure(&self, index: usize, failure: &FieldFailure) {
        warn!(
            index,
            field = %failure.field,
            capture = %failure.capture,
            reason = %failure.reason,
            "Field parse failed"
        );
    }

    fn rejected(&self, index: usize, reason: &Rejection) {
        warn!(index, reason = %reason, "Record rejected");
    }

    fn finished(&self, summary: &BatchSummary) {
        info!(
            total = summary.total,
            accepted = summary.accepted,
            rejected = summary.rejected,
            unmatched = summary.unmatched,
            "Batch complete"
        );
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl BatchReporter for NullReporter {
    fn unmatched(&self, _index: usize, _body: &str) {}

    fn field_failure(&self, _index: usize, _failure: &FieldFailure) {}

    fn rejected(&self, _index: usize, _reason: &Rejection) {}
}
