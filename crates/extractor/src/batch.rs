//! Batch parsing over an exported message collection.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use serde::Serialize;

use crate::error::BatchError;
use crate::extract::{FieldExtractor, ParsedTransaction, RawMessage, Rejection};
use crate::report::{BatchReporter, TracingReporter};

/// A dropped record and the reason it was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectionEntry {
    /// Position in the input collection.
    pub index: usize,
    pub reason: Rejection,
}

/// Outcome of a batch in which at least one record was accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchResult {
    /// Valid records, in input order.
    pub accepted: Vec<ParsedTransaction>,
    pub rejected_count: usize,
    pub rejection_log: Vec<RejectionEntry>,
    /// Records no pattern recognized, whether or not they were accepted.
    pub unmatched_count: usize,
}

impl BatchResult {
    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            total: self.accepted.len() + self.rejected_count,
            accepted: self.accepted.len(),
            rejected: self.rejected_count,
            unmatched: self.unmatched_count,
        }
    }
}

/// Counts reported at the end of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub unmatched: usize,
}

/// Runs the [`FieldExtractor`] over a collection and applies the validity
/// rule.
///
/// One bad record never stops the batch. Extraction may be spread across
/// worker threads; results are merged back in input order before any
/// reporting happens, so output and log order are the same for every run.
#[derive(Clone)]
pub struct BatchParser {
    extractor: FieldExtractor,
    reporter: Arc<dyn BatchReporter>,
    workers: usize,
}

impl Default for BatchParser {
    fn default() -> Self {
        Self::new(FieldExtractor::default(), Arc::new(TracingReporter))
    }
}

impl BatchParser {
    pub fn new(extractor: FieldExtractor, reporter: Arc<dyn BatchReporter>) -> Self {
        Self {
            extractor,
            reporter,
            workers: 1,
        }
    }

    /// Number of worker threads used for extraction. Values below 2 keep
    /// extraction on the calling thread.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Process a batch.
    ///
    /// Fails as a whole when the input is empty or nothing was accepted.
    pub fn process(&self, messages: &[RawMessage]) -> Result<BatchResult, BatchError> {
        if messages.is_empty() {
            self.reporter.finished(&BatchSummary::default());
            return Err(BatchError::EmptyInput);
        }

        let mut result = BatchResult::default();

        for (index, outcome) in self.extract_all(messages).into_iter().enumerate() {
            let txn = match outcome {
                Ok(txn) => txn,
                Err(reason) => {
                    self.reject(&mut result, index, reason);
                    continue;
                }
            };

            if txn.pattern_index.is_none() {
                result.unmatched_count += 1;
                self.reporter.unmatched(index, &txn.raw_body);
            }
            for failure in &txn.field_failures {
                self.reporter.field_failure(index, failure);
            }

            match txn.validate() {
                Ok(()) => result.accepted.push(txn),
                Err(reason) => self.reject(&mut result, index, reason),
            }
        }

        self.reporter.finished(&result.summary());

        if result.accepted.is_empty() {
            return Err(BatchError::NoneAccepted {
                rejected: result.rejected_count,
                log: result.rejection_log,
            });
        }

        Ok(result)
    }

    fn reject(&self, result: &mut BatchResult, index: usize, reason: Rejection) {
        self.reporter.rejected(index, &reason);
        result.rejected_count += 1;
        result.rejection_log.push(RejectionEntry { index, reason });
    }

    fn extract_all(&self, messages: &[RawMessage]) -> Vec<Result<ParsedTransaction, Rejection>> {
        let extractor = &self.extractor;

        if self.workers < 2 || messages.len() < 2 {
            return messages.iter().map(|m| contain(|| extractor.extract(m))).collect();
        }

        // Contiguous chunks, joined in spawn order, keep input order.
        let chunk_size = messages.len().div_ceil(self.workers);
        thread::scope(|scope| {
            let handles: Vec<_> = messages
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|m| contain(|| extractor.extract(m)))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                })
                .collect()
        })
    }
}

/// Run one extraction, turning a panic into a rejection of that record.
fn contain(
    extract: impl FnOnce() -> Result<ParsedTransaction, Rejection>,
) -> Result<ParsedTransaction, Rejection> {
    panic::catch_unwind(AssertUnwindSafe(extract)).unwrap_or_else(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "extractor panicked".to_string());
        Err(Rejection::ExtractionFailed { reason })
    })
}
