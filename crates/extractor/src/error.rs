//! Error types for extraction.

use thiserror::Error;

use crate::batch::RejectionEntry;
use crate::category::Category;

/// Errors raised while building a pattern registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A pattern failed to compile.
    #[error("invalid pattern for category {category}: {source}")]
    InvalidPattern {
        category: Category,
        #[source]
        source: regex::Error,
    },
}

/// Errors raised while reading an exported message collection.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The export could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed XML.
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Neither XML nor JSON.
    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),
}

/// Batch-level failures.
///
/// Individual bad records never produce these; they are logged and counted
/// in the batch result instead.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The input collection held no messages.
    #[error("batch contained no messages")]
    EmptyInput,

    /// Every message was rejected.
    #[error("no records accepted ({rejected} rejected)")]
    NoneAccepted {
        rejected: usize,
        log: Vec<RejectionEntry>,
    },
}
