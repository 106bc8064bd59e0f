//! Mobile-money SMS extraction.
//!
//! This crate turns exported text messages into typed transaction records:
//!
//! - [`PatternRegistry`] - ordered category patterns, first match wins
//! - [`FieldExtractor`] - classifies one message and converts its captures
//! - [`BatchParser`] - runs the extractor over a collection, applies the
//!   validity rule and reports through an injected [`BatchReporter`]
//! - [`read_export`] - loads SMS backup XML or JSON exports
//!
//! # Example
//!
//! ```rust
//! use extractor::{BatchParser, RawMessage};
//!
//! let messages = vec![
//!     RawMessage::new("You have received 5,000 RWF from John Doe (0788123456) at 2023-01-15 10:30:00"),
//!     RawMessage::new("Welcome to MoMo"),
//! ];
//!
//! let result = BatchParser::default().process(&messages).unwrap();
//! assert_eq!(result.accepted.len(), 1);
//! assert_eq!(result.accepted[0].amount, Some(5000.0));
//! assert_eq!(result.accepted[0].date.as_deref(), Some("2023-01-15T10:30:00"));
//! assert_eq!(result.rejected_count, 1);
//! ```

pub mod batch;
pub mod category;
pub mod error;
pub mod export;
pub mod extract;
pub mod registry;
pub mod report;

pub use batch::{BatchParser, BatchResult, BatchSummary, RejectionEntry};
pub use category::{Category, Direction, UnknownCategory};
pub use error::{BatchError, ExportError, RegistryError};
pub use export::{parse_json, parse_xml, read_export, ExportFormat};
pub use extract::{
    format_epoch_millis, normalize_date, parse_amount, Field, FieldExtractor, FieldFailure,
    ParsedTransaction, RawMessage, Rejection, Timestamp,
};
pub use registry::{
    CaptureBindings, ExtractionPattern, FieldMap, PatternRegistry, PatternRegistryBuilder,
    RegistryMatch,
};
pub use report::{BatchReporter, NullReporter, TracingReporter};
