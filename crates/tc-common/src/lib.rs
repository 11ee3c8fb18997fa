//! Token concurrency common types, IDs, and errors.
//!
//! This crate provides foundational types shared across the tc-* crates:
//! - Subject and analysis identity types
//! - The canonical `Interval` and its tags
//! - Raw source records and schema-variant field candidates
//! - Common error types
//! - Output format specifications

pub mod error;
pub mod id;
pub mod interval;
pub mod output;
pub mod record;
pub mod schema;

pub use error::{Error, ErrorCategory, InvalidRecord, Result};
pub use id::{AnalysisId, EntityId, SubjectId};
pub use interval::{Interval, TagKind, TagValue};
pub use output::OutputFormat;
pub use record::{FieldCandidate, RawRecord, SourceSchema, TimeEncoding};
pub use schema::SCHEMA_VERSION;
