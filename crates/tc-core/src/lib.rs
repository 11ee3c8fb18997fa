//! Token concurrency analyzer.
//!
//! The library behind the `tc-core` binary:
//! - Exit codes and structured logging
//! - Configuration loading with provenance
//! - Reference source readers (CSV, JSON, JSON Lines)
//! - The analysis runner: worker threads, supersession, result cache
//! - Progress events and output rendering
//!
//! The analyses themselves live in `tc-engine`.

pub mod config;
pub mod events;
pub mod exit_codes;
pub mod ingest;
pub mod logging;
pub mod output;
pub mod runner;
