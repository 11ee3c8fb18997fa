//! Output schema versioning.

/// Schema version stamped on every JSON payload the CLI emits.
///
/// Bump the minor version for additive fields, the major version when a
/// field changes meaning or disappears.
pub const SCHEMA_VERSION: &str = "1.0.0";
