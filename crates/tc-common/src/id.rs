//! Subject and analysis identity types.
//!
//! A subject identifies the owner of a session. When the same user can hold
//! concurrent sessions on different products or servers, the subject is
//! composed as `user__product__server` so the active set stays
//! session-accurate rather than user-accurate.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Separator between the components of a composed session subject.
pub const SUBJECT_SEPARATOR: &str = "__";

/// Identity of a session owner (or of an aggregation entity).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(pub String);

/// Entities (users, products, servers) share the subject identity type.
pub type EntityId = SubjectId;

impl SubjectId {
    /// Wrap a bare identity.
    pub fn new(id: impl Into<String>) -> Self {
        SubjectId(id.into())
    }

    /// Compose a session-accurate subject from user, product and server.
    ///
    /// Missing tags are kept as empty components. A component that could be
    /// mistaken for a separator (it contains `__`, a backslash, or starts or
    /// ends with `_`) has every `\\` and `_` backslash-escaped, so distinct
    /// triples never compose to the same id.
    pub fn session(user: &str, product: Option<&str>, server: Option<&str>) -> Self {
        SubjectId(format!(
            "{}{sep}{}{sep}{}",
            escape_component(user),
            escape_component(product.unwrap_or("")),
            escape_component(server.unwrap_or("")),
            sep = SUBJECT_SEPARATOR
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SubjectId {
    fn from(s: &str) -> Self {
        SubjectId(s.to_string())
    }
}

impl From<String> for SubjectId {
    fn from(s: String) -> Self {
        SubjectId(s)
    }
}

fn escape_component(part: &str) -> Cow<'_, str> {
    let ambiguous = part.contains(SUBJECT_SEPARATOR)
        || part.contains('\\')
        || part.starts_with('_')
        || part.ends_with('_');
    if !ambiguous {
        return Cow::Borrowed(part);
    }
    let mut out = String::with_capacity(part.len() + 4);
    for c in part.chars() {
        if c == '\\' || c == '_' {
            out.push('\\');
        }
        out.push(c);
    }
    Cow::Owned(out)
}

/// Analysis ID stamped on every CLI payload.
///
/// Format: `tc-YYYYMMDD-HHMMSS-XXXX`
/// Example: `tc-20260115-143022-a7xq`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisId(pub String);

impl AnalysisId {
    /// Generate a new analysis ID.
    pub fn new() -> Self {
        let now = chrono::Utc::now();
        let suffix = generate_base32_suffix();
        AnalysisId(format!(
            "tc-{}-{}-{}",
            now.format("%Y%m%d"),
            now.format("%H%M%S"),
            suffix
        ))
    }

    /// Parse an existing analysis ID string.
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() != 23 || !s.starts_with("tc-") {
            return None;
        }
        let bytes = s.as_bytes();
        if bytes.get(11) != Some(&b'-') || bytes.get(18) != Some(&b'-') {
            return None;
        }
        let date = &s[3..11];
        let time = &s[12..18];
        let suffix = &s[19..23];
        if !date.chars().all(|c| c.is_ascii_digit()) || !time.chars().all(|c| c.is_ascii_digit())
        {
            return None;
        }
        if !suffix.chars().all(|c| matches!(c, 'a'..='z' | '2'..='7')) {
            return None;
        }
        Some(AnalysisId(s.to_string()))
    }
}

impl Default for AnalysisId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AnalysisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn generate_base32_suffix() -> String {
    let uuid = uuid::Uuid::new_v4();
    let bytes = uuid.as_bytes();
    let mut value = ((bytes[0] as u32) << 16) | ((bytes[1] as u32) << 8) | (bytes[2] as u32);
    value &= 0x000F_FFFF;
    let alphabet = b"abcdefghijklmnopqrstuvwxyz234567";
    let mut out = String::with_capacity(4);
    for shift in [15_u32, 10, 5, 0] {
        let idx = ((value >> shift) & 0x1F) as usize;
        out.push(alphabet[idx] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_id_format() {
        let id = AnalysisId::new();
        assert!(id.0.starts_with("tc-"));
        assert_eq!(id.0.len(), 23);
        assert_eq!(AnalysisId::parse(&id.0), Some(id));
    }

    #[test]
    fn test_analysis_id_rejects_garbage() {
        assert!(AnalysisId::parse("pt-20260115-143022-a7xq").is_none());
        assert!(AnalysisId::parse("tc-2026011x-143022-a7xq").is_none());
        assert!(AnalysisId::parse("tc-20260115-143022-A7XQ").is_none());
    }

    #[test]
    fn test_session_subject_composition() {
        let s = SubjectId::session("alice", Some("cad"), Some("srv-01"));
        assert_eq!(s.0, "alice__cad__srv-01");
        let s = SubjectId::session("bob", None, Some("srv-02"));
        assert_eq!(s.0, "bob____srv-02");
        let s = SubjectId::session("john_doe", None, None);
        assert_eq!(s.0, "john_doe____");
    }

    #[test]
    fn test_session_subject_is_injective_across_separators() {
        let a = SubjectId::session("ann__x", Some("y"), None);
        let b = SubjectId::session("ann", Some("x__y"), None);
        let c = SubjectId::session("ann_", Some("_x"), Some("y"));
        let d = SubjectId::session("ann", Some("x"), Some("y"));
        assert_ne!(a, b);
        assert_ne!(c, d);
        assert_eq!(a.0, "ann\\_\\_x__y__");
    }

    #[test]
    fn test_subject_ordering_is_lexicographic() {
        let mut ids = vec![SubjectId::from("b"), SubjectId::from("a"), SubjectId::from("c")];
        ids.sort();
        assert_eq!(ids, vec!["a".into(), "b".into(), "c".into()]);
    }
}
