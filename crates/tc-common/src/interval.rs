//! The canonical session interval.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::InvalidRecord;
use crate::id::SubjectId;

/// Optional tag dimensions a session can carry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    Product,
    Server,
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagKind::Product => write!(f, "product"),
            TagKind::Server => write!(f, "server"),
        }
    }
}

/// Value of a tag (a product name, a server name).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagValue(pub String);

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TagValue {
    fn from(s: &str) -> Self {
        TagValue(s.to_string())
    }
}

/// One session: who held it, when, and on what.
///
/// Invariant: `start <= end`. Instants carry second resolution.
///
/// `user` is set when `subject` is composed from more than the user; when
/// absent the subject is the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub subject: SubjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<SubjectId>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<TagKind, TagValue>,
}

impl Interval {
    /// Build an interval, rejecting inverted bounds.
    pub fn new(
        subject: SubjectId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, InvalidRecord> {
        if start > end {
            return Err(InvalidRecord::Inverted { start, end });
        }
        Ok(Interval {
            subject,
            user: None,
            start,
            end,
            tags: BTreeMap::new(),
        })
    }

    /// Record the user behind a composed subject.
    pub fn with_user(mut self, user: impl Into<SubjectId>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// The session owner, without product or server.
    pub fn user(&self) -> &SubjectId {
        self.user.as_ref().unwrap_or(&self.subject)
    }

    /// Attach a tag.
    pub fn with_tag(mut self, kind: TagKind, value: impl Into<String>) -> Self {
        self.tags.insert(kind, TagValue(value.into()));
        self
    }

    pub fn tag(&self, kind: TagKind) -> Option<&TagValue> {
        self.tags.get(&kind)
    }

    /// Start as epoch seconds.
    pub fn start_secs(&self) -> i64 {
        self.start.timestamp()
    }

    /// End as epoch seconds.
    pub fn end_secs(&self) -> i64 {
        self.end.timestamp()
    }

    /// Length in whole seconds (zero for degenerate intervals).
    pub fn duration_seconds(&self) -> i64 {
        self.end_secs() - self.start_secs()
    }

    pub fn is_zero_length(&self) -> bool {
        self.start == self.end
    }
}
