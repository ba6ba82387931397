use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a single (leaf) comment. Used for direct deletion and
/// spam marking.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(String);

/// Identifier of the thread containing a comment. Used for moderation
/// status changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(String);

/// Eleven character video identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

macro_rules! string_id {
    ($ty:ident) => {
        impl $ty {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(CommentId);
string_id!(ThreadId);
string_id!(VideoId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub thread_id: ThreadId,
    pub author: String,
    pub raw_text: String,
    pub published_at: DateTime<Utc>,
}

impl Comment {
    /// Build a comment that only carries text, for ad hoc classification.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            id: CommentId::new(""),
            thread_id: ThreadId::new(""),
            author: String::new(),
            raw_text: text.into(),
            published_at: Utc::now(),
        }
    }
}
