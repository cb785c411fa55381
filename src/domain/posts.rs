//! Post entity and its JSON snapshot form.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset, macros::format_description};

use super::error::DomainError;

/// Store-assigned identifier of a post. Keys grow with creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostKey(pub i64);

impl PostKey {
    /// Search index document id for this post.
    pub fn doc_id(self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for PostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostRecord {
    pub key: PostKey,
    pub slug: String,
    pub title: String,
    pub body: String,
    pub author: String,
    pub created_at: OffsetDateTime,
    pub modified_at: OffsetDateTime,
}

impl PostRecord {
    pub fn url(&self) -> String {
        post_url(&self.slug)
    }

    pub fn snapshot(&self) -> PostSnapshot {
        PostSnapshot {
            slug: self.slug.clone(),
            title: self.title.clone(),
            body: self.body.clone(),
            author: self.author.clone(),
            created_at: self.created_at,
            modified_at: self.modified_at,
        }
    }

    /// JSON form stored in audit events.
    pub fn as_json(&self) -> Result<String, DomainError> {
        serde_json::to_string(&self.snapshot()).map_err(|err| DomainError::snapshot(err.to_string()))
    }

    pub fn rendered_created_at(&self) -> String {
        unix_date(self.created_at)
    }

    pub fn rendered_modified_at(&self) -> String {
        unix_date(self.modified_at)
    }
}

/// Keyless copy of a post as persisted in event `pre_data`/`post_data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSnapshot {
    pub slug: String,
    pub title: String,
    pub body: String,
    pub author: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub modified_at: OffsetDateTime,
}

impl PostSnapshot {
    pub fn url(&self) -> String {
        post_url(&self.slug)
    }
}

/// Fields of a post that does not have a key yet.
#[derive(Debug, Clone)]
pub struct NewPostParams {
    pub slug: String,
    pub title: String,
    pub body: String,
    pub author: String,
    pub created_at: OffsetDateTime,
}

pub fn post_url(slug: &str) -> String {
    format!("/post/{slug}/")
}

/// Current UTC time truncated to the microsecond precision kept by the store.
pub fn timestamp_now() -> OffsetDateTime {
    truncate_to_micros(OffsetDateTime::now_utc())
}

pub fn truncate_to_micros(value: OffsetDateTime) -> OffsetDateTime {
    let micros = value.microsecond();
    value
        .replace_microsecond(micros)
        .unwrap_or(value)
}

/// Next modification time: now, but never earlier than one microsecond past
/// `previous`.
pub fn next_modification(previous: OffsetDateTime) -> OffsetDateTime {
    let now = timestamp_now();
    let floor = previous + time::Duration::microseconds(1);
    if now < floor { floor } else { now }
}

/// `Mon Jan  2 15:04:05 UTC 2006` style rendering in UTC.
pub fn unix_date(value: OffsetDateTime) -> String {
    let format = format_description!(
        "[weekday repr:short] [month repr:short] [day padding:space] [hour]:[minute]:[second] UTC [year]"
    );
    value
        .to_offset(UtcOffset::UTC)
        .format(&format)
        .unwrap_or_else(|_| value.to_string())
}
