//! Immutable audit events recorded for every post mutation.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::error::DomainError;
use super::posts::{PostKey, PostSnapshot, unix_date};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub i64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventAction {
    CreatePost,
    EditPost,
    DeletePost,
}

impl EventAction {
    pub fn as_str(self) -> &'static str {
        match self {
            EventAction::CreatePost => "CreatePost",
            EventAction::EditPost => "EditPost",
            EventAction::DeletePost => "DeletePost",
        }
    }
}

impl fmt::Display for EventAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventAction {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "CreatePost" => Ok(EventAction::CreatePost),
            "EditPost" => Ok(EventAction::EditPost),
            "DeletePost" => Ok(EventAction::DeletePost),
            other => Err(DomainError::unknown_action(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub id: EventId,
    pub action: EventAction,
    pub author: String,
    pub created_at: OffsetDateTime,
    /// Key of the affected post. Still set after the post is deleted.
    pub post_key: PostKey,
    /// Snapshot before the action; empty when the post did not exist.
    pub pre_data: String,
    /// Snapshot after the action; empty when the post no longer exists.
    pub post_data: String,
}

impl EventRecord {
    pub fn url(&self) -> String {
        format!("/event/{}/", self.id)
    }

    pub fn rendered_created_at(&self) -> String {
        unix_date(self.created_at)
    }

    pub fn pre_post(&self) -> Option<PostSnapshot> {
        decode_snapshot(&self.pre_data)
    }

    pub fn post_post(&self) -> Option<PostSnapshot> {
        decode_snapshot(&self.post_data)
    }
}

/// An event that has not been assigned an id yet.
#[derive(Debug, Clone)]
pub struct NewEventParams {
    pub action: EventAction,
    pub author: String,
    pub created_at: OffsetDateTime,
    pub post_key: PostKey,
    pub pre_data: String,
    pub post_data: String,
}

impl NewEventParams {
    pub fn into_record(self, id: EventId) -> EventRecord {
        EventRecord {
            id,
            action: self.action,
            author: self.author,
            created_at: self.created_at,
            post_key: self.post_key,
            pre_data: self.pre_data,
            post_data: self.post_data,
        }
    }
}

fn decode_snapshot(data: &str) -> Option<PostSnapshot> {
    if data.is_empty() {
        return None;
    }
    serde_json::from_str(data).ok()
}
