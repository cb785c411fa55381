//! Repository traits describing persistence and search adapters.

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

use crate::domain::events::{EventId, EventRecord, NewEventParams};
use crate::domain::posts::{NewPostParams, PostKey, PostRecord};

/// Unique constraint guarding post slugs.
pub const POST_SLUG_CONSTRAINT: &str = "posts_slug_key";

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn is_slug_conflict(&self) -> bool {
        matches!(self, RepoError::Duplicate { constraint } if constraint == POST_SLUG_CONSTRAINT)
    }
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError>;

    async fn count_slug(&self, slug: &str) -> Result<u64, RepoError>;

    /// Posts ordered by modification time, newest first.
    async fn list_recent(&self, limit: u32, offset: u64) -> Result<Vec<PostRecord>, RepoError>;

    /// Posts ordered by title, ascending.
    async fn list_by_title(&self, limit: u32, offset: u64) -> Result<Vec<PostRecord>, RepoError>;

    async fn count_posts(&self) -> Result<u64, RepoError>;

    async fn health_check(&self) -> Result<(), RepoError>;
}

#[async_trait]
pub trait EventsRepo: Send + Sync {
    /// Events referencing `key`, newest first.
    async fn list_for_post(&self, key: PostKey) -> Result<Vec<EventRecord>, RepoError>;

    async fn find_by_id(&self, id: EventId) -> Result<Option<EventRecord>, RepoError>;
}

pub trait SearchIndex: Send + Sync {
    /// Run a free-text query. The stream is finite and cannot be restarted.
    fn search<'a>(&'a self, query: &'a str) -> BoxStream<'a, Result<PostRecord, RepoError>>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    /// Open a session whose writes become visible together on commit.
    async fn begin(&self) -> Result<Box<dyn WriteSession>, RepoError>;
}

/// Staged writes spanning the post record, its events and its search document.
///
/// Dropping a session without calling [`WriteSession::commit`] discards every
/// write made through it.
#[async_trait]
pub trait WriteSession: Send {
    /// Current state of the post, held against concurrent writers until the
    /// session ends.
    async fn lock_post(&mut self, key: PostKey) -> Result<Option<PostRecord>, RepoError>;

    async fn insert_post(&mut self, params: &NewPostParams) -> Result<PostRecord, RepoError>;

    async fn update_post(&mut self, post: &PostRecord) -> Result<(), RepoError>;

    async fn delete_post(&mut self, key: PostKey) -> Result<(), RepoError>;

    async fn append_event(&mut self, params: &NewEventParams) -> Result<EventId, RepoError>;

    /// Insert or replace the search document `post.key.doc_id()`.
    async fn index_post(&mut self, post: &PostRecord) -> Result<(), RepoError>;

    async fn unindex_post(&mut self, key: PostKey) -> Result<(), RepoError>;

    async fn commit(self: Box<Self>) -> Result<(), RepoError>;
}
