//! In-process store and search index used for development and tests.
//!
//! Write sessions hold the store's write lock and stage their changes on a copy
//! of the state; commit swaps the copy in, drop discards it.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use crate::application::repos::{
    EventsRepo, POST_SLUG_CONSTRAINT, PostsRepo, PostsWriteRepo, RepoError, SearchIndex,
    WriteSession,
};
use crate::domain::events::{EventId, EventRecord, NewEventParams};
use crate::domain::posts::{NewPostParams, PostKey, PostRecord};

#[derive(Debug, Clone)]
struct MemoryState {
    posts: BTreeMap<i64, PostRecord>,
    events: Vec<EventRecord>,
    documents: BTreeMap<String, PostRecord>,
    next_post_id: i64,
    next_event_id: i64,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            posts: BTreeMap::new(),
            events: Vec::new(),
            documents: BTreeMap::new(),
            next_post_id: 1,
            next_event_id: 1,
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryRepositories {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of search documents currently committed.
    pub async fn indexed_documents(&self) -> usize {
        self.state.read().await.documents.len()
    }

    /// Number of events currently committed.
    pub async fn event_count(&self) -> usize {
        self.state.read().await.events.len()
    }
}

#[async_trait]
impl PostsRepo for MemoryRepositories {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError> {
        let state = self.state.read().await;
        Ok(state.posts.values().find(|post| post.slug == slug).cloned())
    }

    async fn count_slug(&self, slug: &str) -> Result<u64, RepoError> {
        let state = self.state.read().await;
        Ok(state.posts.values().filter(|post| post.slug == slug).count() as u64)
    }

    async fn list_recent(&self, limit: u32, offset: u64) -> Result<Vec<PostRecord>, RepoError> {
        let state = self.state.read().await;
        let mut posts: Vec<PostRecord> = state.posts.values().cloned().collect();
        posts.sort_by(|a, b| {
            b.modified_at
                .cmp(&a.modified_at)
                .then_with(|| b.key.cmp(&a.key))
        });
        Ok(page(posts, limit, offset))
    }

    async fn list_by_title(&self, limit: u32, offset: u64) -> Result<Vec<PostRecord>, RepoError> {
        let state = self.state.read().await;
        let mut posts: Vec<PostRecord> = state.posts.values().cloned().collect();
        posts.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.key.cmp(&b.key)));
        Ok(page(posts, limit, offset))
    }

    async fn count_posts(&self) -> Result<u64, RepoError> {
        Ok(self.state.read().await.posts.len() as u64)
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

#[async_trait]
impl EventsRepo for MemoryRepositories {
    async fn list_for_post(&self, key: PostKey) -> Result<Vec<EventRecord>, RepoError> {
        let state = self.state.read().await;
        let mut events: Vec<EventRecord> = state
            .events
            .iter()
            .filter(|event| event.post_key == key)
            .cloned()
            .collect();
        events.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(events)
    }

    async fn find_by_id(&self, id: EventId) -> Result<Option<EventRecord>, RepoError> {
        let state = self.state.read().await;
        Ok(state.events.iter().find(|event| event.id == id).cloned())
    }
}

impl SearchIndex for MemoryRepositories {
    fn search<'a>(&'a self, query: &'a str) -> BoxStream<'a, Result<PostRecord, RepoError>> {
        let terms: Vec<String> = query
            .split_whitespace()
            .map(|term| term.to_lowercase())
            .collect();

        stream::once(async move {
            let state = self.state.read().await;
            let mut hits: Vec<PostRecord> = state
                .documents
                .values()
                .filter(|doc| matches_all(doc, &terms))
                .cloned()
                .collect();
            hits.sort_by(|a, b| {
                b.modified_at
                    .cmp(&a.modified_at)
                    .then_with(|| b.key.cmp(&a.key))
            });
            stream::iter(hits.into_iter().map(Ok))
        })
        .flatten()
        .boxed()
    }
}

#[async_trait]
impl PostsWriteRepo for MemoryRepositories {
    async fn begin(&self) -> Result<Box<dyn WriteSession>, RepoError> {
        let guard = self.state.clone().write_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryWriteSession { guard, staged }))
    }
}

pub struct MemoryWriteSession {
    guard: OwnedRwLockWriteGuard<MemoryState>,
    staged: MemoryState,
}

#[async_trait]
impl WriteSession for MemoryWriteSession {
    async fn lock_post(&mut self, key: PostKey) -> Result<Option<PostRecord>, RepoError> {
        Ok(self.staged.posts.get(&key.0).cloned())
    }

    async fn insert_post(&mut self, params: &NewPostParams) -> Result<PostRecord, RepoError> {
        if self.staged.posts.values().any(|post| post.slug == params.slug) {
            return Err(RepoError::Duplicate {
                constraint: POST_SLUG_CONSTRAINT.to_string(),
            });
        }

        let id = self.staged.next_post_id;
        self.staged.next_post_id += 1;
        let post = PostRecord {
            key: PostKey(id),
            slug: params.slug.clone(),
            title: params.title.clone(),
            body: params.body.clone(),
            author: params.author.clone(),
            created_at: params.created_at,
            modified_at: params.created_at,
        };
        self.staged.posts.insert(id, post.clone());
        Ok(post)
    }

    async fn update_post(&mut self, post: &PostRecord) -> Result<(), RepoError> {
        let existing = self
            .staged
            .posts
            .get_mut(&post.key.0)
            .ok_or(RepoError::NotFound)?;
        existing.title = post.title.clone();
        existing.body = post.body.clone();
        existing.modified_at = post.modified_at;
        Ok(())
    }

    async fn delete_post(&mut self, key: PostKey) -> Result<(), RepoError> {
        self.staged
            .posts
            .remove(&key.0)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }

    async fn append_event(&mut self, params: &NewEventParams) -> Result<EventId, RepoError> {
        let id = EventId(self.staged.next_event_id);
        self.staged.next_event_id += 1;
        self.staged.events.push(params.clone().into_record(id));
        Ok(id)
    }

    async fn index_post(&mut self, post: &PostRecord) -> Result<(), RepoError> {
        self.staged.documents.insert(post.key.doc_id(), post.clone());
        Ok(())
    }

    async fn unindex_post(&mut self, key: PostKey) -> Result<(), RepoError> {
        self.staged.documents.remove(&key.doc_id());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        let MemoryWriteSession { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}

fn page(posts: Vec<PostRecord>, limit: u32, offset: u64) -> Vec<PostRecord> {
    let offset = usize::try_from(offset).unwrap_or(usize::MAX);
    posts
        .into_iter()
        .skip(offset)
        .take(limit as usize)
        .collect()
}

fn matches_all(doc: &PostRecord, terms: &[String]) -> bool {
    if terms.is_empty() {
        return false;
    }
    let title = doc.title.to_lowercase();
    let body = doc.body.to_lowercase();
    terms
        .iter()
        .all(|term| title.contains(term.as_str()) || body.contains(term.as_str()))
}
