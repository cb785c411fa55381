use futures::TryStreamExt;
use tracing::warn;

use crate::domain::events::{EventId, EventRecord};
use crate::domain::posts::{PostKey, PostRecord};

use super::service::Repository;
use super::types::{PostPage, RepositoryError};

impl Repository {
    pub async fn post_from_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepositoryError> {
        self.posts
            .find_by_slug(slug)
            .await
            .map_err(RepositoryError::Store)
    }

    pub async fn require_post(&self, slug: &str) -> Result<PostRecord, RepositoryError> {
        self.post_from_slug(slug)
            .await?
            .ok_or_else(|| RepositoryError::not_found("post"))
    }

    /// Whether any post uses `slug`. A failing count is reported as `false`;
    /// the store's unique constraint still rejects a duplicate insert.
    pub async fn slug_exists(&self, slug: &str) -> bool {
        match self.posts.count_slug(slug).await {
            Ok(count) => count > 0,
            Err(err) => {
                warn!(
                    target = "nib::repository",
                    slug,
                    error = %err,
                    "slug existence check failed; assuming free"
                );
                false
            }
        }
    }

    /// Every event recorded for `key`, newest first.
    pub async fn post_events(&self, key: PostKey) -> Result<Vec<EventRecord>, RepositoryError> {
        self.events
            .list_for_post(key)
            .await
            .map_err(RepositoryError::Store)
    }

    pub async fn search_posts(&self, query: &str) -> Result<Vec<PostRecord>, RepositoryError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        self.index
            .search(query)
            .try_collect()
            .await
            .map_err(RepositoryError::Index)
    }

    /// Posts by modification time, newest first.
    pub async fn recent_posts(
        &self,
        limit: u32,
        offset: u64,
    ) -> Result<PostPage<PostRecord>, RepositoryError> {
        let (items, total) = tokio::try_join!(
            self.posts.list_recent(limit, offset),
            self.posts.count_posts()
        )
        .map_err(RepositoryError::Store)?;
        Ok(PostPage { items, total })
    }

    /// Posts by title, ascending.
    pub async fn all_posts(
        &self,
        limit: u32,
        offset: u64,
    ) -> Result<PostPage<PostRecord>, RepositoryError> {
        let (items, total) = tokio::try_join!(
            self.posts.list_by_title(limit, offset),
            self.posts.count_posts()
        )
        .map_err(RepositoryError::Store)?;
        Ok(PostPage { items, total })
    }

    pub async fn event_from_id(&self, id: EventId) -> Result<Option<EventRecord>, RepositoryError> {
        self.events
            .find_by_id(id)
            .await
            .map_err(RepositoryError::Store)
    }

    pub async fn health_check(&self) -> Result<(), RepositoryError> {
        self.posts
            .health_check()
            .await
            .map_err(RepositoryError::Store)
    }
}
