use async_trait::async_trait;

use crate::application::repos::{EventsRepo, RepoError};
use crate::domain::events::{EventId, EventRecord};
use crate::domain::posts::PostKey;

use super::PostgresRepositories;
use super::types::EventRow;
use super::util::map_sqlx_error;

#[async_trait]
impl EventsRepo for PostgresRepositories {
    async fn list_for_post(&self, key: PostKey) -> Result<Vec<EventRecord>, RepoError> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, action, author, created_at, post_id, pre_data, post_data
            FROM events
            WHERE post_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(key.0)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(EventRecord::try_from).collect()
    }

    async fn find_by_id(&self, id: EventId) -> Result<Option<EventRecord>, RepoError> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, action, author, created_at, post_id, pre_data, post_data
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(EventRecord::try_from).transpose()
    }
}
