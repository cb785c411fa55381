use async_trait::async_trait;

use crate::application::repos::{PostsRepo, RepoError};
use crate::domain::posts::PostRecord;

use super::PostgresRepositories;
use super::types::PostRow;
use super::util::{convert_count, map_sqlx_error, to_limit, to_offset};

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, slug, title, body, author, created_at, modified_at
            FROM posts
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }

    async fn count_slug(&self, slug: &str) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE slug = $1")
            .bind(slug)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        convert_count(count)
    }

    async fn list_recent(&self, limit: u32, offset: u64) -> Result<Vec<PostRecord>, RepoError> {
        let rows = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, slug, title, body, author, created_at, modified_at
            FROM posts
            ORDER BY modified_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(to_limit(limit))
        .bind(to_offset(offset)?)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn list_by_title(&self, limit: u32, offset: u64) -> Result<Vec<PostRecord>, RepoError> {
        let rows = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, slug, title, body, author, created_at, modified_at
            FROM posts
            ORDER BY title COLLATE "C" ASC, id ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(to_limit(limit))
        .bind(to_offset(offset)?)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn count_posts(&self) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        convert_count(count)
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        sqlx::query("SELECT 1")
            .execute(self.pool())
            .await
            .map(|_| ())
            .map_err(map_sqlx_error)
    }
}
