use async_trait::async_trait;
use sqlx::{Postgres, Transaction};

use crate::application::repos::{PostsWriteRepo, RepoError, WriteSession};
use crate::domain::events::{EventId, NewEventParams};
use crate::domain::posts::{NewPostParams, PostKey, PostRecord};

use super::PostgresRepositories;
use super::types::PostRow;
use super::util::map_sqlx_error;

/// Write session backed by one database transaction.
///
/// Rolled back by sqlx when dropped before [`WriteSession::commit`].
pub struct PostgresWriteSession {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn begin(&self) -> Result<Box<dyn WriteSession>, RepoError> {
        let tx = self.pool().begin().await.map_err(map_sqlx_error)?;
        Ok(Box::new(PostgresWriteSession { tx }))
    }
}

#[async_trait]
impl WriteSession for PostgresWriteSession {
    async fn lock_post(&mut self, key: PostKey) -> Result<Option<PostRecord>, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, slug, title, body, author, created_at, modified_at
            FROM posts
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(key.0)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }

    async fn insert_post(&mut self, params: &NewPostParams) -> Result<PostRecord, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (slug, title, body, author, created_at, modified_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING id, slug, title, body, author, created_at, modified_at
            "#,
        )
        .bind(&params.slug)
        .bind(&params.title)
        .bind(&params.body)
        .bind(&params.author)
        .bind(params.created_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(PostRecord::from(row))
    }

    async fn update_post(&mut self, post: &PostRecord) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET title = $2, body = $3, modified_at = $4
            WHERE id = $1
            "#,
        )
        .bind(post.key.0)
        .bind(&post.title)
        .bind(&post.body)
        .bind(post.modified_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete_post(&mut self, key: PostKey) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(key.0)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn append_event(&mut self, params: &NewEventParams) -> Result<EventId, RepoError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO events (action, author, created_at, post_id, pre_data, post_data)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(params.action.as_str())
        .bind(&params.author)
        .bind(params.created_at)
        .bind(params.post_key.0)
        .bind(&params.pre_data)
        .bind(&params.post_data)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(EventId(id))
    }

    async fn index_post(&mut self, post: &PostRecord) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO search_documents
                (doc_id, post_id, slug, title, body, author, created_at, modified_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (doc_id) DO UPDATE SET
                post_id = EXCLUDED.post_id,
                slug = EXCLUDED.slug,
                title = EXCLUDED.title,
                body = EXCLUDED.body,
                author = EXCLUDED.author,
                created_at = EXCLUDED.created_at,
                modified_at = EXCLUDED.modified_at
            "#,
        )
        .bind(post.key.doc_id())
        .bind(post.key.0)
        .bind(&post.slug)
        .bind(&post.title)
        .bind(&post.body)
        .bind(&post.author)
        .bind(post.created_at)
        .bind(post.modified_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn unindex_post(&mut self, key: PostKey) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM search_documents WHERE doc_id = $1")
            .bind(key.doc_id())
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }
}
