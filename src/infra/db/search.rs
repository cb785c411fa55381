use futures::{StreamExt, TryStreamExt, stream::BoxStream};

use crate::application::repos::{RepoError, SearchIndex};
use crate::domain::posts::PostRecord;

use super::PostgresRepositories;
use super::types::PostRow;
use super::util::map_sqlx_error;

impl SearchIndex for PostgresRepositories {
    fn search<'a>(&'a self, query: &'a str) -> BoxStream<'a, Result<PostRecord, RepoError>> {
        sqlx::query_as::<_, PostRow>(
            r#"
            SELECT d.post_id AS id, d.slug, d.title, d.body, d.author, d.created_at, d.modified_at
            FROM search_documents d, websearch_to_tsquery('simple', $1) AS q
            WHERE d.document @@ q
            ORDER BY ts_rank(d.document, q) DESC, d.modified_at DESC, d.post_id DESC
            "#,
        )
        .bind(query)
        .fetch(self.pool())
        .map_ok(PostRecord::from)
        .map_err(map_sqlx_error)
        .boxed()
    }
}
