use time::OffsetDateTime;

use crate::application::repos::RepoError;
use crate::domain::events::{EventAction, EventId, EventRecord};
use crate::domain::posts::{PostKey, PostRecord};

#[derive(sqlx::FromRow)]
pub(crate) struct PostRow {
    pub(crate) id: i64,
    pub(crate) slug: String,
    pub(crate) title: String,
    pub(crate) body: String,
    pub(crate) author: String,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) modified_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            key: PostKey(row.id),
            slug: row.slug,
            title: row.title,
            body: row.body,
            author: row.author,
            created_at: row.created_at,
            modified_at: row.modified_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct EventRow {
    pub(crate) id: i64,
    pub(crate) action: String,
    pub(crate) author: String,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) post_id: i64,
    pub(crate) pre_data: String,
    pub(crate) post_data: String,
}

impl TryFrom<EventRow> for EventRecord {
    type Error = RepoError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let action: EventAction = row.action.parse().map_err(|err| RepoError::InvalidInput {
            message: format!("event {}: {err}", row.id),
        })?;

        Ok(Self {
            id: EventId(row.id),
            action,
            author: row.author,
            created_at: row.created_at,
            post_key: PostKey(row.post_id),
            pre_data: row.pre_data,
            post_data: row.post_data,
        })
    }
}
