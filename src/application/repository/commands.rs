use std::convert::Infallible;

use metrics::counter;
use tracing::{info, warn};

use crate::application::identity::Identity;
use crate::application::repos::{RepoError, WriteSession};
use crate::domain::events::{EventAction, NewEventParams};
use crate::domain::posts::{NewPostParams, PostRecord, next_modification, timestamp_now};
use crate::domain::slug::{SlugAsyncError, SlugError, unique_slug};

use super::service::Repository;
use super::types::{
    COMMAND_FAILURES_TOTAL, COMMANDS_TOTAL, EditPostCommand, NewPostCommand, RepositoryError,
    SLUG_ALLOCATION_ATTEMPTS, ensure_non_empty,
};

impl Repository {
    /// Create a post under a slug derived from `command.slug`, recording a
    /// `CreatePost` event and indexing it in one write session.
    pub async fn new_post(
        &self,
        actor: &Identity,
        command: NewPostCommand,
    ) -> Result<PostRecord, RepositoryError> {
        let result = self.create_post(actor, command).await;
        record_outcome("new_post", &result);
        result
    }

    /// Replace title and body of `post`, bumping its modification time.
    ///
    /// Fails with [`RepositoryError::Conflict`] when the stored post was
    /// modified after `post` was read.
    pub async fn edit_post(
        &self,
        actor: &Identity,
        post: &PostRecord,
        command: EditPostCommand,
    ) -> Result<PostRecord, RepositoryError> {
        let result = self.update_post(actor, post, command).await;
        record_outcome("edit_post", &result);
        result
    }

    /// Remove `post` and its search document. Its events stay behind.
    pub async fn delete_post(
        &self,
        actor: &Identity,
        post: &PostRecord,
    ) -> Result<(), RepositoryError> {
        let result = self.remove_post(actor, post).await;
        record_outcome("delete_post", &result);
        result
    }

    async fn create_post(
        &self,
        actor: &Identity,
        command: NewPostCommand,
    ) -> Result<PostRecord, RepositoryError> {
        ensure_non_empty(&command.title, "title")?;
        ensure_non_empty(&command.slug, "slug")?;

        for attempt in 0..SLUG_ALLOCATION_ATTEMPTS {
            let slug = self.allocate_slug(&command.slug).await?;
            match self.insert_new_post(actor, &command, slug).await {
                Err(RepositoryError::Store(err)) if err.is_slug_conflict() => {
                    warn!(
                        target = "nib::repository",
                        base = %command.slug,
                        attempt,
                        "slug taken by a concurrent writer; allocating again"
                    );
                }
                other => return other,
            }
        }

        Err(RepositoryError::Slug(SlugError::Exhausted {
            base: command.slug,
        }))
    }

    async fn allocate_slug(&self, base: &str) -> Result<String, RepositoryError> {
        let result = unique_slug(base, move |candidate| async move {
            Ok::<bool, Infallible>(self.slug_exists(&candidate).await)
        })
        .await;

        match result {
            Ok(slug) => Ok(slug),
            Err(SlugAsyncError::Slug(err)) => Err(RepositoryError::Slug(err)),
            Err(SlugAsyncError::Predicate(never)) => match never {},
        }
    }

    async fn insert_new_post(
        &self,
        actor: &Identity,
        command: &NewPostCommand,
        slug: String,
    ) -> Result<PostRecord, RepositoryError> {
        let now = timestamp_now();
        let params = NewPostParams {
            slug,
            title: command.title.clone(),
            body: command.body.clone(),
            author: actor.email().to_string(),
            created_at: now,
        };

        let mut session = self.begin().await?;
        let post = session
            .insert_post(&params)
            .await
            .map_err(RepositoryError::Store)?;

        let event = NewEventParams {
            action: EventAction::CreatePost,
            author: actor.email().to_string(),
            created_at: now,
            post_key: post.key,
            pre_data: String::new(),
            post_data: snapshot_json(&post)?,
        };
        let event_id = session
            .append_event(&event)
            .await
            .map_err(RepositoryError::Store)?;

        session
            .index_post(&post)
            .await
            .map_err(RepositoryError::Index)?;
        session.commit().await.map_err(RepositoryError::Store)?;

        info!(
            target = "nib::repository",
            command = "new_post",
            actor = %actor,
            key = %post.key,
            slug = %post.slug,
            event = %event_id,
            "post created"
        );
        Ok(post)
    }

    async fn update_post(
        &self,
        actor: &Identity,
        post: &PostRecord,
        command: EditPostCommand,
    ) -> Result<PostRecord, RepositoryError> {
        ensure_non_empty(&command.title, "title")?;

        let mut session = self.begin().await?;
        let current = lock_current(session.as_mut(), post).await?;
        if current.modified_at != post.modified_at {
            return Err(RepositoryError::Conflict { slug: current.slug });
        }

        let updated = PostRecord {
            title: command.title,
            body: command.body,
            modified_at: next_modification(current.modified_at),
            ..current.clone()
        };
        let event = NewEventParams {
            action: EventAction::EditPost,
            author: actor.email().to_string(),
            created_at: updated.modified_at,
            post_key: updated.key,
            pre_data: snapshot_json(&current)?,
            post_data: snapshot_json(&updated)?,
        };
        let event_id = session
            .append_event(&event)
            .await
            .map_err(RepositoryError::Store)?;

        session
            .update_post(&updated)
            .await
            .map_err(RepositoryError::Store)?;
        session
            .index_post(&updated)
            .await
            .map_err(RepositoryError::Index)?;
        session.commit().await.map_err(RepositoryError::Store)?;

        info!(
            target = "nib::repository",
            command = "edit_post",
            actor = %actor,
            key = %updated.key,
            slug = %updated.slug,
            event = %event_id,
            "post edited"
        );
        Ok(updated)
    }

    async fn remove_post(&self, actor: &Identity, post: &PostRecord) -> Result<(), RepositoryError> {
        let mut session = self.begin().await?;
        let current = lock_current(session.as_mut(), post).await?;

        let event = NewEventParams {
            action: EventAction::DeletePost,
            author: actor.email().to_string(),
            created_at: next_modification(current.modified_at),
            post_key: current.key,
            pre_data: snapshot_json(&current)?,
            post_data: String::new(),
        };
        let event_id = session
            .append_event(&event)
            .await
            .map_err(RepositoryError::Store)?;

        session
            .delete_post(post.key)
            .await
            .map_err(RepositoryError::Store)?;
        session
            .unindex_post(post.key)
            .await
            .map_err(RepositoryError::Index)?;
        session.commit().await.map_err(RepositoryError::Store)?;

        info!(
            target = "nib::repository",
            command = "delete_post",
            actor = %actor,
            key = %post.key,
            slug = %post.slug,
            event = %event_id,
            "post deleted"
        );
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn WriteSession>, RepositoryError> {
        self.writer.begin().await.map_err(RepositoryError::Store)
    }

}

/// Stored state of `post` as seen inside `session`, locked until commit.
async fn lock_current(
    session: &mut dyn WriteSession,
    post: &PostRecord,
) -> Result<PostRecord, RepositoryError> {
    session
        .lock_post(post.key)
        .await
        .map_err(RepositoryError::Store)?
        .ok_or_else(|| RepositoryError::not_found("post"))
}

fn snapshot_json(post: &PostRecord) -> Result<String, RepositoryError> {
    post.as_json().map_err(|err| {
        RepositoryError::Store(RepoError::InvalidInput {
            message: err.to_string(),
        })
    })
}

fn record_outcome<T>(command: &'static str, result: &Result<T, RepositoryError>) {
    counter!(COMMANDS_TOTAL, "command" => command).increment(1);
    if let Err(err) = result {
        counter!(COMMAND_FAILURES_TOTAL, "command" => command).increment(1);
        warn!(
            target = "nib::repository",
            command,
            error = %err,
            "repository command failed"
        );
    }
}
