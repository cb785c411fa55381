use thiserror::Error;

use crate::application::repos::RepoError;
use crate::domain::slug::SlugError;

/// How many times `new_post` re-allocates a slug after losing an insert race.
pub const SLUG_ALLOCATION_ATTEMPTS: usize = 3;

pub(crate) const COMMANDS_TOTAL: &str = "nib_repository_commands_total";
pub(crate) const COMMAND_FAILURES_TOTAL: &str = "nib_repository_command_failures_total";

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("object store failure")]
    Store(#[source] RepoError),
    #[error("search index failure")]
    Index(#[source] RepoError),
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error("post `{slug}` changed since it was read")]
    Conflict { slug: String },
    #[error("invalid {0}")]
    Validation(String),
    #[error(transparent)]
    Slug(#[from] SlugError),
}

impl RepositoryError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RepositoryError::NotFound { .. } | RepositoryError::Store(RepoError::NotFound)
        )
    }
}

/// Paged listing together with the total number of posts.
#[derive(Debug, Clone)]
pub struct PostPage<T> {
    pub items: Vec<T>,
    pub total: u64,
}

#[derive(Debug, Clone)]
pub struct NewPostCommand {
    pub title: String,
    pub slug: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct EditPostCommand {
    pub title: String,
    pub body: String,
}

pub fn ensure_non_empty(value: &str, field: &'static str) -> Result<(), RepositoryError> {
    if value.trim().is_empty() {
        return Err(RepositoryError::Validation(field.to_string()));
    }
    Ok(())
}
