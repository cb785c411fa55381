mod commands;
mod queries;
mod service;
pub mod types;

pub use service::*;
pub use types::{
    EditPostCommand, NewPostCommand, PostPage, RepositoryError, SLUG_ALLOCATION_ATTEMPTS,
    ensure_non_empty,
};
