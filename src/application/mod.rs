//! Application services: the repository, its collaborator traits and the
//! presentation-independent helpers used by the request handlers.

pub mod editing;
pub mod error;
pub mod identity;
pub mod pagination;
pub mod render;
pub mod repos;
pub mod repository;
