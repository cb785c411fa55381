//! Postgres-backed repository implementations.

mod events;
mod posts;
mod search;
mod session;
mod types;
mod util;

pub use session::PostgresWriteSession;
pub use util::map_sqlx_error;

use std::sync::Arc;

use sqlx::{
    migrate::MigrateError,
    postgres::{PgPool, PgPoolOptions},
};

/// Posts, events and the search projection share one pool so a write session
/// can cover all three tables in a single transaction.
#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
        sqlx::migrate!("./migrations").run(pool).await
    }
}
