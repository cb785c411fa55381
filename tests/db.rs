use std::sync::Arc;

use sqlx::PgPool;

use nib::application::identity::Identity;
use nib::application::repos::{
    EventsRepo, POST_SLUG_CONSTRAINT, PostsRepo, PostsWriteRepo, RepoError, SearchIndex,
    WriteSession,
};
use nib::application::repository::{
    EditPostCommand, NewPostCommand, Repository, RepositoryError,
};
use nib::domain::events::EventAction;
use nib::domain::posts::{NewPostParams, timestamp_now};
use nib::infra::db::PostgresRepositories;

fn repository(pool: PgPool) -> (Repository, Arc<PostgresRepositories>) {
    let repositories = Arc::new(PostgresRepositories::new(pool));
    let posts: Arc<dyn PostsRepo> = repositories.clone();
    let writer: Arc<dyn PostsWriteRepo> = repositories.clone();
    let events: Arc<dyn EventsRepo> = repositories.clone();
    let index: Arc<dyn SearchIndex> = repositories.clone();
    (Repository::new(posts, writer, events, index), repositories)
}

fn ada() -> Identity {
    Identity::new("ada@example.com")
}

async fn count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .expect("count rows")
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn post_lifecycle_round_trips_through_postgres(pool: PgPool) {
    let (repository, _) = repository(pool.clone());

    let created = repository
        .new_post(
            &ada(),
            NewPostCommand {
                title: "Postgres".to_string(),
                slug: "postgres".to_string(),
                body: "tsvector search".to_string(),
            },
        )
        .await
        .expect("create");

    let found = repository
        .require_post("postgres")
        .await
        .expect("lookup");
    assert_eq!(found, created);

    let hits = repository.search_posts("search").await.expect("search");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].key, created.key);

    let edited = repository
        .edit_post(
            &ada(),
            &created,
            EditPostCommand {
                title: "Postgres".to_string(),
                body: "rewritten".to_string(),
            },
        )
        .await
        .expect("edit");
    assert!(edited.modified_at > created.modified_at);
    assert!(repository.search_posts("tsvector").await.expect("search").is_empty());

    repository.delete_post(&ada(), &edited).await.expect("delete");
    assert!(repository.post_from_slug("postgres").await.expect("lookup").is_none());
    assert_eq!(count(&pool, "search_documents").await, 0);

    let events = repository.post_events(created.key).await.expect("events");
    let actions: Vec<EventAction> = events.iter().map(|event| event.action).collect();
    assert_eq!(
        actions,
        vec![
            EventAction::DeletePost,
            EventAction::EditPost,
            EventAction::CreatePost
        ]
    );
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_slug_hits_unique_constraint(pool: PgPool) {
    let (_, repositories) = repository(pool.clone());
    let params = NewPostParams {
        slug: "taken".to_string(),
        title: "Taken".to_string(),
        body: String::new(),
        author: "ada@example.com".to_string(),
        created_at: timestamp_now(),
    };

    let mut first = repositories.begin().await.expect("begin");
    first.insert_post(&params).await.expect("insert");
    first.commit().await.expect("commit");

    let mut second = repositories.begin().await.expect("begin");
    let err = second.insert_post(&params).await.expect_err("duplicate");
    match err {
        RepoError::Duplicate { constraint } => assert_eq!(constraint, POST_SLUG_CONSTRAINT),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn dropped_session_rolls_back(pool: PgPool) {
    let (_, repositories) = repository(pool.clone());
    let params = NewPostParams {
        slug: "ghost".to_string(),
        title: "Ghost".to_string(),
        body: String::new(),
        author: "ada@example.com".to_string(),
        created_at: timestamp_now(),
    };

    {
        let mut session = repositories.begin().await.expect("begin");
        let post = session.insert_post(&params).await.expect("insert");
        session.index_post(&post).await.expect("index");
    }

    assert_eq!(count(&pool, "posts").await, 0);
    assert_eq!(count(&pool, "search_documents").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn events_reject_updates(pool: PgPool) {
    let (repository, _) = repository(pool.clone());
    repository
        .new_post(
            &ada(),
            NewPostCommand {
                title: "Audit".to_string(),
                slug: "audit".to_string(),
                body: String::new(),
            },
        )
        .await
        .expect("create");

    let result = sqlx::query("UPDATE events SET author = 'mallory@example.com'")
        .execute(&pool)
        .await;
    assert!(result.is_err(), "events must be append-only");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn stale_edit_conflicts_instead_of_overwriting(pool: PgPool) {
    let (repository, _) = repository(pool.clone());
    repository
        .new_post(
            &ada(),
            NewPostCommand {
                title: "Log".to_string(),
                slug: "log".to_string(),
                body: "v0".to_string(),
            },
        )
        .await
        .expect("create");

    let first_copy = repository.require_post("log").await.expect("read");
    let second_copy = repository.require_post("log").await.expect("read");

    repository
        .edit_post(
            &ada(),
            &first_copy,
            EditPostCommand {
                title: "Log".to_string(),
                body: "v0 + A".to_string(),
            },
        )
        .await
        .expect("first edit");
    let err = repository
        .edit_post(
            &ada(),
            &second_copy,
            EditPostCommand {
                title: "Log".to_string(),
                body: "v0 + B".to_string(),
            },
        )
        .await
        .expect_err("stale copy");
    assert!(matches!(err, RepositoryError::Conflict { .. }));

    let stored = repository.require_post("log").await.expect("stored");
    assert_eq!(stored.body, "v0 + A");
    assert_eq!(count(&pool, "events").await, 2);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn titles_sort_bytewise(pool: PgPool) {
    let (repository, _) = repository(pool);
    for title in ["Charlie", "alpha", "Bravo"] {
        repository
            .new_post(
                &ada(),
                NewPostCommand {
                    title: title.to_string(),
                    slug: title.to_lowercase(),
                    body: String::new(),
                },
            )
            .await
            .expect("create");
    }

    let all = repository.all_posts(50, 0).await.expect("all");
    let titles: Vec<&str> = all.items.iter().map(|post| post.title.as_str()).collect();
    assert_eq!(titles, vec!["Bravo", "Charlie", "alpha"]);
}
