use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderName, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use nib::application::identity::{Identity, IdentityProvider};
use nib::application::render::MarkdownRenderer;
use nib::application::repos::{EventsRepo, PostsRepo, PostsWriteRepo, SearchIndex};
use nib::application::repository::{NewPostCommand, Repository};
use nib::config::ListingSettings;
use nib::infra::http::{HttpState, build_router};
use nib::infra::identity::TrustedHeaderIdentity;
use nib::infra::memory::MemoryRepositories;

const USER_HEADER: &str = "x-forwarded-email";

fn test_app() -> (Router, Arc<Repository>) {
    let store = Arc::new(MemoryRepositories::new());
    let posts: Arc<dyn PostsRepo> = store.clone();
    let writer: Arc<dyn PostsWriteRepo> = store.clone();
    let events: Arc<dyn EventsRepo> = store.clone();
    let index: Arc<dyn SearchIndex> = store;
    let repository = Arc::new(Repository::new(posts, writer, events, index));

    let identity: Arc<dyn IdentityProvider> = Arc::new(TrustedHeaderIdentity::new(
        HeaderName::from_static(USER_HEADER),
        None,
    ));

    let state = HttpState {
        repository: repository.clone(),
        renderer: Arc::new(MarkdownRenderer::new()),
        identity,
        listing: ListingSettings::default(),
    };
    (build_router(state), repository)
}

async fn seed(repository: &Repository, title: &str, body: &str) -> String {
    let post = repository
        .new_post(
            &Identity::new("ada@example.com"),
            NewPostCommand {
                title: title.to_string(),
                slug: nib::application::editing::slug_candidate("", title),
                body: body.to_string(),
            },
        )
        .await
        .expect("seed post");
    post.slug
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn form_post(uri: &str, body: &str, user: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(user) = user {
        builder = builder.header(USER_HEADER, user);
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .expect("location header")
}

#[tokio::test]
async fn index_lists_recent_posts() {
    let (app, repository) = test_app();
    seed(&repository, "First light", "Hello **there**").await;

    let response = app.oneshot(get("/")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("First light"));
    assert!(html.contains("/post/first-light/"));
}

#[tokio::test]
async fn index_pages_after_twenty_posts() {
    let (app, repository) = test_app();
    for n in 0..21 {
        seed(&repository, &format!("Post {n}"), "").await;
    }

    let response = app.clone().oneshot(get("/")).await.expect("response");
    let html = body_text(response).await;
    assert!(html.contains("/?page=1"));

    let response = app.oneshot(get("/?page=1")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Post 0"));
    assert!(html.contains("/?page=0"));
    assert!(!html.contains("/?page=2"));
}

#[tokio::test]
async fn all_posts_sorted_by_title() {
    let (app, repository) = test_app();
    seed(&repository, "Zebra", "").await;
    seed(&repository, "Aardvark", "").await;

    let response = app.oneshot(get("/all/?page=junk")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    let aardvark = html.find("Aardvark").expect("aardvark listed");
    let zebra = html.find("Zebra").expect("zebra listed");
    assert!(aardvark < zebra);
}

#[tokio::test]
async fn post_page_renders_markdown_and_history() {
    let (app, repository) = test_app();
    let slug = seed(&repository, "Notes", "Some *emphasis* and [[Other Page]]").await;

    let response = app
        .oneshot(get(&format!("/post/{slug}/")))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("<em>emphasis</em>"));
    assert!(html.contains("/post/other-page/"));
    assert!(html.contains("/event/1/"));
}

#[tokio::test]
async fn missing_post_offers_creation() {
    let (app, _) = test_app();

    let response = app
        .oneshot(get("/post/my-new-page/"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let html = body_text(response).await;
    assert!(html.contains("My New Page"));
    assert!(html.contains("action=\"/new/\""));
}

#[tokio::test]
async fn create_requires_identity() {
    let (app, repository) = test_app();

    let response = app
        .oneshot(form_post("/new/", "title=Anon&slug=&body=hi", None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(repository.post_from_slug("anon").await.expect("lookup").is_none());
}

#[tokio::test]
async fn create_redirects_to_new_post() {
    let (app, repository) = test_app();

    let response = app
        .oneshot(form_post(
            "/new/",
            "title=Hello+World%21&slug=&body=hi",
            Some("ada@example.com"),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/post/hello-world/");

    let post = repository
        .require_post("hello-world")
        .await
        .expect("created");
    assert_eq!(post.title, "Hello World!");
    assert_eq!(post.author, "ada@example.com");
}

#[tokio::test]
async fn blank_title_is_generated() {
    let (app, repository) = test_app();

    let response = app
        .oneshot(form_post("/new/", "title=&body=", Some("ada@example.com")))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let slug = location(&response)
        .trim_start_matches("/post/")
        .trim_end_matches('/')
        .to_string();
    let post = repository.require_post(&slug).await.expect("created");
    assert!(post.title.starts_with("ada: "));
    assert!(post.title.ends_with(" UTC"));
}

#[tokio::test]
async fn append_and_comment_extend_body() {
    let (app, repository) = test_app();
    let slug = seed(&repository, "Log", "day one").await;

    let response = app
        .clone()
        .oneshot(form_post(
            &format!("/post/{slug}/append/"),
            "body=day+two",
            Some("ada@example.com"),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app
        .clone()
        .oneshot(form_post(
            &format!("/post/{slug}/comment/"),
            "comment=nice",
            Some("grace@example.com"),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let post = repository.require_post(&slug).await.expect("post");
    assert!(post.body.starts_with("day one"));
    assert!(post.body.contains("day two"));
    assert!(post.body.contains("nice"));
    assert!(post.body.contains("<span class=\"comment-author\">grace</span>"));

    let response = app
        .oneshot(form_post(
            &format!("/post/{slug}/comment/"),
            "comment=++",
            Some("grace@example.com"),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let events = repository.post_events(post.key).await.expect("events");
    assert_eq!(events.len(), 3);
}

#[tokio::test]
async fn edit_updates_title_and_keeps_slug() {
    let (app, repository) = test_app();
    let slug = seed(&repository, "Before", "old").await;

    let response = app
        .oneshot(form_post(
            &format!("/post/{slug}/edit/"),
            "title=After&body=new",
            Some("ada@example.com"),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/post/before/");

    let post = repository.require_post("before").await.expect("post");
    assert_eq!(post.title, "After");
    assert_eq!(post.body, "new");
}

#[tokio::test]
async fn edit_of_missing_post_is_not_found() {
    let (app, _) = test_app();

    let response = app
        .oneshot(form_post(
            "/post/ghost/edit/",
            "title=Boo&body=",
            Some("ada@example.com"),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_confirms_then_removes() {
    let (app, repository) = test_app();
    let slug = seed(&repository, "Temporary", "").await;

    let response = app
        .clone()
        .oneshot(get(&format!("/post/{slug}/delete/")))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(form_post(
            &format!("/post/{slug}/delete/"),
            "",
            Some("ada@example.com"),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert!(repository.post_from_slug(&slug).await.expect("lookup").is_none());
}

#[tokio::test]
async fn search_finds_posts() {
    let (app, repository) = test_app();
    seed(&repository, "Rust notes", "ownership").await;
    seed(&repository, "Cooking", "pasta").await;

    let response = app
        .clone()
        .oneshot(get("/search/?q=ownership"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Rust notes"));
    assert!(!html.contains("Cooking"));

    let response = app.oneshot(get("/search/")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn event_page_shows_snapshots() {
    let (app, repository) = test_app();
    seed(&repository, "Audited", "tracked body").await;

    let response = app.clone().oneshot(get("/event/1/")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("The post did not exist."));
    assert!(html.contains("tracked body"));

    for uri in ["/event/99/", "/event/abc/"] {
        let response = app.clone().oneshot(get(uri)).await.expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn health_reports_no_content() {
    let (app, _) = test_app();
    let response = app.oneshot(get("/_health")).await.expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
