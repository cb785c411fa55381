mod forms;
mod middleware;
mod posts;
mod public;

pub use middleware::RequestContext;

use std::sync::Arc;

use axum::{Router, middleware as axum_middleware, routing::get};

use crate::application::{
    identity::IdentityProvider, render::MarkdownRenderer, repository::Repository,
};
use crate::config::ListingSettings;

use middleware::{log_responses, set_request_context};

/// Shared, immutable state handed to every request handler.
#[derive(Clone)]
pub struct HttpState {
    pub repository: Arc<Repository>,
    pub renderer: Arc<MarkdownRenderer>,
    pub identity: Arc<dyn IdentityProvider>,
    pub listing: ListingSettings,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(public::index))
        .route("/all/", get(public::all_posts))
        .route("/search/", get(public::search))
        .route("/new/", get(public::new_post_form).post(posts::create_post))
        .route("/post/{slug}/", get(public::post_detail))
        .route("/post/{slug}/edit/", axum::routing::post(posts::edit_post))
        .route("/post/{slug}/append/", axum::routing::post(posts::append_post))
        .route("/post/{slug}/comment/", axum::routing::post(posts::comment_post))
        .route(
            "/post/{slug}/delete/",
            get(posts::confirm_delete).post(posts::delete_post),
        )
        .route("/event/{id}/", get(public::event_detail))
        .route("/_health", get(public::health))
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
