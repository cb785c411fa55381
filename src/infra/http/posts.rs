//! Handlers that mutate posts. Each requires a signed-in user.

use axum::{
    Form,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{Redirect, Response},
};

use crate::{
    application::{
        editing::{append_body, comment_body, generate_title, slug_candidate},
        error::HttpError,
        identity::Identity,
        repository::{EditPostCommand, NewPostCommand},
    },
    domain::posts::{PostRecord, timestamp_now},
    presentation::views::{
        ConfirmDeleteTemplate, LayoutContext, PostDetailView, render_template_response,
    },
};

use super::HttpState;
use super::forms::{AppendForm, CommentForm, EditPostForm, NewPostForm};

fn require_identity(
    state: &HttpState,
    headers: &HeaderMap,
    source: &'static str,
) -> Result<Identity, HttpError> {
    state
        .identity
        .current_user(headers)
        .ok_or_else(|| HttpError::unauthorized(source))
}

fn ensure_content(value: &str, source: &'static str, field: &'static str) -> Result<(), HttpError> {
    if value.trim().is_empty() {
        return Err(HttpError::new(
            source,
            StatusCode::BAD_REQUEST,
            "Request could not be processed",
            format!("`{field}` must not be empty"),
        ));
    }
    Ok(())
}

fn see_post(post: &PostRecord) -> Redirect {
    Redirect::to(&post.url())
}

pub(super) async fn create_post(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Form(form): Form<NewPostForm>,
) -> Result<Redirect, HttpError> {
    let actor = require_identity(&state, &headers, "infra::http::posts::create_post")?;

    let title = generate_title(&form.title, &actor, timestamp_now());
    let slug = slug_candidate(&form.slug, &title);
    let post = state
        .repository
        .new_post(
            &actor,
            NewPostCommand {
                title,
                slug,
                body: form.body,
            },
        )
        .await?;

    Ok(see_post(&post))
}

pub(super) async fn edit_post(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
    Form(form): Form<EditPostForm>,
) -> Result<Redirect, HttpError> {
    let actor = require_identity(&state, &headers, "infra::http::posts::edit_post")?;
    let post = state.repository.require_post(&slug).await?;

    let updated = state
        .repository
        .edit_post(
            &actor,
            &post,
            EditPostCommand {
                title: form.title.trim().to_string(),
                body: form.body,
            },
        )
        .await?;

    Ok(see_post(&updated))
}

pub(super) async fn append_post(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
    Form(form): Form<AppendForm>,
) -> Result<Redirect, HttpError> {
    const SOURCE: &str = "infra::http::posts::append_post";
    let actor = require_identity(&state, &headers, SOURCE)?;
    ensure_content(&form.body, SOURCE, "body")?;
    let post = state.repository.require_post(&slug).await?;

    let body = append_body(&post.body, &form.body, timestamp_now());
    let updated = state
        .repository
        .edit_post(
            &actor,
            &post,
            EditPostCommand {
                title: post.title.clone(),
                body,
            },
        )
        .await?;

    Ok(see_post(&updated))
}

pub(super) async fn comment_post(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
    Form(form): Form<CommentForm>,
) -> Result<Redirect, HttpError> {
    const SOURCE: &str = "infra::http::posts::comment_post";
    let actor = require_identity(&state, &headers, SOURCE)?;
    ensure_content(&form.comment, SOURCE, "comment")?;
    let post = state.repository.require_post(&slug).await?;

    let body = comment_body(&post.body, &form.comment, &actor, timestamp_now());
    let updated = state
        .repository
        .edit_post(
            &actor,
            &post,
            EditPostCommand {
                title: post.title.clone(),
                body,
            },
        )
        .await?;

    Ok(see_post(&updated))
}

pub(super) async fn confirm_delete(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
) -> Result<Response, HttpError> {
    let post = state.repository.require_post(&slug).await?;
    let content = PostDetailView::build(&post, &[], &state.renderer);
    let chrome = state.chrome(format!("Delete {}", post.title), &headers);

    Ok(render_template_response(
        ConfirmDeleteTemplate {
            view: LayoutContext::new(chrome, content),
        },
        StatusCode::OK,
    ))
}

pub(super) async fn delete_post(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
) -> Result<Redirect, HttpError> {
    let actor = require_identity(&state, &headers, "infra::http::posts::delete_post")?;
    let post = state.repository.require_post(&slug).await?;

    state.repository.delete_post(&actor, &post).await?;

    Ok(Redirect::to("/"))
}
