use crate::application::error::{ErrorReport, HttpError};
use crate::application::identity::Identity;
use crate::application::pagination::PageLinks;
use crate::application::render::MarkdownRenderer;
use crate::domain::events::EventRecord;
use crate::domain::posts::{PostRecord, PostSnapshot};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(chrome: LayoutChrome, message: &str) -> Response {
    let content = ErrorPageView::not_found(message);
    let view = LayoutContext::new(chrome, content);
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        message.to_string(),
    )
    .attach(&mut response);
    response
}

/// Per-request page furniture: the document title and the signed-in user.
#[derive(Clone)]
pub struct LayoutChrome {
    pub title: String,
    pub username: Option<String>,
}

impl LayoutChrome {
    pub fn new(title: impl Into<String>, user: Option<&Identity>) -> Self {
        Self {
            title: title.into(),
            username: user.map(|user| user.username().to_string()),
        }
    }
}

pub struct LayoutContext<T> {
    pub title: String,
    pub username: Option<String>,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, content: T) -> Self {
        Self {
            title: chrome.title,
            username: chrome.username,
            content,
        }
    }
}

#[derive(Clone)]
pub struct PageNav {
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
}

impl PageNav {
    pub fn new(base: &str, links: PageLinks) -> Self {
        Self {
            prev_href: links.prev.map(|page| format!("{base}?page={page}")),
            next_href: links.next.map(|page| format!("{base}?page={page}")),
        }
    }
}

/// A post in a listing, with a short rendered preview of its body.
#[derive(Clone)]
pub struct PostCard {
    pub title: String,
    pub url: String,
    pub author: String,
    pub modified: String,
    pub preview_html: String,
}

impl PostCard {
    pub fn build(post: &PostRecord, renderer: &MarkdownRenderer) -> Self {
        Self {
            title: post.title.clone(),
            url: post.url(),
            author: post.author.clone(),
            modified: post.rendered_modified_at(),
            preview_html: renderer.render_preview(&post.body),
        }
    }
}

#[derive(Clone)]
pub struct PostLink {
    pub title: String,
    pub url: String,
    pub modified: String,
}

impl From<&PostRecord> for PostLink {
    fn from(post: &PostRecord) -> Self {
        Self {
            title: post.title.clone(),
            url: post.url(),
            modified: post.rendered_modified_at(),
        }
    }
}

pub struct ListingView<T> {
    pub posts: Vec<T>,
    pub total: u64,
    pub nav: PageNav,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: LayoutContext<ListingView<PostCard>>,
}

#[derive(Template)]
#[template(path = "all.html")]
pub struct AllPostsTemplate {
    pub view: LayoutContext<ListingView<PostLink>>,
}

pub struct SearchView {
    pub query: String,
    pub posts: Vec<PostCard>,
}

#[derive(Template)]
#[template(path = "search.html")]
pub struct SearchTemplate {
    pub view: LayoutContext<SearchView>,
}

pub struct NewPostView {
    pub title: String,
    pub slug: String,
}

#[derive(Template)]
#[template(path = "new_post.html")]
pub struct NewPostTemplate {
    pub view: LayoutContext<NewPostView>,
}

pub struct PostDetailView {
    pub slug: String,
    pub url: String,
    pub title: String,
    pub body: String,
    pub body_html: String,
    pub author: String,
    pub created: String,
    pub modified: String,
    pub events: Vec<EventSummary>,
}

impl PostDetailView {
    pub fn build(post: &PostRecord, events: &[EventRecord], renderer: &MarkdownRenderer) -> Self {
        Self {
            slug: post.slug.clone(),
            url: post.url(),
            title: post.title.clone(),
            body: post.body.clone(),
            body_html: renderer.render_body(&post.body),
            author: post.author.clone(),
            created: post.rendered_created_at(),
            modified: post.rendered_modified_at(),
            events: events.iter().map(EventSummary::from).collect(),
        }
    }
}

#[derive(Clone)]
pub struct EventSummary {
    pub url: String,
    pub action: String,
    pub author: String,
    pub created: String,
}

impl From<&EventRecord> for EventSummary {
    fn from(event: &EventRecord) -> Self {
        Self {
            url: event.url(),
            action: event.action.to_string(),
            author: event.author.clone(),
            created: event.rendered_created_at(),
        }
    }
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate {
    pub view: LayoutContext<PostDetailView>,
}

#[derive(Template)]
#[template(path = "confirm_delete.html")]
pub struct ConfirmDeleteTemplate {
    pub view: LayoutContext<PostDetailView>,
}

/// Offer to create a post that does not exist yet.
pub struct MissingPostView {
    pub slug: String,
    pub title: String,
}

#[derive(Template)]
#[template(path = "post_missing.html")]
pub struct MissingPostTemplate {
    pub view: LayoutContext<MissingPostView>,
}

pub struct SnapshotView {
    pub url: String,
    pub title: String,
    pub author: String,
    pub modified: String,
    pub body_html: String,
}

impl SnapshotView {
    pub fn build(snapshot: &PostSnapshot, renderer: &MarkdownRenderer) -> Self {
        Self {
            url: snapshot.url(),
            title: snapshot.title.clone(),
            author: snapshot.author.clone(),
            modified: crate::domain::posts::unix_date(snapshot.modified_at),
            body_html: renderer.render_body(&snapshot.body),
        }
    }
}

pub struct EventDetailView {
    pub id: String,
    pub action: String,
    pub author: String,
    pub created: String,
    pub before: Option<SnapshotView>,
    pub after: Option<SnapshotView>,
}

impl EventDetailView {
    pub fn build(event: &EventRecord, renderer: &MarkdownRenderer) -> Self {
        Self {
            id: event.id.to_string(),
            action: event.action.to_string(),
            author: event.author.clone(),
            created: event.rendered_created_at(),
            before: event
                .pre_post()
                .map(|snapshot| SnapshotView::build(&snapshot, renderer)),
            after: event
                .post_post()
                .map(|snapshot| SnapshotView::build(&snapshot, renderer)),
        }
    }
}

#[derive(Template)]
#[template(path = "event.html")]
pub struct EventTemplate {
    pub view: LayoutContext<EventDetailView>,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
}

impl ErrorPageView {
    pub fn not_found(message: &str) -> Self {
        Self {
            title: "Not Found".to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}
