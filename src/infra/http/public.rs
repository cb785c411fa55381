use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use crate::{
    application::{
        editing::un_slug,
        error::HttpError,
        pagination::{PageNumber, PageRequest},
    },
    domain::events::EventId,
    presentation::views::{
        AllPostsTemplate, EventDetailView, EventTemplate, IndexTemplate, LayoutChrome,
        LayoutContext, ListingView, MissingPostTemplate, MissingPostView, NewPostTemplate,
        NewPostView, PageNav, PostCard, PostDetailView, PostLink, PostTemplate, SearchTemplate,
        SearchView, render_not_found_response, render_template_response,
    },
};

use super::HttpState;
use super::forms::{NewPostQuery, PageQuery, SearchQuery};

pub(super) async fn index(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Result<Response, HttpError> {
    let request = PageRequest::new(
        PageNumber::parse(query.page.as_deref()),
        state.listing.recent_page_size,
    );
    let page = state
        .repository
        .recent_posts(request.limit.get(), request.offset())
        .await?;

    let posts = page
        .items
        .iter()
        .map(|post| PostCard::build(post, &state.renderer))
        .collect();
    let content = ListingView {
        posts,
        total: page.total,
        nav: PageNav::new("/", request.links(page.total)),
    };
    let chrome = state.chrome("Recent posts", &headers);

    Ok(render_template_response(
        IndexTemplate {
            view: LayoutContext::new(chrome, content),
        },
        StatusCode::OK,
    ))
}

pub(super) async fn all_posts(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Result<Response, HttpError> {
    let request = PageRequest::new(
        PageNumber::parse(query.page.as_deref()),
        state.listing.all_page_size,
    );
    let page = state
        .repository
        .all_posts(request.limit.get(), request.offset())
        .await?;

    let content = ListingView {
        posts: page.items.iter().map(PostLink::from).collect(),
        total: page.total,
        nav: PageNav::new("/all/", request.links(page.total)),
    };
    let chrome = state.chrome("All posts", &headers);

    Ok(render_template_response(
        AllPostsTemplate {
            view: LayoutContext::new(chrome, content),
        },
        StatusCode::OK,
    ))
}

pub(super) async fn search(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> Result<Response, HttpError> {
    let posts = state.repository.search_posts(&query.q).await?;

    let content = SearchView {
        query: query.q.trim().to_string(),
        posts: posts
            .iter()
            .map(|post| PostCard::build(post, &state.renderer))
            .collect(),
    };
    let chrome = state.chrome("Search", &headers);

    Ok(render_template_response(
        SearchTemplate {
            view: LayoutContext::new(chrome, content),
        },
        StatusCode::OK,
    ))
}

pub(super) async fn new_post_form(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Query(query): Query<NewPostQuery>,
) -> Response {
    let content = NewPostView {
        title: query.title,
        slug: query.slug,
    };
    let chrome = state.chrome("New post", &headers);
    render_template_response(
        NewPostTemplate {
            view: LayoutContext::new(chrome, content),
        },
        StatusCode::OK,
    )
}

pub(super) async fn post_detail(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
) -> Result<Response, HttpError> {
    let Some(post) = state.repository.post_from_slug(&slug).await? else {
        return Ok(missing_post(&state, &headers, slug));
    };
    let events = state.repository.post_events(post.key).await?;

    let content = PostDetailView::build(&post, &events, &state.renderer);
    let chrome = state.chrome(post.title.clone(), &headers);

    Ok(render_template_response(
        PostTemplate {
            view: LayoutContext::new(chrome, content),
        },
        StatusCode::OK,
    ))
}

fn missing_post(state: &HttpState, headers: &HeaderMap, slug: String) -> Response {
    let title = un_slug(&slug);
    let chrome = state.chrome(title.clone(), headers);
    render_template_response(
        MissingPostTemplate {
            view: LayoutContext::new(chrome, MissingPostView { slug, title }),
        },
        StatusCode::NOT_FOUND,
    )
}

pub(super) async fn event_detail(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> Result<Response, HttpError> {
    let chrome = state.chrome("Event", &headers);
    let Ok(id) = raw_id.parse::<i64>() else {
        return Ok(render_not_found_response(chrome, "No such event."));
    };

    match state.repository.event_from_id(EventId(id)).await? {
        Some(event) => {
            let content = EventDetailView::build(&event, &state.renderer);
            Ok(render_template_response(
                EventTemplate {
                    view: LayoutContext::new(chrome, content),
                },
                StatusCode::OK,
            ))
        }
        None => Ok(render_not_found_response(chrome, "No such event.")),
    }
}

pub(super) async fn health(State(state): State<HttpState>) -> Response {
    match state.repository.health_check().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => HttpError::from_error(
            "infra::http::public::health",
            StatusCode::SERVICE_UNAVAILABLE,
            "Service unavailable",
            &err,
        )
        .into_response(),
    }
}

impl HttpState {
    pub(super) fn chrome(&self, title: impl Into<String>, headers: &HeaderMap) -> LayoutChrome {
        LayoutChrome::new(title, self.identity.current_user(headers).as_ref())
    }
}
