use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct PageQuery {
    pub(crate) page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct SearchQuery {
    pub(crate) q: String,
}

/// Prefill for the new post form, e.g. from a missing wiki link.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct NewPostQuery {
    pub(crate) title: String,
    pub(crate) slug: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct NewPostForm {
    pub(crate) title: String,
    pub(crate) slug: String,
    pub(crate) body: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct EditPostForm {
    pub(crate) title: String,
    pub(crate) body: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct AppendForm {
    pub(crate) body: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CommentForm {
    pub(crate) comment: String,
}
