//! Markdown rendering with wiki-link rewriting and HTML sanitisation.

use std::collections::HashSet;

use ammonia::Builder as AmmoniaBuilder;
use comrak::{Options, markdown_to_html};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::domain::{posts::post_url, slug::slugify};

const PREVIEW_BYTES: usize = 512;

static WIKI_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\[\s*[^|\]]+\s*\|?\s*[^\]]*\s*\]\]").expect("static wiki link pattern")
});

/// Comrak pipeline shared by every request; built once by the composition root.
pub struct MarkdownRenderer {
    options: Options<'static>,
    sanitizer: AmmoniaBuilder<'static>,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self {
            options: default_options(),
            sanitizer: build_sanitizer(),
        }
    }

    /// Rewrite `[[Title]]` and `[[Title|text]]` into markdown links to posts.
    pub fn link_text(&self, body: &str) -> String {
        WIKI_LINK
            .replace_all(body, |caps: &Captures<'_>| make_link(&caps[0]))
            .into_owned()
    }

    pub fn render_body(&self, body: &str) -> String {
        let markdown = self.link_text(body);
        let html = markdown_to_html(&markdown, &self.options);
        self.sanitizer.clean(&html).to_string()
    }

    /// Leading slice of the rendered body, re-sanitised so open tags are closed.
    pub fn render_preview(&self, body: &str) -> String {
        let html = self.render_body(body);
        let truncated = truncate_with_ellipsis(&html, PREVIEW_BYTES);
        self.sanitizer.clean(&truncated).to_string()
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn make_link(raw: &str) -> String {
    let inner = raw.trim_matches(|c: char| matches!(c, '[' | ']' | '-' | ' '));
    match inner.split_once('|') {
        Some((page_title, link_text)) => {
            format!("[{}]({})", link_text.trim(), post_url(&slugify(page_title.trim())))
        }
        None => format!("[{inner}]({})", post_url(&slugify(inner))),
    }
}

fn truncate_with_ellipsis(value: &str, size: usize) -> String {
    if value.len() <= size {
        return value.to_string();
    }
    let mut cut = if size > 3 { size - 3 } else { size };
    while !value.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &value[..cut])
}

fn default_options() -> Options<'static> {
    let mut options = Options::default();
    let ext = &mut options.extension;
    ext.strikethrough = true;
    ext.table = true;
    ext.autolink = true;
    ext.tasklist = true;
    ext.footnotes = true;

    // Bylines appended by the append and comment flows are raw HTML.
    options.render.r#unsafe = true;
    options
}

fn build_sanitizer() -> AmmoniaBuilder<'static> {
    let mut builder = AmmoniaBuilder::default();
    let classed: HashSet<&'static str> = HashSet::from(["class"]);
    builder
        .add_tag_attributes("p", classed.iter().copied())
        .add_tag_attributes("span", classed.iter().copied())
        .add_tag_attributes("hr", classed.iter().copied())
        .add_tag_attributes("code", classed.iter().copied());
    builder
}
