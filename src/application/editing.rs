//! Helpers that compose titles, slugs and bodies for the editing flows.

use time::{OffsetDateTime, UtcOffset, macros::format_description};

use crate::application::identity::Identity;
use crate::domain::posts::unix_date;
use crate::domain::slug::slugify;

const FALLBACK_SLUG: &str = "post";

/// Keep a non-blank title; otherwise name the post after its author and time.
pub fn generate_title(title: &str, actor: &Identity, now: OffsetDateTime) -> String {
    let trimmed = title.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }

    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second] UTC");
    let stamp = now
        .to_offset(UtcOffset::UTC)
        .format(&format)
        .unwrap_or_else(|_| now.to_string());
    format!("{}: {stamp}", actor.username())
}

/// Slug to request for a new post: the supplied slug, or the title when blank.
pub fn slug_candidate(slug: &str, title: &str) -> String {
    let source = if slug.trim().is_empty() { title } else { slug };
    let candidate = slugify(source);
    if candidate.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        candidate
    }
}

pub fn append_body(body: &str, addition: &str, now: OffsetDateTime) -> String {
    format!(
        "{body}\n\n<hr />\n<p class=\"byline\">{}</p>\n\n{addition}",
        unix_date(now)
    )
}

pub fn comment_body(body: &str, comment: &str, actor: &Identity, now: OffsetDateTime) -> String {
    let author = ammonia::clean_text(actor.username());
    format!(
        "{body}\n\n<hr class='comment'>\n\n{comment}\n\n<p class=\"byline\"><span class=\"comment-author\">{author}</span> - {}</p>\n\n",
        unix_date(now)
    )
}

/// Best guess at the title a slug was made from: `my-new-page` → `My New Page`.
pub fn un_slug(slug: &str) -> String {
    slug.split('-')
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn ada() -> Identity {
        Identity::new("ada@example.com")
    }

    #[test]
    fn blank_title_is_generated_from_user_and_time() {
        let now = datetime!(2024-05-06 07:08:09 UTC);
        assert_eq!(generate_title("  ", &ada(), now), "ada: 2024-05-06 07:08:09 UTC");
        assert_eq!(generate_title(" Kept ", &ada(), now), "Kept");
    }

    #[test]
    fn slug_candidate_prefers_explicit_slug() {
        assert_eq!(slug_candidate("Custom Slug", "Title"), "custom-slug");
        assert_eq!(slug_candidate("", "Hello World!"), "hello-world");
        assert_eq!(slug_candidate("", "!!!"), "post");
    }

    #[test]
    fn append_adds_byline_separator() {
        let now = datetime!(2024-01-02 03:04:05 UTC);
        assert_eq!(
            append_body("first", "second", now),
            "first\n\n<hr />\n<p class=\"byline\">Tue Jan  2 03:04:05 UTC 2024</p>\n\nsecond"
        );
    }

    #[test]
    fn comment_escapes_author() {
        let now = datetime!(2024-01-02 03:04:05 UTC);
        let body = comment_body("post", "nice", &Identity::new("<b>@example.com"), now);
        assert!(body.starts_with("post\n\n<hr class='comment'>\n\nnice\n\n"));
        assert!(body.contains("<span class=\"comment-author\">&lt;b&gt;</span>"));
        assert!(body.ends_with(" - Tue Jan  2 03:04:05 UTC 2024</p>\n\n"));
    }

    #[test]
    fn un_slug_title_cases_words() {
        assert_eq!(un_slug("my-new-page"), "My New Page");
        assert_eq!(un_slug("x"), "X");
        assert_eq!(un_slug(""), "");
    }
}
