//! Slug derivation for post URLs.
//!
//! [`slugify`] is a pure transform. [`unique_slug`] layers a collision probe on
//! top of it; callers supply the existence check so the logic stays free of any
//! persistence concern.

use std::future::Future;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Upper bound on suffixed candidates probed before giving up.
pub const MAX_SUFFIX_ATTEMPTS: usize = 1000;

static NON_WORD_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9A-Za-z_]+").expect("static slug pattern"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("exhausted attempts to find a unique slug for `{base}`")]
    Exhausted { base: String },
}

/// Errors raised by [`unique_slug`] when the existence predicate itself fails.
#[derive(Debug, Error)]
pub enum SlugAsyncError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error(transparent)]
    Predicate(E),
}

/// Collapse every run of non-word characters into one hyphen and lowercase.
///
/// Leading and trailing hyphens are stripped, so `"Hello World!"` becomes
/// `"hello-world"`. The result may be empty when the input has no word
/// characters at all.
pub fn slugify(input: &str) -> String {
    let replaced = NON_WORD_RUN.replace_all(input, "-");
    replaced.trim_matches('-').to_lowercase()
}

/// Resolve `base` to a slug for which `exists` returns `false`.
///
/// Collisions are retried as `base-0`, `base-1`, `base-2`, … and the first free
/// candidate wins.
pub async fn unique_slug<F, Fut, E>(base: &str, mut exists: F) -> Result<String, SlugAsyncError<E>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    if !exists(base.to_string())
        .await
        .map_err(SlugAsyncError::Predicate)?
    {
        return Ok(base.to_string());
    }

    for attempt in 0..MAX_SUFFIX_ATTEMPTS {
        let candidate = format!("{base}-{attempt}");
        if !exists(candidate.clone())
            .await
            .map_err(SlugAsyncError::Predicate)?
        {
            return Ok(candidate);
        }
    }

    Err(SlugAsyncError::Slug(SlugError::Exhausted {
        base: base.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::Arc;

    use tokio::sync::Mutex;

    use super::*;

    #[test]
    fn slugify_collapses_punctuation_runs() {
        assert_eq!(slugify("Hello World!"), "hello-world");
        assert_eq!(slugify("  Rust -- ownership & borrowing  "), "rust-ownership-borrowing");
        assert_eq!(slugify("snake_case stays"), "snake_case-stays");
    }

    #[test]
    fn slugify_is_idempotent() {
        for input in ["Hello World!", "a--b", "Déjà vu", "", "!!!", "x_y z", "Title: 2024-01-01"] {
            let once = slugify(input);
            assert_eq!(slugify(&once), once, "input `{input}`");
        }
    }

    #[test]
    fn slugify_treats_non_ascii_as_separators() {
        assert_eq!(slugify("café au lait"), "caf-au-lait");
        assert_eq!(slugify("!!!"), "");
    }

    #[tokio::test]
    async fn unique_slug_returns_base_when_free() {
        let slug = unique_slug("fresh", |_| async { Ok::<bool, Infallible>(false) })
            .await
            .expect("slug");
        assert_eq!(slug, "fresh");
    }

    #[tokio::test]
    async fn unique_slug_appends_zero_based_counter() {
        let existing = Arc::new(Mutex::new(vec!["test".to_string(), "test-0".to_string()]));

        let slug = unique_slug("test", |candidate| {
            let existing = existing.clone();
            async move { Ok::<bool, Infallible>(existing.lock().await.contains(&candidate)) }
        })
        .await
        .expect("unique slug");

        assert_eq!(slug, "test-1");
    }

    #[tokio::test]
    async fn unique_slug_exhausts() {
        let err = unique_slug("taken", |_| async { Ok::<bool, Infallible>(true) })
            .await
            .expect_err("should exhaust attempts");
        assert!(matches!(
            err,
            SlugAsyncError::Slug(SlugError::Exhausted { ref base }) if base == "taken"
        ));
    }

    #[tokio::test]
    async fn unique_slug_propagates_predicate_errors() {
        let err = unique_slug("any", |_| async { Err::<bool, _>(std::fmt::Error) })
            .await
            .expect_err("predicate failure");
        assert!(matches!(err, SlugAsyncError::Predicate(_)));
    }
}
