use axum::http::{HeaderMap, HeaderName};

use crate::application::identity::{Identity, IdentityProvider};

/// Reads the signed-in user from a header set by the authenticating proxy.
///
/// `fallback` stands in when the header is absent, for local development
/// without a proxy in front.
#[derive(Debug, Clone)]
pub struct TrustedHeaderIdentity {
    header: HeaderName,
    fallback: Option<Identity>,
}

impl TrustedHeaderIdentity {
    pub fn new(header: HeaderName, fallback: Option<String>) -> Self {
        Self {
            header,
            fallback: fallback.map(Identity::new),
        }
    }
}

impl IdentityProvider for TrustedHeaderIdentity {
    fn current_user(&self, headers: &HeaderMap) -> Option<Identity> {
        headers
            .get(&self.header)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(Identity::new)
            .or_else(|| self.fallback.clone())
    }
}
