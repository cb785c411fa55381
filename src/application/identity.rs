use std::fmt;

use axum::http::HeaderMap;

/// Authenticated user as reported by the identity service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    email: String,
}

impl Identity {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Local part of the address, used in bylines and generated titles.
    pub fn username(&self) -> &str {
        self.email.split('@').next().unwrap_or(&self.email)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.email)
    }
}

pub trait IdentityProvider: Send + Sync {
    fn current_user(&self, headers: &HeaderMap) -> Option<Identity>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_is_local_part() {
        assert_eq!(Identity::new("ada@example.com").username(), "ada");
        assert_eq!(Identity::new("plain").username(), "plain");
    }
}
