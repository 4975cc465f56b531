use std::fmt;

use common::error::{AppError, Res};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum OAuthProvider {
    Google,
    GitHub,
}
impl OAuthProvider {
    /// Returns the OAuth provider as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::GitHub => "github",
        }
    }

    /// Creates an OAuth provider from a string.
    pub fn from_str(s: &str) -> Res<Self> {
        match s {
            "google" => Ok(OAuthProvider::Google),
            "github" => Ok(OAuthProvider::GitHub),
            ps => Err(AppError::BadRequest(format!(
                "Invalid OAuth provider: {}",
                ps
            ))),
        }
    }

    /// Returns the scopes for the OAuth provider.
    pub fn get_scopes(&self) -> Vec<&'static str> {
        match self {
            OAuthProvider::Google => vec!["email", "profile"],
            OAuthProvider::GitHub => vec!["user:email"],
        }
    }
}
impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_providers_round_trip_through_their_names() {
        for provider in [OAuthProvider::Google, OAuthProvider::GitHub] {
            assert_eq!(OAuthProvider::from_str(provider.as_str()).unwrap(), provider);
        }
    }

    #[test]
    fn unknown_provider_is_a_bad_request() {
        assert!(matches!(
            OAuthProvider::from_str("myspace"),
            Err(AppError::BadRequest(_))
        ));
    }
}
