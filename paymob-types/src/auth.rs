//! Token authentication DTOs and the cached bearer token.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Request body for `POST /api/auth/tokens`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthRequest {
    pub api_key: String,
}

impl fmt::Debug for AuthRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthRequest")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Response of the token endpoint. Only `token` is required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub profile: Option<AuthProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthProfile {
    pub id: i64,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Bearer credential with an absolute expiry.
///
/// Valid iff the current instant is strictly before `expires_at`.
#[derive(Clone)]
pub struct CachedToken {
    token: String,
    expires_at: Instant,
}

impl CachedToken {
    pub fn new(token: impl Into<String>, expires_at: Instant) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub fn is_valid_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

impl fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_token_validity_is_strict() {
        let now = Instant::now();
        let token = CachedToken::new("tok", now + Duration::from_secs(60));

        assert!(token.is_valid_at(now));
        assert!(token.is_valid_at(now + Duration::from_secs(59)));
        assert!(!token.is_valid_at(now + Duration::from_secs(60)));
        assert!(!token.is_valid_at(now + Duration::from_secs(61)));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let token = CachedToken::new("very-secret", Instant::now());
        assert!(!format!("{:?}", token).contains("very-secret"));

        let req = AuthRequest {
            api_key: "api-secret".into(),
        };
        assert!(!format!("{:?}", req).contains("api-secret"));
    }

    #[test]
    fn test_auth_response_without_profile() {
        let resp: AuthResponse = serde_json::from_str(r#"{"token":"abc"}"#).unwrap();
        assert_eq!(resp.token, "abc");
        assert!(resp.profile.is_none());
    }

    #[test]
    fn test_auth_response_with_profile() {
        let resp: AuthResponse = serde_json::from_str(
            r#"{"token":"abc","profile":{"id":7,"user":{"id":9,"username":"merchant","email":"m@example.com"}}}"#,
        )
        .unwrap();
        let profile = resp.profile.unwrap();
        assert_eq!(profile.id, 7);
        assert_eq!(profile.user.unwrap().username, "merchant");
    }
}
