//! Wire and session types for the username/password auth endpoints.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Body of `POST /auth/login`.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Body of `POST /auth/register`.
#[derive(Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &"[REDACTED]")
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Successful login/register response.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthResponse")
            .field("token", &"[REDACTED]")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// The signed-in identity and its bearer token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    token: String,
    username: String,
    #[serde(default)]
    email: Option<String>,
}

impl Session {
    pub fn new(token: impl Into<String>, username: impl Into<String>, email: Option<String>) -> Self {
        Self {
            token: token.into(),
            username: username.into(),
            email,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

impl From<AuthResponse> for Session {
    fn from(response: AuthResponse) -> Self {
        Self::new(response.token, response.username, response.email)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_never_prints_secrets() {
        let session = Session::new("eyJ.secret.sig", "jane", Some("jane@shop.example".into()));
        let login = LoginRequest::new("jane", "hunter2");
        let register = RegisterRequest::new("jane", "jane@shop.example", "hunter2");

        for rendered in [
            format!("{:?}", session),
            format!("{:?}", login),
            format!("{:?}", register),
        ] {
            assert!(!rendered.contains("eyJ.secret.sig"));
            assert!(!rendered.contains("hunter2"));
            assert!(!rendered.contains("shop.example"));
            assert!(rendered.contains("jane"));
        }
    }

    #[test]
    fn test_auth_response_without_email() {
        let response: AuthResponse =
            serde_json::from_str(r#"{"token": "t", "username": "jane"}"#).unwrap();
        let session = Session::from(response);

        assert_eq!(session.token(), "t");
        assert_eq!(session.username(), "jane");
        assert_eq!(session.email(), None);
    }

    #[test]
    fn test_register_request_wire_shape() {
        let body = serde_json::to_value(RegisterRequest::new("jane", "j@x.io", "pw")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"username": "jane", "email": "j@x.io", "password": "pw"})
        );
    }
}
