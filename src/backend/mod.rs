//! Client for the separate user/session HTTP backend.

use std::{fmt, time::Duration};

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode, header};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

const CURRENT_USER_PATH: &str = "/users/me";
const LOGOUT_PATH: &str = "/auth/logout";

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend responded with status {0}")]
    Status(StatusCode),
}

/// Backend user ids are numeric on some deployments and strings on others.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum BackendUserId {
    Number(i64),
    Text(String),
}

impl fmt::Display for BackendUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendUserId::Number(id) => write!(f, "{id}"),
            BackendUserId::Text(id) => f.write_str(id),
        }
    }
}

/// Body of `GET /users/me`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BackendUser {
    pub id: BackendUserId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl BackendUser {
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// Credentialed calls against the backend. The caller's `Cookie` header is
/// forwarded as-is.
#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    origin: String,
}

impl BackendClient {
    pub fn new(origin: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(timeout)
            .build()
            .context("failed to build backend HTTP client")?;

        Ok(Self {
            http,
            origin: origin.into(),
        })
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Joins `path` (which must start with `/`) onto the backend origin.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.origin, path)
    }

    /// Resolves the signed-in backend user. Every failure collapses to `None`.
    pub async fn current_user(&self, cookie: Option<&str>) -> Option<BackendUser> {
        let mut request = self.http.get(self.url(CURRENT_USER_PATH));
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(?err, "current user lookup failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            debug!(%status, "current user lookup rejected");
            return None;
        }

        match response.json::<BackendUser>().await {
            Ok(user) => Some(user),
            Err(err) => {
                warn!(?err, "current user response did not decode");
                None
            }
        }
    }

    /// Invalidates the backend session. Failures are returned untouched.
    pub async fn logout(&self, cookie: Option<&str>) -> Result<(), BackendError> {
        let mut request = self.http.post(self.url(LOGOUT_PATH));
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status));
        }

        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{closed_origin, spawn_backend};
    use super::*;
    use axum::{
        Json, Router,
        http::{HeaderMap, StatusCode as AxumStatus},
        routing::{get, post},
    };
    use serde_json::json;

    fn client(origin: String) -> BackendClient {
        BackendClient::new(origin, Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn current_user_decodes_success_and_forwards_cookie() {
        let router = Router::new().route(
            "/users/me",
            get(|headers: HeaderMap| async move {
                let cookie = headers
                    .get("cookie")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({"id": 7, "name": cookie}))
            }),
        );
        let backend = client(spawn_backend(router).await);

        let user = backend.current_user(Some("sid=abc")).await.unwrap();
        assert_eq!(user.id, BackendUserId::Number(7));
        assert_eq!(user.display_name(), "sid=abc");
    }

    #[tokio::test]
    async fn current_user_is_none_on_unauthorized() {
        let router = Router::new().route("/users/me", get(|| async { AxumStatus::UNAUTHORIZED }));
        let backend = client(spawn_backend(router).await);

        assert!(backend.current_user(None).await.is_none());
    }

    #[tokio::test]
    async fn current_user_is_none_on_malformed_body() {
        let router = Router::new().route("/users/me", get(|| async { "definitely not json" }));
        let backend = client(spawn_backend(router).await);

        assert!(backend.current_user(Some("sid=abc")).await.is_none());
    }

    #[tokio::test]
    async fn current_user_is_none_when_backend_unreachable() {
        let backend = client(closed_origin().await);
        assert!(backend.current_user(Some("sid=abc")).await.is_none());
    }

    #[tokio::test]
    async fn logout_resolves_on_success() {
        let router = Router::new().route("/auth/logout", post(|| async { AxumStatus::NO_CONTENT }));
        let backend = client(spawn_backend(router).await);

        backend.logout(Some("sid=abc")).await.unwrap();
    }

    #[tokio::test]
    async fn logout_propagates_status_failure() {
        let router = Router::new().route(
            "/auth/logout",
            post(|| async { AxumStatus::INTERNAL_SERVER_ERROR }),
        );
        let backend = client(spawn_backend(router).await);

        let err = backend.logout(None).await.unwrap_err();
        assert!(matches!(
            err,
            BackendError::Status(status) if status == StatusCode::INTERNAL_SERVER_ERROR
        ));
    }

    #[tokio::test]
    async fn logout_propagates_transport_failure() {
        let backend = client(closed_origin().await);
        assert!(matches!(
            backend.logout(None).await,
            Err(BackendError::Transport(_))
        ));
    }

    #[test]
    fn display_name_falls_back_to_email_then_id() {
        let user = BackendUser {
            id: BackendUserId::Text("u-1".to_string()),
            name: None,
            email: Some("reader@example.com".to_string()),
        };
        assert_eq!(user.display_name(), "reader@example.com");

        let bare = BackendUser {
            id: BackendUserId::Text("u-1".to_string()),
            name: None,
            email: None,
        };
        assert_eq!(bare.display_name(), "u-1");
    }
}
