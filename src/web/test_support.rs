use axum::response::Response;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{Duration, Utc};
use serde_json::json;

use crate::{store::memory::MemoryStore, web::auth::SESSION_COOKIE};

/// Creates a user with a live session and, when `role` is given, a profile.
pub fn signed_in(store: &MemoryStore, role: Option<&str>) -> CookieJar {
    let user = store.add_user("someone");
    if let Some(role) = role {
        store.seed_rows(
            "profiles",
            vec![json!({"user_id": user.to_string(), "role": role})],
        );
    }
    let token = store.add_session(user, Utc::now() + Duration::hours(1));
    CookieJar::new().add(Cookie::new(SESSION_COOKIE, token.to_string()))
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(axum::http::header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}
