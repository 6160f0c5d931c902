use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use axum::{
    extract::{Form, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration as ChronoDuration, Utc};
use cookie::time::Duration as CookieDuration;
use rand_core::OsRng;
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use crate::{
    store::StoreResult,
    web::{AppState, models::Identity, render_login_page, responses::error_page},
};

pub const SESSION_COOKIE: &str = "auth_token";
pub const SESSION_TTL_DAYS: i64 = 7;

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Resolves the identity behind the request's session cookie.
///
/// A missing or malformed cookie is `Ok(None)` without touching the auth
/// collaborator. Backend failures are returned as `Err`.
pub async fn resolve_session(state: &AppState, jar: &CookieJar) -> StoreResult<Option<Identity>> {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Ok(None);
    };
    let Ok(token) = Uuid::parse_str(cookie.value()) else {
        return Ok(None);
    };

    state.auth().current_session(token).await
}

/// Cookies of the incoming request that may travel to the backend. The
/// portal's own session cookie never leaves this service.
pub fn forwarded_cookies(headers: &HeaderMap) -> Option<String> {
    let kept = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .filter(|pair| pair.split('=').next().map(str::trim) != Some(SESSION_COOKIE))
        .collect::<Vec<_>>();

    if kept.is_empty() {
        None
    } else {
        Some(kept.join("; "))
    }
}

pub async fn login_page(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Html<String>, Redirect> {
    if let Some(redirect) = redirect_if_authenticated(&state, &jar).await {
        return Err(redirect);
    }

    Ok(Html(render_login_page()))
}

pub async fn process_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Redirect), Response> {
    let username = form.username.trim();

    let credentials = match state.auth().credentials_for(username).await {
        Ok(Some(credentials)) => credentials,
        Ok(None) => return Err(invalid_credentials()),
        Err(err) => {
            error!(?err, "failed to fetch user during login");
            return Err(server_error());
        }
    };

    if !verify_password(&form.password, &credentials.password_hash) {
        return Err(invalid_credentials());
    }

    let expires_at = Utc::now() + ChronoDuration::days(SESSION_TTL_DAYS);
    let token = match state
        .auth()
        .create_session(credentials.user_id, expires_at)
        .await
    {
        Ok(token) => token,
        Err(err) => {
            error!(?err, "failed to create session");
            return Err(server_error());
        }
    };

    let mut cookie = Cookie::new(SESSION_COOKIE, token.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(CookieDuration::days(SESSION_TTL_DAYS));

    Ok((jar.add(cookie), Redirect::to("/")))
}

/// Ends the backend session first; a backend failure leaves the local
/// session in place and surfaces as 502.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<(CookieJar, Redirect), Response> {
    let cookies = forwarded_cookies(&headers);
    if let Err(err) = state.backend().logout(cookies.as_deref()).await {
        error!(?err, "backend logout failed");
        return Err(error_page(
            StatusCode::BAD_GATEWAY,
            "Sign-out failed",
            "The account service did not confirm the sign-out. Please try again.",
        ));
    }

    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Ok(token) = Uuid::parse_str(cookie.value()) {
            if let Err(err) = state.auth().end_session(token).await {
                error!(?err, "failed to remove session during logout");
            }
        }
    }

    let mut removal = Cookie::new(SESSION_COOKIE, "");
    removal.set_path("/");
    removal.set_http_only(true);
    removal.set_same_site(SameSite::Lax);
    removal.set_max_age(CookieDuration::seconds(0));

    Ok((jar.remove(removal), Redirect::to("/login")))
}

pub async fn redirect_if_authenticated(state: &AppState, jar: &CookieJar) -> Option<Redirect> {
    match resolve_session(state, jar).await {
        Ok(Some(_)) => Some(Redirect::to("/")),
        Ok(None) => None,
        Err(err) => {
            error!(?err, "failed to validate session for login page");
            None
        }
    }
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

fn invalid_credentials() -> Response {
    error_page(
        StatusCode::UNAUTHORIZED,
        "Sign-in failed",
        "Unknown username or wrong password.",
    )
}

fn server_error() -> Response {
    error_page(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Server error",
        "Please try again later.",
    )
}
