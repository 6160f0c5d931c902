//! Access gate shared by every page.
//!
//! Each request walks `session -> profile -> page`, strictly in that order.
//! The outcome is a [`GateDecision`]; redirects are values the handler
//! returns, never an early exit hidden inside rendering.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use thiserror::Error;
use tracing::{debug, error};

use crate::{
    store::StoreError,
    web::{
        AppState, auth,
        data::fetch_profile,
        models::{Identity, Profile},
        responses::error_page,
    },
};

pub const LOGIN_LOCATION: &str = "/login";
pub const HOME_LOCATION: &str = "/";

/// What a page demands of its viewer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessRequirement {
    Authenticated,
    Admin,
}

/// The resolved viewer of an allowed page. `profile` is only looked up for
/// admin-restricted pages.
#[derive(Clone, Debug)]
pub struct Viewer {
    pub identity: Identity,
    pub profile: Option<Profile>,
}

impl Viewer {
    pub fn is_admin(&self) -> bool {
        self.profile.as_ref().is_some_and(Profile::is_admin)
    }
}

#[derive(Debug)]
pub enum GateDecision {
    Allow(Viewer),
    RedirectTo(&'static str),
}

#[derive(Debug, Error)]
pub enum GateError {
    #[error("session lookup failed")]
    Session(#[source] StoreError),

    #[error("profile lookup failed")]
    Profile(#[source] StoreError),
}

/// Decides whether the request may render a page with `requirement`.
///
/// Identity presence is checked before role. A missing profile row, or one
/// without the admin role, is unauthorized.
pub async fn check_access(
    state: &AppState,
    jar: &CookieJar,
    requirement: AccessRequirement,
) -> Result<GateDecision, GateError> {
    let Some(identity) = auth::resolve_session(state, jar)
        .await
        .map_err(GateError::Session)?
    else {
        return Ok(GateDecision::RedirectTo(LOGIN_LOCATION));
    };

    match requirement {
        AccessRequirement::Authenticated => Ok(GateDecision::Allow(Viewer {
            identity,
            profile: None,
        })),
        AccessRequirement::Admin => {
            let profile = fetch_profile(state.records(), identity.id)
                .await
                .map_err(GateError::Profile)?;

            let viewer = Viewer { identity, profile };
            if viewer.is_admin() {
                Ok(GateDecision::Allow(viewer))
            } else {
                debug!(user_id = %viewer.identity.id, "admin page refused");
                Ok(GateDecision::RedirectTo(HOME_LOCATION))
            }
        }
    }
}

/// Handler-facing wrapper: `Ok(viewer)` to render, `Err(response)` to return
/// as-is. Backend failures become a 503 page rather than a redirect.
pub async fn require_access(
    state: &AppState,
    jar: &CookieJar,
    requirement: AccessRequirement,
) -> Result<Viewer, Response> {
    match check_access(state, jar, requirement).await {
        Ok(GateDecision::Allow(viewer)) => Ok(viewer),
        Ok(GateDecision::RedirectTo(location)) => Err(Redirect::to(location).into_response()),
        Err(err) => {
            error!(?err, "access gate could not reach the auth backend");
            Err(error_page(
                StatusCode::SERVICE_UNAVAILABLE,
                "Temporarily unavailable",
                "We could not verify your session. Please try again shortly.",
            ))
        }
    }
}

/// Fills in the profile for a viewer admitted without one, so signed-in
/// pages can still offer admins their navigation. A failed lookup only
/// costs the admin link.
pub async fn with_profile(state: &AppState, viewer: Viewer) -> Viewer {
    if viewer.profile.is_some() {
        return viewer;
    }

    match fetch_profile(state.records(), viewer.identity.id).await {
        Ok(profile) => Viewer { profile, ..viewer },
        Err(err) => {
            error!(?err, user_id = %viewer.identity.id, "failed to load profile for navigation");
            viewer
        }
    }
}
