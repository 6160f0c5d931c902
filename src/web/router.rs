use axum::{
    Router,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{any, get, post},
};

use crate::web::{AppState, admin, auth, calendar, landing, library, proxy};

const ROBOTS_TXT_BODY: &str = include_str!("../../robots.txt");

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing::landing_page))
        .route("/login", get(auth::login_page).post(auth::process_login))
        .route("/logout", post(auth::logout))
        .route("/healthz", get(healthz))
        .route("/robots.txt", get(robots_txt))
        .route("/library", get(library::library_page))
        .route("/calendar", get(calendar::calendar_page))
        .route("/dashboard", get(admin::dashboard))
        .route(
            "/categories",
            get(admin::categories_page).post(admin::create_category),
        )
        .route("/categories/delete", post(admin::delete_category))
        .route("/training", get(admin::training_page))
        .route(proxy::API_PREFIX, any(proxy::forward))
        .route("/api/*rest", any(proxy::forward))
        .with_state(state)
}

async fn robots_txt() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        ROBOTS_TXT_BODY,
    )
}

async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}
