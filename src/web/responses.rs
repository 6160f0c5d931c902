use axum::{
    Json,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;

use crate::web::templates::{PageLayout, render_page};
use crate::web::escape_html;

/// Canonical JSON payload for error responses on API paths.
#[derive(Debug, Serialize, Clone)]
pub struct ApiMessage {
    pub message: String,
}

impl ApiMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiMessage::new(message))).into_response()
}

/// Minimal HTML page for failures that stop a page from rendering.
pub fn error_page(status: StatusCode, title: &str, message: &str) -> Response {
    let body = format!(
        r#"<section class="panel"><p>{message}</p><p><a href="/">Back to start</a></p></section>"#,
        message = escape_html(message),
    );
    let html = render_page(PageLayout {
        title,
        viewer_name: None,
        show_admin_link: false,
        flash_html: String::new(),
        body_html: body,
    });
    (status, Html(html)).into_response()
}
