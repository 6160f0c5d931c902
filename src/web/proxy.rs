use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::Response,
};
use tracing::error;

use crate::web::{AppState, auth::forwarded_cookies, responses::json_error};

pub const API_PREFIX: &str = "/api";
const MAX_FORWARD_BODY_BYTES: usize = 16 * 1024 * 1024;

const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    header::HOST,
    header::CONTENT_LENGTH,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
];

/// Forwards `/api/<rest>` to `<backend>/<rest>` with method, query, body and
/// end-to-end headers untouched.
pub async fn forward(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let target = match target_path(parts.uri.path(), parts.uri.query()) {
        Some(path) => state.backend().url(&path),
        None => return json_error(StatusCode::NOT_FOUND, "not an API path"),
    };

    let body = match to_bytes(body, MAX_FORWARD_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            error!(?err, "failed to read request body for proxy");
            return json_error(StatusCode::PAYLOAD_TOO_LARGE, "request body too large");
        }
    };

    let upstream = state
        .backend()
        .http()
        .request(parts.method, &target)
        .headers(outbound_headers(&parts.headers))
        .body(body)
        .send()
        .await;

    let upstream = match upstream {
        Ok(response) => response,
        Err(err) => {
            error!(?err, %target, "proxy request failed");
            return json_error(StatusCode::BAD_GATEWAY, "backend unavailable");
        }
    };

    let status = upstream.status();
    let headers = end_to_end(upstream.headers());
    let bytes = match upstream.bytes().await {
        Ok(bytes) => bytes,
        Err(err) => {
            error!(?err, %target, "failed to read proxied response");
            return json_error(StatusCode::BAD_GATEWAY, "backend response interrupted");
        }
    };

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Strips the local prefix, keeping the remainder and query verbatim.
fn target_path(path: &str, query: Option<&str>) -> Option<String> {
    let rest = path.strip_prefix(API_PREFIX)?;
    if !rest.is_empty() && !rest.starts_with('/') {
        return None;
    }
    let rest = if rest.is_empty() { "/" } else { rest };

    Some(match query {
        Some(query) => format!("{rest}?{query}"),
        None => rest.to_string(),
    })
}

fn end_to_end(headers: &HeaderMap) -> HeaderMap {
    let mut filtered = headers.clone();
    for name in &HOP_BY_HOP {
        filtered.remove(name);
    }
    filtered
}

/// Request headers sent upstream, with the portal session cookie removed.
fn outbound_headers(headers: &HeaderMap) -> HeaderMap {
    let mut outbound = end_to_end(headers);
    outbound.remove(header::COOKIE);
    if let Some(value) =
        forwarded_cookies(headers).and_then(|cookies| HeaderValue::from_str(&cookies).ok())
    {
        outbound.insert(header::COOKIE, value);
    }
    outbound
}
