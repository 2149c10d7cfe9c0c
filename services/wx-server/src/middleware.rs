//! Method filtering, OPTIONS handling and CORS headers.
//!
//! The API is read-only: GET and HEAD reach the handlers, OPTIONS is
//! answered here and every other method is refused with 405.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::ALLOWED_METHODS;
use crate::error::text_response;
use crate::state::AppState;

pub async fn method_guard(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();

    if method == Method::GET || method == Method::HEAD {
        let mut response = next.run(request).await;
        if state.config.enable_cors {
            set_cors_headers(response.headers_mut());
        }
        return response;
    }

    if method == Method::OPTIONS {
        return serve_options(request.headers(), state.config.enable_cors);
    }

    let mut response = text_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &format!("Method {} is not allowed", method),
    );
    response
        .headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
    response
}

/// Answer an OPTIONS request.
///
/// A CORS preflight gets the CORS headers; any other OPTIONS request gets the
/// list of allowed methods.
pub fn serve_options(headers: &HeaderMap, enable_cors: bool) -> Response {
    let preflight = [
        header::ACCESS_CONTROL_REQUEST_METHOD,
        header::ACCESS_CONTROL_REQUEST_HEADERS,
        header::ORIGIN,
    ]
    .iter()
    .any(|name| headers.get(name).map_or(false, |v| !v.is_empty()));

    let mut response = StatusCode::NO_CONTENT.into_response();
    let response_headers = response.headers_mut();
    if enable_cors && preflight {
        set_cors_headers(response_headers);
    } else {
        response_headers.insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
        response_headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    }
    response
}

pub fn set_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("*"),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_options() {
        let response = serve_options(&HeaderMap::new(), true);
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()[header::ALLOW], "GET, HEAD, OPTIONS");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
        assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[test]
    fn test_preflight() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ORIGIN, HeaderValue::from_static("https://example.org"));

        let response = serve_options(&headers, true);
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS], "*");
        assert!(response.headers().get(header::ALLOW).is_none());
    }

    #[test]
    fn test_preflight_with_cors_disabled() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCESS_CONTROL_REQUEST_METHOD,
            HeaderValue::from_static("GET"),
        );

        let response = serve_options(&headers, false);
        assert_eq!(response.headers()[header::ALLOW], "GET, HEAD, OPTIONS");
        assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }
}
