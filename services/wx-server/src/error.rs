//! Mapping of service errors to HTTP responses.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, error};
use wx_common::WxError;

/// A [`WxError`] returned from a handler.
///
/// Rendered as a one-line `text/plain` body with the status code of the
/// error.
#[derive(Debug)]
pub struct ApiError(pub WxError);

impl From<WxError> for ApiError {
    fn from(err: WxError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        } else {
            debug!(status = status.as_u16(), error = %self.0, "Request rejected");
        }

        text_response(status, &self.0.to_string())
    }
}

/// Plain text response terminated by a newline.
pub fn text_response(status: StatusCode, message: &str) -> Response {
    let mut response = (status, format!("{}\n", message)).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_error() {
        let response = ApiError(WxError::LocationNotFound("ZZZZ".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );

        let response = ApiError(WxError::StorageError("down".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
