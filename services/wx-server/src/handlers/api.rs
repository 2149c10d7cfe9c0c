//! Data endpoints: `/metar`, `/taf`, `/location` and `/all`.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header, Uri},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use wx_common::WxError;

use crate::aggregate::aggregate;
use crate::config::ServerConfig;
use crate::dispatch::{decode_path, dispatch, is_endpoint_path};
use crate::error::ApiError;
use crate::state::AppState;

/// Serves every path not claimed by a static route.
///
/// Paths outside the data endpoints are refused with 403.
pub async fn weather_handler(
    Extension(state): Extension<Arc<AppState>>,
    uri: Uri,
) -> Result<Response, ApiError> {
    let path = decode_path(uri.path())?;
    if !is_endpoint_path(&path) {
        return Err(WxError::UnknownPath(path).into());
    }

    let request = dispatch(&path, uri.query())?;
    let result = aggregate(state.store.as_ref(), &request).await?;
    json_response(&state.config, &result)
}

/// Encode `value` as a JSON response body terminated by a newline.
pub fn json_response<T: Serialize>(config: &ServerConfig, value: &T) -> Result<Response, ApiError> {
    let encoded = if config.pretty_json {
        serde_json::to_vec_pretty(value)
    } else {
        serde_json::to_vec(value)
    };
    let mut body = encoded.map_err(WxError::from)?;
    body.push(b'\n');

    Ok(([(header::CONTENT_TYPE, config.json_content_type())], body).into_response())
}
