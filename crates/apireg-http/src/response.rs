//! Outcome to HTTP response mapping.
//!
//! Every response body is a JSON document. Failures use the message envelope:
//!
//! ```json
//! { "message": "Setting already exists" }
//! ```
//!
//! The status comes from the error code; see
//! [`ApiRegErrorCode::default_status_code`](apireg_model::ApiRegErrorCode::default_status_code).

use serde::Serialize;

use apireg_model::error::ApiRegError;
use apireg_model::output::MessageOutput;

use crate::body::ApiRegResponseBody;

/// Content type for all registry responses.
pub const CONTENT_TYPE: &str = "application/json";

/// Header carrying the per-request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Value of the `server` header.
pub const SERVER_NAME: &str = "apireg";

/// Serialize an error into its JSON response body.
#[must_use]
pub fn error_to_json(error: &ApiRegError) -> Vec<u8> {
    serde_json::to_vec(&MessageOutput::new(error.message.as_str()))
        .expect("JSON serialization of error cannot fail")
}

/// Convert an [`ApiRegError`] into a complete HTTP error response.
#[must_use]
pub fn error_to_response(error: &ApiRegError) -> http::Response<ApiRegResponseBody> {
    build_response(error.status_code, error_to_json(error))
}

/// Build a 200 response from JSON bytes.
#[must_use]
pub fn json_response(json: Vec<u8>) -> http::Response<ApiRegResponseBody> {
    build_response(http::StatusCode::OK, json)
}

/// Serialize an output value into a 200 response.
pub fn output_to_response<T: Serialize>(
    output: &T,
) -> Result<http::Response<ApiRegResponseBody>, ApiRegError> {
    let json = serde_json::to_vec(output)
        .map_err(|e| ApiRegError::internal_error().with_source(e))?;
    Ok(json_response(json))
}

/// Generate a fresh request id.
#[must_use]
pub fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Stamp the headers every registry response carries.
///
/// The request id always replaces whatever the response already had.
#[must_use]
pub fn with_common_headers(
    mut response: http::Response<ApiRegResponseBody>,
    request_id: &str,
) -> http::Response<ApiRegResponseBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = http::HeaderValue::from_str(request_id) {
        headers.insert(REQUEST_ID_HEADER, hv);
    }

    headers
        .entry(http::header::CONTENT_TYPE)
        .or_insert(http::HeaderValue::from_static(CONTENT_TYPE));

    headers.insert(http::header::SERVER, http::HeaderValue::from_static(SERVER_NAME));

    response
}

fn build_response(status: http::StatusCode, json: Vec<u8>) -> http::Response<ApiRegResponseBody> {
    http::Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, CONTENT_TYPE)
        .body(ApiRegResponseBody::from_json(json))
        .expect("valid JSON response")
}
