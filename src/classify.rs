use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::{
    wire::{text_message, ErrorPayload},
    ClassifiedError,
};

/// How a response status steers the attempt loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    /// Returned immediately, whatever attempts remain.
    Terminal,
    /// Eligible for another attempt.
    Retryable,
}

pub fn classify_status(status: StatusCode) -> StatusClass {
    if status.is_success() {
        StatusClass::Success
    } else if is_retryable_status(status) {
        StatusClass::Retryable
    } else {
        StatusClass::Terminal
    }
}

pub fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error()
        || matches!(
            status,
            StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS
        )
}

/// Classifies a transport error raised before a response was fully read.
pub fn classify_transport(err: &reqwest::Error) -> ClassifiedError {
    if err.is_timeout() {
        ClassifiedError::timeout()
    } else if err.is_connect() || err.is_request() || err.is_body() || err.is_decode() {
        // Response bodies are read as text, so a decode error here means the
        // body stream broke off, not that its content was malformed.
        ClassifiedError::network()
    } else {
        ClassifiedError::other(err.to_string())
    }
}

pub fn is_json_content_type(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|value| value.to_ascii_lowercase().contains("application/json"))
}

/// Builds the error for a non-success response, pulling a message and code
/// out of the body when it has one of the known shapes.
pub fn error_from_response(
    status: StatusCode,
    content_type: Option<&str>,
    body: &str,
) -> ClassifiedError {
    let (message, code) = if is_json_content_type(content_type) {
        let payload = ErrorPayload::parse(body);
        (payload.message(), payload.code())
    } else {
        (text_message(body), None)
    };

    ClassifiedError {
        message: message.unwrap_or_else(|| status_line(status)),
        status: Some(status.as_u16()),
        code,
        retryable: is_retryable_status(status),
    }
}

fn status_line(status: StatusCode) -> String {
    format!(
        "HTTP {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or_default()
    )
}

/// Decodes a success body into `T`.
///
/// JSON bodies are parsed directly. Other bodies are offered to `T` as a JSON
/// string, so `String` and `serde_json::Value` accept them. An empty body,
/// whatever its content type, is offered as `null` and then as `""`, so `()`,
/// `Option<_>` and `String` all accept it.
pub fn decode_success<T: DeserializeOwned>(
    content_type: Option<&str>,
    body: &str,
) -> Result<T, ClassifiedError> {
    if body.trim().is_empty() {
        if let Ok(value) = T::deserialize(JsonValue::Null) {
            return Ok(value);
        }
        return T::deserialize(JsonValue::String(String::new()))
            .map_err(|err| ClassifiedError::other(format!("invalid response body: {err}")));
    }

    let decoded = if is_json_content_type(content_type) {
        serde_json::from_str(body)
    } else {
        T::deserialize(JsonValue::String(body.to_owned()))
    };

    decoded.map_err(|err| ClassifiedError::other(format!("invalid response body: {err}")))
}
