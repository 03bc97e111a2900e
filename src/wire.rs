use serde::Deserialize;

/// Plain-text error bodies shorter than this are shown as the message.
pub const MAX_TEXT_MESSAGE_LEN: usize = 200;

/// Known error body shapes. Fields are tried as `message`, `detail`, `error`.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorPayload {
    #[serde(default)]
    pub message: Option<ErrorText>,
    #[serde(default)]
    pub detail: Option<ErrorText>,
    #[serde(default)]
    pub error: Option<ErrorText>,
    #[serde(default)]
    pub code: Option<ErrorCode>,
    #[serde(default, rename = "type")]
    pub kind: Option<ErrorCode>,
}

/// A message field is either plain text or a list of validation entries
/// (`[{"loc": [...], "msg": "...", "type": "..."}]`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ErrorText {
    Text(String),
    Validation(Vec<ValidationEntry>),
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize)]
pub struct ValidationEntry {
    pub msg: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Text(String),
    Number(i64),
    Other(serde_json::Value),
}

impl ErrorText {
    fn as_message(&self) -> Option<String> {
        match self {
            Self::Text(text) if !text.is_empty() => Some(text.clone()),
            Self::Validation(entries) if !entries.is_empty() => Some(
                entries
                    .iter()
                    .map(|entry| entry.msg.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            _ => None,
        }
    }
}

impl ErrorCode {
    fn as_code(&self) -> Option<String> {
        match self {
            Self::Text(text) if !text.is_empty() => Some(text.clone()),
            Self::Number(number) => Some(number.to_string()),
            _ => None,
        }
    }
}

impl ErrorPayload {
    /// Parses a JSON error body; anything that is not an object yields an
    /// empty payload.
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    pub fn message(&self) -> Option<String> {
        [&self.message, &self.detail, &self.error]
            .into_iter()
            .flatten()
            .find_map(ErrorText::as_message)
    }

    pub fn code(&self) -> Option<String> {
        [&self.code, &self.kind]
            .into_iter()
            .flatten()
            .find_map(ErrorCode::as_code)
    }
}

/// Message for a non-JSON error body, if it is short enough to display.
pub fn text_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed.chars().count() >= MAX_TEXT_MESSAGE_LEN {
        return None;
    }
    Some(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::{text_message, ErrorPayload};

    #[test]
    fn message_priority_order() {
        let payload = ErrorPayload::parse(r#"{"error":"c","detail":"b","message":"a"}"#);
        assert_eq!(payload.message().as_deref(), Some("a"));

        let payload = ErrorPayload::parse(r#"{"error":"c","detail":"b"}"#);
        assert_eq!(payload.message().as_deref(), Some("b"));

        let payload = ErrorPayload::parse(r#"{"error":"c"}"#);
        assert_eq!(payload.message().as_deref(), Some("c"));
    }

    #[test]
    fn empty_message_falls_through() {
        let payload = ErrorPayload::parse(r#"{"message":"","detail":"not found"}"#);
        assert_eq!(payload.message().as_deref(), Some("not found"));
    }

    #[test]
    fn validation_list_is_joined() {
        let payload = ErrorPayload::parse(
            r#"{"detail":[{"loc":["body","email"],"msg":"field required","type":"missing"},
                          {"loc":["body","name"],"msg":"too short","type":"value_error"}]}"#,
        );
        assert_eq!(
            payload.message().as_deref(),
            Some("field required; too short")
        );
    }

    #[test]
    fn unknown_shapes_yield_none() {
        assert!(ErrorPayload::parse(r#"{"detail":{"nested":true}}"#)
            .message()
            .is_none());
        assert!(ErrorPayload::parse("[1,2,3]").message().is_none());
        assert!(ErrorPayload::parse("not json").message().is_none());
    }

    #[test]
    fn code_prefers_code_then_type() {
        assert_eq!(
            ErrorPayload::parse(r#"{"code":"E1","type":"t"}"#).code().as_deref(),
            Some("E1")
        );
        assert_eq!(
            ErrorPayload::parse(r#"{"type":"rate_limited"}"#).code().as_deref(),
            Some("rate_limited")
        );
        assert_eq!(
            ErrorPayload::parse(r#"{"code":42}"#).code().as_deref(),
            Some("42")
        );
    }

    #[test]
    fn short_text_bodies_become_messages() {
        assert_eq!(text_message(" Bad Gateway \n").as_deref(), Some("Bad Gateway"));
        assert!(text_message("").is_none());
        assert!(text_message(&"x".repeat(300)).is_none());
    }
}
