use std::time::Duration;

use serde::Serialize;
use serde_json::Value as JsonValue;
use tokio_util::sync::CancellationToken;

use crate::ClientOptions;

/// HTTP verbs supported by the executor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full description of one logical API call.
///
/// Built fresh per call and consumed by
/// [`ApiClient::execute`](crate::ApiClient::execute).
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
    /// Path appended to the client's base URL.
    pub endpoint: String,
    pub method: Method,
    /// Extra headers; a `content-type` entry replaces the JSON default.
    pub headers: Vec<(String, String)>,
    /// Payload for non-GET methods. A JSON string is sent verbatim.
    pub body: Option<JsonValue>,
    /// Bound on each attempt, including reading the response body.
    pub timeout: Duration,
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each later one.
    pub retry_base_delay: Duration,
    /// Forces a single attempt regardless of classification.
    pub skip_retry: bool,
    /// Cancels the call (network wait or backoff sleep) when triggered.
    pub cancel: Option<CancellationToken>,
}

impl RequestDescriptor {
    /// Creates a descriptor with the documented defaults: 10 s timeout,
    /// 3 retries, 1 s base delay.
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self::with_defaults(method, endpoint, &ClientOptions::default())
    }

    pub(crate) fn with_defaults(
        method: Method,
        endpoint: impl Into<String>,
        defaults: &ClientOptions,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            headers: Vec::new(),
            body: None,
            timeout: Duration::from_millis(defaults.timeout_ms),
            max_retries: defaults.max_retries,
            retry_base_delay: Duration::from_millis(defaults.retry_base_delay_ms),
            skip_retry: false,
            cancel: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Serializes `body` into the descriptor.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Limits the call to a single attempt.
    pub fn skip_retry(mut self) -> Self {
        self.skip_retry = true;
        self
    }

    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Total attempts the loop may make.
    pub fn max_attempts(&self) -> u32 {
        if self.skip_retry {
            1
        } else {
            self.max_retries.saturating_add(1)
        }
    }

    /// Checks the preconditions `execute` relies on.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.endpoint.trim().is_empty() {
            return Err("endpoint must not be empty".to_owned());
        }
        if self.timeout.is_zero() {
            return Err("timeout must be greater than zero".to_owned());
        }
        if self.retry_base_delay.is_zero() {
            return Err("retry base delay must be greater than zero".to_owned());
        }
        Ok(())
    }

    pub(crate) fn has_content_type(&self) -> bool {
        self.headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("content-type"))
    }
}

/// Per-call overrides used by the verb helpers on
/// [`ApiClient`](crate::ApiClient). Unset fields take the client defaults.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
    pub max_retries: Option<u32>,
    pub retry_base_delay: Option<Duration>,
    pub skip_retry: bool,
    pub cancel: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = Some(delay);
        self
    }

    /// Limits the call to a single attempt.
    pub fn skip_retry(mut self) -> Self {
        self.skip_retry = true;
        self
    }

    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub(crate) fn apply(self, mut descriptor: RequestDescriptor) -> RequestDescriptor {
        descriptor.headers = self.headers;
        if let Some(timeout) = self.timeout {
            descriptor.timeout = timeout;
        }
        if let Some(max_retries) = self.max_retries {
            descriptor.max_retries = max_retries;
        }
        if let Some(delay) = self.retry_base_delay {
            descriptor.retry_base_delay = delay;
        }
        descriptor.skip_retry = self.skip_retry;
        descriptor.cancel = self.cancel;
        descriptor
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{Method, RequestDescriptor, RequestOptions};
    use crate::ClientOptions;

    #[test]
    fn descriptor_defaults() {
        let d = RequestDescriptor::new(Method::default(), "/api/roles");
        assert_eq!(d.method, Method::Get);
        assert_eq!(d.timeout, Duration::from_secs(10));
        assert_eq!(d.max_retries, 3);
        assert_eq!(d.retry_base_delay, Duration::from_secs(1));
        assert!(!d.skip_retry);
        assert_eq!(d.max_attempts(), 4);
    }

    #[test]
    fn skip_retry_pins_single_attempt() {
        let d = RequestDescriptor::new(Method::Post, "/x")
            .max_retries(9)
            .skip_retry();
        assert_eq!(d.max_attempts(), 1);
    }

    #[test]
    fn max_attempts_saturates() {
        let d = RequestDescriptor::new(Method::Get, "/x").max_retries(u32::MAX);
        assert_eq!(d.max_attempts(), u32::MAX);
    }

    #[test]
    fn validate_rejects_bad_descriptors() {
        assert!(RequestDescriptor::new(Method::Get, "  ").validate().is_err());
        assert!(RequestDescriptor::new(Method::Get, "/x")
            .timeout(Duration::ZERO)
            .validate()
            .is_err());
        assert!(RequestDescriptor::new(Method::Get, "/x")
            .retry_base_delay(Duration::ZERO)
            .validate()
            .is_err());
        assert!(RequestDescriptor::new(Method::Get, "/x").validate().is_ok());
    }

    #[test]
    fn options_override_client_defaults() {
        let defaults = ClientOptions {
            timeout_ms: 500,
            max_retries: 1,
            retry_base_delay_ms: 20,
        };
        let base = RequestDescriptor::with_defaults(Method::Delete, "/x", &defaults);
        let d = RequestOptions::new()
            .header("X-Trace", "1")
            .max_retries(7)
            .apply(base);
        assert_eq!(d.timeout, Duration::from_millis(500));
        assert_eq!(d.retry_base_delay, Duration::from_millis(20));
        assert_eq!(d.max_retries, 7);
        assert_eq!(d.headers, vec![("X-Trace".to_owned(), "1".to_owned())]);
    }

    #[test]
    fn content_type_lookup_is_case_insensitive() {
        let d = RequestDescriptor::new(Method::Post, "/x").header("CONTENT-TYPE", "text/plain");
        assert!(d.has_content_type());
        assert!(!RequestDescriptor::new(Method::Post, "/x").has_content_type());
    }

    #[test]
    fn method_display() {
        assert_eq!(Method::Patch.to_string(), "PATCH");
    }
}
