use std::fmt;
use std::future::Future;
use std::time::Duration;

use reqwest::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    StatusCode, Url,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value as JsonValue;
use tokio::time::{sleep, timeout_at, Instant};
use tokio_util::sync::CancellationToken;

use crate::{
    backoff::backoff_delay,
    classify::{
        classify_status, classify_transport, decode_success, error_from_response, StatusClass,
    },
    ClassifiedError, ClientOptions, ConfigError, Method, Outcome, RequestDescriptor,
    RequestOptions,
};

/// Async API client that wraps every call in a timeout, bounded
/// exponential-backoff retries and a normalized error taxonomy.
///
/// Holds no per-call state: clones share the underlying connection and
/// cookie store, and any number of calls may run concurrently.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    options: ClientOptions,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("options", &self.options)
            .finish()
    }
}

/// One pass through the attempt loop.
struct Attempt {
    number: u32,
    started_at: Instant,
}

impl Attempt {
    fn start(number: u32) -> Self {
        Self {
            number,
            started_at: Instant::now(),
        }
    }

    /// Runs `fut`, giving up once `timeout` has elapsed since the attempt
    /// started. `None` means the deadline passed first.
    async fn bounded<F: Future>(&self, timeout: Duration, fut: F) -> Option<F::Output> {
        match self.started_at.checked_add(timeout) {
            Some(deadline) => timeout_at(deadline, fut).await.ok(),
            None => Some(fut.await),
        }
    }
}

/// Descriptor resolved into wire form once, reused by every attempt.
struct PreparedRequest {
    method: reqwest::Method,
    url: Url,
    headers: HeaderMap,
    body: Option<String>,
}

struct RawResponse {
    status: StatusCode,
    content_type: Option<String>,
    body: String,
}

impl ApiClient {
    /// Creates a client for `base_url` with the default policy
    /// (10 s timeout, 3 retries, 1 s base delay).
    ///
    /// The base URL must be an absolute `http`/`https` URL. Cookies set by the
    /// server are stored and sent back on later calls.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ConfigError> {
        let base_url = normalize_base_url(base_url.into())?;
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            http,
            base_url,
            options: ClientOptions::default(),
        })
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `API_BASE_URL` — backend origin, e.g. `https://api.example.com`
    /// - `API_TIMEOUT_MS`, `API_MAX_RETRIES`, `API_RETRY_DELAY_MS` — optional
    ///   overrides of [`ClientOptions`]
    ///
    /// # Example
    ///
    /// ```no_run
    /// use resilient_http::ApiClient;
    ///
    /// let api = ApiClient::from_env().expect("missing API_BASE_URL");
    /// ```
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("API_BASE_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::MissingEnv("API_BASE_URL"))?;
        Self::new(base_url)?.with_options(ClientOptions::from_env()?)
    }

    /// Replaces the default timeout and retry policy.
    pub fn with_options(mut self, opts: ClientOptions) -> Result<Self, ConfigError> {
        opts.validate()?;
        self.options = opts;
        Ok(self)
    }

    /// Returns the normalized base URL every endpoint is appended to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the default policy applied to calls without overrides.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Resolves per-call options against this client's defaults.
    pub fn descriptor(
        &self,
        method: Method,
        endpoint: impl Into<String>,
        options: RequestOptions,
    ) -> RequestDescriptor {
        options.apply(RequestDescriptor::with_defaults(
            method,
            endpoint,
            &self.options,
        ))
    }

    /// Sends a GET request to `endpoint`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Outcome<T> {
        self.execute(self.descriptor(Method::Get, endpoint, options))
            .await
    }

    /// Sends a POST request with `body` to `endpoint`.
    pub async fn post<T, B>(&self, endpoint: &str, body: &B, options: RequestOptions) -> Outcome<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(Method::Post, endpoint, body, options)
            .await
    }

    /// Sends a PUT request with `body` to `endpoint`.
    pub async fn put<T, B>(&self, endpoint: &str, body: &B, options: RequestOptions) -> Outcome<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(Method::Put, endpoint, body, options)
            .await
    }

    /// Sends a PATCH request with `body` to `endpoint`.
    pub async fn patch<T, B>(&self, endpoint: &str, body: &B, options: RequestOptions) -> Outcome<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(Method::Patch, endpoint, body, options)
            .await
    }

    /// Sends a DELETE request to `endpoint`.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Outcome<T> {
        self.execute(self.descriptor(Method::Delete, endpoint, options))
            .await
    }

    async fn send_with_body<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: &B,
        options: RequestOptions,
    ) -> Outcome<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        match self.descriptor(method, endpoint, options).json(body) {
            Ok(descriptor) => self.execute(descriptor).await,
            Err(err) => Outcome::Failure(ClassifiedError::invalid_request(format!(
                "request body could not be serialized: {err}"
            ))),
        }
    }

    /// Runs the attempt loop for `descriptor` and returns its single outcome.
    ///
    /// At most `max_retries + 1` attempts are made (exactly one with
    /// `skip_retry`). A 2xx response ends the loop with
    /// [`Outcome::Success`]; a 4xx other than 408/429, a cancellation, or an
    /// exhausted retry budget ends it with [`Outcome::Failure`]. Between
    /// attempts the loop sleeps `retry_base_delay * 2^(attempt - 1)`.
    ///
    /// Never panics on transport failures and never waits past the
    /// descriptor's timeout for a single attempt.
    pub async fn execute<T: DeserializeOwned>(&self, descriptor: RequestDescriptor) -> Outcome<T> {
        let request = match self.prepare(&descriptor) {
            Ok(request) => request,
            Err(error) => return Outcome::Failure(error),
        };
        let cancel = descriptor.cancel.as_ref();
        let max_attempts = descriptor.max_attempts();

        for number in 1..=max_attempts {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                return Outcome::Failure(ClassifiedError::aborted());
            }

            let attempt = Attempt::start(number);
            let result = until_cancelled(
                cancel,
                attempt.bounded(descriptor.timeout, self.send_once(&request)),
            )
            .await;

            let error = match result {
                None => return Outcome::Failure(ClassifiedError::aborted()),
                Some(None) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        method = %descriptor.method,
                        url = %request.url,
                        attempt = attempt.number,
                        timeout_ms = descriptor.timeout.as_millis() as u64,
                        "request timed out"
                    );
                    ClassifiedError::timeout()
                }
                Some(Some(Err(err))) => classify_transport(&err),
                Some(Some(Ok(response))) => match classify_status(response.status) {
                    StatusClass::Success => {
                        match decode_success(response.content_type.as_deref(), &response.body) {
                            Ok(data) => return Outcome::Success(data),
                            Err(error) => error,
                        }
                    }
                    StatusClass::Terminal | StatusClass::Retryable => error_from_response(
                        response.status,
                        response.content_type.as_deref(),
                        &response.body,
                    ),
                },
            };

            if !error.retryable || attempt.number == max_attempts {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    method = %descriptor.method,
                    url = %request.url,
                    attempts = attempt.number,
                    status = ?error.status,
                    retryable = error.retryable,
                    "request failed: {}",
                    error.message
                );
                return Outcome::Failure(error);
            }

            let delay = backoff_delay(descriptor.retry_base_delay, attempt.number);

            #[cfg(feature = "tracing")]
            tracing::debug!(
                method = %descriptor.method,
                url = %request.url,
                attempt = attempt.number,
                delay_ms = delay.as_millis() as u64,
                "retrying request after error: {}",
                error.message
            );

            if until_cancelled(cancel, sleep(delay)).await.is_none() {
                return Outcome::Failure(ClassifiedError::aborted());
            }
        }

        Outcome::Failure(ClassifiedError::unknown())
    }

    fn prepare(&self, descriptor: &RequestDescriptor) -> Result<PreparedRequest, ClassifiedError> {
        descriptor
            .validate()
            .map_err(ClassifiedError::invalid_request)?;

        let raw_url = join_url(&self.base_url, &descriptor.endpoint);
        let url = Url::parse(&raw_url).map_err(|err| {
            ClassifiedError::invalid_request(format!("invalid url '{raw_url}': {err}"))
        })?;

        let mut headers = HeaderMap::new();
        if !descriptor.has_content_type() {
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }
        for (name, value) in &descriptor.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                ClassifiedError::invalid_request(format!("invalid header name '{name}'"))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|_| {
                ClassifiedError::invalid_request(format!("invalid value for header '{name}'"))
            })?;
            headers.append(header_name, header_value);
        }

        let body = match (&descriptor.body, descriptor.method) {
            (_, Method::Get) | (None, _) | (Some(JsonValue::Null), _) => None,
            (Some(JsonValue::String(text)), _) => Some(text.clone()),
            (Some(value), _) => Some(value.to_string()),
        };

        Ok(PreparedRequest {
            method: descriptor.method.to_reqwest(),
            url,
            headers,
            body,
        })
    }

    async fn send_once(&self, request: &PreparedRequest) -> Result<RawResponse, reqwest::Error> {
        let mut builder = self
            .http
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.text().await?;

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Races `fut` against `cancel`. `None` means the token fired first.
async fn until_cancelled<F: Future>(
    cancel: Option<&CancellationToken>,
    fut: F,
) -> Option<F::Output> {
    match cancel {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => None,
            output = fut => Some(output),
        },
        None => Some(fut.await),
    }
}

fn normalize_base_url(raw: String) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        url: raw.clone(),
        reason,
    };

    let parsed = Url::parse(trimmed).map_err(|err| invalid(err.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }
    Ok(trimmed.to_owned())
}

fn join_url(base_url: &str, endpoint: &str) -> String {
    let endpoint = endpoint.trim();
    if endpoint.starts_with('/') || endpoint.starts_with('?') {
        format!("{base_url}{endpoint}")
    } else {
        format!("{base_url}/{endpoint}")
    }
}
