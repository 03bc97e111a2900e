//! `resilient-http` is an async JSON API client that never leaves a call
//! hanging and never surfaces raw transport errors.
//!
//! Every call goes through [`ApiClient::execute`], which:
//! - bounds each attempt with a timeout,
//! - retries 5xx, 408, 429 and network failures with exponential backoff,
//! - returns 4xx responses immediately,
//! - reports everything as an [`Outcome`] carrying a [`ClassifiedError`].
//!
//! Verb helpers ([`ApiClient::get`], [`ApiClient::post`], [`ApiClient::put`],
//! [`ApiClient::patch`], [`ApiClient::delete`]) pin the method and delegate.

mod backoff;
mod classify;
mod client;
mod descriptor;
mod error;
mod options;
mod outcome;
mod wire;

pub use backoff::backoff_delay;
pub use client::ApiClient;
pub use descriptor::{Method, RequestDescriptor, RequestOptions};
pub use error::{ClassifiedError, ConfigError, CODE_ABORTED, CODE_INVALID_REQUEST, CODE_TIMEOUT};
pub use options::ClientOptions;
pub use outcome::Outcome;

pub use tokio_util::sync::CancellationToken;
