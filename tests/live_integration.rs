use resilient_http::{ApiClient, ConfigError, Outcome, RequestOptions};
use serde_json::Value as JsonValue;

/// Path probed on the live backend; override with `API_LIVE_PATH`.
fn live_path() -> String {
    std::env::var("API_LIVE_PATH").unwrap_or_else(|_| "/health".to_owned())
}

#[tokio::test]
async fn live_backend_answers_with_outcome() {
    let api = match ApiClient::from_env() {
        Ok(api) => api,
        Err(ConfigError::MissingEnv(name)) => {
            eprintln!("skipping live test: {name} not set");
            return;
        }
        Err(err) => panic!("live configuration is invalid: {err}"),
    };

    let outcome = api
        .get::<JsonValue>(&live_path(), RequestOptions::new().max_retries(1))
        .await;

    match outcome {
        Outcome::Success(_) => {}
        Outcome::Failure(error) => {
            // A reachable backend answers; only the answer's status may vary.
            assert!(
                error.status.is_some(),
                "backend unreachable: {}",
                error.message
            );
        }
    }
}
