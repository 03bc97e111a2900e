use std::time::Duration;

use resilient_http::{ApiClient, Outcome, RequestOptions};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Role {
    id: u64,
    title: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let api = ApiClient::from_env()?;

    let roles = api
        .get::<Vec<Role>>("/api/roles", RequestOptions::new())
        .await;
    match roles {
        Outcome::Success(roles) => {
            for role in roles {
                println!("{} {}", role.id, role.title);
            }
        }
        Outcome::Failure(error) => {
            eprintln!("could not load roles: {error} (retryable: {})", error.retryable);
        }
    }

    let created: Role = api
        .post(
            "/api/roles",
            &serde_json::json!({ "title": "Support Engineer" }),
            RequestOptions::new()
                .timeout(Duration::from_secs(5))
                .skip_retry(),
        )
        .await
        .into_result()?;
    println!("created role {}", created.id);

    Ok(())
}
