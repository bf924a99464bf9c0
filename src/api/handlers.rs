// file: src/api/handlers.rs
// description: route handlers for repository setup, liveness and health
// reference: https://docs.rs/axum/latest/axum/extract/rejection/enum.JsonRejection.html

use crate::api::state::AppState;
use crate::models::SetupRepository;
use crate::utils::{ComponentHealth, HealthReport};
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

const MISSING_FIELD: &str = "Missing data for required field.";

/// Setup body as received. Every field is optional here so that missing
/// fields can be reported together instead of failing on the first one.
#[derive(Debug, Default, Deserialize)]
pub struct SetupPayload {
    pub github_token: Option<String>,
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub branch: Option<String>,
}

impl SetupPayload {
    pub fn into_request(self) -> Result<SetupRepository, Vec<String>> {
        let mut errors = Vec::new();
        let mut take = |name: &str, value: Option<String>| {
            value.unwrap_or_else(|| {
                errors.push(format!("{}: {}", name, MISSING_FIELD));
                String::new()
            })
        };

        let github_token = take("github_token", self.github_token);
        let owner = take("owner", self.owner);
        let repo = take("repo", self.repo);
        let branch = take("branch", self.branch);

        if errors.is_empty() {
            Ok(SetupRepository::new(github_token, owner, repo, branch))
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    #[serde(flatten)]
    pub report: HealthReport,
    pub uptime_secs: u64,
}

fn bad_request(errors: Vec<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
}

pub async fn repository_setup(
    State(state): State<AppState>,
    payload: Result<Json<SetupPayload>, JsonRejection>,
) -> Response {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            error!("Validation error: {}", rejection.body_text());
            return bad_request(vec![rejection.body_text()]);
        }
    };

    let request = match payload.into_request() {
        Ok(request) => request,
        Err(errors) => {
            error!("Validation error: {}", errors.join("; "));
            return bad_request(errors);
        }
    };

    info!(
        "Setup requested for {}/{}@{}",
        request.owner, request.repo, request.branch
    );

    let response = state.service.setup(&request).await;
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response)).into_response()
}

pub async fn hello() -> Json<serde_json::Value> {
    Json(json!({ "message": "Hello, World!" }))
}

/// Reports whether the SQLite store and the vector store both answer. Either
/// one being unreachable turns the route into a 503.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = ComponentHealth::measure("database", async {
        match state.database.ping().await {
            Ok(true) => Ok(()),
            Ok(false) => Err("unexpected ping result".to_string()),
            Err(e) => Err(e.to_string()),
        }
    })
    .await;
    let vector_store = ComponentHealth::measure("vector_store", state.vectors.health_check()).await;

    let report = HealthReport::new(vec![database, vector_store]);
    let status = if report.is_serving() {
        StatusCode::OK
    } else {
        warn!("Health check failed: {:?}", report.components);
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            report,
            uptime_secs: state.uptime_secs(),
        }),
    )
}
