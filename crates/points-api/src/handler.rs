// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::json;
use thiserror::Error;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::db::{AppState, DbError};
use crate::openapi::ApiDoc;
use crate::oracle::OracleError;
use crate::routes::{points, referral, snapshot};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Domain error taxonomy. Every variant renders as a JSON `{"error": ...}`
/// body; status codes follow the taxonomy (bad input 400, bad signature 403,
/// missing entity 404, duplicate/self referral 409, unreachable dependency
/// 502, everything else 500).
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid signature")]
    Signature,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Dependency(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Signature => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Dependency(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Duplicate => ApiError::Conflict("Already exists".to_string()),
            other => ApiError::Internal(other.into()),
        }
    }
}

impl From<OracleError> for ApiError {
    fn from(err: OracleError) -> Self {
        ApiError::Dependency(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(ref err) = self {
            tracing::error!("Request failed: {:?}", err);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Creates the axum application with all routes
pub fn create_app(state: Arc<AppState>) -> Router {
    // Configure CORS
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // OpenAPI spec endpoint (YAML format)
        .route("/openapi.yaml", get(openapi_yaml))
        // Swagger UI documentation with generated spec (includes /openapi.json automatically)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        // Live-ledger endpoints live at the root of the path space
        .merge(points::routes())
        .nest("/snapshot", snapshot::routes())
        .nest("/referral", referral::routes())
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // Add fallback for unmatched routes
        .fallback(not_found)
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = serde_json::Value)
    )
)]
async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "points-api"
    }))
}

/// OpenAPI specification endpoint (YAML)
async fn openapi_yaml() -> impl IntoResponse {
    let openapi_json = ApiDoc::openapi();
    match serde_yaml::to_string(&openapi_json) {
        Ok(yaml) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/x-yaml")
            .body(yaml)
            .unwrap(),
        Err(err) => Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .body(format!("Failed to convert to YAML: {}", err))
            .unwrap(),
    }
}

/// 404 handler
async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not Found" })))
}

/// Create a cache control header value safely
pub fn cache_control(value: &str) -> HeaderValue {
    HeaderValue::from_str(value).unwrap_or_else(|_| HeaderValue::from_static("public, max-age=60"))
}
