/*
 * Copyright 2025 Vijaykumar Singh
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! REST API handlers that delegate to the server's database actions

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::Json as JsonResponse,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::server::actions::DatabaseActions;
use crate::storage::Record;

/// Shared application state for REST handlers
#[derive(Clone)]
pub struct AppState {
    pub actions: Arc<dyn DatabaseActions>,
}

/// Generic API response
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(error: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

type ApiError<T> = (StatusCode, JsonResponse<ApiResponse<T>>);
type ApiResult<T> = Result<JsonResponse<ApiResponse<T>>, ApiError<T>>;

/// Join the REST base path with a route suffix. A base of `/` mounts the
/// routes at the root.
pub fn api_route(base: &str, suffix: &str) -> String {
    match (base, suffix) {
        ("/", "") => "/".to_string(),
        ("/", suffix) => suffix.to_string(),
        (base, suffix) => format!("{}{}", base, suffix),
    }
}

/// Create REST router with all endpoints mounted under `rest_api_path`
pub fn create_router(rest_api_path: &str, state: AppState) -> Router {
    let mut router = Router::new()
        .route(&api_route(rest_api_path, ""), get(discovery))
        .route(&api_route(rest_api_path, "/records"), post(create_record))
        .route(
            &api_route(rest_api_path, "/records/:record_id"),
            get(get_record).delete(delete_record),
        );

    // A REST path of /health shadows the health check
    if rest_api_path != "/health" {
        router = router.route("/health", get(health_check));
    }

    router.with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> JsonResponse<ApiResponse<Value>> {
    JsonResponse(ApiResponse::success(json!({
        "status": "healthy",
        "service": "proximadb-rest",
    })))
}

/// Discovery document describing the active actions
pub async fn discovery(State(state): State<AppState>) -> JsonResponse<ApiResponse<Value>> {
    JsonResponse(ApiResponse::success(state.actions.describe()))
}

pub async fn create_record(
    State(state): State<AppState>,
    Json(properties): Json<Map<String, Value>>,
) -> Result<(StatusCode, JsonResponse<ApiResponse<Record>>), ApiError<Record>> {
    match state.actions.create_record(properties) {
        Ok(record) => {
            tracing::debug!("REST: created record {}", record.id);
            Ok((StatusCode::CREATED, JsonResponse(ApiResponse::success(record))))
        }
        Err(e) => {
            tracing::error!("Failed to create record: {}", e);
            Err(internal_error(e))
        }
    }
}

pub async fn get_record(
    State(state): State<AppState>,
    Path(record_id): Path<Uuid>,
) -> ApiResult<Record> {
    match state.actions.get_record(&record_id) {
        Ok(Some(record)) => Ok(JsonResponse(ApiResponse::success(record))),
        Ok(None) => Err(not_found(record_id)),
        Err(e) => {
            tracing::error!("Failed to get record {}: {}", record_id, e);
            Err(internal_error(e))
        }
    }
}

pub async fn delete_record(
    State(state): State<AppState>,
    Path(record_id): Path<Uuid>,
) -> ApiResult<Uuid> {
    match state.actions.delete_record(&record_id) {
        Ok(true) => Ok(JsonResponse(ApiResponse::success(record_id))),
        Ok(false) => Err(not_found(record_id)),
        Err(e) => {
            tracing::error!("Failed to delete record {}: {}", record_id, e);
            Err(internal_error(e))
        }
    }
}

fn not_found<T>(record_id: Uuid) -> ApiError<T> {
    (
        StatusCode::NOT_FOUND,
        JsonResponse(ApiResponse::error(format!("Record {} not found", record_id))),
    )
}

fn internal_error<T>(error: impl std::fmt::Display) -> ApiError<T> {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        JsonResponse(ApiResponse::error(error.to_string())),
    )
}
