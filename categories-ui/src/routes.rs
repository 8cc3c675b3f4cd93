//! HTTP route handlers for the category API.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use categories::category::{Category, NewCategory, TreeNode, Update};
use categories::coordinator::Coordinator;
use categories::core::reorder_planner::plan;
use categories::core::tree_builder::build_tree_report;
use categories::core::types::{DropPosition, PlanResult};
use categories::error::{BatchRejected, CoordinatorError, PlanError};
use categories::io::gateway::CategoryGateway;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::state::AppState;

type ApiResult<T> = Result<T, (StatusCode, String)>;

/// Build the API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/tree", get(get_tree))
        .route("/categories/reorder", post(reorder))
        .route("/categories/plan", post(plan_move))
}

async fn health() -> &'static str {
    "ok"
}

/// GET /api/categories - flat list, capped at the configured limit.
async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    let categories = state.gateway.list_categories().await.map_err(internal)?;
    Ok(Json(categories))
}

#[derive(Serialize)]
struct TreeResponse {
    roots: Vec<TreeNode>,
    /// Ids promoted to roots because their parent is missing.
    orphans: Vec<String>,
}

/// GET /api/categories/tree - nested display tree.
async fn get_tree(State(state): State<AppState>) -> ApiResult<Json<TreeResponse>> {
    let categories = state.gateway.list_categories().await.map_err(internal)?;
    let built = build_tree_report(&categories);
    Ok(Json(TreeResponse {
        roots: built.roots,
        orphans: built.orphans,
    }))
}

/// POST /api/categories - create a category after its siblings.
async fn create_category(
    State(state): State<AppState>,
    Json(request): Json<NewCategory>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let mut coordinator = Coordinator::hydrate(Arc::clone(&state.gateway))
        .await
        .map_err(internal)?;
    let created = coordinator
        .create_node(request)
        .await
        .map_err(coordinator_error)?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Deserialize)]
struct ReorderRequest {
    updates: Vec<Update>,
}

/// POST /api/categories/reorder - apply an update batch all-or-nothing.
///
/// The batch is checked inside the gateway's transaction, so a rejection
/// always reflects the store it would have been written to.
async fn reorder(
    State(state): State<AppState>,
    Json(request): Json<ReorderRequest>,
) -> ApiResult<StatusCode> {
    let count = request.updates.len();
    state
        .gateway
        .bulk_reorder(request.updates)
        .await
        .map_err(reorder_error)?;
    info!(updates = count, "reorder batch applied");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct PlanRequest {
    drag_id: String,
    target_id: String,
    position: DropPosition,
}

/// POST /api/categories/plan - plan a move without saving it.
async fn plan_move(
    State(state): State<AppState>,
    Json(request): Json<PlanRequest>,
) -> ApiResult<Json<PlanResult>> {
    let categories = state.gateway.list_categories().await.map_err(internal)?;
    let planned = plan(
        &categories,
        &request.drag_id,
        &request.target_id,
        request.position,
    )
    .map_err(plan_error)?;
    Ok(Json(planned))
}

fn internal(err: anyhow::Error) -> (StatusCode, String) {
    let message = format!("{err:#}");
    warn!(error = %message, "store request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, message)
}

fn reorder_error(err: anyhow::Error) -> (StatusCode, String) {
    match err.downcast_ref::<BatchRejected>() {
        Some(rejected) => (StatusCode::UNPROCESSABLE_ENTITY, rejected.to_string()),
        None => internal(err),
    }
}

fn plan_error(err: PlanError) -> (StatusCode, String) {
    let status = match err {
        PlanError::NotFound { .. } => StatusCode::NOT_FOUND,
        PlanError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (status, err.to_string())
}

fn coordinator_error(err: CoordinatorError) -> (StatusCode, String) {
    match err {
        CoordinatorError::Plan(plan) => plan_error(plan),
        CoordinatorError::InvalidInput(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
        CoordinatorError::Network(err) => internal(err),
        other => (StatusCode::CONFLICT, other.to_string()),
    }
}
