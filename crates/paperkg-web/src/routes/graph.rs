//! Graph route handlers.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use paperkg_core::model::{DEFAULT_ROOT_LIMIT, MAX_ROOT_LIMIT};
use paperkg_core::{BusinessId, GraphView, LayoutPosition, Node, RootFilters};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

/// Query string of `GET /graph/root`.
#[derive(Debug, Default, Deserialize)]
pub struct RootParams {
    pub limit: Option<i64>,
    pub year_from: Option<i64>,
    pub year_to: Option<i64>,
    /// Comma-separated organization names or abbreviations.
    pub org: Option<String>,
    /// Case-insensitive substring of the author name.
    pub author: Option<String>,
}

impl RootParams {
    pub fn into_filters(self) -> Result<RootFilters, ApiError> {
        let limit = match self.limit {
            None => DEFAULT_ROOT_LIMIT,
            Some(l) => u32::try_from(l)
                .ok()
                .filter(|l| (1..=MAX_ROOT_LIMIT).contains(l))
                .ok_or_else(|| {
                    ApiError::bad_request(format!(
                        "limit must be between 1 and {}, got {}",
                        MAX_ROOT_LIMIT, l
                    ))
                })?,
        };

        Ok(RootFilters {
            limit,
            year_from: self.year_from,
            year_to: self.year_to,
            org_names: self
                .org
                .map(|s| s.split(',').map(str::to_string).collect())
                .unwrap_or_default(),
            author_name_contains: self.author,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct LayoutPersistRequest {
    #[serde(default)]
    pub layout_name: Option<String>,
    pub positions: Vec<LayoutPosition>,
}

#[derive(Debug, Serialize)]
pub struct LayoutPersistResponse {
    pub success: bool,
    pub message: String,
    pub applied: Vec<BusinessId>,
    pub skipped: Vec<BusinessId>,
}

pub async fn get_root(
    State(state): State<AppState>,
    params: Result<Query<RootParams>, QueryRejection>,
) -> Result<Json<GraphView>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let filters = params.into_filters()?;

    let view = state
        .service
        .get_root(&filters)
        .await
        .map_err(|e| ApiError::from_kg(e, state.debug))?;
    Ok(Json(view))
}

pub async fn get_children(
    State(state): State<AppState>,
    Path(node_id): Path<String>,
) -> Result<Json<GraphView>, ApiError> {
    let view = state
        .service
        .get_children(&BusinessId::new(node_id))
        .await
        .map_err(|e| ApiError::from_kg(e, state.debug))?;
    Ok(Json(view))
}

pub async fn get_node(
    State(state): State<AppState>,
    Path(node_id): Path<String>,
) -> Result<Json<Node>, ApiError> {
    let node_id = BusinessId::new(node_id);
    state
        .service
        .get_node_detail(&node_id)
        .await
        .map_err(|e| ApiError::from_kg(e, state.debug))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Node not found: {}", node_id)))
}

pub async fn persist_layout(
    State(state): State<AppState>,
    body: Result<Json<LayoutPersistRequest>, JsonRejection>,
) -> Result<Json<LayoutPersistResponse>, ApiError> {
    let Json(req) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    if let Some(name) = &req.layout_name {
        info!(layout_name = %name, positions = req.positions.len(), "Persisting layout");
    }

    let report = state
        .service
        .persist_layout(&req.positions)
        .await
        .map_err(|e| ApiError::from_kg(e, state.debug))?;

    let message = if report.is_complete() {
        format!("Layout saved for {} node(s)", report.applied.len())
    } else {
        format!(
            "Layout saved for {} node(s); {} node(s) not found",
            report.applied.len(),
            report.skipped.len()
        )
    };
    Ok(Json(LayoutPersistResponse {
        success: true,
        message,
        applied: report.applied,
        skipped: report.skipped,
    }))
}
