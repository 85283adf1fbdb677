//! Organization Endpoints
//!
//! Thin HTTP layer over `HierarchyService`: path and body validation, role
//! normalization, and JSON marshaling. Every business rule lives in the
//! service.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check endpoint
//! - `GET /organization` - Whole organization as nested trees
//! - `POST /organization` - Create a node (optionally with children)
//! - `GET /organization/:id` - Node subtree plus parent
//! - `GET /organization/role/:role` - Same view, looked up by role
//! - `PATCH /organization/:id` - Update fields or reparent
//! - `DELETE /organization/:id` - Delete, reattaching direct reports
//! - `GET /organization/children/:id` - Direct reports

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{AppState, HttpError};
use orgchart_core::models::{CreateOutcome, NewOrgNode, NodeDetail, OrgNode, OrgNodeUpdate, OrgTree};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
///
/// # Example
///
/// ```bash
/// curl http://localhost:3001/health
/// ```
async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Parse a node id, returning its canonical (lowercase hyphenated) form
fn parse_id(raw: &str) -> Result<String, HttpError> {
    Uuid::parse_str(raw.trim())
        .map(|id| id.to_string())
        .map_err(|e| {
            HttpError::with_details(
                format!("Invalid node id: '{}'", raw),
                "INVALID_INPUT",
                e.to_string(),
            )
        })
}

/// Validate a body-supplied parent id, treating blank as absent
fn normalize_report_to(report_to: Option<String>) -> Result<Option<String>, HttpError> {
    match report_to {
        Some(raw) if !raw.trim().is_empty() => parse_id(&raw).map(Some),
        _ => Ok(None),
    }
}

/// Upper-case roles and canonicalize parent ids of a create payload
fn normalize_new_node(mut payload: NewOrgNode) -> Result<NewOrgNode, HttpError> {
    payload.role = payload.role.trim().to_uppercase();
    payload.report_to = normalize_report_to(payload.report_to)?;
    payload.children = payload
        .children
        .into_iter()
        .map(normalize_new_node)
        .collect::<Result<_, _>>()?;
    Ok(payload)
}

/// Get the whole organization
async fn list_organization(State(state): State<AppState>) -> Result<Json<Vec<OrgTree>>, HttpError> {
    let forest = state.service.list_organization().await?;
    Ok(Json(forest))
}

/// Create a node
///
/// # Request Body
///
/// ```json
/// {
///   "name": "Grace",
///   "description": "Runs engineering",
///   "role": "cto",
///   "reportTo": "3f1c2a0e-5c8e-4f57-9a43-0d6f1f6b2b11",
///   "children": [{ "name": "Linus", "role": "vp_eng" }]
/// }
/// ```
async fn create_role(
    State(state): State<AppState>,
    Json(payload): Json<NewOrgNode>,
) -> Result<(StatusCode, Json<CreateOutcome>), HttpError> {
    let payload = normalize_new_node(payload)?;
    let outcome = state.service.create_role(payload).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// Get a node with its subtree and parent
async fn get_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NodeDetail>, HttpError> {
    let id = parse_id(&id)?;
    let detail = state.service.get_node(&id).await?;
    Ok(Json(detail))
}

/// Get a node by role
///
/// # Example
///
/// ```bash
/// curl http://localhost:3001/organization/role/ceo
/// ```
async fn get_node_by_role(
    State(state): State<AppState>,
    Path(role): Path<String>,
) -> Result<Json<NodeDetail>, HttpError> {
    let role = role.trim().to_uppercase();
    if role.is_empty() {
        return Err(HttpError::invalid_input("Role must not be blank"));
    }
    let detail = state.service.get_node_by_role(&role).await?;
    Ok(Json(detail))
}

/// Update a node
///
/// # Example
///
/// ```bash
/// curl -X PATCH http://localhost:3001/organization/<id> \
///   -H "Content-Type: application/json" \
///   -d '{"name": "Grace Hopper", "reportTo": "<parent id>"}'
/// ```
async fn update_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut update): Json<OrgNodeUpdate>,
) -> Result<Json<NodeDetail>, HttpError> {
    let id = parse_id(&id)?;
    update.role = update.role.map(|role| role.trim().to_uppercase());
    update.report_to = normalize_report_to(update.report_to)?;

    let detail = state.service.update_node(&id, update).await?;
    Ok(Json(detail))
}

/// Delete a node
async fn delete_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, HttpError> {
    let id = parse_id(&id)?;
    state.service.delete_node(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Get direct reports of a node
async fn list_children(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<OrgNode>>, HttpError> {
    let id = parse_id(&id)?;
    let children = state.service.list_children(&id).await?;
    Ok(Json(children))
}

/// Create router with all organization endpoints
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/organization", get(list_organization).post(create_role))
        .route(
            "/organization/:id",
            get(get_node).patch(update_node).delete(delete_node),
        )
        .route("/organization/role/:role", get(get_node_by_role))
        .route("/organization/children/:id", get(list_children))
        .with_state(state)
}
