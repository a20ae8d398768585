use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};

use super::check_auth;
use crate::errors::AppResult;
use crate::models::Invoice;
use crate::state::AppState;

// GET /api/invoices
pub async fn list_invoices(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Json<Vec<Invoice>>> {
    check_auth(&headers, &state.config.admin_token)?;
    Ok(Json(state.gateway.select_invoices().await?))
}

// POST /api/invoices/:id/paid
pub async fn mark_paid(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    check_auth(&headers, &state.config.admin_token)?;

    state.gateway.mark_invoice_paid(&id).await?;
    tracing::info!(invoice_id = %id, "invoice marked paid");
    Ok(Json(json!({ "ok": true, "id": id })))
}
