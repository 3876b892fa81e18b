use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use salesmap_core::record::normalize_value;
use salesmap_core::{CoreError, EditInput, EditRecord, JoinedRecord};

use crate::middleware::RequestId;

use super::{normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

/// Body of the salesperson update. The field names match what the map UI has
/// always sent; `newSalesNumber` arrives as a string or a number depending
/// on the client, so it is normalized rather than typed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UpdateSalespersonRequest {
    #[serde(default)]
    new_sales_number: Value,
    #[serde(default)]
    new_salesperson: Option<String>,
    #[serde(default)]
    edit_reason: Option<String>,
    #[serde(default)]
    edit_note: Option<String>,
    #[serde(default)]
    edited_by: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UpdateData {
    updated_item: JoinedRecord,
    edit_record: EditRecord,
    backend: &'static str,
    backend_id: String,
}

/// Apply a salesperson reassignment, append it to the history, and persist
/// the full dataset through the storage gateway.
///
/// The in-memory edit is NOT rolled back when the save fails: the operator
/// sees the change and a 502, and the next successful save carries it.
/// Memory running ahead of the backing store is the documented trade-off of
/// this optimistic flow.
pub(super) async fn update_salesperson(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(store_id): Path<String>,
    Json(body): Json<UpdateSalespersonRequest>,
) -> Result<Json<ApiResponse<UpdateData>>, ApiError> {
    let number = normalize_value(&body.new_sales_number);
    let input = EditInput {
        new_employee_number: (!number.is_empty()).then_some(number),
        new_salesperson: body.new_salesperson,
        reason: body.edit_reason,
        note: body.edit_note,
        actor: body.edited_by,
    };

    // The write guard is held across the save so edits serialize; two
    // operator sessions still race at the storage layer (last write wins).
    let mut guard = state.shared.write().await;
    let shared = &mut *guard;

    let outcome = shared
        .workspace
        .apply_edit(&store_id, &input, &shared.roster)
        .map_err(|e| match e {
            CoreError::Validation(message) => {
                ApiError::new(req_id.0.clone(), "validation_error", message)
            }
            CoreError::NotFound(id) => ApiError::new(
                req_id.0.clone(),
                "not_found",
                format!("no store with id {id}"),
            ),
            other => {
                tracing::error!(error = %other, "edit failed unexpectedly");
                ApiError::new(req_id.0.clone(), "internal_error", "edit failed")
            }
        })?;

    shared.history.append(outcome.edit.clone());
    if let Err(e) = shared.history.save(&state.history_path) {
        tracing::warn!(error = %e, "failed to persist edit history");
    }

    let message = format!(
        "Update salesperson: {} - {} → {}",
        outcome.edit.store_name,
        normalize_value(&outcome.edit.changes.salesperson.before),
        normalize_value(&outcome.edit.changes.salesperson.after),
    );

    let records = shared.workspace.records().to_vec();
    match state.storage.save(&records, &message).await {
        Ok(backend_id) => Ok(Json(ApiResponse {
            data: UpdateData {
                updated_item: outcome.updated,
                edit_record: outcome.edit,
                backend: state.storage.backend_kind(),
                backend_id,
            },
            meta: ResponseMeta::new(req_id.0),
        })),
        Err(e) => {
            tracing::error!(error = %e, store_id = %store_id, "dataset save failed after edit");
            Err(ApiError::new(
                req_id.0,
                "save_failed",
                format!("dataset save failed: {e}; the edit is retained in memory"),
            ))
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct HistoryQuery {
    store_id: Option<String>,
    page: Option<usize>,
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(super) struct HistoryPage {
    items: Vec<EditRecord>,
    total: usize,
    page: usize,
    limit: usize,
}

/// Edit history, newest first, optionally filtered to one store.
pub(super) async fn list_history(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<HistoryPage>>, ApiError> {
    let limit = normalize_limit(query.limit);
    let page = query.page.unwrap_or(1).max(1);

    let shared = state.shared.read().await;
    let entries = shared.history.list(query.store_id.as_deref());
    let total = entries.len();
    let items: Vec<EditRecord> = entries
        .into_iter()
        .skip((page - 1) * limit)
        .take(limit)
        .collect();

    Ok(Json(ApiResponse {
        data: HistoryPage {
            items,
            total,
            page,
            limit,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// CSV export of the full history, as a spreadsheet-friendly attachment.
pub(super) async fn export_history(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<impl IntoResponse, ApiError> {
    let shared = state.shared.read().await;
    let bytes = shared.history.export_csv().map_err(|e| {
        tracing::error!(error = %e, "history export failed");
        ApiError::new(req_id.0, "internal_error", "history export failed")
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"edit_history.csv\"",
            ),
        ],
        bytes,
    ))
}
