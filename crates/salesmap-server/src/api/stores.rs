use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

use salesmap_core::{FacetOptions, FilterState, JoinedRecord};

use crate::middleware::RequestId;

use super::{ApiResponse, AppState, ResponseMeta};

/// Facet selections from query parameters. `salesperson` repeats, so the
/// raw pair list is parsed instead of a struct — `?branch=B&salesperson=Kim&
/// salesperson=Lee` becomes a multi-select of two names in query order.
fn filter_from_pairs(pairs: &[(String, String)]) -> FilterState {
    let mut state = FilterState::default();
    for (key, value) in pairs {
        let value = value.trim();
        match key.as_str() {
            "branch" if !value.is_empty() => state.branch = Some(value.to_string()),
            "office" if !value.is_empty() => state.office = Some(value.to_string()),
            "salesperson" if !value.is_empty() => state.salespeople.push(value.to_string()),
            _ => {}
        }
    }
    state
}

/// Geo-valid joined records passing the requested facet filters.
pub(super) async fn list_stores(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Json<ApiResponse<Vec<JoinedRecord>>> {
    let filter = filter_from_pairs(&pairs);

    let shared = state.shared.read().await;
    let data: Vec<JoinedRecord> = shared
        .workspace
        .geo_records()
        .filter(|record| filter.matches(record))
        .cloned()
        .collect();

    Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    })
}

#[derive(Debug, Deserialize)]
pub(super) struct FacetQuery {
    branch: Option<String>,
    office: Option<String>,
}

/// Branch/office/salesperson option sets under the given selection,
/// following the branch → office → salesperson cascade.
pub(super) async fn list_facets(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<FacetQuery>,
) -> Json<ApiResponse<FacetOptions>> {
    let selection = FilterState {
        branch: query.branch.filter(|b| !b.trim().is_empty()),
        office: query.office.filter(|o| !o.trim().is_empty()),
        salespeople: Vec::new(),
    };

    let shared = state.shared.read().await;
    let data = shared.workspace.facets_for(&selection);

    Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    })
}
