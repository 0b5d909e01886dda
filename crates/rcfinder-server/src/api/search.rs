use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use rcfinder_core::{
    AgeGroup, Coordinate, Diagnosis, Insurance, SearchFilters, SortOption, COUNTY_CENTROID,
    DEFAULT_RADIUS_MILES,
};
use rcfinder_search::SearchResult;

use super::{map_search_error, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(super) struct SearchParams {
    lat: Option<f64>,
    lng: Option<f64>,
    q: Option<String>,
    age_group: Option<AgeGroup>,
    diagnosis: Option<Diagnosis>,
    insurance: Option<Insurance>,
    /// Comma-separated therapy types.
    therapy: Option<String>,
    radius: Option<f64>,
    sort: Option<SortOption>,
}

#[derive(Debug, Serialize)]
pub(super) struct SearchData {
    #[serde(flatten)]
    pub result: SearchResult,
    /// True when no device location was supplied and results are anchored
    /// at the county fallback point rather than the caller's position.
    pub location_fallback: bool,
}

/// Run the full search pipeline: canonical query, upstream fetch (cached,
/// single-flighted), region resolution, and distance ranking.
pub(super) async fn search_providers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<SearchData>>, ApiError> {
    let (location, location_fallback) = match (params.lat, params.lng) {
        (Some(lat), Some(lng)) => (Coordinate::new(lat, lng), false),
        (None, None) => (COUNTY_CENTROID, true),
        _ => {
            return Err(ApiError::new(
                req_id.0,
                "validation_error",
                "lat and lng must be provided together",
            ))
        }
    };

    let filters = SearchFilters {
        age_group: params.age_group,
        diagnosis: params.diagnosis,
        insurance: params.insurance,
        therapy_types: params
            .therapy
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(ToOwned::to_owned)
                    .collect()
            })
            .unwrap_or_default(),
        radius_miles: params.radius.unwrap_or(DEFAULT_RADIUS_MILES),
        free_text: params.q,
    };
    let sort = params.sort.unwrap_or(SortOption::Distance);

    match state.coordinator.search_now(&filters, location, sort).await {
        Ok(result) => Ok(Json(ApiResponse {
            data: SearchData {
                result,
                location_fallback,
            },
            meta: ResponseMeta::new(req_id.0),
        })),
        Err(err) => Err(map_search_error(req_id.0, &err)),
    }
}
