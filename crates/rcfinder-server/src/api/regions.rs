use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

use rcfinder_core::{Coordinate, Region};
use rcfinder_geo::LocationQuery;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

pub(super) async fn list_regions(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<Region>>> {
    Json(ApiResponse {
        data: state.coordinator.resolver().regions().to_vec(),
        meta: ResponseMeta::new(req_id.0),
    })
}

#[derive(Debug, Deserialize)]
pub(super) struct ResolveParams {
    lat: Option<f64>,
    lng: Option<f64>,
    zip: Option<String>,
}

/// Resolve a coordinate and/or ZIP code to the regional center covering it.
/// Polygon containment wins over the ZIP table when both are supplied.
pub(super) async fn resolve_region(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<ResolveParams>,
) -> Result<Json<ApiResponse<Region>>, ApiError> {
    let coordinate = match (params.lat, params.lng) {
        (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)),
        (None, None) => None,
        _ => {
            return Err(ApiError::new(
                req_id.0,
                "validation_error",
                "lat and lng must be provided together",
            ))
        }
    };

    let query = LocationQuery {
        coordinate,
        zip: params.zip,
    };
    match state.coordinator.resolver().resolve(&query) {
        Ok(Some(region)) => Ok(Json(ApiResponse {
            data: region.clone(),
            meta: ResponseMeta::new(req_id.0),
        })),
        Ok(None) => Err(ApiError::new(
            req_id.0,
            "not_found",
            "no regional center covers this location",
        )),
        Err(err) => Err(ApiError::new(req_id.0, "validation_error", err.to_string())),
    }
}
