use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::{
    error::{AppError, Result},
    integrations::RealtyFeedClient,
    models::{ApiResponse, Listing},
    services::estimator::{self, RenovationEstimate},
};

#[derive(Debug, Deserialize)]
pub struct FeedProxyQuery {
    pub resource: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListingPath {
    pub listing_key: String,
}

#[derive(Debug, Serialize)]
pub struct ListingDetailResponse {
    pub listing: Listing,
    pub estimate: Option<RenovationEstimate>,
}

/// GET /api/v1/realtyfeed?resource=<path>?<odata-query>
///
/// Proxies the upstream feed. The body is relayed unmodified; the no-cache
/// header keeps the feed's modification timestamps from being served stale.
pub async fn proxy_feed(
    State(state): State<AppState>,
    Query(query): Query<FeedProxyQuery>,
) -> Result<Response> {
    let resource = query
        .resource
        .filter(|raw| !raw.trim().is_empty())
        .ok_or(AppError::MissingParameter("resource"))?;

    let payload = RealtyFeedClient::from_config(&state.config)
        .fetch_resource(&resource)
        .await?;

    Ok((
        [(header::CACHE_CONTROL, "no-cache")],
        Json(payload),
    )
        .into_response())
}

/// GET /api/v1/listings/{listing_key}
///
/// One listing with its renovation estimate attached. Listings without a
/// positive list price come back with `estimate: null`.
pub async fn get_listing(
    State(state): State<AppState>,
    Path(path): Path<ListingPath>,
) -> Result<Json<ApiResponse<ListingDetailResponse>>> {
    let listing = RealtyFeedClient::from_config(&state.config)
        .get_listing(&path.listing_key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Listing {} not found", path.listing_key)))?;

    let estimate = match listing.list_price {
        Some(price) if price > 0.0 => Some(estimator::estimate(price)?),
        _ => None,
    };

    Ok(Json(ApiResponse::success(ListingDetailResponse {
        listing,
        estimate,
    })))
}
