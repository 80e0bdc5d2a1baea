use axum::{extract::Query, Json};
use serde::Deserialize;

use crate::{
    error::{AppError, Result},
    models::ApiResponse,
    services::estimator::{self, RenovationEstimate},
};

#[derive(Debug, Deserialize)]
pub struct RenovationEstimateQuery {
    pub list_price: Option<f64>,
}

/// GET /api/v1/estimates/renovation?list_price=<n>
pub async fn get_renovation_estimate(
    Query(query): Query<RenovationEstimateQuery>,
) -> Result<Json<ApiResponse<RenovationEstimate>>> {
    let list_price = query
        .list_price
        .ok_or(AppError::MissingParameter("list_price"))?;

    Ok(Json(ApiResponse::success(estimator::estimate(list_price)?)))
}
