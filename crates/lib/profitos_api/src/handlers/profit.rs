//! Profit analysis handler.

use axum::Json;
use profitos_core::profit::{SaleAnalysis, analyze_sale, resolve_fee_amount};

use crate::error::AppResult;
use crate::models::AnalyzeSaleRequest;
use crate::validation;

/// `POST /v1/profit/analyze`: breakdown of one sale.
pub async fn analyze_handler(Json(body): Json<AnalyzeSaleRequest>) -> AppResult<Json<SaleAnalysis>> {
    validation::validate_analyze(&body)?;
    let fee = resolve_fee_amount(body.fee_amount, &body.sale, body.fee_rule.as_ref());
    let analysis = analyze_sale(&body.sale, &body.product, fee, &body.extra_costs);
    validation::validate_analysis(&analysis)?;
    Ok(Json(analysis))
}
