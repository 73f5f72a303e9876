//! Request validation at the HTTP boundary.
//!
//! The core receives plain strings; shape checks on request bodies happen
//! here and fail with `AppError::Validation` (400).

use profitos_core::auth::session::MIN_PASSWORD_LEN;
use profitos_core::profit::SaleAnalysis;

use crate::error::{AppError, AppResult};
use crate::models::{AnalyzeSaleRequest, CredentialsRequest, RefreshRequest};

const MAX_EMAIL_LEN: usize = 255;

/// Minimal address check: `local@domain.tld`, no whitespace, fits the column.
pub fn validate_email(email: &str) -> AppResult<()> {
    let email = email.trim();
    let invalid = || AppError::Validation("Invalid email address".into());

    if email.is_empty() || email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(()),
        _ => Err(invalid()),
    }
}

pub fn validate_register(body: &CredentialsRequest) -> AppResult<()> {
    validate_email(&body.email)?;
    if body.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_login(body: &CredentialsRequest) -> AppResult<()> {
    validate_email(&body.email)?;
    if body.password.is_empty() {
        return Err(AppError::Validation("Password is required".into()));
    }
    Ok(())
}

/// A present refresh token must be non-empty. Returns the token, if any.
pub fn refresh_token_of(body: &RefreshRequest) -> AppResult<Option<&str>> {
    match body.refresh_token.as_deref() {
        Some("") => Err(AppError::Validation("refreshToken must not be empty".into())),
        other => Ok(other),
    }
}

pub fn validate_analyze(body: &AnalyzeSaleRequest) -> AppResult<()> {
    let sale = &body.sale;
    non_negative("sale.quantity", sale.quantity)?;
    non_negative("sale.unitPrice", sale.unit_price)?;
    if let Some(fee) = sale.fee_amount {
        finite("sale.feeAmount", fee)?;
    }
    if let Some(cost) = body.product.unit_cost {
        finite("product.unitCost", cost)?;
    }
    if let Some(fee) = body.fee_amount {
        finite("feeAmount", fee)?;
    }
    if let Some(rule) = &body.fee_rule {
        finite("feeRule.value", rule.value)?;
    }
    for cost in &body.extra_costs {
        finite("extraCosts.amount", cost.amount)?;
    }
    Ok(())
}

/// Every computed amount must be finite. Large finite inputs can still
/// overflow once multiplied.
pub fn validate_analysis(analysis: &SaleAnalysis) -> AppResult<()> {
    let values = [
        analysis.revenue,
        analysis.fee_amount,
        analysis.cost_of_goods,
        analysis.extra_costs,
        analysis.profit,
        analysis.margin_percent,
    ];
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(AppError::Validation("Amounts are too large to analyze".into()))
    }
}

fn finite(field: &str, value: f64) -> AppResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(AppError::Validation(format!("{field} must be a finite number")))
    }
}

fn non_negative(field: &str, value: f64) -> AppResult<()> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(AppError::Validation(format!("{field} must not be negative")));
    }
    Ok(())
}
