//! Request and response bodies. JSON fields are camelCase.

use chrono::{DateTime, SecondsFormat, Utc};
use profitos_core::models::auth::{AuthSession, AuthUser};
use profitos_core::profit::{ExtraCostInput, FeeRuleInput, ProductInput, SaleInput};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Body of refresh and logout. The token is optional at the JSON level so
/// the handlers decide how a missing one is treated.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub created_at: String,
}

impl From<AuthUser> for UserResponse {
    fn from(user: AuthUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
            created_at: format_timestamp(user.created_at),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserResponse,
}

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            user: session.user.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeSaleRequest {
    pub sale: SaleInput,
    #[serde(default)]
    pub product: ProductInput,
    #[serde(default)]
    pub fee_amount: Option<f64>,
    #[serde(default)]
    pub fee_rule: Option<FeeRuleInput>,
    #[serde(default)]
    pub extra_costs: Vec<ExtraCostInput>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db: Option<String>,
}

/// RFC 3339 with milliseconds and a `Z` suffix.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn timestamps_use_millis_and_z() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 5).unwrap();
        assert_eq!(format_timestamp(ts), "2025-03-01T12:30:05.000Z");
    }

    #[test]
    fn auth_response_is_camel_case() {
        let session = AuthSession {
            access_token: "a".into(),
            refresh_token: "r".into(),
            user: AuthUser {
                id: 7,
                email: "x@y.com".into(),
                created_at: Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
            },
        };
        let json = serde_json::to_value(AuthResponse::from(session)).unwrap();
        assert_eq!(json["accessToken"], "a");
        assert_eq!(json["refreshToken"], "r");
        assert_eq!(json["user"]["id"], 7);
        assert_eq!(json["user"]["createdAt"], "2025-01-02T03:04:05.000Z");
    }

    #[test]
    fn error_body_omits_missing_code() {
        let json = serde_json::to_value(ErrorResponse {
            error: "boom".into(),
            code: None,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"error": "boom"}));
    }

    #[test]
    fn analyze_request_defaults() {
        let req: AnalyzeSaleRequest =
            serde_json::from_str(r#"{"sale":{"quantity":1,"unitPrice":10}}"#).unwrap();
        assert!(req.fee_amount.is_none());
        assert!(req.fee_rule.is_none());
        assert!(req.extra_costs.is_empty());
        assert!(req.product.unit_cost.is_none());
    }
}
