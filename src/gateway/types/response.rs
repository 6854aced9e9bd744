//! Response envelope shared by every route
//!
//! Success bodies carry `code = 0` and the payload in `data`. Failures carry
//! one of the [`error_codes`] and no `data`, so clients branch on `code`
//! alone and never on the HTTP status.

use serde::Serialize;
use utoipa::ToSchema;

/// `{code, msg, data}` body of every booking, wallet and admin response
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// 0 on success, otherwise an entry of `error_codes`
    #[schema(example = 0)]
    pub code: i32,
    #[schema(example = "ok")]
    pub msg: String,
    /// Omitted on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: error_codes::SUCCESS,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

/// Numeric codes, one per `CoreError` kind plus the gateway's own auth and
/// availability failures
pub mod error_codes {
    pub const SUCCESS: i32 = 0;

    // 1xxx: request rejected by a marketplace rule
    /// Malformed body, bad money string, failed validation
    pub const INVALID_PARAMETER: i32 = 1001;
    /// Withdrawal or debit larger than the settled balance
    pub const INSUFFICIENT_BALANCE: i32 = 1002;
    /// Booking edge not in the state machine
    pub const INVALID_TRANSITION: i32 = 1003;
    /// Entity not in the status the step needs
    pub const INVALID_STATE: i32 = 1004;
    /// Ledger reference already used for this expert
    pub const DUPLICATE_CREDIT: i32 = 1005;
    /// Booking already reviewed
    pub const DUPLICATE_REVIEW: i32 = 1006;

    // 2xxx: actor identity
    pub const MISSING_AUTH: i32 = 2001;
    pub const AUTH_FAILED: i32 = 2002;
    /// Valid token, wrong role or not a participant
    pub const FORBIDDEN: i32 = 2003;

    // 4xxx: booking, withdrawal or wallet not found
    pub const NOT_FOUND: i32 = 4001;

    // 5xxx: message masked before it leaves the gateway
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5001;
    pub const DATABASE_ERROR: i32 = 5002;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let json = serde_json::to_value(ApiResponse::success(42)).unwrap();
        assert_eq!(json, serde_json::json!({"code": 0, "msg": "ok", "data": 42}));
    }

    #[test]
    fn test_error_envelope_omits_data() {
        let resp =
            ApiResponse::<()>::error(error_codes::DUPLICATE_REVIEW, "Booking already reviewed");
        let json = serde_json::to_value(resp).unwrap();
        assert_eq!(json["code"], 1006);
        assert!(json.get("data").is_none());
    }
}
