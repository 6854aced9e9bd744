//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::booking::{Booking, BookingStatus, Review};
use crate::gateway::handlers::health::HealthResponse;
use crate::gateway::types::{
    AdjustRequest, CancelBookingRequest, CreateBookingRequest, CreditRequest, MarkPaidRequest,
    MoneyAmount, RejectWithdrawalRequest, ReviewRequest, WithdrawalBody,
};
use crate::ranking::{RankingFactors, RankingScore};
use crate::wallet::{
    TransactionStatus, TransactionType, WalletAccount, WalletTransaction, WithdrawalRequest,
    WithdrawalStatus,
};

/// Bearer JWT issued by the external auth provider
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "HS256 token from the auth provider. Claims: sub (user id), role (client | expert | admin), exp",
                        ))
                        .build(),
                ),
            );
        }
    }
}

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Cunslt Core API",
        version = "1.0.0",
        description = "Booking lifecycle, expert ranking and wallet ledger for the Cunslt consulting marketplace.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health::health_check,
        crate::gateway::handlers::ranking::get_ranking,
        // Bookings
        crate::gateway::handlers::bookings::create_booking,
        crate::gateway::handlers::bookings::get_booking,
        crate::gateway::handlers::bookings::confirm_booking,
        crate::gateway::handlers::bookings::start_booking,
        crate::gateway::handlers::bookings::complete_booking,
        crate::gateway::handlers::bookings::cancel_booking,
        crate::gateway::handlers::bookings::review_booking,
        // Wallet
        crate::gateway::handlers::wallet::get_wallet,
        crate::gateway::handlers::wallet::list_transactions,
        crate::gateway::handlers::wallet::list_withdrawals,
        crate::gateway::handlers::wallet::request_withdrawal,
        // Admin
        crate::gateway::handlers::admin::compute_ranking,
        crate::gateway::handlers::admin::credit_wallet,
        crate::gateway::handlers::admin::adjust_wallet,
        crate::gateway::handlers::admin::pending_withdrawals,
        crate::gateway::handlers::admin::approve_withdrawal,
        crate::gateway::handlers::admin::reject_withdrawal,
        crate::gateway::handlers::admin::mark_withdrawal_paid,
    ),
    components(
        schemas(
            HealthResponse,
            Booking,
            BookingStatus,
            Review,
            RankingScore,
            RankingFactors,
            WalletAccount,
            WalletTransaction,
            TransactionType,
            TransactionStatus,
            WithdrawalRequest,
            WithdrawalStatus,
            MoneyAmount,
            CreateBookingRequest,
            CancelBookingRequest,
            ReviewRequest,
            WithdrawalBody,
            CreditRequest,
            AdjustRequest,
            RejectWithdrawalRequest,
            MarkPaidRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "System", description = "Health"),
        (name = "Bookings", description = "Booking lifecycle"),
        (name = "Ranking", description = "Expert ranking scores"),
        (name = "Wallet", description = "Expert wallet and withdrawals"),
        (name = "Admin", description = "Ledger corrections and withdrawal review"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_generates() {
        let doc = ApiDoc::openapi();
        assert_eq!(doc.info.title, "Cunslt Core API");
        assert_eq!(doc.info.version, "1.0.0");
    }

    #[test]
    fn test_openapi_json_serializable() {
        let json = ApiDoc::openapi().to_json().unwrap();
        assert!(json.contains("Cunslt Core API"));
    }

    #[test]
    fn test_endpoints_registered() {
        let paths = ApiDoc::openapi().paths;
        for path in [
            "/api/v1/health",
            "/api/v1/bookings",
            "/api/v1/bookings/{id}/complete",
            "/api/v1/experts/{id}/ranking",
            "/api/v1/wallet/withdrawals",
            "/api/v1/admin/withdrawals/{id}/paid",
        ] {
            assert!(paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_security_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("should have components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
