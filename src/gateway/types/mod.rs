//! Gateway types module
//!
//! ## Input Types
//! - [`MoneyAmount`]: Format-validated decimal for API input
//! - [`ValidJson`]: JSON extractor that runs `validator` checks
//!
//! ## Output Types
//! - [`ApiResponse<T>`]: Unified API response wrapper
//! - [`ApiError`] / [`ApiResult`]: handler error and result types

pub mod error;
pub mod money;
pub mod requests;
pub mod response;

pub use error::{ApiError, ApiResult, created, ok};
pub use money::MoneyAmount;
pub use requests::{
    AdjustRequest, CancelBookingRequest, CreateBookingRequest, CreditRequest, LimitQuery,
    MarkPaidRequest, RejectWithdrawalRequest, ReviewRequest, ValidJson, WithdrawalBody,
};
pub use response::{ApiResponse, error_codes};
