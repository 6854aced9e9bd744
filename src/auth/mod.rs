//! Actor identity collaborator
//!
//! - [`models`]: `Actor`, `Role`, token `Claims`
//! - [`token`]: verification of provider-issued bearer tokens
//! - [`middleware`]: axum middleware that injects the `Actor` extension

pub mod middleware;
pub mod models;
pub mod token;

pub use middleware::actor_auth_middleware;
pub use models::{Actor, Claims, Role};
pub use token::TokenVerifier;
