//! Booking Lifecycle
//!
//! # State Machine
//!
//! ```text
//! PENDING ──confirm──▶ CONFIRMED ──start──▶ IN_PROGRESS ──complete──▶ COMPLETED
//!    │                     │
//!    └───────cancel────────┴──────────────▶ CANCELED
//! ```
//!
//! # Safety Invariants
//!
//! 1. **CAS transitions**: status only changes from the expected prior status
//! 2. **Atomic completion**: status change and ledger credit commit together
//! 3. **Notify after commit**: no notification for a change that rolled back

pub mod service;
pub mod state;
pub mod types;

pub use service::{BookingService, NewBooking};
pub use state::BookingStatus;
pub use types::{Booking, Review, Transition};
