//! Booking FSM State Definitions
//!
//! State IDs are stored in PostgreSQL as SMALLINT.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Booking lifecycle states
///
/// ```text
/// PENDING → CONFIRMED → IN_PROGRESS → COMPLETED
///    ↓          ↓
///    └──────────┴────→ CANCELED
/// ```
///
/// Terminal states: COMPLETED (40), CANCELED (-10)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum BookingStatus {
    /// Requested by the client, awaiting the expert
    Pending = 0,

    /// Accepted by the expert
    Confirmed = 10,

    /// Session running
    InProgress = 20,

    /// Terminal: session delivered
    Completed = 40,

    /// Terminal: called off before the session started
    Canceled = -10,
}

impl BookingStatus {
    /// Check if this is a terminal state (no more transitions possible)
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Canceled)
    }

    /// Check if the booking may still be canceled
    #[inline]
    pub fn is_cancelable(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    /// The only edges of the lifecycle
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (*self, next),
            (Pending, Confirmed)
                | (Pending, Canceled)
                | (Confirmed, InProgress)
                | (Confirmed, Canceled)
                | (InProgress, Completed)
        )
    }

    /// Get the numeric state ID for PostgreSQL storage
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    /// Convert from PostgreSQL state ID
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(BookingStatus::Pending),
            10 => Some(BookingStatus::Confirmed),
            20 => Some(BookingStatus::InProgress),
            40 => Some(BookingStatus::Completed),
            -10 => Some(BookingStatus::Canceled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<i16> for BookingStatus {
    type Error = ();

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        BookingStatus::from_id(value).ok_or(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [BookingStatus; 5] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::InProgress,
        BookingStatus::Completed,
        BookingStatus::Canceled,
    ];

    #[test]
    fn test_terminal_states() {
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Canceled.is_terminal());

        assert!(!BookingStatus::Pending.is_terminal());
        assert!(!BookingStatus::Confirmed.is_terminal());
        assert!(!BookingStatus::InProgress.is_terminal());
    }

    #[test]
    fn test_transition_table() {
        use BookingStatus::*;
        let allowed = [
            (Pending, Confirmed),
            (Pending, Canceled),
            (Confirmed, InProgress),
            (Confirmed, Canceled),
            (InProgress, Completed),
        ];

        for from in ALL {
            for to in ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_in_progress_only_from_confirmed() {
        for from in ALL {
            if from.can_transition_to(BookingStatus::InProgress) {
                assert_eq!(from, BookingStatus::Confirmed);
            }
        }
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for from in ALL.iter().filter(|s| s.is_terminal()) {
            assert!(ALL.iter().all(|to| !from.can_transition_to(*to)));
        }
    }

    #[test]
    fn test_invalid_state_id() {
        assert!(BookingStatus::from_id(30).is_none());
        assert!(BookingStatus::from_id(-999).is_none());
        assert_eq!(BookingStatus::from_id(20), Some(BookingStatus::InProgress));
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&BookingStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        assert_eq!(BookingStatus::Canceled.to_string(), "canceled");
    }
}
