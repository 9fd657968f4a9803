use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raised when a status string is outside the enumerated set.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid booking status: {0}")]
pub struct InvalidStatus(pub String);

/// Lifecycle of a booking. Stored as lowercase snake_case strings.
///
/// The transition graph is enforced: `cancelled` and `refunded` are terminal,
/// and `completed` only admits `refunded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    Refunded,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Refunded => "refunded",
        }
    }

    /// Whether moving from `self` to `next` is a legal transition.
    ///
    /// A transition to the current status is allowed and treated as a no-op
    /// by callers, which keeps cancellation idempotent.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        if *self == next {
            return true;
        }
        matches!(
            (*self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, InProgress)
                | (Confirmed, Cancelled)
                | (Confirmed, Refunded)
                | (InProgress, Completed)
                | (Completed, Refunded)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::Refunded)
    }

    /// Statuses that hand the reserved slot capacity back.
    pub fn releases_capacity(&self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::Refunded)
    }
}

impl FromStr for BookingStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "in_progress" => Ok(BookingStatus::InProgress),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "refunded" => Ok(BookingStatus::Refunded),
            other => Err(InvalidStatus(other.to_string())),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vendor account lifecycle. Only `approved` vendors may log in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorStatus {
    Pending,
    Approved,
    Suspended,
    Rejected,
}

impl VendorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VendorStatus::Pending => "pending",
            VendorStatus::Approved => "approved",
            VendorStatus::Suspended => "suspended",
            VendorStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for VendorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Itemized price for a booking. Every field is a money amount rounded to
/// two decimal places; totals are computed at full precision before rounding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub base_price: BigDecimal,
    pub subtotal: BigDecimal,
    pub platform_fee: BigDecimal,
    pub tax_amount: BigDecimal,
    pub total_amount: BigDecimal,
}

/// External booking identifier, e.g. `B1699887123`.
pub fn generate_booking_id(now: DateTime<Utc>) -> String {
    format!("B{:010}", now.timestamp_micros().unsigned_abs() % 10_000_000_000)
}

/// External vendor identifier, e.g. `V99887123`.
pub fn generate_vendor_id(now: DateTime<Utc>) -> String {
    format!("V{:08}", now.timestamp_micros().unsigned_abs() % 100_000_000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::InProgress,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
            BookingStatus::Refunded,
        ] {
            assert_eq!(status.as_str().parse::<BookingStatus>().unwrap(), status);
        }
        assert!("shipped".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn happy_path_transitions_are_legal() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(Completed.can_transition_to(Refunded));
    }

    #[test]
    fn cancellation_branches() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Refunded));
        assert!(!InProgress.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Cancelled));
    }

    #[test]
    fn terminal_states_admit_nothing_new() {
        use BookingStatus::*;
        for next in [Pending, Confirmed, InProgress, Completed] {
            assert!(!Cancelled.can_transition_to(next));
            assert!(!Refunded.can_transition_to(next));
        }
        assert!(!Cancelled.can_transition_to(Refunded));
        assert!(!Refunded.can_transition_to(Cancelled));
        // Completed is terminal except for the refund edge.
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(InProgress));
    }

    #[test]
    fn same_status_transition_is_allowed_for_idempotency() {
        use BookingStatus::*;
        assert!(Cancelled.can_transition_to(Cancelled));
        assert!(Pending.can_transition_to(Pending));
    }

    #[test]
    fn skipping_a_stage_is_rejected() {
        use BookingStatus::*;
        assert!(!Pending.can_transition_to(InProgress));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Confirmed.can_transition_to(Completed));
    }

    #[test]
    fn capacity_release_only_on_cancel_or_refund() {
        use BookingStatus::*;
        assert!(Cancelled.releases_capacity());
        assert!(Refunded.releases_capacity());
        assert!(!Completed.releases_capacity());
        assert!(!Pending.releases_capacity());
    }

    #[test]
    fn generated_ids_have_stable_shape() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let booking_id = generate_booking_id(now);
        assert!(booking_id.starts_with('B'));
        assert_eq!(booking_id.len(), 11);
        let vendor_id = generate_vendor_id(now);
        assert!(vendor_id.starts_with('V'));
        assert_eq!(vendor_id.len(), 9);
    }
}
