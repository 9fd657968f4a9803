use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BookingError;

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = crate::schema::vendors)]
pub struct Vendor {
    pub id: Uuid,
    pub vendor_id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub company_name: String,
    pub description: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
    pub phone: String,
    pub website: String,
    pub status: String,
    pub rating: f64,
    pub total_reviews: i32,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::vendors)]
pub struct NewVendor {
    pub id: Uuid,
    pub vendor_id: String,
    pub email: String,
    pub password_hash: String,
    pub company_name: String,
    pub description: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
    pub phone: String,
    pub website: String,
    pub status: String,
}

/// Partial profile update; `None` fields are left untouched.
#[derive(Debug, Clone, AsChangeset, Deserialize)]
#[diesel(table_name = crate::schema::vendors)]
pub struct VendorProfileUpdate {
    pub company_name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub zip_code: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
}

/// Service categories are seed data managed out of band; services may only
/// reference active ones.
#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = crate::schema::vendor_service_categories)]
pub struct ServiceCategory {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::vendor_service_categories)]
pub struct NewServiceCategory {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = crate::schema::vendor_services)]
pub struct VendorService {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: String,
    pub base_price: BigDecimal,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::vendor_services)]
pub struct NewVendorService {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: String,
    pub base_price: BigDecimal,
    pub is_active: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = crate::schema::pricing_tiers)]
pub struct PricingTier {
    pub id: Uuid,
    pub service_id: Uuid,
    pub tier_name: String,
    pub description: String,
    pub price: BigDecimal,
    pub min_quantity: i32,
    pub max_quantity: Option<i32>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = crate::schema::availability_slots)]
pub struct AvailabilitySlot {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub service_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
    pub max_capacity: i32,
    pub booked_capacity: i32,
}

impl AvailabilitySlot {
    pub fn is_fully_booked(&self) -> bool {
        !self.is_available || self.booked_capacity >= self.max_capacity
    }

    /// The check half of the reserve check-and-increment. Caller must hold
    /// the row lock; check order is availability before capacity.
    pub fn check_reservable(&self) -> Result<(), BookingError> {
        if !self.is_available {
            return Err(BookingError::SlotUnavailable);
        }
        if self.booked_capacity >= self.max_capacity {
            return Err(BookingError::SlotFullyBooked);
        }
        Ok(())
    }

    /// Claim one unit of capacity, failing if none is left.
    pub fn apply_reservation(&mut self) -> Result<(), BookingError> {
        self.check_reservable()?;
        self.booked_capacity += 1;
        Ok(())
    }

    /// Hand one unit of capacity back, floored at zero so a duplicate
    /// release can never go negative.
    pub fn apply_release(&mut self) {
        self.booked_capacity = (self.booked_capacity - 1).max(0);
    }

    /// Whether this slot's time window intersects `[start, end)`. Windows
    /// that merely touch do not overlap.
    pub fn overlaps_window(&self, start: NaiveTime, end: NaiveTime) -> bool {
        self.start_time < end && self.end_time > start
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::availability_slots)]
pub struct NewAvailabilitySlot {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub service_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
    pub max_capacity: i32,
    pub booked_capacity: i32,
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = crate::schema::bookings)]
pub struct Booking {
    pub id: Uuid,
    pub booking_id: String,
    pub vendor_id: Uuid,
    pub service_id: Uuid,
    pub slot_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub quantity: i32,
    pub base_price: BigDecimal,
    pub tax_amount: BigDecimal,
    pub platform_fee: BigDecimal,
    pub total_amount: BigDecimal,
    pub status: String,
    pub special_requests: String,
    pub cancellation_reason: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::bookings)]
pub struct NewBooking {
    pub id: Uuid,
    pub booking_id: String,
    pub vendor_id: Uuid,
    pub service_id: Uuid,
    pub slot_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub quantity: i32,
    pub base_price: BigDecimal,
    pub tax_amount: BigDecimal,
    pub platform_fee: BigDecimal,
    pub total_amount: BigDecimal,
    pub status: String,
    pub special_requests: String,
    pub cancellation_reason: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = crate::schema::booking_history)]
pub struct BookingHistoryEntry {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub status: String,
    pub notes: String,
    pub created_by: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::booking_history)]
pub struct NewBookingHistoryEntry {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub status: String,
    pub notes: String,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = crate::schema::notification_outbox)]
pub struct OutboxNotification {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub recipient: String,
    pub payload: serde_json::Value,
    pub processed: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::notification_outbox)]
pub struct NewOutboxNotification {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub recipient: String,
    pub payload: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(is_available: bool, max_capacity: i32, booked_capacity: i32) -> AvailabilitySlot {
        AvailabilitySlot {
            id: Uuid::new_v4(),
            vendor_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            is_available,
            max_capacity,
            booked_capacity,
        }
    }

    #[test]
    fn fully_booked_predicate() {
        assert!(!slot(true, 2, 1).is_fully_booked());
        assert!(slot(true, 2, 2).is_fully_booked());
        // Manual disable wins regardless of remaining capacity.
        assert!(slot(false, 2, 0).is_fully_booked());
    }

    #[test]
    fn reservation_consumes_capacity_up_to_max() {
        let mut s = slot(true, 2, 0);
        s.apply_reservation().unwrap();
        s.apply_reservation().unwrap();
        assert_eq!(s.booked_capacity, 2);
        assert!(matches!(
            s.apply_reservation(),
            Err(BookingError::SlotFullyBooked)
        ));
        assert_eq!(s.booked_capacity, 2);
    }

    #[test]
    fn disabled_slot_rejected_before_capacity_check() {
        let mut s = slot(false, 1, 1);
        assert!(matches!(
            s.apply_reservation(),
            Err(BookingError::SlotUnavailable)
        ));
    }

    #[test]
    fn overlap_covers_partial_and_containing_windows() {
        let s = slot(true, 1, 0); // 09:00-10:00
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();

        assert!(s.overlaps_window(t(9, 30), t(10, 30)));
        assert!(s.overlaps_window(t(8, 30), t(9, 30)));
        assert!(s.overlaps_window(t(8, 0), t(11, 0)));
        assert!(s.overlaps_window(t(9, 15), t(9, 45)));
    }

    #[test]
    fn adjacent_windows_do_not_overlap() {
        let s = slot(true, 1, 0); // 09:00-10:00
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();

        assert!(!s.overlaps_window(t(10, 0), t(11, 0)));
        assert!(!s.overlaps_window(t(8, 0), t(9, 0)));
        assert!(!s.overlaps_window(t(11, 0), t(12, 0)));
    }

    #[test]
    fn release_floors_at_zero() {
        let mut s = slot(true, 3, 1);
        s.apply_release();
        assert_eq!(s.booked_capacity, 0);
        s.apply_release();
        assert_eq!(s.booked_capacity, 0);
    }
}
