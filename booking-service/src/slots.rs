//! Slot ledger: the only writer of `booked_capacity`.
//!
//! Both operations take the caller's connection so the row lock is scoped to
//! the enclosing transaction and the capacity change commits or rolls back
//! with the rest of the booking.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::error::BookingError;
use crate::models::AvailabilitySlot;
use crate::schema::availability_slots;

/// Claim one unit of capacity on `slot_id`.
///
/// `SELECT ... FOR UPDATE` serializes concurrent reservations on the same
/// slot: the check and the increment happen under one row lock, so two
/// callers can never both take the last unit. Returns the slot so the caller
/// can stamp the booking with its date and time window.
pub async fn reserve(
    conn: &mut AsyncPgConnection,
    slot_id: Uuid,
) -> Result<AvailabilitySlot, BookingError> {
    let mut slot = availability_slots::table
        .find(slot_id)
        .for_update()
        .first::<AvailabilitySlot>(conn)
        .await
        .optional()?
        .ok_or(BookingError::SlotNotFound)?;

    slot.apply_reservation()?;

    diesel::update(availability_slots::table.find(slot_id))
        .set(availability_slots::booked_capacity.eq(slot.booked_capacity))
        .execute(conn)
        .await?;

    Ok(slot)
}

/// Hand one unit of capacity back, e.g. when a booking is cancelled or
/// refunded. Floored at zero; releasing an empty slot is a no-op.
pub async fn release(conn: &mut AsyncPgConnection, slot_id: Uuid) -> Result<(), BookingError> {
    let mut slot = availability_slots::table
        .find(slot_id)
        .for_update()
        .first::<AvailabilitySlot>(conn)
        .await
        .optional()?
        .ok_or(BookingError::SlotNotFound)?;

    slot.apply_release();

    diesel::update(availability_slots::table.find(slot_id))
        .set(availability_slots::booked_capacity.eq(slot.booked_capacity))
        .execute(conn)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::error::BookingError;
    use crate::models::AvailabilitySlot;
    use chrono::{NaiveDate, NaiveTime};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use uuid::Uuid;

    fn slot(max_capacity: i32) -> AvailabilitySlot {
        AvailabilitySlot {
            id: Uuid::new_v4(),
            vendor_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            is_available: true,
            max_capacity,
            booked_capacity: 0,
        }
    }

    /// The row lock makes check-and-increment a critical section; modelled
    /// here with a mutex, M contenders on N units must yield exactly N
    /// successes and M-N fully-booked failures.
    #[test]
    fn contended_reservations_never_overbook() {
        let max = 5;
        let contenders = 32;
        let ledger = Arc::new(Mutex::new(slot(max)));

        let handles: Vec<_> = (0..contenders)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    let mut slot = ledger.lock().unwrap();
                    let result = slot.apply_reservation();
                    assert!(slot.booked_capacity <= slot.max_capacity);
                    result
                })
            })
            .collect();

        let mut successes = 0;
        let mut fully_booked = 0;
        for handle in handles {
            match handle.join().unwrap() {
                Ok(()) => successes += 1,
                Err(BookingError::SlotFullyBooked) => fully_booked += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(successes, max);
        assert_eq!(fully_booked, contenders - max);
        assert_eq!(ledger.lock().unwrap().booked_capacity, max);
    }
}
