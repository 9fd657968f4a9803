//! Booking orchestrator: composes the slot ledger, pricing calculator and
//! status state machine inside one database transaction per operation.

use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel_async::{pooled_connection::bb8::Pool, AsyncConnection, AsyncPgConnection, RunQueryDsl};
use shared::{generate_booking_id, BookingStatus};
use tracing::info;
use uuid::Uuid;

use crate::error::BookingError;
use crate::models::*;
use crate::pricing;
use crate::schema::*;
use crate::slots;

pub type DbPool = Pool<AsyncPgConnection>;

/// Validated input for booking creation.
#[derive(Debug, Clone)]
pub struct CreateBookingCommand {
    pub service_id: Uuid,
    pub slot_id: Uuid,
    pub quantity: i32,
    pub pricing_tier_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub special_requests: String,
}

#[derive(Debug, Clone, Default)]
pub struct BookingListFilter {
    pub status: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::bookings)]
struct BookingStatusChange {
    status: String,
    cancellation_reason: Option<String>,
    updated_at: chrono::DateTime<Utc>,
}

pub struct BookingManager {
    pool: DbPool,
}

impl BookingManager {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a booking as one atomic unit: reserve the slot under a row
    /// lock, price the request, insert the booking with its initial history
    /// entry and queue the confirmation notification. Any failure rolls the
    /// whole transaction back, including the capacity increment.
    pub async fn create_booking(&self, cmd: CreateBookingCommand) -> Result<Booking, BookingError> {
        let mut conn = self.pool.get().await?;

        let booking = conn
            .transaction::<Booking, BookingError, _>(|conn| {
                Box::pin(async move {
                    let service = vendor_services::table
                        .find(cmd.service_id)
                        .filter(vendor_services::is_active.eq(true))
                        .first::<VendorService>(conn)
                        .await
                        .optional()?
                        .ok_or(BookingError::ServiceNotFound)?;

                    let slot = slots::reserve(conn, cmd.slot_id).await?;
                    if slot.service_id != service.id {
                        return Err(BookingError::Validation(
                            "Slot does not belong to the requested service".to_string(),
                        ));
                    }

                    let tiers = pricing_tiers::table
                        .filter(pricing_tiers::service_id.eq(service.id))
                        .load::<PricingTier>(conn)
                        .await?;
                    let price = pricing::calculate_total_price(
                        &service,
                        &tiers,
                        cmd.quantity,
                        cmd.pricing_tier_id,
                    )?;

                    let new_booking = NewBooking {
                        id: Uuid::new_v4(),
                        booking_id: generate_booking_id(Utc::now()),
                        vendor_id: service.vendor_id,
                        service_id: service.id,
                        slot_id: slot.id,
                        customer_name: cmd.customer_name,
                        customer_email: cmd.customer_email,
                        customer_phone: cmd.customer_phone,
                        booking_date: slot.date,
                        start_time: slot.start_time,
                        end_time: slot.end_time,
                        quantity: cmd.quantity,
                        base_price: price.base_price,
                        tax_amount: price.tax_amount,
                        platform_fee: price.platform_fee,
                        total_amount: price.total_amount,
                        status: BookingStatus::Pending.to_string(),
                        special_requests: cmd.special_requests,
                        cancellation_reason: String::new(),
                    };

                    let booking = diesel::insert_into(bookings::table)
                        .values(&new_booking)
                        .get_result::<Booking>(conn)
                        .await?;

                    let initial_entry = NewBookingHistoryEntry {
                        id: Uuid::new_v4(),
                        booking_id: booking.id,
                        status: BookingStatus::Pending.to_string(),
                        notes: "Booking created".to_string(),
                        created_by: None,
                    };
                    diesel::insert_into(booking_history::table)
                        .values(&initial_entry)
                        .execute(conn)
                        .await?;

                    // Queued in the same transaction, delivered after commit
                    // by the outbox processor.
                    let notification = NewOutboxNotification {
                        id: Uuid::new_v4(),
                        booking_id: booking.id,
                        recipient: booking.customer_email.clone(),
                        payload: serde_json::json!({
                            "booking_id": booking.booking_id,
                            "customer_name": booking.customer_name,
                            "booking_date": booking.booking_date,
                            "total_amount": booking.total_amount.to_string(),
                        }),
                    };
                    diesel::insert_into(notification_outbox::table)
                        .values(&notification)
                        .execute(conn)
                        .await?;

                    Ok(booking)
                })
            })
            .await?;

        info!(
            "Created booking {} on slot {} for {}",
            booking.booking_id, booking.slot_id, booking.total_amount
        );
        Ok(booking)
    }

    /// Transition a vendor's booking to `new_status`.
    ///
    /// Enforces the status graph; an illegal transition fails validation and
    /// a transition to the current status is an idempotent no-op. Entering
    /// `cancelled` or `refunded` releases the slot capacity in the same
    /// transaction.
    pub async fn update_status(
        &self,
        vendor_id: Uuid,
        booking_pk: Uuid,
        new_status: BookingStatus,
        notes: Option<String>,
    ) -> Result<Booking, BookingError> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<Booking, BookingError, _>(|conn| {
            Box::pin(async move {
                let booking = bookings::table
                    .find(booking_pk)
                    .filter(bookings::vendor_id.eq(vendor_id))
                    .for_update()
                    .first::<Booking>(conn)
                    .await
                    .optional()?
                    .ok_or(BookingError::BookingNotFound)?;

                let current: BookingStatus = booking.status.parse()?;
                if current == new_status {
                    return Ok(booking);
                }
                if !current.can_transition_to(new_status) {
                    return Err(BookingError::Validation(format!(
                        "Cannot transition booking from {current} to {new_status}"
                    )));
                }

                let change = BookingStatusChange {
                    status: new_status.to_string(),
                    cancellation_reason: match new_status {
                        BookingStatus::Cancelled => notes.clone(),
                        _ => None,
                    },
                    updated_at: Utc::now(),
                };
                let updated = diesel::update(bookings::table.find(booking.id))
                    .set(&change)
                    .get_result::<Booking>(conn)
                    .await?;

                let entry = NewBookingHistoryEntry {
                    id: Uuid::new_v4(),
                    booking_id: booking.id,
                    status: new_status.to_string(),
                    notes: notes.unwrap_or_default(),
                    created_by: Some(vendor_id),
                };
                diesel::insert_into(booking_history::table)
                    .values(&entry)
                    .execute(conn)
                    .await?;

                if new_status.releases_capacity() {
                    slots::release(conn, booking.slot_id).await?;
                }

                info!(
                    "Booking {} transitioned {} -> {}",
                    updated.booking_id, current, new_status
                );
                Ok(updated)
            })
        })
        .await
    }

    pub async fn list_for_vendor(
        &self,
        vendor_id: Uuid,
        filter: BookingListFilter,
    ) -> Result<Vec<Booking>, BookingError> {
        let mut conn = self.pool.get().await?;

        let mut query = bookings::table
            .filter(bookings::vendor_id.eq(vendor_id))
            .order(bookings::created_at.desc())
            .into_boxed();

        if let Some(status) = filter.status {
            // Reject unknown statuses instead of silently matching nothing.
            let status: BookingStatus = status.parse()?;
            query = query.filter(bookings::status.eq(status.to_string()));
        }
        if let Some(from) = filter.date_from {
            query = query.filter(bookings::booking_date.ge(from));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(bookings::booking_date.le(to));
        }

        Ok(query.load::<Booking>(&mut conn).await?)
    }

    /// Booking plus its audit trail, newest entry first.
    pub async fn get_for_vendor(
        &self,
        vendor_id: Uuid,
        booking_pk: Uuid,
    ) -> Result<(Booking, Vec<BookingHistoryEntry>), BookingError> {
        let mut conn = self.pool.get().await?;

        let booking = bookings::table
            .find(booking_pk)
            .filter(bookings::vendor_id.eq(vendor_id))
            .first::<Booking>(&mut conn)
            .await
            .optional()?
            .ok_or(BookingError::BookingNotFound)?;

        let history = booking_history::table
            .filter(booking_history::booking_id.eq(booking.id))
            .order(booking_history::created_at.desc())
            .load::<BookingHistoryEntry>(&mut conn)
            .await?;

        Ok((booking, history))
    }
}
