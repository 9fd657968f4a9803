//! Notification outbox: confirmation rows are written inside the booking
//! transaction and drained here after commit, so delivery can never block or
//! roll back a booking.

use anyhow::Result;
use diesel::prelude::*;
use diesel_async::{pooled_connection::bb8::Pool, AsyncPgConnection, RunQueryDsl};
use std::time::Duration;
use tokio::time;
use tracing::{error, info};

use crate::models::OutboxNotification;
use crate::schema::notification_outbox;

type DbPool = Pool<AsyncPgConnection>;

pub struct NotificationProcessor {
    pool: DbPool,
}

impl NotificationProcessor {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn run(&self) {
        let mut interval = time::interval(Duration::from_secs(5));

        loop {
            interval.tick().await;

            if let Err(e) = self.process_pending().await {
                error!("Error processing notification outbox: {}", e);
            }
        }
    }

    async fn process_pending(&self) -> Result<()> {
        let mut conn = self.pool.get().await?;

        let pending = notification_outbox::table
            .filter(notification_outbox::processed.eq(false))
            .order(notification_outbox::created_at.asc())
            .limit(100)
            .load::<OutboxNotification>(&mut conn)
            .await?;

        for notification in pending {
            if let Err(e) = self.deliver(&notification).await {
                // Delivery failures are logged and retried next tick; they
                // never touch the booking itself.
                error!(
                    "Failed to deliver notification {}: {}",
                    notification.id, e
                );
                continue;
            }

            diesel::update(
                notification_outbox::table.filter(notification_outbox::id.eq(notification.id)),
            )
            .set(notification_outbox::processed.eq(true))
            .execute(&mut conn)
            .await?;
        }

        Ok(())
    }

    /// Stubbed delivery; a real deployment would hand off to an email
    /// provider here.
    async fn deliver(&self, notification: &OutboxNotification) -> Result<()> {
        info!(
            "Sending booking confirmation to {}: {}",
            notification.recipient, notification.payload
        );
        Ok(())
    }
}
