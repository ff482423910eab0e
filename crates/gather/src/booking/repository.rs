//! Booking repository for database operations.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::instrument;

use super::models::Booking;

/// Upper bound on bookings returned for one event.
pub const BOOKINGS_MAX: i64 = 2000;

/// Repository for service bookings.
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: SqlitePool,
}

impl BookingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Bookings for one event, ordered by booked time.
    #[instrument(skip(self))]
    pub async fn list_for_event(&self, event_id: &str) -> Result<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            "SELECT id, event_id, when_iso, customer_id, customer_name, customer_email, notes, created_at \
             FROM bookings WHERE event_id = ? ORDER BY when_iso ASC LIMIT ?",
        )
        .bind(event_id)
        .bind(BOOKINGS_MAX)
        .fetch_all(&self.pool)
        .await
        .context("listing bookings")?;

        Ok(bookings)
    }

    /// Record a booking. The booking/payment collaborator calls this after
    /// its own flow completes.
    #[instrument(skip(self, booking), fields(event_id = %booking.event_id))]
    pub async fn insert(&self, booking: &Booking) -> Result<()> {
        sqlx::query(
            "INSERT INTO bookings (id, event_id, when_iso, customer_id, customer_name, customer_email, notes, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&booking.id)
        .bind(&booking.event_id)
        .bind(&booking.when_iso)
        .bind(&booking.customer_id)
        .bind(&booking.customer_name)
        .bind(&booking.customer_email)
        .bind(&booking.notes)
        .bind(&booking.created_at)
        .execute(&self.pool)
        .await
        .context("inserting booking")?;

        Ok(())
    }

    /// Build a booking with a generated id and creation stamp.
    pub fn new_booking(
        event_id: &str,
        when_iso: &str,
        customer_id: &str,
        customer_name: &str,
        customer_email: &str,
        notes: &str,
    ) -> Booking {
        Booking {
            id: format!("bkg-{}", nanoid::nanoid!(12)),
            event_id: event_id.to_string(),
            when_iso: when_iso.to_string(),
            customer_id: customer_id.to_string(),
            customer_name: customer_name.to_string(),
            customer_email: customer_email.to_string(),
            notes: notes.to_string(),
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();

        sqlx::query(
            r#"
            CREATE TABLE bookings (
                id TEXT PRIMARY KEY NOT NULL,
                event_id TEXT NOT NULL,
                when_iso TEXT NOT NULL DEFAULT '',
                customer_id TEXT NOT NULL DEFAULT '',
                customer_name TEXT NOT NULL DEFAULT '',
                customer_email TEXT NOT NULL DEFAULT '',
                notes TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();

        pool
    }

    #[tokio::test]
    async fn test_list_orders_by_time() {
        let repo = BookingRepository::new(setup_test_db().await);

        let late = BookingRepository::new_booking(
            "evt-1",
            "2026-09-02T10:00:00Z",
            "user-2",
            "Joe",
            "joe@example.com",
            "",
        );
        let early = BookingRepository::new_booking(
            "evt-1",
            "2026-09-01T10:00:00Z",
            "user-3",
            "Ann",
            "ann@example.com",
            "bring towels",
        );
        let other = BookingRepository::new_booking(
            "evt-9",
            "2026-09-01T08:00:00Z",
            "user-4",
            "Kim",
            "kim@example.com",
            "",
        );
        repo.insert(&late).await.unwrap();
        repo.insert(&early).await.unwrap();
        repo.insert(&other).await.unwrap();

        let bookings = repo.list_for_event("evt-1").await.unwrap();
        assert_eq!(bookings.len(), 2);
        assert_eq!(bookings[0].customer_name, "Ann");
        assert_eq!(bookings[1].customer_name, "Joe");
    }
}
