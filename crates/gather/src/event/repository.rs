//! Event repository for database operations.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, instrument};

use super::models::{haversine_m, Attendee, Event, EventListQuery, EventRow, EventStatus};

const EVENT_COLUMNS: &str = "id, creator_id, title, description, emoji, kind, price_cents, \
     attendance, attendees, starts_at, date, time, timezone, tags, visibility, status, \
     location, created_at, updated_at";

/// Outcome of a join attempt against an existing event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    AlreadyJoined,
}

/// Repository for event database operations.
///
/// Attendees, tags, and the location object are embedded JSON; the country,
/// admin1, and city-key parts of the location are mirrored into plain
/// columns so listings can filter on them.
#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: SqlitePool,
}

impl EventRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, event), fields(id = %event.id))]
    pub async fn insert(&self, event: &Event) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO events ({EVENT_COLUMNS}, country_code, admin1, city_key) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&event.id)
        .bind(&event.creator_id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.emoji)
        .bind(event.kind.to_string())
        .bind(event.price_cents)
        .bind(event.attendance)
        .bind(serde_json::to_string(&event.attendees).context("serializing attendees")?)
        .bind(&event.starts_at)
        .bind(&event.date)
        .bind(&event.time)
        .bind(&event.timezone)
        .bind(serde_json::to_string(&event.tags).context("serializing tags")?)
        .bind(event.visibility.to_string())
        .bind(event.status.to_string())
        .bind(serde_json::to_string(&event.location).context("serializing location")?)
        .bind(&event.created_at)
        .bind(&event.updated_at)
        .bind(&event.location.country_code)
        .bind(&event.location.admin1)
        .bind(&event.location.city_key)
        .execute(&self.pool)
        .await
        .context("inserting event")?;

        debug!("Inserted event {}", event.id);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("fetching event")?;

        Ok(row.map(Event::from))
    }

    /// Persist the full event row. Used after an in-memory patch.
    #[instrument(skip(self, event), fields(id = %event.id))]
    pub async fn update(&self, event: &Event) -> Result<()> {
        sqlx::query(
            "UPDATE events SET title = ?, description = ?, emoji = ?, kind = ?, \
             price_cents = ?, attendance = ?, attendees = ?, starts_at = ?, date = ?, \
             time = ?, timezone = ?, tags = ?, visibility = ?, status = ?, location = ?, \
             country_code = ?, admin1 = ?, city_key = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.emoji)
        .bind(event.kind.to_string())
        .bind(event.price_cents)
        .bind(event.attendance)
        .bind(serde_json::to_string(&event.attendees).context("serializing attendees")?)
        .bind(&event.starts_at)
        .bind(&event.date)
        .bind(&event.time)
        .bind(&event.timezone)
        .bind(serde_json::to_string(&event.tags).context("serializing tags")?)
        .bind(event.visibility.to_string())
        .bind(event.status.to_string())
        .bind(serde_json::to_string(&event.location).context("serializing location")?)
        .bind(&event.location.country_code)
        .bind(&event.location.admin1)
        .bind(&event.location.city_key)
        .bind(&event.updated_at)
        .bind(&event.id)
        .execute(&self.pool)
        .await
        .context("updating event")?;

        Ok(())
    }

    /// Delete an event, creator-scoped. Returns false when nothing matched.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str, creator_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = ? AND creator_id = ?")
            .bind(id)
            .bind(creator_id)
            .execute(&self.pool)
            .await
            .context("deleting event")?;

        Ok(result.rows_affected() > 0)
    }

    /// List events with optional filters, newest first.
    ///
    /// The proximity filter is applied after the page is fetched, so a
    /// near-filtered response may return fewer than `limit` events.
    #[instrument(skip(self))]
    pub async fn list(&self, query: &EventListQuery) -> Result<Vec<Event>> {
        let mut sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE 1=1");
        let mut bind_values: Vec<String> = Vec::new();

        if let Some(country) = query.country.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            sql.push_str(" AND country_code = ?");
            bind_values.push(country.to_uppercase());
        }
        if let Some(admin1) = query.admin1.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            sql.push_str(" AND admin1 = ?");
            bind_values.push(admin1.to_string());
        }
        if let Some(city_key) = query.city_key_filter() {
            sql.push_str(" AND city_key = ?");
            bind_values.push(city_key);
        }
        if let Some(kind) = query.kind {
            sql.push_str(" AND kind = ?");
            bind_values.push(kind.to_string());
        }
        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(status.to_string());
        }
        if let Some(visibility) = query.visibility {
            sql.push_str(" AND visibility = ?");
            bind_values.push(visibility.to_string());
        }

        sql.push_str(" ORDER BY created_at DESC LIMIT ?");

        let mut query_builder = sqlx::query_as::<_, EventRow>(&sql);
        for value in &bind_values {
            query_builder = query_builder.bind(value);
        }
        query_builder = query_builder.bind(query.effective_limit());

        let rows = query_builder
            .fetch_all(&self.pool)
            .await
            .context("listing events")?;

        let mut events: Vec<Event> = rows.into_iter().map(Event::from).collect();

        if let (Some(lat), Some(lng)) = (query.near_lat, query.near_lng) {
            let radius = query.radius_m.unwrap_or(f64::MAX);
            events.retain(|e| {
                haversine_m(lat, lng, e.location.lat, e.location.lng) <= radius
            });
        }

        Ok(events)
    }

    /// Events created by a user, newest first.
    #[instrument(skip(self))]
    pub async fn created_by(&self, creator_id: &str, limit: i64) -> Result<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE creator_id = ? \
             ORDER BY created_at DESC LIMIT ?"
        ))
        .bind(creator_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("listing created events")?;

        Ok(rows.into_iter().map(Event::from).collect())
    }

    /// Events whose attendee list contains the user, soonest first.
    #[instrument(skip(self))]
    pub async fn going(&self, user_id: &str, limit: i64) -> Result<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE EXISTS (\
                SELECT 1 FROM json_each(events.attendees) \
                WHERE json_extract(json_each.value, '$.userId') = ?\
             ) ORDER BY (starts_at IS NULL), starts_at, date, time LIMIT ?"
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("listing joined events")?;

        Ok(rows.into_iter().map(Event::from).collect())
    }

    /// Append an attendee unless the user already joined.
    ///
    /// Returns None when the event does not exist. Read-modify-write on the
    /// attendee list; concurrent joins for the same user race with
    /// last-write-wins, accepted for this low-contention path.
    #[instrument(skip(self, attendee), fields(user_id = %attendee.user_id))]
    pub async fn join(&self, event_id: &str, attendee: Attendee) -> Result<Option<JoinOutcome>> {
        let Some(mut event) = self.get(event_id).await? else {
            return Ok(None);
        };

        if event.is_attendee(&attendee.user_id) {
            return Ok(Some(JoinOutcome::AlreadyJoined));
        }

        event.attendees.push(attendee);
        event.updated_at = Utc::now().to_rfc3339();
        self.update(&event).await?;

        Ok(Some(JoinOutcome::Joined))
    }

    /// Set an event's status and return the updated record.
    #[instrument(skip(self))]
    pub async fn set_status(&self, id: &str, status: EventStatus) -> Result<Option<Event>> {
        let result = sqlx::query("UPDATE events SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await
            .context("updating event status")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id).await
    }
}
