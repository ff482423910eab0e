//! Event data models and payload validation.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use thiserror::Error;

/// Bounds shared by create and update validation.
pub const TITLE_MAX_CHARS: usize = 120;
pub const DESCRIPTION_MAX_CHARS: usize = 2000;
pub const TAG_MAX_CHARS: usize = 40;
pub const CITY_MAX_CHARS: usize = 120;

/// A rejected event payload, with a message naming the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct EventValidationError(pub String);

fn invalid(msg: impl Into<String>) -> EventValidationError {
    EventValidationError(msg.into())
}

/// Event kind.
///
/// Paid and service events carry a price and leave attendance open;
/// free events carry no price and may cap attendance. Older clients sent
/// `event_free`/`event_paid`, accepted here as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    #[default]
    #[serde(alias = "event_free")]
    Free,
    #[serde(alias = "event_paid")]
    Paid,
    Service,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventKind::Free => "free",
            EventKind::Paid => "paid",
            EventKind::Service => "service",
        };
        f.write_str(s)
    }
}

/// Event lifecycle status. `Paused` only applies to service listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Active,
    Paused,
    Cancelled,
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventStatus::Active => "active",
            EventStatus::Paused => "paused",
            EventStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        })
    }
}

/// Where a location payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    #[default]
    UserTyped,
    PlacesAutocomplete,
    ReverseGeocode,
    UserEdit,
    Db,
}

/// Normalize a place name into a filterable slug: lowercased, punctuation
/// stripped, whitespace runs collapsed to single hyphens.
pub fn norm_key(s: &str) -> String {
    let lowered = s.trim().to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut pending_gap = false;
    for c in lowered.chars() {
        if c.is_whitespace() {
            pending_gap = !out.is_empty();
        } else if c.is_alphanumeric() || c == '-' {
            if pending_gap {
                out.push('-');
                pending_gap = false;
            }
            out.push(c);
        }
    }
    out.trim_matches('-').to_string()
}

/// Structured event location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    pub formatted_address: String,
    pub place_id: String,
    pub country_code: String,
    pub country_name: String,
    pub admin1: String,
    pub admin1_code: String,
    pub city: String,
    pub city_key: String,
    pub postal_code: String,
    pub neighborhood: String,
    pub source: LocationSource,
}

impl Location {
    /// Validate and normalize in place: uppercase the country code and
    /// derive `city_key` from the city when absent.
    pub fn normalize(&mut self) -> Result<(), EventValidationError> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return Err(invalid("location.lat/lng must be finite numbers"));
        }
        if self.country_code.chars().count() != 2 {
            return Err(invalid("location.countryCode must be a 2-letter code"));
        }
        self.country_code = self.country_code.to_uppercase();

        let city = self.city.trim();
        if city.is_empty() || city.chars().count() > CITY_MAX_CHARS {
            return Err(invalid("location.city must be 1-120 characters"));
        }
        self.city = city.to_string();

        if self.city_key.trim().is_empty() {
            self.city_key = norm_key(&self.city);
        }
        Ok(())
    }
}

/// A user on an event's attendee list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Attendee {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub image_url: String,
    pub joined_at: String,
}

/// Event entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub creator_id: String,
    pub title: String,
    pub description: String,
    pub emoji: String,
    pub kind: EventKind,
    pub price_cents: Option<i64>,
    /// Attendance cap for free events; `None` means open.
    pub attendance: Option<i64>,
    pub attendees: Vec<Attendee>,
    pub starts_at: Option<String>,
    pub date: String,
    pub time: String,
    pub timezone: String,
    pub tags: Vec<String>,
    pub visibility: Visibility,
    pub status: EventStatus,
    pub location: Location,
    pub created_at: String,
    pub updated_at: String,
}

impl Event {
    /// Best-effort start instant, for upcoming/past splits: `starts_at`
    /// first, then date+time, then the date alone at noon UTC.
    pub fn start_instant(&self) -> Option<DateTime<Utc>> {
        if let Some(raw) = &self.starts_at {
            if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
                return Some(parsed.with_timezone(&Utc));
            }
        }
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()?;
        let time = NaiveTime::parse_from_str(&self.time, "%H:%M")
            .unwrap_or_else(|_| NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        Some(date.and_time(time).and_utc())
    }

    pub fn is_attendee(&self, user_id: &str) -> bool {
        self.attendees.iter().any(|a| a.user_id == user_id)
    }
}

/// Raw database row; attendees, tags, and location are JSON text columns.
#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: String,
    pub creator_id: String,
    pub title: String,
    pub description: String,
    pub emoji: String,
    pub kind: String,
    pub price_cents: Option<i64>,
    pub attendance: Option<i64>,
    pub attendees: String,
    pub starts_at: Option<String>,
    pub date: String,
    pub time: String,
    pub timezone: String,
    pub tags: String,
    pub visibility: String,
    pub status: String,
    pub location: String,
    pub created_at: String,
    pub updated_at: String,
}

fn parse_tagged<T: serde::de::DeserializeOwned + Default>(raw: &str) -> T {
    serde_json::from_value(serde_json::Value::String(raw.to_string())).unwrap_or_default()
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self {
            kind: parse_tagged(&row.kind),
            visibility: parse_tagged(&row.visibility),
            status: parse_tagged(&row.status),
            attendees: serde_json::from_str(&row.attendees).unwrap_or_default(),
            tags: serde_json::from_str(&row.tags).unwrap_or_default(),
            location: serde_json::from_str(&row.location).unwrap_or_default(),
            id: row.id,
            creator_id: row.creator_id,
            title: row.title,
            description: row.description,
            emoji: row.emoji,
            price_cents: row.price_cents,
            attendance: row.attendance,
            starts_at: row.starts_at,
            date: row.date,
            time: row.time,
            timezone: row.timezone,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn check_kind_rules(
    kind: EventKind,
    price_cents: Option<i64>,
    attendance: Option<i64>,
) -> Result<(), EventValidationError> {
    match kind {
        EventKind::Paid | EventKind::Service => {
            if !price_cents.is_some_and(|p| p > 0) {
                return Err(invalid("priceCents must be > 0 for paid/service events"));
            }
            if attendance.is_some() {
                return Err(invalid("attendance must be null for paid/service events"));
            }
        }
        EventKind::Free => {
            if price_cents.is_some() {
                return Err(invalid("priceCents must be null for free events"));
            }
            if attendance.is_some_and(|a| a <= 0) {
                return Err(invalid("attendance must be a positive count or null"));
            }
        }
    }
    Ok(())
}

fn check_date_format(date: &str) -> Result<(), EventValidationError> {
    if !date.is_empty()
        && (date.len() != 10 || NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err())
    {
        return Err(invalid("date must be YYYY-MM-DD"));
    }
    Ok(())
}

fn check_time_format(time: &str) -> Result<(), EventValidationError> {
    if !time.is_empty() && (time.len() != 5 || NaiveTime::parse_from_str(time, "%H:%M").is_err()) {
        return Err(invalid("time must be HH:MM"));
    }
    Ok(())
}

fn check_tags(tags: &[String]) -> Result<(), EventValidationError> {
    if tags.iter().any(|t| t.chars().count() > TAG_MAX_CHARS) {
        return Err(invalid("tags must be at most 40 characters each"));
    }
    Ok(())
}

/// Resolve the start instant from a request: an RFC 3339 `startsAt` wins,
/// otherwise date+time are combined as UTC best-effort.
fn build_starts_at(
    starts_at: Option<&str>,
    date: &str,
    time: &str,
) -> Result<Option<String>, EventValidationError> {
    if let Some(raw) = starts_at {
        let parsed = DateTime::parse_from_rfc3339(raw)
            .map_err(|_| invalid("startsAt must be an RFC 3339 datetime"))?;
        return Ok(Some(parsed.with_timezone(&Utc).to_rfc3339()));
    }
    if !date.is_empty() && !time.is_empty() {
        let d = NaiveDate::parse_from_str(date, "%Y-%m-%d");
        let t = NaiveTime::parse_from_str(time, "%H:%M");
        if let (Ok(d), Ok(t)) = (d, t) {
            return Ok(Some(d.and_time(t).and_utc().to_rfc3339()));
        }
    }
    Ok(None)
}

/// Payload for creating an event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_emoji")]
    pub emoji: String,
    /// Explicit creator for service-identity callers.
    #[serde(default, alias = "userId")]
    pub creator_id: Option<String>,
    #[serde(default)]
    pub kind: EventKind,
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub attendance: Option<i64>,
    #[serde(default)]
    pub starts_at: Option<String>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub timezone: String,
    pub location: Location,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub visibility: Visibility,
}

fn default_emoji() -> String {
    "📍".to_string()
}

impl CreateEventRequest {
    /// Validate the payload and assemble the event to insert.
    ///
    /// The attendee list always starts empty regardless of what the client
    /// sent.
    pub fn into_event(
        mut self,
        id: String,
        creator_id: String,
        now: DateTime<Utc>,
    ) -> Result<Event, EventValidationError> {
        let title = self.title.trim().to_string();
        if title.is_empty() || title.chars().count() > TITLE_MAX_CHARS {
            return Err(invalid("title must be 1-120 characters"));
        }
        let description = self.description.trim().to_string();
        if description.chars().count() > DESCRIPTION_MAX_CHARS {
            return Err(invalid("description must be at most 2000 characters"));
        }

        check_kind_rules(self.kind, self.price_cents, self.attendance)?;
        check_date_format(&self.date)?;
        check_time_format(&self.time)?;
        check_tags(&self.tags)?;
        self.location.normalize()?;

        let starts_at = build_starts_at(self.starts_at.as_deref(), &self.date, &self.time)?;

        Ok(Event {
            id,
            creator_id,
            title,
            description,
            emoji: self.emoji,
            kind: self.kind,
            price_cents: self.price_cents,
            attendance: self.attendance,
            attendees: Vec::new(),
            starts_at,
            date: self.date,
            time: self.time,
            timezone: self.timezone,
            tags: self.tags,
            visibility: self.visibility,
            status: EventStatus::Active,
            location: self.location,
            created_at: now.to_rfc3339(),
            updated_at: now.to_rfc3339(),
        })
    }
}

/// Deserialize helper distinguishing an absent field from an explicit null.
fn some_if_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update payload. Only provided fields are written.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub emoji: Option<String>,
    pub description: Option<String>,
    pub kind: Option<EventKind>,
    /// Present-and-null clears the price; absent leaves it untouched.
    #[serde(deserialize_with = "some_if_present")]
    pub price_cents: Option<Option<i64>>,
    pub starts_at: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub timezone: Option<String>,
    pub location: Option<Location>,
    pub tags: Option<Vec<String>>,
    pub visibility: Option<Visibility>,
    pub status: Option<EventStatus>,
    /// Explicit creator for service-identity callers.
    #[serde(alias = "userId")]
    pub creator_id: Option<String>,
}

impl EventPatch {
    /// True when no updatable field is present.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.emoji.is_none()
            && self.description.is_none()
            && self.kind.is_none()
            && self.price_cents.is_none()
            && self.starts_at.is_none()
            && self.date.is_none()
            && self.time.is_none()
            && self.timezone.is_none()
            && self.location.is_none()
            && self.tags.is_none()
            && self.visibility.is_none()
            && self.status.is_none()
    }

    /// Validate the patch and apply it to an event.
    pub fn apply(self, event: &mut Event, now: DateTime<Utc>) -> Result<(), EventValidationError> {
        if self.is_empty() {
            return Err(invalid("no fields provided to update"));
        }

        // Kind/price rules are checked against the post-patch values.
        let kind = self.kind.unwrap_or(event.kind);
        let price_cents = match self.price_cents {
            Some(patched) => patched,
            None if self.kind == Some(EventKind::Free) => None,
            None => event.price_cents,
        };
        let attendance = event.attendance;
        check_kind_rules(kind, price_cents, attendance)?;

        if let Some(status) = self.status {
            if status == EventStatus::Paused {
                return Err(invalid("status must be active or cancelled"));
            }
            event.status = status;
        }

        if let Some(title) = &self.title {
            let title = title.trim();
            if title.is_empty() || title.chars().count() > TITLE_MAX_CHARS {
                return Err(invalid("title must be 1-120 characters"));
            }
            event.title = title.to_string();
        }
        if let Some(description) = self.description {
            if description.chars().count() > DESCRIPTION_MAX_CHARS {
                return Err(invalid("description must be at most 2000 characters"));
            }
            event.description = description;
        }
        if let Some(emoji) = self.emoji {
            event.emoji = emoji;
        }
        if let Some(tags) = self.tags {
            check_tags(&tags)?;
            event.tags = tags;
        }
        if let Some(visibility) = self.visibility {
            event.visibility = visibility;
        }
        if let Some(timezone) = self.timezone {
            event.timezone = timezone;
        }

        let date_touched = self.date.is_some();
        let time_touched = self.time.is_some();
        if let Some(date) = self.date {
            check_date_format(&date)?;
            event.date = date;
        }
        if let Some(time) = self.time {
            check_time_format(&time)?;
            event.time = time;
        }

        if let Some(raw) = self.starts_at {
            event.starts_at = build_starts_at(Some(&raw), "", "")?;
        } else if date_touched || time_touched {
            event.starts_at =
                build_starts_at(None, &event.date, &event.time)?.or(event.starts_at.take());
        }

        if let Some(mut location) = self.location {
            location.normalize()?;
            event.location = location;
        }

        event.kind = kind;
        event.price_cents = price_cents;
        event.updated_at = now.to_rfc3339();
        Ok(())
    }
}

/// Filters accepted by the event listing endpoint.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct EventListQuery {
    pub country: Option<String>,
    pub admin1: Option<String>,
    pub city: Option<String>,
    pub city_key: Option<String>,
    pub kind: Option<EventKind>,
    pub status: Option<EventStatus>,
    pub visibility: Option<Visibility>,
    pub limit: Option<i64>,
    pub near_lat: Option<f64>,
    pub near_lng: Option<f64>,
    pub radius_m: Option<f64>,
}

pub const LIST_DEFAULT_LIMIT: i64 = 200;
pub const LIST_MAX_LIMIT: i64 = 500;

impl EventListQuery {
    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(LIST_DEFAULT_LIMIT)
            .clamp(1, LIST_MAX_LIMIT)
    }

    /// The city-key filter: an explicit key wins, otherwise the normalized
    /// city name.
    pub fn city_key_filter(&self) -> Option<String> {
        self.city_key
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| {
                self.city
                    .as_deref()
                    .map(norm_key)
                    .filter(|s| !s.is_empty())
            })
    }
}

/// Great-circle distance in meters between two WGS84 points.
pub fn haversine_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const EARTH_RADIUS_M: f64 = 6_371_000.0;
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();
    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> Location {
        Location {
            lat: 52.52,
            lng: 13.405,
            country_code: "de".to_string(),
            city: "Berlin".to_string(),
            ..Default::default()
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-08-07T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn base_request() -> CreateEventRequest {
        serde_json::from_value(serde_json::json!({
            "title": "Picnic",
            "location": { "lat": 52.52, "lng": 13.405, "countryCode": "de", "city": "Berlin" },
        }))
        .unwrap()
    }

    #[test]
    fn test_norm_key() {
        assert_eq!(norm_key("  New   York "), "new-york");
        assert_eq!(norm_key("São Paulo"), "são-paulo");
        assert_eq!(norm_key("L'Aquila!"), "laquila");
    }

    #[test]
    fn test_kind_aliases() {
        let kind: EventKind = serde_json::from_str("\"event_paid\"").unwrap();
        assert_eq!(kind, EventKind::Paid);
        let kind: EventKind = serde_json::from_str("\"event_free\"").unwrap();
        assert_eq!(kind, EventKind::Free);
    }

    #[test]
    fn test_create_defaults() {
        let event = base_request()
            .into_event("evt-1".to_string(), "user-1".to_string(), now())
            .unwrap();
        assert_eq!(event.kind, EventKind::Free);
        assert_eq!(event.emoji, "📍");
        assert_eq!(event.status, EventStatus::Active);
        assert!(event.attendees.is_empty());
        assert_eq!(event.location.country_code, "DE");
        assert_eq!(event.location.city_key, "berlin");
    }

    #[test]
    fn test_kind_price_rules() {
        let mut req = base_request();
        req.kind = EventKind::Paid;
        assert!(req
            .clone()
            .into_event("e".into(), "u".into(), now())
            .is_err());

        req.price_cents = Some(1500);
        assert!(req
            .clone()
            .into_event("e".into(), "u".into(), now())
            .is_ok());

        // Attendance cap is a free-event feature.
        req.attendance = Some(10);
        assert!(req
            .clone()
            .into_event("e".into(), "u".into(), now())
            .is_err());

        let mut req = base_request();
        req.price_cents = Some(100);
        assert!(req.into_event("e".into(), "u".into(), now()).is_err());

        let mut req = base_request();
        req.attendance = Some(0);
        assert!(req.into_event("e".into(), "u".into(), now()).is_err());
    }

    #[test]
    fn test_starts_at_from_date_and_time() {
        let mut req = base_request();
        req.date = "2026-09-01".to_string();
        req.time = "18:30".to_string();
        let event = req.into_event("e".into(), "u".into(), now()).unwrap();
        let instant = event.start_instant().unwrap();
        assert_eq!(instant.to_rfc3339(), "2026-09-01T18:30:00+00:00");
    }

    #[test]
    fn test_patch_rejects_empty_and_paused() {
        let mut event = base_request()
            .into_event("e".into(), "u".into(), now())
            .unwrap();

        assert!(EventPatch::default().apply(&mut event, now()).is_err());

        let patch: EventPatch = serde_json::from_value(serde_json::json!({
            "status": "paused"
        }))
        .unwrap();
        assert!(patch.apply(&mut event, now()).is_err());
    }

    #[test]
    fn test_patch_kind_change_to_free_clears_price() {
        let mut req = base_request();
        req.kind = EventKind::Service;
        req.price_cents = Some(5000);
        let mut event = req.into_event("e".into(), "u".into(), now()).unwrap();

        let patch: EventPatch =
            serde_json::from_value(serde_json::json!({ "kind": "free" })).unwrap();
        patch.apply(&mut event, now()).unwrap();
        assert_eq!(event.kind, EventKind::Free);
        assert_eq!(event.price_cents, None);
    }

    #[test]
    fn test_patch_to_paid_requires_price() {
        let mut event = base_request()
            .into_event("e".into(), "u".into(), now())
            .unwrap();

        let patch: EventPatch =
            serde_json::from_value(serde_json::json!({ "kind": "paid" })).unwrap();
        assert!(patch.apply(&mut event, now()).is_err());

        let patch: EventPatch = serde_json::from_value(serde_json::json!({
            "kind": "paid", "priceCents": 2000
        }))
        .unwrap();
        patch.apply(&mut event, now()).unwrap();
        assert_eq!(event.price_cents, Some(2000));
    }

    #[test]
    fn test_patch_recomputes_starts_at_from_merged_date_time() {
        let mut req = base_request();
        req.date = "2026-09-01".to_string();
        req.time = "18:30".to_string();
        let mut event = req.into_event("e".into(), "u".into(), now()).unwrap();

        let patch: EventPatch =
            serde_json::from_value(serde_json::json!({ "time": "20:00" })).unwrap();
        patch.apply(&mut event, now()).unwrap();
        assert_eq!(
            event.start_instant().unwrap().to_rfc3339(),
            "2026-09-01T20:00:00+00:00"
        );
    }

    #[test]
    fn test_event_row_round_trip() {
        let mut event = base_request()
            .into_event("evt-1".into(), "user-1".into(), now())
            .unwrap();
        event.attendees.push(Attendee {
            user_id: "user-2".to_string(),
            name: "Joe".to_string(),
            ..Default::default()
        });

        let row = EventRow {
            id: event.id.clone(),
            creator_id: event.creator_id.clone(),
            title: event.title.clone(),
            description: event.description.clone(),
            emoji: event.emoji.clone(),
            kind: event.kind.to_string(),
            price_cents: event.price_cents,
            attendance: event.attendance,
            attendees: serde_json::to_string(&event.attendees).unwrap(),
            starts_at: event.starts_at.clone(),
            date: event.date.clone(),
            time: event.time.clone(),
            timezone: event.timezone.clone(),
            tags: serde_json::to_string(&event.tags).unwrap(),
            visibility: "public".to_string(),
            status: "active".to_string(),
            location: serde_json::to_string(&event.location).unwrap(),
            created_at: event.created_at.clone(),
            updated_at: event.updated_at.clone(),
        };

        let parsed: Event = row.into();
        assert_eq!(parsed, event);
        assert!(parsed.is_attendee("user-2"));
        assert!(!parsed.is_attendee("user-1"));
    }

    #[test]
    fn test_haversine() {
        // Berlin to Potsdam is roughly 27 km.
        let d = haversine_m(52.52, 13.405, 52.4, 13.06);
        assert!((20_000.0..35_000.0).contains(&d), "distance {d}");
    }
}
