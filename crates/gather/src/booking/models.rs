//! Booking data models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A service booking, written by the external payment/booking collaborator
/// and read back for the provider's dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub event_id: String,
    pub when_iso: String,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub notes: String,
    pub created_at: String,
}
