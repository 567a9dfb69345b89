use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle label of a prescription request. Stored as the Postgres enum
/// `request_status`; the on-wire spelling is "Awaiting Reply", space included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "request_status")]
pub enum RequestStatus {
    Pending,
    #[sqlx(rename = "Awaiting Reply")]
    #[serde(rename = "Awaiting Reply")]
    AwaitingReply,
    Fulfilled,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::AwaitingReply => "Awaiting Reply",
            RequestStatus::Fulfilled => "Fulfilled",
            RequestStatus::Rejected => "Rejected",
        }
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(RequestStatus::Pending),
            "Awaiting Reply" => Ok(RequestStatus::AwaitingReply),
            "Fulfilled" => Ok(RequestStatus::Fulfilled),
            "Rejected" => Ok(RequestStatus::Rejected),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PrescriptionRequest {
    pub id: i64,
    pub customer_id: Uuid,
    pub medicines_text: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}
