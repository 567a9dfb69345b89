use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::message::ChatMessageView;
use crate::models::request::{PrescriptionRequest, RequestStatus};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateRequestPayload {
    #[validate(length(min = 1, message = "Medicine list cannot be empty"))]
    pub medicines: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestResponse {
    pub id: i64,
    pub customer_id: Uuid,
    pub medicines_text: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

impl From<PrescriptionRequest> for RequestResponse {
    fn from(req: PrescriptionRequest) -> Self {
        Self {
            id: req.id,
            customer_id: req.customer_id,
            medicines_text: req.medicines_text,
            status: req.status,
            created_at: req.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestListResponse {
    pub items: Vec<RequestResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestCustomer {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestDetailsResponse {
    pub request: RequestResponse,
    pub customer: RequestCustomer,
    pub chat_history: Vec<ChatMessageView>,
}
