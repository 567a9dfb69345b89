use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::message::ChatMessage;
use crate::models::request::{PrescriptionRequest, RequestStatus};
use crate::models::user::Role;

#[derive(Clone)]
pub struct ChatService {
    pool: PgPool,
}

impl ChatService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gate on room membership: only the owning customer or a pharmacist may
    /// join a request's channel.
    pub async fn authorize_join(
        &self,
        request_id: i64,
        caller_id: Uuid,
        caller_role: Role,
    ) -> Result<PrescriptionRequest> {
        let request = sqlx::query_as::<_, PrescriptionRequest>(
            "SELECT * FROM prescription_requests WHERE id = $1",
        )
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Request not found".to_string()))?;

        if caller_role == Role::Customer && request.customer_id != caller_id {
            return Err(Error::Forbidden(
                "You are not a participant in this request".to_string(),
            ));
        }

        Ok(request)
    }

    /// Persist a chat message and, if the request is still Pending, flip it to
    /// Awaiting Reply. Both writes commit in one transaction; callers must only
    /// broadcast after this returns, so a broadcast frame always refers to a
    /// queryable message.
    pub async fn post_message(
        &self,
        request_id: i64,
        sender_id: Uuid,
        text: &str,
    ) -> Result<ChatMessage> {
        let mut tx = self.pool.begin().await?;

        let message = sqlx::query_as::<_, ChatMessage>(
            r#"
            INSERT INTO chat_messages (request_id, sender_id, message_text)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(sender_id)
        .bind(text)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE prescription_requests
            SET status = $2
            WHERE id = $1 AND status = $3
            "#,
        )
        .bind(request_id)
        .bind(RequestStatus::AwaitingReply)
        .bind(RequestStatus::Pending)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(message)
    }

    /// Pharmacist-chosen status override. Non-pharmacist callers and missing
    /// requests are silent no-ops; `None` means nothing should be broadcast.
    pub async fn change_status(
        &self,
        request_id: i64,
        caller_role: Role,
        status: RequestStatus,
    ) -> Result<Option<RequestStatus>> {
        if caller_role != Role::Pharmacist {
            return Ok(None);
        }

        let updated = sqlx::query_scalar::<_, RequestStatus>(
            r#"
            UPDATE prescription_requests
            SET status = $2
            WHERE id = $1
            RETURNING status
            "#,
        )
        .bind(request_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(status) = updated {
            tracing::info!(request_id, status = %status, "request status changed");
        }
        Ok(updated)
    }
}
