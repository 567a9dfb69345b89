use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::message::ChatMessageView;
use crate::models::request::PrescriptionRequest;
use crate::models::user::{Role, User};

#[derive(Clone)]
pub struct RequestService {
    pool: PgPool,
}

pub struct RequestDetails {
    pub request: PrescriptionRequest,
    pub customer: User,
    pub chat_history: Vec<ChatMessageView>,
}

impl RequestService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, customer_id: Uuid, medicines_text: &str) -> Result<PrescriptionRequest> {
        if medicines_text.trim().is_empty() {
            return Err(Error::BadRequest(
                "Medicine list cannot be empty".to_string(),
            ));
        }

        let request = sqlx::query_as::<_, PrescriptionRequest>(
            r#"
            INSERT INTO prescription_requests (customer_id, medicines_text)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(medicines_text)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(request_id = request.id, "prescription request created");
        Ok(request)
    }

    /// A customer's own requests, newest first.
    pub async fn list_own(&self, customer_id: Uuid) -> Result<Vec<PrescriptionRequest>> {
        let items = sqlx::query_as::<_, PrescriptionRequest>(
            r#"
            SELECT * FROM prescription_requests
            WHERE customer_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    /// The pharmacist triage queue: pending requests, oldest first.
    pub async fn list_pending(&self) -> Result<Vec<PrescriptionRequest>> {
        let items = sqlx::query_as::<_, PrescriptionRequest>(
            r#"
            SELECT * FROM prescription_requests
            WHERE status = 'Pending'
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<PrescriptionRequest> {
        let request = sqlx::query_as::<_, PrescriptionRequest>(
            "SELECT * FROM prescription_requests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Request not found".to_string()))?;
        Ok(request)
    }

    /// Request + owning customer + full chat history. Customers may only view
    /// their own requests; pharmacists may view any.
    pub async fn get_details(
        &self,
        id: i64,
        caller_id: Uuid,
        caller_role: Role,
    ) -> Result<RequestDetails> {
        let request = self.get_by_id(id).await?;

        if caller_role == Role::Customer && request.customer_id != caller_id {
            return Err(Error::Forbidden(
                "You are not authorized to view this request".to_string(),
            ));
        }

        let customer = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(request.customer_id)
            .fetch_one(&self.pool)
            .await?;

        let chat_history = sqlx::query_as::<_, ChatMessageView>(
            r#"
            SELECT m.id, m.request_id, m.sender_id, u.username AS sender_username,
                   m.message_text, m.created_at
            FROM chat_messages m
            JOIN users u ON u.id = m.sender_id
            WHERE m.request_id = $1
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(RequestDetails {
            request,
            customer,
            chat_history,
        })
    }

    /// Owner-only delete. Messages go first, then the request, in one
    /// transaction; a failure anywhere rolls both back.
    pub async fn delete(&self, id: i64, caller_id: Uuid) -> Result<()> {
        let request = self.get_by_id(id).await?;

        if request.customer_id != caller_id {
            return Err(Error::Forbidden(
                "You are not authorized to delete this request".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM chat_messages WHERE request_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM prescription_requests WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(request_id = id, "prescription request deleted");
        Ok(())
    }
}
