//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `RequestStore` and `AccountService` ports from the `core` crate. It handles
//! all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use protolab_core::domain::{
    AdminReply, AuthContext, NewRequest, Profile, ReplySubmission, Request, RequestDetails,
    RequestType, User, UserCredentials,
};
use protolab_core::ports::{AccountService, PortError, PortResult, RequestStore};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use std::collections::BTreeMap;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `RequestStore` and `AccountService` ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn fetch_request(&self, request_id: Uuid) -> PortResult<RequestRecord> {
        let query = format!("{} WHERE r.id = $1", SELECT_REQUESTS);
        sqlx::query_as::<_, RequestRecord>(&query)
            .bind(request_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| not_found_or_unexpected(e, format!("Request {} not found", request_id)))
    }
}

fn not_found_or_unexpected(e: sqlx::Error, what: String) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what),
        _ => PortError::Unexpected(e.to_string()),
    }
}

const SELECT_REQUESTS: &str = "SELECT r.id, r.request_type, r.user_id, u.email AS user_email, \
     COALESCE(p.full_name, '') AS user_name, r.created_at, r.updated_at, r.status, r.summary, \
     r.admin_notes, r.details \
     FROM requests r \
     JOIN users u ON u.user_id = r.user_id \
     LEFT JOIN profiles p ON p.user_id = r.user_id";

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct RequestRecord {
    id: Uuid,
    request_type: String,
    user_id: Uuid,
    user_email: String,
    user_name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    status: String,
    summary: String,
    admin_notes: Option<String>,
    details: Json<Value>,
}
impl RequestRecord {
    fn to_domain(self) -> PortResult<Request> {
        Ok(Request {
            id: self.id,
            request_type: self.request_type.parse().map_err(PortError::Unexpected)?,
            user_id: self.user_id,
            user_email: self.user_email,
            user_name: self.user_name,
            created_at: self.created_at,
            updated_at: self.updated_at,
            status: self.status.parse().map_err(PortError::Unexpected)?,
            summary: self.summary,
            admin_notes: self.admin_notes,
        })
    }

    /// Flattens the JSONB details object into display strings.
    fn fields(&self) -> BTreeMap<String, String> {
        match &self.details.0 {
            Value::Object(map) => map
                .iter()
                .map(|(k, v)| {
                    let text = match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (k.clone(), text)
                })
                .collect(),
            _ => BTreeMap::new(),
        }
    }
}

#[derive(FromRow)]
struct ReplyRecord {
    message: String,
    previous_status: String,
    new_status: String,
    created_at: DateTime<Utc>,
}
impl ReplyRecord {
    fn to_domain(self) -> PortResult<AdminReply> {
        Ok(AdminReply {
            message: self.message,
            previous_status: self.previous_status.parse().map_err(PortError::Unexpected)?,
            new_status: self.new_status.parse().map_err(PortError::Unexpected)?,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct AuthContextRecord {
    user_id: Uuid,
    email: String,
    full_name: Option<String>,
    is_admin: Option<bool>,
}
impl AuthContextRecord {
    fn to_domain(self) -> AuthContext {
        // A missing profile row leaves both columns NULL.
        let profile = match (self.full_name, self.is_admin) {
            (None, None) => None,
            (full_name, is_admin) => Some(Profile {
                full_name: full_name.unwrap_or_default(),
                is_admin: is_admin.unwrap_or(false),
            }),
        };
        AuthContext {
            user: User {
                user_id: self.user_id,
                email: self.email,
            },
            profile,
        }
    }
}

//=========================================================================================
// `RequestStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl RequestStore for DbAdapter {
    async fn get_all_requests(&self) -> PortResult<Vec<Request>> {
        let query = format!("{} ORDER BY r.created_at DESC", SELECT_REQUESTS);
        let records = sqlx::query_as::<_, RequestRecord>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn get_request_details(
        &self,
        request_type: RequestType,
        request_id: Uuid,
    ) -> PortResult<RequestDetails> {
        let record = self.fetch_request(request_id).await?;
        if record.request_type != request_type.as_str() {
            return Err(PortError::NotFound(format!(
                "{} request {} not found",
                request_type, request_id
            )));
        }
        let fields = record.fields();
        let request = record.to_domain()?;

        let replies = sqlx::query_as::<_, ReplyRecord>(
            "SELECT message, previous_status, new_status, created_at FROM request_replies \
             WHERE request_id = $1 ORDER BY created_at ASC",
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?
        .into_iter()
        .map(|r| r.to_domain())
        .collect::<PortResult<Vec<_>>>()?;

        Ok(RequestDetails {
            request,
            fields,
            replies,
        })
    }

    async fn submit_admin_reply(&self, reply: ReplySubmission) -> PortResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let updated = sqlx::query(
            "UPDATE requests SET status = $1, admin_notes = $2, updated_at = now() \
             WHERE id = $3 AND request_type = $4",
        )
        .bind(reply.new_status.as_str())
        .bind(&reply.reply_message)
        .bind(reply.request_id)
        .bind(reply.request_type.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if updated.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "{} request {} not found",
                reply.request_type, reply.request_id
            )));
        }

        sqlx::query(
            "INSERT INTO request_replies (id, request_id, message, previous_status, new_status) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::new_v4())
        .bind(reply.request_id)
        .bind(&reply.reply_message)
        .bind(reply.previous_status.as_str())
        .bind(reply.new_status.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn create_request(&self, request: NewRequest) -> PortResult<Request> {
        let id = Uuid::new_v4();
        let details: serde_json::Map<String, Value> = request
            .fields
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();

        sqlx::query(
            "INSERT INTO requests (id, request_type, user_id, summary, status, details) \
             VALUES ($1, $2, $3, $4, 'pending', $5)",
        )
        .bind(id)
        .bind(request.request_type.as_str())
        .bind(request.user_id)
        .bind(&request.summary)
        .bind(Json(Value::Object(details)))
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        self.fetch_request(id).await?.to_domain()
    }
}

//=========================================================================================
// `AccountService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AccountService for DbAdapter {
    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("User {} not found", email)))?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<AuthContext> {
        let record = sqlx::query_as::<_, AuthContextRecord>(
            "SELECT u.user_id, u.email, p.full_name, p.is_admin \
             FROM auth_sessions s \
             JOIN users u ON u.user_id = s.user_id \
             LEFT JOIN profiles p ON p.user_id = s.user_id \
             WHERE s.id = $1 AND s.expires_at > now()",
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::Unauthorized,
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }
}
