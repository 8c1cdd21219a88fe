//! crates/protolab_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the database, the catalog file and the session provider.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    AuthContext, Catalog, NewRequest, ReplySubmission, Request, RequestDetails, RequestType,
    UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The remote store holding customer requests.
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Every request, all statuses, newest first.
    async fn get_all_requests(&self) -> PortResult<Vec<Request>>;

    async fn get_request_details(
        &self,
        request_type: RequestType,
        request_id: Uuid,
    ) -> PortResult<RequestDetails>;

    /// Records the reply and moves the request to `reply.new_status`.
    async fn submit_admin_reply(&self, reply: ReplySubmission) -> PortResult<()>;

    async fn create_request(&self, request: NewRequest) -> PortResult<Request>;
}

/// Where the estimator's parts list comes from.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn load_catalog(&self) -> PortResult<Catalog>;
}

/// Session provider backing the authentication context.
#[async_trait]
pub trait AccountService: Send + Sync {
    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Resolves a live session to the user and profile behind it.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<AuthContext>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;
}
