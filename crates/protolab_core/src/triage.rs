//! crates/protolab_core/src/triage.rs
//!
//! The admin's working copy of customer requests and the reply/solve transitions.
//!
//! The list is only ever replaced wholesale by a fetch from the [`RequestStore`];
//! transitions never patch it locally. At most one transition runs at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{ReplySubmission, Request, RequestDetails, RequestStatus, RequestType};
use crate::ports::{PortError, RequestStore};

/// Used by `mark_solved` when the admin leaves the message blank.
pub const DEFAULT_SOLVED_MESSAGE: &str = "Your request has been marked as solved.";

#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("Another reply is already being submitted")]
    Busy,
    #[error("Reply message cannot be empty")]
    EmptyMessage,
    #[error("Request {0} is not in the current list")]
    UnknownRequest(Uuid),
    #[error(transparent)]
    Remote(#[from] PortError),
}

/// Number of requests per status, for the admin tabs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub all: usize,
    pub pending: usize,
    pub under_review: usize,
    pub solved: usize,
}

pub struct TriageStore {
    remote: Arc<dyn RequestStore>,
    requests: RwLock<Vec<Request>>,
    busy: AtomicBool,
}

/// Clears the busy flag when a transition finishes, however it finishes.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl TriageStore {
    /// Creates an empty store; call [`TriageStore::refresh`] to populate it.
    pub fn new(remote: Arc<dyn RequestStore>) -> Self {
        Self {
            remote,
            requests: RwLock::new(Vec::new()),
            busy: AtomicBool::new(false),
        }
    }

    /// Replaces the local list with the remote one. On failure the old list stays.
    pub async fn refresh(&self) -> Result<usize, TriageError> {
        let fresh = self.remote.get_all_requests().await.map_err(|e| {
            error!("Failed to fetch requests: {:?}", e);
            e
        })?;
        let count = fresh.len();
        *self.requests.write().await = fresh;
        info!("Loaded {} requests", count);
        Ok(count)
    }

    /// Requests in the given tab; `None` means every status.
    pub async fn requests(&self, status: Option<RequestStatus>) -> Vec<Request> {
        self.requests
            .read()
            .await
            .iter()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect()
    }

    pub async fn find(&self, request_id: Uuid) -> Option<Request> {
        self.requests
            .read()
            .await
            .iter()
            .find(|r| r.id == request_id)
            .cloned()
    }

    pub async fn counts(&self) -> StatusCounts {
        let requests = self.requests.read().await;
        let mut counts = StatusCounts {
            all: requests.len(),
            ..StatusCounts::default()
        };
        for r in requests.iter() {
            match r.status {
                RequestStatus::Pending => counts.pending += 1,
                RequestStatus::UnderReview => counts.under_review += 1,
                RequestStatus::Solved => counts.solved += 1,
            }
        }
        counts
    }

    pub async fn details(
        &self,
        request_type: RequestType,
        request_id: Uuid,
    ) -> Result<RequestDetails, TriageError> {
        Ok(self
            .remote
            .get_request_details(request_type, request_id)
            .await?)
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Sends a reply and moves the request to `under_review`, whatever its status was.
    pub async fn submit_reply(&self, request_id: Uuid, message: &str) -> Result<(), TriageError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(TriageError::EmptyMessage);
        }
        self.transition(request_id, message, RequestStatus::UnderReview)
            .await
    }

    /// Closes the request; a blank message is replaced with [`DEFAULT_SOLVED_MESSAGE`].
    pub async fn mark_solved(&self, request_id: Uuid, message: &str) -> Result<(), TriageError> {
        let message = match message.trim() {
            "" => DEFAULT_SOLVED_MESSAGE,
            m => m,
        };
        self.transition(request_id, message, RequestStatus::Solved)
            .await
    }

    async fn transition(
        &self,
        request_id: Uuid,
        message: &str,
        new_status: RequestStatus,
    ) -> Result<(), TriageError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Rejected reply to {}: another submission is in flight", request_id);
            return Err(TriageError::Busy);
        }
        let _guard = BusyGuard(&self.busy);

        let request = self
            .find(request_id)
            .await
            .ok_or(TriageError::UnknownRequest(request_id))?;

        if request.status == RequestStatus::Solved && new_status == RequestStatus::UnderReview {
            info!("Reopening solved request {} via reply", request_id);
        }

        let submission = ReplySubmission {
            request_type: request.request_type,
            request_id,
            user_id: request.user_id,
            user_email: request.user_email.clone(),
            reply_message: message.to_string(),
            new_status,
            previous_status: request.status,
        };

        self.remote.submit_admin_reply(submission).await.map_err(|e| {
            error!("Failed to submit reply for request {}: {:?}", request_id, e);
            e
        })?;
        info!(
            "Request {} moved from {} to {}",
            request_id, request.status, new_status
        );

        self.refresh().await?;
        Ok(())
    }
}
