//! Detail poller
//!
//! The enrichment endpoint answers `processing` until the service's
//! background search finishes, then `completed` with the payload. The
//! poller turns that into a single awaitable result: query, sleep the
//! fixed interval, query again, up to a bounded attempt budget. Anything
//! other than those two statuses, a transport failure, or running out of
//! budget fails the whole poll; the controller treats every failure as
//! terminal for the turn.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::api::{DetailStatus, ProductDetail, RequestError, ShopApi};

/// Errors that end a poll
#[derive(Debug, Error)]
pub enum PollError {
    #[error("Details request failed: {0}")]
    Request(#[from] RequestError),

    #[error("Service reported an unexpected details status")]
    UnexpectedStatus,

    #[error("Details not ready after {attempts} attempts")]
    TimedOut { attempts: u32 },
}

impl PollError {
    /// Check if this poll failed by exhausting its attempt budget
    pub fn is_timeout(&self) -> bool {
        matches!(self, PollError::TimedOut { .. })
    }
}

/// Polls the enrichment endpoint for a session until it settles
pub struct DetailPoller {
    api: Arc<dyn ShopApi>,
    interval: Duration,
    max_attempts: u32,
}

impl DetailPoller {
    pub fn new(api: Arc<dyn ShopApi>, interval: Duration, max_attempts: u32) -> Self {
        Self {
            api,
            interval,
            max_attempts,
        }
    }

    /// Await the enrichment payload for a session
    ///
    /// Resolves once the service reports `completed`; a missing payload at
    /// that point is an empty detail sequence (every product renders as
    /// "no details").
    pub async fn wait_for_details(&self, session_id: &str) -> Result<Vec<ProductDetail>, PollError> {
        for attempt in 1..=self.max_attempts {
            let response = self.api.product_details(session_id).await?;

            match response.status {
                DetailStatus::Completed => {
                    let details = response.product_details.unwrap_or_default();
                    debug!(attempt, detail_count = details.len(), "wait_for_details: completed");
                    return Ok(details);
                }
                DetailStatus::Processing => {
                    debug!(attempt, "wait_for_details: still processing");
                    if attempt < self.max_attempts {
                        sleep(self.interval).await;
                    }
                }
                DetailStatus::Unknown => {
                    warn!(attempt, %session_id, "wait_for_details: unexpected status");
                    return Err(PollError::UnexpectedStatus);
                }
            }
        }

        warn!(
            attempts = self.max_attempts,
            %session_id,
            "wait_for_details: attempt budget exhausted"
        );
        Err(PollError::TimedOut {
            attempts: self.max_attempts,
        })
    }
}
