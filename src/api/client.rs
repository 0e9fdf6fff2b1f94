//! ShopApi trait definition

use async_trait::async_trait;

use super::{ChatRequest, ChatResponse, DetailsResponse, ModelChoice, RequestError};

/// Client for the recommendation service
///
/// One method per consumed endpoint. Implementations do transport only;
/// interpretation of the `response` payload belongs to the parser and the
/// conversation controller. The controller holds this as a trait object so
/// tests can script the service.
#[async_trait]
pub trait ShopApi: Send + Sync {
    /// Submit a chat turn and return the service's raw reply
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, RequestError>;

    /// Fetch the enrichment job state for a session
    async fn product_details(&self, session_id: &str) -> Result<DetailsResponse, RequestError>;

    /// Switch the backing model for an active session
    async fn switch_model(&self, session_id: &str, model: ModelChoice) -> Result<(), RequestError>;
}
