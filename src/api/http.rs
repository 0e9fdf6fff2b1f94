//! HTTP implementation of the ShopApi trait
//!
//! Thin transport over the recommendation service's REST endpoints. No
//! retries and no payload interpretation happen here; a non-success status
//! or an undecodable body is surfaced as a RequestError and the caller
//! decides what it means for the conversation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{ChatRequest, ChatResponse, DetailsResponse, ModelChoice, RequestError, ShopApi, SwitchModelRequest};
use crate::config::ApiConfig;

/// Reqwest-backed recommendation service client
pub struct HttpShopApi {
    base_url: String,
    http: Client,
}

impl HttpShopApi {
    /// Create a client from configuration
    pub fn from_config(config: &ApiConfig) -> Result<Self, RequestError> {
        debug!(base_url = %config.base_url, timeout_ms = config.timeout_ms, "from_config: called");
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(RequestError::Network)?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    /// Check the status and decode the body of a settled response
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, RequestError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "decode: service error");
            return Err(RequestError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await.map_err(RequestError::Network)?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ShopApi for HttpShopApi {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, RequestError> {
        debug!(
            is_followup = request.is_followup,
            has_session = request.session_id.is_some(),
            preference_count = request.preferences.len(),
            "chat: called"
        );
        let response = self
            .http
            .post(self.endpoint("chat"))
            .json(&request)
            .send()
            .await
            .map_err(RequestError::Network)?;

        Self::decode(response).await
    }

    async fn product_details(&self, session_id: &str) -> Result<DetailsResponse, RequestError> {
        debug!(%session_id, "product_details: called");
        let response = self
            .http
            .get(self.endpoint(&format!("product-details/{}", session_id)))
            .send()
            .await
            .map_err(RequestError::Network)?;

        Self::decode(response).await
    }

    async fn switch_model(&self, session_id: &str, model: ModelChoice) -> Result<(), RequestError> {
        debug!(%session_id, %model, "switch_model: called");
        let response = self
            .http
            .post(self.endpoint(&format!("switch-model/{}", session_id)))
            .json(&SwitchModelRequest { model_choice: model })
            .send()
            .await
            .map_err(RequestError::Network)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RequestError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}
