//! Wire types for the recommendation service
//!
//! These mirror the service's JSON bodies. Payload fields that come out of
//! the LLM pipeline (prices, buy links, review blobs) are kept as raw JSON
//! values rather than strict types, since the upstream does not guarantee
//! their shape.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which backing model the recommendation service should use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelChoice {
    #[default]
    Perplexity,
    Openai,
    Hybrid,
}

impl ModelChoice {
    /// Human-readable name for informational messages
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Perplexity => "Perplexity",
            Self::Openai => "OpenAI GPT-4",
            Self::Hybrid => "Hybrid (Perplexity + OpenAI)",
        }
    }
}

impl FromStr for ModelChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "perplexity" => Ok(Self::Perplexity),
            "openai" => Ok(Self::Openai),
            "hybrid" => Ok(Self::Hybrid),
            _ => Err(format!("Unknown model: {}. Use: perplexity, openai, or hybrid", s)),
        }
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Perplexity => write!(f, "perplexity"),
            Self::Openai => write!(f, "openai"),
            Self::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// Body for `POST /api/chat`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// The user's message (plain or preference-enhanced)
    pub message: String,

    /// Persisted preferences accompanying the message
    pub preferences: BTreeMap<String, String>,

    /// Session identifier, absent on the first turn
    pub session_id: Option<String>,

    /// Whether this turn refines an already-recommended conversation
    pub is_followup: bool,

    /// Backing model for this turn
    pub model_choice: ModelChoice,
}

/// Body of a `POST /api/chat` response
///
/// `response` is the raw text the parser consumes; everything else the
/// service sends alongside it is ignored here.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Session identifier assigned (or reaffirmed) by the service
    #[serde(default)]
    pub session_id: Option<String>,

    /// Raw text payload with the embedded recommendation/clarification object
    #[serde(default)]
    pub response: String,
}

/// Body of a `GET /api/product-details/{session_id}` response
#[derive(Debug, Clone, Deserialize)]
pub struct DetailsResponse {
    pub status: DetailStatus,

    #[serde(default)]
    pub product_details: Option<Vec<ProductDetail>>,
}

/// Enrichment job status reported by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailStatus {
    Processing,
    Completed,
    #[serde(other)]
    Unknown,
}

/// Enrichment payload for one product, index-aligned with the
/// recommendation sequence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDetail {
    /// Retailer links, each an opaque `{retailer, url, price, ...}` object
    #[serde(default)]
    pub buy_links: Vec<serde_json::Value>,

    /// Consolidated review blob, null when review search found nothing
    #[serde(default)]
    pub reviews: Option<serde_json::Value>,
}

/// Body for `POST /api/switch-model/{session_id}`
#[derive(Debug, Clone, Serialize)]
pub struct SwitchModelRequest {
    pub model_choice: ModelChoice,
}
