//! Recommendation response parser
//!
//! The service replies with free text that embeds exactly one JSON object
//! (conversational preamble before the first `{` and trailing prose after
//! the last `}` are ignored). The object is either a clarification request
//! or a recommendation set; everything else is a [`ParseError`] and the
//! caller decides whether that is fatal.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Discriminator value the service uses for clarification payloads
const CLARIFICATION_TAG: &str = "clarification";

/// Errors from a malformed reply payload
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("No JSON object found in reply")]
    NoPayload,

    #[error("Malformed JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// One clarifying question with its preset answer options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClarifyingQuestion {
    pub question: String,

    #[serde(default)]
    pub options: Vec<String>,
}

/// Category -> question mapping as sent by the service
pub type QuestionSet = BTreeMap<String, ClarifyingQuestion>;

/// One recommended product
///
/// Fields other than `name` are whatever the model chose to emit; `price`
/// stays a raw JSON value because the upstream schema says number but the
/// payload is not trustworthy (a string price must not sink the whole set).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub price: Option<serde_json::Value>,

    #[serde(default)]
    pub features: Vec<String>,

    #[serde(default)]
    pub pros: Vec<String>,

    #[serde(default)]
    pub cons: Vec<String>,
}

impl Recommendation {
    /// Price rendered for display, if the payload carried one
    pub fn price_label(&self) -> Option<String> {
        match &self.price {
            Some(serde_json::Value::Number(n)) => Some(format!("${}", n)),
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            _ => None,
        }
    }
}

/// Classified reply payload
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedReply {
    /// The service needs more information before recommending
    Clarification(QuestionSet),

    /// A recommendation set with its narrative overview
    Recommendations {
        items: Vec<Recommendation>,
        overview: Option<String>,
    },
}

/// Raw payload shape; the discriminator decides which half is meaningful
#[derive(Debug, Deserialize)]
struct RawReply {
    #[serde(rename = "type", default)]
    kind: Option<String>,

    #[serde(default)]
    questions: Option<QuestionSet>,

    #[serde(default)]
    recommendations: Vec<Recommendation>,

    #[serde(default)]
    overview: Option<String>,
}

/// Parse and classify a raw reply
pub fn parse_reply(text: &str) -> Result<ParsedReply, ParseError> {
    let payload = extract_object(text)?;
    let raw: RawReply = serde_json::from_str(payload)?;

    if raw.kind.as_deref() == Some(CLARIFICATION_TAG) {
        if let Some(questions) = raw.questions
            && !questions.is_empty()
        {
            debug!(question_count = questions.len(), "parse_reply: clarification payload");
            return Ok(ParsedReply::Clarification(questions));
        }
        debug!("parse_reply: clarification tag without questions, treating as recommendations");
    }

    debug!(
        item_count = raw.recommendations.len(),
        has_overview = raw.overview.is_some(),
        "parse_reply: recommendation payload"
    );
    Ok(ParsedReply::Recommendations {
        items: raw.recommendations,
        overview: raw.overview,
    })
}

/// Slice out the embedded object: first `{` through last `}`
fn extract_object(text: &str) -> Result<&str, ParseError> {
    let start = text.find('{').ok_or(ParseError::NoPayload)?;
    let end = text.rfind('}').ok_or(ParseError::NoPayload)?;
    if end < start {
        return Err(ParseError::NoPayload);
    }
    Ok(&text[start..=end])
}
