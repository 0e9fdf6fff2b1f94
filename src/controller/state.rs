//! Conversation phase machine and the render-facing snapshot
//!
//! The phase is an explicit tagged variant rather than flags reconstructed
//! from surrounding state: `Clarifying` carries the outstanding question
//! set, so the clarification branch of a turn is only reachable while
//! questions are actually held.

use std::collections::BTreeMap;

use crate::api::{ModelChoice, ProductDetail};
use crate::parser::{QuestionSet, Recommendation};
use crate::timeline::Entry;

/// Where the conversation stands
///
/// `Initial` ⇔ no session yet. `Clarifying` ⇔ the service asked questions
/// that have not been folded into a turn. `Clarified` ⇔ at least one
/// recommendation set has been produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ConversationPhase {
    #[default]
    Initial,
    Clarifying {
        questions: QuestionSet,
    },
    Clarified,
}

impl ConversationPhase {
    pub fn is_initial(&self) -> bool {
        matches!(self, Self::Initial)
    }

    pub fn is_clarifying(&self) -> bool {
        matches!(self, Self::Clarifying { .. })
    }

    pub fn is_clarified(&self) -> bool {
        matches!(self, Self::Clarified)
    }

    /// Outstanding questions while clarifying
    pub fn questions(&self) -> Option<&QuestionSet> {
        match self {
            Self::Clarifying { questions } => Some(questions),
            _ => None,
        }
    }

    /// The service asked for more information
    pub fn begin_clarifying(&mut self, questions: QuestionSet) {
        *self = Self::Clarifying { questions };
    }

    /// A recommendation set was produced
    pub fn mark_clarified(&mut self) {
        *self = Self::Clarified;
    }

    /// Back to a fresh conversation
    pub fn reset(&mut self) {
        *self = Self::Initial;
    }
}

/// The latest recommendation set with its enrichment details
#[derive(Debug, Clone, PartialEq)]
pub struct LatestRecommendations {
    pub items: Vec<Recommendation>,
    pub details: Vec<ProductDetail>,
}

/// Cloned view of the conversation for a rendering layer
#[derive(Debug, Clone)]
pub struct ConversationSnapshot {
    pub session_id: Option<String>,
    pub is_clarified: bool,
    pub clarifying_questions: Option<QuestionSet>,
    pub persisted_preferences: BTreeMap<String, String>,
    pub displayed_preferences: BTreeMap<String, String>,
    pub model: ModelChoice,
    pub loading: bool,
    pub last_error: Option<String>,
    pub entries: Vec<Entry>,
    pub latest: Option<LatestRecommendations>,
}
