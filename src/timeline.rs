//! Conversation message timeline
//!
//! Pure data consumed by a rendering layer. The timeline is append-only:
//! entries are never mutated after creation, and the only bulk removal is
//! dropping `Loading` entries by tag once the operation they covered has
//! settled.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::ProductDetail;
use crate::parser::{QuestionSet, Recommendation};

/// A timeline message, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// What the user submitted (preference-enhanced form when tags were
    /// pending at submit time)
    User { text: String },

    /// Assistant prose: lead-ins, notices, apologies
    Assistant { text: String },

    /// Transient progress indicator, removed once its operation settles
    Loading { text: String },

    /// Raw reply payload for the rendering layer to stream as the overview
    Overview { raw: String },

    /// Outstanding clarifying questions
    Clarification { questions: QuestionSet },

    /// A recommendation set with its index-aligned enrichment details
    Products {
        recommendations: Vec<Recommendation>,
        details: Vec<ProductDetail>,
    },
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Message::User { text: text.into() }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Message::Assistant { text: text.into() }
    }

    pub fn loading(text: impl Into<String>) -> Self {
        Message::Loading { text: text.into() }
    }

    pub fn overview(raw: impl Into<String>) -> Self {
        Message::Overview { raw: raw.into() }
    }

    pub fn clarification(questions: QuestionSet) -> Self {
        Message::Clarification { questions }
    }

    pub fn products(recommendations: Vec<Recommendation>, details: Vec<ProductDetail>) -> Self {
        Message::Products {
            recommendations,
            details,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Message::Loading { .. })
    }
}

/// A message plus its creation time (epoch millis)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub message: Message,
    pub timestamp: i64,
}

/// Ordered, append-only message sequence
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    entries: Vec<Entry>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message, stamping it with the current time
    pub fn push(&mut self, message: Message) {
        self.entries.push(Entry {
            message,
            timestamp: Utc::now().timestamp_millis(),
        });
    }

    /// Drop every `Loading` entry, wherever it sits
    pub fn clear_loading(&mut self) {
        self.entries.retain(|entry| !entry.message.is_loading());
    }

    /// Drop everything (conversation reset)
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter().map(|entry| &entry.message)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.entries.last().map(|entry| &entry.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_appends_in_order() {
        let mut timeline = Timeline::new();
        timeline.push(Message::user("hi"));
        timeline.push(Message::assistant("hello"));

        let kinds: Vec<_> = timeline.messages().collect();
        assert_eq!(kinds.len(), 2);
        assert_eq!(kinds[0], &Message::user("hi"));
        assert_eq!(kinds[1], &Message::assistant("hello"));
    }

    #[test]
    fn test_clear_loading_removes_only_loading() {
        let mut timeline = Timeline::new();
        timeline.push(Message::user("hi"));
        timeline.push(Message::loading("Analyzing your needs..."));
        timeline.push(Message::overview("{}"));
        timeline.push(Message::loading("Fetching recommendation details..."));

        timeline.clear_loading();

        let remaining: Vec<_> = timeline.messages().collect();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().all(|m| !m.is_loading()));
    }

    #[test]
    fn test_clear_empties_the_timeline() {
        let mut timeline = Timeline::new();
        timeline.push(Message::user("hi"));
        timeline.clear();

        assert!(timeline.is_empty());
        assert!(timeline.last_message().is_none());
    }

    #[test]
    fn test_entries_carry_timestamps() {
        let mut timeline = Timeline::new();
        timeline.push(Message::user("hi"));

        assert!(timeline.entries()[0].timestamp > 0);
    }

    #[test]
    fn test_message_serializes_with_tag() {
        let value = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(value["type"], "user");
        assert_eq!(value["text"], "hi");

        let value = serde_json::to_value(Message::products(vec![], vec![])).unwrap();
        assert_eq!(value["type"], "products");
    }
}
