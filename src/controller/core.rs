//! Conversation controller
//!
//! Owns session identity, the phase machine, both preference views, and the
//! message timeline. Mutable state lives behind a mutex so a host can share
//! the controller across tasks; lock sections never span a network await,
//! and the "drop loading entries, append result entries" sequence happens
//! under one lock acquisition.
//!
//! Cancellation is generation-based: `reset_conversation` bumps a counter,
//! and an in-flight turn re-checks it after every await. A turn that lost
//! the race discards its remaining effects instead of writing into the new
//! conversation's timeline.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::config::ControllerConfig;
use super::state::{ConversationPhase, ConversationSnapshot, LatestRecommendations};
use crate::api::{ChatRequest, ModelChoice, RequestError, ShopApi};
use crate::parser::{self, ParsedReply, Recommendation};
use crate::poller::DetailPoller;
use crate::prefs::PreferenceStore;
use crate::timeline::{Message, Timeline};

const LOADING_ANALYZING: &str = "Analyzing your needs...";
const LOADING_THINKING: &str = "AI is thinking...";
const LOADING_DETAILS: &str = "Fetching recommendation details...";
const CLARIFY_LEAD_IN: &str = "To help you find the perfect product, I need to know more about your preferences:";
const PRODUCTS_LEAD_IN: &str = "Here are some products I have found for you:";
const DETAILS_APOLOGY: &str =
    "I had trouble retrieving detailed product information. Please try again or refine your search.";

/// Which path a submitted turn took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Nothing to send, or a turn was already outstanding
    Ignored,

    /// The service asked clarifying questions
    Clarifying,

    /// Recommendations and their details landed on the timeline
    Recommended,

    /// Recommendations arrived but the detail phase failed (parse, poll,
    /// timeout, or unexpected status); the conversation stays clarified
    DetailsFailed,

    /// The conversation was reset while this turn was in flight; its
    /// remaining effects were dropped
    Discarded,
}

/// Mutable conversation state, serialized by the controller's mutex
#[derive(Debug)]
struct Inner {
    session_id: Option<String>,
    phase: ConversationPhase,
    prefs: PreferenceStore,
    timeline: Timeline,
    model: ModelChoice,
    loading: bool,
    last_error: Option<String>,
    latest: Option<LatestRecommendations>,
    generation: u64,
}

impl Inner {
    fn new(model: ModelChoice) -> Self {
        Self {
            session_id: None,
            phase: ConversationPhase::Initial,
            prefs: PreferenceStore::new(),
            timeline: Timeline::new(),
            model,
            loading: false,
            last_error: None,
            latest: None,
            generation: 0,
        }
    }
}

/// The conversation orchestration state machine
pub struct ConversationController {
    api: Arc<dyn ShopApi>,
    poller: DetailPoller,
    inner: Mutex<Inner>,
}

impl ConversationController {
    /// Create a controller for one conversation
    pub fn new(api: Arc<dyn ShopApi>, config: ControllerConfig) -> Self {
        let poller = DetailPoller::new(api.clone(), config.poll_interval, config.poll_max_attempts);
        Self {
            api,
            poller,
            inner: Mutex::new(Inner::new(config.model)),
        }
    }

    /// Submit one user turn
    ///
    /// Branches on the current phase: a fresh query when no session exists,
    /// a follow-up once recommendations have been produced, or a
    /// preference-enhanced query while clarifying. Empty input with no
    /// pending preference tags is a no-op.
    pub async fn submit_turn(&self, raw_text: &str) -> Result<TurnOutcome, RequestError> {
        let text = raw_text.trim().to_string();

        // Validate, echo the user message, stage the request
        let (generation, is_followup, request) = {
            let mut inner = self.inner.lock().await;

            if inner.loading {
                warn!("submit_turn: a turn is already outstanding, ignoring");
                return Ok(TurnOutcome::Ignored);
            }
            if text.is_empty() && inner.prefs.displayed_is_empty() {
                debug!("submit_turn: nothing to send");
                return Ok(TurnOutcome::Ignored);
            }

            inner.last_error = None;
            inner.loading = true;

            let enhanced = join_nonempty(&inner.prefs.summary(), &text);
            let echo = if inner.prefs.displayed_is_empty() {
                text.clone()
            } else {
                enhanced.clone()
            };
            inner.timeline.push(Message::user(echo));

            let (message, preferences, is_followup) = if inner.phase.is_initial() {
                (text.clone(), BTreeMap::new(), false)
            } else if inner.phase.is_clarified() {
                (text.clone(), inner.prefs.persisted().clone(), true)
            } else {
                // Clarifying: fold collected preferences into the message,
                // consume the pending tags, keep the persisted view
                inner.prefs.clear_displayed();
                (enhanced, inner.prefs.persisted().clone(), false)
            };

            inner.timeline.push(Message::loading(if is_followup {
                LOADING_THINKING
            } else {
                LOADING_ANALYZING
            }));

            let request = ChatRequest {
                message,
                preferences,
                session_id: inner.session_id.clone(),
                is_followup,
                model_choice: inner.model,
            };
            (inner.generation, is_followup, request)
        };

        debug!(is_followup, "submit_turn: dispatching");
        let result = self.api.chat(request).await;

        // Apply the dispatch outcome
        let (session_id, items) = {
            let mut inner = self.inner.lock().await;
            if inner.generation != generation {
                debug!("submit_turn: conversation reset mid-dispatch, discarding");
                return Ok(TurnOutcome::Discarded);
            }
            inner.timeline.clear_loading();

            let reply = match result {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(error = %e, "submit_turn: dispatch failed");
                    inner.loading = false;
                    inner.last_error = Some(format!("Error: {}", e));
                    return Err(e);
                }
            };

            if let Some(id) = &reply.session_id {
                if let Some(current) = &inner.session_id
                    && current != id
                {
                    warn!(%current, reassigned = %id, "submit_turn: service reassigned session id");
                }
                inner.session_id = Some(id.clone());
            }

            // One parse serves the clarification probe and the
            // recommendation extraction; a failure here fails open toward
            // the recommendation path
            let items: Result<Vec<Recommendation>, _> = match parser::parse_reply(&reply.response) {
                Ok(ParsedReply::Clarification(questions)) => {
                    info!(question_count = questions.len(), "submit_turn: clarification requested");
                    inner.phase.begin_clarifying(questions.clone());
                    inner.timeline.push(Message::assistant(CLARIFY_LEAD_IN));
                    inner.timeline.push(Message::clarification(questions));
                    inner.loading = false;
                    return Ok(TurnOutcome::Clarifying);
                }
                Ok(ParsedReply::Recommendations { items, .. }) => Ok(items),
                Err(e) => Err(e),
            };

            inner.phase.mark_clarified();
            inner.timeline.push(Message::overview(reply.response.clone()));

            let Some(session_id) = inner.session_id.clone() else {
                // No session to enrich against; nothing to poll
                warn!("submit_turn: no session id after dispatch, skipping details");
                inner.timeline.push(Message::assistant(DETAILS_APOLOGY));
                inner.loading = false;
                return Ok(TurnOutcome::DetailsFailed);
            };

            let items = match items {
                Ok(items) => items,
                Err(e) => {
                    warn!(error = %e, "submit_turn: recommendation payload unparseable");
                    inner.timeline.push(Message::assistant(DETAILS_APOLOGY));
                    inner.loading = false;
                    return Ok(TurnOutcome::DetailsFailed);
                }
            };

            inner.timeline.push(Message::loading(LOADING_DETAILS));
            (session_id, items)
        };

        info!(item_count = items.len(), "submit_turn: recommendations received, polling details");
        let poll = self.poller.wait_for_details(&session_id).await;

        // Apply the poll outcome
        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            debug!("submit_turn: conversation reset mid-poll, discarding");
            return Ok(TurnOutcome::Discarded);
        }
        inner.timeline.clear_loading();
        inner.loading = false;

        match poll {
            Ok(details) => {
                inner.timeline.push(Message::assistant(PRODUCTS_LEAD_IN));
                inner
                    .timeline
                    .push(Message::products(items.clone(), details.clone()));
                inner.latest = Some(LatestRecommendations { items, details });
                Ok(TurnOutcome::Recommended)
            }
            Err(e) => {
                warn!(error = %e, "submit_turn: detail poll failed");
                inner.timeline.push(Message::assistant(DETAILS_APOLOGY));
                Ok(TurnOutcome::DetailsFailed)
            }
        }
    }

    /// Record an answer to a clarifying question in both preference views
    pub async fn answer_clarification(&self, category: impl Into<String>, answer: impl Into<String>) {
        let mut inner = self.inner.lock().await;
        inner.prefs.set(category, answer);
    }

    /// Remove a preference category from both views
    pub async fn remove_preference(&self, category: &str) {
        let mut inner = self.inner.lock().await;
        inner.prefs.remove(category);
    }

    /// Switch the backing model
    ///
    /// Before a session exists this only records the choice. With an active
    /// session the service is asked first; on failure the recorded model is
    /// left unchanged.
    pub async fn switch_model(&self, model: ModelChoice) -> Result<(), RequestError> {
        let (generation, session_id) = {
            let inner = self.inner.lock().await;
            (inner.generation, inner.session_id.clone())
        };

        let Some(session_id) = session_id else {
            let mut inner = self.inner.lock().await;
            inner.model = model;
            debug!(%model, "switch_model: no session, recorded for next dispatch");
            return Ok(());
        };

        match self.api.switch_model(&session_id, model).await {
            Ok(()) => {
                let mut inner = self.inner.lock().await;
                if inner.generation == generation {
                    inner.model = model;
                    inner
                        .timeline
                        .push(Message::assistant(format!("AI model switched to {}.", model.display_name())));
                    info!(%model, "switch_model: switched");
                }
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "switch_model: service call failed");
                let mut inner = self.inner.lock().await;
                if inner.generation == generation {
                    inner.last_error = Some(format!("Error: {}", e));
                }
                Err(e)
            }
        }
    }

    /// Discard the conversation: session, preferences, questions, timeline
    ///
    /// Bumps the generation counter first so any in-flight dispatch or poll
    /// discards its late result instead of applying it.
    pub async fn reset_conversation(&self) {
        let mut inner = self.inner.lock().await;
        inner.generation += 1;
        inner.session_id = None;
        inner.phase.reset();
        inner.prefs.clear();
        inner.timeline.clear();
        inner.loading = false;
        inner.last_error = None;
        inner.latest = None;
        info!(generation = inner.generation, "reset_conversation: cleared");
    }

    /// Clone the render-facing view of the conversation
    pub async fn snapshot(&self) -> ConversationSnapshot {
        let inner = self.inner.lock().await;
        ConversationSnapshot {
            session_id: inner.session_id.clone(),
            is_clarified: inner.phase.is_clarified(),
            clarifying_questions: inner.phase.questions().cloned(),
            persisted_preferences: inner.prefs.persisted().clone(),
            displayed_preferences: inner.prefs.displayed().clone(),
            model: inner.model,
            loading: inner.loading,
            last_error: inner.last_error.clone(),
            entries: inner.timeline.entries().to_vec(),
            latest: inner.latest.clone(),
        }
    }
}

/// Join the preference summary and the user text, dropping empty parts
fn join_nonempty(summary: &str, text: &str) -> String {
    [summary, text]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}
