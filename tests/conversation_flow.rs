//! Integration tests for the conversation orchestration
//!
//! These drive the public surface end to end: controller, parser, poller,
//! and preference store against a scripted service implementation.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use shopagent::api::{
    ChatRequest, ChatResponse, DetailStatus, DetailsResponse, ModelChoice, ProductDetail, RequestError, ShopApi,
};
use shopagent::controller::{ControllerConfig, ConversationController, TurnOutcome};
use shopagent::timeline::Message;

// =============================================================================
// Scripted service
// =============================================================================

/// Queue-backed ShopApi: responses are consumed front to back
#[derive(Default)]
struct FlowApi {
    chat: Mutex<VecDeque<Result<ChatResponse, RequestError>>>,
    details: Mutex<VecDeque<Result<DetailsResponse, RequestError>>>,
    switches: Mutex<VecDeque<Result<(), RequestError>>>,
    chat_seen: Mutex<Vec<ChatRequest>>,
    details_seen: Mutex<Vec<String>>,
}

impl FlowApi {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn script_chat(&self, session: &str, response: &str) {
        self.chat.lock().unwrap().push_back(Ok(ChatResponse {
            session_id: Some(session.to_string()),
            response: response.to_string(),
        }));
    }

    fn script_chat_error(&self, status: u16) {
        self.chat.lock().unwrap().push_back(Err(RequestError::Status {
            status,
            message: "scripted failure".to_string(),
        }));
    }

    fn script_processing(&self) {
        self.details.lock().unwrap().push_back(Ok(DetailsResponse {
            status: DetailStatus::Processing,
            product_details: None,
        }));
    }

    fn script_completed(&self, details: Vec<ProductDetail>) {
        self.details.lock().unwrap().push_back(Ok(DetailsResponse {
            status: DetailStatus::Completed,
            product_details: Some(details),
        }));
    }

    fn chat_seen(&self) -> Vec<ChatRequest> {
        self.chat_seen.lock().unwrap().clone()
    }

    fn details_seen(&self) -> Vec<String> {
        self.details_seen.lock().unwrap().clone()
    }

    fn out_of_script() -> RequestError {
        RequestError::Status {
            status: 599,
            message: "out of script".to_string(),
        }
    }
}

#[async_trait]
impl ShopApi for FlowApi {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, RequestError> {
        self.chat_seen.lock().unwrap().push(request);
        self.chat
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Self::out_of_script()))
    }

    async fn product_details(&self, session_id: &str) -> Result<DetailsResponse, RequestError> {
        self.details_seen.lock().unwrap().push(session_id.to_string());
        self.details
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Self::out_of_script()))
    }

    async fn switch_model(&self, _session_id: &str, _model: ModelChoice) -> Result<(), RequestError> {
        self.switches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Self::out_of_script()))
    }
}

fn controller(api: Arc<FlowApi>) -> Arc<ConversationController> {
    Arc::new(ConversationController::new(api, ControllerConfig::default()))
}

fn controller_with_budget(api: Arc<FlowApi>, max_attempts: u32) -> Arc<ConversationController> {
    let config = ControllerConfig {
        poll_interval: Duration::from_secs(2),
        poll_max_attempts: max_attempts,
        ..ControllerConfig::default()
    };
    Arc::new(ConversationController::new(api, config))
}

const CLARIFICATION: &str = r#"{"type":"clarification","questions":{"Budget":{"question":"What is your budget?","options":["<1000","1000-1500"]}}}"#;

const RECOMMENDATION: &str =
    r#"{"overview":"Found one strong pick.","recommendations":[{"name":"X","price":1299,"pros":["battery"]}]}"#;

fn buy_link_detail() -> ProductDetail {
    ProductDetail {
        buy_links: vec![serde_json::json!({"retailer": "Shop", "url": "https://shop.example/x"})],
        reviews: None,
    }
}

// =============================================================================
// Turn branching
// =============================================================================

#[tokio::test]
async fn first_turn_requests_clarification() {
    let api = FlowApi::new();
    api.script_chat("s1", CLARIFICATION);
    let controller = controller(api.clone());

    let outcome = controller.submit_turn("Find laptops under $1500").await.unwrap();
    assert_eq!(outcome, TurnOutcome::Clarifying);

    // Dispatched as a fresh query
    let seen = api.chat_seen();
    assert_eq!(seen.len(), 1);
    assert!(!seen[0].is_followup);
    assert!(seen[0].preferences.is_empty());

    // Timeline: user echo, lead-in, the questions; no poll happened
    let snapshot = controller.snapshot().await;
    assert!(!snapshot.is_clarified);
    assert_eq!(snapshot.entries.len(), 3);
    assert!(matches!(snapshot.entries[2].message, Message::Clarification { .. }));
    assert!(api.details_seen().is_empty());
}

#[tokio::test]
async fn clarifying_turn_is_enhanced_and_consumes_tags() {
    let api = FlowApi::new();
    api.script_chat("s1", CLARIFICATION);
    api.script_chat("s1", RECOMMENDATION);
    api.script_completed(vec![buy_link_detail()]);
    let controller = controller(api.clone());

    controller.submit_turn("Find laptops under $1500").await.unwrap();
    controller.answer_clarification("Budget", "1000-1500").await;

    // Pure tag submission: empty text is valid while tags are pending
    let outcome = controller.submit_turn("").await.unwrap();
    assert_eq!(outcome, TurnOutcome::Recommended);

    let seen = api.chat_seen();
    assert_eq!(seen[1].message, "Budget: 1000-1500");
    assert!(!seen[1].is_followup);

    let snapshot = controller.snapshot().await;
    assert!(snapshot.displayed_preferences.is_empty());
    assert_eq!(
        snapshot.persisted_preferences.get("Budget").map(String::as_str),
        Some("1000-1500")
    );
}

#[tokio::test]
async fn recommendation_turn_joins_details_by_index() {
    let api = FlowApi::new();
    api.script_chat("s1", RECOMMENDATION);
    api.script_processing();
    api.script_completed(vec![buy_link_detail()]);
    let controller = controller(api.clone());

    tokio::time::pause();
    let outcome = controller.submit_turn("Find laptops under $1500").await.unwrap();
    assert_eq!(outcome, TurnOutcome::Recommended);

    let snapshot = controller.snapshot().await;
    assert!(snapshot.is_clarified);

    match &snapshot.entries.last().unwrap().message {
        Message::Products {
            recommendations,
            details,
        } => {
            assert_eq!(recommendations[0].name, "X");
            assert_eq!(
                details[0].buy_links,
                vec![serde_json::json!({"retailer": "Shop", "url": "https://shop.example/x"})]
            );
        }
        other => panic!("Expected products message, got {:?}", other),
    }

    // Both poll attempts went to the session the service assigned
    assert_eq!(api.details_seen(), vec!["s1", "s1"]);
}

#[tokio::test]
async fn clarified_turn_is_a_followup() {
    let api = FlowApi::new();
    api.script_chat("s1", RECOMMENDATION);
    api.script_completed(vec![]);
    api.script_chat("s1", RECOMMENDATION);
    api.script_completed(vec![]);
    let controller = controller(api.clone());

    controller.submit_turn("Find laptops under $1500").await.unwrap();
    controller.answer_clarification("Budget", "1000-1500").await;
    controller.submit_turn("lighter than 1.5kg").await.unwrap();

    let seen = api.chat_seen();
    assert!(seen[1].is_followup);
    assert_eq!(seen[1].message, "lighter than 1.5kg");
    assert_eq!(seen[1].preferences.get("Budget").map(String::as_str), Some("1000-1500"));
    assert_eq!(seen[1].session_id.as_deref(), Some("s1"));
}

#[tokio::test]
async fn empty_turn_without_tags_is_a_noop() {
    let api = FlowApi::new();
    let controller = controller(api.clone());

    let outcome = controller.submit_turn("  \t ").await.unwrap();

    assert_eq!(outcome, TurnOutcome::Ignored);
    assert!(api.chat_seen().is_empty());

    let snapshot = controller.snapshot().await;
    assert!(snapshot.entries.is_empty());
    assert!(!snapshot.loading);
}

// =============================================================================
// Failure paths
// =============================================================================

#[tokio::test]
async fn dispatch_failure_leaves_conversation_usable() {
    let api = FlowApi::new();
    api.script_chat_error(502);
    api.script_chat("s1", CLARIFICATION);
    let controller = controller(api.clone());

    let result = controller.submit_turn("Find laptops").await;
    assert!(result.is_err());

    let snapshot = controller.snapshot().await;
    assert!(snapshot.session_id.is_none());
    assert!(snapshot.last_error.is_some());
    assert!(!snapshot.loading);

    // The next attempt starts over cleanly
    let outcome = controller.submit_turn("Find laptops").await.unwrap();
    assert_eq!(outcome, TurnOutcome::Clarifying);
    let snapshot = controller.snapshot().await;
    assert!(snapshot.last_error.is_none());
}

#[tokio::test]
async fn poll_timeout_becomes_the_apology_path() {
    let api = FlowApi::new();
    api.script_chat("s1", RECOMMENDATION);
    api.script_processing();
    api.script_processing();
    api.script_processing();
    let controller = controller_with_budget(api.clone(), 3);

    tokio::time::pause();
    let outcome = controller.submit_turn("Find laptops").await.unwrap();
    assert_eq!(outcome, TurnOutcome::DetailsFailed);

    let snapshot = controller.snapshot().await;
    assert!(snapshot.is_clarified);
    assert!(snapshot.latest.is_none());
    match &snapshot.entries.last().unwrap().message {
        Message::Assistant { text } => assert!(text.contains("trouble retrieving")),
        other => panic!("Expected apology, got {:?}", other),
    }
    assert_eq!(api.details_seen().len(), 3);
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test(start_paused = true)]
async fn reset_discards_a_stale_poll_result() {
    let api = FlowApi::new();
    api.script_chat("s1", RECOMMENDATION);
    api.script_processing();
    api.script_completed(vec![buy_link_detail()]);
    let controller = controller(api.clone());

    // Drive the turn into the poller's sleep between attempts
    let turn = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.submit_turn("Find laptops").await })
    };
    tokio::task::yield_now().await;
    assert_eq!(api.details_seen().len(), 1);

    // Reset while the poll is suspended; the completed payload arrives later
    controller.reset_conversation().await;
    let outcome = turn.await.unwrap().unwrap();
    assert_eq!(outcome, TurnOutcome::Discarded);

    // Nothing from the stale turn reached the fresh conversation
    let snapshot = controller.snapshot().await;
    assert!(snapshot.entries.is_empty());
    assert!(snapshot.session_id.is_none());
    assert!(!snapshot.is_clarified);
    assert!(snapshot.latest.is_none());
}

#[tokio::test(start_paused = true)]
async fn turn_submitted_while_loading_is_ignored() {
    let api = FlowApi::new();
    api.script_chat("s1", RECOMMENDATION);
    api.script_processing();
    api.script_completed(vec![]);
    let controller = controller(api.clone());

    let turn = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.submit_turn("Find laptops").await })
    };
    tokio::task::yield_now().await;

    // The first turn is still polling
    let outcome = controller.submit_turn("another query").await.unwrap();
    assert_eq!(outcome, TurnOutcome::Ignored);

    let outcome = turn.await.unwrap().unwrap();
    assert_eq!(outcome, TurnOutcome::Recommended);
    assert_eq!(api.chat_seen().len(), 1);
}

// =============================================================================
// Reset invariants
// =============================================================================

#[tokio::test]
async fn reset_restores_the_initial_state() {
    let api = FlowApi::new();
    api.script_chat("s1", CLARIFICATION);
    let controller = controller(api.clone());

    controller.submit_turn("Find sunglasses under $100").await.unwrap();
    controller.answer_clarification("Style", "aviator").await;
    controller.reset_conversation().await;

    let snapshot = controller.snapshot().await;
    assert!(snapshot.session_id.is_none());
    assert!(!snapshot.is_clarified);
    assert!(snapshot.clarifying_questions.is_none());
    assert!(snapshot.persisted_preferences.is_empty());
    assert!(snapshot.displayed_preferences.is_empty());
    assert!(snapshot.entries.is_empty());

    // A fresh conversation dispatches as a new query again
    api.script_chat("s2", CLARIFICATION);
    controller.submit_turn("Find running shoes").await.unwrap();
    let seen = api.chat_seen();
    assert!(seen[1].session_id.is_none());
    assert!(!seen[1].is_followup);
}
