//! ShopAgent - conversational shopping assistant client
//!
//! A user states a shopping need in free text; the recommendation service
//! may ask clarifying questions, then returns ranked products that are
//! enriched asynchronously with buy links and reviews. This crate is the
//! client side of that conversation: the orchestration state machine plus
//! a plain-text terminal front end.
//!
//! # Core Concepts
//!
//! - **Phase machine**: each turn is a new query, a follow-up, or a
//!   preference-enhanced refinement, decided by an explicit
//!   `Initial`/`Clarifying`/`Clarified` phase
//! - **Two-phase fetch**: recommendation text lands first, enrichment
//!   details are polled afterwards and joined by index
//! - **Two preference views**: `persisted` rides on every request,
//!   `displayed` is consumed by the next submission; both mutate in lockstep
//! - **Generation-counted cancellation**: resetting the conversation
//!   discards the effects of any in-flight dispatch or poll
//!
//! # Modules
//!
//! - [`api`] - ShopApi trait, reqwest client, wire types
//! - [`parser`] - embedded-JSON reply classification
//! - [`poller`] - bounded product-details polling
//! - [`controller`] - the conversation state machine
//! - [`prefs`], [`timeline`] - conversation state containers
//! - [`config`], [`cli`], [`repl`] - application shell

pub mod api;
pub mod cli;
pub mod config;
pub mod controller;
pub mod parser;
pub mod poller;
pub mod prefs;
pub mod repl;
pub mod timeline;

// Re-export commonly used types
pub use api::{ChatRequest, ChatResponse, HttpShopApi, ModelChoice, ProductDetail, RequestError, ShopApi};
pub use config::{ApiConfig, ChatConfig, Config};
pub use controller::{
    ControllerConfig, ConversationController, ConversationPhase, ConversationSnapshot, LatestRecommendations,
    TurnOutcome,
};
pub use parser::{ClarifyingQuestion, ParseError, ParsedReply, QuestionSet, Recommendation, parse_reply};
pub use poller::{DetailPoller, PollError};
pub use prefs::PreferenceStore;
pub use timeline::{Entry, Message, Timeline};
