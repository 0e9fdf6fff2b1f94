//! Recommendation service client
//!
//! The query dispatcher and transport layer: the [`ShopApi`] trait, its
//! reqwest implementation, and the wire types shared with the poller and
//! the conversation controller.

mod client;
mod error;
mod http;
mod types;

pub use client::ShopApi;
pub use error::RequestError;
pub use http::HttpShopApi;
pub use types::{
    ChatRequest, ChatResponse, DetailStatus, DetailsResponse, ModelChoice, ProductDetail, SwitchModelRequest,
};

#[cfg(test)]
pub(crate) use client::mock;
