//! Controller configuration

use std::time::Duration;

use crate::api::ModelChoice;
use crate::config::Config;

/// Tunables for a conversation controller
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Backing model for new conversations
    pub model: ModelChoice,

    /// Delay between product-details polls
    pub poll_interval: Duration,

    /// Product-details polls before giving up on a session
    pub poll_max_attempts: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            model: ModelChoice::default(),
            poll_interval: Duration::from_secs(2),
            poll_max_attempts: 150,
        }
    }
}

impl ControllerConfig {
    /// Derive controller tunables from the application config
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.chat.model,
            poll_interval: Duration::from_millis(config.api.poll_interval_ms),
            poll_max_attempts: config.api.poll_max_attempts,
        }
    }
}
