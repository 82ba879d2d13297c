//! Model registry: which LLM service handles which job

use super::{AnthropicService, LlmService, LoggingService};
use std::sync::Arc;

pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20240620";

/// Configuration for LLM providers
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub anthropic_api_key: Option<String>,
    /// Optional proxy base URL in front of the Anthropic API
    pub gateway: Option<String>,
    pub coach_model: Option<String>,
    pub sentiment_model: Option<String>,
    pub sentiment_enabled: bool,
}

impl LlmConfig {
    /// Build from any variable source, e.g. the process environment
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            anthropic_api_key: lookup("ANTHROPIC_API_KEY").filter(|k| !k.is_empty()),
            gateway: lookup("LLM_GATEWAY").filter(|g| !g.is_empty()),
            coach_model: lookup("STEPCOACH_MODEL"),
            sentiment_model: lookup("STEPCOACH_SENTIMENT_MODEL"),
            sentiment_enabled: lookup("STEPCOACH_SENTIMENT")
                .map_or(true, |v| !v.eq_ignore_ascii_case("off")),
        }
    }
}

/// The two model roles a coaching turn uses
pub struct ModelRegistry {
    coach: Option<Arc<dyn LlmService>>,
    sentiment: Option<Arc<dyn LlmService>>,
}

impl ModelRegistry {
    pub fn new(config: &LlmConfig) -> Self {
        let Some(api_key) = config.anthropic_api_key.clone() else {
            return Self::new_empty();
        };

        let coach_model = config.coach_model.as_deref().unwrap_or(DEFAULT_MODEL);
        let coach = Self::try_create(&api_key, coach_model, config.gateway.as_deref());

        let sentiment = if config.sentiment_enabled {
            match config.sentiment_model.as_deref() {
                Some(model) if model != coach_model => {
                    Self::try_create(&api_key, model, config.gateway.as_deref())
                }
                _ => coach.clone(),
            }
        } else {
            None
        };

        Self { coach, sentiment }
    }

    /// Registry with no services, used when no API key is configured
    pub fn new_empty() -> Self {
        Self {
            coach: None,
            sentiment: None,
        }
    }

    fn try_create(api_key: &str, model: &str, gateway: Option<&str>) -> Option<Arc<dyn LlmService>> {
        match AnthropicService::new(api_key.to_string(), model, gateway) {
            Ok(service) => Some(Arc::new(LoggingService::new(Arc::new(service)))),
            Err(e) => {
                tracing::error!(model = %model, error = %e, "Failed to create LLM client");
                None
            }
        }
    }

    pub fn coach(&self) -> Option<Arc<dyn LlmService>> {
        self.coach.clone()
    }

    pub fn sentiment(&self) -> Option<Arc<dyn LlmService>> {
        self.sentiment.clone()
    }

    pub fn has_models(&self) -> bool {
        self.coach.is_some()
    }

    pub fn coach_model_id(&self) -> Option<&str> {
        self.coach.as_deref().map(LlmService::model_id)
    }
}
