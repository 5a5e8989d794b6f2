//! Provider selection and fallback orchestration.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::claude::ClaudeClient;
use crate::codex::CodexClient;
use crate::error::{ConfigError, ModelError};
use crate::llm::client::{ModelClient, StreamSink};
use crate::llm::retry::RetryingClient;

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Claude,
    Codex,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Claude => "Claude",
            Provider::Codex => "Codex",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "claude" => Ok(Provider::Claude),
            "codex" => Ok(Provider::Codex),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

/// Primary provider plus an optional fallback, and the model name to request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSelection {
    pub primary: Provider,
    pub fallback: Option<Provider>,
    pub model: Option<String>,
}

impl ProviderSelection {
    pub fn new(
        primary: Provider,
        fallback: Option<Provider>,
        model: Option<String>,
    ) -> Result<Self, ConfigError> {
        if fallback == Some(primary) {
            return Err(ConfigError::FallbackSameAsPrimary(primary.to_string()));
        }
        Ok(Self {
            primary,
            fallback,
            model,
        })
    }

    /// Build the client stack: each provider retried with backoff, wrapped in
    /// a fallback when a second provider is selected.
    ///
    /// The model name applies to the primary provider only; the fallback
    /// uses its own default model.
    pub fn build_client(&self) -> Arc<dyn ModelClient> {
        let primary = provider_client(self.primary, self.model.clone());
        match self.fallback {
            Some(fallback) => Arc::new(FallbackClient::new(
                primary,
                provider_client(fallback, None),
            )),
            None => primary,
        }
    }
}

fn provider_client(provider: Provider, model: Option<String>) -> Arc<dyn ModelClient> {
    match provider {
        Provider::Claude => Arc::new(RetryingClient::new(ClaudeClient::new(model))),
        Provider::Codex => Arc::new(RetryingClient::new(CodexClient::new(model))),
    }
}

/// Streams from the primary client, falling back to the second on failure.
///
/// Output from a failed primary attempt is discarded before the fallback
/// starts streaming.
pub struct FallbackClient {
    primary: Arc<dyn ModelClient>,
    fallback: Arc<dyn ModelClient>,
}

impl FallbackClient {
    pub fn new(primary: Arc<dyn ModelClient>, fallback: Arc<dyn ModelClient>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl ModelClient for FallbackClient {
    fn name(&self) -> String {
        format!("{} (fallback: {})", self.primary.name(), self.fallback.name())
    }

    async fn stream(&self, prompt: &str, sink: &mut dyn StreamSink) -> Result<(), ModelError> {
        let primary_error = match self.primary.stream(prompt, sink).await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        warn!(
            "{} failed ({}), falling back to {}",
            self.primary.name(),
            primary_error,
            self.fallback.name()
        );
        sink.clear();

        match self.fallback.stream(prompt, sink).await {
            Ok(()) => Ok(()),
            Err(fallback_error) => Err(ModelError::AllProvidersFailed {
                primary: self.primary.name(),
                primary_error: Box::new(primary_error),
                fallback: self.fallback.name(),
                fallback_error: Box::new(fallback_error),
            }),
        }
    }
}
