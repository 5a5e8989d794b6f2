//! Run configuration.
//!
//! Settings resolve as command-line flag, then environment variable, then
//! default. The result is an explicit [`Config`] passed to generation.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::changelog::FillOptions;
use crate::error::ConfigError;
use crate::guidelines::DEFAULT_HEADING;
use crate::llm::{ModelClient, Provider, ProviderSelection};
use crate::prompt::DEFAULT_ADDENDUM;

/// Environment variable naming the primary provider.
pub const PROVIDER_ENV_VAR: &str = "CHLOG_PROVIDER";
/// Environment variable naming the fallback provider.
pub const FALLBACK_ENV_VAR: &str = "CHLOG_FALLBACK";
/// Environment variable naming the model to request.
pub const MODEL_ENV_VAR: &str = "CHLOG_MODEL";
/// Environment variable pointing at the policy document.
pub const POLICY_ENV_VAR: &str = "CHLOG_POLICY";

/// Policy document looked up in the working directory when none is given.
pub const DEFAULT_POLICY_FILE: &str = "CONTRIBUTE";

/// Everything a generation needs besides its collaborators.
#[derive(Clone)]
pub struct Config {
    /// Required at generation time; there is no default model.
    pub model: Option<Arc<dyn ModelClient>>,
    pub policy_document_path: Option<PathBuf>,
    pub guideline_heading: String,
    pub prompt_addendum: String,
    pub fill: FillOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: None,
            policy_document_path: None,
            guideline_heading: DEFAULT_HEADING.to_string(),
            prompt_addendum: DEFAULT_ADDENDUM.to_string(),
            fill: FillOptions::default(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("model", &self.model.as_ref().map(|m| m.name()))
            .field("policy_document_path", &self.policy_document_path)
            .field("guideline_heading", &self.guideline_heading)
            .field("prompt_addendum_len", &self.prompt_addendum.len())
            .field("fill", &self.fill)
            .finish()
    }
}

/// Read a non-empty environment variable.
fn env_setting(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

/// Provider named by `flag`, or by `env_var` when the flag is absent.
///
/// An unknown name on the command line is an error; an unknown name in the
/// environment is logged and ignored.
fn resolve_provider(flag: Option<&str>, env_var: &str) -> Result<Option<Provider>, ConfigError> {
    if let Some(name) = flag {
        return name.parse().map(Some);
    }

    match env_setting(env_var) {
        Some(name) => match name.parse() {
            Ok(provider) => Ok(Some(provider)),
            Err(_) => {
                warn!("Invalid {} value '{}', ignoring it", env_var, name);
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

/// Resolve the provider selection from flags and environment.
///
/// Returns `Ok(None)` when no provider is configured anywhere.
pub fn resolve_provider_selection(
    provider: Option<&str>,
    fallback: Option<&str>,
    model: Option<String>,
) -> Result<Option<ProviderSelection>, ConfigError> {
    let Some(primary) = resolve_provider(provider, PROVIDER_ENV_VAR)? else {
        debug!("No provider configured");
        return Ok(None);
    };
    let fallback = resolve_provider(fallback, FALLBACK_ENV_VAR)?;
    let model = model.or_else(|| env_setting(MODEL_ENV_VAR));

    ProviderSelection::new(primary, fallback, model).map(Some)
}

/// Resolve the policy document: `flag`, then `CHLOG_POLICY`, then
/// `CONTRIBUTE` in `dir` if that file exists.
pub fn resolve_policy_path(flag: Option<PathBuf>, dir: &Path) -> Option<PathBuf> {
    if let Some(path) = flag {
        return Some(path);
    }
    if let Some(path) = env_setting(POLICY_ENV_VAR) {
        return Some(PathBuf::from(path));
    }

    let candidate = dir.join(DEFAULT_POLICY_FILE);
    if candidate.is_file() {
        debug!("Using policy document {}", candidate.display());
        Some(candidate)
    } else {
        None
    }
}
