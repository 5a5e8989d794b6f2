//! The generation pipeline: scaffold, context and guidelines in, formatted
//! ChangeLog commit message out.

use tracing::{debug, info};

use crate::changelog::format::format_message;
use crate::changelog::scaffold::ScaffoldGenerator;
use crate::config::Config;
use crate::context::ContextCollector;
use crate::error::GenerateError;
use crate::guidelines::load_guidelines;
use crate::llm::{OutputBuffer, StreamSink};
use crate::prompt::build_prompt;

/// External collaborators of a generation.
pub struct Collaborators {
    pub scaffold: Box<dyn ScaffoldGenerator>,
    pub context: ContextCollector,
}

/// Build the prompt a generation would send.
pub fn prepare_prompt(
    config: &Config,
    collaborators: &Collaborators,
    use_all_visible: bool,
) -> Result<String, GenerateError> {
    let scaffold = collaborators.scaffold.scaffold()?;
    let context = collaborators.context.collect(use_all_visible);
    let guidelines = load_guidelines(
        config.policy_document_path.as_deref(),
        &config.guideline_heading,
    );

    let prompt = build_prompt(&guidelines, &config.prompt_addendum, &context, &scaffold);
    debug!(
        "Prompt built: {} chars ({} chars of context)",
        prompt.len(),
        context.len()
    );
    Ok(prompt)
}

/// Generate a ChangeLog commit message into `output`.
///
/// Model output streams into `output` as it arrives. When the stream
/// completes, the buffer is replaced with the formatted message. On any
/// error before streaming starts, `output` is left untouched; on a stream
/// failure it holds whatever arrived and is not formatted.
pub async fn generate(
    config: &Config,
    collaborators: &Collaborators,
    use_all_visible: bool,
    output: &mut OutputBuffer,
) -> Result<(), GenerateError> {
    let Some(model) = config.model.as_ref() else {
        return Err(GenerateError::NoModelConfigured);
    };

    let prompt = prepare_prompt(config, collaborators, use_all_visible)?;

    info!("Generating commit message with {}", model.name());
    output.clear();
    model.stream(&prompt, output).await?;

    let formatted = format_message(output.as_str(), &config.fill);
    output.replace(formatted);
    Ok(())
}
