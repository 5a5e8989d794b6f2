//! chlog - CLI entry point.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tempfile::NamedTempFile;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use chlog::changelog::FillOptions;
use chlog::config::{Config, resolve_policy_path, resolve_provider_selection};
use chlog::context::{ContextCollector, FencedFormatter, FileSources};
use chlog::git::GitScaffold;
use chlog::guidelines::DEFAULT_HEADING;
use chlog::prompt::DEFAULT_ADDENDUM;
use chlog::{Collaborators, GenerateError, OutputBuffer, format_message, generate, prepare_prompt};

/// Write a ChangeLog-style commit message for the staged changes.
#[derive(Parser, Debug)]
#[command(name = "chlog")]
#[command(about = "Write a ChangeLog-style commit message for the staged changes using an LLM")]
#[command(version)]
struct Cli {
    /// Include every visible source (see --visible) in the context, not just the diff
    #[arg(short = 'a', long)]
    all_visible: bool,

    /// A file visible to the model with --all-visible (repeatable)
    #[arg(long = "visible", value_name = "PATH")]
    visible: Vec<PathBuf>,

    /// LLM provider: claude or codex [env: CHLOG_PROVIDER]
    #[arg(long, value_name = "PROVIDER")]
    provider: Option<String>,

    /// Provider to use when the primary fails [env: CHLOG_FALLBACK]
    #[arg(long, value_name = "PROVIDER")]
    fallback: Option<String>,

    /// Model name passed to the provider CLI [env: CHLOG_MODEL]
    #[arg(long)]
    model: Option<String>,

    /// Policy document holding the guidelines [env: CHLOG_POLICY] (default: ./CONTRIBUTE)
    #[arg(long, value_name = "PATH")]
    policy: Option<PathBuf>,

    /// Level-2 heading of the guideline section
    #[arg(long, default_value = DEFAULT_HEADING)]
    heading: String,

    /// Extra instructions emphasized after the guidelines
    #[arg(long, conflicts_with = "no_addendum")]
    addendum: Option<String>,

    /// Send no extra instructions
    #[arg(long)]
    no_addendum: bool,

    /// Maximum width of ChangeLog entry lines
    #[arg(long, default_value_t = 72)]
    fill_column: usize,

    /// Maximum width of the summary line
    #[arg(long, default_value_t = 72)]
    summary_width: usize,

    /// Also write the message to this file
    #[arg(short = 'o', long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Print the prompt instead of generating
    #[arg(long)]
    print_prompt: bool,

    /// Reformat an existing message instead of generating (- for stdin)
    #[arg(long, value_name = "PATH", conflicts_with = "print_prompt")]
    reformat: Option<PathBuf>,

    /// Do not echo the model's output while it streams
    #[arg(short, long)]
    quiet: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the message
    let default_filter = if cli.verbose { "chlog=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let fill = FillOptions {
        summary_width: cli.summary_width,
        fill_column: cli.fill_column,
    };

    if let Some(path) = &cli.reformat {
        let raw = read_input(path)?;
        return emit(&format_message(&raw, &fill), cli.output.as_deref());
    }

    // Step 1: Resolve the model before touching git or the filesystem
    let selection = resolve_provider_selection(
        cli.provider.as_deref(),
        cli.fallback.as_deref(),
        cli.model.clone(),
    )
    .context("Invalid provider configuration")?;
    let model = selection.map(|s| s.build_client());

    if model.is_none() && !cli.print_prompt {
        return Err(GenerateError::NoModelConfigured.into());
    }

    // Step 2: Build the configuration and collaborators
    let cwd = std::env::current_dir().context("Failed to determine the working directory")?;
    let prompt_addendum = if cli.no_addendum {
        String::new()
    } else {
        cli.addendum.clone().unwrap_or_else(|| DEFAULT_ADDENDUM.to_string())
    };

    let config = Config {
        model,
        policy_document_path: resolve_policy_path(cli.policy.clone(), &cwd),
        guideline_heading: cli.heading.clone(),
        prompt_addendum,
        fill,
    };
    debug!("{:?}", config);

    let collaborators = Collaborators {
        scaffold: Box::new(GitScaffold::new(&cwd)),
        context: ContextCollector::new(
            Box::new(FileSources::new(cli.visible.clone())),
            Box::new(FencedFormatter::new(&cwd)),
        ),
    };

    if cli.print_prompt {
        let prompt = prepare_prompt(&config, &collaborators, cli.all_visible)
            .context("Failed to build the prompt")?;
        println!("{}", prompt);
        return Ok(());
    }

    // Step 3: Generate, echoing the raw stream to stderr
    let echo = !cli.quiet;
    let mut output = if echo {
        OutputBuffer::echoing(std::io::stderr())
    } else {
        OutputBuffer::new()
    };

    generate(&config, &collaborators, cli.all_visible, &mut output)
        .await
        .context("Failed to generate a commit message")?;

    if echo {
        eprintln!();
    }

    emit(output.as_str(), cli.output.as_deref())
}

/// Read the text to reformat from a file, or stdin for `-`.
fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Print the message and write it to `output` if requested.
fn emit(message: &str, output: Option<&Path>) -> Result<()> {
    print!("{}", message);
    std::io::stdout().flush().context("Failed to write to stdout")?;

    if let Some(path) = output {
        write_atomically(path, message)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!("Wrote message to {}", path.display());
    }
    Ok(())
}

/// Write through a temporary file in the same directory, then rename.
fn write_atomically(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents.as_bytes())?;
    file.persist(path)?;
    Ok(())
}
