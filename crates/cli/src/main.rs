//! Dialogue Loop CLI
//!
//! A thin wrapper around dialogue-loop-core: builds the understanding, policy
//! and generation components and talks to the user at the terminal.

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use dialogue_loop_core::{DialogueConfig, DialogueSession};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "dialogue-loop")]
#[command(about = "Talk to a pipeline of understanding, policy and generation components")]
struct Args {
    /// Run a single turn for this utterance instead of the interactive loop
    utterance: Option<String>,

    /// Path to a TOML config selecting a backend per component
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use the built-in stub components regardless of config
    #[arg(long = "stub")]
    use_stub: bool,

    /// Enable verbose debug output
    #[arg(long, short = 'v')]
    verbose: bool,
}

// ============================================================================
// Setup
// ============================================================================

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "warn,dialogue_loop_core=debug,dialogue_loop=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// With `--stub` the config file is never read
fn resolve_config(explicit: Option<&Path>, use_stub: bool) -> Result<DialogueConfig> {
    if use_stub {
        tracing::info!("--stub given, ignoring config file");
        return Ok(DialogueConfig::default());
    }
    DialogueConfig::load_or_default(explicit).context("Failed to load config")
}

/// Build all three components; any failure aborts before the loop starts
fn build_session(config: &DialogueConfig) -> Result<DialogueSession> {
    tracing::info!(backend = %config.nlu, "loading understanding component");
    let nlu = config
        .build_understanding()
        .context("Failed to load understanding component")?;

    tracing::info!(backend = %config.policy, "loading policy component");
    let policy = config
        .build_policy()
        .context("Failed to load policy component")?;

    tracing::info!(backend = %config.nlg, "loading generation component");
    let nlg = config
        .build_generator()
        .context("Failed to load generation component")?;

    Ok(DialogueSession::new(nlu, policy, nlg))
}

fn print_setup_hints() {
    eprintln!("Please check the component configuration and that any HTTP services are running.");
    if let Some(path) = DialogueConfig::default_path() {
        eprintln!("Default config location: {}", path.display());
    }
    eprintln!("Run with --stub to use the built-in stub components.");
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    // Load environment variables from .env file (if present)
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(args.verbose);

    println!("Welcome to the dialogue-loop demo!");
    println!("Initializing dialogue components...");

    let mut session = resolve_config(args.config.as_deref(), args.use_stub)
        .and_then(|config| build_session(&config))
        .map_err(|e| {
            print_setup_hints();
            e.context("Error initializing dialogue components")
        })?;

    // Single-shot mode: one turn, with the acts shown as JSON
    if let Some(ref utterance) = args.utterance {
        session.start();
        let outcome = session.handle_turn(utterance);
        let trace = session.trace();

        println!("User acts:");
        println!("{}", serde_json::to_string_pretty(&trace.user_acts)?);
        println!("\nSystem acts:");
        println!("{}", serde_json::to_string_pretty(&trace.system_acts)?);
        println!("\n{}", outcome);
        return Ok(());
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    session
        .run(stdin.lock(), stdout.lock())
        .context("Terminal I/O failed")?;

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use dialogue_loop_core::{ComponentConfig, EndpointConfig, TurnOutcome};

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_interactive_defaults() {
        let args = Args::try_parse_from(["dialogue-loop"]).unwrap();
        assert!(args.utterance.is_none());
        assert!(args.config.is_none());
        assert!(!args.use_stub);
        assert!(!args.verbose);
    }

    #[test]
    fn test_parse_single_shot() {
        let args = Args::try_parse_from([
            "dialogue-loop",
            "I want a cheap hotel",
            "--config",
            "demo.toml",
            "--stub",
            "-v",
        ])
        .unwrap();
        assert_eq!(args.utterance.as_deref(), Some("I want a cheap hotel"));
        assert_eq!(args.config, Some(PathBuf::from("demo.toml")));
        assert!(args.use_stub);
        assert!(args.verbose);
    }

    #[test]
    fn test_stub_flag_ignores_broken_config() {
        let path = std::env::temp_dir().join("dialogue_loop_cli_broken_config.toml");
        std::fs::write(&path, "[nlg]\nbackend = \"http\"\nurl = \"\"\n").unwrap();

        let config = resolve_config(Some(&path), true).unwrap();
        assert_eq!(config, DialogueConfig::default());

        let err = resolve_config(Some(&path), false).unwrap_err();
        assert!(format!("{:#}", err).contains("[nlg]"));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_build_session_from_stubs() {
        let mut session = build_session(&DialogueConfig::default()).unwrap();
        session.start();
        assert!(!session.handle_turn("hello").is_terminal());
        assert_eq!(session.handle_turn("BYE"), TurnOutcome::Terminated);
    }

    #[test]
    fn test_build_session_rejects_bad_endpoint() {
        let config = DialogueConfig {
            nlg: ComponentConfig::Http(EndpointConfig::new("nowhere")),
            ..Default::default()
        };
        let err = build_session(&config).err().unwrap();
        assert!(err.to_string().contains("generation component"));
    }
}
