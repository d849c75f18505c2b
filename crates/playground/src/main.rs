//! Playground - run a script and print its captured console output.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use playground::config::DEFAULT_HOST_ORIGIN;
use playground::{CaptureMode, MemoryNotifier, Playground, PlaygroundConfig};
use playground_security::PLAYGROUND_SANDBOX;

/// Playground - run JavaScript and capture its console output
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Script to run (defaults to the playground's starter code)
    file: Option<PathBuf>,

    /// Capture strategy
    #[arg(long, value_enum, default_value_t = CaptureMode::Direct)]
    mode: CaptureMode,

    /// Sandbox attribute for the isolated frame
    #[arg(long, default_value = PLAYGROUND_SANDBOX)]
    sandbox: String,

    /// Origin of the hosting page
    #[arg(long, default_value = DEFAULT_HOST_ORIGIN)]
    host_origin: String,

    /// Run the script this many times, clearing the console in between
    #[arg(long, default_value = "1")]
    repeat: u32,

    /// Suppress notifications
    #[arg(long)]
    quiet: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; RUST_LOG overrides --verbose.
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Playground v{}", playground::VERSION);

    let config = PlaygroundConfig::new()
        .with_mode(args.mode)
        .with_sandbox(&args.sandbox)
        .with_host_origin(&args.host_origin)
        .with_notifications(!args.quiet);

    let notifier = MemoryNotifier::new();
    let mut session = Playground::new(config)?.with_notifier(notifier.clone());

    if let Some(path) = &args.file {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        session.set_source(source);
    }

    for run in 1..=args.repeat.max(1) {
        if run > 1 {
            session.clear_console();
        }
        session.run().await;
        session.poll_messages();

        if args.repeat > 1 {
            println!("--- run {} ---", run);
        }
        for line in session.output() {
            println!("{}", line);
        }
        if session.output().is_empty() {
            println!("{}", playground::log::EMPTY_PLACEHOLDER);
        }
        println!("({})", session.output().summary());

        for notification in notifier.drain() {
            eprintln!("[{}] {}", notification.color, notification);
        }
    }

    Ok(())
}
