// Entrypoint for the chat CLI.
// - Keeps `main` small: logging, configuration, then the interactive session.
// - Login failures exit with status 1; quitting or Ctrl+C exit with 0.

use chat_cli::{config::Config, ui};
use std::io;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Logs go to stderr so they never mix with the chat transcript. Use
/// RUST_LOG to change the level (e.g. RUST_LOG=chat_cli=debug).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn main() -> anyhow::Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = Config::from_env()?;
    ui::run(&config)
}
