//! # Awful Headlines
//!
//! Browse top headlines from two news providers side by side, with
//! pagination, category filtering, and a feedback form.
//!
//! ## Features
//!
//! - NewsAPI with several API keys, rotated in order when one fails
//! - Mediastack with a single key and optional retries with backoff
//! - Category filter and paging, shared by both providers
//! - Debounced category changes in interactive mode
//! - Optional JSON snapshots of every rendered page
//! - Feedback submission with local validation
//!
//! ## Usage
//!
//! ```sh
//! NEWSAPI_KEYS=k1,k2,k3 MEDIASTACK_KEY=k4 awful_headlines browse -c science -i
//! ```
//!
//! ## Architecture
//!
//! 1. **Configuration**: YAML file, then flags and environment variables
//! 2. **Session**: owns providers, rotation cursor, pagination, and category
//! 3. **Front end**: one-shot page, or the interactive loop in [`repl`]
//! 4. **Output**: render sinks in [`outputs`] (terminal cards, JSON snapshots)

use clap::Parser;
use std::error::Error;
use tokio::io::BufReader;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod debounce;
mod error;
mod feedback;
mod models;
mod outputs;
mod pagination;
mod providers;
mod repl;
mod rotation;
mod session;
mod utils;

use api::{HttpTransport, ReqwestTransport};
use cli::{BrowseArgs, Cli, Command};
use config::NewsConfig;
use error::FeedbackError;
use feedback::{FeedbackClient, FeedbackForm};
use outputs::RenderSink;
use outputs::cards::TerminalSink;
use outputs::json::JsonSnapshotSink;
use session::{Command as SessionCommand, FEEDBACK_FAILED_MESSAGE, FEEDBACK_OK_MESSAGE, Session};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("awful_headlines starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.config, ?args.layout, ?args.json_output_dir, "Parsed CLI arguments");

    // --- Configuration ---
    let mut config = NewsConfig::load(args.config.as_deref())
        .await
        .inspect_err(|e| error!(error = %e, "Failed to load configuration"))?;
    config.apply_cli(&args);

    let transport = ReqwestTransport::new(config.request_timeout())?;
    let mut terminal = TerminalSink::new(std::io::stdout());

    match args.command() {
        Command::Browse(browse_args) => {
            let mut session = config
                .build_session(transport)
                .inspect_err(|e| error!(error = %e, "Cannot start a browsing session"))?;
            session.set_position(browse_args.category, browse_args.page);

            match &args.json_output_dir {
                Some(dir) => {
                    let sink = JsonSnapshotSink::create(terminal, dir).await.inspect_err(|e| {
                        error!(
                            path = %dir,
                            error = %e,
                            "JSON output directory is not writable (fix perms or choose a different path)"
                        )
                    })?;
                    browse(&mut session, &browse_args, sink, &config).await?;
                }
                None => browse(&mut session, &browse_args, &mut terminal, &config).await?,
            }
        }
        Command::Feedback { email, message } => {
            let client = FeedbackClient::new(url::Url::parse(&config.feedback_url)?);
            let form = FeedbackForm::new(email, message);
            if let Err(e) = client.submit(&transport, &form).await {
                match e {
                    FeedbackError::InvalidEmail | FeedbackError::TooShort { .. } => {
                        terminal.notify(&e.to_string())
                    }
                    _ => terminal.notify(FEEDBACK_FAILED_MESSAGE),
                }
                return Err(e.into());
            }
            terminal.notify(FEEDBACK_OK_MESSAGE);
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}

/// Show one page, or hand over to the interactive loop.
async fn browse<T, S>(
    session: &mut Session<T>,
    args: &BrowseArgs,
    mut sink: S,
    config: &NewsConfig,
) -> Result<(), Box<dyn Error>>
where
    T: HttpTransport,
    S: RenderSink,
{
    if args.interactive {
        info!(layout = %config.layout, "Entering interactive mode");
        repl::run(
            session,
            BufReader::new(tokio::io::stdin()),
            sink,
            config.debounce_delay(),
        )
        .await?;
    } else {
        session.handle(SessionCommand::Load, &mut sink).await;
    }
    Ok(())
}
