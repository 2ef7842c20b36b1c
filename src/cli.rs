//! Command-line interface definitions for Awful Headlines.
//!
//! Global options configure providers and output; the subcommand picks what
//! to do. Keys can come from flags, environment variables, or the config file.

use crate::models::Category;
use crate::session::Layout;
use clap::{Args, Parser, Subcommand};

/// Command-line arguments for Awful Headlines.
///
/// # Examples
///
/// ```sh
/// # One page of business headlines using keys from the environment
/// NEWSAPI_KEYS=key1,key2 MEDIASTACK_KEY=key3 awful_headlines browse -c business
///
/// # Interactive browsing with a config file and JSON snapshots
/// awful_headlines --config ./config.yaml -j ./pages browse --interactive
///
/// # Send feedback
/// awful_headlines feedback --email me@example.com --message "More science please"
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to config.yaml file
    #[arg(long, global = true, env = "AWFUL_HEADLINES_CONFIG")]
    pub config: Option<String>,

    /// NewsAPI key; repeat or comma-separate to configure rotation order
    #[arg(
        long = "newsapi-key",
        global = true,
        env = "NEWSAPI_KEYS",
        value_delimiter = ',',
        hide_env_values = true
    )]
    pub newsapi_keys: Vec<String>,

    /// Mediastack access key
    #[arg(long, global = true, env = "MEDIASTACK_KEY", hide_env_values = true)]
    pub mediastack_key: Option<String>,

    /// Endpoint that receives feedback posts
    #[arg(long, global = true, env = "FEEDBACK_URL")]
    pub feedback_url: Option<String>,

    /// Show providers side by side ("regions") or as one list ("merged")
    #[arg(long, global = true)]
    pub layout: Option<Layout>,

    /// Retries for the single-key provider on transient failures
    #[arg(long, global = true)]
    pub retries: Option<usize>,

    /// Also write every rendered page as JSON under this directory
    #[arg(short, long, global = true)]
    pub json_output_dir: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show headlines (the default)
    Browse(BrowseArgs),
    /// Submit feedback to the configured endpoint
    Feedback {
        #[arg(long)]
        email: String,
        #[arg(long)]
        message: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct BrowseArgs {
    /// Category filter ("all" for no filter)
    #[arg(short, long, default_value = "all")]
    pub category: Category,

    /// Page to start on (1-based)
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,

    /// Keep reading commands from stdin after the first page
    #[arg(short, long)]
    pub interactive: bool,
}

impl Default for BrowseArgs {
    fn default() -> Self {
        Self {
            category: Category::All,
            page: 1,
            interactive: false,
        }
    }
}

impl Cli {
    /// The subcommand, defaulting to a one-shot `browse`.
    pub fn command(&self) -> Command {
        match &self.command {
            Some(Command::Browse(args)) => Command::Browse(args.clone()),
            Some(Command::Feedback { email, message }) => Command::Feedback {
                email: email.clone(),
                message: message.clone(),
            },
            None => Command::Browse(BrowseArgs::default()),
        }
    }
}
