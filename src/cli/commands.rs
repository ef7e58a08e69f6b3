//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Page through a JSON HTTP endpoint
#[derive(Parser, Debug)]
#[command(name = "pagestream")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch pages from an endpoint
    Fetch(FetchArgs),

    /// Validate a configuration file
    Validate,
}

/// Arguments of `fetch`; flags override the configuration file
#[derive(clap::Args, Debug, Default)]
pub struct FetchArgs {
    /// Endpoint URL
    #[arg(long)]
    pub url: Option<String>,

    /// Path to the records in the response body
    #[arg(long)]
    pub records_path: Option<String>,

    /// Query parameter carrying the cursor
    #[arg(long, requires = "cursor_path", conflicts_with_all = ["next_url_path", "link_header"])]
    pub cursor_param: Option<String>,

    /// Path of the cursor in the response body
    #[arg(long, requires = "cursor_param")]
    pub cursor_path: Option<String>,

    /// Path of the next page URL in the response body
    #[arg(long, conflicts_with = "link_header")]
    pub next_url_path: Option<String>,

    /// Follow the `Link: rel="next"` header
    #[arg(long)]
    pub link_header: bool,

    /// Query parameter for the first page (repeatable)
    #[arg(short, long = "param", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub params: Vec<(String, String)>,

    /// Maximum number of pages to request
    #[arg(long)]
    pub pages: Option<usize>,

    /// Keep showing the previous values until the first page arrives
    #[arg(long)]
    pub no_clear: bool,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}

/// Parse a `KEY=VALUE` pair
fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no `=` found in `{s}`"))?;
    if key.is_empty() {
        return Err(format!("invalid KEY=VALUE: empty key in `{s}`"));
    }
    Ok((key.to_string(), value.to_string()))
}
