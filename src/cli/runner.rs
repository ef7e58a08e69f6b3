//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, FetchArgs, OutputFormat};
use crate::config::{load_config, Config, SourceConfig};
use crate::engine::Paginator;
use crate::error::{Error, Result};
use crate::strategy::{HttpSource, PaginationStrategy};
use crate::types::{OptionStringExt, StringMap};
use futures::channel::mpsc;
use futures::StreamExt;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{debug, info};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Fetch(args) => self.fetch(args).await,
            Commands::Validate => self.validate(),
        }
    }

    /// Load the configuration file
    fn load_config(&self) -> Result<Config> {
        let path = self
            .cli
            .config
            .as_ref()
            .ok_or_else(|| Error::config("Configuration file not specified (use -C flag)"))?;
        load_config(path)
    }

    /// Configuration file (if any) with command-line overrides applied
    fn resolve_config(&self, args: &FetchArgs) -> Result<Config> {
        let mut config = match (&self.cli.config, &args.url) {
            (Some(_), _) => self.load_config()?,
            (None, Some(url)) => Config {
                paginator: Default::default(),
                source: SourceConfig::new(url.clone()),
            },
            (None, None) => {
                return Err(Error::config(
                    "Nothing to fetch: pass --url or a configuration file (-C)",
                ))
            }
        };

        apply_overrides(&mut config, args);
        config.validate()?;
        Ok(config)
    }

    /// Page through the endpoint and print what the paginator emits
    async fn fetch(&self, args: &FetchArgs) -> Result<()> {
        let started = Instant::now();
        let config = self.resolve_config(args)?;
        let max_pages = args.pages.unwrap_or(usize::MAX).max(1);

        info!(
            "Fetching {} (strategy: {})",
            config.source.url,
            config.source.pagination.name()
        );

        let source = HttpSource::from_config(&config.source)?;
        let (request_tx, request_rx) = mpsc::unbounded::<StringMap>();
        let (next_tx, next_rx) = mpsc::unbounded::<()>();

        let streams = Paginator::new(source)
            .with_config(config.paginator)
            .spawn(request_rx, next_rx);
        let (mut values, mut loading, handle) = streams.into_parts();

        request_tx
            .unbounded_send(args.params.iter().cloned().collect())
            .map_err(|e| Error::stopped(e.to_string()))?;

        let mut pages = 1;
        let mut page_changed_values = false;
        let mut latest: Vec<Value> = Vec::new();

        loop {
            tokio::select! {
                biased;
                Some(snapshot) = values.next() => {
                    page_changed_values = true;
                    self.output_message(&json!({
                        "type": "SNAPSHOT",
                        "snapshot": { "page": pages, "count": snapshot.len() }
                    }));
                    latest = snapshot;
                }
                Some(is_loading) = loading.next() => {
                    if is_loading {
                        page_changed_values = false;
                        continue;
                    }
                    // A page that changed nothing was empty or failed.
                    if !page_changed_values || pages >= max_pages {
                        break;
                    }
                    pages += 1;
                    debug!("Requesting page {}", pages);
                    next_tx
                        .unbounded_send(())
                        .map_err(|e| Error::stopped(e.to_string()))?;
                }
                else => break,
            }
        }

        drop(request_tx);
        drop(next_tx);
        drop(values);
        drop(loading);
        handle
            .await
            .map_err(|e| Error::stopped(format!("driver task failed: {e}")))?;

        for record in &latest {
            self.output_message(&json!({ "type": "RECORD", "record": record }));
        }

        info!(
            "Fetched {} records in {} pages ({:.2}s)",
            latest.len(),
            pages,
            started.elapsed().as_secs_f64()
        );

        Ok(())
    }

    /// Validate the configuration file
    fn validate(&self) -> Result<()> {
        let config = self.load_config()?;

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!(
                    "Configuration is valid: {} with {} pagination",
                    config.source.url,
                    config.source.pagination.name()
                )
            }
        }));

        Ok(())
    }

    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Apply command-line flags on top of a loaded configuration
fn apply_overrides(config: &mut Config, args: &FetchArgs) {
    let source = &mut config.source;

    if let Some(url) = &args.url {
        source.url.clone_from(url);
    }
    // An empty path selects the whole body
    if let Some(path) = &args.records_path {
        source.records_path = path.clone().none_if_empty();
    }

    if let (Some(param), Some(path)) = (&args.cursor_param, &args.cursor_path) {
        source.pagination = PaginationStrategy::cursor(param.clone(), path.clone());
    } else if let Some(path) = &args.next_url_path {
        source.pagination = PaginationStrategy::next_url(path.clone());
    } else if args.link_header {
        source.pagination = PaginationStrategy::link_header("next");
    }

    if args.no_clear {
        config.paginator.clear_on_new_request = false;
    }
}
