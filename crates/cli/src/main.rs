//! codepath CLI - code structure and call graph builder
//!
//! This binary provides the command-line interface for building, exporting
//! and serving the code graph of a workspace.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use codepath::commands::{default_export_path, ensure_readable_root, export, graph_json, scan};
use codepath::output::{summary, write_file};
use codepath::{OutputFormat, Session};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use codepath_core::config::Config;
use codepath_indexer::SymbolCache;
use codepath_lsp::LspSymbolProvider;
use std::env;
use std::path::{Path, PathBuf};
use tokio::io::BufReader;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "codepath")]
#[command(about = "Containment and call graphs for a source workspace")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the graph and print a summary or JSON
    Scan {
        /// Workspace root (defaults to the current directory)
        path: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Summary)]
        format: OutputFormat,

        /// Write the output to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Rebuild from scratch and write the full structure export
    Export {
        /// Workspace root (defaults to the current directory)
        path: Option<PathBuf>,

        /// Export file (defaults to code-structure.json in the workspace root)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Answer JSON-lines requests on stdin
    Session {
        /// Workspace root (defaults to the current directory)
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose)?;

    match cli.command {
        Some(Commands::Scan {
            path,
            format,
            output,
        }) => {
            let root = workspace_root(path)?;
            let config = load_config(cli.config.as_deref(), &root)?;
            let provider = start_provider(&root, &config).await?;
            let result = run_scan(&root, &provider, &config, format, output.as_deref()).await;
            stop_provider(&provider).await;
            result
        }
        Some(Commands::Export { path, output }) => {
            let root = workspace_root(path)?;
            let config = load_config(cli.config.as_deref(), &root)?;
            let output = output.unwrap_or_else(|| default_export_path(&root, &config));
            let provider = start_provider(&root, &config).await?;
            let result = export(&root, &provider, &config, &output).await;
            stop_provider(&provider).await;
            result?;
            println!("Full code structure exported to {}", output.display());
            Ok(())
        }
        Some(Commands::Session { path }) => {
            let root = workspace_root(path)?;
            let config = load_config(cli.config.as_deref(), &root)?;
            let provider = start_provider(&root, &config).await?;
            let session = Session::new(&root, &provider, &config);
            let result = session
                .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
                .await;
            stop_provider(&provider).await;
            info!("Session ended after {} requests", result?);
            Ok(())
        }
        None => {
            // Default behavior - show help
            println!("Run 'codepath scan' to build the graph of the current directory, or --help for more options");
            Ok(())
        }
    }
}

async fn run_scan(
    root: &Path,
    provider: &LspSymbolProvider,
    config: &Config,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let cache = SymbolCache::new();
    let outcome = scan(root, provider, &cache, config).await?;
    let rendered = match format {
        OutputFormat::Summary => summary(&outcome),
        OutputFormat::Json => graph_json(outcome.graph(), config.export.pretty)?,
    };
    match output {
        Some(output) => write_file(output, &rendered).await,
        None => {
            println!("{rendered}");
            Ok(())
        }
    }
}

/// Initialize logging system
///
/// Logs go to stderr so stdout stays free for command output.
fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "codepath={level},{}={level}",
            env!("CARGO_PKG_NAME")
        ))
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn workspace_root(path: Option<PathBuf>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path),
        None => env::current_dir().context("Failed to get current directory"),
    }
}

fn load_config(config_path: Option<&Path>, root: &Path) -> Result<Config> {
    let config = Config::load(config_path, Some(root))?;
    config.validate()?;
    Ok(config)
}

/// Starts the configured language server once the root is known to be readable
async fn start_provider(root: &Path, config: &Config) -> Result<LspSymbolProvider> {
    ensure_readable_root(root).await?;

    info!("Starting language server: {}", config.provider.command.join(" "));
    LspSymbolProvider::start(&config.provider, root)
        .await
        .context("Failed to start the language server")
}

async fn stop_provider(provider: &LspSymbolProvider) {
    if let Err(e) = provider.shutdown().await {
        warn!("Language server shutdown failed: {e}");
    }
}
