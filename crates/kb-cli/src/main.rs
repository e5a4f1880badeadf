//! kb CLI - Command-line interface for the support knowledge base.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use kb_core::KbConfig;
use kb_tool::{KnowledgeQueryTool, QueryParams, ToolResult};

/// kb - Query a knowledge base of support conversations and guidelines
#[derive(Parser)]
#[command(name = "kb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: ~/.config/support-kb/config.toml, then ./support-kb.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Dataset path, overrides the config file
    #[arg(short, long, global = true)]
    dataset: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the knowledge base
    Query {
        /// Search query
        query: String,

        /// Maximum number of entries to show
        #[arg(short = 'n', long)]
        max_results: Option<usize>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show dataset and cache statistics
    Stats,

    /// List the tools exposed to agents
    Tools,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn load_config(cli: &Cli) -> Result<KbConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => KbConfig::load(path)?,
        None => KbConfig::load_default()?,
    };

    if let Some(dataset) = &cli.dataset {
        config.dataset.path = dataset.clone();
    }

    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let mut config = load_config(&cli)?;

    match cli.command {
        Commands::Query {
            query,
            max_results,
            json,
        } => {
            if let Some(n) = max_results {
                config.output.max_results = n;
            }
            // One query per process, nothing to cache.
            config.cache.capacity = 0;

            let mut tool = KnowledgeQueryTool::new(&config);
            let result = tool.invoke(QueryParams { query });
            report(result, json)?;
        }
        Commands::Stats => {
            let tool = KnowledgeQueryTool::new(&config);
            report(tool.stats(), false)?;
        }
        Commands::Tools => {
            let tools = KnowledgeQueryTool::tools();
            println!("{}", serde_json::to_string_pretty(&tools)?);
        }
    }

    Ok(())
}

fn report(result: ToolResult, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        if !result.success {
            std::process::exit(1);
        }
        return Ok(());
    }

    if result.success {
        println!("{}", result.message);
    } else {
        eprintln!("{}", result.message);
        std::process::exit(1);
    }

    Ok(())
}
