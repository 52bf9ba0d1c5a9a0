//! haoxiangsheng - AI deal analysis CLI for Chinese e-commerce
//!
//! Finds the cheapest way to buy a product: coupons, order bundling,
//! price-drop timing and cheaper alternatives.

use anyhow::Result;
use clap::{Parser, Subcommand};
use haoxiangsheng::analysis::DealAnalysisClient;
use haoxiangsheng::commands::{AnalyzeCommand, CacheCommand, HistoryCommand, RecommendCommand};
use haoxiangsheng::config::{Config, OutputFormat};
use haoxiangsheng::gemini::GeminiClient;
use haoxiangsheng::offline::CachePolicy;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "haoxiangsheng",
    version,
    about = "AI deal analysis for Chinese e-commerce",
    long_about = "好享省: asks Gemini for the cheapest way to buy a product across Taobao, JD, Pinduoduo and Douyin."
)]
struct Cli {
    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true, env = "HXS_PROXY")]
    proxy: Option<String>,

    /// Gemini model identifier
    #[arg(long, global = true)]
    model: Option<String>,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format [default: table, or `format` from the config file]
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a product and get saving plans
    #[command(alias = "a")]
    Analyze {
        /// Product name or link
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Show today's recommended deals
    #[command(alias = "r")]
    Recommend,

    /// Show or clear recent searches
    History {
        /// Clear the history
        #[arg(long)]
        clear: bool,
    },

    /// Manage the offline asset cache
    #[command(subcommand)]
    Cache(CacheAction),
}

#[derive(Subcommand)]
enum CacheAction {
    /// Pre-cache static assets and evict older versions
    Install,

    /// Fetch a URL through the offline cache
    Fetch {
        url: String,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Cache policy for this fetch
        #[arg(long)]
        policy: Option<CachePolicy>,
    },

    /// List cache containers
    List,
}

impl Cli {
    /// Flags given on the command line win over config file and environment.
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(proxy) = &self.proxy {
            config.proxy = Some(proxy.clone());
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
    }
}

fn deal_client(config: &Config) -> Result<DealAnalysisClient> {
    let model = Arc::new(GeminiClient::new(config)?);
    Ok(DealAnalysisClient::new(model).require_plans(config.require_plans))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    cli.apply_overrides(&mut config);

    match cli.command {
        Commands::Analyze { query } => {
            let client = deal_client(&config)?;
            let cmd = AnalyzeCommand::new(config);
            let output = cmd.execute(&client, &query.join(" ")).await?;
            println!("{}", output);
        }

        Commands::Recommend => {
            let client = deal_client(&config)?;
            let output = RecommendCommand::new(config).execute(&client).await;
            println!("{}", output);
        }

        Commands::History { clear } => {
            let cmd = HistoryCommand::new(config);
            let output = if clear { cmd.clear()? } else { cmd.list()? };
            println!("{}", output);
        }

        Commands::Cache(action) => match action {
            CacheAction::Install => {
                let mut cmd = CacheCommand::new(config)?;
                println!("{}", cmd.install().await?);
            }
            CacheAction::Fetch { url, method, policy } => {
                if let Some(policy) = policy {
                    config.offline.policy = policy;
                }
                let mut cmd = CacheCommand::new(config)?;
                println!("{}", cmd.fetch(&method, &url).await?);
            }
            CacheAction::List => {
                let cmd = CacheCommand::new(config)?;
                println!("{}", cmd.list()?);
            }
        },
    }

    Ok(())
}
