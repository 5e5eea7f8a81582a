mod cli;
mod config;
mod conversation;
mod llm;
mod types;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use conversation::Conversation;
use llm::{LlmClient, OpenAiClient};

#[derive(Parser)]
#[command(name = "parley")]
#[command(version, about = "Minimal terminal chat client for OpenAI-compatible endpoints")]
struct Cli {
    /// Override the configured model
    #[arg(long)]
    model: Option<String>,

    /// Override the configured chat-completions endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Write the default config file and exit
    #[arg(long)]
    init_config: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let filter = if args.verbose {
        EnvFilter::new("parley=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("parley=warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if args.init_config {
        let path = AppConfig::save_default()?;
        println!("Wrote default config: {}", path.display());
        println!("Edit it to set your endpoint, model, and API key.");
        return Ok(());
    }

    let mut config = AppConfig::load()?;
    if let Some(model) = args.model {
        config.llm.model = model;
    }
    if let Some(endpoint) = args.endpoint {
        config.llm.endpoint = endpoint;
    }

    let api_key = config.api_key();
    if api_key.is_empty() {
        // not fatal: the client answers with a fixed diagnostic reply
        warn!(env = %config.llm.api_key_env, "no API key configured");
    }

    let client = OpenAiClient::new(
        api_key,
        config.llm.endpoint.clone(),
        config.llm.model.clone(),
        config.llm.max_tokens,
        Duration::from_secs(config.llm.timeout_secs),
    );
    info!(client = client.name(), model = %config.llm.model, "client ready");

    let conversation = Conversation::new(Box::new(client), config.chat.welcome.clone());
    cli::run_chat_loop(conversation).await
}
