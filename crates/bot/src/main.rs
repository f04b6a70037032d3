mod config;
mod metrics;
mod poll;
mod reply;
mod retry;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use chart::PlottersRenderer;
use chat::{Brain, ChatResponder, OllamaChat};
use config::{BotConfig, ChatBackend, LogFormat, Settings};
use poll::Bot;
use sentiment::{Lexicon, SentimentAnalyzer};
use twitter::TwitterClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Step 1: Load configuration (.env is optional)
    dotenvy::dotenv().ok();
    let config = BotConfig::from_env()?;

    // Step 2: Initialize tracing
    init_tracing(config.settings.log_format);

    // Step 3: Build collaborators
    let platform = TwitterClient::new(config.credentials.clone());
    let scorer = build_scorer(&config.settings)?;
    let chat = build_chat(&config.settings).await?;
    let renderer = PlottersRenderer::new(config.settings.chart_dir.clone());

    info!(
        handle = %config.settings.self_handle,
        since_tweet_id = config.since_tweet_id,
        backend = ?config.settings.chat.backend,
        "Sentiment bot starting"
    );

    // Step 4: Poll forever
    let mut bot = Bot::new(
        Box::new(platform),
        Box::new(scorer),
        chat,
        Box::new(renderer),
        config.settings,
    );
    bot.run(config.since_tweet_id).await
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

fn build_scorer(settings: &Settings) -> Result<SentimentAnalyzer> {
    match &settings.vader_lexicon {
        Some(path) => Ok(SentimentAnalyzer::new().with_lexicon(Lexicon::from_vader_file(path)?)),
        None => Ok(SentimentAnalyzer::new()),
    }
}

async fn build_chat(settings: &Settings) -> Result<Box<dyn ChatResponder>> {
    let chat = &settings.chat;

    match chat.backend {
        ChatBackend::Brain => {
            let brain = Brain::bootstrap(&chat.brain_file, &chat.knowledge_file)
                .await
                .context("Failed to bootstrap chat brain")?;
            Ok(Box::new(brain))
        }
        ChatBackend::Ollama => {
            let ollama = OllamaChat::new(
                chat.ollama_url.clone(),
                chat.ollama_model.clone(),
                chat.brain_file.clone(),
            )
            .load()
            .await
            .context("Failed to load chat history")?;
            Ok(Box::new(ollama))
        }
    }
}
