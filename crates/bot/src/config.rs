use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;

use twitter::Credentials;

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub credentials: Credentials,
    /// Initial watermark: mentions at or below this id are never handled
    pub since_tweet_id: u64,
    pub settings: Settings,
}

#[derive(Debug, Clone)]
pub struct Settings {
    /// The bot's own account, never treated as a target
    pub self_handle: String,
    /// Name the bot signs replies with
    pub self_name: String,
    pub poll_interval_secs: u64,
    pub timeline_count: usize,
    pub chart_dir: PathBuf,
    pub vader_lexicon: Option<PathBuf>,
    pub log_format: LogFormat,
    pub chat: ChatConfig,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChatBackend {
    Brain,   // Pattern rules learned from a knowledge file
    Ollama,  // Local LLM
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub backend: ChatBackend,
    pub brain_file: PathBuf,
    pub knowledge_file: PathBuf,
    pub ollama_url: String,
    pub ollama_model: String,
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            self_handle: "shajin".to_string(),
            self_name: "Shajin".to_string(),
            poll_interval_secs: 30,
            timeline_count: 200,
            chart_dir: PathBuf::from("."),
            vader_lexicon: None,
            log_format: LogFormat::Text,
            chat: ChatConfig {
                backend: ChatBackend::Brain,
                brain_file: PathBuf::from("bot_brain.brn"),
                knowledge_file: PathBuf::from("brain/std-startup.json"),
                ollama_url: "http://localhost:11434".to_string(),
                ollama_model: "llama3".to_string(),
            },
            // No retries unless asked for
            retry: RetryConfig {
                max_retries: 0,
                initial_backoff_ms: 1000,
                max_backoff_ms: 10000,
            },
        }
    }
}

impl FromStr for ChatBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "brain" => Ok(ChatBackend::Brain),
            "ollama" => Ok(ChatBackend::Ollama),
            other => anyhow::bail!("Unknown chat backend: {}", other),
        }
    }
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("Unknown log format: {}", other),
        }
    }
}

impl BotConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = Credentials::new(
            required(&lookup, "bot_consumer_key")?,
            required(&lookup, "bot_consumer_secret")?,
            required(&lookup, "bot_access_token")?,
            required(&lookup, "bot_access_token_secret")?,
        );
        let since_tweet_id = required(&lookup, "since_tweet_id")?
            .trim()
            .parse()
            .context("since_tweet_id must be a non-negative integer")?;

        let defaults = Settings::default();
        let settings = Settings {
            self_handle: optional(&lookup, "bot_self_handle", defaults.self_handle)?,
            self_name: optional(&lookup, "bot_self_name", defaults.self_name)?,
            poll_interval_secs: optional(&lookup, "bot_poll_interval_secs", defaults.poll_interval_secs)?,
            timeline_count: optional(&lookup, "bot_timeline_count", defaults.timeline_count)?,
            chart_dir: optional(&lookup, "bot_chart_dir", defaults.chart_dir)?,
            vader_lexicon: lookup("bot_vader_lexicon")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            log_format: optional(&lookup, "bot_log_format", defaults.log_format)?,
            chat: ChatConfig {
                backend: optional(&lookup, "bot_chat_backend", defaults.chat.backend)?,
                brain_file: optional(&lookup, "bot_brain_file", defaults.chat.brain_file)?,
                knowledge_file: optional(&lookup, "bot_knowledge_file", defaults.chat.knowledge_file)?,
                ollama_url: optional(&lookup, "bot_ollama_url", defaults.chat.ollama_url)?,
                ollama_model: optional(&lookup, "bot_ollama_model", defaults.chat.ollama_model)?,
            },
            retry: RetryConfig {
                max_retries: optional(&lookup, "bot_max_retries", defaults.retry.max_retries)?,
                initial_backoff_ms: optional(&lookup, "bot_initial_backoff_ms", defaults.retry.initial_backoff_ms)?,
                max_backoff_ms: optional(&lookup, "bot_max_backoff_ms", defaults.retry.max_backoff_ms)?,
            },
        };

        Ok(Self {
            credentials,
            since_tweet_id,
            settings,
        })
    }
}

fn required<F>(lookup: &F, name: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("Missing required environment variable {}", name))
}

fn optional<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", name, e)),
        None => Ok(default),
    }
}
