use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::ChatResponder;

const PREAMBLE: &str = "You are a friendly, witty social media bot. \
Reply to the last message in one short sentence, no hashtags.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub input: String,
    pub response: String,
}

/// Chat replies generated by an Ollama model, with the recent conversation
/// kept in a history file.
#[derive(Clone)]
pub struct OllamaChat {
    base_url: String,
    model: String,
    client: reqwest::Client,
    history: Vec<Exchange>,
    history_file: PathBuf,
    max_history: usize,
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaChat {
    pub fn new(base_url: String, model: String, history_file: impl Into<PathBuf>) -> Self {
        Self {
            base_url,
            model,
            client: reqwest::Client::new(),
            history: Vec::new(),
            history_file: history_file.into(),
            max_history: 10,
        }
    }

    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }

    /// Restore the conversation history if the file exists.
    pub async fn load(mut self) -> Result<Self> {
        if !tokio::fs::try_exists(&self.history_file).await.unwrap_or(false) {
            return Ok(self);
        }

        let json = tokio::fs::read_to_string(&self.history_file)
            .await
            .context(format!("Failed to read chat history: {:?}", self.history_file))?;
        self.history = serde_json::from_str(&json)
            .context(format!("Failed to parse chat history: {:?}", self.history_file))?;

        info!(history = ?self.history_file, exchanges = self.history.len(), "Loaded chat history");
        Ok(self)
    }

    pub fn history(&self) -> &[Exchange] {
        &self.history
    }

    pub fn history_file(&self) -> &Path {
        &self.history_file
    }

    pub fn build_prompt(&self, input: &str) -> String {
        let mut prompt = format!("{}\n\n", PREAMBLE);
        for exchange in &self.history {
            prompt.push_str(&format!("User: {}\nBot: {}\n", exchange.input, exchange.response));
        }
        prompt.push_str(&format!("User: {}\nBot:", input.trim()));
        prompt
    }

    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
        };

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Ollama")?;

        if !response.status().is_success() {
            anyhow::bail!("Ollama request failed: {}", response.status());
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        Ok(ollama_response.response)
    }

    fn remember(&mut self, input: &str, response: &str) {
        self.history.push(Exchange {
            input: input.trim().to_string(),
            response: response.to_string(),
        });
        let excess = self.history.len().saturating_sub(self.max_history);
        self.history.drain(..excess);
    }
}

#[async_trait]
impl ChatResponder for OllamaChat {
    async fn respond(&mut self, input: &str) -> Result<String> {
        let prompt = self.build_prompt(input);
        let response = self.generate(&prompt).await?.trim().to_string();
        self.remember(input, &response);
        Ok(response)
    }

    async fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.history)?;
        tokio::fs::write(&self.history_file, json)
            .await
            .context(format!("Failed to write chat history: {:?}", self.history_file))?;
        Ok(())
    }
}
