pub mod brain;
pub mod llm;

pub use brain::{Brain, Category, Knowledge};
pub use llm::{Exchange, OllamaChat};

use anyhow::Result;
use async_trait::async_trait;

/// Stateful text-in, text-out chat engine.
#[async_trait]
pub trait ChatResponder: Send + Sync {
    async fn respond(&mut self, input: &str) -> Result<String>;

    /// Persist learned state.
    async fn save(&self) -> Result<()>;
}
