pub mod oauth;
pub mod client;

pub use oauth::Credentials;
pub use client::{MAX_TIMELINE_COUNT, TwitterClient};

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use timeline::RawTweet;

/// The social platform operations the bot relies on.
#[async_trait]
pub trait SocialPlatform: Send + Sync {
    /// Mentions of the authenticated account newer than `since_id`.
    async fn mentions_since(&self, since_id: u64) -> Result<Vec<RawTweet>>;

    /// Up to `limit` most recent posts of `handle`, newest first.
    async fn recent_posts(&self, handle: &str, limit: usize) -> Result<Vec<RawTweet>>;

    /// Threaded reply, optionally carrying an image.
    async fn post_reply(&self, text: &str, in_reply_to: u64, attachment: Option<&Path>) -> Result<()>;

    /// Standalone status update.
    async fn post_status(&self, text: &str) -> Result<()>;
}
