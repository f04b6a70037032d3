use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use std::future::Future;
use std::path::Path;
use tracing::{debug, info};

use crate::SocialPlatform;
use crate::oauth::{Credentials, sign_request};
use timeline::RawTweet;

const API_BASE: &str = "https://api.twitter.com/1.1";
const UPLOAD_URL: &str = "https://upload.twitter.com/1.1/media/upload.json";

/// Largest page the user timeline endpoint serves
pub const MAX_TIMELINE_COUNT: usize = 200;

/// Largest page the mentions endpoint serves
pub const MENTIONS_PAGE_SIZE: usize = 200;

#[derive(Deserialize)]
struct MediaUploadResponse {
    media_id_string: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    id: u64,
}

/// REST client for the v1.1 API, signed with OAuth 1.0a user context.
#[derive(Clone)]
pub struct TwitterClient {
    api_base: String,
    upload_url: String,
    credentials: Credentials,
    client: reqwest::Client,
}

impl TwitterClient {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_endpoints(API_BASE.to_string(), UPLOAD_URL.to_string(), credentials)
    }

    pub fn with_endpoints(api_base: String, upload_url: String, credentials: Credentials) -> Self {
        Self {
            api_base,
            upload_url,
            credentials,
            client: reqwest::Client::new(),
        }
    }

    async fn get_timeline(&self, path: &str, query: Vec<(String, String)>) -> Result<Vec<RawTweet>> {
        let url = format!("{}/{}", self.api_base, path);
        let auth = sign_request(&self.credentials, "GET", &url, &query)?;

        let response = self.client
            .get(&url)
            .query(&query)
            .header(AUTHORIZATION, auth)
            .send()
            .await
            .context(format!("Failed to send request to {}", path))?;

        let response = check_status(path, response).await?;
        let tweets: Vec<RawTweet> = response
            .json()
            .await
            .context(format!("Failed to parse {} response", path))?;

        Ok(tweets)
    }

    async fn update_status(&self, form: Vec<(String, String)>) -> Result<u64> {
        let url = format!("{}/statuses/update.json", self.api_base);
        let auth = sign_request(&self.credentials, "POST", &url, &form)?;

        let response = self.client
            .post(&url)
            .form(&form)
            .header(AUTHORIZATION, auth)
            .send()
            .await
            .context("Failed to send status update")?;

        let response = check_status("statuses/update", response).await?;
        let status: StatusResponse = response
            .json()
            .await
            .context("Failed to parse status update response")?;

        Ok(status.id)
    }

    /// Upload an image and return its media id.
    pub async fn upload_media(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path)
            .await
            .context(format!("Failed to read media file: {:?}", path))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "chart.png".to_string());

        // Multipart bodies are not part of the signature base string
        let auth = sign_request(&self.credentials, "POST", &self.upload_url, &[])?;
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("image/png")?;
        let form = reqwest::multipart::Form::new().part("media", part);

        let response = self.client
            .post(&self.upload_url)
            .multipart(form)
            .header(AUTHORIZATION, auth)
            .send()
            .await
            .context("Failed to upload media")?;

        let response = check_status("media/upload", response).await?;
        let upload: MediaUploadResponse = response
            .json()
            .await
            .context("Failed to parse media upload response")?;

        debug!(media_id = %upload.media_id_string, "Uploaded media");
        Ok(upload.media_id_string)
    }
}

/// Walk backwards from the newest result with `max_id` until a page comes
/// back empty or reaches `since_id`. Pages are concatenated newest first.
async fn collect_pages<F, Fut>(since_id: u64, mut fetch_page: F) -> Result<Vec<RawTweet>>
where
    F: FnMut(Option<u64>) -> Fut,
    Fut: Future<Output = Result<Vec<RawTweet>>>,
{
    let mut all = Vec::new();
    let mut max_id: Option<u64> = None;

    loop {
        let page = fetch_page(max_id).await?;
        if page.is_empty() {
            break;
        }

        let oldest = page.iter().filter_map(|t| t.id).min();
        debug!(size = page.len(), ?max_id, ?oldest, "Fetched mentions page");

        // A page newer than the requested bound means the cursor is stuck
        if oldest.is_some_and(|id| max_id.is_some_and(|m| id > m)) {
            break;
        }
        all.extend(page);

        match oldest {
            Some(id) if id > since_id.saturating_add(1) => max_id = Some(id - 1),
            _ => break,
        }
    }

    Ok(all)
}

async fn check_status(endpoint: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    anyhow::bail!("{} request failed: {} {}", endpoint, status, body)
}

#[async_trait]
impl SocialPlatform for TwitterClient {
    async fn mentions_since(&self, since_id: u64) -> Result<Vec<RawTweet>> {
        collect_pages(since_id, |max_id| {
            let mut query = vec![("count".to_string(), MENTIONS_PAGE_SIZE.to_string())];
            if since_id > 0 {
                query.push(("since_id".to_string(), since_id.to_string()));
            }
            if let Some(max_id) = max_id {
                query.push(("max_id".to_string(), max_id.to_string()));
            }
            self.get_timeline("statuses/mentions_timeline.json", query)
        })
        .await
    }

    async fn recent_posts(&self, handle: &str, limit: usize) -> Result<Vec<RawTweet>> {
        let query = vec![
            ("screen_name".to_string(), handle.to_string()),
            ("count".to_string(), limit.min(MAX_TIMELINE_COUNT).to_string()),
        ];
        self.get_timeline("statuses/user_timeline.json", query).await
    }

    async fn post_reply(&self, text: &str, in_reply_to: u64, attachment: Option<&Path>) -> Result<()> {
        let mut form = vec![
            ("status".to_string(), text.to_string()),
            ("in_reply_to_status_id".to_string(), in_reply_to.to_string()),
        ];
        if let Some(path) = attachment {
            let media_id = self.upload_media(path).await?;
            form.push(("media_ids".to_string(), media_id));
        }

        let id = self.update_status(form).await?;
        info!(status_id = id, in_reply_to, "Posted reply");
        Ok(())
    }

    async fn post_status(&self, text: &str) -> Result<()> {
        let id = self
            .update_status(vec![("status".to_string(), text.to_string())])
            .await?;
        info!(status_id = id, "Posted status");
        Ok(())
    }
}
