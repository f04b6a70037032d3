use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// A status record as the platform returns it.
///
/// Every field is optional and decoded leniently: a field with the wrong
/// JSON shape decodes to `None` instead of failing the whole record, so a
/// single odd entity block never takes down a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTweet {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub user: Option<RawUser>,
    #[serde(default, deserialize_with = "lenient")]
    pub entities: Option<Entities>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawUser {
    #[serde(default, deserialize_with = "lenient")]
    pub screen_name: Option<String>,
}

/// Embedded-reference metadata, keyed by category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entities {
    #[serde(default, deserialize_with = "lenient")]
    pub user_mentions: Option<Vec<UserMention>>,
    #[serde(default, deserialize_with = "lenient")]
    pub urls: Option<Vec<UrlEntity>>,
    #[serde(default, deserialize_with = "lenient")]
    pub media: Option<Vec<MediaEntity>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMention {
    #[serde(default, deserialize_with = "lenient")]
    pub screen_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UrlEntity {
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub expanded_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaEntity {
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub media_url_https: Option<String>,
}

/// An embedded reference that carries a substring of the post text.
pub trait Reference {
    fn replaceable(&self) -> Option<&str>;
}

impl Reference for UserMention {
    fn replaceable(&self) -> Option<&str> {
        self.screen_name.as_deref()
    }
}

impl Reference for UrlEntity {
    fn replaceable(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

impl Reference for MediaEntity {
    fn replaceable(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

/// A post fetched from an account's timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub author: String,
    pub text: String,
    pub entities: Entities,
}

impl TryFrom<RawTweet> for Post {
    type Error = anyhow::Error;

    fn try_from(raw: RawTweet) -> Result<Self> {
        let id = raw.id.context("post has no id")?;
        let text = raw.text.with_context(|| format!("post {} has no text", id))?;
        let author = raw
            .user
            .and_then(|u| u.screen_name)
            .unwrap_or_default();

        Ok(Self {
            id,
            author,
            text,
            entities: raw.entities.unwrap_or_default(),
        })
    }
}

/// A request addressed to the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    pub id: u64,
    pub requester: String,
    pub targets: Vec<String>,
}

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}
