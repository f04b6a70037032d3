use anyhow::{Context, Result};

use crate::schema::{Mention, RawTweet};

/// Extract the requester and the requested target accounts from a mention.
///
/// Every embedded account reference except `self_handle` becomes a target,
/// in order of appearance and without deduplication. Handles compare
/// case-insensitively.
pub fn parse_mention(raw: &RawTweet, self_handle: &str) -> Result<Mention> {
    let id = raw.id.context("mention has no id")?;
    let requester = raw
        .user
        .as_ref()
        .and_then(|u| u.screen_name.clone())
        .with_context(|| format!("mention {} has no author", id))?;
    let entities = raw
        .entities
        .as_ref()
        .with_context(|| format!("mention {} has no entities block", id))?;

    let targets = entities
        .user_mentions
        .iter()
        .flatten()
        .filter_map(|m| m.screen_name.as_deref())
        .filter(|name| !name.eq_ignore_ascii_case(self_handle))
        .map(str::to_string)
        .collect();

    Ok(Mention {
        id,
        requester,
        targets,
    })
}
