use chrono::Local;

/// At most this many characters of the chat comment make it into a reply.
pub const COMMENT_LIMIT: usize = 75;

/// Local time as `YYYY-MM-DD HH:MM:SS`.
pub fn timestamp_now() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string().trim().to_string()
}

pub fn truncate_comment(comment: &str) -> String {
    comment.trim().chars().take(COMMENT_LIMIT).collect()
}

/// Reply posted together with the chart, threaded under the mention.
pub fn compose_analysis_reply(
    timestamp: &str,
    self_name: &str,
    requester: &str,
    chat_comment: &str,
    target: &str,
) -> String {
    format!(
        "{} {}: {}! {} btw... Here is the sentiment analysis of {}!",
        timestamp.trim(),
        self_name,
        requester,
        truncate_comment(chat_comment),
        target
    )
}

/// Standalone status for a target without posts.
pub fn compose_no_data_status(timestamp: &str, requester: &str, target: &str) -> String {
    format!(
        "{} - Thank you for your tweet {}! Sorry, {} has no tweets!",
        timestamp.trim(),
        requester,
        target
    )
}
