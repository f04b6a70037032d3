use anyhow::{Context, Result};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::metrics::BotMetrics;
use crate::reply::{compose_analysis_reply, compose_no_data_status, timestamp_now};
use crate::retry::RetryPolicy;
use chart::ChartRenderer;
use chat::ChatResponder;
use sentiment::{SentimentScorer, analyze_sentiments};
use timeline::{Mention, Post, parse_mention};
use twitter::SocialPlatform;

/// What one scan cycle did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    /// Watermark to use for the next cycle
    pub watermark: u64,
    pub mentions: usize,
    pub skipped: usize,
    pub charts: usize,
    pub replies: usize,
    pub statuses: usize,
}

/// The polling bot and every collaborator it talks to.
pub struct Bot {
    platform: Box<dyn SocialPlatform>,
    scorer: Box<dyn SentimentScorer + Send + Sync>,
    chat: Box<dyn ChatResponder>,
    renderer: Box<dyn ChartRenderer + Send + Sync>,
    retry: RetryPolicy,
    metrics: BotMetrics,
    settings: Settings,
    clock: fn() -> String,
}

impl Bot {
    pub fn new(
        platform: Box<dyn SocialPlatform>,
        scorer: Box<dyn SentimentScorer + Send + Sync>,
        chat: Box<dyn ChatResponder>,
        renderer: Box<dyn ChartRenderer + Send + Sync>,
        settings: Settings,
    ) -> Self {
        Self {
            platform,
            scorer,
            chat,
            renderer,
            retry: RetryPolicy::from_config(&settings.retry),
            metrics: BotMetrics::new(),
            settings,
            clock: timestamp_now,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> String) -> Self {
        self.clock = clock;
        self
    }

    pub fn metrics(&self) -> &BotMetrics {
        &self.metrics
    }

    /// Sleep, scan, repeat. Only returns if a cycle fails.
    pub async fn run(&mut self, since_tweet_id: u64) -> Result<()> {
        let interval = Duration::from_secs(self.settings.poll_interval_secs);
        let mut watermark = since_tweet_id;

        info!(
            watermark,
            interval_secs = self.settings.poll_interval_secs,
            handle = %self.settings.self_handle,
            "Polling for mentions"
        );

        loop {
            tokio::time::sleep(interval).await;
            watermark = self.scan_for_requests(watermark).await?.watermark;
        }
    }

    /// Handle every mention newer than `since_id` and return the new watermark.
    pub async fn scan_for_requests(&mut self, since_id: u64) -> Result<CycleReport> {
        let started = Instant::now();
        let mut report = CycleReport {
            watermark: since_id,
            ..Default::default()
        };

        let results = self.retry
            .retry("mentions_timeline", || self.platform.mentions_since(since_id))
            .await
            .context("Failed to fetch mentions")?;

        info!(count = results.len(), since_id, "Total results retrieved");
        if results.is_empty() {
            self.metrics.record_cycle(started.elapsed(), 0);
            return Ok(report);
        }

        report.mentions = results.len();
        report.watermark = results
            .iter()
            .filter_map(|raw| raw.id)
            .fold(since_id, u64::max);

        let mut requests = Vec::with_capacity(results.len());
        for raw in &results {
            match parse_mention(raw, &self.settings.self_handle) {
                Ok(mention) => {
                    debug!(mention_id = mention.id, requester = %mention.requester, targets = ?mention.targets, "Parsed mention");
                    requests.push(mention);
                }
                Err(e) => {
                    warn!(error = %e, "Skipping unparseable mention");
                    self.metrics.record_skipped_mention();
                    report.skipped += 1;
                }
            }
        }

        for mention in &requests {
            for target in &mention.targets {
                self.handle_target(mention, target, &mut report).await?;
            }
        }

        self.metrics.record_cycle(started.elapsed(), report.mentions);
        info!(
            watermark = report.watermark,
            replies = report.replies,
            statuses = report.statuses,
            metrics = ?self.metrics.snapshot(),
            "Scan complete"
        );

        Ok(report)
    }

    async fn handle_target(&mut self, mention: &Mention, target: &str, report: &mut CycleReport) -> Result<()> {
        let limit = self.settings.timeline_count;
        let raw_posts = self.retry
            .retry("user_timeline", || self.platform.recent_posts(target, limit))
            .await
            .context(format!("Failed to fetch posts of {}", target))?;

        let posts: Vec<Post> = raw_posts
            .into_iter()
            .filter_map(|raw| match Post::try_from(raw) {
                Ok(post) => Some(post),
                Err(e) => {
                    warn!(target, error = %e, "Dropping undecodable post");
                    None
                }
            })
            .collect();

        info!(mention_id = mention.id, target, posts = posts.len(), "Fetched timeline");

        if posts.is_empty() {
            let status = compose_no_data_status(&(self.clock)(), &mention.requester, target);
            self.retry
                .retry("update_status", || self.platform.post_status(&status))
                .await
                .context("Failed to post no-data status")?;

            self.metrics.record_no_data();
            report.statuses += 1;
            return Ok(());
        }

        let post_count = posts.len();
        let sequence = analyze_sentiments(posts, self.scorer.as_ref())?;
        debug!(target, scores = ?sequence.scores, "Sentiment scores");

        let comment = self.chat
            .respond(&sequence.last_text)
            .await
            .context("Chat engine failed to respond")?;
        self.chat.save().await.context("Failed to save chat state")?;
        debug!(target, comment = %comment, "Chat response");

        let chart = self.renderer.render(target, &sequence.scores)?;
        self.metrics.record_chart();
        report.charts += 1;

        let text = compose_analysis_reply(
            &(self.clock)(),
            &self.settings.self_name,
            &mention.requester,
            &comment,
            target,
        );
        self.retry
            .retry("update_with_media", || {
                self.platform.post_reply(&text, mention.id, Some(chart.as_path()))
            })
            .await
            .context("Failed to post analysis reply")?;

        self.metrics.record_analysis(post_count);
        report.replies += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sentiment::{SentimentAnalyzer, SentimentScore};
    use serde_json::json;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use timeline::RawTweet;

    const LONG_COMMENT: &str = "This is a rather long chat comment that certainly goes past the seventy five character limit";

    #[derive(Default)]
    struct Calls {
        since: Vec<u64>,
        timelines: Vec<(String, usize)>,
        replies: Vec<(String, u64, Option<PathBuf>)>,
        statuses: Vec<String>,
        charts: Vec<(String, usize)>,
        chat_inputs: Vec<String>,
        chat_saves: usize,
    }

    type Log = Arc<Mutex<Calls>>;

    struct FakePlatform {
        mentions: Vec<RawTweet>,
        timelines: HashMap<String, Vec<RawTweet>>,
        fail_posts: bool,
        log: Log,
    }

    #[async_trait]
    impl SocialPlatform for FakePlatform {
        async fn mentions_since(&self, since_id: u64) -> Result<Vec<RawTweet>> {
            self.log.lock().unwrap().since.push(since_id);
            Ok(self.mentions.clone())
        }

        async fn recent_posts(&self, handle: &str, limit: usize) -> Result<Vec<RawTweet>> {
            self.log.lock().unwrap().timelines.push((handle.to_string(), limit));
            Ok(self.timelines.get(handle).cloned().unwrap_or_default())
        }

        async fn post_reply(&self, text: &str, in_reply_to: u64, attachment: Option<&Path>) -> Result<()> {
            if self.fail_posts {
                anyhow::bail!("reply rejected");
            }
            self.log
                .lock()
                .unwrap()
                .replies
                .push((text.to_string(), in_reply_to, attachment.map(Path::to_path_buf)));
            Ok(())
        }

        async fn post_status(&self, text: &str) -> Result<()> {
            if self.fail_posts {
                anyhow::bail!("status update rejected");
            }
            self.log.lock().unwrap().statuses.push(text.to_string());
            Ok(())
        }
    }

    struct FakeRenderer {
        log: Log,
    }

    impl ChartRenderer for FakeRenderer {
        fn render(&self, label: &str, scores: &[SentimentScore]) -> Result<PathBuf> {
            self.log.lock().unwrap().charts.push((label.to_string(), scores.len()));
            Ok(chart::chart_path(Path::new("charts"), label))
        }
    }

    struct FakeChat {
        log: Log,
    }

    #[async_trait]
    impl ChatResponder for FakeChat {
        async fn respond(&mut self, input: &str) -> Result<String> {
            self.log.lock().unwrap().chat_inputs.push(input.to_string());
            Ok(LONG_COMMENT.to_string())
        }

        async fn save(&self) -> Result<()> {
            self.log.lock().unwrap().chat_saves += 1;
            Ok(())
        }
    }

    fn fixed_clock() -> String {
        "2024-01-02 03:04:05".to_string()
    }

    fn mention(id: u64, requester: &str, targets: &[&str]) -> RawTweet {
        let mut mentions = vec![json!({"screen_name": "shajin"})];
        mentions.extend(targets.iter().map(|t| json!({"screen_name": t})));
        serde_json::from_value(json!({
            "id": id,
            "text": "analyze please",
            "user": {"screen_name": requester},
            "entities": {"user_mentions": mentions}
        }))
        .unwrap()
    }

    fn post(id: u64, author: &str, text: &str) -> RawTweet {
        serde_json::from_value(json!({
            "id": id,
            "text": text,
            "user": {"screen_name": author},
            "entities": {"user_mentions": [], "urls": []}
        }))
        .unwrap()
    }

    fn bob_timeline() -> Vec<RawTweet> {
        vec![
            post(503, "bob", "What a great day"),
            post(502, "bob", "Traffic is terrible"),
            post(501, "bob", "@carol loved the show"),
        ]
    }

    fn bot(mentions: Vec<RawTweet>, timelines: HashMap<String, Vec<RawTweet>>, fail_posts: bool) -> (Bot, Log) {
        let log: Log = Arc::default();
        let platform = FakePlatform {
            mentions,
            timelines,
            fail_posts,
            log: log.clone(),
        };

        let bot = Bot::new(
            Box::new(platform),
            Box::new(SentimentAnalyzer::new()),
            Box::new(FakeChat { log: log.clone() }),
            Box::new(FakeRenderer { log: log.clone() }),
            Settings::default(),
        )
        .with_clock(fixed_clock);

        (bot, log)
    }

    #[tokio::test]
    async fn test_mention_with_posts_gets_chart_reply() {
        let timelines = HashMap::from([("bob".to_string(), bob_timeline())]);
        let (mut bot, log) = bot(vec![mention(100, "alice", &["bob"])], timelines, false);

        let report = bot.scan_for_requests(50).await.unwrap();
        assert_eq!(report.watermark, 100);
        assert_eq!(report.charts, 1);
        assert_eq!(report.replies, 1);
        assert_eq!(report.statuses, 0);

        let calls = log.lock().unwrap();
        assert_eq!(calls.since, vec![50]);
        assert_eq!(calls.timelines, vec![("bob".to_string(), 200)]);
        assert_eq!(calls.charts, vec![("bob".to_string(), 3)]);
        assert!(calls.statuses.is_empty());

        let (text, in_reply_to, attachment) = &calls.replies[0];
        assert_eq!(calls.replies.len(), 1);
        assert_eq!(*in_reply_to, 100);
        assert_eq!(attachment.as_deref(), Some(Path::new("charts/SentimentAnalysis_of_bob.png")));
        assert_eq!(
            text,
            &format!(
                "2024-01-02 03:04:05 Shajin: alice! {} btw... Here is the sentiment analysis of bob!",
                &LONG_COMMENT[..75]
            )
        );

        // Chat sees the oldest post, sanitized
        assert_eq!(calls.chat_inputs, vec!["carol loved the show"]);
        assert_eq!(calls.chat_saves, 1);
    }

    #[tokio::test]
    async fn test_target_without_posts_gets_standalone_status() {
        let (mut bot, log) = bot(vec![mention(100, "alice", &["bob"])], HashMap::new(), false);

        let report = bot.scan_for_requests(50).await.unwrap();
        assert_eq!(report.watermark, 100);
        assert_eq!(report.charts, 0);
        assert_eq!(report.statuses, 1);

        let calls = log.lock().unwrap();
        assert!(calls.charts.is_empty());
        assert!(calls.replies.is_empty());
        assert!(calls.chat_inputs.is_empty());
        assert_eq!(
            calls.statuses,
            vec!["2024-01-02 03:04:05 - Thank you for your tweet alice! Sorry, bob has no tweets!"]
        );
    }

    #[tokio::test]
    async fn test_empty_batch_keeps_watermark() {
        let (mut bot, log) = bot(Vec::new(), HashMap::new(), false);

        let report = bot.scan_for_requests(77).await.unwrap();
        assert_eq!(report, CycleReport { watermark: 77, ..Default::default() });

        let calls = log.lock().unwrap();
        assert!(calls.timelines.is_empty());
        assert_eq!(bot.metrics().snapshot().cycles, 1);
    }

    #[tokio::test]
    async fn test_bad_mention_is_skipped_but_counted_in_watermark() {
        let broken: RawTweet = serde_json::from_value(json!({"id": 105, "text": "no author"})).unwrap();
        let timelines = HashMap::from([("bob".to_string(), bob_timeline())]);
        let (mut bot, log) = bot(vec![broken, mention(103, "alice", &["bob"])], timelines, false);

        let report = bot.scan_for_requests(10).await.unwrap();
        assert_eq!(report.watermark, 105);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.replies, 1);
        assert_eq!(log.lock().unwrap().replies[0].1, 103);
        assert_eq!(bot.metrics().snapshot().mentions_skipped, 1);
    }

    #[tokio::test]
    async fn test_targets_handled_in_order_with_duplicates() {
        let timelines = HashMap::from([("bob".to_string(), bob_timeline())]);
        let mentions = vec![
            mention(201, "alice", &["bob", "nobody", "bob"]),
            mention(200, "dave", &[]),
        ];
        let (mut bot, log) = bot(mentions, timelines, false);

        let report = bot.scan_for_requests(1).await.unwrap();
        assert_eq!(report.watermark, 201);
        assert_eq!(report.replies, 2);
        assert_eq!(report.statuses, 1);

        let calls = log.lock().unwrap();
        let order: Vec<&str> = calls.timelines.iter().map(|(h, _)| h.as_str()).collect();
        assert_eq!(order, vec!["bob", "nobody", "bob"]);
        assert_eq!(calls.chat_saves, 2);
    }

    #[tokio::test]
    async fn test_watermark_never_moves_backwards() {
        let (mut bot, _log) = bot(vec![mention(40, "alice", &[])], HashMap::new(), false);
        let report = bot.scan_for_requests(90).await.unwrap();
        assert_eq!(report.watermark, 90);
    }

    #[tokio::test]
    async fn test_platform_failure_fails_the_cycle() {
        let (mut bot, _log) = bot(vec![mention(100, "alice", &["bob"])], HashMap::new(), true);
        let err = bot.scan_for_requests(50).await.unwrap_err();
        assert!(format!("{:#}", err).contains("status update rejected"));
    }

    #[tokio::test]
    async fn test_chart_counted_even_when_reply_fails() {
        let timelines = HashMap::from([("bob".to_string(), bob_timeline())]);
        let (mut bot, log) = bot(vec![mention(100, "alice", &["bob"])], timelines, true);

        let err = bot.scan_for_requests(50).await.unwrap_err();
        assert!(format!("{:#}", err).contains("reply rejected"));

        let snap = bot.metrics().snapshot();
        assert_eq!(snap.charts_rendered, 1);
        assert_eq!(snap.replies_posted, 0);
        assert_eq!(log.lock().unwrap().charts.len(), 1);
    }
}
