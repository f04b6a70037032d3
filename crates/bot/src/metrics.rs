use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Running totals since process start.
#[derive(Default)]
pub struct BotMetrics {
    cycles: AtomicUsize,
    mentions_seen: AtomicUsize,
    mentions_skipped: AtomicUsize,
    targets_analyzed: AtomicUsize,
    targets_without_posts: AtomicUsize,
    posts_scored: AtomicUsize,
    charts_rendered: AtomicUsize,
    replies_posted: AtomicUsize,
    statuses_posted: AtomicUsize,

    // Timing (in microseconds)
    total_scan_time_us: AtomicU64,
}

impl BotMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cycle(&self, duration: Duration, mentions: usize) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.mentions_seen.fetch_add(mentions, Ordering::Relaxed);
        self.total_scan_time_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_skipped_mention(&self) {
        self.mentions_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_chart(&self) {
        self.charts_rendered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_analysis(&self, posts: usize) {
        self.targets_analyzed.fetch_add(1, Ordering::Relaxed);
        self.posts_scored.fetch_add(posts, Ordering::Relaxed);
        self.replies_posted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_no_data(&self) {
        self.targets_without_posts.fetch_add(1, Ordering::Relaxed);
        self.statuses_posted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let cycles = self.cycles.load(Ordering::Relaxed);
        let total_us = self.total_scan_time_us.load(Ordering::Relaxed) as f64;

        MetricsSnapshot {
            cycles,
            mentions_seen: self.mentions_seen.load(Ordering::Relaxed),
            mentions_skipped: self.mentions_skipped.load(Ordering::Relaxed),
            targets_analyzed: self.targets_analyzed.load(Ordering::Relaxed),
            targets_without_posts: self.targets_without_posts.load(Ordering::Relaxed),
            posts_scored: self.posts_scored.load(Ordering::Relaxed),
            charts_rendered: self.charts_rendered.load(Ordering::Relaxed),
            replies_posted: self.replies_posted.load(Ordering::Relaxed),
            statuses_posted: self.statuses_posted.load(Ordering::Relaxed),
            avg_scan_time_ms: if cycles > 0 {
                total_us / cycles as f64 / 1000.0
            } else {
                0.0
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MetricsSnapshot {
    pub cycles: usize,
    pub mentions_seen: usize,
    pub mentions_skipped: usize,
    pub targets_analyzed: usize,
    pub targets_without_posts: usize,
    pub posts_scored: usize,
    pub charts_rendered: usize,
    pub replies_posted: usize,
    pub statuses_posted: usize,
    pub avg_scan_time_ms: f64,
}
