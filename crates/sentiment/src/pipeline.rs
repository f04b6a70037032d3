use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyzer::SentimentScorer;
use timeline::{Post, sanitize};

/// Scores for one post of a target's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub post_id: u64,
    pub negative: f64,
    pub neutral: f64,
    pub positive: f64,
    pub compound: f64,
}

impl SentimentScore {
    pub fn polarity(&self) -> Polarity {
        Polarity::from_compound(self.compound)
    }
}

/// Sign of a compound score, used to color chart markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    pub fn from_compound(compound: f64) -> Self {
        if compound >= 0.0 {
            Polarity::Positive
        } else {
            Polarity::Negative
        }
    }
}

/// Result of analyzing one target's batch of posts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSequence {
    /// One entry per input post, in input order
    pub scores: Vec<SentimentScore>,
    /// Sanitized text of the last post iterated
    pub last_text: String,
}

/// Sanitize and score each post in order.
///
/// `last_text` is whatever post the iteration ends on. The platform returns
/// timelines newest-first, so this is the oldest post of the batch.
pub fn analyze_sentiments<S>(posts: Vec<Post>, scorer: &S) -> Result<ScoreSequence>
where
    S: SentimentScorer + ?Sized,
{
    if posts.is_empty() {
        anyhow::bail!("Cannot analyze an empty batch of posts");
    }

    let mut scores = Vec::with_capacity(posts.len());
    let mut last_text = String::new();

    for post in posts {
        let cleaned = sanitize(post);
        let result = scorer.polarity_scores(&cleaned.text);

        debug!(post_id = cleaned.id, compound = result.compound, "Scored post");

        scores.push(SentimentScore {
            post_id: cleaned.id,
            negative: result.negative,
            neutral: result.neutral,
            positive: result.positive,
            compound: result.compound,
        });
        last_text = cleaned.text;
    }

    Ok(ScoreSequence { scores, last_text })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::SentimentAnalyzer;
    use timeline::{Entities, UserMention};

    fn post(id: u64, text: &str) -> Post {
        Post {
            id,
            author: "bob".to_string(),
            text: text.to_string(),
            entities: Entities::default(),
        }
    }

    #[test]
    fn test_one_score_per_post_in_order() {
        let posts = vec![
            post(3, "I love sunny days"),
            post(2, "Traffic was horrible today"),
            post(1, "Lunch at noon"),
        ];
        let result = analyze_sentiments(posts, &SentimentAnalyzer::new()).unwrap();

        let ids: Vec<u64> = result.scores.iter().map(|s| s.post_id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(result.scores[0].polarity(), Polarity::Positive);
        assert_eq!(result.scores[1].polarity(), Polarity::Negative);
        for s in &result.scores {
            for v in [s.negative, s.neutral, s.positive, s.compound] {
                assert!((-1.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn test_last_text_is_last_iterated_and_sanitized() {
        let mut last = post(1, "@carol this is the oldest");
        last.entities = Entities {
            user_mentions: Some(vec![UserMention { screen_name: Some("carol".to_string()) }]),
            ..Default::default()
        };
        let posts = vec![post(9, "newest post"), last];

        let result = analyze_sentiments(posts, &SentimentAnalyzer::new()).unwrap();
        assert_eq!(result.last_text, "  this is the oldest");
    }

    #[test]
    fn test_empty_batch_is_rejected() {
        assert!(analyze_sentiments(Vec::new(), &SentimentAnalyzer::new()).is_err());
    }

    #[test]
    fn test_zero_compound_maps_to_positive() {
        assert_eq!(Polarity::from_compound(0.0), Polarity::Positive);
        assert_eq!(Polarity::from_compound(-0.01), Polarity::Negative);
    }
}
