pub mod lexicon;
pub mod analyzer;
pub mod pipeline;

pub use lexicon::Lexicon;
pub use analyzer::{PolarityScores, SentimentAnalyzer, SentimentScorer};
pub use pipeline::{Polarity, ScoreSequence, SentimentScore, analyze_sentiments};
