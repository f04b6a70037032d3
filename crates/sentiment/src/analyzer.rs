use serde::{Deserialize, Serialize};

use crate::lexicon::Lexicon;

/// Emphasis added to a word written in capitals when the text is mixed case
const CAPS_INCR: f64 = 0.733;
/// Multiplier applied to a valence inside a negation window
const NEGATION_SCALAR: f64 = -0.74;
/// Emphasis per exclamation mark (at most four count)
const EXCLAIM_INCR: f64 = 0.292;
/// Normalisation constant for the compound score
const ALPHA: f64 = 15.0;

/// The four sub-scores for one piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolarityScores {
    pub negative: f64,
    pub neutral: f64,
    pub positive: f64,
    pub compound: f64,
}

impl PolarityScores {
    pub fn neutral() -> Self {
        Self {
            negative: 0.0,
            neutral: 1.0,
            positive: 0.0,
            compound: 0.0,
        }
    }
}

/// Text in, polarity scores out.
pub trait SentimentScorer {
    fn polarity_scores(&self, text: &str) -> PolarityScores;
}

/// Rule-based scorer in the style of VADER.
#[derive(Debug, Clone)]
pub struct SentimentAnalyzer {
    lexicon: Lexicon,
    /// How many preceding words are checked for boosters and negations
    window: usize,
}

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self {
            lexicon: Lexicon::new(),
            window: 3,
        }
    }

    pub fn with_lexicon(mut self, lexicon: Lexicon) -> Self {
        self.lexicon = lexicon;
        self
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    fn tokenize(text: &str) -> Vec<String> {
        text.split_whitespace()
            .filter_map(|raw| {
                let stripped = raw.trim_matches(|c: char| c.is_ascii_punctuation());
                // Emoticons are all punctuation
                let token = if stripped.is_empty() { raw } else { stripped };
                (token.chars().count() > 1 || token.chars().all(char::is_alphanumeric))
                    .then(|| token.to_string())
            })
            .collect()
    }

    fn is_shouting(token: &str) -> bool {
        token.chars().any(char::is_alphabetic)
            && token.chars().filter(|c| c.is_alphabetic()).all(char::is_uppercase)
    }

    fn word_valence(&self, tokens: &[String], lowered: &[String], i: usize, mixed_caps: bool) -> f64 {
        let word = &lowered[i];

        if self.lexicon.booster(word).is_some() {
            return 0.0;
        }
        // "kind of" is a dampener, not a sentiment
        if word == "kind" && lowered.get(i + 1).is_some_and(|next| next == "of") {
            return 0.0;
        }

        let Some(mut valence) = self.lexicon.valence(word) else {
            return 0.0;
        };

        if mixed_caps && Self::is_shouting(&tokens[i]) {
            valence += CAPS_INCR * valence.signum();
        }

        let mut negated = false;
        for distance in 1..=self.window.min(i) {
            let prev = &lowered[i - distance];

            if self.lexicon.valence(prev).is_none() {
                if let Some(boost) = self.lexicon.booster(prev) {
                    let mut scalar = boost * valence.signum();
                    if mixed_caps && Self::is_shouting(&tokens[i - distance]) {
                        scalar += CAPS_INCR * valence.signum();
                    }
                    valence += scalar * match distance {
                        1 => 1.0,
                        2 => 0.95,
                        _ => 0.9,
                    };
                }
            }

            if self.lexicon.is_negation(prev) {
                negated = true;
            }
        }

        if negated {
            valence *= NEGATION_SCALAR;
        }

        valence
    }

    fn punctuation_emphasis(text: &str) -> f64 {
        let exclaims = text.matches('!').count().min(4) as f64;
        let questions = text.matches('?').count();
        let question_emphasis = match questions {
            0 | 1 => 0.0,
            2 | 3 => questions as f64 * 0.18,
            _ => 0.96,
        };
        exclaims * EXCLAIM_INCR + question_emphasis
    }

    fn normalize(score: f64) -> f64 {
        (score / (score * score + ALPHA).sqrt()).clamp(-1.0, 1.0)
    }

    fn round(value: f64, places: i32) -> f64 {
        let factor = 10f64.powi(places);
        (value * factor).round() / factor
    }
}

impl SentimentScorer for SentimentAnalyzer {
    fn polarity_scores(&self, text: &str) -> PolarityScores {
        let tokens = Self::tokenize(text);
        if tokens.is_empty() {
            return PolarityScores::neutral();
        }

        let lowered: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
        let shouting = tokens.iter().filter(|t| Self::is_shouting(t)).count();
        let mixed_caps = shouting > 0 && shouting < tokens.len();

        let mut sentiments: Vec<f64> = (0..tokens.len())
            .map(|i| self.word_valence(&tokens, &lowered, i, mixed_caps))
            .collect();

        // Contrast: what follows "but" outweighs what precedes it
        if let Some(but) = lowered.iter().position(|w| w == "but") {
            for (i, s) in sentiments.iter_mut().enumerate() {
                if i < but {
                    *s *= 0.5;
                } else if i > but {
                    *s *= 1.5;
                }
            }
        }

        let emphasis = Self::punctuation_emphasis(text);

        let mut sum: f64 = sentiments.iter().sum();
        if sum > 0.0 {
            sum += emphasis;
        } else if sum < 0.0 {
            sum -= emphasis;
        }

        let mut pos_sum: f64 = sentiments.iter().filter(|s| **s > 0.0).map(|s| s + 1.0).sum();
        let mut neg_sum: f64 = sentiments.iter().filter(|s| **s < 0.0).map(|s| s - 1.0).sum();
        let neu_count = sentiments.iter().filter(|s| **s == 0.0).count() as f64;

        if pos_sum > neg_sum.abs() {
            pos_sum += emphasis;
        } else if pos_sum < neg_sum.abs() {
            neg_sum -= emphasis;
        }

        let total = pos_sum + neg_sum.abs() + neu_count;
        if total == 0.0 {
            return PolarityScores::neutral();
        }

        PolarityScores {
            negative: Self::round((neg_sum / total).abs(), 3),
            neutral: Self::round((neu_count / total).abs(), 3),
            positive: Self::round((pos_sum / total).abs(), 3),
            compound: Self::round(Self::normalize(sum), 4),
        }
    }
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
