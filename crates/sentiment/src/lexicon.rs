use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Increment applied by an intensifier such as "very".
pub const BOOST_INCR: f64 = 0.293;
/// Decrement applied by a dampener such as "slightly".
pub const BOOST_DECR: f64 = -0.293;

/// Word valences on the -4..4 scale
const BUILTIN_VALENCES: &[(&str, f64)] = &[
    // Positive
    ("good", 1.9),
    ("great", 3.1),
    ("love", 3.2),
    ("loved", 2.9),
    ("loves", 2.7),
    ("lovely", 2.8),
    ("like", 1.5),
    ("liked", 1.8),
    ("happy", 2.7),
    ("happiness", 2.6),
    ("excellent", 2.7),
    ("amazing", 2.8),
    ("awesome", 3.1),
    ("best", 3.2),
    ("better", 1.9),
    ("nice", 1.8),
    ("wonderful", 2.7),
    ("fantastic", 2.6),
    ("fun", 2.3),
    ("glad", 2.0),
    ("thanks", 1.9),
    ("thank", 1.5),
    ("beautiful", 2.9),
    ("brilliant", 2.8),
    ("cool", 1.3),
    ("win", 2.8),
    ("winning", 2.4),
    ("won", 2.7),
    ("success", 2.7),
    ("successful", 2.8),
    ("proud", 2.1),
    ("hope", 1.9),
    ("enjoy", 2.2),
    ("enjoyed", 2.3),
    ("excited", 1.4),
    ("exciting", 2.2),
    ("perfect", 2.7),
    ("super", 2.9),
    ("yes", 1.7),
    ("lol", 1.8),
    ("haha", 2.0),
    ("smile", 1.5),
    ("congrats", 2.4),
    ("congratulations", 2.9),
    ("support", 1.7),
    ("safe", 1.9),
    ("free", 2.3),
    ("strong", 2.3),
    ("agree", 1.5),
    ("care", 2.2),
    ("peace", 2.5),
    ("friend", 2.2),
    ("friends", 2.1),
    ("celebrate", 2.7),
    ("incredible", 2.2),
    ("honored", 2.2),
    ("joy", 2.8),
    ("win-win", 2.0),
    (":)", 2.0),
    (":-)", 1.3),
    // Negative
    ("bad", -2.5),
    ("terrible", -2.1),
    ("awful", -2.0),
    ("worst", -3.1),
    ("worse", -2.1),
    ("hate", -2.7),
    ("hated", -3.2),
    ("horrible", -2.5),
    ("sad", -2.1),
    ("angry", -2.3),
    ("poor", -2.1),
    ("wrong", -2.1),
    ("fail", -2.5),
    ("failed", -2.3),
    ("failure", -2.3),
    ("lose", -1.3),
    ("lost", -1.3),
    ("loss", -1.3),
    ("disaster", -3.1),
    ("stupid", -2.4),
    ("ugly", -2.3),
    ("kill", -3.7),
    ("killed", -3.5),
    ("dead", -3.3),
    ("death", -2.9),
    ("war", -2.9),
    ("fear", -2.2),
    ("scared", -2.2),
    ("crisis", -3.1),
    ("problem", -1.7),
    ("problems", -1.7),
    ("sorry", -0.3),
    ("no", -1.2),
    ("corrupt", -3.0),
    ("fake", -2.1),
    ("lie", -1.6),
    ("lies", -1.8),
    ("liar", -3.1),
    ("disgusting", -2.4),
    ("shame", -2.1),
    ("crime", -2.5),
    ("violence", -3.1),
    ("attack", -2.1),
    ("threat", -2.4),
    ("pain", -2.3),
    ("hurt", -2.4),
    ("cry", -2.1),
    ("boring", -1.3),
    ("annoying", -1.7),
    ("disappointed", -1.9),
    ("disappointing", -2.2),
    ("weak", -1.9),
    ("broken", -2.2),
    ("sick", -2.3),
    ("tragic", -3.4),
    ("evil", -3.4),
    (":(", -1.9),
    (":-(", -1.5),
];

const INCREASERS: &[&str] = &[
    "absolutely", "amazingly", "awfully", "completely", "considerably", "decidedly",
    "deeply", "enormously", "entirely", "especially", "exceptionally", "extremely",
    "fabulously", "greatly", "highly", "hugely", "incredibly", "intensely", "majorly",
    "more", "most", "particularly", "purely", "quite", "really", "remarkably", "so",
    "substantially", "thoroughly", "totally", "tremendously", "uber", "unbelievably",
    "unusually", "utterly", "very",
];

const DECREASERS: &[&str] = &[
    "almost", "barely", "hardly", "kinda", "less", "little", "marginally",
    "occasionally", "partly", "scarcely", "slightly", "somewhat", "sorta",
];

const NEGATIONS: &[&str] = &[
    "aint", "arent", "cannot", "cant", "couldnt", "didnt", "doesnt", "dont", "hadnt",
    "hasnt", "havent", "isnt", "neither", "never", "none", "nope", "nor", "not",
    "nothing", "nowhere", "shouldnt", "wasnt", "without", "wont", "wouldnt",
];

/// Valence dictionary plus the booster and negation word lists.
#[derive(Debug, Clone)]
pub struct Lexicon {
    valences: HashMap<String, f64>,
    boosters: HashMap<String, f64>,
}

impl Lexicon {
    /// Built-in general-purpose lexicon
    pub fn new() -> Self {
        Self::with_valences(
            BUILTIN_VALENCES
                .iter()
                .map(|(w, v)| (w.to_string(), *v))
                .collect(),
        )
    }

    fn with_valences(valences: HashMap<String, f64>) -> Self {
        let boosters = INCREASERS
            .iter()
            .map(|w| (w.to_string(), BOOST_INCR))
            .chain(DECREASERS.iter().map(|w| (w.to_string(), BOOST_DECR)))
            .collect();

        Self { valences, boosters }
    }

    /// Load a `vader_lexicon.txt` style file: `word<TAB>mean<TAB>...` per line.
    ///
    /// Lines that do not parse are skipped.
    pub fn from_vader_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read lexicon file: {:?}", path))?;

        let mut valences = HashMap::new();
        let mut skipped = 0usize;

        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            let mut columns = line.split('\t');
            let parsed = match (columns.next(), columns.next()) {
                (Some(word), Some(mean)) => mean.trim().parse::<f64>().ok().map(|m| (word, m)),
                _ => None,
            };

            match parsed {
                Some((word, mean)) => {
                    valences.insert(word.trim().to_lowercase(), mean);
                }
                None => skipped += 1,
            }
        }

        if valences.is_empty() {
            anyhow::bail!("Lexicon file {:?} has no usable entries", path);
        }
        if skipped > 0 {
            warn!(path = ?path, skipped, "Skipped unparseable lexicon lines");
        }
        info!(path = ?path, words = valences.len(), "Loaded sentiment lexicon");

        Ok(Self::with_valences(valences))
    }

    pub fn valence(&self, word: &str) -> Option<f64> {
        self.valences.get(word).copied()
    }

    pub fn booster(&self, word: &str) -> Option<f64> {
        self.boosters.get(word).copied()
    }

    pub fn is_negation(&self, word: &str) -> bool {
        NEGATIONS.contains(&word) || word.contains("n't")
    }

    pub fn len(&self) -> usize {
        self.valences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valences.is_empty()
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_lookups() {
        let lexicon = Lexicon::new();
        assert!(lexicon.valence("love").unwrap() > 0.0);
        assert!(lexicon.valence("hate").unwrap() < 0.0);
        assert_eq!(lexicon.booster("very"), Some(BOOST_INCR));
        assert_eq!(lexicon.booster("slightly"), Some(BOOST_DECR));
        assert!(lexicon.is_negation("not"));
        assert!(lexicon.is_negation("don't"));
        assert!(!lexicon.is_negation("note"));
    }

    #[test]
    fn test_load_vader_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "splendid\t2.8\t0.6\t[3, 3, 2]").unwrap();
        writeln!(file, "GLOOMY\t-1.8\t0.4\t[-2, -2]").unwrap();
        writeln!(file, "garbage-line").unwrap();

        let lexicon = Lexicon::from_vader_file(file.path()).unwrap();
        assert_eq!(lexicon.len(), 2);
        assert_eq!(lexicon.valence("splendid"), Some(2.8));
        assert_eq!(lexicon.valence("gloomy"), Some(-1.8));
        assert!(lexicon.valence("good").is_none());
    }

    #[test]
    fn test_empty_file_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(Lexicon::from_vader_file(file.path()).is_err());
    }
}
