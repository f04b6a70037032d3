use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::ChatResponder;

const MAX_HISTORY: usize = 50;

/// One pattern/template rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Upper-case words; `*` or `_` match one or more input words
    pub pattern: String,
    /// Reply text; `{star}` and `{get:NAME}` are substituted
    pub template: String,
    /// Predicates learned when this category fires
    #[serde(default)]
    pub set: HashMap<String, String>,
}

/// Startup knowledge: the rules a fresh brain learns from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Knowledge {
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct BrainState {
    categories: Vec<Category>,
    predicates: HashMap<String, String>,
    history: VecDeque<String>,
}

/// Pattern-matching chat engine whose learned state lives in a brain file.
#[derive(Debug)]
pub struct Brain {
    state: BrainState,
    brain_file: PathBuf,
}

impl Brain {
    pub fn new(knowledge: Knowledge, brain_file: impl Into<PathBuf>) -> Self {
        Self {
            state: BrainState {
                categories: knowledge.categories,
                ..Default::default()
            },
            brain_file: brain_file.into(),
        }
    }

    /// Load `brain_file` if it exists, otherwise learn `knowledge_file` and
    /// save the fresh brain straight away.
    pub async fn bootstrap(brain_file: &Path, knowledge_file: &Path) -> Result<Self> {
        if tokio::fs::try_exists(brain_file).await.unwrap_or(false) {
            let json = tokio::fs::read_to_string(brain_file)
                .await
                .context(format!("Failed to read brain file: {:?}", brain_file))?;
            let state: BrainState = serde_json::from_str(&json)
                .context(format!("Failed to parse brain file: {:?}", brain_file))?;

            info!(
                brain = ?brain_file,
                categories = state.categories.len(),
                "Loaded brain"
            );
            return Ok(Self {
                state,
                brain_file: brain_file.to_path_buf(),
            });
        }

        let json = tokio::fs::read_to_string(knowledge_file)
            .await
            .context(format!("Failed to read knowledge file: {:?}", knowledge_file))?;
        let knowledge: Knowledge = serde_json::from_str(&json)
            .context(format!("Failed to parse knowledge file: {:?}", knowledge_file))?;

        info!(
            knowledge = ?knowledge_file,
            categories = knowledge.categories.len(),
            "Learned startup knowledge"
        );

        let brain = Self::new(knowledge, brain_file);
        brain.save().await?;
        Ok(brain)
    }

    pub fn predicate(&self, name: &str) -> Option<&str> {
        self.state.predicates.get(name).map(String::as_str)
    }

    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.state.history.iter().map(String::as_str)
    }

    /// Produce a reply without touching learned state.
    pub fn reply(&self, input: &str) -> Option<(String, HashMap<String, String>)> {
        let words = normalize(input);
        let word_refs: Vec<&str> = words.iter().map(String::as_str).collect();

        let mut best: Option<(&Category, Vec<String>, (usize, usize))> = None;

        for category in &self.state.categories {
            let pattern: Vec<String> = normalize_pattern(&category.pattern);
            let pattern_refs: Vec<&str> = pattern.iter().map(String::as_str).collect();

            let mut stars = Vec::new();
            if !match_words(&pattern_refs, &word_refs, &mut stars) {
                continue;
            }

            // More literal words first, then fewer wildcards
            let wildcards = pattern_refs.iter().filter(|w| is_wildcard(w)).count();
            let rank = (pattern_refs.len() - wildcards, usize::MAX - wildcards);

            if best.as_ref().is_none_or(|(_, _, r)| rank > *r) {
                best = Some((category, stars, rank));
            }
        }

        let (category, stars, _) = best?;
        let star = stars.first().map(|s| s.to_lowercase()).unwrap_or_default();

        let learned = category
            .set
            .iter()
            .map(|(k, v)| (k.clone(), self.render(v, &star)))
            .collect();

        Some((self.render(&category.template, &star), learned))
    }

    fn render(&self, template: &str, star: &str) -> String {
        let mut out = template.replace("{star}", star);

        while let Some(start) = out.find("{get:") {
            let Some(len) = out[start..].find('}') else {
                break;
            };
            let name = &out[start + 5..start + len];
            let value = self.predicate(name).unwrap_or_default().to_string();
            out.replace_range(start..start + len + 1, &value);
        }

        out.trim().to_string()
    }
}

#[async_trait]
impl ChatResponder for Brain {
    async fn respond(&mut self, input: &str) -> Result<String> {
        let response = match self.reply(input) {
            Some((response, learned)) => {
                self.state.predicates.extend(learned);
                response
            }
            None => {
                debug!(input, "No category matched");
                String::new()
            }
        };

        self.state.predicates.insert("that".to_string(), response.clone());
        self.state.history.push_back(input.trim().to_string());
        while self.state.history.len() > MAX_HISTORY {
            self.state.history.pop_front();
        }

        Ok(response)
    }

    async fn save(&self) -> Result<()> {
        if let Some(parent) = self.brain_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(&self.state)?;
        tokio::fs::write(&self.brain_file, json)
            .await
            .context(format!("Failed to write brain file: {:?}", self.brain_file))?;

        debug!(brain = ?self.brain_file, "Saved brain");
        Ok(())
    }
}

fn normalize(input: &str) -> Vec<String> {
    input
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '\'' { c } else { ' ' })
        .collect::<String>()
        .to_uppercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn normalize_pattern(pattern: &str) -> Vec<String> {
    pattern
        .split_whitespace()
        .map(|w| if is_wildcard(w) { w.to_string() } else { w.to_uppercase() })
        .collect()
}

fn is_wildcard(word: &str) -> bool {
    word == "*" || word == "_"
}

fn match_words(pattern: &[&str], input: &[&str], stars: &mut Vec<String>) -> bool {
    match pattern.split_first() {
        None => input.is_empty(),
        Some((head, rest)) if is_wildcard(head) => {
            for taken in 1..=input.len() {
                let mark = stars.len();
                stars.push(input[..taken].join(" "));
                if match_words(rest, &input[taken..], stars) {
                    return true;
                }
                stars.truncate(mark);
            }
            false
        }
        Some((head, rest)) => match input.split_first() {
            Some((word, remaining)) if word == head => match_words(rest, remaining, stars),
            _ => false,
        },
    }
}
