//! Outline similarity guard: rejects chapter outlines that repeat earlier ones.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::SimilarityConfig;

/// Result of checking one outline against its predecessors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutlineCheck {
    pub chapter_num: u32,
    pub is_valid: bool,
    /// Highest similarity to any prior outline, in `[0, 1]`.
    pub max_similarity: f64,
    /// Index into the prior outlines of the closest match.
    pub most_similar_index: Option<usize>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// Lexical near-duplicate detector using character n-gram Jaccard overlap.
#[derive(Debug, Clone, Default)]
pub struct OutlineValidator {
    config: SimilarityConfig,
}

impl OutlineValidator {
    pub fn new(config: SimilarityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimilarityConfig {
        &self.config
    }

    /// Similarity of two texts in `[0, 1]`.
    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        let grams_a = ngrams(a, self.config.ngram);
        let grams_b = ngrams(b, self.config.ngram);
        jaccard(&grams_a, &grams_b)
    }

    pub fn validate_chapter_outline(
        &self,
        new_outline: &str,
        prior_outlines: &[String],
        chapter_num: u32,
    ) -> OutlineCheck {
        let mut check = OutlineCheck {
            chapter_num,
            is_valid: true,
            ..OutlineCheck::default()
        };

        let length = significant_chars(new_outline).count();
        if length == 0 {
            check.is_valid = false;
            check.errors.push(format!("chapter {chapter_num} outline is empty"));
            return check;
        }
        if length < self.config.min_outline_chars {
            check.warnings.push(format!(
                "chapter {chapter_num} outline is very short ({length} characters)"
            ));
        }

        let grams = ngrams(new_outline, self.config.ngram);
        for (i, prior) in prior_outlines.iter().enumerate() {
            let score = jaccard(&grams, &ngrams(prior, self.config.ngram));
            if check.most_similar_index.is_none() || score > check.max_similarity {
                check.max_similarity = score;
                check.most_similar_index = Some(i);
            }
        }

        if let Some(idx) = check.most_similar_index {
            let score = check.max_similarity;
            if score >= self.config.reject_threshold {
                check.is_valid = false;
                check.errors.push(format!(
                    "chapter {chapter_num} outline nearly duplicates prior outline #{} (similarity {score:.2})",
                    idx + 1
                ));
                warn!(chapter = chapter_num, similarity = score, "near-duplicate outline");
            } else if score >= self.config.warn_threshold {
                check.warnings.push(format!(
                    "chapter {chapter_num} outline is similar to prior outline #{} (similarity {score:.2})",
                    idx + 1
                ));
            }
        }

        debug!(
            chapter = chapter_num,
            valid = check.is_valid,
            max_similarity = check.max_similarity,
            "outline checked"
        );
        check
    }
}

fn significant_chars(text: &str) -> impl Iterator<Item = char> + '_ {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
}

fn ngrams(text: &str, n: usize) -> FxHashSet<String> {
    let chars: Vec<char> = significant_chars(text).collect();
    let n = n.max(1);
    if chars.len() < n {
        return if chars.is_empty() {
            FxHashSet::default()
        } else {
            std::iter::once(chars.iter().collect::<String>()).collect()
        };
    }
    chars
        .windows(n)
        .map(|w| w.iter().collect::<String>())
        .collect()
}

fn jaccard(a: &FxHashSet<String>, b: &FxHashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    let union = a.len() + b.len() - shared;
    shared as f64 / union as f64
}
