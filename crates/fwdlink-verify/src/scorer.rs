//! # Relevance Scorers
//!
//! `score(text_a, text_b) -> [0, 1]`. The verifier applies the threshold;
//! scorers only measure similarity. Texts arrive already normalized and
//! truncated.
//!
//! [`TfIdfScorer`] is the built-in scorer: TF-IDF vectors over the two
//! texts, cosine similarity. An embedding service plugs in by implementing
//! [`RelevanceScorer`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ScoreError;

/// Similarity between two texts.
#[async_trait]
pub trait RelevanceScorer: Send + Sync {
    async fn score(&self, text_a: &str, text_b: &str) -> Result<f64, ScoreError>;
}

#[async_trait]
impl<T: RelevanceScorer + ?Sized> RelevanceScorer for Arc<T> {
    async fn score(&self, text_a: &str, text_b: &str) -> Result<f64, ScoreError> {
        (**self).score(text_a, text_b).await
    }
}

/// Cosine similarity of smoothed TF-IDF vectors.
///
/// With the two texts as the corpus, `idf(t) = ln((1 + 2) / (1 + df(t))) + 1`,
/// so terms found in both texts weigh 1 and terms unique to one text weigh
/// about 1.405. Tokens are maximal alphanumeric runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TfIdfScorer;

impl TfIdfScorer {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous scoring; the async trait method delegates here.
    pub fn similarity(&self, text_a: &str, text_b: &str) -> f64 {
        let tf_a = term_counts(text_a);
        let tf_b = term_counts(text_b);
        if tf_a.is_empty() || tf_b.is_empty() {
            return 0.0;
        }

        let n_docs = 2.0_f64;
        let idf = |term: &str| {
            let df = f64::from(u8::from(tf_a.contains_key(term)) + u8::from(tf_b.contains_key(term)));
            ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0
        };

        let weights = |tf: &HashMap<&str, u32>| -> HashMap<String, f64> {
            tf.iter()
                .map(|(t, c)| ((*t).to_string(), f64::from(*c) * idf(*t)))
                .collect()
        };
        let w_a = weights(&tf_a);
        let w_b = weights(&tf_b);

        let dot: f64 = w_a
            .iter()
            .filter_map(|(t, wa)| w_b.get(t).map(|wb| wa * wb))
            .sum();
        let norm = |w: &HashMap<String, f64>| w.values().map(|x| x * x).sum::<f64>().sqrt();
        let denom = norm(&w_a) * norm(&w_b);
        if denom == 0.0 {
            return 0.0;
        }
        (dot / denom).clamp(0.0, 1.0)
    }
}

#[async_trait]
impl RelevanceScorer for TfIdfScorer {
    async fn score(&self, text_a: &str, text_b: &str) -> Result<f64, ScoreError> {
        Ok(self.similarity(text_a, text_b))
    }
}

fn term_counts(text: &str) -> HashMap<&str, u32> {
    let mut counts = HashMap::new();
    for token in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
        *counts.entry(token).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_texts_score_one() {
        let s = TfIdfScorer.similarity("solar panel efficiency", "solar panel efficiency");
        assert!((s - 1.0).abs() < 1e-9, "got {s}");
    }

    #[test]
    fn test_disjoint_texts_score_zero() {
        assert_eq!(TfIdfScorer.similarity("solar panel", "banana bread"), 0.0);
    }

    #[test]
    fn test_empty_text_scores_zero() {
        assert_eq!(TfIdfScorer.similarity("", "solar"), 0.0);
        assert_eq!(TfIdfScorer.similarity("...", "solar"), 0.0);
    }

    #[test]
    fn test_partial_overlap_known_value() {
        // a = {x, y}, b = {x, z}: shared x weighs 1, y and z weigh w.
        // cos = 1 / (1 + w^2)
        let w = (1.5_f64).ln() + 1.0;
        let expected = 1.0 / (1.0 + w * w);
        let s = TfIdfScorer.similarity("x y", "x z");
        assert!((s - expected).abs() < 1e-9, "got {s}, want {expected}");
    }

    #[test]
    fn test_symmetric() {
        let a = "forward link attestation for example org";
        let b = "example org publishes forward link manifests";
        assert!((TfIdfScorer.similarity(a, b) - TfIdfScorer.similarity(b, a)).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_trait_delegates() {
        let scorer: Arc<dyn RelevanceScorer> = Arc::new(TfIdfScorer::new());
        let s = scorer.score("a b c", "a b c").await.unwrap();
        assert!((s - 1.0).abs() < 1e-9);
    }
}
