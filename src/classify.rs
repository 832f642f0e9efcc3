use anyhow::bail;

use crate::models::ClassifierResult;

/// A trained text classifier for one axis (emotion, sentiment or intent).
///
/// Implementations must accept any non-empty text and report a label from
/// their own label set with a confidence in `[0, 0.99]`.
pub trait Classifier: Send + Sync {
    fn classify(&self, text: &str) -> anyhow::Result<ClassifierResult>;
}

impl ClassifierResult {
    /// Picks the most probable label from a model's output distribution.
    pub fn from_probabilities(labels: &[&str], probabilities: &[f64]) -> anyhow::Result<Self> {
        if labels.is_empty() || labels.len() != probabilities.len() {
            bail!(
                "expected one probability per label, got {} labels and {} probabilities",
                labels.len(),
                probabilities.len()
            );
        }

        let (index, best) = probabilities
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |acc, (i, p)| {
                if p > acc.1 {
                    (i, p)
                } else {
                    acc
                }
            });
        if !best.is_finite() {
            bail!("classifier produced no finite probability");
        }

        Ok(ClassifierResult::new(labels[index], best))
    }
}

/// The three classifiers run over every message.
pub struct ClassifierSet<'a> {
    pub emotion: &'a dyn Classifier,
    pub sentiment: &'a dyn Classifier,
    pub intent: &'a dyn Classifier,
}

impl ClassifierSet<'_> {
    pub fn classify_all(
        &self,
        text: &str,
    ) -> anyhow::Result<(ClassifierResult, ClassifierResult, ClassifierResult)> {
        Ok((
            self.emotion.classify(text)?,
            self.sentiment.classify(text)?,
            self.intent.classify(text)?,
        ))
    }
}

/// Returns the same result for every text. Used for messages that were
/// classified upstream.
pub struct FixedClassifier(pub ClassifierResult);

impl Classifier for FixedClassifier {
    fn classify(&self, _text: &str) -> anyhow::Result<ClassifierResult> {
        Ok(self.0.clone())
    }
}
