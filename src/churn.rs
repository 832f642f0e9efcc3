use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::models::AggregateRecord;

/// A trained tabular churn classifier.
pub trait ChurnModel: Send + Sync {
    /// Feature names in the order `predict_proba` expects them.
    fn feature_names(&self) -> &[String];

    /// Positive-class probability for one row aligned to `feature_names`.
    fn predict_proba(&self, row: &[f64]) -> f64;
}

/// Logistic regression exported as `{features, weights, intercept}` JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct LogisticModel {
    features: Vec<String>,
    weights: Vec<f64>,
    intercept: f64,
}

impl LogisticModel {
    pub fn new(
        features: Vec<String>,
        weights: Vec<f64>,
        intercept: f64,
    ) -> Result<Self, ConfigError> {
        if features.len() != weights.len() {
            return Err(ConfigError::ModelShape {
                features: features.len(),
                weights: weights.len(),
            });
        }
        Ok(Self {
            features,
            weights,
            intercept,
        })
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read churn model from {}", path.display()))?;
        let model: LogisticModel = serde_json::from_str(&raw)
            .with_context(|| format!("invalid churn model in {}", path.display()))?;
        let model = Self::new(model.features, model.weights, model.intercept)?;
        tracing::info!(
            path = %path.display(),
            features = model.features.len(),
            "loaded churn model"
        );
        Ok(model)
    }
}

impl ChurnModel for LogisticModel {
    fn feature_names(&self) -> &[String] {
        &self.features
    }

    fn predict_proba(&self, row: &[f64]) -> f64 {
        let z: f64 = self.intercept
            + self
                .weights
                .iter()
                .zip(row)
                .map(|(weight, value)| weight * value)
                .sum::<f64>();
        1.0 / (1.0 + (-z).exp())
    }
}

/// Lays the aggregate out in the model's feature order. Names the aggregate
/// does not know are filled with 0.0.
pub fn feature_vector(aggregate: &AggregateRecord, expected: &[String]) -> Vec<f64> {
    expected
        .iter()
        .map(|name| aggregate.value(name).unwrap_or(0.0))
        .collect()
}

pub fn score(aggregate: &AggregateRecord, model: &dyn ChurnModel) -> f64 {
    let row = feature_vector(aggregate, model.feature_names());
    let probability = model.predict_proba(&row);
    if probability.is_finite() {
        probability.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_model() -> LogisticModel {
        LogisticModel::new(
            vec![
                "neg_ratio".to_string(),
                "last_sentiment_negative".to_string(),
                "sarcasm_count".to_string(),
                "tenure_months".to_string(),
            ],
            vec![2.0, 1.5, 0.5, -0.1],
            -1.0,
        )
        .unwrap()
    }

    #[test]
    fn vector_follows_expected_order() {
        let aggregate = AggregateRecord {
            neg_ratio: 0.5,
            last_sentiment_negative: 1.0,
            sarcasm_count: 2,
            ..AggregateRecord::default()
        };
        let names = sample_model().feature_names().to_vec();
        assert_eq!(feature_vector(&aggregate, &names), vec![0.5, 1.0, 2.0, 0.0]);
    }

    #[test]
    fn empty_aggregate_scores_intercept() {
        let probability = score(&AggregateRecord::default(), &sample_model());
        let expected = 1.0 / (1.0 + 1.0_f64.exp());
        assert!((probability - expected).abs() < 1e-9);
    }

    #[test]
    fn negative_history_raises_probability() {
        let model = sample_model();
        let calm = score(&AggregateRecord::default(), &model);
        let upset = score(
            &AggregateRecord {
                neg_ratio: 1.0,
                last_sentiment_negative: 1.0,
                sarcasm_count: 3,
                message_count: 3,
                ..AggregateRecord::default()
            },
            &model,
        );
        assert!(upset > calm);
        assert!((0.0..=1.0).contains(&upset));
    }

    #[test]
    fn rejects_mismatched_weights() {
        assert!(matches!(
            LogisticModel::new(vec!["neg_ratio".to_string()], vec![], 0.0),
            Err(ConfigError::ModelShape { .. })
        ));
    }

    #[test]
    fn shipped_model_covers_every_aggregate() {
        let model: LogisticModel = serde_json::from_str(include_str!("../churn_model.json")).unwrap();
        let model = LogisticModel::new(model.features, model.weights, model.intercept).unwrap();
        for name in model.feature_names() {
            assert!(AggregateRecord::default().value(name).is_some(), "unknown {name}");
        }
    }

    #[test]
    fn parses_exported_model() {
        let model: LogisticModel = serde_json::from_str(
            r#"{"features": ["neg_ratio"], "weights": [1.0], "intercept": 0.0}"#,
        )
        .unwrap();
        assert_eq!(model.feature_names(), ["neg_ratio".to_string()]);
        assert!((model.predict_proba(&[0.0]) - 0.5).abs() < 1e-9);
    }
}
