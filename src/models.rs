use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Highest confidence a classifier may report.
pub const MAX_CLASSIFIER_CONFIDENCE: f64 = 0.99;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierResult {
    pub label: String,
    pub confidence: f64,
}

impl ClassifierResult {
    /// Builds a result, clamping the confidence into `[0, 0.99]`.
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, MAX_CLASSIFIER_CONFIDENCE)
        } else {
            0.0
        };
        Self {
            label: label.into(),
            confidence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub label: String,
    pub confidence: f64,
    pub overridden: bool,
}

/// Conversation-intelligence output for a single message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledRecord {
    pub emotion: ClassifierResult,
    pub sentiment: SentimentResult,
    pub intent: ClassifierResult,
    pub priority: String,
    pub customer_state: String,
    pub rules_triggered: Vec<String>,
    pub rules_version: String,
}

/// Numeric features for one analyzed message, keyed by feature name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureRow(BTreeMap<String, f64>);

impl FeatureRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: f64) {
        self.0.insert(name.to_string(), value);
    }

    /// Value for `name`, or 0.0 when the row does not carry it.
    pub fn get(&self, name: &str) -> f64 {
        self.0.get(name).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, f64)> for FeatureRow {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Customer-level summary of a message history.
///
/// `Default` is the record returned for an empty history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateRecord {
    pub neg_ratio: f64,
    pub neutral_ratio: f64,
    pub positive_ratio: f64,
    pub sad_ratio: f64,
    pub angry_ratio: f64,
    pub complaint_ratio: f64,
    pub inquiry_ratio: f64,
    pub at_risk_ratio: f64,
    pub message_count: u64,
    pub sarcasm_count: u64,
    pub rule_trigger_count: u64,
    pub avg_sentiment_confidence: f64,
    pub avg_emotion_confidence: f64,
    pub strong_negative_ratio: f64,
    pub last_customer_at_risk: f64,
    pub last_sentiment_negative: f64,
    pub last_emotion_sad: f64,
}

impl AggregateRecord {
    /// Looks up an aggregate by its schema name.
    pub fn value(&self, name: &str) -> Option<f64> {
        let value = match name {
            "neg_ratio" => self.neg_ratio,
            "neutral_ratio" => self.neutral_ratio,
            "positive_ratio" => self.positive_ratio,
            "sad_ratio" => self.sad_ratio,
            "angry_ratio" => self.angry_ratio,
            "complaint_ratio" => self.complaint_ratio,
            "inquiry_ratio" => self.inquiry_ratio,
            "at_risk_ratio" => self.at_risk_ratio,
            "message_count" => self.message_count as f64,
            "sarcasm_count" => self.sarcasm_count as f64,
            "rule_trigger_count" => self.rule_trigger_count as f64,
            "avg_sentiment_confidence" => self.avg_sentiment_confidence,
            "avg_emotion_confidence" => self.avg_emotion_confidence,
            "strong_negative_ratio" => self.strong_negative_ratio,
            "last_customer_at_risk" => self.last_customer_at_risk,
            "last_sentiment_negative" => self.last_sentiment_negative,
            "last_emotion_sad" => self.last_emotion_sad,
            _ => return None,
        };
        Some(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Buckets a churn probability. Both thresholds are exclusive, so 0.4
    /// is Low and 0.7 is Medium.
    pub fn from_probability(probability: f64) -> Self {
        if probability > 0.7 {
            RiskLevel::High
        } else if probability > 0.4 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurnScore {
    pub customer_id: String,
    pub probability: f64,
    pub risk_level: RiskLevel,
}

/// A message whose three classifier outputs are already known, as read from
/// an import file.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifiedMessage {
    pub customer_id: String,
    pub text: String,
    pub emotion: String,
    pub emotion_confidence: f64,
    pub sentiment: String,
    pub sentiment_confidence: f64,
    pub intent: String,
    pub intent_confidence: f64,
}

impl ClassifiedMessage {
    pub fn emotion(&self) -> ClassifierResult {
        ClassifierResult::new(&self.emotion, self.emotion_confidence)
    }

    pub fn sentiment(&self) -> ClassifierResult {
        ClassifierResult::new(&self.sentiment, self.sentiment_confidence)
    }

    pub fn intent(&self) -> ClassifierResult {
        ClassifierResult::new(&self.intent, self.intent_confidence)
    }
}
