//! Field contracts shared by every stage of the pipeline.
//!
//! Downstream consumers (the churn model in particular) are trained against
//! these names, so changes here are breaking changes.

pub const CI_SCHEMA_VERSION: &str = "v1.0.0";

/// Top-level keys of a reconciled record, with the subkeys each must carry.
pub const CI_REQUIRED_KEYS: &[(&str, &[&str])] = &[
    ("emotion", &["label", "confidence"]),
    ("sentiment", &["label", "confidence", "overridden"]),
    ("intent", &["label", "confidence"]),
    ("priority", &[]),
    ("customer_state", &[]),
    ("rules_triggered", &[]),
    ("rules_version", &[]),
];

pub const FEATURE_NAMES: [&str; 27] = [
    "sentiment_positive",
    "sentiment_neutral",
    "sentiment_negative",
    "sentiment_confidence",
    "sentiment_overridden",
    "emotion_happy",
    "emotion_sad",
    "emotion_angry",
    "emotion_calm",
    "emotion_neutral",
    "emotion_confidence",
    "intent_inquiry",
    "intent_complaint",
    "intent_appreciation",
    "intent_feedback",
    "intent_request",
    "intent_confidence",
    "customer_at_risk",
    "customer_stable",
    "priority_high",
    "rule_count",
    "sarcasm_flag",
    "neutral_phrase_flag",
    "outcome_softened_flag",
    "strong_negative_signal",
    "emotional_distress",
    "passive_dissatisfaction",
];

pub const AGGREGATE_NAMES: [&str; 17] = [
    "neg_ratio",
    "neutral_ratio",
    "positive_ratio",
    "sad_ratio",
    "angry_ratio",
    "complaint_ratio",
    "inquiry_ratio",
    "at_risk_ratio",
    "message_count",
    "sarcasm_count",
    "rule_trigger_count",
    "avg_sentiment_confidence",
    "avg_emotion_confidence",
    "strong_negative_ratio",
    "last_customer_at_risk",
    "last_sentiment_negative",
    "last_emotion_sad",
];

pub const SENTIMENT_LABELS: [&str; 3] = ["positive", "neutral", "negative"];
pub const EMOTION_LABELS: [&str; 5] = ["happy", "sad", "angry", "calm", "neutral"];
pub const INTENT_LABELS: [&str; 5] = ["inquiry", "complaint", "appreciation", "feedback", "request"];

// Built-in rule names emitted by the consistency engine.
pub const RULE_NEUTRAL_PHRASE: &str = "neutral_phrase";
pub const RULE_OUTCOME_OVERRIDE: &str = "outcome_override";
pub const RULE_SARCASM_OVERRIDE: &str = "sarcasm_override";

/// Rule name the outcome-softened feature flag looks for. The engine emits
/// `outcome_override` for that condition, so this flag stays 0.0 unless a
/// dynamic rule is configured under this exact name.
pub const RULE_OUTCOME_SOFTENED: &str = "outcome_sad_neutral";

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique() {
        let features: HashSet<_> = FEATURE_NAMES.iter().collect();
        assert_eq!(features.len(), FEATURE_NAMES.len());
        let aggregates: HashSet<_> = AGGREGATE_NAMES.iter().collect();
        assert_eq!(aggregates.len(), AGGREGATE_NAMES.len());
    }

    #[test]
    fn one_hot_features_cover_label_sets() {
        for label in SENTIMENT_LABELS {
            assert!(FEATURE_NAMES.contains(&format!("sentiment_{label}").as_str()));
        }
        for label in EMOTION_LABELS {
            assert!(FEATURE_NAMES.contains(&format!("emotion_{label}").as_str()));
        }
        for label in INTENT_LABELS {
            assert!(FEATURE_NAMES.contains(&format!("intent_{label}").as_str()));
        }
    }
}
