//! Turns a reconciled record into the numeric feature row the churn model
//! consumes. Pure and deterministic: the same record always yields the same
//! row.

use crate::models::{FeatureRow, ReconciledRecord};
use crate::schema::{
    EMOTION_LABELS, INTENT_LABELS, RULE_NEUTRAL_PHRASE, RULE_OUTCOME_SOFTENED,
    RULE_SARCASM_OVERRIDE, SENTIMENT_LABELS,
};

fn flag(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}

fn one_hot(row: &mut FeatureRow, prefix: &str, labels: &[&str], label: &str) {
    for candidate in labels {
        row.insert(&format!("{prefix}_{candidate}"), flag(*candidate == label));
    }
}

pub fn map_to_features(record: &ReconciledRecord) -> FeatureRow {
    let mut row = FeatureRow::new();

    let sentiment = record.sentiment.label.to_lowercase();
    let sentiment_confidence = record.sentiment.confidence;
    one_hot(&mut row, "sentiment", &SENTIMENT_LABELS, &sentiment);
    row.insert("sentiment_confidence", sentiment_confidence);
    row.insert("sentiment_overridden", flag(record.sentiment.overridden));

    let emotion = record.emotion.label.to_lowercase();
    let emotion_confidence = record.emotion.confidence;
    one_hot(&mut row, "emotion", &EMOTION_LABELS, &emotion);
    row.insert("emotion_confidence", emotion_confidence);

    let intent = record.intent.label.to_lowercase();
    one_hot(&mut row, "intent", &INTENT_LABELS, &intent);
    row.insert("intent_confidence", record.intent.confidence);

    let customer_state = record.customer_state.to_lowercase();
    row.insert("customer_at_risk", flag(customer_state == "at risk"));
    row.insert("customer_stable", flag(customer_state == "stable"));
    row.insert("priority_high", flag(record.priority.to_lowercase() == "high"));

    let fired = |name: &str| record.rules_triggered.iter().any(|rule| rule == name);
    let sarcasm = fired(RULE_SARCASM_OVERRIDE);
    row.insert("rule_count", record.rules_triggered.len() as f64);
    row.insert("sarcasm_flag", flag(sarcasm));
    row.insert("neutral_phrase_flag", flag(fired(RULE_NEUTRAL_PHRASE)));
    row.insert("outcome_softened_flag", flag(fired(RULE_OUTCOME_SOFTENED)));

    let negative = sentiment == "negative";
    row.insert(
        "strong_negative_signal",
        flag(negative && sentiment_confidence > 0.75),
    );
    row.insert(
        "emotional_distress",
        flag(matches!(emotion.as_str(), "sad" | "angry") && emotion_confidence > 0.5),
    );
    row.insert("passive_dissatisfaction", flag(sarcasm && negative));

    row
}
