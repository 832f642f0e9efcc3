use crate::models::{AggregateRecord, FeatureRow};

fn mean(history: &[FeatureRow], name: &str) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    history.iter().map(|row| row.get(name)).sum::<f64>() / history.len() as f64
}

fn count(history: &[FeatureRow], name: &str) -> u64 {
    let total: f64 = history.iter().map(|row| row.get(name)).sum();
    total.max(0.0) as u64
}

/// Summarizes a customer's feature history, oldest message first.
///
/// Ratios and confidence averages describe the whole conversation while the
/// `last_*` fields only reflect the most recent message. An empty history
/// yields `AggregateRecord::default()`.
pub fn aggregate(history: &[FeatureRow]) -> AggregateRecord {
    let Some(last) = history.last() else {
        return AggregateRecord::default();
    };

    AggregateRecord {
        neg_ratio: mean(history, "sentiment_negative"),
        neutral_ratio: mean(history, "sentiment_neutral"),
        positive_ratio: mean(history, "sentiment_positive"),
        sad_ratio: mean(history, "emotion_sad"),
        angry_ratio: mean(history, "emotion_angry"),
        complaint_ratio: mean(history, "intent_complaint"),
        inquiry_ratio: mean(history, "intent_inquiry"),
        at_risk_ratio: mean(history, "customer_at_risk"),
        message_count: history.len() as u64,
        sarcasm_count: count(history, "sarcasm_flag"),
        rule_trigger_count: count(history, "rule_count"),
        avg_sentiment_confidence: mean(history, "sentiment_confidence"),
        avg_emotion_confidence: mean(history, "emotion_confidence"),
        strong_negative_ratio: mean(history, "strong_negative_signal"),
        last_customer_at_risk: last.get("customer_at_risk"),
        last_sentiment_negative: last.get("sentiment_negative"),
        last_emotion_sad: last.get("emotion_sad"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[(&str, f64)]) -> FeatureRow {
        values
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect()
    }

    fn sample_history() -> Vec<FeatureRow> {
        vec![
            row(&[
                ("sentiment_neutral", 1.0),
                ("sentiment_confidence", 0.88),
                ("emotion_sad", 1.0),
                ("emotion_confidence", 0.55),
                ("intent_inquiry", 1.0),
                ("rule_count", 2.0),
            ]),
            row(&[
                ("sentiment_neutral", 1.0),
                ("sentiment_confidence", 0.82),
                ("emotion_sad", 0.0),
                ("emotion_confidence", 0.40),
                ("intent_inquiry", 1.0),
                ("rule_count", 1.0),
            ]),
        ]
    }

    #[test]
    fn empty_history_yields_default() {
        let record = aggregate(&[]);
        assert_eq!(record, AggregateRecord::default());
        assert_eq!(record.message_count, 0);
        assert_eq!(record.neg_ratio, 0.0);
        assert_eq!(record.last_emotion_sad, 0.0);
    }

    #[test]
    fn mixes_ratios_and_last_values() {
        let record = aggregate(&sample_history());
        assert_eq!(record.message_count, 2);
        assert!((record.sad_ratio - 0.5).abs() < 1e-9);
        assert_eq!(record.last_emotion_sad, 0.0);
        assert!((record.neutral_ratio - 1.0).abs() < 1e-9);
        assert!((record.inquiry_ratio - 1.0).abs() < 1e-9);
        assert_eq!(record.rule_trigger_count, 3);
        assert!((record.avg_sentiment_confidence - 0.85).abs() < 1e-9);
        assert!((record.avg_emotion_confidence - 0.475).abs() < 1e-9);
        assert_eq!(record.neg_ratio, 0.0);
    }

    #[test]
    fn last_values_follow_order() {
        let history = vec![
            row(&[("sentiment_negative", 1.0), ("customer_at_risk", 1.0)]),
            row(&[("sentiment_negative", 0.0), ("customer_at_risk", 0.0)]),
        ];
        let forward = aggregate(&history);
        assert_eq!(forward.last_sentiment_negative, 0.0);
        assert_eq!(forward.last_customer_at_risk, 0.0);

        let reversed: Vec<FeatureRow> = history.into_iter().rev().collect();
        let backward = aggregate(&reversed);
        assert_eq!(backward.last_sentiment_negative, 1.0);
        assert_eq!(backward.last_customer_at_risk, 1.0);
        assert_eq!(forward.neg_ratio, backward.neg_ratio);
    }

    #[test]
    fn missing_features_count_as_zero() {
        let history = vec![
            row(&[("sarcasm_flag", 1.0), ("strong_negative_signal", 1.0)]),
            row(&[("emotion_angry", 1.0)]),
            FeatureRow::new(),
        ];
        let record = aggregate(&history);
        assert_eq!(record.message_count, 3);
        assert_eq!(record.sarcasm_count, 1);
        assert!((record.angry_ratio - 1.0 / 3.0).abs() < 1e-9);
        assert!((record.strong_negative_ratio - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(record.last_emotion_sad, 0.0);
    }

    #[test]
    fn ratios_stay_in_unit_interval() {
        let history: Vec<FeatureRow> = (0..7)
            .map(|i| {
                let on = if i % 3 == 0 { 1.0 } else { 0.0 };
                row(&[
                    ("sentiment_negative", on),
                    ("sentiment_positive", 1.0 - on),
                    ("customer_at_risk", on),
                ])
            })
            .collect();
        let record = aggregate(&history);
        for ratio in [
            record.neg_ratio,
            record.positive_ratio,
            record.neutral_ratio,
            record.at_risk_ratio,
        ] {
            assert!((0.0..=1.0).contains(&ratio));
        }
        assert_eq!(record.message_count, 7);
    }
}
