use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::aggregate::aggregate;
use crate::models::{ChurnScore, FeatureRow};
use crate::schema::{EMOTION_LABELS, INTENT_LABELS, SENTIMENT_LABELS};

const SIGNALS: [(&str, &str); 6] = [
    ("sentiment_overridden", "sentiment corrected by rules"),
    ("sarcasm_flag", "sarcasm"),
    ("neutral_phrase_flag", "neutral phrasing"),
    ("strong_negative_signal", "strong negative sentiment"),
    ("emotional_distress", "emotional distress"),
    ("passive_dissatisfaction", "passive dissatisfaction"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct SignalSummary {
    pub signal: &'static str,
    pub count: usize,
}

pub fn summarize_signals(history: &[FeatureRow]) -> Vec<SignalSummary> {
    let mut summaries: Vec<SignalSummary> = SIGNALS
        .iter()
        .map(|&(feature, signal)| SignalSummary {
            signal,
            count: history.iter().filter(|row| row.get(feature) > 0.0).count(),
        })
        .filter(|summary| summary.count > 0)
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count));
    summaries
}

/// The label whose one-hot feature is set, if any.
fn label<'a>(row: &FeatureRow, prefix: &str, labels: &[&'a str]) -> &'a str {
    labels
        .iter()
        .find(|candidate| row.get(&format!("{prefix}_{candidate}")) > 0.0)
        .copied()
        .unwrap_or("unknown")
}

pub fn build_report(
    customer_id: &str,
    score: Option<&ChurnScore>,
    history: &[FeatureRow],
    recent: &[(DateTime<Utc>, FeatureRow)],
) -> String {
    let summary = aggregate(history);
    let signals = summarize_signals(history);

    let mut output = String::new();

    let _ = writeln!(output, "# Churn Risk Report");
    let _ = writeln!(
        output,
        "Customer {} ({} messages analyzed)",
        customer_id, summary.message_count
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Churn Score");

    match score {
        Some(score) => {
            let _ = writeln!(
                output,
                "- probability {:.2} ({} risk)",
                score.probability, score.risk_level
            );
        }
        None => {
            let _ = writeln!(output, "No messages recorded for this customer.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Conversation Tone");
    let _ = writeln!(
        output,
        "- negative {:.0}%, neutral {:.0}%, positive {:.0}%",
        summary.neg_ratio * 100.0,
        summary.neutral_ratio * 100.0,
        summary.positive_ratio * 100.0
    );
    let _ = writeln!(
        output,
        "- sad {:.0}%, angry {:.0}%, complaints {:.0}%",
        summary.sad_ratio * 100.0,
        summary.angry_ratio * 100.0,
        summary.complaint_ratio * 100.0
    );
    let _ = writeln!(
        output,
        "- {} rule corrections, {} sarcastic messages",
        summary.rule_trigger_count, summary.sarcasm_count
    );
    let _ = writeln!(
        output,
        "- last message: {}",
        if summary.last_customer_at_risk > 0.0 {
            "customer at risk"
        } else {
            "customer stable"
        }
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Signal Mix");

    if signals.is_empty() {
        let _ = writeln!(output, "No risk signals raised.");
    } else {
        for signal in signals.iter() {
            let _ = writeln!(output, "- {}: {} messages", signal.signal, signal.count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Messages");

    if recent.is_empty() {
        let _ = writeln!(output, "No messages recorded.");
    } else {
        for (at, row) in recent.iter().take(5) {
            let _ = writeln!(
                output,
                "- {}: {} sentiment ({:.2}), {} emotion, {} intent",
                at.format("%Y-%m-%d %H:%M"),
                label(row, "sentiment", &SENTIMENT_LABELS),
                row.get("sentiment_confidence"),
                label(row, "emotion", &EMOTION_LABELS),
                label(row, "intent", &INTENT_LABELS),
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskLevel;
    use chrono::TimeZone;

    fn row(values: &[(&str, f64)]) -> FeatureRow {
        values
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect()
    }

    #[test]
    fn signals_sorted_by_frequency() {
        let history = vec![
            row(&[("sarcasm_flag", 1.0), ("sentiment_overridden", 1.0)]),
            row(&[("sentiment_overridden", 1.0)]),
            row(&[]),
        ];
        let signals = summarize_signals(&history);
        assert_eq!(signals.len(), 2);
        assert_eq!(signals[0].signal, "sentiment corrected by rules");
        assert_eq!(signals[0].count, 2);
        assert_eq!(signals[1].signal, "sarcasm");
    }

    #[test]
    fn report_lists_score_and_recent_messages() {
        let message = row(&[
            ("sentiment_negative", 1.0),
            ("sentiment_confidence", 0.81),
            ("emotion_angry", 1.0),
            ("intent_complaint", 1.0),
            ("customer_at_risk", 1.0),
        ]);
        let score = ChurnScore {
            customer_id: "c-9".to_string(),
            probability: 0.82,
            risk_level: RiskLevel::High,
        };
        let at = Utc.with_ymd_and_hms(2026, 3, 4, 10, 30, 0).unwrap();
        let report = build_report("c-9", Some(&score), &[message.clone()], &[(at, message)]);

        assert!(report.contains("Customer c-9 (1 messages analyzed)"));
        assert!(report.contains("probability 0.82 (High risk)"));
        assert!(report.contains("- negative 100%"));
        assert!(report.contains("customer at risk"));
        assert!(report.contains(
            "- 2026-03-04 10:30: negative sentiment (0.81), angry emotion, complaint intent"
        ));
    }

    #[test]
    fn empty_report_says_so() {
        let report = build_report("nobody", None, &[], &[]);
        assert!(report.contains("No messages recorded for this customer."));
        assert!(report.contains("No risk signals raised."));
        assert!(report.contains("Customer nobody (0 messages analyzed)"));
    }
}
