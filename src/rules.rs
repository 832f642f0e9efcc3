//! Consistency rules that correct known disagreements between the emotion,
//! sentiment and intent classifiers.
//!
//! Rules run in a fixed order against running labels: neutral phrases,
//! outcome phrases, sarcasm, then the configured dynamic rules in list order.
//! Every firing is recorded and each one decays the sentiment confidence.

use crate::config::{DynamicRule, RuleConfig};
use crate::models::{ClassifierResult, ReconciledRecord, SentimentResult};
use crate::schema::{RULE_NEUTRAL_PHRASE, RULE_OUTCOME_OVERRIDE, RULE_SARCASM_OVERRIDE};

pub const STATE_AT_RISK: &str = "At Risk";
pub const STATE_STABLE: &str = "Stable";
pub const PRIORITY_HIGH: &str = "High";
pub const PRIORITY_NORMAL: &str = "Normal";

struct Labels {
    emotion: String,
    sentiment: String,
    intent: String,
}

impl Labels {
    fn matches(&self, rule: &DynamicRule) -> bool {
        fn field(required: &Option<String>, current: &str) -> bool {
            required.as_deref().is_none_or(|label| label == current)
        }

        field(&rule.when.emotion, &self.emotion)
            && field(&rule.when.sentiment, &self.sentiment)
            && field(&rule.when.intent, &self.intent)
    }

    fn apply(&mut self, rule: &DynamicRule) {
        if let Some(sentiment) = &rule.then.sentiment {
            self.sentiment = sentiment.clone();
        }
        if let Some(intent) = &rule.then.intent {
            self.intent = intent.clone();
        }
    }
}

fn contains_any(text: &str, phrases: &[String]) -> bool {
    phrases.iter().any(|phrase| text.contains(phrase.as_str()))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Sentiment confidence after subtracting the decay of every fired rule,
/// floored at the configured minimum.
pub fn decayed_confidence(base: f64, rules_triggered: &[String], config: &RuleConfig) -> f64 {
    let total_decay: f64 = rules_triggered
        .iter()
        .map(|rule| config.decay_for(rule))
        .sum();
    round2(base - total_decay).max(config.min_confidence)
}

/// Customer state and priority derived from the final labels.
fn triage(emotion: &str, sentiment: &str, intent: &str) -> (&'static str, &'static str) {
    let distressed = matches!(emotion, "Angry" | "Sad") || intent == "Complaint";
    if sentiment == "Negative" && distressed {
        (STATE_AT_RISK, PRIORITY_HIGH)
    } else {
        (STATE_STABLE, PRIORITY_NORMAL)
    }
}

pub fn reconcile(
    text: &str,
    emotion: &ClassifierResult,
    sentiment: &ClassifierResult,
    intent: &ClassifierResult,
    config: &RuleConfig,
) -> ReconciledRecord {
    let text = text.to_lowercase();
    let mut labels = Labels {
        emotion: emotion.label.clone(),
        sentiment: sentiment.label.clone(),
        intent: intent.label.clone(),
    };
    let mut rules_triggered = Vec::new();

    if contains_any(&text, &config.neutral_phrases) {
        labels.sentiment = "Neutral".to_string();
        rules_triggered.push(RULE_NEUTRAL_PHRASE.to_string());
    }

    if contains_any(&text, &config.outcome_phrases)
        && matches!(labels.emotion.as_str(), "Sad" | "Calm")
    {
        labels.sentiment = "Neutral".to_string();
        rules_triggered.push(RULE_OUTCOME_OVERRIDE.to_string());
    }

    if labels.sentiment == "Positive" && contains_any(&text, &config.sarcasm_phrases) {
        labels.sentiment = "Negative".to_string();
        rules_triggered.push(RULE_SARCASM_OVERRIDE.to_string());
    }

    for rule in &config.dynamic_rules {
        if labels.matches(rule) {
            labels.apply(rule);
            rules_triggered.push(rule.name.clone());
        }
    }

    let confidence = decayed_confidence(sentiment.confidence, &rules_triggered, config);
    let (customer_state, priority) = triage(&labels.emotion, &labels.sentiment, &labels.intent);

    if !rules_triggered.is_empty() {
        tracing::debug!(
            rules = ?rules_triggered,
            sentiment = %labels.sentiment,
            confidence,
            "consistency rules fired"
        );
    }

    ReconciledRecord {
        emotion: emotion.clone(),
        sentiment: SentimentResult {
            label: labels.sentiment,
            confidence,
            overridden: !rules_triggered.is_empty(),
        },
        intent: ClassifierResult {
            label: labels.intent,
            confidence: intent.confidence,
        },
        priority: priority.to_string(),
        customer_state: customer_state.to_string(),
        rules_triggered,
        rules_version: config.schema_version.clone(),
    }
}
