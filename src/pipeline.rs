//! The two service operations: analyze a message for a customer, and score
//! a customer's churn risk from everything analyzed so far.

use std::path::Path;

use crate::aggregate::aggregate;
use crate::audit::AuditLog;
use crate::churn::{self, ChurnModel};
use crate::classify::{ClassifierSet, FixedClassifier};
use crate::config::RuleConfig;
use crate::features::map_to_features;
use crate::models::{ChurnScore, ClassifiedMessage, ReconciledRecord, RiskLevel};
use crate::rules::reconcile;
use crate::store::HistoryStore;

pub async fn analyze_message<S: HistoryStore>(
    store: &S,
    config: &RuleConfig,
    classifiers: &ClassifierSet<'_>,
    audit: Option<&AuditLog>,
    customer_id: &str,
    text: &str,
) -> anyhow::Result<ReconciledRecord> {
    let (emotion, sentiment, intent) = classifiers.classify_all(text)?;
    let record = reconcile(text, &emotion, &sentiment, &intent, config);
    let features = map_to_features(&record);
    store.append(customer_id, features).await?;

    if let Some(log) = audit {
        log.record(customer_id, text, &record)?;
    }
    tracing::info!(
        customer_id,
        sentiment = %record.sentiment.label,
        rules = record.rules_triggered.len(),
        "analyzed message"
    );
    Ok(record)
}

/// Analyzes a message whose classifier outputs were computed upstream.
pub async fn analyze_classified<S: HistoryStore>(
    store: &S,
    config: &RuleConfig,
    audit: Option<&AuditLog>,
    message: &ClassifiedMessage,
) -> anyhow::Result<ReconciledRecord> {
    let emotion = FixedClassifier(message.emotion());
    let sentiment = FixedClassifier(message.sentiment());
    let intent = FixedClassifier(message.intent());
    let classifiers = ClassifierSet {
        emotion: &emotion,
        sentiment: &sentiment,
        intent: &intent,
    };
    analyze_message(
        store,
        config,
        &classifiers,
        audit,
        &message.customer_id,
        &message.text,
    )
    .await
}

/// `None` when the customer has no recorded messages.
pub async fn churn_score<S: HistoryStore>(
    store: &S,
    model: &dyn ChurnModel,
    customer_id: &str,
) -> anyhow::Result<Option<ChurnScore>> {
    let Some(history) = store.get(customer_id).await? else {
        tracing::debug!(customer_id, "no history recorded");
        return Ok(None);
    };

    let summary = aggregate(&history);
    let probability = churn::score(&summary, model);
    let risk_level = RiskLevel::from_probability(probability);
    tracing::info!(
        customer_id,
        messages = summary.message_count,
        probability,
        risk = %risk_level,
        "scored churn risk"
    );

    Ok(Some(ChurnScore {
        customer_id: customer_id.to_string(),
        probability,
        risk_level,
    }))
}

pub fn read_messages(path: &Path) -> anyhow::Result<Vec<ClassifiedMessage>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut messages = Vec::new();
    for result in reader.deserialize::<ClassifiedMessage>() {
        messages.push(result?);
    }
    Ok(messages)
}

/// Runs every message through `store`, in file order.
pub async fn import_messages<S: HistoryStore>(
    store: &S,
    config: &RuleConfig,
    audit: Option<&AuditLog>,
    messages: &[ClassifiedMessage],
) -> anyhow::Result<usize> {
    for message in messages {
        analyze_classified(store, config, audit, message).await?;
    }
    Ok(messages.len())
}
