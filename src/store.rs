use std::collections::HashMap;
use std::future::Future;

use tokio::sync::RwLock;

use crate::models::FeatureRow;

/// Per-customer message history, oldest row first.
pub trait HistoryStore: Send + Sync {
    fn append(
        &self,
        customer_id: &str,
        row: FeatureRow,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// `None` when nothing has been recorded for the customer.
    fn get(
        &self,
        customer_id: &str,
    ) -> impl Future<Output = anyhow::Result<Option<Vec<FeatureRow>>>> + Send;
}

#[derive(Debug, Default)]
pub struct InMemoryHistory {
    rows: RwLock<HashMap<String, Vec<FeatureRow>>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn customers(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.rows.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl HistoryStore for InMemoryHistory {
    async fn append(&self, customer_id: &str, row: FeatureRow) -> anyhow::Result<()> {
        self.rows
            .write()
            .await
            .entry(customer_id.to_string())
            .or_default()
            .push(row);
        Ok(())
    }

    async fn get(&self, customer_id: &str) -> anyhow::Result<Option<Vec<FeatureRow>>> {
        Ok(self.rows.read().await.get(customer_id).cloned())
    }
}
