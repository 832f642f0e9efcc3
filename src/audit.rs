use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::ReconciledRecord;

#[derive(Debug, Serialize)]
struct RuleHit<'a> {
    customer_id: &'a str,
    text: &'a str,
    rules_triggered: &'a [String],
    rules_version: &'a str,
    timestamp: DateTime<Utc>,
}

/// Append-only JSON-lines log of which rules fired for each message.
pub struct AuditLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl AuditLog {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open audit log {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn record(
        &self,
        customer_id: &str,
        text: &str,
        record: &ReconciledRecord,
    ) -> anyhow::Result<()> {
        let hit = RuleHit {
            customer_id,
            text,
            rules_triggered: &record.rules_triggered,
            rules_version: &record.rules_version,
            timestamp: Utc::now(),
        };
        let mut line = serde_json::to_string(&hit)?;
        line.push('\n');

        let mut file = self
            .file
            .lock()
            .map_err(|_| anyhow::anyhow!("audit log lock poisoned"))?;
        file.write_all(line.as_bytes())
            .with_context(|| format!("failed to write audit log {}", self.path.display()))?;
        Ok(())
    }
}
