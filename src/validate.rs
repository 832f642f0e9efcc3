//! Contract checks for records crossing stage boundaries.
//!
//! These run at startup (`check`) and in tests, not per request. A failure
//! means the pipeline itself is broken.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ContractViolation;
use crate::models::{AggregateRecord, FeatureRow, ReconciledRecord};
use crate::schema::{AGGREGATE_NAMES, CI_REQUIRED_KEYS, FEATURE_NAMES};

fn as_object<T: Serialize>(record: &T) -> Result<Map<String, Value>, ContractViolation> {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(ContractViolation::NotAnObject),
    }
}

pub fn validate_ci_output(
    record: &ReconciledRecord,
    schema_version: &str,
) -> Result<(), ContractViolation> {
    validate_ci_value(&Value::Object(as_object(record)?), schema_version)
}

/// Checks a serialized CI record, e.g. one received from another service.
pub fn validate_ci_value(ci: &Value, schema_version: &str) -> Result<(), ContractViolation> {
    let Some(ci) = ci.as_object() else {
        return Err(ContractViolation::NotAnObject);
    };

    let version = ci
        .get("rules_version")
        .ok_or(ContractViolation::MissingVersion)?;
    if version.as_str() != Some(schema_version) {
        return Err(ContractViolation::VersionMismatch {
            expected: schema_version.to_string(),
            found: version.to_string(),
        });
    }

    for (key, subkeys) in CI_REQUIRED_KEYS {
        let value = ci
            .get(*key)
            .ok_or_else(|| ContractViolation::MissingKey(key.to_string()))?;
        for subkey in subkeys.iter() {
            if value.get(*subkey).is_none() {
                return Err(ContractViolation::MissingSubkey {
                    key: key.to_string(),
                    subkey: subkey.to_string(),
                });
            }
        }
    }
    Ok(())
}

pub fn validate_feature_mapping(row: &FeatureRow) -> Result<(), ContractViolation> {
    match FEATURE_NAMES.iter().find(|name| !row.contains(name)) {
        Some(name) => Err(ContractViolation::MissingFeature(name.to_string())),
        None => Ok(()),
    }
}

pub fn validate_aggregation_output(record: &AggregateRecord) -> Result<(), ContractViolation> {
    let map = as_object(record)?;
    match AGGREGATE_NAMES.iter().find(|name| !map.contains_key(**name)) {
        Some(name) => Err(ContractViolation::MissingAggregate(name.to_string())),
        None => Ok(()),
    }
}
