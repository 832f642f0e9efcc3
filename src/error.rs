use thiserror::Error;

/// Problems with the rule or model configuration. These are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse rule configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("malformed schema version '{0}', expected vMAJOR.MINOR.PATCH")]
    MalformedVersion(String),

    #[error("rules_version '{found}' does not match schema version '{expected}'")]
    VersionMismatch { expected: String, found: String },

    #[error("decay weight for '{rule}' must be finite and non-negative, got {value}")]
    InvalidDecay { rule: String, value: f64 },

    #[error("min_confidence must lie in [0, 1], got {0}")]
    InvalidMinConfidence(f64),

    #[error("{list} entry #{index} is blank")]
    BlankPhrase { list: &'static str, index: usize },

    #[error("dynamic rule #{0} has an empty name")]
    UnnamedRule(usize),

    #[error("churn model lists {features} features but {weights} weights")]
    ModelShape { features: usize, weights: usize },
}

/// A produced record does not satisfy its schema contract.
#[derive(Debug, Error, PartialEq)]
pub enum ContractViolation {
    #[error("missing rules_version")]
    MissingVersion,

    #[error("expected rules_version={expected}, got {found}")]
    VersionMismatch { expected: String, found: String },

    #[error("missing CI key: {0}")]
    MissingKey(String),

    #[error("missing {key}.{subkey}")]
    MissingSubkey { key: String, subkey: String },

    #[error("missing feature: {0}")]
    MissingFeature(String),

    #[error("missing aggregate: {0}")]
    MissingAggregate(String),

    #[error("record did not serialize to an object")]
    NotAnObject,
}
