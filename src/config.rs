use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::schema::CI_SCHEMA_VERSION;

/// Label requirements of a dynamic rule. Unset fields match any label.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RuleCondition {
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub intent: Option<String>,
}

/// Label overwrites applied when a dynamic rule matches.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RuleAction {
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub intent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DynamicRule {
    pub name: String,
    #[serde(rename = "if", default)]
    pub when: RuleCondition,
    #[serde(default)]
    pub then: RuleAction,
}

/// Rule layer configuration. Loaded once and shared read-only.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RuleConfig {
    #[serde(rename = "rules_version")]
    pub schema_version: String,
    pub neutral_phrases: Vec<String>,
    pub outcome_phrases: Vec<String>,
    pub sarcasm_phrases: Vec<String>,
    #[serde(rename = "rules")]
    pub dynamic_rules: Vec<DynamicRule>,
    #[serde(rename = "rule_decay")]
    pub decay: HashMap<String, f64>,
    pub default_decay: f64,
    pub min_confidence: f64,
}

impl RuleConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read rules from {}", path.display()))?;
        let config = Self::from_yaml(&raw)
            .with_context(|| format!("invalid rule configuration in {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            version = %config.schema_version,
            dynamic_rules = config.dynamic_rules.len(),
            "loaded rule configuration"
        );
        Ok(config)
    }

    /// Parses and validates a YAML document. Every top-level key is required.
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let mut config: RuleConfig = serde_yaml::from_str(raw)?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Decay weight for a fired rule, falling back to the default weight.
    pub fn decay_for(&self, rule: &str) -> f64 {
        self.decay.get(rule).copied().unwrap_or(self.default_decay)
    }

    fn normalize(&mut self) {
        for phrases in [
            &mut self.neutral_phrases,
            &mut self.outcome_phrases,
            &mut self.sarcasm_phrases,
        ] {
            for phrase in phrases.iter_mut() {
                *phrase = phrase.to_lowercase();
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        // A blank phrase would match every message.
        for (list, phrases) in [
            ("neutral_phrases", &self.neutral_phrases),
            ("outcome_phrases", &self.outcome_phrases),
            ("sarcasm_phrases", &self.sarcasm_phrases),
        ] {
            if let Some(index) = phrases.iter().position(|phrase| phrase.trim().is_empty()) {
                return Err(ConfigError::BlankPhrase { list, index });
            }
        }
        if !is_semver_tag(&self.schema_version) {
            return Err(ConfigError::MalformedVersion(self.schema_version.clone()));
        }
        if self.schema_version != CI_SCHEMA_VERSION {
            return Err(ConfigError::VersionMismatch {
                expected: CI_SCHEMA_VERSION.to_string(),
                found: self.schema_version.clone(),
            });
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::InvalidMinConfidence(self.min_confidence));
        }
        let weights = self
            .decay
            .iter()
            .map(|(rule, value)| (rule.as_str(), *value))
            .chain(std::iter::once(("default_decay", self.default_decay)));
        for (rule, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidDecay {
                    rule: rule.to_string(),
                    value,
                });
            }
        }
        if let Some(index) = self
            .dynamic_rules
            .iter()
            .position(|rule| rule.name.trim().is_empty())
        {
            return Err(ConfigError::UnnamedRule(index));
        }
        Ok(())
    }
}

fn is_semver_tag(version: &str) -> bool {
    let Some(rest) = version.strip_prefix('v') else {
        return false;
    };
    let parts: Vec<&str> = rest.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE_RULES: &str = r#"
rules_version: v1.0.0
neutral_phrases:
  - "just checking"
  - "for your information"
outcome_phrases:
  - "all good now"
  - "issue resolved"
sarcasm_phrases:
  - "yeah right"
  - "great, just great"
rules:
  - name: angry_neutral_override
    if:
      emotion: Angry
      sentiment: Neutral
    then:
      sentiment: Negative
  - name: complaint_neutral_override
    if:
      intent: Complaint
      sentiment: Positive
    then:
      sentiment: Neutral
rule_decay:
  sarcasm_override: 0.15
  intent_sentiment_conflict: 0.12
  angry_neutral_override: 0.10
  complaint_neutral_override: 0.08
  outcome_override: 0.07
  neutral_phrase: 0.05
default_decay: 0.06
min_confidence: 0.60
"#;

    pub(crate) fn sample_config() -> RuleConfig {
        RuleConfig::from_yaml(SAMPLE_RULES).expect("sample rules parse")
    }

    #[test]
    fn parses_sample_rules() {
        let config = sample_config();
        assert_eq!(config.schema_version, "v1.0.0");
        assert_eq!(config.dynamic_rules.len(), 2);
        assert_eq!(
            config.dynamic_rules[0].when.emotion.as_deref(),
            Some("Angry")
        );
        assert_eq!(config.dynamic_rules[1].when.emotion, None);
        assert_eq!(
            config.dynamic_rules[1].then.sentiment.as_deref(),
            Some("Neutral")
        );
    }

    #[test]
    fn shipped_rules_are_valid() {
        let config = RuleConfig::from_yaml(include_str!("../rules.yaml")).unwrap();
        assert_eq!(config.schema_version, CI_SCHEMA_VERSION);
        assert!(config.sarcasm_phrases.contains(&"yeah right".to_string()));
    }

    #[test]
    fn decay_falls_back_to_default() {
        let config = sample_config();
        assert_eq!(config.decay_for("sarcasm_override"), 0.15);
        assert_eq!(config.decay_for("some_new_rule"), 0.06);
    }

    #[test]
    fn phrases_are_lowercased() {
        let raw = SAMPLE_RULES.replace("\"yeah right\"", "\"Yeah Right\"");
        let config = RuleConfig::from_yaml(&raw).unwrap();
        assert!(config.sarcasm_phrases.contains(&"yeah right".to_string()));
    }

    #[test]
    fn missing_key_is_rejected() {
        let raw = SAMPLE_RULES.replace("min_confidence: 0.60", "");
        assert!(matches!(
            RuleConfig::from_yaml(&raw),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn malformed_version_is_rejected() {
        let raw = SAMPLE_RULES.replace("rules_version: v1.0.0", "rules_version: latest");
        assert!(matches!(
            RuleConfig::from_yaml(&raw),
            Err(ConfigError::MalformedVersion(_))
        ));
    }

    #[test]
    fn foreign_version_is_rejected() {
        let raw = SAMPLE_RULES.replace("rules_version: v1.0.0", "rules_version: v2.0.0");
        assert!(matches!(
            RuleConfig::from_yaml(&raw),
            Err(ConfigError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn blank_phrase_is_rejected() {
        let raw = SAMPLE_RULES.replace("\"issue resolved\"", "\"  \"");
        assert!(matches!(
            RuleConfig::from_yaml(&raw),
            Err(ConfigError::BlankPhrase {
                list: "outcome_phrases",
                index: 1
            })
        ));
    }

    #[test]
    fn negative_decay_is_rejected() {
        let raw = SAMPLE_RULES.replace("default_decay: 0.06", "default_decay: -0.1");
        assert!(matches!(
            RuleConfig::from_yaml(&raw),
            Err(ConfigError::InvalidDecay { .. })
        ));
    }

    #[test]
    fn semver_tags() {
        assert!(is_semver_tag("v1.0.0"));
        assert!(is_semver_tag("v10.2.33"));
        assert!(!is_semver_tag("1.0.0"));
        assert!(!is_semver_tag("v1.0"));
        assert!(!is_semver_tag("v1.x.0"));
    }
}
