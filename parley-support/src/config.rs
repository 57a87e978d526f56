use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::SupportError;

pub const ENV_GUARDRAIL_ENABLED: &str = "PARLEY_GUARDRAIL_ENABLED";
pub const ENV_PII_REDACTION: &str = "PARLEY_PII_REDACTION";
pub const ENV_MAX_MESSAGE_LEN: &str = "PARLEY_MAX_MESSAGE_LEN";

/// Rules for the support workflow's guardrail and compliance steps.
///
/// Every field has a default, so a JSON document only needs the keys it
/// changes.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SupportConfig {
    pub guardrail: GuardrailConfig,
    pub compliance: ComplianceConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GuardrailConfig {
    pub enabled: bool,
    pub redact_pii: bool,
    /// Measured in characters.
    pub max_message_len: usize,
    pub blocked_phrases: Vec<String>,
    pub refusal_message: String,
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            redact_pii: true,
            max_message_len: 10_000,
            blocked_phrases: strings(&[
                "ignore previous instructions",
                "act as a pirate",
                "system prompt",
                "developer mode",
                "you are now",
                "launder money",
                "money laundering",
                "forge a check",
                "bypass 2fa",
                "base64",
                "encoded string",
                "system override",
                "disable_content_filter",
                "unrestrained ai",
                "forget you are",
                "simulated",
                "hypothetically",
            ]),
            refusal_message: "I'm sorry, but I can't help with that request. \
                              Please contact us through an official channel if you need assistance."
                .to_string(),
        }
    }
}

/// A notice required whenever a reply mentions one of `keywords` or
/// concerns `product`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NoticeRule {
    pub product: String,
    pub keywords: Vec<String>,
    pub notice: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ComplianceConfig {
    pub prohibited_phrases: Vec<String>,
    /// Phrases that neutralise a prohibited phrase they contain, e.g.
    /// "not guaranteed" for "guaranteed".
    pub negations: Vec<String>,
    pub notices: Vec<NoticeRule>,
    pub sensitive_topics: Vec<String>,
    pub hardship_notice: String,
    pub decline_message: String,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            prohibited_phrases: strings(&[
                "guaranteed",
                "risk-free",
                "no risk",
                "can't lose",
                "zero risk",
                "100% safe",
                "definitely",
                "promise",
            ]),
            negations: strings(&["not guaranteed", "no loan is guaranteed"]),
            notices: vec![
                notice(
                    "investment",
                    &["invest", "return", "profit"],
                    "Investments can go down as well as up",
                ),
                notice(
                    "loan",
                    &["loan", "borrow", "mortgage"],
                    "Subject to status and affordability assessment",
                ),
                notice(
                    "credit",
                    &["credit", "apr", "interest rate"],
                    "Representative APR - your rate may differ",
                ),
                notice(
                    "savings",
                    &["savings", "saver"],
                    "Interest rates are variable and subject to change",
                ),
            ],
            sensitive_topics: strings(&[
                "debt",
                "bankruptcy",
                "foreclosure",
                "repossession",
                "default",
                "arrears",
            ]),
            hardship_notice: "We understand this may be a difficult situation. \
                              Free debt advice is available from MoneyHelper or StepChange."
                .to_string(),
            decline_message: "Thank you for your patience. A specialist has reviewed your request \
                              and will contact you directly to discuss suitable options."
                .to_string(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

fn notice(product: &str, keywords: &[&str], text: &str) -> NoticeRule {
    NoticeRule {
        product: product.to_string(),
        keywords: strings(keywords),
        notice: text.to_string(),
    }
}

impl SupportConfig {
    pub fn from_json_str(json: &str) -> Result<Self, SupportError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SupportError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Defaults, then `path` when given, then `PARLEY_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, SupportError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env_overrides()
    }

    pub fn with_env_overrides(self) -> Result<Self, SupportError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from any key/value source; `with_env_overrides` reads
    /// the process environment.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, SupportError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_GUARDRAIL_ENABLED) {
            self.guardrail.enabled = parse_flag(ENV_GUARDRAIL_ENABLED, &value)?;
        }
        if let Some(value) = lookup(ENV_PII_REDACTION) {
            self.guardrail.redact_pii = parse_flag(ENV_PII_REDACTION, &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_MESSAGE_LEN) {
            self.guardrail.max_message_len = value.trim().parse().map_err(|_| {
                SupportError::Config(format!("{ENV_MAX_MESSAGE_LEN} must be a number, got '{value}'"))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), SupportError> {
        if self.guardrail.max_message_len == 0 {
            return Err(SupportError::Config(
                "guardrail.max_message_len must be greater than 0".to_string(),
            ));
        }
        if let Some(rule) = self.compliance.notices.iter().find(|rule| rule.notice.trim().is_empty()) {
            return Err(SupportError::Config(format!(
                "notice for product '{}' is empty",
                rule.product
            )));
        }
        Ok(())
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, SupportError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SupportError::Config(format!(
            "{key} must be a boolean, got '{value}'"
        ))),
    }
}
