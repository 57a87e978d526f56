use regex::Regex;

use crate::config::GuardrailConfig;
use crate::SupportError;

const PII_PATTERNS: [(&str, &str); 3] = [
    ("EMAIL", r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b"),
    // Cards run before phones so a long digit run is never partly taken as a phone.
    ("CREDIT_CARD", r"\b(?:\d{4}[-\s]?){3}\d{4}\b"),
    ("PHONE_UK", r"(?:\+44\s?|\b0)(?:7\d{3}|\d{4})\s?\d{6}\b"),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Allowed {
        /// Set only when at least one PII pattern matched.
        redacted: Option<String>,
        redactions: Vec<&'static str>,
    },
    Blocked {
        reason: String,
    },
}

impl Verdict {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Verdict::Blocked { .. })
    }
}

/// Screens inbound messages for injection attempts and masks PII.
#[derive(Clone, Debug)]
pub struct Guardrail {
    enabled: bool,
    redact_pii: bool,
    max_message_len: usize,
    blocked_phrases: Vec<String>,
    refusal_message: String,
    pii: Vec<(&'static str, Regex)>,
}

impl Guardrail {
    pub fn new(config: &GuardrailConfig) -> Result<Self, SupportError> {
        let pii = PII_PATTERNS
            .iter()
            .map(|(label, pattern)| {
                Regex::new(pattern)
                    .map(|regex| (*label, regex))
                    .map_err(|err| SupportError::Config(format!("{label} pattern: {err}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enabled: config.enabled,
            redact_pii: config.redact_pii,
            max_message_len: config.max_message_len,
            blocked_phrases: config
                .blocked_phrases
                .iter()
                .map(|phrase| phrase.to_lowercase())
                .collect(),
            refusal_message: config.refusal_message.clone(),
            pii,
        })
    }

    pub fn refusal_message(&self) -> &str {
        &self.refusal_message
    }

    pub fn check(&self, message: &str) -> Verdict {
        if !self.enabled {
            return Verdict::Allowed {
                redacted: None,
                redactions: Vec::new(),
            };
        }

        let lowered = message.to_lowercase();
        if let Some(phrase) = self
            .blocked_phrases
            .iter()
            .find(|phrase| lowered.contains(phrase.as_str()))
        {
            return Verdict::Blocked {
                reason: format!("blocked phrase detected: '{phrase}'"),
            };
        }

        if message.chars().count() > self.max_message_len {
            return Verdict::Blocked {
                reason: format!("message exceeds {} characters", self.max_message_len),
            };
        }

        if !self.redact_pii {
            return Verdict::Allowed {
                redacted: None,
                redactions: Vec::new(),
            };
        }

        let (text, redactions) = self.redact(message);
        Verdict::Allowed {
            redacted: (!redactions.is_empty()).then_some(text),
            redactions,
        }
    }

    /// Replaces every PII match with `[LABEL_REDACTED]`, returning the labels that matched.
    pub fn redact(&self, text: &str) -> (String, Vec<&'static str>) {
        let mut redacted = text.to_string();
        let mut labels = Vec::new();
        for (label, regex) in &self.pii {
            if regex.is_match(&redacted) {
                redacted = regex
                    .replace_all(&redacted, format!("[{label}_REDACTED]").as_str())
                    .into_owned();
                labels.push(*label);
            }
        }
        (redacted, labels)
    }
}
