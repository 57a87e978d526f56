use serde::{Deserialize, Serialize};

use crate::config::{ComplianceConfig, NoticeRule};

/// Outcome of checking one reply against the compliance rules.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ComplianceReview {
    pub issues: Vec<String>,
    pub notices: Vec<String>,
    pub checked_content: String,
}

impl ComplianceReview {
    /// Any hard-rule issue sends the reply to human review.
    pub fn is_approved(&self) -> bool {
        self.issues.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct ComplianceRules {
    prohibited_phrases: Vec<String>,
    negations: Vec<String>,
    notices: Vec<NoticeRule>,
    sensitive_topics: Vec<String>,
    hardship_notice: String,
    decline_message: String,
}

impl ComplianceRules {
    pub fn new(config: &ComplianceConfig) -> Self {
        let lower = |items: &[String]| -> Vec<String> {
            items.iter().map(|item| item.to_lowercase()).collect()
        };
        Self {
            prohibited_phrases: lower(&config.prohibited_phrases),
            negations: lower(&config.negations),
            notices: config.notices.clone(),
            sensitive_topics: lower(&config.sensitive_topics),
            hardship_notice: config.hardship_notice.clone(),
            decline_message: config.decline_message.clone(),
        }
    }

    pub fn decline_message(&self) -> &str {
        &self.decline_message
    }

    pub fn review(&self, content: &str, product_type: Option<&str>) -> ComplianceReview {
        let lowered = content.to_lowercase();
        ComplianceReview {
            issues: self.issues(&lowered),
            notices: self.required_notices(&lowered, product_type),
            checked_content: content.to_string(),
        }
    }

    fn issues(&self, lowered: &str) -> Vec<String> {
        self.prohibited_phrases
            .iter()
            .filter(|phrase| lowered.contains(phrase.as_str()))
            .filter(|phrase| {
                !self
                    .negations
                    .iter()
                    .any(|negation| negation.contains(phrase.as_str()) && lowered.contains(negation.as_str()))
            })
            .map(|phrase| {
                format!(
                    "Prohibited language detected: '{phrase}'. Communications must be balanced and not misleading."
                )
            })
            .collect()
    }

    fn required_notices(&self, lowered: &str, product_type: Option<&str>) -> Vec<String> {
        let mut notices: Vec<String> = Vec::new();
        let mut push = |notice: &str| {
            if !notices.iter().any(|existing| existing == notice) {
                notices.push(notice.to_string());
            }
        };

        if let Some(product) = product_type {
            if let Some(rule) = self
                .notices
                .iter()
                .find(|rule| rule.product.eq_ignore_ascii_case(product))
            {
                push(&rule.notice);
            }
        }
        for rule in &self.notices {
            if rule
                .keywords
                .iter()
                .any(|keyword| lowered.contains(&keyword.to_lowercase()))
            {
                push(&rule.notice);
            }
        }
        if self
            .sensitive_topics
            .iter()
            .any(|topic| lowered.contains(topic.as_str()))
        {
            push(&self.hardship_notice);
        }
        notices
    }
}

/// Appends notices to a reply under an "Important" heading.
pub fn append_notices(response: &str, notices: &[String]) -> String {
    if notices.is_empty() {
        return response.to_string();
    }
    let lines: Vec<String> = notices.iter().map(|notice| format!("- {notice}")).collect();
    format!("{response}\n\nImportant:\n{}", lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ComplianceRules {
        ComplianceRules::new(&ComplianceConfig::default())
    }

    #[test]
    fn prohibited_language_is_an_issue() {
        let review = rules().review("This loan is Guaranteed and risk-free!", None);

        assert!(!review.is_approved());
        assert_eq!(review.issues.len(), 2);
        assert!(review.issues[0].contains("'guaranteed'"));
        assert!(review.issues[1].contains("'risk-free'"));
    }

    #[test]
    fn negated_guarantee_is_not_an_issue() {
        let review = rules().review("Approval is not guaranteed and depends on your circumstances.", None);

        assert!(review.is_approved());
    }

    #[test]
    fn negation_only_clears_the_phrase_it_contains() {
        let review = rules().review("No loan is guaranteed, but you definitely qualify.", None);

        assert_eq!(review.issues.len(), 1);
        assert!(review.issues[0].contains("'definitely'"));
    }

    #[test]
    fn keywords_and_product_type_require_notices_once() {
        let review = rules().review("Our personal loan lets you borrow up to 25k.", Some("loan"));

        assert!(review.is_approved());
        assert_eq!(review.notices, vec!["Subject to status and affordability assessment"]);
    }

    #[test]
    fn sensitive_topic_adds_hardship_notice() {
        let review = rules().review("We can help consolidate your debt.", None);

        assert_eq!(review.notices.len(), 1);
        assert!(review.notices[0].contains("MoneyHelper"));
    }

    #[test]
    fn notices_are_appended_in_order() {
        let text = append_notices("Here you go.", &["First".to_string(), "Second".to_string()]);

        assert_eq!(text, "Here you go.\n\nImportant:\n- First\n- Second");
        assert_eq!(append_notices("Plain.", &[]), "Plain.");
    }
}
