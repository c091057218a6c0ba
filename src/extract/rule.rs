use crate::error::{QaError, Result};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

/// A reusable recipe for extracting question/answer pairs from similar pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRule {
    #[serde(default)]
    pub question_selector: String,
    #[serde(default)]
    pub answer_selector: String,
    #[serde(default)]
    pub correct_selector: Option<String>,
    /// Key under which a rule store recalls this rule
    #[serde(default)]
    pub url_pattern: String,
    #[schemars(with = "String")]
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub question_count: usize,
    #[serde(default)]
    pub answer_count: usize,
}

impl ExtractionRule {
    /// Create a rule stamped with the current time
    pub fn new(
        question_selector: impl Into<String>,
        answer_selector: impl Into<String>,
        correct_selector: Option<String>,
        page_url: &str,
    ) -> Self {
        Self {
            question_selector: question_selector.into(),
            answer_selector: answer_selector.into(),
            correct_selector: correct_selector.filter(|s| !s.trim().is_empty()),
            url_pattern: derive_url_pattern(page_url),
            created: Utc::now(),
            question_count: 0,
            answer_count: 0,
        }
    }

    pub fn with_counts(mut self, question_count: usize, answer_count: usize) -> Self {
        self.question_count = question_count;
        self.answer_count = answer_count;
        self
    }

    /// Check that both required selectors are present
    pub fn validate(&self) -> Result<()> {
        if self.question_selector.trim().is_empty() {
            return Err(QaError::InvalidRule("question selector is missing".to_string()));
        }
        if self.answer_selector.trim().is_empty() {
            return Err(QaError::InvalidRule("answer selector is missing".to_string()));
        }
        Ok(())
    }

    /// Non-empty correct selector, if any
    pub fn correct_selector(&self) -> Option<&str> {
        self.correct_selector.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| QaError::InvalidRule(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| QaError::InvalidRule(e.to_string()))
    }
}

/// Origin plus path, with numeric path segments replaced by `*`.
///
/// Query and fragment are dropped and a trailing slash is stripped, so that
/// `https://lms.example.com/course/12/quiz/?attempt=3` and
/// `https://lms.example.com/course/40/quiz` share the pattern
/// `https://lms.example.com/course/*/quiz`.
pub fn derive_url_pattern(page_url: &str) -> String {
    let (prefix, path) = match Url::parse(page_url.trim()) {
        Ok(url) if !url.cannot_be_a_base() => {
            (url[..url::Position::BeforePath].to_string(), url.path().to_string())
        }
        _ => {
            let bare = page_url.trim().split(['?', '#']).next().unwrap_or_default();
            (String::new(), bare.to_string())
        }
    };

    let path = path
        .split('/')
        .map(|segment| {
            if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) { "*" } else { segment }
        })
        .collect::<Vec<_>>()
        .join("/");

    format!("{}{}", prefix, path.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_url_pattern() {
        assert_eq!(
            derive_url_pattern("https://lms.example.com/course/12/quiz/?attempt=3#q2"),
            "https://lms.example.com/course/*/quiz"
        );
        assert_eq!(derive_url_pattern("https://lms.example.com/"), "https://lms.example.com");
        assert_eq!(derive_url_pattern("http://localhost:8080/a/1b/22"), "http://localhost:8080/a/1b/*");
        assert_eq!(derive_url_pattern("quiz/42/"), "quiz/*");
    }

    #[test]
    fn test_validate() {
        let rule = ExtractionRule::new(".q", ".a", None, "https://example.com/");
        assert!(rule.validate().is_ok());

        let missing = ExtractionRule::new(".q", "  ", None, "https://example.com/");
        assert!(matches!(missing.validate(), Err(QaError::InvalidRule(_))));
    }

    #[test]
    fn test_rule_json_shape() {
        let rule = ExtractionRule::new(".q", ".a", Some(String::new()), "https://example.com/t/9").with_counts(3, 12);
        let value = serde_json::to_value(&rule).unwrap();

        assert_eq!(value["questionSelector"], ".q");
        assert_eq!(value["correctSelector"], serde_json::Value::Null);
        assert_eq!(value["urlPattern"], "https://example.com/t/*");
        assert_eq!(value["answerCount"], 12);
        assert!(value["created"].as_str().unwrap().contains('T'));

        let back = ExtractionRule::from_json(&rule.to_json().unwrap()).unwrap();
        assert_eq!(back, rule);
    }

    #[test]
    fn test_missing_selector_deserializes_then_fails_validation() {
        let rule = ExtractionRule::from_json(r#"{"questionSelector": ".q", "created": "2024-05-01T10:00:00Z"}"#).unwrap();
        assert!(matches!(rule.validate(), Err(QaError::InvalidRule(_))));
    }
}
