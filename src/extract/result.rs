use crate::dom::NodeRef;
use crate::extract::correctness::CorrectnessSignal;
use serde::{Deserialize, Serialize};

/// Source tag carried by rule-replay results
pub const PICKER_RULE_SOURCE: &str = "picker-rule";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedQuestion {
    pub text: String,
    pub node: NodeRef,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedAnswer {
    pub text: String,
    pub node: NodeRef,
    pub correct: bool,
    pub confidence: f64,
    /// Evidence for `correct`, absent when the answer is not correct
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<CorrectnessSignal>,
}

/// One question with the answers grouped under it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaGroup {
    pub question: ExtractedQuestion,
    pub answers: Vec<ExtractedAnswer>,
}

impl QaGroup {
    pub fn correct_answers(&self) -> impl Iterator<Item = &ExtractedAnswer> {
        self.answers.iter().filter(|a| a.correct)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Question,
    Answer,
}

/// Flattened question or answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedItem {
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub text: String,
    pub confidence: f64,
    pub correct: bool,
    pub source: String,
}

/// Everything one extraction run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub groups: Vec<QaGroup>,
    pub items: Vec<ExtractedItem>,
    pub question_count: usize,
    pub answer_count: usize,
    pub correct_count: usize,
    pub source: String,
    /// APIs reported by the host's detection step on hybrid runs
    #[serde(default)]
    pub apis: Vec<serde_json::Value>,
}

impl ExtractionResult {
    /// Build the envelope, flattening groups into items in group order
    pub fn from_groups(groups: Vec<QaGroup>, source: &str) -> Self {
        let mut items = Vec::new();
        for group in &groups {
            items.push(ExtractedItem {
                item_type: ItemType::Question,
                text: group.question.text.clone(),
                confidence: group.question.confidence,
                correct: false,
                source: source.to_string(),
            });
            items.extend(group.answers.iter().map(|answer| ExtractedItem {
                item_type: ItemType::Answer,
                text: answer.text.clone(),
                confidence: answer.confidence,
                correct: answer.correct,
                source: source.to_string(),
            }));
        }

        Self {
            question_count: groups.len(),
            answer_count: groups.iter().map(|g| g.answers.len()).sum(),
            correct_count: groups.iter().map(|g| g.correct_answers().count()).sum(),
            groups,
            items,
            source: source.to_string(),
            apis: Vec::new(),
        }
    }

    /// Merge APIs found by an external detection step
    pub fn merge_apis(&mut self, apis: impl IntoIterator<Item = serde_json::Value>) {
        for api in apis {
            if !self.apis.contains(&api) {
                self.apis.push(api);
            }
        }
    }
}
