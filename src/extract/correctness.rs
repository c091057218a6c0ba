use crate::dom::{NodeRef, Page};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Evidence that marked an answer as correct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum CorrectnessSignal {
    /// The answer is itself a match of the correct selector
    SelectorMatch,
    /// The answer contains, or is contained by, a correct-indicator node
    Containment,
    DataFlag,
    ClassName,
    ValueAttribute,
}

/// Markup conventions that flag a correct answer
#[derive(Debug, Clone)]
pub struct CorrectnessMarkers {
    pub data_flags: Vec<String>,
    pub class_names: Vec<String>,
    /// Accepted `value` attribute contents, compared case-insensitively
    pub values: Vec<String>,
}

impl Default for CorrectnessMarkers {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            data_flags: owned(&["data-correct", "data-is-correct", "data-answer-correct"]),
            class_names: owned(&["correct", "is-correct", "correct-answer", "right-answer"]),
            values: owned(&["true", "correct", "1"]),
        }
    }
}

impl CorrectnessMarkers {
    /// Decide whether `answer` is correct; the first signal that fires wins.
    ///
    /// `correct_nodes` must be sorted in document order.
    pub fn classify(&self, page: &Page, answer: NodeRef, correct_nodes: &[NodeRef]) -> Option<CorrectnessSignal> {
        if correct_nodes.binary_search(&answer).is_ok() {
            return Some(CorrectnessSignal::SelectorMatch);
        }

        if correct_nodes.iter().any(|&c| page.contains(answer, c) || page.contains(c, answer)) {
            return Some(CorrectnessSignal::Containment);
        }

        let node = page.node(answer)?;

        let flagged = self.data_flags.iter().filter_map(|flag| node.attr(flag)).any(|value| {
            let value = value.trim().to_ascii_lowercase();
            !matches!(value.as_str(), "false" | "0" | "no")
        });
        if flagged {
            return Some(CorrectnessSignal::DataFlag);
        }

        if self.class_names.iter().any(|class| node.has_class(class)) {
            return Some(CorrectnessSignal::ClassName);
        }

        let value = node.attr("value").map(str::trim)?;
        self.values
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(value))
            .then_some(CorrectnessSignal::ValueAttribute)
    }
}
