use crate::dom::NodeRef;
use crate::selector::RankedSelector;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Step of the guided capture flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Step {
    Idle,
    PickQuestion,
    PickAnswer,
    PickCorrect,
    Preview,
    Done,
}

impl Step {
    /// Role captured by a click in this step
    pub fn role(self) -> Option<Role> {
        match self {
            Step::PickQuestion => Some(Role::Question),
            Step::PickAnswer => Some(Role::Answer),
            Step::PickCorrect => Some(Role::Correct),
            _ => None,
        }
    }

    pub fn next(self) -> Step {
        match self {
            Step::Idle => Step::PickQuestion,
            Step::PickQuestion => Step::PickAnswer,
            Step::PickAnswer => Step::PickCorrect,
            Step::PickCorrect => Step::Preview,
            Step::Preview | Step::Done => Step::Done,
        }
    }

    pub fn is_picking(self) -> bool {
        self.role().is_some()
    }
}

/// What a captured node stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Question,
    Answer,
    Correct,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Question, Role::Answer, Role::Correct];
}

/// Selection made for one role
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleCapture {
    pub node: Option<NodeRef>,
    pub selector: Option<RankedSelector>,
    /// Current matches of the selector, in document order
    pub matches: IndexSet<NodeRef>,
    /// Nodes removed by the operator; never re-added for this capture
    pub excluded: HashSet<NodeRef>,
}

impl RoleCapture {
    pub fn selector_expression(&self) -> Option<&str> {
        self.selector.as_ref().map(|s| s.expression())
    }

    pub fn is_set(&self) -> bool {
        self.selector.is_some()
    }

    /// Replace the match set with fresh query results, exclusions applied
    pub fn set_matches(&mut self, matches: impl IntoIterator<Item = NodeRef>) {
        self.matches = matches.into_iter().filter(|m| !self.excluded.contains(m)).collect();
    }

    /// Remove a match and remember the exclusion
    pub fn exclude(&mut self, node: NodeRef) -> bool {
        if self.matches.shift_remove(&node) {
            self.excluded.insert(node);
            true
        } else {
            false
        }
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }
}

/// Everything the picker has captured in the current session
#[derive(Debug, Clone, PartialEq)]
pub struct PickerState {
    pub step: Step,
    pub question: RoleCapture,
    pub answer: RoleCapture,
    pub correct: RoleCapture,
}

impl PickerState {
    /// State right after activation or reset
    pub fn initial() -> Self {
        Self {
            step: Step::PickQuestion,
            question: RoleCapture::default(),
            answer: RoleCapture::default(),
            correct: RoleCapture::default(),
        }
    }

    pub fn capture(&self, role: Role) -> &RoleCapture {
        match role {
            Role::Question => &self.question,
            Role::Answer => &self.answer,
            Role::Correct => &self.correct,
        }
    }

    pub fn capture_mut(&mut self, role: Role) -> &mut RoleCapture {
        match role {
            Role::Question => &mut self.question,
            Role::Answer => &mut self.answer,
            Role::Correct => &mut self.correct,
        }
    }

    /// Role captured most recently, judged by the current step
    pub fn last_captured(&self) -> Option<Role> {
        match self.step {
            Step::PickAnswer => Some(Role::Question),
            Step::PickCorrect => Some(Role::Answer),
            Step::Preview | Step::Done if self.correct.is_set() => Some(Role::Correct),
            Step::Preview | Step::Done => Some(Role::Answer),
            _ => None,
        }
    }

    pub fn is_ready_to_save(&self) -> bool {
        self.question.is_set() && self.answer.is_set()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{DocumentId, NodeId};

    fn node(index: usize) -> NodeRef {
        NodeRef::new(DocumentId(0), NodeId(index))
    }

    #[test]
    fn test_step_progression() {
        let mut step = Step::Idle;
        let mut seen = vec![step];
        while step != Step::Done {
            step = step.next();
            seen.push(step);
        }
        assert_eq!(
            seen,
            vec![Step::Idle, Step::PickQuestion, Step::PickAnswer, Step::PickCorrect, Step::Preview, Step::Done]
        );
        assert_eq!(Step::PickCorrect.role(), Some(Role::Correct));
        assert!(!Step::Preview.is_picking());
    }

    #[test]
    fn test_exclusion_survives_requery() {
        let mut capture = RoleCapture::default();
        capture.set_matches([node(1), node(2), node(3)]);

        assert!(capture.exclude(node(2)));
        assert!(!capture.exclude(node(2)));
        assert_eq!(capture.match_count(), 2);

        capture.set_matches([node(1), node(2), node(3)]);
        assert_eq!(capture.matches.iter().copied().collect::<Vec<_>>(), vec![node(1), node(3)]);
    }
}
