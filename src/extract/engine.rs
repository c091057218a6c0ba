//! Rule replay: regroup answer matches under their owning question.

use crate::dom::{NodeRef, Page};
use crate::error::{QaError, Result};
use crate::extract::correctness::CorrectnessMarkers;
use crate::extract::result::{
    ExtractedAnswer, ExtractedQuestion, ExtractionResult, PICKER_RULE_SOURCE, QaGroup,
};
use crate::extract::rule::ExtractionRule;
use std::collections::HashMap;

/// Constants of the grouping heuristics
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Spatial scores at or above this are not candidates
    pub spatial_threshold: f64,
    /// Weight of the horizontal center offset in the spatial score
    pub horizontal_weight: f64,
    /// How many ancestor levels of a question are tried for containment
    pub ancestor_depth: usize,
    pub question_confidence: f64,
    pub answer_confidence: f64,
    /// Confidence of answers assigned by spatial proximity
    pub spatial_confidence: f64,
    pub markers: CorrectnessMarkers,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            spatial_threshold: 400.0,
            horizontal_weight: 0.5,
            ancestor_depth: 10,
            question_confidence: 0.95,
            answer_confidence: 0.9,
            spatial_confidence: 0.7,
            markers: CorrectnessMarkers::default(),
        }
    }
}

/// Document-order position of every node relevant to one run
#[derive(Debug)]
pub struct DocumentOrder {
    positions: HashMap<NodeRef, usize>,
}

impl DocumentOrder {
    pub fn new(nodes: impl IntoIterator<Item = NodeRef>) -> Self {
        let mut nodes: Vec<NodeRef> = nodes.into_iter().collect();
        nodes.sort_unstable();
        nodes.dedup();
        let positions = nodes.into_iter().enumerate().map(|(index, node)| (node, index)).collect();
        Self { positions }
    }

    pub fn position(&self, node: NodeRef) -> usize {
        self.positions.get(&node).copied().unwrap_or(usize::MAX)
    }

    /// Sort and dedup `nodes` by position
    fn ordered(&self, nodes: &[NodeRef]) -> Vec<NodeRef> {
        let mut nodes = nodes.to_vec();
        nodes.sort_by_key(|&n| self.position(n));
        nodes.dedup();
        nodes
    }
}

#[derive(Debug, Default)]
pub struct ProximityEngine {
    config: ExtractionConfig,
}

impl ProximityEngine {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Replay `rule` against `page`
    pub fn extract(&self, page: &Page, rule: &ExtractionRule) -> Result<ExtractionResult> {
        rule.validate()?;

        let questions = page.query_all(&rule.question_selector);
        if questions.is_empty() {
            return Err(QaError::EmptyQuestionMatch { selector: rule.question_selector.clone() });
        }
        let answers = page.query_all(&rule.answer_selector);
        let corrects = rule.correct_selector().map(|s| page.query_all(s)).unwrap_or_default();

        log::info!(
            "Replaying rule on {}: {} questions, {} answers, {} correct markers",
            page.url(),
            questions.len(),
            answers.len(),
            corrects.len()
        );

        let groups = self.group(page, &questions, &answers, &corrects);
        Ok(ExtractionResult::from_groups(groups, PICKER_RULE_SOURCE))
    }

    /// Assign every answer to at most one question
    pub fn group(
        &self,
        page: &Page,
        questions: &[NodeRef],
        answers: &[NodeRef],
        corrects: &[NodeRef],
    ) -> Vec<QaGroup> {
        let order = DocumentOrder::new(questions.iter().chain(answers).chain(corrects).copied());
        let questions = order.ordered(questions);
        let mut corrects = corrects.to_vec();
        corrects.sort_unstable();
        corrects.dedup();

        let mut unused: Vec<NodeRef> =
            order.ordered(answers).into_iter().filter(|a| !questions.contains(a)).collect();
        let mut groups = Vec::with_capacity(questions.len());

        for (index, &question) in questions.iter().enumerate() {
            let low = order.position(question);
            let high = questions.get(index + 1).map_or(usize::MAX, |&next| order.position(next));

            let mut candidates: Vec<NodeRef> = unused
                .iter()
                .copied()
                .filter(|&a| {
                    let position = order.position(a);
                    position > low && position < high
                })
                .collect();

            let mut confidence = self.config.answer_confidence;
            if candidates.is_empty() {
                candidates = self.spatial_candidates(page, question, &unused);
                confidence = self.config.spatial_confidence;
            }

            let candidates = self.restrict_to_ancestor(page, question, candidates);
            unused.retain(|a| !candidates.contains(a));

            let answers = candidates
                .into_iter()
                .map(|node| {
                    let signal = self.config.markers.classify(page, node, &corrects);
                    ExtractedAnswer { text: page.text(node), node, correct: signal.is_some(), confidence, signal }
                })
                .collect();

            groups.push(QaGroup {
                question: ExtractedQuestion {
                    text: page.text(question),
                    node: question,
                    confidence: self.config.question_confidence,
                },
                answers,
            });
        }

        if !unused.is_empty() {
            log::debug!("{} answers were not assigned to any question", unused.len());
        }
        groups
    }

    /// Unused answers near `question`, closest first
    fn spatial_candidates(&self, page: &Page, question: NodeRef, unused: &[NodeRef]) -> Vec<NodeRef> {
        let Some(question_box) = page.absolute_box(question) else {
            return Vec::new();
        };

        let mut scored: Vec<(f64, NodeRef)> = unused
            .iter()
            .filter_map(|&answer| {
                let answer_box = page.absolute_box(answer)?;
                if answer_box.bottom() <= question_box.y {
                    return None;
                }
                let vertical = (answer_box.y - question_box.bottom()).max(0.0);
                let horizontal = (answer_box.center_x() - question_box.center_x()).abs();
                let score = vertical + self.config.horizontal_weight * horizontal;
                (score < self.config.spatial_threshold).then_some((score, answer))
            })
            .collect();

        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        scored.into_iter().map(|(_, answer)| answer).collect()
    }

    /// Keep only candidates inside the nearest ancestor of `question` that
    /// holds any of them
    fn restrict_to_ancestor(&self, page: &Page, question: NodeRef, candidates: Vec<NodeRef>) -> Vec<NodeRef> {
        if candidates.is_empty() {
            return candidates;
        }

        for ancestor in page.ancestors(question).into_iter().take(self.config.ancestor_depth) {
            let inside: Vec<NodeRef> =
                candidates.iter().copied().filter(|&c| page.contains(ancestor, c)).collect();
            if !inside.is_empty() {
                return inside;
            }
        }
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementNode, PageSnapshot};

    fn rule(question: &str, answer: &str, correct: Option<&str>) -> ExtractionRule {
        ExtractionRule::new(question, answer, correct.map(str::to_string), "https://example.com/quiz/1")
    }

    #[test]
    fn test_interleaved_answers_are_grouped_once() {
        let page = Page::from_html(
            "https://example.com/quiz/1",
            r#"<p class="q">Q1</p><div class="a">1a</div><div class="a">1b</div>
               <p class="q">Q2</p><div class="a">2a</div><div class="a">2b</div><div class="a">2c</div>"#,
        );
        let result = ProximityEngine::default().extract(&page, &rule(".q", ".a", None)).unwrap();

        let texts: Vec<Vec<&str>> =
            result.groups.iter().map(|g| g.answers.iter().map(|a| a.text.as_str()).collect()).collect();
        assert_eq!(texts, vec![vec!["1a", "1b"], vec!["2a", "2b", "2c"]]);
        assert_eq!(result.answer_count, 5);
        assert_eq!(result.correct_count, 0);
        assert!(result.groups.iter().flat_map(|g| &g.answers).all(|a| a.confidence == 0.9));
    }

    #[test]
    fn test_spatial_fallback_for_detached_answers() {
        // Answers live in a side panel after both questions in document order
        let answer = |text: &str, y: f64| {
            ElementNode::new("div").with_class("a").with_text(text).with_bounding_box(0.0, y, 200.0, 20.0)
        };
        let root = ElementNode::new("body")
            .with_bounding_box(0.0, 0.0, 800.0, 1200.0)
            .with_child(ElementNode::new("p").with_class("q").with_text("Q1").with_bounding_box(0.0, 0.0, 200.0, 20.0))
            .with_child(ElementNode::new("p").with_class("q").with_text("Q2").with_bounding_box(0.0, 600.0, 200.0, 20.0))
            .with_child(
                ElementNode::new("div")
                    .with_class("panel")
                    .with_child(answer("1b", 60.0))
                    .with_child(answer("1a", 30.0))
                    .with_child(answer("2a", 630.0))
                    .with_child(answer("2b", 660.0)),
            );
        let page = Page::from_snapshot(&PageSnapshot { url: "https://example.com/".into(), title: String::new(), root });

        let result = ProximityEngine::default().extract(&page, &rule(".q", ".a", None)).unwrap();
        let first: Vec<&str> = result.groups[0].answers.iter().map(|a| a.text.as_str()).collect();
        let second: Vec<&str> = result.groups[1].answers.iter().map(|a| a.text.as_str()).collect();

        // Closest first, answers 600 units away stay out
        assert_eq!(first, vec!["1a", "1b"]);
        assert_eq!(result.groups[0].answers[0].confidence, 0.7);
        assert_eq!(second, vec!["2a", "2b"]);
        assert_eq!(result.groups[1].answers[0].confidence, 0.9);
    }

    #[test]
    fn test_ancestor_restriction_drops_outside_answers() {
        let page = Page::from_html(
            "https://example.com/",
            r#"<div class="card"><p class="q">Q1</p><div class="a">1a</div><div class="a">1b</div></div>
               <div class="a">stray</div>
               <div class="card"><p class="q">Q2</p><div class="a">2a</div></div>"#,
        );
        let result = ProximityEngine::default().extract(&page, &rule(".q", ".a", None)).unwrap();

        assert_eq!(result.groups[0].answers.len(), 2);
        assert_eq!(result.groups[1].answers.len(), 1);
        assert!(result.items.iter().all(|item| item.text != "stray"));
    }

    #[test]
    fn test_question_without_answers_keeps_its_group() {
        let page = Page::from_html("https://example.com/", r#"<p class="q">Q1</p><p class="q">Q2</p><i class="a">x</i>"#);
        let result = ProximityEngine::default().extract(&page, &rule(".q", ".a", None)).unwrap();
        assert_eq!(result.groups.len(), 2);
        assert!(result.groups[0].answers.is_empty());
        assert_eq!(result.groups[1].answers.len(), 1);
    }

    #[test]
    fn test_failures() {
        let page = Page::from_html("https://example.com/", r#"<p class="q">Q1</p>"#);
        let engine = ProximityEngine::default();

        let err = engine.extract(&page, &rule(".missing", ".a", None)).unwrap_err();
        assert!(matches!(err, QaError::EmptyQuestionMatch { .. }));

        let err = engine.extract(&page, &rule(".q", "", None)).unwrap_err();
        assert!(matches!(err, QaError::InvalidRule(_)));
    }

    #[test]
    fn test_document_order_positions() {
        let page = Page::from_html("https://example.com/", "<b></b><i></i>");
        let nodes = page.query_all("b, i");
        let order = DocumentOrder::new(nodes.iter().rev().copied());
        assert!(order.position(nodes[0]) < order.position(nodes[1]));
    }
}
