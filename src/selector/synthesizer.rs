//! Turns one picked node into a selector that generalizes to its siblings.

use crate::dom::{DomDocument, DomNode, NodeId, NodeRef, Page};
use crate::selector::candidate::{
    CandidateSelector, RankedSelector, Strategy, escape_identifier, quote_attribute_value,
};
use crate::selector::naming::GeneratedNames;

/// Tuning for candidate generation and scoring
#[derive(Debug, Clone)]
pub struct SynthesizerConfig {
    /// Fewest matches a generalizing selector may have
    pub min_matches: usize,
    /// Most matches before a selector counts as over-matching
    pub max_matches: usize,
    /// Classes combined in the class candidate
    pub max_classes: usize,
    /// Data attributes that carry meaning, in preference order
    pub data_attributes: Vec<String>,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            min_matches: 2,
            max_matches: 50,
            max_classes: 3,
            data_attributes: [
                "data-testid",
                "data-test",
                "data-test-id",
                "data-qa",
                "data-cy",
                "data-question",
                "data-answer",
                "data-choice",
                "data-option",
                "data-role",
                "data-type",
                "data-field",
                "data-name",
                "data-component",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SelectorSynthesizer {
    config: SynthesizerConfig,
    names: GeneratedNames,
}

impl SelectorSynthesizer {
    pub fn new(config: SynthesizerConfig, names: GeneratedNames) -> Self {
        Self { config, names }
    }

    pub fn config(&self) -> &SynthesizerConfig {
        &self.config
    }

    pub fn names_mut(&mut self) -> &mut GeneratedNames {
        &mut self.names
    }

    /// Propose up to six independent candidates for `node`, most specific first
    pub fn generate(&self, page: &Page, node: NodeRef) -> Vec<CandidateSelector> {
        let Ok(doc) = page.document(node.document) else {
            return Vec::new();
        };
        let Some(element) = doc.node(node.node) else {
            return Vec::new();
        };

        let tag = escape_identifier(&element.tag_name.to_ascii_lowercase());
        let classes = self.stable_classes(element);
        let mut candidates: Vec<CandidateSelector> = Vec::new();

        if let Some(id) = element.id().filter(|id| !self.names.ids.is_generated(id)) {
            candidates.push(CandidateSelector::new(format!("#{}", escape_identifier(id)), Strategy::Identifier));
        }

        if !classes.is_empty() {
            let combined: String =
                classes.iter().take(self.config.max_classes).map(|c| format!(".{}", escape_identifier(c))).collect();
            candidates.push(CandidateSelector::new(combined, Strategy::Class));
            candidates.push(CandidateSelector::new(
                format!("{}.{}", tag, escape_identifier(classes[0])),
                Strategy::TagClass,
            ));
        }

        if let Some(expression) = self.data_attribute_expression(element) {
            candidates.push(CandidateSelector::new(expression, Strategy::DataAttribute));
        }

        if let Some((ancestor, ancestor_class)) = self.classed_ancestor(doc, node.node) {
            let combinator = if doc.parent(node.node) == Some(ancestor) { " > " } else { " " };
            let scope = format!(".{}{}", escape_identifier(ancestor_class), combinator);

            let refined = match classes.first() {
                Some(class) => format!("{}{}.{}", scope, tag, escape_identifier(class)),
                None => format!("{}{}", scope, tag),
            };
            candidates.push(CandidateSelector::new(refined, Strategy::Structural));

            // Covers every same-tag sibling regardless of position
            if has_same_tag_siblings(doc, node.node) {
                candidates.push(CandidateSelector::new(format!("{}{}", scope, tag), Strategy::NthPattern));
            }
        }

        let mut seen = std::collections::HashSet::new();
        candidates.retain(|c| seen.insert(c.expression.clone()));
        log::debug!("Generated {} candidates for {:?}", candidates.len(), node);
        candidates
    }

    /// Pick the candidate that generalizes best while still matching `node`.
    ///
    /// Candidates are evaluated in `node`'s own document context. Ties keep
    /// the earlier candidate.
    pub fn find_best_match(
        &self,
        page: &Page,
        candidates: &[CandidateSelector],
        node: NodeRef,
    ) -> Option<RankedSelector> {
        let mut best: Option<RankedSelector> = None;

        for candidate in candidates {
            let matches = match page.query_in(node.document, &candidate.expression) {
                Ok(matches) => matches,
                Err(e) => {
                    log::debug!("Skipping candidate: {}", e);
                    continue;
                }
            };
            if matches.binary_search(&node).is_err() {
                log::debug!("Candidate '{}' does not match its own node", candidate.expression);
                continue;
            }

            let score = self.score(matches.len());
            log::debug!("Candidate '{}' matched {} (score {})", candidate.expression, matches.len(), score);
            if score > 0 && best.as_ref().is_none_or(|b| score > b.score) {
                best = Some(RankedSelector { candidate: candidate.clone(), match_count: matches.len(), score });
            }
        }

        best
    }

    /// `generate` followed by `find_best_match`
    pub fn synthesize(&self, page: &Page, node: NodeRef) -> Option<RankedSelector> {
        let candidates = self.generate(page, node);
        self.find_best_match(page, &candidates, node)
    }

    /// `100 - n` inside the accepted band, 0 outside it
    pub fn score(&self, match_count: usize) -> u32 {
        if (self.config.min_matches..=self.config.max_matches).contains(&match_count) {
            100u32.saturating_sub(match_count as u32)
        } else {
            0
        }
    }

    fn stable_classes<'a>(&self, element: &'a DomNode) -> Vec<&'a str> {
        let mut classes: Vec<&str> = Vec::new();
        for class in element.classes() {
            if !self.names.classes.is_generated(class) && !classes.contains(&class) {
                classes.push(class);
            }
        }
        classes
    }

    fn data_attribute_expression(&self, element: &DomNode) -> Option<String> {
        let allowed = self.config.data_attributes.iter().filter_map(|name| element.attr(name).map(|v| (name, v)));

        let mut presence: Option<&str> = None;
        for (name, value) in allowed {
            if !value.trim().is_empty() && !self.names.attribute_values.is_generated(value) {
                return Some(format!("[{}={}]", name, quote_attribute_value(value)));
            }
            presence.get_or_insert(name.as_str());
        }

        let presence = presence.or_else(|| {
            element
                .attributes
                .keys()
                .map(String::as_str)
                .find(|name| name.starts_with("data-") && !self.names.attribute_names.is_generated(name))
        })?;
        Some(format!("[{}]", presence))
    }

    /// Nearest ancestor carrying a non-generated class, with that class
    fn classed_ancestor<'a>(&self, doc: &'a DomDocument, node: NodeId) -> Option<(NodeId, &'a str)> {
        doc.ancestors(node).find_map(|ancestor| {
            let element = doc.node(ancestor)?;
            element.classes().find(|c| !self.names.classes.is_generated(c)).map(|c| (ancestor, c))
        })
    }
}

/// Whether the parent has several children with the node's tag
fn has_same_tag_siblings(doc: &DomDocument, node: NodeId) -> bool {
    let (Some(parent), Some(element)) = (doc.parent(node).and_then(|p| doc.node(p)), doc.node(node)) else {
        return false;
    };
    parent
        .children
        .iter()
        .filter(|&&child| doc.node(child).is_some_and(|c| c.tag_name.eq_ignore_ascii_case(&element.tag_name)))
        .count()
        >= 2
}
