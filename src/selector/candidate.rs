use serde::{Deserialize, Serialize};

/// How a candidate expression was derived from the picked node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    Identifier,
    Class,
    TagClass,
    DataAttribute,
    Structural,
    NthPattern,
}

impl Strategy {
    /// Higher is more specific
    pub fn specificity_rank(self) -> u32 {
        match self {
            Strategy::Identifier => 100,
            Strategy::DataAttribute => 70,
            Strategy::Class => 60,
            Strategy::TagClass => 50,
            Strategy::Structural => 40,
            Strategy::NthPattern => 30,
        }
    }
}

/// A proposed CSS selector for a picked node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CandidateSelector {
    pub expression: String,
    pub strategy: Strategy,
    pub specificity_rank: u32,
}

impl CandidateSelector {
    pub fn new(expression: impl Into<String>, strategy: Strategy) -> Self {
        Self { expression: expression.into(), strategy, specificity_rank: strategy.specificity_rank() }
    }
}

/// The candidate chosen by `find_best_match`, with its evidence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RankedSelector {
    pub candidate: CandidateSelector,
    pub match_count: usize,
    pub score: u32,
}

impl RankedSelector {
    pub fn expression(&self) -> &str {
        &self.candidate.expression
    }
}

/// Escape a string for use as a CSS identifier (`CSS.escape` semantics)
pub fn escape_identifier(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let first = value.chars().next();

    for (index, ch) in value.chars().enumerate() {
        match ch {
            '\0' => out.push('\u{FFFD}'),
            '\u{1}'..='\u{1f}' | '\u{7f}' => out.push_str(&format!("\\{:x} ", ch as u32)),
            '0'..='9' if index == 0 || (index == 1 && first == Some('-')) => {
                out.push_str(&format!("\\{:x} ", ch as u32))
            }
            '-' if index == 0 && value.len() == 1 => out.push_str("\\-"),
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() => out.push(c),
            c => {
                out.push('\\');
                out.push(c);
            }
        }
    }
    out
}

/// Double-quoted attribute value for `[name="value"]` selectors
pub fn quote_attribute_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            '\n' => out.push_str("\\a "),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
