//! Selector synthesis
//!
//! Given one picked node, propose candidate CSS selectors through independent
//! strategies and keep the one that generalizes to the node's siblings
//! without over-matching.

pub mod candidate;
pub mod naming;
pub mod synthesizer;

pub use candidate::{CandidateSelector, RankedSelector, Strategy, escape_identifier, quote_attribute_value};
pub use naming::{GeneratedNames, NamingConvention, NamingRules, PatternConvention};
pub use synthesizer::{SelectorSynthesizer, SynthesizerConfig};
