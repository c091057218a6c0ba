//! Rule replay
//!
//! - ExtractionRule: the persisted selector triple and its URL pattern
//! - ProximityEngine: document-order, spatial and containment grouping
//! - CorrectnessMarkers: correctness evidence for grouped answers
//! - ExtractionResult: groups, flattened items and counts

pub mod correctness;
pub mod engine;
pub mod result;
pub mod rule;

pub use correctness::{CorrectnessMarkers, CorrectnessSignal};
pub use engine::{DocumentOrder, ExtractionConfig, ProximityEngine};
pub use result::{
    ExtractedAnswer, ExtractedItem, ExtractedQuestion, ExtractionResult, ItemType, PICKER_RULE_SOURCE, QaGroup,
};
pub use rule::{ExtractionRule, derive_url_pattern};
