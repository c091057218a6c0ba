//! Host command surface
//!
//! Maps inbound host commands onto the picker and the extraction engine and
//! answers with outbound events. Both directions are JSON objects tagged by
//! `type`, e.g. `{"type": "APPLY_RULE", "rule": {...}, "hybrid": false}`.

use crate::dom::Page;
use crate::error::{ErrorKind, QaError};
use crate::extract::{ExtractionResult, ExtractionRule, ProximityEngine};
use crate::picker::{InputEvent, InputOutcome, Picker};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Commands a host sends to the controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    /// Start an interactive picking session
    ActivateSelector,
    /// Close the picking session
    DeactivateSelector,
    /// Replay a rule against the current page
    ApplyRule {
        rule: ExtractionRule,
        /// Ask the host for API detection before completing
        #[serde(default)]
        hybrid: bool,
    },
    /// Pointer or key input for the picker
    PickerInput { event: InputEvent },
    /// Turn the current captures into a rule
    SaveRule,
    /// Clear every capture and start over
    ResetPicker,
    /// Save without a correct-indicator
    SkipCorrect,
    /// Result of the host's API detection for a pending hybrid run
    ApiDetectionResult {
        #[serde(default)]
        apis: Vec<serde_json::Value>,
    },
}

impl Command {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Typed failure carried by `EXTRACTION_ERROR`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&QaError> for ErrorPayload {
    fn from(error: &QaError) -> Self {
        Self { kind: error.kind(), message: error.to_string() }
    }
}

/// Events the controller emits to its host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    SelectorActivated,
    SelectorDeactivated,
    RuleCreated {
        rule: ExtractionRule,
    },
    ExtractionComplete {
        results: ExtractionResult,
    },
    ExtractionError {
        error: ErrorPayload,
    },
    /// Text of the first picked question, for a secondary extractor
    TriggerSeedExtract {
        #[serde(rename = "seedText")]
        seed_text: String,
    },
    RequestApiDetection,
}

impl Event {
    pub fn error(error: &QaError) -> Self {
        Event::ExtractionError { error: error.into() }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Owns the picker and the engine for one page-hosting context
#[derive(Debug, Default)]
pub struct Controller {
    picker: Picker,
    engine: ProximityEngine,
    /// Hybrid result waiting for `API_DETECTION_RESULT`
    pending: Option<ExtractionResult>,
}

impl Controller {
    pub fn new(picker: Picker, engine: ProximityEngine) -> Self {
        Self { picker, engine, pending: None }
    }

    pub fn picker(&self) -> &Picker {
        &self.picker
    }

    pub fn has_pending_extraction(&self) -> bool {
        self.pending.is_some()
    }

    /// Handle one command; returns the events to send, in order
    pub fn handle(&mut self, page: &Page, command: Command) -> Vec<Event> {
        match command {
            Command::ActivateSelector => {
                if self.picker.activate() {
                    vec![Event::SelectorActivated]
                } else {
                    Vec::new()
                }
            }
            Command::DeactivateSelector => self.deactivated(),
            Command::ApplyRule { rule, hybrid } => self.apply_rule(page, &rule, hybrid),
            Command::PickerInput { event } => match self.picker.handle_input(page, &event) {
                InputOutcome::Cancelled => vec![Event::SelectorDeactivated],
                _ => Vec::new(),
            },
            Command::SaveRule => self.save_rule(page),
            Command::ResetPicker => {
                self.picker.reset();
                Vec::new()
            }
            Command::SkipCorrect => {
                self.picker.skip_correct();
                Vec::new()
            }
            Command::ApiDetectionResult { apis } => match self.pending.take() {
                Some(mut results) => {
                    results.merge_apis(apis);
                    vec![Event::ExtractionComplete { results }]
                }
                None => {
                    log::warn!("API detection result arrived with no pending extraction");
                    Vec::new()
                }
            },
        }
    }

    fn deactivated(&mut self) -> Vec<Event> {
        if self.picker.deactivate() {
            vec![Event::SelectorDeactivated]
        } else {
            Vec::new()
        }
    }

    fn apply_rule(&mut self, page: &Page, rule: &ExtractionRule, hybrid: bool) -> Vec<Event> {
        match self.engine.extract(page, rule) {
            Ok(results) if hybrid => {
                if self.pending.replace(results).is_some() {
                    log::warn!("Replacing an extraction that was still waiting for API detection");
                }
                vec![Event::RequestApiDetection]
            }
            Ok(results) => vec![Event::ExtractionComplete { results }],
            Err(e) => {
                log::warn!("Rule replay failed: {}", e);
                vec![Event::error(&e)]
            }
        }
    }

    fn save_rule(&mut self, page: &Page) -> Vec<Event> {
        let rule = match self.picker.save(page) {
            Ok(rule) => rule,
            Err(e) => return vec![Event::error(&e)],
        };
        let seed_text = self.picker.seed_text(page);

        let mut events = vec![Event::RuleCreated { rule }];
        if let Some(seed_text) = seed_text {
            events.push(Event::TriggerSeedExtract { seed_text });
        }
        events.extend(self.deactivated());
        events
    }
}
