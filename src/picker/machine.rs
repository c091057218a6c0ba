//! The interactive capture flow.
//!
//! A [`Picker`] is owned by its host. Every handler takes `&mut self` and the
//! page the event refers to; nothing is shared, so there is no locking.

use crate::dom::{AccessibleLayerQuirk, NodeRef, Page};
use crate::error::{QaError, Result};
use crate::extract::{ExtractionResult, ExtractionRule, PICKER_RULE_SOURCE, ProximityEngine};
use crate::picker::overlay::{Highlight, Listener, Overlay};
use crate::picker::state::{PickerState, Role, Step};
use crate::selector::{RankedSelector, SelectorSynthesizer};
use serde::{Deserialize, Serialize};

/// Tags that never count as picked content
const NON_CONTENT_TAGS: &[&str] = &[
    "html", "head", "body", "script", "style", "noscript", "meta", "link", "iframe", "br", "hr",
];

#[derive(Debug, Clone)]
pub struct PickerConfig {
    /// Nodes narrower than this are not highlighted or picked
    pub min_width: f64,
    pub min_height: f64,
    pub non_content_tags: Vec<String>,
    /// Canonicalization for vector-rendered content, `None` to disable
    pub quirk: Option<AccessibleLayerQuirk>,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            min_width: 10.0,
            min_height: 10.0,
            non_content_tags: NON_CONTENT_TAGS.iter().map(|t| t.to_string()).collect(),
            quirk: Some(AccessibleLayerQuirk::default()),
        }
    }
}

/// Raw input forwarded by the host while the picker is active
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputEvent {
    PointerMove { x: f64, y: f64 },
    Click { x: f64, y: f64 },
    SecondaryClick { x: f64, y: f64 },
    Key { key: String },
}

/// Result of a primary click
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// The role was recorded and the picker advanced to `next`
    Captured { role: Role, selector: RankedSelector, match_count: usize, next: Step },
    /// No candidate generalized; nothing changed
    NoSelectorFound { node: NodeRef },
    Ignored(&'static str),
}

/// What handling one input did
#[derive(Debug, Clone, PartialEq)]
pub enum InputOutcome {
    Hovered(Option<NodeRef>),
    Clicked(ClickOutcome),
    /// The node was removed from this role's matches
    Excluded(Option<Role>),
    Cancelled,
    Ignored,
}

pub struct Picker {
    config: PickerConfig,
    synthesizer: SelectorSynthesizer,
    engine: ProximityEngine,
    overlay: Overlay,
    session: Option<PickerState>,
}

impl Default for Picker {
    fn default() -> Self {
        Self::new(PickerConfig::default())
    }
}

impl std::fmt::Debug for Picker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Picker").field("step", &self.step()).field("overlay", &self.overlay).finish()
    }
}

impl Picker {
    pub fn new(config: PickerConfig) -> Self {
        Self::with_parts(config, SelectorSynthesizer::default(), ProximityEngine::default())
    }

    pub fn with_parts(config: PickerConfig, synthesizer: SelectorSynthesizer, engine: ProximityEngine) -> Self {
        Self { config, synthesizer, engine, overlay: Overlay::default(), session: None }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn step(&self) -> Step {
        self.session.as_ref().map_or(Step::Idle, |s| s.step)
    }

    pub fn state(&self) -> Option<&PickerState> {
        self.session.as_ref()
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn highlights(&self, page: &Page) -> Vec<Highlight> {
        self.overlay.highlights(page)
    }

    /// Start a session. Returns `false` when one was already running.
    pub fn activate(&mut self) -> bool {
        if self.session.is_some() {
            return false;
        }
        self.session = Some(PickerState::initial());
        self.overlay.install();
        log::info!("Picker activated");
        true
    }

    /// End the session and remove every listener and highlight.
    /// Returns `false` when nothing was running.
    pub fn deactivate(&mut self) -> bool {
        self.overlay.uninstall();
        if self.session.take().is_none() {
            return false;
        }
        log::info!("Picker deactivated");
        true
    }

    /// Back to the first step with every capture cleared; stays active
    pub fn reset(&mut self) -> bool {
        let Some(state) = self.session.as_mut() else {
            return false;
        };
        *state = PickerState::initial();
        self.overlay.clear_markers();
        log::debug!("Picker reset");
        true
    }

    /// Route one input event through the installed listeners
    pub fn handle_input(&mut self, page: &Page, event: &InputEvent) -> InputOutcome {
        match event {
            InputEvent::PointerMove { x, y } if self.overlay.is_listening(Listener::PointerMove) => {
                InputOutcome::Hovered(self.pointer_move(page, *x, *y))
            }
            InputEvent::Click { x, y } if self.overlay.is_listening(Listener::Click) => {
                InputOutcome::Clicked(self.click(page, *x, *y))
            }
            InputEvent::SecondaryClick { x, y } if self.overlay.is_listening(Listener::ContextMenu) => {
                InputOutcome::Excluded(self.secondary_click(page, *x, *y))
            }
            InputEvent::Key { key } if self.overlay.is_listening(Listener::KeyDown) && key == "Escape" => {
                self.deactivate();
                InputOutcome::Cancelled
            }
            _ => InputOutcome::Ignored,
        }
    }

    /// Highlight the eligible node under the cursor
    pub fn pointer_move(&mut self, page: &Page, x: f64, y: f64) -> Option<NodeRef> {
        if !self.step().is_picking() {
            self.overlay.set_hover(None);
            return None;
        }
        let target = self.target_at(page, x, y);
        self.overlay.set_hover(target);
        target
    }

    /// Primary click at a top-level point
    pub fn click(&mut self, page: &Page, x: f64, y: f64) -> ClickOutcome {
        if !self.step().is_picking() {
            return ClickOutcome::Ignored("not in a pick step");
        }
        match self.target_at(page, x, y) {
            Some(node) => self.select_node(page, node),
            None => ClickOutcome::Ignored("no eligible node at point"),
        }
    }

    /// Capture `node` for the current step's role
    pub fn select_node(&mut self, page: &Page, node: NodeRef) -> ClickOutcome {
        let Some(role) = self.step().role() else {
            return ClickOutcome::Ignored("not in a pick step");
        };

        let Some(best) = self.synthesizer.synthesize(page, node) else {
            log::info!("No well-scoped selector for {:?}; staying in {:?}", node, self.step());
            return ClickOutcome::NoSelectorFound { node };
        };

        let Some(state) = self.session.as_mut() else {
            return ClickOutcome::Ignored("picker inactive");
        };
        let capture = state.capture_mut(role);
        capture.node = Some(node);
        capture.excluded.clear();
        capture.set_matches(page.query_all(best.expression()));
        capture.selector = Some(best.clone());
        let match_count = capture.match_count();

        state.step = state.step.next();
        let next = state.step;
        self.overlay.sync_markers(state);

        log::info!("Captured {:?} with '{}' ({} matches)", role, best.expression(), match_count);
        ClickOutcome::Captured { role, selector: best, match_count, next }
    }

    /// Secondary click at a top-level point
    pub fn secondary_click(&mut self, page: &Page, x: f64, y: f64) -> Option<Role> {
        let node = self.target_at(page, x, y)?;
        self.exclude_node(node)
    }

    /// Remove a flagged match from the capture it belongs to
    pub fn exclude_node(&mut self, node: NodeRef) -> Option<Role> {
        let state = self.session.as_mut()?;

        let role = match state.step {
            step if step.is_picking() => state.last_captured().filter(|&r| state.capture(r).matches.contains(&node)),
            Step::Preview => {
                [Role::Correct, Role::Answer, Role::Question].into_iter().find(|&r| state.capture(r).matches.contains(&node))
            }
            _ => None,
        }?;

        state.capture_mut(role).exclude(node);
        self.overlay.sync_markers(state);
        log::debug!("Excluded {:?} from {:?} matches", node, role);
        Some(role)
    }

    /// Leave the correct-indicator unset and go to preview
    pub fn skip_correct(&mut self) -> bool {
        match self.session.as_mut() {
            Some(state) if state.step == Step::PickCorrect => {
                state.step = Step::Preview;
                true
            }
            _ => false,
        }
    }

    /// Re-query every captured selector and group the current matches
    pub fn preview(&mut self, page: &Page) -> Result<ExtractionResult> {
        let state = self.session.as_mut().ok_or_else(|| QaError::InvalidRule("picker is not active".to_string()))?;
        if !state.is_ready_to_save() {
            return Err(QaError::InvalidRule("question and answer must be picked first".to_string()));
        }

        for role in Role::ALL {
            let capture = state.capture_mut(role);
            if let Some(expression) = capture.selector_expression().map(str::to_string) {
                capture.set_matches(page.query_all(&expression));
            }
        }
        self.overlay.sync_markers(state);

        let questions: Vec<NodeRef> = state.question.matches.iter().copied().collect();
        let answers: Vec<NodeRef> = state.answer.matches.iter().copied().collect();
        let corrects: Vec<NodeRef> = state.correct.matches.iter().copied().collect();
        let groups = self.engine.group(page, &questions, &answers, &corrects);
        Ok(ExtractionResult::from_groups(groups, PICKER_RULE_SOURCE))
    }

    /// Produce the rule and finish the session
    pub fn save(&mut self, page: &Page) -> Result<ExtractionRule> {
        let state = self.session.as_mut().ok_or_else(|| QaError::InvalidRule("picker is not active".to_string()))?;
        let (Some(question), Some(answer)) =
            (state.question.selector_expression(), state.answer.selector_expression())
        else {
            return Err(QaError::InvalidRule("question and answer must be picked first".to_string()));
        };

        let rule = ExtractionRule::new(
            question,
            answer,
            state.correct.selector_expression().map(str::to_string),
            page.url(),
        )
        .with_counts(state.question.match_count(), state.answer.match_count());

        state.step = Step::Done;
        log::info!("Saved rule for {}", rule.url_pattern);
        Ok(rule)
    }

    /// Text of the first picked question
    pub fn seed_text(&self, page: &Page) -> Option<String> {
        let node = self.session.as_ref()?.question.node?;
        Some(page.text(node)).filter(|t| !t.is_empty())
    }

    /// Eligible, canonicalized node at a top-level point
    fn target_at(&self, page: &Page, x: f64, y: f64) -> Option<NodeRef> {
        let hit = page.hit_test(x, y)?;
        if !self.is_eligible(page, hit.node) {
            return None;
        }
        let canonical = self
            .config
            .quirk
            .as_ref()
            .and_then(|quirk| quirk.resolve(page, hit.node, hit.x, hit.y).node());
        Some(canonical.unwrap_or(hit.node))
    }

    fn is_eligible(&self, page: &Page, node: NodeRef) -> bool {
        let Some(element) = page.node(node) else {
            return false;
        };
        if self.config.non_content_tags.iter().any(|tag| element.is_tag(tag)) {
            return false;
        }
        element
            .bounding_box
            .is_none_or(|b| b.width >= self.config.min_width && b.height >= self.config.min_height)
    }
}
