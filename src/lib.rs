//! # qa-rule-picker
//!
//! Interactive question/answer selector picking over captured browser pages, with
//! selector synthesis and batch rule replay.
//!
//! ## Features
//!
//! - **Document access**: every same-origin frame of a captured page is queryable; cross-origin
//!   frames are reported as inaccessible
//! - **Selector synthesis**: one picked node becomes a CSS selector that matches its repeated
//!   siblings without over-matching
//! - **Guided picking**: question → answer → correct-indicator → preview → rule
//! - **Rule replay**: answers regrouped under their questions by document order, spatial
//!   proximity and common ancestry, with correctness classification
//!
//! ## Replaying a rule
//!
//! ```rust
//! use qa_rule_picker::{ExtractionRule, Page, ProximityEngine};
//!
//! # fn main() -> qa_rule_picker::Result<()> {
//! let page = Page::from_html(
//!     "https://lms.example.com/quiz/7",
//!     r#"<p class="q">2 + 2?</p><li class="a">3</li><li class="a correct">4</li>
//!        <p class="q">3 + 3?</p><li class="a">6</li><li class="a">7</li>"#,
//! );
//! let rule = ExtractionRule::new(".q", ".a", None, page.url());
//!
//! let result = ProximityEngine::default().extract(&page, &rule)?;
//! assert_eq!(result.groups.len(), 2);
//! assert_eq!(result.correct_count, 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Picking against a live browser
//!
//! ```rust,no_run
//! use qa_rule_picker::{BrowserSession, LaunchOptions, Picker};
//!
//! # fn main() -> qa_rule_picker::Result<()> {
//! let session = BrowserSession::launch(LaunchOptions::default())?;
//! session.navigate("https://lms.example.com/quiz/7")?;
//! session.wait_for_navigation()?;
//! let page = session.capture_page()?;
//!
//! let mut picker = Picker::default();
//! picker.activate();
//! picker.click(&page, 120.0, 80.0); // question
//! picker.click(&page, 120.0, 140.0); // answer
//! picker.skip_correct();
//! let rule = picker.save(&page)?;
//! println!("{}", rule.to_json()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`browser`]: Browser session management and page capture
//! - [`dom`]: Snapshots, document contexts, cross-frame queries and hit testing
//! - [`selector`]: Candidate generation and best-match ranking
//! - [`picker`]: The guided picking state machine
//! - [`extract`]: Extraction rules and the proximity grouping engine
//! - [`controller`]: Host command / event surface
//! - [`error`]: Error types and result aliases

pub mod browser;
pub mod controller;
pub mod dom;
pub mod error;
pub mod extract;
pub mod picker;
pub mod selector;

pub use browser::{BrowserSession, ConnectionOptions, LaunchOptions};
pub use controller::{Command, Controller, Event};
pub use dom::{AccessibleLayerQuirk, BoundingBox, DocumentId, ElementNode, NodeId, NodeRef, Page, PageSnapshot};
pub use error::{ErrorKind, QaError, Result};
pub use extract::{ExtractionConfig, ExtractionResult, ExtractionRule, ProximityEngine, QaGroup};
pub use picker::{Picker, PickerConfig, Step};
pub use selector::{CandidateSelector, SelectorSynthesizer, Strategy, SynthesizerConfig};
