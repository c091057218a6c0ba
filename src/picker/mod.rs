//! Guided question / answer / correct-indicator picking
//!
//! `Picker` drives `IDLE → PICK_QUESTION → PICK_ANSWER → PICK_CORRECT →
//! PREVIEW → DONE`. Highlight state lives in `Overlay` as plain data for a
//! host to paint.

pub mod machine;
pub mod overlay;
pub mod state;

pub use machine::{ClickOutcome, InputEvent, InputOutcome, Picker, PickerConfig};
pub use overlay::{Highlight, HighlightKind, Listener, Overlay};
pub use state::{PickerState, Role, RoleCapture, Step};
