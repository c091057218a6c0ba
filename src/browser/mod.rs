//! Chrome over CDP: launching, attaching and capturing page snapshots

pub mod config;
pub mod session;

pub use config::{ConnectionOptions, LaunchOptions};
pub use session::BrowserSession;
