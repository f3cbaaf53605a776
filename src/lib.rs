//! Review and override per-application privacy decisions.
//!
//! - `settings` maps the privacy subsystem's four core outcomes onto each
//!   setting's own option menu, and holds per-application selections.
//! - `state` owns the SQLite store and materializes installed applications
//!   from it.

pub mod config;
pub mod error;
pub mod settings;
pub mod state;

pub use error::{Error, Result};
