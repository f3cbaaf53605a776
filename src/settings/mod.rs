/// Privacy settings module
///
/// This module handles:
/// - Option flags and their mapping onto core outcomes (option.rs)
/// - Setting definitions and per-application selections (setting.rs)
/// - The catalog of known settings (catalog.rs)

pub mod catalog;
pub mod option;
pub mod setting;
