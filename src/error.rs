//! Error types shared by the settings codec and the application loader.
//!
//! None of these are retried internally: every condition is deterministic
//! for a given input, so they are handed straight back to the caller.

use thiserror::Error;

use crate::settings::option::OptionFlags;

/// Errors raised while validating selections or materialising store rows.
#[derive(Debug, Error)]
pub enum Error {
    /// A selection write nominated more than one option (or an unknown bit).
    #[error("selected option bits can only nominate one option (got {bits:#b})")]
    InvalidSelection { bits: u32 },

    /// The setting supports no option compatible with a core outcome.
    #[error("setting does not support any option for core outcome {outcome} (supported: {supported:?})")]
    UnsupportedOutcome {
        outcome: u8,
        supported: OptionFlags,
    },

    /// A core outcome value outside REAL, CUSTOM, RANDOM and EMPTY.
    #[error("core outcome {0} is not recognised")]
    UnrecognizedOutcome(u8),

    /// The query matched no applications; usually an uninitialised store.
    #[error("no applications match the query")]
    NoResults,

    /// A single row could not be turned into an application.
    #[error("application record {package} is corrupt: {source}")]
    RecordCorrupt {
        package: String,
        #[source]
        source: CorruptField,
    },

    /// An option label in a setting definition names no known option.
    #[error("unknown option label: {0}")]
    UnknownOption(String),

    /// A stored setting id has no definition in the catalog.
    #[error("unknown setting: {0}")]
    UnknownSetting(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The part of a row that failed to decode.
#[derive(Debug, Error)]
pub enum CorruptField {
    #[error("icon could not be decoded: {0}")]
    Icon(#[from] image::ImageError),

    #[error("column could not be read: {0}")]
    Column(#[from] rusqlite::Error),
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
