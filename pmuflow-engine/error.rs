use std::io;
use thiserror::Error;

use pmuflow_raw::FieldError;

/// Error taxonomy exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No descriptor matches the host, or the feature is unsupported
    NotSupported,
    /// Unresolved event, unit mask, modifier or PMU name
    NotFound,
    /// Malformed string, out-of-range or conflicting modifier value
    Invalid,
    /// Encoding needs more registers than the PMU provides
    TooMany,
    /// Event table authoring defect
    Validation,
    /// Library used before initialization or after teardown
    Lifecycle,
    Io,
}

#[derive(Error, Debug)]
pub enum PmuError {
    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Unknown {what}: {token}")]
    NotFound { what: &'static str, token: String },

    #[error("Invalid '{token}': {reason}")]
    Invalid { token: String, reason: String },

    #[error("Too many registers: {0}")]
    TooMany(String),

    #[error("Event table for {pmu} failed validation ({} errors)", .errors.len())]
    Validation {
        pmu: String,
        errors: Vec<ValidationError>,
    },

    #[error("Library not initialized")]
    NotInitialized,

    #[error("Session has been terminated")]
    Terminated,

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl PmuError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PmuError::NotSupported(_) => ErrorKind::NotSupported,
            PmuError::NotFound { .. } => ErrorKind::NotFound,
            PmuError::Invalid { .. } => ErrorKind::Invalid,
            PmuError::TooMany(_) => ErrorKind::TooMany,
            PmuError::Validation { .. } => ErrorKind::Validation,
            PmuError::NotInitialized | PmuError::Terminated => ErrorKind::Lifecycle,
            PmuError::IoError(_) | PmuError::ParseError(_) => ErrorKind::Io,
        }
    }

    /// The offending token or value, when the error carries one
    pub fn token(&self) -> Option<&str> {
        match self {
            PmuError::NotFound { token, .. } | PmuError::Invalid { token, .. } => Some(token),
            _ => None,
        }
    }

    pub(crate) fn not_found(what: &'static str, token: impl Into<String>) -> Self {
        PmuError::NotFound {
            what,
            token: token.into(),
        }
    }

    pub(crate) fn invalid(token: impl Into<String>, reason: impl Into<String>) -> Self {
        PmuError::Invalid {
            token: token.into(),
            reason: reason.into(),
        }
    }

    /// Map a register packing failure onto the caller-facing taxonomy
    pub(crate) fn from_field(token: impl Into<String>, err: FieldError) -> Self {
        match err {
            FieldError::NoSuchRegister { .. } => PmuError::TooMany(err.to_string()),
            FieldError::ValueOverflow { .. } | FieldError::BadGeometry { .. } => {
                PmuError::invalid(token, err.to_string())
            }
        }
    }
}

/// Event table authoring defects found by the self-validator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("PMU has no events")]
    EmptyTable,

    #[error("{what} has an empty description")]
    EmptyDescription { what: String },

    #[error("duplicate event name {name}")]
    DuplicateEvent { name: String },

    #[error("event {event}: code 0x{code:x} does not fit in {width} bits")]
    CodeOverflow { event: String, code: u64, width: u32 },

    #[error("event {event}: umask {umask} value 0x{value:x} does not fit in {width} bits")]
    UmaskOverflow {
        event: String,
        umask: String,
        value: u64,
        width: u32,
    },

    #[error("event {event}: duplicate umask {umask}")]
    DuplicateUmask { event: String, umask: String },

    #[error("event {event}: umasks {first} and {second} overlap but may be combined")]
    UmaskOverlap {
        event: String,
        first: String,
        second: String,
    },

    #[error("events {first} and {second} share the same umask table")]
    SharedUmasks { first: String, second: String },

    #[error("event {event}: group {group:?} has more than one default umask")]
    MultipleDefaults { event: String, group: Option<u16> },

    #[error("event {event}: modifier {modifier} is not supported by this PMU")]
    UnknownModifier { event: String, modifier: String },

    #[error("field {field}: {source}")]
    FieldGeometry { field: String, source: FieldError },

    #[error("fields {first} and {second} overlap")]
    FieldOverlap { first: String, second: String },

    #[error("PMU declares {max_encoding} registers, at least 1 and at most {limit} allowed")]
    BadCapacity { max_encoding: usize, limit: usize },

    #[error("PMU id {id} or name {name} already registered")]
    DuplicatePmu { name: String, id: u32 },
}

pub type Result<T> = std::result::Result<T, PmuError>;
