// Licensed under the Apache-2.0 license

//! Error type shared by every stage of the compiler.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading, resolving or generating a register map.
#[derive(Error, Debug)]
pub enum Error {
    /// The document is not syntactically valid JSON/TOML.
    #[error("{document}:{line}:{column}: parse error: {message}")]
    Parse {
        document: String,
        line: usize,
        column: usize,
        message: String,
    },

    /// The document is well formed but does not follow the schema.
    #[error("schema error at {path}: {message}")]
    Schema { path: String, message: String },

    /// A data-model invariant would be violated (overlapping bits, address
    /// collision, incompatible modifiers, ...).
    #[error("conflict: {0}")]
    Conflict(String),

    /// An option or enumeration value is not recognized or not supported.
    #[error("configuration error: {0}")]
    Config(String),

    /// The file-system collaborator failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An output document could not be rendered.
    #[error("failed to render {target}: {message}")]
    Render { target: String, message: String },
}

impl Error {
    pub(crate) fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Schema {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn render(target: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Error::Render {
            target: target.into(),
            message: err.to_string(),
        }
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Error::Parse { .. })
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, Error::Schema { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

/// Result type for register-map operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Shorthand for `return Err(Error::Conflict(format!(...)))`.
macro_rules! conflict {
    ($($arg:tt)*) => {
        return Err($crate::error::Error::Conflict(format!($($arg)*)))
    };
}

/// Shorthand for `return Err(Error::Config(format!(...)))`.
macro_rules! config_err {
    ($($arg:tt)*) => {
        return Err($crate::error::Error::Config(format!($($arg)*)))
    };
}

pub(crate) use config_err;
pub(crate) use conflict;
