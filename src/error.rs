//! Error taxonomy for the plugin core.
//!
//! - [`PluginError::Parse`]: malformed document, fatal for that request
//! - [`PluginError::MissingDescriptor`]: sub-module requested before its
//!   document was parsed (a router/host defect, never retried)
//! - [`PluginError::Compile`]: a back end failed for one module
//! - [`PluginError::Io`]: reading a document or external section failed

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// 1-based position in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Failure reported by a compiler back end.
#[derive(Debug, Clone)]
pub struct BackendError {
    pub message: String,
    pub loc: Option<Location>,
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.loc {
            Some(loc) => write!(f, "{loc}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for BackendError {}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            loc: None,
        }
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.loc = Some(Location { line, column });
        self
    }
}

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("{path}:{line}:{column}: {message}")]
    Parse {
        path: String,
        line: u32,
        column: u32,
        message: String,
    },

    #[error(
        "{0} has no corresponding SFC entry in the cache. This is an sfcpack internal error, please open an issue."
    )]
    MissingDescriptor(String),

    #[error("[{id}] {source}")]
    Compile {
        id: String,
        #[source]
        source: BackendError,
    },

    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),
}

impl PluginError {
    /// Tag a back end failure with the module id that triggered it.
    pub fn compile(id: impl Into<String>, source: BackendError) -> Self {
        Self::Compile {
            id: id.into(),
            source,
        }
    }

    /// Location of the failure within its source, when known.
    pub fn location(&self) -> Option<Location> {
        match self {
            Self::Parse { line, column, .. } => Some(Location {
                line: *line,
                column: *column,
            }),
            Self::Compile { source, .. } => source.loc,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_parse_error_display() {
        let err = PluginError::Parse {
            path: "App.vue".into(),
            line: 3,
            column: 1,
            message: "duplicate <template>".into(),
        };
        assert_eq!(err.to_string(), "App.vue:3:1: duplicate <template>");
        assert_eq!(err.location(), Some(Location { line: 3, column: 1 }));
    }

    #[test]
    fn test_compile_error_carries_id_and_location() {
        let err = PluginError::compile(
            "/App.vue?vue&type=style&index=0&lang.css",
            BackendError::new("unexpected token").at(2, 5),
        );
        let display = err.to_string();
        assert!(display.starts_with("[/App.vue?vue&type=style&index=0&lang.css] 2:5:"));
        assert!(display.contains("unexpected token"));
    }

    #[test]
    fn test_missing_descriptor_display() {
        let err = PluginError::MissingDescriptor("/a.vue".into());
        assert!(err.to_string().contains("internal error"));
    }

    #[test]
    fn test_io_error_display() {
        let err = PluginError::Io(
            PathBuf::from("style.css"),
            Error::new(ErrorKind::NotFound, "missing"),
        );
        assert!(err.to_string().contains("style.css"));
    }
}
