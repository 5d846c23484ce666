//! Error types for tf-why.
//!
//! Only the boundary of the pipeline can fail: reading the plan bytes,
//! decoding them, loading configuration, invoking terraform and writing a
//! report. Once a [`Plan`](crate::plan::Plan) exists, analysis is total and
//! never returns an error.
//!
//! # Error Categories
//!
//! - **Input errors**: empty or malformed plan JSON
//! - **IO errors**: reading plan files, writing reports
//! - **Config errors**: invalid configuration files or values
//! - **Terraform errors**: `--run` mode subprocess failures
//!
//! # Example
//!
//! ```rust
//! use tf_why::error::{TfWhyError, Result};
//!
//! fn read_plan(path: &str) -> Result<Vec<u8>> {
//!     std::fs::read(path).map_err(|e| TfWhyError::Io {
//!         path: path.into(),
//!         source: e,
//!         src_path: file!(),
//!         src_line: line!(),
//!     })
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Macro to create errors with automatic source location tracking.
///
/// Usage:
/// ```ignore
/// return Err(err!(ConfigValue { key: "ci.fail_on".to_string(), message: "unknown".to_string() }));
/// ```
#[macro_export]
macro_rules! err {
    ($variant:ident) => {
        $crate::error::TfWhyError::$variant {
            src_path: file!(),
            src_line: line!(),
        }
    };
    ($variant:ident { $($field:ident $(: $value:expr)?),* $(,)? }) => {
        $crate::error::TfWhyError::$variant {
            $($field $(: $value)?,)*
            src_path: file!(),
            src_line: line!(),
        }
    };
}

/// A specialized Result type for tf-why operations.
pub type Result<T> = std::result::Result<T, TfWhyError>;

/// The main error type for tf-why.
#[derive(Error, Debug)]
pub enum TfWhyError {
    // =========================================================================
    // Plan Input Errors
    // =========================================================================
    /// The plan input contained no data.
    #[error(
        "empty input; expected Terraform plan JSON (from `terraform show -json <planfile>`) ({src_path}:{src_line})"
    )]
    EmptyInput {
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// The plan input is not well-formed JSON of the expected shape.
    #[error("failed to parse plan JSON ({src_path}:{src_line}): {message}")]
    MalformedInput {
        /// Error message
        message: String,
        /// The underlying decode error
        #[source]
        source: serde_json::Error,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // I/O Errors
    // =========================================================================
    /// I/O error with path context.
    #[error("I/O error at '{path}' ({src_path}:{src_line}): {source}")]
    Io {
        /// The path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration parsing error.
    #[error("Failed to parse configuration ({src_path}:{src_line}): {message}")]
    ConfigParse {
        /// Error message
        message: String,
        /// The underlying error (if any)
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}' ({src_path}:{src_line}): {message}")]
    ConfigValue {
        /// The configuration key
        key: String,
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Configuration file already exists (`init` refuses to overwrite).
    #[error("Configuration file already exists: {path} ({src_path}:{src_line})")]
    ConfigExists {
        /// The existing file
        path: PathBuf,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Terraform Errors
    // =========================================================================
    /// Running terraform to produce a plan failed.
    #[error("terraform error ({src_path}:{src_line}): {message}")]
    Terraform {
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Report Errors
    // =========================================================================
    /// Report generation error.
    #[error("Failed to generate report ({src_path}:{src_line}): {message}")]
    ReportGeneration {
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },
}

impl TfWhyError {
    /// Creates a `ConfigParse` error.
    #[must_use]
    pub fn config_parse(
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        src_path: &'static str,
        src_line: u32,
    ) -> Self {
        Self::ConfigParse { message, source, src_path, src_line }
    }

    /// Returns true for the two fatal plan-input errors (empty or malformed).
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(self, Self::EmptyInput { .. } | Self::MalformedInput { .. })
    }
}

/// Extension trait for `Result` to add context to errors.
pub trait ResultExt<T> {
    /// Adds a file path context to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| TfWhyError::Io {
            path: path.into(),
            source,
            src_path: file!(),
            src_line: line!(),
        })
    }
}

impl From<std::io::Error> for TfWhyError {
    fn from(source: std::io::Error) -> Self {
        // Prefer `ResultExt::with_path` when the path is known.
        Self::Io {
            path: PathBuf::new(),
            source,
            src_path: file!(),
            src_line: line!(),
        }
    }
}

impl From<serde_json::Error> for TfWhyError {
    fn from(source: serde_json::Error) -> Self {
        Self::MalformedInput {
            message: source.to_string(),
            source,
            src_path: file!(),
            src_line: line!(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_err_macro_captures_location() {
        let e = crate::err!(EmptyInput);
        match e {
            TfWhyError::EmptyInput { src_path, src_line } => {
                assert!(src_path.ends_with("error.rs"));
                assert!(src_line > 0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_err_macro_shorthand_fields() {
        let message = "unknown severity".to_string();
        let e = crate::err!(ConfigValue {
            key: "ci.fail_on".to_string(),
            message,
        });
        match e {
            TfWhyError::ConfigValue { key, message, .. } => {
                assert_eq!(key, "ci.fail_on");
                assert_eq!(message, "unknown severity");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_input_message() {
        let e = crate::err!(EmptyInput);
        assert!(e.to_string().contains("empty input"));
        assert!(e.is_input_error());
    }

    #[test]
    fn test_malformed_from_serde() {
        let source = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let e = TfWhyError::from(source);
        assert!(e.is_input_error());
        assert!(e.to_string().contains("failed to parse plan JSON"));
    }

    #[test]
    fn test_with_path() {
        let res: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let e = res.with_path("plan.json").unwrap_err();
        assert!(e.to_string().contains("plan.json"));
        assert!(!e.is_input_error());
    }
}
