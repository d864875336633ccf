#![allow(non_shorthand_field_patterns)]
#![doc = "Error handling primitives shared across the badge crate."]
// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! The derive emitted by [`masterror::Error`] expands pattern matches that
//! trigger the `non_shorthand_field_patterns` lint. The lint is disabled for
//! the module to keep the generated implementations warning-free.
//!
//! Errors fall into three families: fetch failures ([`Error::Transport`],
//! [`Error::Upstream`], [`Error::Decode`]) that are propagated unmodified,
//! upstream format problems ([`Error::Schema`]) and the user-facing
//! [`Error::NotFound`] condition. Every variant maps onto a short badge
//! message through [`Error::pretty_message`].

use std::path::{Path, PathBuf};

use masterror::AppError;

/// Unified error type returned by the badge pipeline, the fetch layer and the
/// CLI.
#[derive(Debug, masterror::Error)]
pub enum Error {
    /// Wraps I/O errors that occur while reading configuration files.
    #[error("failed to read configuration from {path:?}: {source}")]
    Io {
        /// Location of the configuration file.
        path:   PathBuf,
        /// Underlying I/O error.
        source: std::io::Error
    },
    /// Wraps YAML decoding errors.
    #[error("failed to parse configuration: {source}")]
    Parse {
        /// Source decoding error from serde_yaml.
        source: serde_yaml::Error
    },
    /// Returned when configuration or request input violates invariants.
    #[error("invalid input: {message}")]
    Validation {
        /// Human readable message describing the validation problem.
        message: String
    },
    /// Wraps serialization errors when writing badge documents.
    #[error("failed to serialize badge: {source}")]
    Serialize {
        /// Underlying serialization error.
        source: serde_json::Error
    },
    /// Wraps I/O errors that occur while writing badge artifacts.
    #[error("failed to write badge artifact at {path:?}: {source}")]
    BadgeIo {
        /// Location of the artifact being produced.
        path:   PathBuf,
        /// Underlying I/O error reported by the operating system.
        source: std::io::Error
    },
    /// Wraps I/O errors that occur while printing badge documents.
    #[error("failed to write badge output: {source}")]
    Output {
        /// Underlying I/O error reported by the output stream.
        source: std::io::Error
    },
    /// The upstream service could not be reached.
    #[error("request to {url} failed: {source}")]
    Transport {
        /// URL of the failed request.
        url:    String,
        /// Transport error reported by the HTTP client.
        source: reqwest::Error
    },
    /// The upstream service answered with a non-success status.
    #[error("upstream responded with status {status}: {message}")]
    Upstream {
        /// HTTP status code returned by the service.
        status:  u16,
        /// Message describing the status for badge consumers.
        message: String
    },
    /// The upstream body was not valid JSON.
    #[error("failed to decode upstream response: {source}")]
    Decode {
        /// Underlying JSON error.
        source: serde_json::Error
    },
    /// The upstream document does not match the expected report shape.
    #[error("invalid report: {message}")]
    Schema {
        /// Description of the first violation encountered.
        message: String
    },
    /// The requested branch or metric is not present in the report.
    #[error("not found: {message}")]
    NotFound {
        /// Short description rendered on the badge.
        message: String
    }
}

impl Error {
    /// Constructs a validation error from the provided displayable value.
    ///
    /// # Parameters
    ///
    /// * `message` - Human-readable description of the validation failure.
    pub fn validation<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Validation {
            message: message.into()
        }
    }

    /// Constructs a schema error describing an upstream format violation.
    pub fn schema<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Schema {
            message: message.into()
        }
    }

    /// Constructs a not-found error carrying the badge message.
    pub fn not_found<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::NotFound {
            message: message.into()
        }
    }

    /// Returns `true` for errors that surface as a "not found" outcome.
    ///
    /// Upstream `404` responses count as not-found alongside missing
    /// branches and metrics.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::Upstream {
                    status: 404, ..
                }
        )
    }

    /// Returns `true` when retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Upstream {
                status, ..
            } => *status == 429 || *status >= 500,
            _ => false
        }
    }

    /// Short message suitable for rendering on an error badge.
    pub fn pretty_message(&self) -> String {
        match self {
            Self::NotFound {
                message
            }
            | Self::Upstream {
                message, ..
            }
            | Self::Validation {
                message
            } => message.clone(),
            Self::Transport { .. } => "inaccessible".to_owned(),
            Self::Decode { .. } | Self::Schema { .. } => "invalid response data".to_owned(),
            Self::Io { .. }
            | Self::Parse { .. }
            | Self::Serialize { .. }
            | Self::BadgeIo { .. }
            | Self::Output { .. } => "internal error".to_owned()
        }
    }

    /// HTTP status a badge endpoint should answer with for this error.
    pub fn status_code(&self) -> u16 {
        if self.is_not_found() {
            return 404;
        }

        match self {
            Self::Validation { .. } => 400,
            Self::Transport { .. }
            | Self::Upstream { .. }
            | Self::Decode { .. }
            | Self::Schema { .. } => 502,
            _ => 500
        }
    }

    /// Formats the error for diagnostics without the variant name.
    ///
    /// The returned string matches the [`std::fmt::Display`] implementation.
    pub fn to_display_string(&self) -> String {
        format!("{self}")
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(source: serde_yaml::Error) -> Self {
        Self::Parse {
            source
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Serialize {
            source
        }
    }
}

impl From<Error> for AppError {
    fn from(error: Error) -> Self {
        let message = error.to_display_string();
        if error.is_not_found() {
            return AppError::not_found(message);
        }

        match error {
            Error::Validation { .. } => AppError::validation(message),
            Error::Transport { .. }
            | Error::Upstream { .. }
            | Error::Decode { .. }
            | Error::Schema { .. } => AppError::service(message),
            _ => AppError::internal(message)
        }
    }
}

/// Creates an [`Error::Io`] variant capturing the failing path and source.
///
/// # Parameters
///
/// * `path` - Location of the configuration file that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source
    }
}

/// Creates an [`Error::BadgeIo`] variant capturing the failing path and source.
///
/// # Parameters
///
/// * `path` - Location of the badge artifact that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn badge_io_error(path: &Path, source: std::io::Error) -> Error {
    Error::BadgeIo {
        path: path.to_path_buf(),
        source
    }
}

/// Creates an [`Error::Output`] for a failed write to an output stream.
///
/// JSON errors that wrap an I/O failure are unwrapped so the stream error is
/// reported instead of a serialization error.
pub fn output_error<E>(source: E) -> Error
where
    E: Into<std::io::Error>
{
    Error::Output {
        source: source.into()
    }
}
