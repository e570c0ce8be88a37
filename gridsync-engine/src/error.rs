//! Error types for reconciliation.

use gridsync_graph::GraphError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// The mutating phases of a full replace, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReplaceStep {
    ReadExtent,
    Write,
    Resize,
    ClearTrailing,
}

impl fmt::Display for ReplaceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ReadExtent => "reading the table extent",
            Self::Write => "writing the matrix",
            Self::Resize => "resizing the table",
            Self::ClearTrailing => "clearing trailing rows",
        })
    }
}

/// Errors surfaced to the caller of a reconciliation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input rejected before any network call.
    #[error("validation error: {0}")]
    Validation(String),

    /// The stored credential is unusable. The user must reconnect.
    #[error("reconnect required: {0}")]
    Auth(String),

    /// The remote API refused a request.
    #[error("remote API error {status}: {message}")]
    Api { status: u16, message: String },

    /// A full replace stopped part-way through.
    #[error("replace failed while {step}: {source}")]
    Step {
        step: ReplaceStep,
        #[source]
        source: GraphError,
    },

    /// Network, decoding or credential-store failure below the API layer.
    #[error(transparent)]
    Transport(GraphError),

    #[error("unknown action: {0}")]
    UnknownAction(String),
}

impl EngineError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Tags a graph failure with the replace step it interrupted.
    /// Credential failures stay [`EngineError::Auth`].
    pub(crate) fn at_step(step: ReplaceStep, error: GraphError) -> Self {
        match error {
            GraphError::Auth(message) => Self::Auth(message),
            source => Self::Step { step, source },
        }
    }

    /// Upstream HTTP status, when the remote API produced one.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Step { source, .. } | Self::Transport(source) => source.status(),
            _ => None,
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

impl From<GraphError> for EngineError {
    fn from(error: GraphError) -> Self {
        match error {
            GraphError::Auth(message) => Self::Auth(message),
            GraphError::Api {
                status, message, ..
            } => Self::Api { status, message },
            other => Self::Transport(other),
        }
    }
}

impl From<gridsync_types::Error> for EngineError {
    fn from(error: gridsync_types::Error) -> Self {
        Self::Validation(error.to_string())
    }
}
