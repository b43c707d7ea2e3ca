//! Typed failure conditions callers need to tell apart.
//!
//! Everything else travels as `anyhow::Error`; these sit at the root of an
//! error chain and can be recovered with `err.downcast_ref::<CoachError>()`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoachError {
    /// A file the session cannot run without (classifier weights, a landmark
    /// trace, an uploaded clip) is missing or unreadable.
    #[error("{resource} unavailable at {}: {reason}", path.display())]
    ResourceUnavailable {
        resource: &'static str,
        path: PathBuf,
        reason: String,
    },

    /// Classifier weights were read but do not describe a usable model.
    #[error("invalid classifier model: {0}")]
    InvalidModel(String),

    /// The extended threshold must sit strictly above the contracted one.
    #[error("invalid thresholds: extended {extended}° must be greater than contracted {contracted}°")]
    InvalidThresholds { extended: f64, contracted: f64 },
}

impl CoachError {
    pub fn unavailable(resource: &'static str, path: impl Into<PathBuf>, err: impl ToString) -> Self {
        Self::ResourceUnavailable {
            resource,
            path: path.into(),
            reason: err.to_string(),
        }
    }
}
