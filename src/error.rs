//! Error types for Neuroscope.
//!
//! This module provides a unified error type for all operations in the
//! playground, using the `thiserror` crate for ergonomic error handling.

use thiserror::Error;

/// The main error type for Neuroscope operations.
///
/// Pure computation errors (`InvalidTopology`, `InvalidHyperparameter`) are
/// returned synchronously to the immediate caller. Trainer errors are caught by
/// the training session and never reach the visualization state.
#[derive(Error, Debug)]
pub enum VizError {
    /// Unknown model family or a layer-width sequence that breaks its invariants
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    /// The visualizer was used before a successful `initialize()`
    #[error("Visualizer not initialized - call initialize() before update()")]
    NotInitialized,

    /// Drawing surface or chart elements are missing from the host
    #[error("Render surface unavailable: {0}")]
    RenderSurfaceUnavailable(String),

    /// Hyperparameter outside its allowed range
    #[error("Invalid hyperparameter {name}: {value} not in [{min}, {max}]")]
    InvalidHyperparameter {
        /// Field name
        name: &'static str,
        /// Rejected value
        value: f64,
        /// Inclusive lower bound
        min: f64,
        /// Inclusive upper bound
        max: f64,
    },

    /// The training session cannot accept the request in its current state
    #[error("Session busy: {0}")]
    SessionBusy(String),

    /// Trainer could not be constructed
    #[error("Trainer build failed: {0}")]
    TrainerBuild(String),

    /// A single training step (epoch) failed
    #[error("Trainer step failed: {0}")]
    TrainerStep(String),

    /// Drawing backend failure
    #[error("Render error: {0}")]
    Render(String),

    /// Tensor or sample size disagreement
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Expected size
        expected: usize,
        /// Actual size received
        actual: usize,
    },

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A specialized `Result` type for Neuroscope operations.
pub type Result<T> = std::result::Result<T, VizError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VizError::NotInitialized;
        assert_eq!(
            err.to_string(),
            "Visualizer not initialized - call initialize() before update()"
        );

        let err = VizError::ShapeMismatch {
            expected: 784,
            actual: 10,
        };
        assert_eq!(err.to_string(), "Shape mismatch: expected 784, got 10");

        let err = VizError::SessionBusy("training already in progress".to_string());
        assert_eq!(err.to_string(), "Session busy: training already in progress");

        let err = VizError::InvalidHyperparameter {
            name: "batch_size",
            value: 0.0,
            min: 1.0,
            max: 512.0,
        };
        assert_eq!(
            err.to_string(),
            "Invalid hyperparameter batch_size: 0 not in [1, 512]"
        );
    }

    #[test]
    fn test_serde_error_converts() {
        fn parse() -> Result<serde_json::Value> {
            Ok(serde_json::from_str("{not json")?)
        }

        assert!(matches!(parse(), Err(VizError::Serialization(_))));
    }
}
