//! Playground configuration.
//!
//! Hyperparameters are an explicit, typed structure whose ranges are checked
//! once at the boundary ([`Hyperparameters::validate`]) rather than discovered
//! deep inside topology derivation. [`PlaygroundConfig`] bundles everything a
//! session needs and serializes to JSON so the browser front end can hand over
//! its slider state in one call.
//!
//! # Example
//!
//! ```
//! use neuroscope::{ModelFamily, PlaygroundConfig};
//!
//! let config = PlaygroundConfig::default().with_family(ModelFamily::Recurrent);
//! let json = config.to_json().unwrap();
//! let restored = PlaygroundConfig::from_json(&json).unwrap();
//! assert_eq!(config, restored);
//! ```

use crate::weights::FallbackPolicy;
use crate::{ModelFamily, Result, VizError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::RangeInclusive;

/// Allowed learning rates.
pub const LEARNING_RATE_RANGE: RangeInclusive<f64> = 1e-4..=1.0;
/// Allowed mini-batch sizes.
pub const BATCH_SIZE_RANGE: RangeInclusive<usize> = 1..=512;
/// Allowed epoch counts.
pub const EPOCHS_RANGE: RangeInclusive<usize> = 1..=500;
/// Allowed hidden-unit counts.
pub const HIDDEN_UNITS_RANGE: RangeInclusive<usize> = 1..=512;
/// Allowed convolution filter counts.
pub const FILTERS_RANGE: RangeInclusive<usize> = 1..=64;

/// Default synthetic dataset size.
pub const DEFAULT_SAMPLE_COUNT: usize = 100;

/// Slider values for one training run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hyperparameters {
    pub learning_rate: f64,
    pub batch_size: usize,
    pub epochs: usize,
    pub hidden_units: usize,
    pub filters: usize,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            batch_size: 16,
            epochs: 10,
            hidden_units: 32,
            filters: 8,
        }
    }
}

impl Hyperparameters {
    /// Reject any field outside its allowed range.
    pub fn validate(&self) -> Result<()> {
        if !self.learning_rate.is_finite() || !LEARNING_RATE_RANGE.contains(&self.learning_rate) {
            return Err(VizError::InvalidHyperparameter {
                name: "learning_rate",
                value: self.learning_rate,
                min: *LEARNING_RATE_RANGE.start(),
                max: *LEARNING_RATE_RANGE.end(),
            });
        }
        check_range("batch_size", self.batch_size, &BATCH_SIZE_RANGE)?;
        check_range("epochs", self.epochs, &EPOCHS_RANGE)?;
        check_range("hidden_units", self.hidden_units, &HIDDEN_UNITS_RANGE)?;
        check_range("filters", self.filters, &FILTERS_RANGE)?;
        Ok(())
    }

    /// Set `hidden_units`.
    pub fn with_hidden_units(mut self, hidden_units: usize) -> Self {
        self.hidden_units = hidden_units;
        self
    }

    /// Set `filters`.
    pub fn with_filters(mut self, filters: usize) -> Self {
        self.filters = filters;
        self
    }

    /// Set `epochs`.
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Set `batch_size`.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set `learning_rate`.
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }
}

fn check_range(name: &'static str, value: usize, range: &RangeInclusive<usize>) -> Result<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(VizError::InvalidHyperparameter {
            name,
            value: value as f64,
            min: *range.start() as f64,
            max: *range.end() as f64,
        })
    }
}

/// Pixel dimensions of the network diagram canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    /// Canvas of `width` x `height` pixels. Not validated.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Both dimensions must be non-zero.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(VizError::RenderSurfaceUnavailable(format!(
                "canvas has zero area ({}x{})",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::new(900, 500)
    }
}

/// Complete configuration of a playground session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaygroundConfig {
    /// Version of the configuration format
    pub version: String,
    pub family: ModelFamily,
    pub hyperparameters: Hyperparameters,
    pub canvas: CanvasSize,
    /// Synthetic samples generated per run
    pub sample_count: usize,
    /// Seed for data, initialization and placeholder weights; `None` seeds from entropy
    pub seed: Option<u64>,
    /// How edges without an observed weight are drawn
    pub fallback: FallbackPolicy,
    /// Free-form metadata (session name, notes)
    pub metadata: HashMap<String, String>,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            family: ModelFamily::FullyConnected,
            hyperparameters: Hyperparameters::default(),
            canvas: CanvasSize::default(),
            sample_count: DEFAULT_SAMPLE_COUNT,
            seed: None,
            fallback: FallbackPolicy::default(),
            metadata: HashMap::new(),
        }
    }
}

impl PlaygroundConfig {
    /// Select the model family.
    pub fn with_family(mut self, family: ModelFamily) -> Self {
        self.family = family;
        self
    }

    /// Replace all hyperparameters.
    pub fn with_hyperparameters(mut self, hyperparameters: Hyperparameters) -> Self {
        self.hyperparameters = hyperparameters;
        self
    }

    /// Seed data generation and placeholder weights.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the canvas size.
    pub fn with_canvas(mut self, canvas: CanvasSize) -> Self {
        self.canvas = canvas;
        self
    }

    /// Add metadata to the configuration.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Validate every field that has a constrained range.
    pub fn validate(&self) -> Result<()> {
        self.hyperparameters.validate()?;
        self.canvas.validate()?;
        if self.sample_count == 0 {
            return Err(VizError::ShapeMismatch {
                expected: DEFAULT_SAMPLE_COUNT,
                actual: 0,
            });
        }
        Ok(())
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON string and validate.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
