//! Neuroscope - Interactive Neural-Network Playground
//!
//! Neuroscope lets a user pick a model family, tune its hyperparameters and
//! watch synthetic-data training through live loss/accuracy charts and an
//! animated diagram of the network's neurons and connection weights.
//!
//! # Architecture
//!
//! The core is the topology + visualization refresh engine:
//!
//! - **Topology**: family + hyperparameters to layer widths ([`topology::derive`])
//! - **Layout**: evenly spaced neuron columns, cached per canvas ([`Layout`], [`LayoutCache`])
//! - **Weights**: three-part edge keys and the placeholder resolver ([`WeightMap`], [`weights::resolve`])
//! - **Render**: tiered edge styling, edges then nodes ([`Frame`], [`render()`])
//! - **Controller**: owns the diagram state ([`Visualizer`])
//!
//! Around it sit the training pieces: a synthetic [`Dataset`], the [`Trainer`]
//! interface with the built-in [`DenseTrainer`], rolling [`TrainingCharts`] and
//! the cancelable [`TrainingSession`] loop. With the `wasm` feature the whole
//! playground is exported to JavaScript and drawn on an HTML canvas.
//!
//! # Examples
//!
//! ## Drawing a diagram
//!
//! ```
//! use neuroscope::{BitmapSurface, CanvasSize, Hyperparameters, ModelFamily, Visualizer};
//!
//! let canvas = CanvasSize::new(450, 250);
//! let mut viz = Visualizer::new(BitmapSurface::new(canvas).unwrap()).with_seed(7);
//! viz.initialize(ModelFamily::FullyConnected, &Hyperparameters::default(), canvas)
//!     .unwrap();
//!
//! let frame = viz.last_frame().unwrap();
//! assert_eq!(frame.nodes().len(), 10 + 32 + 16 + 1);
//! ```
//!
//! ## Training with live refresh
//!
//! ```
//! use neuroscope::{
//!     BitmapSurface, DenseTrainerFactory, Hyperparameters, NoYield, PlaygroundConfig,
//!     TrainingCharts, TrainingOutcome, TrainingSession, Visualizer,
//! };
//!
//! let config = PlaygroundConfig::default()
//!     .with_hyperparameters(Hyperparameters::default().with_epochs(3).with_hidden_units(8))
//!     .with_seed(1);
//! let mut viz = Visualizer::from_config(BitmapSurface::new(config.canvas).unwrap(), &config);
//! let mut session = TrainingSession::new(config);
//! let mut factory = DenseTrainerFactory::new().with_seed(1);
//! let mut charts = TrainingCharts::new();
//!
//! let outcome = session.run(&mut viz, &mut factory, &mut charts, &mut NoYield).unwrap();
//! assert_eq!(outcome, TrainingOutcome::Completed { epochs: 3 });
//! assert_eq!(charts.loss().len(), 3);
//! ```

// Module declarations
pub mod chart;
pub mod config;
pub mod controller;
pub mod dataset;
pub mod error;
pub mod family;
pub mod layout;
pub mod render;
pub mod session;
pub mod surface;
pub mod topology;
pub mod trainer;
pub mod weights;

// Browser bindings
#[cfg(feature = "wasm")]
pub mod wasm_interface;

// Re-exports for convenient access
pub use chart::{ChartSink, RollingSeries, TrainingCharts, CHART_WINDOW};
pub use config::{CanvasSize, Hyperparameters, PlaygroundConfig};
pub use controller::{Visualizer, VizState};
pub use dataset::{Dataset, SampleShape};
pub use error::{Result, VizError};
pub use family::{ModelFamily, ModelInfo};
pub use layout::{Layout, LayoutCache, NodePosition};
pub use render::{render, EdgeStroke, Frame, NodeDot, Palette, WeightTier, NODE_RADIUS};
pub use session::{
    CancellationToken, EpochStep, FrameYield, LogPanel, NoYield, SessionState, TrainingOutcome,
    TrainingSession,
};
pub use surface::{BitmapSurface, Rgba, Surface};
pub use topology::{LayerWidths, INPUT_FEATURE_COUNT};
pub use trainer::{DenseTrainer, DenseTrainerFactory, EpochMetrics, Trainer, TrainerFactory};
pub use weights::{FallbackPolicy, WeightKey, WeightMap};

#[cfg(feature = "wasm")]
pub use wasm_interface::{CanvasSurface, WasmPlayground};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = "Neuroscope";

/// Get version string
pub fn version() -> String {
    format!("{} v{}", NAME, VERSION)
}
