//! Visualization controller.
//!
//! [`Visualizer`] owns everything the diagram needs between epochs: the selected
//! family and hyperparameters, the derived layer widths, the layout cache, the
//! latest weight map and the drawing surface. There is no global state; a host
//! that wants several diagrams creates several visualizers.
//!
//! Lifecycle:
//!
//! ```text
//! Uninitialized --initialize--> Ready --update/resize--> Ready
//!                                 \--initialize (new topology)--> Ready
//! ```
//!
//! # Example
//!
//! ```
//! use neuroscope::{BitmapSurface, CanvasSize, Hyperparameters, ModelFamily, Visualizer, WeightMap};
//!
//! let canvas = CanvasSize::new(300, 200);
//! let mut viz = Visualizer::new(BitmapSurface::new(canvas).unwrap()).with_seed(42);
//! viz.initialize(ModelFamily::FullyConnected, &Hyperparameters::default().with_hidden_units(4), canvas)
//!     .unwrap();
//! viz.update(WeightMap::new()).unwrap();
//! assert_eq!(viz.layer_widths().unwrap().as_slice(), &[10, 4, 4, 1]);
//! ```

use crate::render::{Frame, Palette};
use crate::surface::Surface;
use crate::weights::{self, FallbackPolicy, PlaceholderCache, WeightMap};
use crate::{
    topology, CanvasSize, Hyperparameters, LayerWidths, Layout, LayoutCache, ModelFamily,
    PlaygroundConfig, Result, VizError,
};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a [`Visualizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VizState {
    Uninitialized,
    Ready,
}

/// Owns the visualization state and redraws it on demand.
pub struct Visualizer<S: Surface> {
    surface: S,
    palette: Palette,
    fallback: FallbackPolicy,
    rng: StdRng,

    state: VizState,
    family: Option<ModelFamily>,
    hyperparameters: Option<Hyperparameters>,
    widths: Option<LayerWidths>,
    canvas: CanvasSize,
    layouts: LayoutCache,
    weights: WeightMap,
    pinned: PlaceholderCache,

    last_frame: Option<Frame>,
    render_count: u64,
}

impl<S: Surface> Visualizer<S> {
    /// Create an uninitialized visualizer drawing on `surface`.
    pub fn new(surface: S) -> Self {
        let (width, height) = surface.size();
        Self {
            surface,
            palette: Palette::default(),
            fallback: FallbackPolicy::default(),
            rng: StdRng::from_entropy(),
            state: VizState::Uninitialized,
            family: None,
            hyperparameters: None,
            widths: None,
            canvas: CanvasSize::new(width, height),
            layouts: LayoutCache::new(),
            weights: WeightMap::new(),
            pinned: PlaceholderCache::new(),
            last_frame: None,
            render_count: 0,
        }
    }

    /// Create a visualizer using the fallback policy and seed of `config`.
    pub fn from_config(surface: S, config: &PlaygroundConfig) -> Self {
        let viz = Self::new(surface).with_fallback(config.fallback);
        match config.seed {
            Some(seed) => viz.with_seed(seed),
            None => viz,
        }
    }

    /// Seed the placeholder-weight generator.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Draw with `palette` instead of the default colors.
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Choose how unobserved edges are drawn.
    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// Select a topology and draw it once.
    ///
    /// Everything is validated before any state changes, so a failed call
    /// leaves the previous diagram in place. On success the weight map and any
    /// pinned placeholders are cleared.
    pub fn initialize(
        &mut self,
        family: ModelFamily,
        hyperparameters: &Hyperparameters,
        canvas: CanvasSize,
    ) -> Result<()> {
        hyperparameters.validate()?;
        canvas.validate()?;
        let widths = topology::derive(family, hyperparameters)?;

        if self.surface.size() != (canvas.width, canvas.height) {
            self.surface.resize(canvas)?;
        }

        info!(
            "visualizer initialized: {} {} ({} neurons, {} edges)",
            family.short_label(),
            widths,
            widths.total_neurons(),
            widths.total_edges()
        );

        self.family = Some(family);
        self.hyperparameters = Some(*hyperparameters);
        self.widths = Some(widths);
        self.canvas = canvas;
        self.weights = WeightMap::new();
        self.pinned.clear();
        self.state = VizState::Ready;

        self.redraw()
    }

    /// Replace the weight map and redraw with the cached layout.
    pub fn update(&mut self, weights: WeightMap) -> Result<()> {
        if self.state != VizState::Ready {
            return Err(VizError::NotInitialized);
        }
        debug!("weights updated: {} observed", weights.len());
        self.weights = weights;
        self.redraw()
    }

    /// Follow a canvas size change: re-layout and redraw.
    pub fn resize(&mut self, canvas: CanvasSize) -> Result<()> {
        if self.state != VizState::Ready {
            return Err(VizError::NotInitialized);
        }
        canvas.validate()?;
        self.surface.resize(canvas)?;
        self.canvas = canvas;
        self.redraw()
    }

    fn redraw(&mut self) -> Result<()> {
        let widths = self.widths.as_ref().ok_or(VizError::NotInitialized)?;
        let (layout, _) = self.layouts.get_or_compute(widths, self.canvas);

        let observed = &self.weights;
        let rng = &mut self.rng;
        let frame = match self.fallback {
            FallbackPolicy::Resample => {
                Frame::plan(layout, |key| weights::resolve(observed, key, rng))
            }
            FallbackPolicy::Pinned => {
                let pinned = &mut self.pinned;
                Frame::plan(layout, |key| pinned.resolve(observed, key, rng))
            }
        };

        frame.draw(&mut self.surface, &self.palette)?;
        self.last_frame = Some(frame);
        self.render_count += 1;
        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> VizState {
        self.state
    }

    /// True after a successful `initialize`.
    pub fn is_ready(&self) -> bool {
        self.state == VizState::Ready
    }

    /// Selected family, once initialized.
    pub fn family(&self) -> Option<ModelFamily> {
        self.family
    }

    /// Hyperparameters of the current topology.
    pub fn hyperparameters(&self) -> Option<&Hyperparameters> {
        self.hyperparameters.as_ref()
    }

    /// Layer widths of the current topology.
    pub fn layer_widths(&self) -> Option<&LayerWidths> {
        self.widths.as_ref()
    }

    /// Current layout, once initialized.
    pub fn layout(&self) -> Option<&Layout> {
        self.layouts.current()
    }

    /// Number of layouts computed so far.
    pub fn layout_generation(&self) -> u64 {
        self.layouts.generation()
    }

    /// Weights observed by the last `update`.
    pub fn weights(&self) -> &WeightMap {
        &self.weights
    }

    /// Canvas size the layout was computed for.
    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    /// Fallback policy for unobserved edges.
    pub fn fallback(&self) -> FallbackPolicy {
        self.fallback
    }

    /// Colors used for drawing.
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Frame drawn by the most recent render pass.
    pub fn last_frame(&self) -> Option<&Frame> {
        self.last_frame.as_ref()
    }

    /// Number of render passes so far.
    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    /// Drawing surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Drawing surface, mutably.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Consume the visualizer and return its surface.
    pub fn into_surface(self) -> S {
        self.surface
    }
}
