//! WebAssembly interface for running the playground in the browser.
//!
//! [`CanvasSurface`] draws the network diagram on an HTML `<canvas>` through its
//! 2D context. [`WasmPlayground`] bundles the visualizer, the training session,
//! the charts and the built-in trainer behind a JavaScript-friendly API.
//! Training is driven one epoch per call to [`WasmPlayground::tick`], typically
//! from `requestAnimationFrame`, so the page stays responsive and every
//! refreshed diagram reaches the screen.

use std::f64::consts::TAU;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::surface::{Rgba, Surface};
use crate::{
    CanvasSize, DenseTrainerFactory, EpochStep, ModelFamily, PlaygroundConfig, Result,
    TrainingCharts, TrainingSession, Visualizer, VizError,
};

fn js_err(e: VizError) -> JsValue {
    JsValue::from_str(&format!("{:?}", e))
}

fn unavailable(what: &str) -> VizError {
    VizError::RenderSurfaceUnavailable(what.to_string())
}

/// A [`Surface`] backed by a browser canvas element.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl CanvasSurface {
    /// Look up `<canvas id=...>` and acquire its 2D context.
    pub fn from_element_id(id: &str) -> Result<Self> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| unavailable("no document"))?;
        let canvas = document
            .get_element_by_id(id)
            .ok_or_else(|| unavailable(&format!("no element with id '{}'", id)))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| unavailable(&format!("element '{}' is not a canvas", id)))?;
        Self::new(canvas)
    }

    pub fn new(canvas: HtmlCanvasElement) -> Result<Self> {
        let context = canvas
            .get_context("2d")
            .map_err(|e| VizError::RenderSurfaceUnavailable(format!("{:?}", e)))?
            .ok_or_else(|| unavailable("2d context not supported"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| unavailable("unexpected context type"))?;
        Ok(Self { canvas, context })
    }
}

impl Surface for CanvasSurface {
    fn size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    #[allow(deprecated)]
    fn clear(&mut self, color: Rgba) -> Result<()> {
        let (w, h) = self.size();
        self.context
            .set_fill_style(&JsValue::from_str(&color.to_css()));
        self.context.fill_rect(0.0, 0.0, w as f64, h as f64);
        Ok(())
    }

    #[allow(deprecated)]
    fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: Rgba) -> Result<()> {
        let ctx = &self.context;
        ctx.begin_path();
        ctx.move_to(from.0, from.1);
        ctx.line_to(to.0, to.1);
        ctx.set_line_width(width);
        ctx.set_stroke_style(&JsValue::from_str(&color.to_css()));
        ctx.stroke();
        Ok(())
    }

    #[allow(deprecated)]
    fn fill_circle(&mut self, center: (f64, f64), radius: f64, color: Rgba) -> Result<()> {
        let ctx = &self.context;
        ctx.begin_path();
        ctx.arc(center.0, center.1, radius, 0.0, TAU)
            .map_err(|e| VizError::Render(format!("{:?}", e)))?;
        ctx.set_fill_style(&JsValue::from_str(&color.to_css()));
        ctx.fill();
        Ok(())
    }

    fn resize(&mut self, size: CanvasSize) -> Result<()> {
        size.validate()?;
        self.canvas.set_width(size.width);
        self.canvas.set_height(size.height);
        Ok(())
    }
}

/// The whole playground, exported to JavaScript.
#[wasm_bindgen]
pub struct WasmPlayground {
    viz: Visualizer<CanvasSurface>,
    session: TrainingSession,
    factory: DenseTrainerFactory,
    charts: TrainingCharts,
    // log lines already mirrored to the browser console
    mirrored: usize,
}

#[wasm_bindgen]
impl WasmPlayground {
    /// Attach to the canvas with id `canvas_id` and draw the default diagram.
    ///
    /// # Example (JavaScript)
    /// ```javascript
    /// const playground = new WasmPlayground("networkCanvas");
    /// ```
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str) -> std::result::Result<WasmPlayground, JsValue> {
        // Enable panic messages in browser console
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        let surface = CanvasSurface::from_element_id(canvas_id).map_err(js_err)?;
        let (width, height) = surface.size();
        let config = PlaygroundConfig::default().with_canvas(CanvasSize::new(width, height));

        let mut playground = Self {
            viz: Visualizer::from_config(surface, &config),
            session: TrainingSession::new(config),
            factory: DenseTrainerFactory::new(),
            charts: TrainingCharts::new(),
            mirrored: 0,
        };
        playground.redraw_topology().map_err(js_err)?;
        Ok(playground)
    }

    /// Switch model family ("mlp", "cnn", "rnn" or full names) and redraw.
    pub fn select_family(&mut self, name: &str) -> std::result::Result<(), JsValue> {
        let family: ModelFamily = name.parse().map_err(js_err)?;
        let config = self.session.config().clone().with_family(family);
        self.session.set_config(config).map_err(js_err)?;
        self.redraw_topology().map_err(js_err)
    }

    /// Set one slider value by field name, e.g. `"hidden_units"`.
    pub fn set_hyperparameter(&mut self, name: &str, value: f64) -> std::result::Result<(), JsValue> {
        let mut config = self.session.config().clone();
        let hp = &mut config.hyperparameters;
        match name {
            "learning_rate" => hp.learning_rate = value,
            "batch_size" => hp.batch_size = value as usize,
            "epochs" => hp.epochs = value as usize,
            "hidden_units" => hp.hidden_units = value as usize,
            "filters" => hp.filters = value as usize,
            _ => return Err(JsValue::from_str(&format!("Unknown hyperparameter '{}'", name))),
        }
        self.session.set_config(config).map_err(js_err)?;
        if name == "hidden_units" || name == "filters" {
            self.redraw_topology().map_err(js_err)?;
        }
        Ok(())
    }

    /// Replace the whole configuration from JSON.
    pub fn import_config(&mut self, json: &str) -> std::result::Result<(), JsValue> {
        let config = PlaygroundConfig::from_json(json).map_err(js_err)?;
        self.session.set_config(config).map_err(js_err)?;
        self.redraw_topology().map_err(js_err)
    }

    pub fn export_config(&self) -> std::result::Result<String, JsValue> {
        self.session.config().to_json().map_err(js_err)
    }

    /// Start/stop button handler. Returns `true` while epochs are scheduled;
    /// a stopped run is settled by the next `tick` or start.
    pub fn toggle_training(&mut self) -> std::result::Result<bool, JsValue> {
        if self.session.is_training() {
            self.session.request_stop();
        } else {
            self.session
                .start(&mut self.viz, &mut self.charts)
                .map_err(js_err)?;
        }
        self.mirror_log();
        Ok(self.session.is_training())
    }

    /// Train one epoch. Returns `true` while more ticks are needed.
    pub fn tick(&mut self) -> bool {
        let step = self
            .session
            .step(&mut self.viz, &mut self.factory, &mut self.charts);
        self.mirror_log();
        matches!(step, EpochStep::Trained { .. })
    }

    pub fn is_training(&self) -> bool {
        self.session.is_training()
    }

    /// Caption for the start/stop toggle.
    pub fn button_label(&self) -> String {
        self.session.state().button_label().to_string()
    }

    /// Log panel lines as a JSON array.
    pub fn log_json(&self) -> std::result::Result<String, JsValue> {
        serde_json::to_string(self.session.log().lines())
            .map_err(|e| JsValue::from_str(&format!("{:?}", e)))
    }

    /// Loss and accuracy series as JSON.
    pub fn charts_json(&self) -> std::result::Result<String, JsValue> {
        serde_json::to_string(&self.charts).map_err(|e| JsValue::from_str(&format!("{:?}", e)))
    }

    /// Title, description and parameter lists of the selected family.
    pub fn model_info_json(&self) -> std::result::Result<String, JsValue> {
        serde_json::to_string(self.session.config().family.info())
            .map_err(|e| JsValue::from_str(&format!("{:?}", e)))
    }

    /// Follow a canvas resize.
    pub fn resize(&mut self, width: u32, height: u32) -> std::result::Result<(), JsValue> {
        let canvas = CanvasSize::new(width, height);
        self.viz.resize(canvas).map_err(js_err)?;
        if !self.session.is_training() {
            let config = self.session.config().clone().with_canvas(canvas);
            self.session.set_config(config).map_err(js_err)?;
        }
        Ok(())
    }
}

impl WasmPlayground {
    fn redraw_topology(&mut self) -> Result<()> {
        let config = self.session.config();
        self.viz
            .initialize(config.family, &config.hyperparameters, config.canvas)
    }

    fn mirror_log(&mut self) {
        let lines = self.session.log().lines();
        if lines.len() < self.mirrored {
            // panel was cleared by a new run
            self.mirrored = 0;
        }
        for line in &lines[self.mirrored..] {
            web_sys::console::log_1(&JsValue::from_str(line));
        }
        self.mirrored = lines.len();
    }
}
