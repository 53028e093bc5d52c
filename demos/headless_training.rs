//! Train every model family on synthetic data without a browser.
//!
//! Run with `RUST_LOG=info cargo run --example headless_training` to see the
//! log panel mirrored to stderr. Pass a path to also write the final charts
//! as a raw RGB dump.

use anyhow::Result;
use neuroscope::{
    BitmapSurface, CanvasSize, DenseTrainerFactory, EpochMetrics, Hyperparameters, ModelFamily,
    PlaygroundConfig, TrainingCharts, TrainingSession, Visualizer,
};

fn main() -> Result<()> {
    env_logger::init();
    let chart_path = std::env::args().nth(1);

    for family in ModelFamily::ALL {
        let config = PlaygroundConfig::default()
            .with_family(family)
            .with_hyperparameters(Hyperparameters::default().with_epochs(5).with_hidden_units(16))
            .with_seed(42);

        let mut viz = Visualizer::from_config(BitmapSurface::new(config.canvas)?, &config);
        let mut session = TrainingSession::new(config);
        let mut factory = DenseTrainerFactory::new().with_seed(42);
        let mut charts = TrainingCharts::new();

        let mut frame = |epoch: usize, metrics: &EpochMetrics| {
            println!("  [{}] epoch {} loss {:.4}", family.short_label(), epoch, metrics.loss);
        };
        let outcome = session.run(&mut viz, &mut factory, &mut charts, &mut frame)?;

        println!("=== {} ===", family);
        for line in session.log().lines() {
            println!("{}", line);
        }
        println!("outcome: {}", serde_json::to_string(&outcome)?);
        println!("diagram redraws: {}", viz.render_count());

        if let Some(path) = &chart_path {
            let size = CanvasSize::new(600, 200);
            let pixels = charts.rasterize(size)?;
            let file = format!("{}.{}.rgb", path, family.short_label().to_lowercase());
            std::fs::write(&file, pixels)?;
            println!("charts written to {} ({}x{} RGB)", file, size.width, size.height);
        }
    }

    Ok(())
}
