//! Draw the default diagram of each model family and report what was drawn.

use anyhow::Result;
use neuroscope::{
    BitmapSurface, CanvasSize, FallbackPolicy, Hyperparameters, ModelFamily, Visualizer,
};

fn main() -> Result<()> {
    let canvas = CanvasSize::default();
    let hp = Hyperparameters::default();

    for family in ModelFamily::ALL {
        let mut viz = Visualizer::new(BitmapSurface::new(canvas)?)
            .with_seed(7)
            .with_fallback(FallbackPolicy::Pinned);
        viz.initialize(family, &hp, canvas)?;

        let widths = viz.layer_widths().map(|w| w.to_string()).unwrap_or_default();
        if let Some(frame) = viz.last_frame() {
            let [weak, medium, strong] = frame.tier_counts();
            println!(
                "{:<28} widths {:<18} nodes {:>4} edges {:>5} (weak {}, medium {}, strong {})",
                family.name(),
                widths,
                frame.nodes().len(),
                frame.edges().len(),
                weak,
                medium,
                strong
            );
        }
    }

    Ok(())
}
