//! Rolling loss and accuracy charts.

use crate::surface::render_err;
use crate::{CanvasSize, Result};
use log::warn;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::ops::Range;

/// Maximum number of points kept per series.
pub const CHART_WINDOW: usize = 20;

/// Receives one point per completed epoch.
pub trait ChartSink {
    /// Record an epoch. `accuracy` is a fraction in `[0, 1]`.
    fn push(&mut self, epoch: usize, loss: f64, accuracy: Option<f64>);

    /// Forget all points.
    fn reset(&mut self);
}

/// Bounded series of `(epoch, value)` points; the oldest point is evicted first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingSeries {
    capacity: usize,
    points: VecDeque<(usize, f64)>,
}

impl RollingSeries {
    /// Series keeping at most `capacity` points (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            points: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a point. Non-finite values are dropped; returns whether it was kept.
    pub fn push(&mut self, epoch: usize, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back((epoch, value));
        true
    }

    /// Points from oldest to newest.
    pub fn points(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.points.iter().copied()
    }

    /// Most recent point.
    pub fn latest(&self) -> Option<(usize, f64)> {
        self.points.back().copied()
    }

    /// Number of points kept.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when no point has been kept.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Drop all points.
    pub fn clear(&mut self) {
        self.points.clear();
    }

    fn epoch_range(&self) -> Range<f64> {
        match (self.points.front(), self.points.back()) {
            (Some(&(first, _)), Some(&(last, _))) if last > first => first as f64..last as f64,
            (Some(&(first, _)), _) => first as f64..first as f64 + 1.0,
            _ => 0.0..1.0,
        }
    }

    fn value_max(&self) -> f64 {
        self.points.iter().map(|&(_, v)| v).fold(0.0, f64::max)
    }
}

/// Loss and accuracy (percent) charts over the last [`CHART_WINDOW`] epochs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingCharts {
    loss: RollingSeries,
    accuracy: RollingSeries,
}

impl Default for TrainingCharts {
    fn default() -> Self {
        Self::with_window(CHART_WINDOW)
    }
}

impl TrainingCharts {
    /// Charts with the default [`CHART_WINDOW`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Charts keeping `window` points per series.
    pub fn with_window(window: usize) -> Self {
        Self {
            loss: RollingSeries::new(window),
            accuracy: RollingSeries::new(window),
        }
    }

    /// Loss series.
    pub fn loss(&self) -> &RollingSeries {
        &self.loss
    }

    /// Accuracy series, in percent.
    pub fn accuracy(&self) -> &RollingSeries {
        &self.accuracy
    }

    /// Draw both charts side by side into an RGB buffer of `size`.
    pub fn rasterize(&self, size: CanvasSize) -> Result<Vec<u8>> {
        size.validate()?;
        let mut buffer = vec![0u8; size.width as usize * size.height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (size.width, size.height))
                .into_drawing_area();
            root.fill(&WHITE).map_err(render_err)?;

            let panels = root.split_evenly((1, 2));
            let loss_top = (self.loss.value_max() * 1.1).max(1e-3);
            draw_series(&panels[0], &self.loss, 0.0..loss_top, RGBColor(0xe0, 0x4b, 0x4b))?;
            draw_series(&panels[1], &self.accuracy, 0.0..100.0, RGBColor(0x4b, 0x7b, 0xe0))?;

            root.present().map_err(render_err)?;
        }
        Ok(buffer)
    }
}

fn draw_series(
    area: &DrawingArea<BitMapBackend<'_>, plotters::coord::Shift>,
    series: &RollingSeries,
    y_range: Range<f64>,
    color: RGBColor,
) -> Result<()> {
    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .build_cartesian_2d(series.epoch_range(), y_range)
        .map_err(render_err)?;
    chart
        .draw_series(LineSeries::new(
            series.points().map(|(epoch, v)| (epoch as f64, v)),
            ShapeStyle::from(&color).stroke_width(2),
        ))
        .map_err(render_err)?;
    Ok(())
}

impl ChartSink for TrainingCharts {
    fn push(&mut self, epoch: usize, loss: f64, accuracy: Option<f64>) {
        if !self.loss.push(epoch, loss) {
            warn!("epoch {}: non-finite loss {} not charted", epoch, loss);
        }
        if let Some(accuracy) = accuracy {
            if !self.accuracy.push(epoch, accuracy * 100.0) {
                warn!("epoch {}: non-finite accuracy not charted", epoch);
            }
        }
    }

    fn reset(&mut self) {
        self.loss.clear();
        self.accuracy.clear();
    }
}
