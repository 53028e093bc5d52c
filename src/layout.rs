//! Layout engine - places neurons in evenly spaced columns.
//!
//! Layer `i` sits at `x = width / (layers + 1) * (i + 1)`; neuron `j` of that
//! layer sits at `y = height / (width_i + 1) * (j + 1)`. Every position is
//! strictly inside the canvas and no two neurons overlap.
//!
//! [`LayoutCache`] keeps the last computed layout and only recomputes when the
//! layer widths or the canvas size change.

use crate::{CanvasSize, LayerWidths};
use log::debug;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Position of a single neuron on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub x: f64,
    pub y: f64,
    pub layer_index: usize,
    pub neuron_index: usize,
}

/// All neuron positions of a topology, stored layer-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    nodes: Vec<NodePosition>,
    /// Start offset of each layer in `nodes`, plus a final end offset
    offsets: Vec<usize>,
    width: f64,
    height: f64,
}

impl Layout {
    /// Compute positions for every neuron of `widths` on a `width` x `height` canvas.
    pub fn compute(widths: &LayerWidths, width: f64, height: f64) -> Self {
        let x_spacing = width / (widths.num_layers() + 1) as f64;

        let mut nodes = Vec::with_capacity(widths.total_neurons());
        let mut offsets = Vec::with_capacity(widths.num_layers() + 1);

        for (layer_index, &neurons) in widths.iter().enumerate() {
            offsets.push(nodes.len());
            let x = x_spacing * (layer_index + 1) as f64;
            let y_spacing = height / (neurons + 1) as f64;
            nodes.extend((0..neurons).map(|neuron_index| NodePosition {
                x,
                y: y_spacing * (neuron_index + 1) as f64,
                layer_index,
                neuron_index,
            }));
        }
        offsets.push(nodes.len());

        Self {
            nodes,
            offsets,
            width,
            height,
        }
    }

    /// Compute for a pixel canvas.
    pub fn for_canvas(widths: &LayerWidths, canvas: CanvasSize) -> Self {
        Self::compute(widths, canvas.width as f64, canvas.height as f64)
    }

    /// All nodes, layer 0 first.
    #[inline]
    pub fn nodes(&self) -> &[NodePosition] {
        &self.nodes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn num_layers(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Nodes of one layer, ordered by neuron index.
    ///
    /// Returns an empty slice for an out-of-range layer.
    pub fn layer(&self, layer_index: usize) -> &[NodePosition] {
        match self.layer_range(layer_index) {
            Some(range) => &self.nodes[range],
            None => &[],
        }
    }

    /// Position of one neuron.
    pub fn node(&self, layer_index: usize, neuron_index: usize) -> Option<&NodePosition> {
        self.layer(layer_index).get(neuron_index)
    }

    /// Iterate over layers as slices.
    pub fn layers(&self) -> impl Iterator<Item = &[NodePosition]> + '_ {
        (0..self.num_layers()).map(move |i| self.layer(i))
    }

    /// Canvas dimensions the layout was computed for.
    pub fn dimensions(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn layer_range(&self, layer_index: usize) -> Option<Range<usize>> {
        if layer_index + 1 >= self.offsets.len() {
            return None;
        }
        Some(self.offsets[layer_index]..self.offsets[layer_index + 1])
    }
}

/// Cache-and-compare wrapper around [`Layout::compute`].
#[derive(Debug, Clone, Default)]
pub struct LayoutCache {
    key: Option<(LayerWidths, CanvasSize)>,
    layout: Option<Layout>,
    generation: u64,
}

impl LayoutCache {
    /// Empty cache; the first lookup computes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached layout, recomputing only if `widths` or `canvas` changed.
    ///
    /// The boolean is `true` when a new layout was computed.
    pub fn get_or_compute(&mut self, widths: &LayerWidths, canvas: CanvasSize) -> (&Layout, bool) {
        let hit = matches!(&self.key, Some((w, c)) if w == widths && *c == canvas);

        if !hit {
            let layout = Layout::for_canvas(widths, canvas);
            debug!(
                "layout recomputed: widths {} on {}x{} ({} nodes)",
                widths,
                canvas.width,
                canvas.height,
                layout.len()
            );
            self.key = Some((widths.clone(), canvas));
            self.layout = Some(layout);
            self.generation += 1;
        }

        let layout = self
            .layout
            .get_or_insert_with(|| Layout::for_canvas(widths, canvas));
        (layout, !hit)
    }

    /// Most recently computed layout, if any.
    pub fn current(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    /// Number of layouts computed so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn widths(v: &[usize]) -> LayerWidths {
        LayerWidths::new(v.to_vec()).unwrap()
    }

    #[test]
    fn test_positions() {
        let layout = Layout::compute(&widths(&[2, 3, 1]), 400.0, 120.0);
        assert_eq!(layout.len(), 6);
        assert_eq!(layout.num_layers(), 3);

        // x spacing = 400 / 4 = 100
        let first = layout.node(0, 0).unwrap();
        assert_relative_eq!(first.x, 100.0);
        assert_relative_eq!(first.y, 40.0);

        let mid = layout.node(1, 2).unwrap();
        assert_relative_eq!(mid.x, 200.0);
        assert_relative_eq!(mid.y, 90.0);

        let out = layout.node(2, 0).unwrap();
        assert_relative_eq!(out.x, 300.0);
        assert_relative_eq!(out.y, 60.0);
    }

    #[test]
    fn test_layer_slices() {
        let layout = Layout::compute(&widths(&[4, 2]), 100.0, 100.0);
        assert_eq!(layout.layer(0).len(), 4);
        assert_eq!(layout.layer(1).len(), 2);
        assert!(layout.layer(2).is_empty());
        assert!(layout.node(1, 2).is_none());
        assert!(layout
            .layer(1)
            .iter()
            .enumerate()
            .all(|(j, n)| n.neuron_index == j && n.layer_index == 1));
    }

    #[test]
    fn test_cache_reuses_layout() {
        let mut cache = LayoutCache::new();
        let w = widths(&[3, 2]);
        let canvas = CanvasSize::new(300, 200);

        let (_, computed) = cache.get_or_compute(&w, canvas);
        assert!(computed);
        let (_, computed) = cache.get_or_compute(&w, canvas);
        assert!(!computed);
        assert_eq!(cache.generation(), 1);

        let (layout, computed) = cache.get_or_compute(&w, CanvasSize::new(600, 200));
        assert!(computed);
        assert_relative_eq!(layout.dimensions().0, 600.0);

        let (_, computed) = cache.get_or_compute(&widths(&[3, 3]), CanvasSize::new(600, 200));
        assert!(computed);
        assert_eq!(cache.generation(), 3);
    }
}
