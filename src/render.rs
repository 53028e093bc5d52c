//! Render pass.
//!
//! Rendering is split into a pure planning step and a drawing step. [`Frame::plan`]
//! walks the layout, resolves every edge weight and records what should be drawn;
//! [`Frame::draw`] replays that onto a [`Surface`]. Edges are drawn before nodes so
//! every neuron sits on top of its connections.

use crate::surface::{Rgba, Surface};
use crate::weights::{self, WeightKey, WeightMap};
use crate::{Layout, Result};
use itertools::Itertools;
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Radius of every neuron dot, in pixels.
pub const NODE_RADIUS: f64 = 7.0;

/// Upper bound (exclusive) of the weak tier.
pub const WEAK_LIMIT: f64 = 0.3;

/// Upper bound (exclusive) of the medium tier.
pub const MEDIUM_LIMIT: f64 = 0.7;

/// Colors used by the render pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub background: Rgba,
    pub weak_edge: Rgba,
    pub medium_edge: Rgba,
    pub strong_edge: Rgba,
    /// Input and output layer neurons
    pub io_neuron: Rgba,
    pub hidden_neuron: Rgba,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Rgba::rgb(0x00, 0x00, 0x00),
            weak_edge: Rgba::rgb(0x55, 0xaa, 0x55),
            medium_edge: Rgba::rgb(0x33, 0xcc, 0x33),
            strong_edge: Rgba::rgb(0x22, 0xff, 0x22),
            io_neuron: Rgba::rgb(0x33, 0xff, 0x33),
            hidden_neuron: Rgba::rgb(0x88, 0x88, 0x88),
        }
    }
}

impl Palette {
    /// Stroke color for an edge of `tier`.
    pub fn edge_color(&self, tier: WeightTier) -> Rgba {
        match tier {
            WeightTier::Weak => self.weak_edge,
            WeightTier::Medium => self.medium_edge,
            WeightTier::Strong => self.strong_edge,
        }
    }
}

/// Visual strength class of an edge, by weight magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightTier {
    Weak,
    Medium,
    Strong,
}

impl WeightTier {
    /// Classify `|weight|`: below 0.3 is weak, below 0.7 medium, the rest strong.
    pub fn classify(weight: f64) -> Self {
        let magnitude = weight.abs();
        if magnitude < WEAK_LIMIT {
            WeightTier::Weak
        } else if magnitude < MEDIUM_LIMIT {
            WeightTier::Medium
        } else {
            WeightTier::Strong
        }
    }
}

/// One planned connection segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeStroke {
    pub key: WeightKey,
    pub from: (f64, f64),
    pub to: (f64, f64),
    pub weight: f64,
    pub tier: WeightTier,
}

impl EdgeStroke {
    /// Stroke width, proportional to weight magnitude.
    #[inline]
    pub fn width(&self) -> f64 {
        self.weight.abs() * 2.0
    }
}

/// One planned neuron dot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeDot {
    pub center: (f64, f64),
    pub layer_index: usize,
    pub neuron_index: usize,
    /// Belongs to the input or output layer
    pub io: bool,
}

/// Everything one render pass draws, in drawing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    edges: Vec<EdgeStroke>,
    nodes: Vec<NodeDot>,
}

impl Frame {
    /// Plan a frame, asking `resolve` for the weight of every edge.
    ///
    /// Edges are enumerated destination-major: for each neuron of layer `i > 0`,
    /// every neuron of layer `i - 1`.
    pub fn plan<F>(layout: &Layout, mut resolve: F) -> Self
    where
        F: FnMut(WeightKey) -> f64,
    {
        let mut edges = Vec::new();
        for (source_layer, (sources, dests)) in layout.layers().tuple_windows().enumerate() {
            edges.reserve(sources.len() * dests.len());
            for dest in dests {
                for source in sources {
                    let key = WeightKey::new(source_layer, source.neuron_index, dest.neuron_index);
                    let weight = resolve(key);
                    edges.push(EdgeStroke {
                        key,
                        from: (source.x, source.y),
                        to: (dest.x, dest.y),
                        weight,
                        tier: WeightTier::classify(weight),
                    });
                }
            }
        }

        let last_layer = layout.num_layers().saturating_sub(1);
        let nodes = layout
            .nodes()
            .iter()
            .map(|node| NodeDot {
                center: (node.x, node.y),
                layer_index: node.layer_index,
                neuron_index: node.neuron_index,
                io: node.layer_index == 0 || node.layer_index == last_layer,
            })
            .collect();

        Self { edges, nodes }
    }

    /// Clear `surface` and draw the frame: edges first, then nodes.
    pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S, palette: &Palette) -> Result<()> {
        surface.clear(palette.background)?;
        for edge in &self.edges {
            surface.stroke_line(edge.from, edge.to, edge.width(), palette.edge_color(edge.tier))?;
        }
        for node in &self.nodes {
            let color = if node.io {
                palette.io_neuron
            } else {
                palette.hidden_neuron
            };
            surface.fill_circle(node.center, NODE_RADIUS, color)?;
        }
        Ok(())
    }

    /// Planned edges in drawing order.
    pub fn edges(&self) -> &[EdgeStroke] {
        &self.edges
    }

    /// Planned nodes, layer-major.
    pub fn nodes(&self) -> &[NodeDot] {
        &self.nodes
    }

    /// Planned edge for `key`, if it is part of the diagram.
    pub fn edge(&self, key: WeightKey) -> Option<&EdgeStroke> {
        self.edges.iter().find(|e| e.key == key)
    }

    /// Edge counts per tier: `[weak, medium, strong]`.
    pub fn tier_counts(&self) -> [usize; 3] {
        let mut counts = [0; 3];
        for edge in &self.edges {
            counts[edge.tier as usize] += 1;
        }
        counts
    }
}

/// Plan and draw one frame, resolving missing weights with fresh placeholders.
pub fn render<S, R>(
    surface: &mut S,
    layout: &Layout,
    weights: &WeightMap,
    palette: &Palette,
    rng: &mut R,
) -> Result<Frame>
where
    S: Surface + ?Sized,
    R: Rng + ?Sized,
{
    let frame = Frame::plan(layout, |key| weights::resolve(weights, key, rng));
    frame.draw(surface, palette)?;
    debug!(
        "rendered {} edges, {} nodes (tiers {:?})",
        frame.edges.len(),
        frame.nodes.len(),
        frame.tier_counts()
    );
    Ok(frame)
}
