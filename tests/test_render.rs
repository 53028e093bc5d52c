//! Integration tests for the render pass.
//!
//! A recording surface captures the drawing calls so ordering and styling can
//! be checked without inspecting pixels; the bitmap surface covers idempotence.

use neuroscope::{
    render, BitmapSurface, CanvasSize, Frame, LayerWidths, Layout, Palette, Result, Rgba, Surface,
    WeightKey, WeightMap, WeightTier, NODE_RADIUS,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Debug, Clone, PartialEq)]
enum Op {
    Clear(Rgba),
    Line {
        from: (f64, f64),
        to: (f64, f64),
        width: f64,
        color: Rgba,
    },
    Circle {
        center: (f64, f64),
        radius: f64,
        color: Rgba,
    },
}

struct RecordingSurface {
    size: (u32, u32),
    ops: Vec<Op>,
}

impl RecordingSurface {
    fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            ops: Vec::new(),
        }
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn clear(&mut self, color: Rgba) -> Result<()> {
        self.ops.push(Op::Clear(color));
        Ok(())
    }

    fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: Rgba) -> Result<()> {
        self.ops.push(Op::Line {
            from,
            to,
            width,
            color,
        });
        Ok(())
    }

    fn fill_circle(&mut self, center: (f64, f64), radius: f64, color: Rgba) -> Result<()> {
        self.ops.push(Op::Circle {
            center,
            radius,
            color,
        });
        Ok(())
    }

    fn resize(&mut self, size: CanvasSize) -> Result<()> {
        self.size = (size.width, size.height);
        Ok(())
    }
}

fn full_weights(widths: &LayerWidths, value: impl Fn(usize, usize, usize) -> f64) -> WeightMap {
    let mut map = WeightMap::new();
    for (layer, pair) in widths.windows(2).enumerate() {
        for src in 0..pair[0] {
            for dst in 0..pair[1] {
                map.insert(WeightKey::new(layer, src, dst), value(layer, src, dst));
            }
        }
    }
    map
}

#[test]
fn test_edges_then_nodes() -> Result<()> {
    let widths = LayerWidths::new(vec![2, 3, 1])?;
    let layout = Layout::compute(&widths, 400.0, 200.0);
    let mut surface = RecordingSurface::new(400, 200);
    let mut rng = StdRng::seed_from_u64(0);

    render(&mut surface, &layout, &WeightMap::new(), &Palette::default(), &mut rng)?;

    let ops = &surface.ops;
    assert_eq!(ops.len(), 1 + widths.total_edges() + widths.total_neurons());
    assert!(matches!(ops[0], Op::Clear(c) if c == Palette::default().background));

    let first_circle = ops.iter().position(|op| matches!(op, Op::Circle { .. })).unwrap();
    assert_eq!(first_circle, 1 + widths.total_edges());
    assert!(ops[first_circle..].iter().all(|op| matches!(op, Op::Circle { .. })));
    Ok(())
}

#[test]
fn test_node_colors_and_radius() -> Result<()> {
    let widths = LayerWidths::new(vec![2, 3, 1])?;
    let layout = Layout::compute(&widths, 400.0, 200.0);
    let palette = Palette::default();
    let mut surface = RecordingSurface::new(400, 200);
    let mut rng = StdRng::seed_from_u64(1);

    render(&mut surface, &layout, &WeightMap::new(), &palette, &mut rng)?;

    let colors: Vec<Rgba> = surface
        .ops
        .iter()
        .filter_map(|op| match op {
            Op::Circle { radius, color, .. } => {
                assert_eq!(*radius, NODE_RADIUS);
                Some(*color)
            }
            _ => None,
        })
        .collect();
    let io = palette.io_neuron;
    let hidden = palette.hidden_neuron;
    assert_eq!(colors, vec![io, io, hidden, hidden, hidden, io]);
    Ok(())
}

#[test]
fn test_observed_strong_edge_with_random_fallback() -> Result<()> {
    let widths = LayerWidths::new(vec![10, 32, 16, 1])?;
    let layout = Layout::compute(&widths, 900.0, 500.0);
    let weights: WeightMap = serde_json::from_str(r#"{"0-0-0": 0.85}"#)?;
    let palette = Palette::default();
    let mut surface = RecordingSurface::new(900, 500);
    let mut rng = StdRng::seed_from_u64(2);

    let frame = render(&mut surface, &layout, &weights, &palette, &mut rng)?;

    let source = layout.node(0, 0).unwrap();
    let dest = layout.node(1, 0).unwrap();
    let line = surface
        .ops
        .iter()
        .find_map(|op| match op {
            Op::Line {
                from,
                to,
                width,
                color,
            } if *from == (source.x, source.y) && *to == (dest.x, dest.y) => Some((*width, *color)),
            _ => None,
        })
        .unwrap();
    assert_eq!(line, (1.7, palette.strong_edge));

    for edge in frame.edges() {
        assert!((-1.0..=1.0).contains(&edge.weight));
        assert_eq!(edge.tier, WeightTier::classify(edge.weight));
    }
    Ok(())
}

#[test]
fn test_full_weight_map_is_pixel_idempotent() -> Result<()> {
    let widths = LayerWidths::new(vec![4, 6, 3, 2])?;
    let canvas = CanvasSize::new(240, 160);
    let layout = Layout::for_canvas(&widths, canvas);
    let weights = full_weights(&widths, |l, s, d| ((l + s * 7 + d * 3) % 21) as f64 / 10.0 - 1.0);

    let mut first = BitmapSurface::new(canvas)?;
    let mut second = BitmapSurface::new(canvas)?;
    render(&mut first, &layout, &weights, &Palette::default(), &mut StdRng::seed_from_u64(3))?;
    render(&mut second, &layout, &weights, &Palette::default(), &mut StdRng::seed_from_u64(99))?;
    assert_eq!(first.as_bytes(), second.as_bytes());

    // a second pass on the same surface changes nothing
    let before = first.as_bytes().to_vec();
    render(&mut first, &layout, &weights, &Palette::default(), &mut StdRng::seed_from_u64(4))?;
    assert_eq!(first.as_bytes(), before.as_slice());
    Ok(())
}

#[test]
fn test_plan_matches_draw() -> Result<()> {
    let widths = LayerWidths::new(vec![3, 2])?;
    let layout = Layout::compute(&widths, 100.0, 100.0);
    let frame = Frame::plan(&layout, |key| if key.source_neuron == 0 { 0.9 } else { 0.1 });
    assert_eq!(frame.tier_counts(), [4, 0, 2]);

    let mut surface = RecordingSurface::new(100, 100);
    frame.draw(&mut surface, &Palette::default())?;
    let strong = surface
        .ops
        .iter()
        .filter(|op| matches!(op, Op::Line { color, .. } if *color == Palette::default().strong_edge))
        .count();
    assert_eq!(strong, 2);
    Ok(())
}
