//! Drawing surfaces.
//!
//! The render pass only needs four primitives, captured by the [`Surface`]
//! trait. [`BitmapSurface`] rasterizes into an in-memory RGB buffer through
//! the `plotters` bitmap backend; it is what native hosts, tests and benches
//! draw on. The browser canvas surface lives in `wasm_interface`.

use crate::{CanvasSize, Result, VizError};
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An RGBA color with straight alpha in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    /// Opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Same color with alpha `a`.
    pub const fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }

    /// Parse `#rrggbb`.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let bad = || VizError::Render(format!("invalid color '{}'", hex));
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(bad());
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| bad());
        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// CSS color string, as accepted by a 2D canvas context.
    pub fn to_css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }

    fn to_plotters(self) -> RGBAColor {
        RGBAColor(self.r, self.g, self.b, self.a)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Minimal 2D drawing target used by the render pass.
pub trait Surface {
    /// Pixel dimensions `(width, height)`.
    fn size(&self) -> (u32, u32);

    /// Fill the whole surface with `color`.
    fn clear(&mut self, color: Rgba) -> Result<()>;

    /// Stroke a straight segment.
    fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: Rgba) -> Result<()>;

    /// Fill a circle.
    fn fill_circle(&mut self, center: (f64, f64), radius: f64, color: Rgba) -> Result<()>;

    /// Change the pixel dimensions. Contents after a resize are unspecified.
    fn resize(&mut self, size: CanvasSize) -> Result<()>;
}

/// In-memory RGB raster, 3 bytes per pixel, row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct BitmapSurface {
    width: u32,
    height: u32,
    buffer: Vec<u8>,
}

impl BitmapSurface {
    /// Allocate a black surface.
    pub fn new(size: CanvasSize) -> Result<Self> {
        size.validate()?;
        Ok(Self {
            width: size.width,
            height: size.height,
            buffer: vec![0; size.width as usize * size.height as usize * 3],
        })
    }

    /// Raw RGB bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Take the raw RGB bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// RGB value of one pixel, `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.buffer[i], self.buffer[i + 1], self.buffer[i + 2]])
    }

    fn with_area<F>(&mut self, draw: F) -> Result<()>
    where
        F: FnOnce(&DrawingArea<BitMapBackend<'_>, plotters::coord::Shift>) -> Result<()>,
    {
        let root =
            BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height)).into_drawing_area();
        draw(&root)?;
        root.present().map_err(render_err)
    }
}

impl fmt::Debug for BitmapSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitmapSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

pub(crate) fn render_err<E: fmt::Debug>(e: E) -> VizError {
    VizError::Render(format!("{:?}", e))
}

#[inline]
fn to_pixel((x, y): (f64, f64)) -> (i32, i32) {
    (x.round() as i32, y.round() as i32)
}

impl Surface for BitmapSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self, color: Rgba) -> Result<()> {
        self.with_area(|root| {
            root.fill(&RGBColor(color.r, color.g, color.b))
                .map_err(render_err)
        })
    }

    fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: Rgba) -> Result<()> {
        let style = ShapeStyle {
            color: color.to_plotters(),
            filled: false,
            stroke_width: width.round().max(1.0) as u32,
        };
        self.with_area(|root| {
            root.draw(&PathElement::new(vec![to_pixel(from), to_pixel(to)], style))
                .map_err(render_err)
        })
    }

    fn fill_circle(&mut self, center: (f64, f64), radius: f64, color: Rgba) -> Result<()> {
        let style = ShapeStyle {
            color: color.to_plotters(),
            filled: true,
            stroke_width: 1,
        };
        let radius = radius.round().max(1.0) as u32;
        self.with_area(|root| {
            root.draw(&Circle::new(to_pixel(center), radius, style))
                .map_err(render_err)
        })
    }

    /// Reallocate the buffer; the new surface is black.
    fn resize(&mut self, size: CanvasSize) -> Result<()> {
        *self = Self::new(size)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_colors() {
        let c = Rgba::from_hex("#55aa55").unwrap();
        assert_eq!((c.r, c.g, c.b), (0x55, 0xaa, 0x55));
        assert_eq!(c.to_string(), "#55aa55");
        assert!(Rgba::from_hex("#55aa5").is_err());
        assert!(Rgba::from_hex("#zzzzzz").is_err());
        assert_eq!(Rgba::rgb(1, 2, 3).to_css(), "rgba(1, 2, 3, 1)");
    }

    #[test]
    fn test_zero_size_surface_rejected() {
        let err = BitmapSurface::new(CanvasSize::new(0, 5)).unwrap_err();
        assert!(matches!(err, VizError::RenderSurfaceUnavailable(_)));
    }

    #[test]
    fn test_clear_and_circle() {
        let mut surface = BitmapSurface::new(CanvasSize::new(40, 30)).unwrap();
        surface.clear(Rgba::rgb(10, 20, 30)).unwrap();
        assert_eq!(surface.pixel(0, 0), Some([10, 20, 30]));

        surface.fill_circle((20.0, 15.0), 5.0, Rgba::rgb(255, 0, 0)).unwrap();
        assert_eq!(surface.pixel(20, 15), Some([255, 0, 0]));
        assert_eq!(surface.pixel(0, 0), Some([10, 20, 30]));
        assert_eq!(surface.pixel(40, 0), None);
    }

    #[test]
    fn test_resize_reallocates() {
        let mut surface = BitmapSurface::new(CanvasSize::new(4, 4)).unwrap();
        surface.resize(CanvasSize::new(8, 2)).unwrap();
        assert_eq!(surface.size(), (8, 2));
        assert_eq!(surface.as_bytes().len(), 8 * 2 * 3);
        assert!(surface.resize(CanvasSize::new(0, 0)).is_err());
    }

    #[test]
    fn test_line_touches_endpoints_row() {
        let mut surface = BitmapSurface::new(CanvasSize::new(50, 10)).unwrap();
        surface.clear(Rgba::rgb(0, 0, 0)).unwrap();
        surface
            .stroke_line((5.0, 5.0), (45.0, 5.0), 1.0, Rgba::rgb(0, 255, 0))
            .unwrap();
        assert_eq!(surface.pixel(25, 5), Some([0, 255, 0]));
        assert_eq!(surface.pixel(25, 0), Some([0, 0, 0]));
    }
}
