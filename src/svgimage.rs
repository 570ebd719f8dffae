//! Module for rendering SVG icons to a 1-bit bitmap.
//!
//! This module uses `resvg` (and its `usvg` re-export) for parsing and
//! rendering. Dark, opaque pixels become ink; everything else is paper, so
//! black-on-transparent icon sets come out the right way round.

use resvg::{
    render,
    usvg::{
        Tree as ResvgTree,
        Options as ResvgUsvgOptions,
        Transform,
    }
}; // Use resvg's re-exports for usvg types

use embedded_graphics::pixelcolor::BinaryColor;
use tiny_skia::Pixmap;
use log::debug;
use std::error::Error;
use std::fmt;

use crate::display::canvas::{is_ink, Bitmap};

/// Custom error type for SVG rendering operations.
#[derive(Debug)]
pub enum SvgImageError {
    /// Error parsing the SVG data.
    SvgParseError(String),
    /// Error creating a pixmap for rendering.
    PixmapCreationError(String),
}

impl fmt::Display for SvgImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SvgImageError::SvgParseError(msg) => write!(f, "SVG parse error: {}", msg),
            SvgImageError::PixmapCreationError(msg) => write!(f, "Pixmap creation error: {}", msg),
        }
    }
}

impl Error for SvgImageError {}

/// Renders SVG data to a monochrome bitmap.
#[derive(Debug)]
pub struct SvgImageRenderer {
    tree: ResvgTree,
    target_width: u32,
    target_height: u32,
}

impl SvgImageRenderer {
    /// Creates a new `SvgImageRenderer` from SVG string data and target dimensions.
    ///
    /// The SVG will be scaled to fit `target_width` and `target_height`.
    pub fn new(svg_data: &str, target_width: u32, target_height: u32) -> Result<Self, SvgImageError> {
        let usvg_options = ResvgUsvgOptions::default();
        let tree = ResvgTree::from_str(svg_data, &usvg_options)
            .map_err(|e| SvgImageError::SvgParseError(format!("Failed to parse SVG: {:?}", e)))?;
        Ok(SvgImageRenderer {
            tree,
            target_width,
            target_height,
        })
    }

    /// Render and threshold into a bitmap of the target size.
    pub fn render_bitmap(&self) -> Result<Bitmap, SvgImageError> {
        let mut pixmap = Pixmap::new(self.target_width, self.target_height)
            .ok_or_else(|| SvgImageError::PixmapCreationError(format!(
                "Failed to create {}x{} pixmap", self.target_width, self.target_height
            )))?;

        // viewBox origin is assumed at (0,0)
        let svg_size = self.tree.size();
        let scale_x = self.target_width as f32 / svg_size.width();
        let scale_y = self.target_height as f32 / svg_size.height();
        let transform = Transform::from_scale(scale_x, scale_y);

        render(&self.tree, transform, &mut pixmap.as_mut());

        // pixmap is premultiplied; un-premultiply before judging luminance
        let width = self.target_width;
        let pixels = pixmap.pixels();
        let bitmap = Bitmap::from_fn(self.target_width, self.target_height, |x, y| {
            let p = pixels[(y * width + x) as usize].demultiply();
            if is_ink(p.red(), p.green(), p.blue(), p.alpha()) {
                BinaryColor::On
            } else {
                BinaryColor::Off
            }
        });

        debug!("SVG rendered to {}x{} bitmap", self.target_width, self.target_height);
        Ok(bitmap)
    }
}
