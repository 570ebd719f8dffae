/*
 *  display/canvas.rs
 *
 *  dayboard - the day at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  The 1-bit composition surface and its conversions (BMP export, panel
 *  buffer packing, rotation)
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use core::convert::Infallible;
use std::path::Path;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use image::{GrayImage, ImageFormat, Luma};

use crate::display::error::DisplayError;
use crate::vframebuf::VarFrameBuf;

/// A decoded 1-bit image (icons, weather glyphs). `On` is ink.
pub type Bitmap = VarFrameBuf<BinaryColor>;

/// Luminance threshold shared by every image that ends up on the canvas
pub const INK_THRESHOLD: u8 = 128;

/// Dark and opaque enough to print
pub fn is_ink(r: u8, g: u8, b: u8, a: u8) -> bool {
    let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    luma < INK_THRESHOLD as f32 && a >= INK_THRESHOLD
}

/// Portrait composition surface.
///
/// Paper is `BinaryColor::Off`, ink is `BinaryColor::On`. The canvas is
/// composed in its own orientation and only converted to the panel's native
/// layout when packed for the driver.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    fb: VarFrameBuf<BinaryColor>,
}

impl Canvas {
    /// Blank (all paper) canvas
    pub fn new(width: u32, height: u32) -> Self {
        Self { fb: VarFrameBuf::new(width, height, BinaryColor::Off) }
    }

    /// Canvas seeded from a pre-printed background
    pub fn from_bitmap(base: Bitmap) -> Self {
        Self { fb: base }
    }

    pub fn width(&self) -> u32 { self.fb.width() as u32 }
    pub fn height(&self) -> u32 { self.fb.height() as u32 }

    pub fn pixel(&self, x: u32, y: u32) -> Option<BinaryColor> {
        self.fb.get(x, y)
    }

    /// Copy a bitmap onto the canvas with its top-left at `at`
    pub fn paste(&mut self, bitmap: &Bitmap, at: Point) {
        let w = bitmap.width();
        for (i, c) in bitmap.as_slice().iter().enumerate() {
            let p = Point::new((i % w) as i32, (i / w) as i32);
            self.fb.set(at + p, *c);
        }
    }

    pub fn rotate_180(&mut self) {
        self.fb.rotate_180();
    }

    /// Number of ink pixels in rows `top..bottom`
    pub fn ink_in_rows(&self, top: u32, bottom: u32) -> usize {
        let w = self.fb.width();
        let top = (top as usize).min(self.fb.height());
        let bottom = (bottom as usize).min(self.fb.height());
        if top >= bottom {
            return 0;
        }
        self.fb.as_slice()[top * w..bottom * w]
            .iter()
            .filter(|c| c.is_on())
            .count()
    }

    /// 8-bit grayscale copy (ink 0, paper 255)
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width(), self.height(), |x, y| {
            match self.fb.get(x, y) {
                Some(BinaryColor::On) => Luma([0u8]),
                _ => Luma([255u8]),
            }
        })
    }

    /// Write the canvas as a BMP file
    pub fn save_bmp(&self, path: &Path) -> Result<(), image::ImageError> {
        self.to_gray_image().save_with_format(path, ImageFormat::Bmp)
    }

    /// Pack into a panel frame: 1 bit per pixel, MSB first, rows padded to
    /// whole bytes, bit set = white.
    ///
    /// A portrait canvas headed for a landscape panel is turned 90 degrees
    /// counter-clockwise first.
    pub fn to_panel_buffer(&self, panel_width: u32, panel_height: u32) -> Result<Vec<u8>, DisplayError> {
        let rotated;
        let fb = if (self.width(), self.height()) == (panel_width, panel_height) {
            &self.fb
        } else if (self.height(), self.width()) == (panel_width, panel_height) {
            rotated = self.fb.rotated_90_ccw();
            &rotated
        } else {
            return Err(DisplayError::InvalidConfiguration(format!(
                "canvas {}x{} does not fit panel {}x{}",
                self.width(),
                self.height(),
                panel_width,
                panel_height
            )));
        };

        let stride = (panel_width as usize).div_ceil(8);
        let mut buffer = vec![0xFFu8; stride * panel_height as usize];
        let w = fb.width();
        for (i, c) in fb.as_slice().iter().enumerate() {
            if c.is_on() {
                let (x, y) = (i % w, i / w);
                buffer[y * stride + x / 8] &= !(0x80 >> (x % 8));
            }
        }
        Ok(buffer)
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        self.fb.size()
    }
}

impl DrawTarget for Canvas {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.fb.draw_iter(pixels)
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        self.fb.fill_contiguous(area, colors)
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fb.clear_color(color);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ink_threshold() {
        assert!(is_ink(0, 0, 0, 255));
        assert!(!is_ink(255, 255, 255, 255));
        // transparent black is paper
        assert!(!is_ink(0, 0, 0, 0));
    }

    #[test]
    fn test_blank_canvas_packs_to_white() {
        let canvas = Canvas::new(16, 4);
        let buf = canvas.to_panel_buffer(16, 4).unwrap();
        assert_eq!(buf, vec![0xFF; 8]);
    }

    #[test]
    fn test_panel_buffer_is_msb_first() {
        let mut canvas = Canvas::new(16, 1);
        canvas.fb.set(Point::new(0, 0), BinaryColor::On);
        canvas.fb.set(Point::new(9, 0), BinaryColor::On);
        let buf = canvas.to_panel_buffer(16, 1).unwrap();
        assert_eq!(buf, vec![0x7F, 0xBF]);
    }

    #[test]
    fn test_portrait_canvas_rotates_onto_landscape_panel() {
        let mut canvas = Canvas::new(8, 16);
        // top right pixel of the portrait canvas
        canvas.fb.set(Point::new(7, 0), BinaryColor::On);
        let buf = canvas.to_panel_buffer(16, 8).unwrap();
        assert_eq!(buf.len(), 16);
        // lands top left on the panel
        assert_eq!(buf[0], 0x7F);
        assert!(buf[1..].iter().all(|b| *b == 0xFF));
    }

    #[test]
    fn test_panel_size_mismatch() {
        let canvas = Canvas::new(10, 10);
        assert!(canvas.to_panel_buffer(16, 8).is_err());
    }

    #[test]
    fn test_paste_and_ink_rows() {
        let mut canvas = Canvas::new(10, 10);
        let icon = Bitmap::new(3, 2, BinaryColor::On);
        canvas.paste(&icon, Point::new(8, 4));
        // two columns fit, one clipped
        assert_eq!(canvas.ink_in_rows(0, 10), 4);
        assert_eq!(canvas.ink_in_rows(4, 5), 2);
        assert_eq!(canvas.ink_in_rows(6, 10), 0);
    }

    #[test]
    fn test_gray_image_levels() {
        let mut canvas = Canvas::new(2, 1);
        canvas.fb.set(Point::new(1, 0), BinaryColor::On);
        let img = canvas.to_gray_image();
        assert_eq!(img.get_pixel(0, 0).0, [255]);
        assert_eq!(img.get_pixel(1, 0).0, [0]);
    }
}
