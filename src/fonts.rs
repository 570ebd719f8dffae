/*
 *  fonts.rs
 *
 *  dayboard - the day at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Typography: text measurement and rendering onto the canvas
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

use std::fs;
use std::path::Path;

use embedded_graphics::{
    mono_font::{iso_8859_1, MonoFont, MonoTextStyleBuilder},
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
    text::{Baseline, Text},
};
use fontdue::{Font, FontSettings};
use log::debug;

use crate::config::FontsConfig;
use crate::constants::DEFAULT_FONTS_DIR;
use crate::display::canvas::{Bitmap, Canvas, INK_THRESHOLD};
use crate::error::AssetError;

/// What a piece of text is, rather than which face it is set in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontRole {
    /// day-of-month numeral
    Numeral,
    /// weather temperature
    Title,
    /// month name
    Heading,
    /// day row and agenda date headers
    Label,
    /// agenda rows, weather lines
    Body,
    /// birthday lines
    Emphasis,
}

/// Text metrics and rendering, handed to the compositor.
///
/// Implementations never touch a shared scratch surface; measuring is a pure
/// function of role and string.
pub trait Typography {
    /// Advance width of `text` in pixels
    fn text_width(&self, role: FontRole, text: &str) -> u32;

    /// Height of a capital letter; vertical advances are multiples of this
    fn cap_height(&self, role: FontRole) -> u32;

    /// Full height of a drawn line, top of ascent to bottom of descent
    fn line_height(&self, role: FontRole) -> u32;

    /// Draw `text` with the top of its line box at `top_left`
    fn draw(&self, canvas: &mut Canvas, role: FontRole, text: &str, top_left: Point);
}

/// Built-in ISO-8859-1 mono fonts, integer-scaled for the big roles.
///
/// Needs no files, so it is what tests and fresh installs run with.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonoTypography;

impl MonoTypography {
    fn face(role: FontRole) -> (&'static MonoFont<'static>, u32) {
        match role {
            FontRole::Numeral => (&iso_8859_1::FONT_10X20, 5),
            FontRole::Title => (&iso_8859_1::FONT_10X20, 2),
            FontRole::Heading => (&iso_8859_1::FONT_9X15_BOLD, 2),
            FontRole::Label => (&iso_8859_1::FONT_10X20, 1),
            FontRole::Body => (&iso_8859_1::FONT_9X18, 1),
            FontRole::Emphasis => (&iso_8859_1::FONT_9X18_BOLD, 1),
        }
    }
}

impl Typography for MonoTypography {
    fn text_width(&self, role: FontRole, text: &str) -> u32 {
        let (font, scale) = Self::face(role);
        let n = text.chars().count() as u32;
        let advance = font.character_size.width + font.character_spacing;
        n.saturating_mul(advance).saturating_sub(font.character_spacing) * scale
    }

    fn cap_height(&self, role: FontRole) -> u32 {
        let (font, scale) = Self::face(role);
        font.baseline * scale
    }

    fn line_height(&self, role: FontRole) -> u32 {
        let (font, scale) = Self::face(role);
        font.character_size.height * scale
    }

    fn draw(&self, canvas: &mut Canvas, role: FontRole, text: &str, top_left: Point) {
        let (font, scale) = Self::face(role);
        let style = MonoTextStyleBuilder::new()
            .font(font)
            .text_color(BinaryColor::On)
            .build();

        if scale == 1 {
            let _ = Text::with_baseline(text, top_left, style, Baseline::Top).draw(canvas);
            return;
        }

        // set at 1:1 then blow each pixel up to a scale x scale block
        let w = self.text_width(role, text) / scale;
        let h = font.character_size.height;
        let mut glyphs = Bitmap::new(w.max(1), h, BinaryColor::Off);
        let _ = Text::with_baseline(text, Point::zero(), style, Baseline::Top).draw(&mut glyphs);

        let block = PrimitiveStyle::with_fill(BinaryColor::On);
        let side = Size::new(scale, scale);
        for y in 0..h {
            for x in 0..w {
                if glyphs.get(x, y) == Some(BinaryColor::On) {
                    let at = top_left + Point::new((x * scale) as i32, (y * scale) as i32);
                    let _ = Rectangle::new(at, side).into_styled(block).draw(canvas);
                }
            }
        }
    }
}

/// Roles mapped onto three TrueType faces at fixed pixel sizes.
struct Face {
    font: Font,
}

/// TrueType text via fontdue
pub struct TrueTypography {
    heading: Face,
    body: Face,
    body_bold: Face,
}

impl TrueTypography {
    /// Load the three faces named in the config; any failure is fatal
    pub fn load(config: &FontsConfig) -> Result<Self, AssetError> {
        let dir = config
            .dir
            .clone()
            .unwrap_or_else(|| DEFAULT_FONTS_DIR.into());
        let heading = config.heading.as_deref().unwrap_or("Roboto-Black.ttf");
        let body = config.body.as_deref().unwrap_or("Poppins-Regular.ttf");
        let body_bold = config.body_bold.as_deref().unwrap_or("Poppins-Bold.ttf");

        Ok(Self {
            heading: Face::load(&dir.join(heading))?,
            body: Face::load(&dir.join(body))?,
            body_bold: Face::load(&dir.join(body_bold))?,
        })
    }

    fn face(&self, role: FontRole) -> (&Font, f32) {
        match role {
            FontRole::Numeral => (&self.heading.font, 150.0),
            FontRole::Title => (&self.heading.font, 40.0),
            FontRole::Heading => (&self.heading.font, 30.0),
            FontRole::Label => (&self.heading.font, 20.0),
            FontRole::Body => (&self.body.font, 20.0),
            FontRole::Emphasis => (&self.body_bold.font, 22.0),
        }
    }

    fn ascent(font: &Font, px: f32) -> f32 {
        font.horizontal_line_metrics(px).map_or(px, |m| m.ascent)
    }
}

impl Face {
    fn load(path: &Path) -> Result<Self, AssetError> {
        let bytes = fs::read(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let font = Font::from_bytes(bytes, FontSettings::default()).map_err(|reason| {
            AssetError::Font {
                path: path.to_path_buf(),
                reason: reason.to_string(),
            }
        })?;
        debug!("Loaded font {}", path.display());
        Ok(Self { font })
    }
}

impl Typography for TrueTypography {
    fn text_width(&self, role: FontRole, text: &str) -> u32 {
        let (font, px) = self.face(role);
        let width: f32 = text
            .chars()
            .map(|c| font.metrics(c, px).advance_width)
            .sum();
        width.ceil() as u32
    }

    fn cap_height(&self, role: FontRole) -> u32 {
        let (font, px) = self.face(role);
        font.metrics('A', px).height as u32
    }

    fn line_height(&self, role: FontRole) -> u32 {
        let (font, px) = self.face(role);
        font.horizontal_line_metrics(px)
            .map_or(px, |m| m.ascent - m.descent)
            .ceil() as u32
    }

    fn draw(&self, canvas: &mut Canvas, role: FontRole, text: &str, top_left: Point) {
        let (font, px) = self.face(role);
        let baseline = top_left.y + Self::ascent(font, px).round() as i32;
        let mut pen_x = top_left.x as f32;

        for c in text.chars() {
            let (metrics, coverage) = font.rasterize(c, px);
            let glyph_x = pen_x.round() as i32 + metrics.xmin;
            let glyph_y = baseline - metrics.height as i32 - metrics.ymin;

            let pixels = coverage.iter().enumerate().filter_map(|(i, alpha)| {
                (*alpha >= INK_THRESHOLD).then(|| {
                    let p = Point::new(
                        glyph_x + (i % metrics.width.max(1)) as i32,
                        glyph_y + (i / metrics.width.max(1)) as i32,
                    );
                    Pixel(p, BinaryColor::On)
                })
            });
            let _ = canvas.draw_iter(pixels);
            pen_x += metrics.advance_width;
        }
    }
}

/// Shorten `text` until it fits `max_width`, marking the cut with `ellipsis`
pub fn clip_to_width<T: Typography + ?Sized>(
    typo: &T,
    role: FontRole,
    text: &str,
    max_width: u32,
    ellipsis: &str,
) -> String {
    if typo.text_width(role, text) <= max_width {
        return text.to_string();
    }
    let mut chars: Vec<char> = text.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let candidate: String = chars.iter().collect::<String>().trim_end().to_string() + ellipsis;
        if typo.text_width(role, &candidate) <= max_width {
            return candidate;
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_width_scales() {
        let t = MonoTypography;
        assert_eq!(t.text_width(FontRole::Label, "ab"), 20);
        assert_eq!(t.text_width(FontRole::Numeral, "31"), 100);
        assert_eq!(t.text_width(FontRole::Body, ""), 0);
        assert_eq!(t.line_height(FontRole::Numeral), 100);
    }

    #[test]
    fn test_mono_draw_inks_within_measured_box() {
        let t = MonoTypography;
        let mut canvas = Canvas::new(200, 120);
        t.draw(&mut canvas, FontRole::Numeral, "8", Point::new(10, 5));
        let height = t.line_height(FontRole::Numeral);
        assert!(canvas.ink_in_rows(5, 5 + height) > 0);
        assert_eq!(canvas.ink_in_rows(0, 5), 0);
        assert_eq!(canvas.ink_in_rows(5 + height, 120), 0);
    }

    #[test]
    fn test_clip_to_width() {
        let t = MonoTypography;
        // FONT_9X18: 9px per char
        assert_eq!(clip_to_width(&t, FontRole::Body, "short", 100, "..."), "short");
        let clipped = clip_to_width(&t, FontRole::Body, "a much longer summary", 90, "...");
        assert!(clipped.ends_with("..."));
        assert!(t.text_width(FontRole::Body, &clipped) <= 90);
        assert_eq!(clip_to_width(&t, FontRole::Body, "abc", 5, "..."), "");
    }

    #[test]
    fn test_missing_truetype_font_is_fatal() {
        let config = FontsConfig {
            dir: Some("/nonexistent".into()),
            ..Default::default()
        };
        assert!(matches!(TrueTypography::load(&config), Err(AssetError::Io { .. })));
    }
}
