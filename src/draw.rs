/*
 *  draw.rs
 *
 *  dayboard - the day at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Drawing primitives shared by the dashboard regions
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

use embedded_graphics::{
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{Line, PrimitiveStyleBuilder},
};

use crate::display::canvas::Canvas;
use crate::fonts::{FontRole, Typography};

/// Horizontal rule from `x0` to `x1` centred on `y`
pub fn draw_hline<D>(target: &mut D, x0: i32, x1: i32, y: i32, width: u32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor> + OriginDimensions,
{
    draw_line(target, Point::new(x0, y), Point::new(x1, y), width)
}

/// Vertical stroke from `y0` down to `y1` centred on `x`
pub fn draw_vline<D>(target: &mut D, x: i32, y0: i32, y1: i32, width: u32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor> + OriginDimensions,
{
    draw_line(target, Point::new(x, y0), Point::new(x, y1), width)
}

pub fn draw_line<D>(target: &mut D, start: Point, end: Point, width: u32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor> + OriginDimensions,
{
    Line::new(start, end)
        .into_styled(
            PrimitiveStyleBuilder::new()
                .stroke_width(width)
                .stroke_color(BinaryColor::On)
                .build(),
        )
        .draw(target)
}

/// Text whose right edge sits on `right_x`
pub fn draw_text_right<T: Typography + ?Sized>(
    canvas: &mut Canvas,
    typo: &T,
    role: FontRole,
    text: &str,
    right_x: i32,
    y: i32,
) {
    let w = typo.text_width(role, text) as i32;
    typo.draw(canvas, role, text, Point::new(right_x - w, y));
}
