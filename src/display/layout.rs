/*
 *  display/layout.rs
 *
 *  dayboard - the day at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Canvas geometry: margins, rules and region metrics derived from size
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

use crate::constants::{FOOTER_FRACTION, LINE_WIDTH, SUMMARY_OFFSET};

/// Layout configuration for the dashboard canvas
///
/// Every value is a fixed ratio of the canvas size, computed once and never
/// adjusted for content.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    /// Canvas width in pixels
    pub width: u32,

    /// Canvas height in pixels
    pub height: u32,

    /// Left margin (width / 50)
    pub pad_left: u32,

    /// Right margin (width / 30)
    pub pad_right: u32,

    /// Top padding, also the general vertical spacer (height / 30)
    pub pad_top: u32,

    /// Stroke width of rules and ticks
    pub line_width: u32,

    /// Header rule position (0.75 x pad_top)
    pub header_rule_y: u32,

    /// Tally layout
    pub tally: TallyLayout,

    /// Agenda layout
    pub agenda: AgendaLayout,

    /// Footer layout
    pub footer: FooterLayout,
}

/// Month progress tick row
#[derive(Debug, Clone, PartialEq)]
pub struct TallyLayout {
    /// Gap between the date rule and the ticks
    pub gap: u32,

    /// Tick length (height / 50)
    pub tick_height: u32,

    /// Distance between tick starts (line width + width / 120)
    pub pitch: f32,
}

/// Agenda rows
#[derive(Debug, Clone, PartialEq)]
pub struct AgendaLayout {
    /// Space above the first row (height / 50)
    pub top_gap: u32,

    /// Space above each date header (height / 80)
    pub day_gap: u32,

    /// Summary column offset from the time column
    pub summary_offset: i32,
}

/// Footer strip
#[derive(Debug, Clone, PartialEq)]
pub struct FooterLayout {
    /// Footer rule y; agenda rows never cross it
    pub boundary: u32,

    /// Horizontal space between icons
    pub icon_spacing: u32,
}

impl LayoutConfig {
    /// Derive the layout for a canvas of the given size
    pub fn for_canvas(width: u32, height: u32) -> Self {
        let pad_top = height / 30;
        Self {
            width,
            height,
            pad_left: width / 50,
            pad_right: width / 30,
            pad_top,
            line_width: LINE_WIDTH,
            header_rule_y: pad_top * 3 / 4,
            tally: TallyLayout {
                gap: 10,
                tick_height: height / 50,
                pitch: LINE_WIDTH as f32 + width as f32 / 120.0,
            },
            agenda: AgendaLayout {
                top_gap: height / 50,
                day_gap: height / 80,
                summary_offset: SUMMARY_OFFSET,
            },
            footer: FooterLayout {
                boundary: (height as f32 * FOOTER_FRACTION) as u32,
                icon_spacing: pad_top,
            },
        }
    }

    /// x of the right margin
    pub fn right_edge(&self) -> u32 {
        self.width - self.pad_right
    }

    /// Width between the margins
    pub fn available_width(&self) -> u32 {
        self.width - self.pad_left - self.pad_right
    }

    /// Ticks for `day` of a `days_in_month` month
    pub fn tally_count(&self, day: u32, days_in_month: u32) -> u32 {
        if days_in_month == 0 {
            return 0;
        }
        let slots = self.available_width() as f32 / self.tally.pitch;
        (slots * day as f32 / days_in_month as f32).floor() as u32
    }
}
