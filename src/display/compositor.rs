/*
 *  display/compositor.rs
 *
 *  dayboard - the day at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Lays the day onto the canvas: header, date, tally, weather, agenda, footer
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

use chrono::{Datelike, Locale, NaiveDate};
use embedded_graphics::prelude::Point;
use log::debug;

use crate::constants::{ALL_DAY_PLACEHOLDER, ELLIPSIS};
use crate::display::canvas::Canvas;
use crate::display::layout::LayoutConfig;
use crate::draw::{draw_hline, draw_text_right, draw_vline};
use crate::fonts::{clip_to_width, FontRole, Typography};
use crate::icons::FooterIcon;
use crate::sources::{BirthdayResult, CalendarEvent, WeatherSnapshot};

/// Everything one render pass draws
#[derive(Debug, Clone)]
pub struct DashboardInputs {
    pub today: NaiveDate,
    pub locale: Locale,
    pub events: Vec<CalendarEvent>,
    pub birthdays: BirthdayResult,
    pub icons: Vec<FooterIcon>,
    pub weather: Option<WeatherSnapshot>,
}

impl DashboardInputs {
    /// Nothing but the date
    pub fn empty(today: NaiveDate, locale: Locale) -> Self {
        Self {
            today,
            locale,
            events: Vec::new(),
            birthdays: BirthdayResult::default(),
            icons: Vec::new(),
            weather: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Header,
    Date,
    Tally,
    Weather,
    Agenda,
    Footer,
}

/// Rows `top..bottom` the cursor covered while drawing a region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionSpan {
    pub region: Region,
    pub top: i32,
    pub bottom: i32,
}

impl RegionSpan {
    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderReport {
    pub regions: Vec<RegionSpan>,
    pub agenda_rows: usize,
    pub agenda_dropped: usize,
    pub tally_ticks: u32,
}

impl RenderReport {
    pub fn span(&self, region: Region) -> Option<&RegionSpan> {
        self.regions.iter().find(|s| s.region == region)
    }
}

pub struct Composition {
    pub canvas: Canvas,
    pub report: RenderReport,
}

/// The drawing cursor; only ever moves down
#[derive(Debug, Clone, Copy)]
struct Cursor {
    y: i32,
}

impl Cursor {
    fn advance(&mut self, dy: i32) {
        self.y += dy.max(0);
    }

    /// Jump to a fixed row; never moves back up
    fn seek_to(&mut self, y: i32) {
        self.y = self.y.max(y);
    }
}

fn days_in_month(date: NaiveDate) -> u32 {
    let (y, m) = (date.year(), date.month());
    let next = if m == 12 {
        NaiveDate::from_ymd_opt(y + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(y, m + 1, 1)
    };
    next.and_then(|n| n.pred_opt()).map_or(31, |last| last.day())
}

/// Draw one dashboard.
///
/// Starts from `base` (or blank paper) and draws every region in order,
/// top to bottom. Missing data shrinks its region to nothing; nothing here
/// fails.
pub fn compose<T: Typography + ?Sized>(
    inputs: &DashboardInputs,
    layout: &LayoutConfig,
    typo: &T,
    base: Option<&Canvas>,
) -> Composition {
    let canvas = match base {
        Some(b) => b.clone(),
        None => Canvas::new(layout.width, layout.height),
    };
    let mut pass = Pass {
        canvas,
        layout,
        typo,
        inputs,
        cursor: Cursor { y: 0 },
        report: RenderReport::default(),
    };

    pass.region(Region::Header, Pass::header);
    pass.region(Region::Date, Pass::date);
    pass.region(Region::Tally, Pass::tally);
    pass.region(Region::Weather, Pass::weather);
    pass.region(Region::Agenda, Pass::agenda);
    pass.region(Region::Footer, Pass::footer);

    Composition {
        canvas: pass.canvas,
        report: pass.report,
    }
}

struct Pass<'a, T: Typography + ?Sized> {
    canvas: Canvas,
    layout: &'a LayoutConfig,
    typo: &'a T,
    inputs: &'a DashboardInputs,
    cursor: Cursor,
    report: RenderReport,
}

impl<'a, T: Typography + ?Sized> Pass<'a, T> {
    fn region(&mut self, region: Region, draw: fn(&mut Self)) {
        let top = self.cursor.y;
        draw(self);
        let span = RegionSpan {
            region,
            top: if region == Region::Footer { self.layout.footer.boundary as i32 } else { top },
            bottom: self.cursor.y,
        };
        debug!("{:?} drawn at y {}..{}", region, span.top, span.bottom);
        self.report.regions.push(span);
    }

    fn left(&self) -> i32 {
        self.layout.pad_left as i32
    }

    fn right(&self) -> i32 {
        self.layout.right_edge() as i32
    }

    fn line(&self, role: FontRole) -> i32 {
        self.typo.line_height(role) as i32
    }

    fn rule(&mut self, y: i32) {
        let (left, right) = (self.left(), self.right());
        let _ = draw_hline(&mut self.canvas, left, right, y, self.layout.line_width);
    }

    fn text(&mut self, role: FontRole, text: &str, x: i32) {
        self.typo.draw(&mut self.canvas, role, text, Point::new(x, self.cursor.y));
    }

    fn text_right(&mut self, role: FontRole, text: &str) {
        let right = self.right();
        draw_text_right(&mut self.canvas, self.typo, role, text, right, self.cursor.y);
    }

    /// Rule and upper-case month name
    fn header(&mut self) {
        self.cursor.seek_to(self.layout.header_rule_y as i32);
        self.rule(self.cursor.y);

        let month = self
            .inputs
            .today
            .format_localized("%B", self.inputs.locale)
            .to_string()
            .to_uppercase();
        self.cursor.advance(self.layout.line_width as i32);
        self.text_right(FontRole::Heading, &month);
        self.cursor.advance(self.line(FontRole::Heading));
    }

    /// Big numeral, "d/max" and weekday, closing rule
    fn date(&mut self) {
        let today = self.inputs.today;
        let left = self.left();
        self.text(FontRole::Numeral, &today.day().to_string(), left);
        self.cursor.advance(self.line(FontRole::Numeral));

        self.cursor.advance(self.layout.pad_top as i32);
        let progress = format!("{}/{}", today.day(), days_in_month(today));
        self.text(FontRole::Label, &progress, left);
        let weekday = today
            .format_localized("%A", self.inputs.locale)
            .to_string()
            .to_uppercase();
        self.text_right(FontRole::Label, &weekday);

        self.cursor.advance(self.line(FontRole::Label) + self.layout.pad_top as i32);
        self.rule(self.cursor.y);
    }

    /// One tick per elapsed share of the month
    fn tally(&mut self) {
        let today = self.inputs.today;
        let tally = &self.layout.tally;
        self.cursor.advance(tally.gap as i32);

        let count = self.layout.tally_count(today.day(), days_in_month(today));
        let top = self.cursor.y;
        let bottom = top + tally.tick_height as i32;
        let start = self.layout.pad_left as f32 + self.layout.line_width as f32 / 2.0;
        for i in 0..count {
            let x = (start + i as f32 * tally.pitch).round() as i32;
            let _ = draw_vline(&mut self.canvas, x, top, bottom, self.layout.line_width);
        }
        self.report.tally_ticks = count;
        self.cursor.advance(tally.tick_height as i32);
    }

    /// Right-aligned readings with the icon centred; zero height when absent
    fn weather(&mut self) {
        let inputs = self.inputs;
        let Some(weather) = inputs.weather.as_ref() else {
            return;
        };
        self.cursor.advance(self.layout.agenda.day_gap as i32);

        self.text_right(FontRole::Title, &weather.temperature_line());
        self.cursor.advance(self.line(FontRole::Title));

        if let Some(icon) = &weather.icon {
            let x = self.layout.width as i32 / 2 - icon.width() as i32 / 2;
            self.canvas.paste(icon, Point::new(x, self.cursor.y));
            self.cursor.advance(icon.height() as i32);
        }

        self.text_right(FontRole::Body, &weather.range_line());
        self.cursor.advance(self.line(FontRole::Body));
        self.text_right(FontRole::Body, &weather.condition_line());
        self.cursor.advance(self.line(FontRole::Body));
    }

    /// Events in order, grouped under day headers, cut off above the footer
    fn agenda(&mut self) {
        let inputs = self.inputs;
        let events = &inputs.events;
        if events.is_empty() {
            return;
        }
        self.cursor.advance(self.layout.agenda.top_gap as i32);

        let left = self.left();
        let summary_x = left + self.layout.agenda.summary_offset;
        let summary_width = (self.right() - summary_x).max(0) as u32;
        let header_advance = self.typo.cap_height(FontRole::Label) as i32 * 3 / 2;
        let row_advance = self.typo.cap_height(FontRole::Body) as i32 * 3 / 2;
        let limit = self.layout.footer.boundary as i32 - self.layout.line_width as i32;

        let mut last_day = inputs.today;
        for (i, event) in events.iter().enumerate() {
            let day = event.start.date_naive();
            let new_day = day != last_day;

            let header_block = if new_day {
                self.layout.agenda.day_gap as i32 + header_advance
            } else {
                0
            };
            let bottom = self.cursor.y + header_block + self.line(FontRole::Body);
            if bottom > limit {
                self.report.agenda_dropped = events.len() - i;
                debug!("Agenda full, {} events dropped", self.report.agenda_dropped);
                break;
            }

            if new_day {
                last_day = day;
                self.cursor.advance(self.layout.agenda.day_gap as i32);
                let label = day.format_localized("%a %d", inputs.locale).to_string();
                self.text(FontRole::Label, &label, left);
                self.cursor.advance(header_advance);
            }

            let time = if event.all_day {
                ALL_DAY_PLACEHOLDER.to_string()
            } else {
                event.start.format("%H:%M").to_string()
            };
            self.text(FontRole::Body, &time, left);
            let summary = clip_to_width(self.typo, FontRole::Body, &event.summary, summary_width, ELLIPSIS);
            self.text(FontRole::Body, &summary, summary_x);
            self.cursor.advance(row_advance);
            self.report.agenda_rows += 1;
        }
    }

    /// Rule at the fixed boundary, icon strip, birthday lines
    fn footer(&mut self) {
        let boundary = self.layout.footer.boundary as i32;
        self.cursor.seek_to(boundary);
        self.rule(boundary);
        self.cursor.advance(self.layout.pad_top as i32);

        let inputs = self.inputs;
        let mut x = self.left();
        let mut tallest = 0;
        for icon in &inputs.icons {
            self.canvas.paste(&icon.image, Point::new(x, self.cursor.y));
            x += icon.image.width() as i32 + self.layout.footer.icon_spacing as i32;
            tallest = tallest.max(icon.image.height() as i32);
        }
        self.cursor.advance(tallest + self.layout.pad_top as i32);

        let left = self.left();
        let width = self.layout.available_width();
        let birthdays = &inputs.birthdays;
        if !birthdays.today.is_empty() {
            let line = format!("Birthdays: {}", birthdays.today.join(", "));
            let line = clip_to_width(self.typo, FontRole::Emphasis, &line, width, ELLIPSIS);
            self.text(FontRole::Emphasis, &line, left);
            self.cursor.advance(self.line(FontRole::Emphasis));
        }
        if !birthdays.upcoming.is_empty() {
            let line = format!("Upcoming: {}", birthdays.upcoming_labels().join(", "));
            let line = clip_to_width(self.typo, FontRole::Body, &line, width, ELLIPSIS);
            self.text(FontRole::Body, &line, left);
            self.cursor.advance(self.line(FontRole::Body));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::canvas::Bitmap;
    use crate::fonts::MonoTypography;
    use crate::icons::IconSource;
    use crate::sources::WeatherCondition;
    use chrono::TimeZone;
    use chrono_tz::UTC;
    use embedded_graphics::pixelcolor::BinaryColor;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn layout() -> LayoutConfig {
        LayoutConfig::for_canvas(480, 800)
    }

    fn event(day: u32, hour: u32, summary: &str) -> CalendarEvent {
        let start = UTC.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap();
        CalendarEvent {
            start,
            end: start + chrono::Duration::hours(1),
            all_day: false,
            summary: summary.to_string(),
        }
    }

    fn icon(w: u32, h: u32) -> FooterIcon {
        FooterIcon {
            key: "Cake_icon".into(),
            image: Bitmap::new(w, h, BinaryColor::On),
            source: IconSource::Birthday,
        }
    }

    fn weather() -> WeatherSnapshot {
        WeatherSnapshot {
            temp: 4,
            feels_like: -1,
            temp_min: -2,
            temp_max: 6,
            condition: WeatherCondition::Clouds,
            description: "broken clouds".into(),
            icon_code: "04".into(),
            icon: Some(Bitmap::new(100, 100, BinaryColor::On)),
            rain: 0,
            snow: 0,
            cloud_pct: 75,
        }
    }

    fn inputs() -> DashboardInputs {
        DashboardInputs::empty(today(), Locale::en_US)
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(NaiveDate::from_ymd_opt(2024, 2, 10).unwrap()), 29);
        assert_eq!(days_in_month(NaiveDate::from_ymd_opt(2025, 2, 10).unwrap()), 28);
        assert_eq!(days_in_month(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()), 31);
        assert_eq!(days_in_month(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()), 30);
    }

    #[test]
    fn test_regions_are_in_order_and_monotonic() {
        let mut i = inputs();
        i.events = vec![event(10, 9, "Standup"), event(11, 12, "Lunch")];
        i.weather = Some(weather());
        let c = compose(&i, &layout(), &MonoTypography, None);

        let order: Vec<Region> = c.report.regions.iter().map(|s| s.region).collect();
        assert_eq!(
            order,
            vec![Region::Header, Region::Date, Region::Tally, Region::Weather, Region::Agenda, Region::Footer]
        );
        for pair in c.report.regions.windows(2) {
            assert!(pair[0].bottom <= pair[1].top);
            assert!(pair[0].top <= pair[0].bottom);
        }
        assert_eq!(c.report.agenda_rows, 2);
        assert_eq!(c.report.agenda_dropped, 0);
    }

    #[test]
    fn test_tally_ticks() {
        let c = compose(&inputs(), &layout(), &MonoTypography, None);
        // 455 / 7 = 65 slots, 10 of 31 days
        assert_eq!(c.report.tally_ticks, 20);
        let tally = c.report.span(Region::Tally).unwrap();
        assert!(c.canvas.ink_in_rows(tally.top as u32 + 10, tally.bottom as u32) > 0);
    }

    #[test]
    fn test_agenda_never_crosses_footer() {
        let mut i = inputs();
        i.events = (0..40).map(|n| event(10 + n / 3, 8 + n % 3, "Meeting")).collect();
        let c = compose(&i, &layout(), &MonoTypography, None);

        let agenda = c.report.span(Region::Agenda).unwrap();
        let boundary = layout().footer.boundary as i32;
        assert!(agenda.bottom <= boundary);
        assert!(c.report.agenda_rows > 0);
        assert_eq!(c.report.agenda_rows + c.report.agenda_dropped, 40);
        // no ink between the last row and the footer rule
        assert_eq!(c.canvas.ink_in_rows(agenda.bottom as u32 + 2, boundary as u32 - 1), 0);
    }

    #[test]
    fn test_weather_absence_moves_agenda_up() {
        let mut with = inputs();
        with.events = vec![event(10, 9, "Standup")];
        with.weather = Some(weather());
        let mut without = with.clone();
        without.weather = None;

        let a = compose(&with, &layout(), &MonoTypography, None);
        let b = compose(&without, &layout(), &MonoTypography, None);
        let weather = a.report.span(Region::Weather).unwrap();
        assert!(weather.height() > 0);
        assert_eq!(b.report.span(Region::Weather).unwrap().height(), 0);
        assert_eq!(
            a.report.span(Region::Agenda).unwrap().top - weather.height(),
            b.report.span(Region::Agenda).unwrap().top
        );
    }

    #[test]
    fn test_footer_height_without_birthdays() {
        let mut i = inputs();
        i.icons = vec![icon(40, 30), icon(20, 50)];
        let c = compose(&i, &layout(), &MonoTypography, None);
        let footer = c.report.span(Region::Footer).unwrap();
        let pad = layout().pad_top as i32;
        assert_eq!(footer.top, 680);
        assert_eq!(footer.height(), pad + 50 + pad);
        // nothing printed below the icons
        assert_eq!(c.canvas.ink_in_rows(footer.bottom as u32, 800), 0);
    }

    #[test]
    fn test_birthday_lines_extend_footer() {
        let mut i = inputs();
        i.icons = vec![icon(40, 30)];
        i.birthdays = BirthdayResult {
            today: vec!["Ann".into()],
            upcoming: vec![("Bob".into(), 12)],
        };
        let c = compose(&i, &layout(), &MonoTypography, None);
        let footer = c.report.span(Region::Footer).unwrap();
        let t = MonoTypography;
        let pad = layout().pad_top as i32;
        let lines = (t.line_height(FontRole::Emphasis) + t.line_height(FontRole::Body)) as i32;
        assert_eq!(footer.height(), pad + 30 + pad + lines);
        assert!(c.canvas.ink_in_rows((footer.bottom - lines) as u32, footer.bottom as u32) > 0);
    }

    #[test]
    fn test_icons_laid_out_left_to_right() {
        let mut i = inputs();
        i.icons = vec![icon(40, 30), icon(20, 30)];
        let c = compose(&i, &layout(), &MonoTypography, None);
        let l = layout();
        let y = l.footer.boundary + l.pad_top + 5;
        let first = l.pad_left;
        let second = first + 40 + l.footer.icon_spacing;
        assert_eq!(c.canvas.pixel(first, y), Some(BinaryColor::On));
        assert_eq!(c.canvas.pixel(first + 40, y), Some(BinaryColor::Off));
        assert_eq!(c.canvas.pixel(second, y), Some(BinaryColor::On));
        assert_eq!(c.canvas.pixel(second + 20, y), Some(BinaryColor::Off));
    }

    #[test]
    fn test_composition_is_idempotent() {
        let mut i = inputs();
        i.events = vec![event(10, 9, "Standup"), event(12, 15, "A rather long summary that will not fit the row")];
        i.weather = Some(weather());
        i.icons = vec![icon(30, 30)];
        let a = compose(&i, &layout(), &MonoTypography, None);
        let b = compose(&i, &layout(), &MonoTypography, None);
        assert_eq!(a.canvas, b.canvas);
        assert_eq!(a.report, b.report);
    }

    #[test]
    fn test_base_canvas_is_kept() {
        let mut base = Canvas::new(480, 800);
        base.paste(&Bitmap::new(2, 2, BinaryColor::On), Point::new(478, 798));
        let c = compose(&inputs(), &layout(), &MonoTypography, Some(&base));
        assert_eq!(c.canvas.pixel(479, 799), Some(BinaryColor::On));
    }
}
