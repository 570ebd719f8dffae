/*
 *  dashboard.rs
 *
 *  dayboard - the day at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  One render pass: gather sources, compose, export, display
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

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::{debug, error, info};

use crate::assets::{load_base_image, DirIconStore, Fit};
use crate::config::{Config, FontKind};
use crate::constants::{CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::display::canvas::Canvas;
use crate::display::compositor::{compose, Composition, DashboardInputs, RenderReport};
use crate::display::layout::LayoutConfig;
use crate::display::sink;
use crate::display::traits::DisplayDriver;
use crate::error::DashboardError;
use crate::fonts::{MonoTypography, TrueTypography, Typography};
use crate::icons::select_icons;
use crate::sources::{http_client, BirthdayBackend, CalendarClient, HolidayClient, WeatherClient};

/// Assets and settings for rendering; built once, fatal if assets are bad
pub struct Dashboard {
    config: Config,
    layout: LayoutConfig,
    typography: Box<dyn Typography>,
    base: Option<Canvas>,
    icons: DirIconStore,
}

impl Dashboard {
    pub fn new(config: Config) -> Result<Self, DashboardError> {
        let layout = LayoutConfig::for_canvas(CANVAS_WIDTH, CANVAS_HEIGHT);

        let fonts = config.fonts.clone().unwrap_or_default();
        let typography: Box<dyn Typography> = match fonts.kind.unwrap_or_default() {
            FontKind::Builtin => {
                debug!("Using built-in fonts");
                Box::new(MonoTypography)
            }
            FontKind::Truetype => Box::new(TrueTypography::load(&fonts)?),
        };

        let base = match config.base_image() {
            Some(path) => Some(load_base_image(path, layout.width, layout.height)?),
            None => None,
        };
        let icons = DirIconStore::new(config.pictures_dir(), Fit::Within(config.icon_size()));

        Ok(Self {
            config,
            layout,
            typography,
            base,
            icons,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Query every source, one after another. Never fails: a source that
    /// errors contributes nothing.
    pub async fn gather(&self, now: DateTime<Tz>) -> DashboardInputs {
        let today = now.date_naive();
        let mut inputs = DashboardInputs::empty(today, self.config.locale());

        let client = match http_client(self.config.http_timeout()) {
            Ok(c) => c,
            Err(e) => {
                error!("Cannot build HTTP client: {}", e);
                inputs.icons = select_icons(today, None, false, &self.icons);
                return inputs;
            }
        };

        let calendar = CalendarClient::new(
            client.clone(),
            self.config.calendars().to_vec(),
            self.config.timezone(),
            self.config.lookahead_days(),
        );
        inputs.events = calendar.normalize_events(now, self.config.max_events()).await;

        let contacts = BirthdayBackend::from_config(&self.config, &client);
        inputs.birthdays = contacts.get_birthdays(today).await;

        let holiday = HolidayClient::from_config(&self.config, &client)
            .get_todays_holiday_name(today)
            .await;

        inputs.weather = match WeatherClient::from_config(&self.config, &client) {
            Some(weather) => weather.get_weather().await,
            None => None,
        };

        inputs.icons = select_icons(today, holiday.as_deref(), inputs.birthdays.has_today(), &self.icons);
        inputs
    }

    pub fn render(&self, inputs: &DashboardInputs) -> Composition {
        compose(inputs, &self.layout, self.typography.as_ref(), self.base.as_ref())
    }

    /// The whole pass: the BMP is written before the panel is touched
    pub async fn run(&self, driver: &mut dyn DisplayDriver) -> Result<RenderReport, DashboardError> {
        let now = Utc::now().with_timezone(&self.config.timezone());
        info!("Render pass for {}", now.format("%Y-%m-%d %H:%M %Z"));

        let inputs = self.gather(now).await;
        let Composition { mut canvas, report } = self.render(&inputs);
        info!(
            "Composed: {} agenda rows ({} dropped), {} footer icons",
            report.agenda_rows,
            report.agenda_dropped,
            inputs.icons.len()
        );

        sink::save(&canvas, &self.config.export_path())?;
        sink::maybe_rotate_180(&mut canvas, self.config.rotate_image());
        sink::send_to_display(&canvas, driver)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::compositor::Region;
    use chrono::NaiveDate;

    #[test]
    fn test_default_config_renders_with_builtin_fonts() {
        let dashboard = Dashboard::new(Config::default()).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let inputs = DashboardInputs::empty(today, dashboard.config().locale());

        let c = dashboard.render(&inputs);
        assert_eq!((c.canvas.width(), c.canvas.height()), (CANVAS_WIDTH, CANVAS_HEIGHT));
        assert!(c.report.span(Region::Header).is_some());
        assert_eq!(c.report.agenda_rows, 0);
    }
}
