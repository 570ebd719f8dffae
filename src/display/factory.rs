/*
 *  display/factory.rs
 *
 *  dayboard - the day at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Picks and opens the display driver named in the configuration
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

use log::info;

use crate::config::{Config, DriverKind};
use crate::display::drivers::headless::HeadlessDriver;
use crate::display::error::DisplayFactoryError;
use crate::display::traits::DisplayDriver;

#[cfg(feature = "driver-epd7in5")]
use crate::display::drivers::epd7in5::Epd7in5Driver;

/// Type alias for boxed display driver trait objects
pub type BoxedDriver = Box<dyn DisplayDriver>;

/// Factory for creating display drivers from configuration
pub struct DisplayDriverFactory;

impl DisplayDriverFactory {
    /// Create the configured driver
    ///
    /// The headless stand-in is always available. The panel driver needs the
    /// `driver-epd7in5` feature and a bus section; opening it claims the SPI
    /// device and exports the GPIO pins but does not wake the panel.
    pub fn create_from_config(config: &Config) -> Result<BoxedDriver, DisplayFactoryError> {
        let (width, height) = config.panel_size();

        match config.driver_kind() {
            DriverKind::Headless => {
                info!("Using headless display {}x{}", width, height);
                Ok(Box::new(HeadlessDriver::new(width, height)))
            }
            DriverKind::Epd7in5 => Self::create_epd7in5(config),
        }
    }

    #[cfg(feature = "driver-epd7in5")]
    fn create_epd7in5(config: &Config) -> Result<BoxedDriver, DisplayFactoryError> {
        let bus = config
            .display
            .as_ref()
            .and_then(|d| d.bus.as_ref())
            .ok_or(DisplayFactoryError::NoBusConfiguration)?;

        let driver = Epd7in5Driver::open(&bus.spi, bus.speed_hz, bus.dc_pin, bus.rst_pin, bus.busy_pin)?;
        Ok(Box::new(driver))
    }

    #[cfg(not(feature = "driver-epd7in5"))]
    fn create_epd7in5(_config: &Config) -> Result<BoxedDriver, DisplayFactoryError> {
        Err(DisplayFactoryError::DriverNotCompiled("driver-epd7in5"))
    }
}
