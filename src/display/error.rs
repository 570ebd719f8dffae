/*
 *  display/error.rs
 *
 *  dayboard - the day at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Unified error types for the display subsystem
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

use thiserror::Error;

/// Panel and driver failures
#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("panel init failed: {0}")]
    InitializationFailed(String),

    #[error("spi write failed: {0}")]
    SpiError(String),

    #[error("gpio: {0}")]
    GpioError(String),

    /// busy line still asserted after the refresh deadline
    #[error("panel busy line did not release")]
    BusyTimeout,

    #[error("invalid display configuration: {0}")]
    InvalidConfiguration(String),

    #[error("panel used before init")]
    NotInitialized,

    #[error("frame is {actual} bytes, panel wants {expected}")]
    BufferSizeMismatch { expected: usize, actual: usize },
}

/// Reasons the configured driver could not be built
#[derive(Debug, Error)]
pub enum DisplayFactoryError {
    #[error("epd7in5 needs display.bus (spi, dc_pin, rst_pin, busy_pin)")]
    NoBusConfiguration,

    #[error("driver not compiled in, rebuild with --features {0}")]
    DriverNotCompiled(&'static str),

    #[error("driver init failed: {0}")]
    DriverInitFailed(#[from] DisplayError),
}

impl From<DisplayFactoryError> for DisplayError {
    fn from(err: DisplayFactoryError) -> Self {
        match err {
            DisplayFactoryError::DriverInitFailed(e) => e,
            other => DisplayError::InvalidConfiguration(other.to_string()),
        }
    }
}
