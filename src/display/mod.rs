/*
 *  display/mod.rs
 *
 *  dayboard - the day at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display subsystem: canvas, layout, compositor, drivers and export
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

// Core trait definitions
pub mod traits;
pub mod error;
pub mod factory;

// Display drivers (the panel driver is feature gated inside)
pub mod drivers;

// Composition surface and geometry
pub mod canvas;
pub mod layout;

// Region drawing
pub mod compositor;

// File and panel output
pub mod sink;

// Re-exports for convenience
pub use traits::{DisplayCapabilities, DisplayDriver};
pub use error::{DisplayError, DisplayFactoryError};
pub use factory::{BoxedDriver, DisplayDriverFactory};
pub use canvas::{Bitmap, Canvas};
pub use layout::LayoutConfig;
pub use compositor::{compose, Composition, DashboardInputs, Region, RegionSpan, RenderReport};
pub use drivers::headless::HeadlessDriver;

#[cfg(feature = "driver-epd7in5")]
pub use drivers::epd7in5::Epd7in5Driver;
