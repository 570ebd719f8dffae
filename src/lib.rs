/*
 *  lib.rs
 *
 *  dayboard - the day at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Daily agenda, birthdays, holidays and weather for a 7.5in e-paper panel
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

pub mod assets;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod display;
pub mod draw;
pub mod error;
pub mod fonts;
pub mod icons;
pub mod sources;
pub mod svgimage;
pub mod vframebuf;

pub use dashboard::Dashboard;
pub use error::{AssetError, DashboardError};
