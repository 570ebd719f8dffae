/*
 *  display/traits.rs
 *
 *  dayboard - the day at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Core trait definitions for display driver abstraction
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

use crate::display::error::DisplayError;

/// Display capabilities and metadata
#[derive(Debug, Clone)]
pub struct DisplayCapabilities {
    /// Short driver name for logs
    pub name: &'static str,

    /// Native panel width in pixels
    pub width: u32,

    /// Native panel height in pixels
    pub height: u32,

    /// False for the headless stand-in
    pub physical: bool,
}

impl DisplayCapabilities {
    /// Size of one full 1bpp frame in bytes (rows padded to whole bytes)
    pub fn frame_len(&self) -> usize {
        (self.width as usize).div_ceil(8) * self.height as usize
    }
}

/// Minimal hardware abstraction - every panel driver implements this
///
/// The capability set is deliberately small: an e-paper panel is woken,
/// given one full frame, and put back to sleep once per render pass.
pub trait DisplayDriver: Send {
    /// Returns the capabilities of this display
    fn capabilities(&self) -> &DisplayCapabilities;

    /// Returns the native panel dimensions as (width, height)
    fn dimensions(&self) -> (u32, u32) {
        let caps = self.capabilities();
        (caps.width, caps.height)
    }

    /// Wake the controller and run its power-on sequence
    fn init(&mut self) -> Result<(), DisplayError>;

    /// Blank the panel to white
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Write one full frame and refresh
    ///
    /// Buffer layout is 1 bit per pixel, MSB first, rows padded to whole
    /// bytes, bit set = white. See `Canvas::to_panel_buffer`.
    fn display(&mut self, buffer: &[u8]) -> Result<(), DisplayError>;

    /// Enter deep sleep; `init` is required before the next frame
    fn sleep(&mut self) -> Result<(), DisplayError>;

    /// Check a frame against the panel geometry
    fn check_frame(&self, buffer: &[u8]) -> Result<(), DisplayError> {
        let expected = self.capabilities().frame_len();
        if buffer.len() != expected {
            return Err(DisplayError::BufferSizeMismatch {
                expected,
                actual: buffer.len(),
            });
        }
        Ok(())
    }
}
