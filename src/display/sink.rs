/*
 *  display/sink.rs
 *
 *  dayboard - the day at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Export the finished canvas: BMP file first, then the panel
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

use std::path::Path;

use log::{debug, info};

use crate::display::canvas::Canvas;
use crate::display::error::DisplayError;
use crate::display::traits::DisplayDriver;
use crate::error::DashboardError;

/// Write the canvas as BMP, exactly as composed
pub fn save(canvas: &Canvas, path: &Path) -> Result<(), DashboardError> {
    info!("Exporting final image to {}", path.display());
    canvas.save_bmp(path).map_err(|source| DashboardError::Export {
        path: path.to_path_buf(),
        source,
    })
}

/// Turn the canvas upside down for panels mounted that way
pub fn maybe_rotate_180(canvas: &mut Canvas, rotate: bool) {
    if rotate {
        debug!("Rotating image 180 degrees");
        canvas.rotate_180();
    }
}

/// Wake the panel, write one frame, put it back to sleep
pub fn send_to_display(canvas: &Canvas, driver: &mut dyn DisplayDriver) -> Result<(), DisplayError> {
    let (w, h) = driver.dimensions();
    let frame = canvas.to_panel_buffer(w, h)?;

    info!("Init display");
    driver.init()?;
    info!("Writing on display");
    driver.display(&frame)?;
    sleep(driver)
}

/// Blank the panel to white
pub fn clear(driver: &mut dyn DisplayDriver) -> Result<(), DisplayError> {
    info!("Init display");
    driver.init()?;
    info!("Clear display");
    driver.clear()?;
    sleep(driver)
}

pub fn sleep(driver: &mut dyn DisplayDriver) -> Result<(), DisplayError> {
    info!("Set display to sleep-mode");
    driver.sleep()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::canvas::Bitmap;
    use crate::display::drivers::headless::HeadlessDriver;
    use embedded_graphics::pixelcolor::BinaryColor;
    use embedded_graphics::prelude::Point;

    fn marked_canvas() -> Canvas {
        let mut canvas = Canvas::new(16, 8);
        canvas.paste(&Bitmap::new(1, 1, BinaryColor::On), Point::new(0, 0));
        canvas
    }

    #[test]
    fn test_double_rotation_is_identity() {
        let original = marked_canvas();
        let mut canvas = original.clone();
        maybe_rotate_180(&mut canvas, true);
        assert_ne!(canvas, original);
        assert_eq!(canvas.pixel(15, 7), Some(BinaryColor::On));
        maybe_rotate_180(&mut canvas, true);
        assert_eq!(canvas, original);
        maybe_rotate_180(&mut canvas, false);
        assert_eq!(canvas, original);
    }

    #[test]
    fn test_send_runs_init_display_sleep() {
        let mut driver = HeadlessDriver::new(8, 16);
        let state = driver.state();
        send_to_display(&marked_canvas(), &mut driver).unwrap();

        let s = state.lock().unwrap();
        assert_eq!((s.init_count, s.frame_count, s.sleep_count), (1, 1, 1));
        assert!(!s.is_initialized);
        assert_eq!(s.last_frame.as_ref().map(Vec::len), Some(16));
    }

    #[test]
    fn test_send_rejects_wrong_geometry() {
        let mut driver = HeadlessDriver::new(10, 10);
        let state = driver.state();
        assert!(send_to_display(&marked_canvas(), &mut driver).is_err());
        assert_eq!(state.lock().unwrap().init_count, 0);
    }

    #[test]
    fn test_display_failure_is_reported() {
        let mut driver = HeadlessDriver::new(16, 8);
        driver.state().lock().unwrap().simulate_display_failure = true;
        assert!(send_to_display(&marked_canvas(), &mut driver).is_err());
    }

    #[test]
    fn test_clear_sequence() {
        let mut driver = HeadlessDriver::new(16, 8);
        let state = driver.state();
        clear(&mut driver).unwrap();
        let s = state.lock().unwrap();
        assert_eq!((s.init_count, s.clear_count, s.sleep_count, s.frame_count), (1, 1, 1, 0));
    }

    #[test]
    fn test_save_writes_bmp() {
        let path = std::env::temp_dir().join(format!("dayboard-sink-{}.bmp", std::process::id()));
        save(&marked_canvas(), &path).unwrap();
        let img = image::open(&path).unwrap().to_luma8();
        assert_eq!(img.dimensions(), (16, 8));
        assert_eq!(img.get_pixel(0, 0).0, [0]);
        assert_eq!(img.get_pixel(1, 0).0, [255]);
        let _ = std::fs::remove_file(&path);
    }
}
