/*
 *  display/drivers/headless.rs
 *
 *  dayboard - the day at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Headless stand-in used when no panel is attached
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

use log::{debug, info};

use crate::display::error::DisplayError;
use crate::display::traits::{DisplayCapabilities, DisplayDriver};

use std::sync::{Arc, Mutex, MutexGuard};

/// Headless display driver
///
/// Accepts every call without touching hardware. The rendered image is still
/// exported to disk by the sink, so this is what runs on a desktop, in CI and
/// in tests. Every operation is recorded for inspection.
#[derive(Debug, Clone)]
pub struct HeadlessDriver {
    /// Display capabilities
    capabilities: DisplayCapabilities,

    /// Shared state for testing
    state: Arc<Mutex<HeadlessState>>,
}

/// Recorded calls (shared so tests can keep a handle after boxing the driver)
#[derive(Debug, Default)]
pub struct HeadlessState {
    /// Number of times init() was called
    pub init_count: usize,

    /// Number of times clear() was called
    pub clear_count: usize,

    /// Number of times sleep() was called
    pub sleep_count: usize,

    /// Number of frames accepted by display()
    pub frame_count: usize,

    /// Whether the driver is awake
    pub is_initialized: bool,

    /// Last frame written
    pub last_frame: Option<Vec<u8>>,

    /// Simulate failures (for error testing)
    pub simulate_display_failure: bool,
    pub simulate_init_failure: bool,
}

impl HeadlessDriver {
    /// Create a stand-in for a panel of the given native size
    pub fn new(width: u32, height: u32) -> Self {
        let capabilities = DisplayCapabilities {
            name: "headless",
            width,
            height,
            physical: false,
        };
        debug!("Headless display {}x{}", width, height);

        Self {
            capabilities,
            state: Arc::new(Mutex::new(HeadlessState::default())),
        }
    }

    /// Get reference to state for inspection in tests
    pub fn state(&self) -> Arc<Mutex<HeadlessState>> {
        Arc::clone(&self.state)
    }

    fn lock(&self) -> MutexGuard<'_, HeadlessState> {
        // a panicking test thread must not wedge the others
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DisplayDriver for HeadlessDriver {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        let mut state = self.lock();

        if state.simulate_init_failure {
            return Err(DisplayError::InitializationFailed("Simulated init failure".to_string()));
        }

        state.init_count += 1;
        state.is_initialized = true;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        let mut state = self.lock();
        if !state.is_initialized {
            return Err(DisplayError::NotInitialized);
        }
        state.clear_count += 1;
        state.last_frame = None;
        info!("Headless display cleared");
        Ok(())
    }

    fn display(&mut self, buffer: &[u8]) -> Result<(), DisplayError> {
        self.check_frame(buffer)?;

        let mut state = self.lock();
        if !state.is_initialized {
            return Err(DisplayError::NotInitialized);
        }
        if state.simulate_display_failure {
            return Err(DisplayError::SpiError("Simulated display failure".to_string()));
        }

        state.frame_count += 1;
        state.last_frame = Some(buffer.to_vec());
        info!("Headless display accepted {} byte frame", buffer.len());
        Ok(())
    }

    fn sleep(&mut self) -> Result<(), DisplayError> {
        let mut state = self.lock();
        state.sleep_count += 1;
        state.is_initialized = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_driver_creation() {
        let driver = HeadlessDriver::new(800, 480);
        assert_eq!(driver.capabilities().width, 800);
        assert_eq!(driver.capabilities().height, 480);
        assert!(!driver.capabilities().physical);
        assert_eq!(driver.capabilities().frame_len(), 48_000);
    }

    #[test]
    fn test_headless_driver_init() {
        let mut driver = HeadlessDriver::new(800, 480);

        let state = driver.state();
        assert_eq!(state.lock().unwrap().init_count, 0);
        assert!(!state.lock().unwrap().is_initialized);

        driver.init().unwrap();

        assert_eq!(state.lock().unwrap().init_count, 1);
        assert!(state.lock().unwrap().is_initialized);
    }

    #[test]
    fn test_headless_display_requires_init() {
        let mut driver = HeadlessDriver::new(16, 2);
        let frame = vec![0xFF; 4];
        assert!(matches!(driver.display(&frame), Err(DisplayError::NotInitialized)));

        driver.init().unwrap();
        driver.display(&frame).unwrap();
        assert_eq!(driver.state().lock().unwrap().frame_count, 1);
        assert_eq!(driver.state().lock().unwrap().last_frame.as_deref(), Some(&frame[..]));
    }

    #[test]
    fn test_headless_sleep_requires_reinit() {
        let mut driver = HeadlessDriver::new(16, 2);
        driver.init().unwrap();
        driver.sleep().unwrap();
        assert!(driver.display(&[0u8; 4]).is_err());
        assert_eq!(driver.state().lock().unwrap().sleep_count, 1);
    }

    #[test]
    fn test_headless_simulated_failure() {
        let mut driver = HeadlessDriver::new(16, 2);
        driver.init().unwrap();

        driver.state().lock().unwrap().simulate_display_failure = true;
        assert!(driver.display(&[0u8; 4]).is_err());

        driver.state().lock().unwrap().simulate_display_failure = false;
        assert!(driver.display(&[0u8; 4]).is_ok());
    }

    #[test]
    fn test_headless_buffer_size_mismatch() {
        let mut driver = HeadlessDriver::new(800, 480);
        driver.init().unwrap();

        let buffer = vec![0xFF; 512];

        assert!(matches!(
            driver.display(&buffer),
            Err(DisplayError::BufferSizeMismatch { expected: 48_000, actual: 512 })
        ));
    }
}
