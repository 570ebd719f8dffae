/*
 *  display/drivers/epd7in5.rs
 *
 *  dayboard - the day at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Waveshare 7.5" V2 (800x480, black/white) e-paper driver over spidev
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

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiDevice;
use linux_embedded_hal::spidev::{SpiModeFlags, SpidevOptions};
use linux_embedded_hal::sysfs_gpio::Direction;
use linux_embedded_hal::{Delay, SpidevDevice, SysfsPin};
use log::{debug, info};

use crate::display::error::DisplayError;
use crate::display::traits::{DisplayCapabilities, DisplayDriver};

pub const EPD_WIDTH: u32 = 800;
pub const EPD_HEIGHT: u32 = 480;

/// spidev rejects single transfers above its buffer size (4096 by default)
const SPI_CHUNK: usize = 4096;
const DEFAULT_SPI_HZ: u32 = 4_000_000;
/// Full refresh takes ~4s; anything past this is a wiring fault
const BUSY_TIMEOUT_MS: u32 = 30_000;
const BUSY_POLL_MS: u32 = 20;

mod cmd {
    pub const PANEL_SETTING: u8 = 0x00;
    pub const POWER_SETTING: u8 = 0x01;
    pub const POWER_OFF: u8 = 0x02;
    pub const POWER_ON: u8 = 0x04;
    pub const BOOSTER_SOFT_START: u8 = 0x06;
    pub const DEEP_SLEEP: u8 = 0x07;
    pub const DATA_START_OLD: u8 = 0x10;
    pub const DISPLAY_REFRESH: u8 = 0x12;
    pub const DATA_START_NEW: u8 = 0x13;
    pub const DUAL_SPI: u8 = 0x15;
    pub const VCOM_DATA_INTERVAL: u8 = 0x50;
    pub const TCON_SETTING: u8 = 0x60;
    pub const RESOLUTION: u8 = 0x61;
    pub const GET_STATUS: u8 = 0x71;
}

/// Panel driver generic over embedded-hal 1.0 bus, pins and delay
pub struct Epd7in5<SPI, BUSY, DC, RST, DELAY> {
    spi: SPI,
    busy: BUSY,
    dc: DC,
    rst: RST,
    delay: DELAY,
    capabilities: DisplayCapabilities,
    awake: bool,
}

/// The concrete Linux (Raspberry Pi HAT) flavour
pub type Epd7in5Driver = Epd7in5<SpidevDevice, SysfsPin, SysfsPin, SysfsPin, Delay>;

fn spi_err<E: core::fmt::Debug>(e: E) -> DisplayError {
    DisplayError::SpiError(format!("{:?}", e))
}

fn gpio_err<E: core::fmt::Debug>(e: E) -> DisplayError {
    DisplayError::GpioError(format!("{:?}", e))
}

impl Epd7in5Driver {
    /// Open the panel on a spidev node with BCM-numbered control pins
    ///
    /// # Arguments
    ///
    /// * `spi_bus_path` - Path to SPI device (e.g., "/dev/spidev0.0")
    /// * `dc_pin` - Data/Command GPIO pin number
    /// * `rst_pin` - Reset GPIO pin number
    /// * `busy_pin` - Busy GPIO pin number (input, low while busy)
    pub fn open(
        spi_bus_path: &str,
        speed_hz: Option<u32>,
        dc_pin: u64,
        rst_pin: u64,
        busy_pin: u64,
    ) -> Result<Self, DisplayError> {
        info!(
            "Opening EPD 7in5 V2 on {} (DC {}, RST {}, BUSY {})",
            spi_bus_path, dc_pin, rst_pin, busy_pin
        );

        let mut spi = SpidevDevice::open(spi_bus_path)
            .map_err(|e| DisplayError::InitializationFailed(format!("{}: {:?}", spi_bus_path, e)))?;
        let options = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(speed_hz.unwrap_or(DEFAULT_SPI_HZ))
            .mode(SpiModeFlags::SPI_MODE_0)
            .build();
        spi.configure(&options).map_err(spi_err)?;

        let dc = output_pin(dc_pin)?;
        let rst = output_pin(rst_pin)?;
        let busy = SysfsPin::new(busy_pin);
        busy.export().map_err(gpio_err)?;
        busy.set_direction(Direction::In).map_err(gpio_err)?;

        Ok(Epd7in5::new(spi, busy, dc, rst, Delay))
    }
}

fn output_pin(number: u64) -> Result<SysfsPin, DisplayError> {
    let pin = SysfsPin::new(number);
    pin.export().map_err(gpio_err)?;
    pin.set_direction(Direction::Out).map_err(gpio_err)?;
    Ok(pin)
}

impl<SPI, BUSY, DC, RST, DELAY> Epd7in5<SPI, BUSY, DC, RST, DELAY>
where
    SPI: SpiDevice,
    BUSY: InputPin,
    DC: OutputPin,
    RST: OutputPin,
    DELAY: DelayNs,
{
    pub fn new(spi: SPI, busy: BUSY, dc: DC, rst: RST, delay: DELAY) -> Self {
        Self {
            spi,
            busy,
            dc,
            rst,
            delay,
            capabilities: DisplayCapabilities {
                name: "epd7in5_v2",
                width: EPD_WIDTH,
                height: EPD_HEIGHT,
                physical: true,
            },
            awake: false,
        }
    }

    fn reset(&mut self) -> Result<(), DisplayError> {
        self.rst.set_high().map_err(gpio_err)?;
        self.delay.delay_ms(20);
        self.rst.set_low().map_err(gpio_err)?;
        self.delay.delay_ms(2);
        self.rst.set_high().map_err(gpio_err)?;
        self.delay.delay_ms(20);
        Ok(())
    }

    fn command(&mut self, command: u8) -> Result<(), DisplayError> {
        self.dc.set_low().map_err(gpio_err)?;
        self.spi.write(&[command]).map_err(spi_err)
    }

    fn data(&mut self, data: &[u8]) -> Result<(), DisplayError> {
        self.dc.set_high().map_err(gpio_err)?;
        for chunk in data.chunks(SPI_CHUNK) {
            self.spi.write(chunk).map_err(spi_err)?;
        }
        Ok(())
    }

    fn command_with(&mut self, command: u8, data: &[u8]) -> Result<(), DisplayError> {
        self.command(command)?;
        self.data(data)
    }

    /// BUSY reads low while the controller works; poll via GET_STATUS
    fn wait_until_idle(&mut self) -> Result<(), DisplayError> {
        let mut waited = 0;
        loop {
            self.command(cmd::GET_STATUS)?;
            if self.busy.is_high().map_err(gpio_err)? {
                return Ok(());
            }
            if waited >= BUSY_TIMEOUT_MS {
                return Err(DisplayError::BusyTimeout);
            }
            self.delay.delay_ms(BUSY_POLL_MS);
            waited += BUSY_POLL_MS;
        }
    }

    fn refresh(&mut self) -> Result<(), DisplayError> {
        self.command(cmd::DISPLAY_REFRESH)?;
        self.delay.delay_ms(100);
        self.wait_until_idle()
    }

    fn ensure_awake(&self) -> Result<(), DisplayError> {
        if self.awake { Ok(()) } else { Err(DisplayError::NotInitialized) }
    }
}

impl<SPI, BUSY, DC, RST, DELAY> DisplayDriver for Epd7in5<SPI, BUSY, DC, RST, DELAY>
where
    SPI: SpiDevice + Send,
    BUSY: InputPin + Send,
    DC: OutputPin + Send,
    RST: OutputPin + Send,
    DELAY: DelayNs + Send,
{
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        self.reset()?;
        self.command_with(cmd::BOOSTER_SOFT_START, &[0x17, 0x17, 0x28, 0x17])?;
        self.command_with(cmd::POWER_SETTING, &[0x07, 0x07, 0x28, 0x17])?;
        self.command(cmd::POWER_ON)?;
        self.delay.delay_ms(100);
        self.wait_until_idle()?;
        // KW mode, LUT from OTP
        self.command_with(cmd::PANEL_SETTING, &[0x1F])?;
        // 800 x 480
        self.command_with(cmd::RESOLUTION, &[0x03, 0x20, 0x01, 0xE0])?;
        self.command_with(cmd::DUAL_SPI, &[0x00])?;
        self.command_with(cmd::VCOM_DATA_INTERVAL, &[0x10, 0x07])?;
        self.command_with(cmd::TCON_SETTING, &[0x22])?;
        self.awake = true;
        debug!("EPD 7in5 V2 initialised");
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.ensure_awake()?;
        let len = self.capabilities.frame_len();
        self.command_with(cmd::DATA_START_OLD, &vec![0xFF; len])?;
        self.command_with(cmd::DATA_START_NEW, &vec![0x00; len])?;
        self.refresh()
    }

    fn display(&mut self, buffer: &[u8]) -> Result<(), DisplayError> {
        self.check_frame(buffer)?;
        self.ensure_awake()?;
        // NEW register wants ink bits set, the frame carries paper bits set
        let inverted: Vec<u8> = buffer.iter().map(|b| !b).collect();
        self.command_with(cmd::DATA_START_OLD, buffer)?;
        self.command_with(cmd::DATA_START_NEW, &inverted)?;
        self.refresh()
    }

    fn sleep(&mut self) -> Result<(), DisplayError> {
        self.command_with(cmd::VCOM_DATA_INTERVAL, &[0xF7])?;
        self.command(cmd::POWER_OFF)?;
        self.wait_until_idle()?;
        self.command_with(cmd::DEEP_SLEEP, &[0xA5])?;
        self.delay.delay_ms(2000);
        self.awake = false;
        Ok(())
    }
}
