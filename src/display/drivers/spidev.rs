/*
 *  display/drivers/spidev.rs
 *
 *  st7735-tft - TFT console over a command/data bus
 *  (c) 2020-26 Stuart Hunter
 *
 *  Linux spidev transport and sysfs control lines
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

use embedded_hal::digital::{ErrorType, OutputPin};
use embedded_hal::spi::SpiBus;
use linux_embedded_hal::spidev::{SpiModeFlags, SpidevOptions};
use linux_embedded_hal::sysfs_gpio::Direction;
use linux_embedded_hal::{SPIError, SpidevBus, SysfsPin};
use log::{debug, info};

use crate::display::error::DisplayError;
use crate::display::protocol::BusClocks;
use crate::display::session::{Pins, St7735};
use crate::display::traits::{DisplayGeometry, PinDirection, SerialBus};

/// Wiring of a panel on a spidev bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpiWiring {
    /// e.g. /dev/spidev0.0
    pub bus: String,
    pub dc_pin: u64,
    pub rst_pin: u64,
    /// None when the kernel drives chip-select
    pub cs_pin: Option<u64>,
}

/// A panel on real hardware
pub type HardwarePanel = St7735<SpidevTransport, ChipSelect, SysfsPin, SysfsPin>;

/// Clock and wiring mode the spidev device is configured for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SpiSettings {
    speed_hz: u32,
    three_wire: bool,
}

impl SpiSettings {
    fn options(self) -> SpidevOptions {
        let mut mode = SpiModeFlags::SPI_MODE_0;
        if self.three_wire {
            mode |= SpiModeFlags::SPI_3WIRE;
        }
        SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(self.speed_hz)
            .mode(mode)
            .build()
    }

    /// Apply `next` when it differs; `self` only changes once `apply` succeeds
    fn switch<E, F>(&mut self, next: SpiSettings, apply: F) -> Result<(), E>
    where
        F: FnOnce(&SpidevOptions) -> Result<(), E>,
    {
        if *self != next {
            apply(&next.options())?;
            *self = next;
        }
        Ok(())
    }
}

/// spidev bus with switchable clock and 3-wire turnaround
pub struct SpidevTransport {
    spi: SpidevBus,
    settings: SpiSettings,
}

impl SpidevTransport {
    pub fn open(path: &str, speed_hz: u32) -> Result<Self, DisplayError> {
        let mut spi = SpidevBus::open(path).map_err(DisplayError::bus)?;
        let settings = SpiSettings { speed_hz, three_wire: false };
        spi.configure(&settings.options()).map_err(DisplayError::bus)?;
        info!("opened {} at {} Hz", path, speed_hz);
        Ok(Self { spi, settings })
    }

    fn reconfigure(&mut self, next: SpiSettings) -> Result<(), SPIError> {
        let spi = &mut self.spi;
        self.settings.switch(next, |options| {
            spi.configure(options)?;
            Ok(())
        })
    }
}

impl SerialBus for SpidevTransport {
    type Error = SPIError;

    fn write_byte(&mut self, byte: u8) -> Result<(), SPIError> {
        self.spi.write(&[byte])
    }

    fn write_buffer(&mut self, bytes: &[u8]) -> Result<(), SPIError> {
        self.spi.write(bytes)
    }

    fn read_byte(&mut self) -> Result<u8, SPIError> {
        let mut buf = [0u8; 1];
        self.spi.read(&mut buf)?;
        Ok(buf[0])
    }

    fn read_dword(&mut self) -> Result<u32, SPIError> {
        let mut buf = [0u8; 4];
        self.spi.read(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    fn set_clock_rate(&mut self, hz: u32) -> Result<(), SPIError> {
        if hz != self.settings.speed_hz {
            debug!("spi clock {} -> {} Hz", self.settings.speed_hz, hz);
        }
        self.reconfigure(SpiSettings { speed_hz: hz, ..self.settings })
    }

    fn set_data_direction(&mut self, direction: PinDirection) -> Result<(), SPIError> {
        let three_wire = direction == PinDirection::Input;
        self.reconfigure(SpiSettings { three_wire, ..self.settings })
    }
}

/// Chip-select on a GPIO, or left to the spidev driver
pub enum ChipSelect {
    Gpio(SysfsPin),
    Kernel,
}

impl ErrorType for ChipSelect {
    type Error = <SysfsPin as ErrorType>::Error;
}

impl OutputPin for ChipSelect {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        match self {
            ChipSelect::Gpio(pin) => pin.set_low(),
            ChipSelect::Kernel => Ok(()),
        }
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        match self {
            ChipSelect::Gpio(pin) => pin.set_high(),
            ChipSelect::Kernel => Ok(()),
        }
    }
}

fn output_pin(line: &str, number: u64) -> Result<SysfsPin, DisplayError> {
    let pin = SysfsPin::new(number);
    pin.export().map_err(|e| DisplayError::pin(line, e))?;
    pin.set_direction(Direction::High).map_err(|e| DisplayError::pin(line, e))?;
    debug!("{} on gpio{}", line, number);
    Ok(pin)
}

/// Open bus and lines and build an uninitialized session
pub fn open_panel(
    wiring: &SpiWiring,
    geometry: DisplayGeometry,
    clocks: BusClocks,
) -> Result<HardwarePanel, DisplayError> {
    let bus = SpidevTransport::open(&wiring.bus, clocks.write_hz)?;
    let cs = match wiring.cs_pin {
        Some(n) => ChipSelect::Gpio(output_pin("CS", n)?),
        None => ChipSelect::Kernel,
    };
    let dc = output_pin("D/C", wiring.dc_pin)?;
    let rst = output_pin("RST", wiring.rst_pin)?;

    Ok(St7735::new(bus, Pins { cs, dc, rst }, geometry, clocks))
}

#[cfg(test)]
mod tests {
    use super::*;

    const WRITE: SpiSettings = SpiSettings { speed_hz: 15_000_000, three_wire: false };

    #[test]
    fn test_failed_switch_keeps_settings() {
        let mut settings = WRITE;
        let turned = SpiSettings { three_wire: true, ..WRITE };
        assert_eq!(settings.switch(turned, |_| Err("busy")), Err("busy"));
        assert_eq!(settings, WRITE);

        assert_eq!(settings.switch(turned, |_| Ok::<(), &str>(())), Ok(()));
        assert_eq!(settings, turned);
    }

    #[test]
    fn test_unchanged_settings_skip_reconfigure() {
        let mut settings = WRITE;
        let mut calls = 0;
        settings
            .switch(WRITE, |_| {
                calls += 1;
                Ok::<(), ()>(())
            })
            .unwrap();
        assert_eq!(calls, 0);
    }
}
