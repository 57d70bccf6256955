/*
 *  display/protocol.rs
 *
 *  st7735-tft - TFT console over a command/data bus
 *  (c) 2020-26 Stuart Hunter
 *
 *  Command/data transactions, address windows and the advisory read path
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

use embedded_hal::digital::OutputPin;
use log::{trace, warn};

use crate::display::command::Command;
use crate::display::error::DisplayError;
use crate::display::traits::{DisplayGeometry, PinDirection, SerialBus};

/// Pixels per bus write when streaming a solid run
const RUN_CHUNK: usize = 32;

/// Max write clock: 66 ns serial cycle
pub const DEFAULT_WRITE_HZ: u32 = 15_000_000;

/// Max read clock: 150 ns serial cycle
pub const DEFAULT_READ_HZ: u32 = 6_000_000;

/// Rectangle that subsequent pixel writes fill in row-major order
///
/// Windows produced by [`AddressWindow::clipped`] are never empty and always
/// lie inside the geometry they were clipped against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressWindow {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl AddressWindow {
    /// Intersect `x, y, w, h` with the visible area
    ///
    /// Returns `None` for empty or fully off-screen rectangles. Negative sizes
    /// are treated as empty; callers normalise direction first.
    pub fn clipped(x: i32, y: i32, w: i32, h: i32, geometry: DisplayGeometry) -> Option<Self> {
        Self::clipped_wide(i64::from(x), i64::from(y), i64::from(w), i64::from(h), geometry)
    }

    /// [`Self::clipped`] for extents that do not fit an `i32`
    pub fn clipped_wide(x: i64, y: i64, w: i64, h: i64, geometry: DisplayGeometry) -> Option<Self> {
        if w <= 0 || h <= 0 {
            return None;
        }
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(w).min(i64::from(geometry.width));
        let y1 = y.saturating_add(h).min(i64::from(geometry.height));
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Self {
            x: x0 as u16,
            y: y0 as u16,
            width: (x1 - x0) as u16,
            height: (y1 - y0) as u16,
        })
    }

    /// The whole panel
    pub fn full(geometry: DisplayGeometry) -> Self {
        Self { x: 0, y: 0, width: geometry.width, height: geometry.height }
    }

    /// Inclusive last column
    pub fn x_end(&self) -> u16 {
        self.x + self.width - 1
    }

    /// Inclusive last row
    pub fn y_end(&self) -> u16 {
        self.y + self.height - 1
    }

    pub fn pixel_count(&self) -> u32 {
        u32::from(self.width) * u32::from(self.height)
    }
}

/// Bus clock rates for the write and read directions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusClocks {
    pub write_hz: u32,
    pub read_hz: u32,
}

impl Default for BusClocks {
    fn default() -> Self {
        Self { write_hz: DEFAULT_WRITE_HZ, read_hz: DEFAULT_READ_HZ }
    }
}

/// Protocol layer: bus, chip-select and data/command lines
///
/// Data/command idles high (data); commands drop it for a single byte.
pub struct Protocol<B, CS, DC> {
    bus: B,
    cs: CS,
    dc: DC,
    clocks: BusClocks,
}

impl<B, CS, DC> Protocol<B, CS, DC>
where
    B: SerialBus,
    CS: OutputPin,
    DC: OutputPin,
{
    pub fn new(bus: B, cs: CS, dc: DC, clocks: BusClocks) -> Self {
        Self { bus, cs, dc, clocks }
    }

    pub fn clocks(&self) -> BusClocks {
        self.clocks
    }

    /// Give back bus and lines
    pub fn release(self) -> (B, CS, DC) {
        (self.bus, self.cs, self.dc)
    }

    /// Chip-select low
    pub fn select(&mut self) -> Result<(), DisplayError> {
        self.cs.set_low().map_err(|e| DisplayError::pin("CS", e))
    }

    /// Chip-select high
    pub fn deselect(&mut self) -> Result<(), DisplayError> {
        self.cs.set_high().map_err(|e| DisplayError::pin("CS", e))
    }

    pub(crate) fn data_mode(&mut self) -> Result<(), DisplayError> {
        self.dc.set_high().map_err(|e| DisplayError::pin("D/C", e))
    }

    pub(crate) fn command_mode(&mut self) -> Result<(), DisplayError> {
        self.dc.set_low().map_err(|e| DisplayError::pin("D/C", e))
    }

    /// Park the lines: deselected, data mode
    pub fn park(&mut self) -> Result<(), DisplayError> {
        self.deselect()?;
        self.data_mode()
    }

    /// Run `body` between select and deselect
    ///
    /// The device is deselected even when `body` fails; the body's error
    /// wins over a deselect error.
    pub fn transaction<T, F>(&mut self, body: F) -> Result<T, DisplayError>
    where
        F: FnOnce(&mut Self) -> Result<T, DisplayError>,
    {
        self.select()?;
        let result = body(self);
        let released = self.deselect();
        let value = result?;
        released?;
        Ok(value)
    }

    /// Send a command byte and return to data mode
    pub fn write_command(&mut self, cmd: Command) -> Result<(), DisplayError> {
        self.command_mode()?;
        self.bus.write_byte(cmd.byte()).map_err(DisplayError::bus)?;
        self.data_mode()
    }

    /// Send a command followed by its parameter block
    pub fn write_command_data(&mut self, cmd: Command, params: &[u8]) -> Result<(), DisplayError> {
        self.write_command(cmd)?;
        self.bus.write_buffer(params).map_err(DisplayError::bus)
    }

    /// One 16-bit color word
    pub fn write_color(&mut self, color: u16) -> Result<(), DisplayError> {
        self.bus.write_word(color).map_err(DisplayError::bus)
    }

    /// `count` copies of one color, chunked to keep bus writes large
    pub fn write_pixel_run(&mut self, color: u16, count: u32) -> Result<(), DisplayError> {
        if count == 1 {
            return self.write_color(color);
        }
        let mut chunk = [0u8; RUN_CHUNK * 2];
        for pair in chunk.chunks_exact_mut(2) {
            pair.copy_from_slice(&color.to_be_bytes());
        }

        let mut remaining = count as usize;
        while remaining > 0 {
            let n = remaining.min(RUN_CHUNK);
            self.bus.write_buffer(&chunk[..n * 2]).map_err(DisplayError::bus)?;
            remaining -= n;
        }
        Ok(())
    }

    /// Stream a sequence of colors into the open window
    pub fn write_pixels<I>(&mut self, colors: I) -> Result<(), DisplayError>
    where
        I: IntoIterator<Item = u16>,
    {
        let mut chunk = [0u8; RUN_CHUNK * 2];
        let mut n = 0;
        for color in colors {
            chunk[n * 2..n * 2 + 2].copy_from_slice(&color.to_be_bytes());
            n += 1;
            if n == RUN_CHUNK {
                self.bus.write_buffer(&chunk).map_err(DisplayError::bus)?;
                n = 0;
            }
        }
        if n > 0 {
            self.bus.write_buffer(&chunk[..n * 2]).map_err(DisplayError::bus)?;
        }
        Ok(())
    }

    /// Column range, row range, then memory write
    ///
    /// The caller must follow with exactly `window.pixel_count()` color
    /// writes; the controller wraps its write pointer inside the window.
    pub fn set_address_window(&mut self, window: AddressWindow) -> Result<(), DisplayError> {
        trace!("window {}x{} at ({},{})", window.width, window.height, window.x, window.y);

        let columns = (u32::from(window.x) << 16) | u32::from(window.x_end());
        let rows = (u32::from(window.y) << 16) | u32::from(window.y_end());

        self.write_command(Command::ColumnAddr)?;
        self.bus.write_dword(columns).map_err(DisplayError::bus)?;

        self.write_command(Command::RowAddr)?;
        self.bus.write_dword(rows).map_err(DisplayError::bus)?;

        self.write_command(Command::MemoryWrite)
    }

    /// Window plus a solid run covering it
    pub fn fill_window(&mut self, window: AddressWindow, color: u16) -> Result<(), DisplayError> {
        self.set_address_window(window)?;
        self.write_pixel_run(color, window.pixel_count())
    }

    /// Single bracketed command byte
    pub fn send(&mut self, cmd: Command) -> Result<(), DisplayError> {
        self.transaction(|p| p.write_command(cmd))
    }

    /// Display inversion on/off
    pub fn invert(&mut self, on: bool) -> Result<(), DisplayError> {
        self.send(Command::toggle(on, Command::InvertOff, Command::InvertOn))
    }

    /// Idle (8-color) mode on/off
    pub fn idle(&mut self, on: bool) -> Result<(), DisplayError> {
        self.send(Command::toggle(on, Command::IdleOff, Command::IdleOn))
    }

    /// Read 8 bits after a command. Advisory only.
    ///
    /// The ST7735 shares one data line for both directions and the turnaround
    /// timing is not reliable on every wiring. Never base control flow on the
    /// value returned here.
    pub fn read_u8(&mut self, cmd: Command) -> Result<u8, DisplayError> {
        warn!("read-back of {:?} is advisory; the result may be garbage", cmd);
        self.transaction(|p| {
            p.write_command(cmd)?;
            p.with_read_path(|p| {
                p.bus.set_clock_rate(p.clocks.read_hz).map_err(DisplayError::bus)?;
                p.bus.set_data_direction(PinDirection::Input).map_err(DisplayError::bus)?;
                p.bus.read_byte().map_err(DisplayError::bus)
            })
        })
    }

    /// Read 32 bits of RDDID / RDDST. Advisory only, see [`Self::read_u8`].
    pub fn read_info(&mut self, cmd: Command) -> Result<u32, DisplayError> {
        warn!("read-back of {:?} is advisory; the result may be garbage", cmd);
        self.transaction(|p| {
            p.write_command(cmd)?;
            p.with_read_path(|p| {
                p.bus.set_enabled(false).map_err(DisplayError::bus)?;
                p.bus.set_data_direction(PinDirection::Input).map_err(DisplayError::bus)?;
                // dummy clock between command and first data bit
                p.bus.pulse_clock().map_err(DisplayError::bus)?;
                p.bus.set_clock_rate(p.clocks.read_hz).map_err(DisplayError::bus)?;
                p.bus.set_enabled(true).map_err(DisplayError::bus)?;
                p.bus.read_dword().map_err(DisplayError::bus)
            })
        })
    }

    /// Run a turnaround and read, then put the write path back however it went
    ///
    /// The first error wins.
    fn with_read_path<T, F>(&mut self, read: F) -> Result<T, DisplayError>
    where
        F: FnOnce(&mut Self) -> Result<T, DisplayError>,
    {
        let value = read(self);
        let restored = self.restore_write_path();
        let value = value?;
        restored?;
        Ok(value)
    }

    /// Write clock, output direction, clock enabled; every step is attempted
    fn restore_write_path(&mut self) -> Result<(), DisplayError> {
        let enabled = self.bus.set_enabled(true);
        let clock = self.bus.set_clock_rate(self.clocks.write_hz);
        let direction = self.bus.set_data_direction(PinDirection::Output);
        enabled.and(clock).and(direction).map_err(DisplayError::bus)
    }
}
