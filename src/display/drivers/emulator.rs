/*
 *  display/drivers/emulator.rs
 *
 *  st7735-tft - TFT console over a command/data bus
 *  (c) 2020-26 Stuart Hunter
 *
 *  Virtual ST7735: decodes the command stream into a framebuffer
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

use core::convert::Infallible;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use embedded_graphics::pixelcolor::{raw::RawU16, Rgb565};
use embedded_graphics::prelude::*;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};
use log::{debug, info};
use thiserror::Error;

use crate::display::color::Rgb888;
use crate::display::command::Command;
use crate::display::protocol::AddressWindow;
use crate::display::session::Pins;
use crate::display::traits::{DisplayGeometry, PinDirection, SerialBus};
use crate::vframebuf::VarFrameBuf;

/// Injected transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("emulated bus fault")]
pub struct BusFault;

/// Everything the virtual panel has seen (shared for inspection in tests)
#[derive(Debug)]
pub struct EmulatorState {
    /// Panel memory as the controller holds it
    pub framebuffer: VarFrameBuf<Rgb565>,

    /// Chip-select asserted (line low)
    pub selected: bool,

    /// Data/command line high (data)
    pub data_mode: bool,

    /// Reset line high (released)
    pub reset_released: bool,

    pub sleeping: bool,
    pub display_on: bool,
    pub inverted: bool,
    pub idle: bool,

    /// Last COLMOD parameter
    pub pixel_format: Option<u8>,

    /// Last GAMSET parameter
    pub gamma: Option<u8>,

    /// Every command byte received, in order
    pub commands: Vec<u8>,

    /// Window in force at each RAMWR
    pub windows: Vec<AddressWindow>,

    /// Number of chip-select assertions
    pub transactions: usize,

    /// 16-bit pixel words written to panel memory
    pub pixel_writes: usize,

    /// Bytes clocked while deselected
    pub violations: usize,

    /// Falling edges on the reset line
    pub reset_pulses: usize,

    /// Clock rate last requested by the host
    pub clock_hz: u32,

    /// Current direction of the data line
    pub direction: PinDirection,

    /// Bytes returned by reads, front first
    pub read_queue: VecDeque<u8>,

    /// Fail every bus transfer (for error testing)
    pub simulate_bus_failure: bool,

    current: Option<u8>,
    params: Vec<u8>,
    columns: (u16, u16),
    rows: (u16, u16),
    write_x: u16,
    write_y: u16,
    high_byte: Option<u8>,
}

impl EmulatorState {
    fn new(geometry: DisplayGeometry) -> Self {
        Self {
            framebuffer: VarFrameBuf::new(u32::from(geometry.width), u32::from(geometry.height), Rgb565::BLACK),
            selected: false,
            data_mode: true,
            reset_released: true,
            sleeping: true,
            display_on: false,
            inverted: false,
            idle: false,
            pixel_format: None,
            gamma: None,
            commands: Vec::new(),
            windows: Vec::new(),
            transactions: 0,
            pixel_writes: 0,
            violations: 0,
            reset_pulses: 0,
            clock_hz: 0,
            direction: PinDirection::Output,
            read_queue: VecDeque::new(),
            simulate_bus_failure: false,
            current: None,
            params: Vec::new(),
            columns: (0, geometry.width.saturating_sub(1)),
            rows: (0, geometry.height.saturating_sub(1)),
            write_x: 0,
            write_y: 0,
            high_byte: None,
        }
    }

    /// Hardware reset: controller registers back to power-on values
    fn hardware_reset(&mut self) {
        let (w, h) = (self.framebuffer.width() as u16, self.framebuffer.height() as u16);
        self.sleeping = true;
        self.display_on = false;
        self.inverted = false;
        self.idle = false;
        self.pixel_format = None;
        self.gamma = None;
        self.current = None;
        self.params.clear();
        self.columns = (0, w.saturating_sub(1));
        self.rows = (0, h.saturating_sub(1));
        self.high_byte = None;
    }

    fn on_byte(&mut self, byte: u8) {
        if !self.selected {
            self.violations += 1;
            return;
        }
        if self.data_mode {
            self.on_data(byte);
        } else {
            self.on_command(byte);
        }
    }

    fn on_command(&mut self, byte: u8) {
        self.commands.push(byte);
        self.current = Some(byte);
        self.params.clear();
        self.high_byte = None;

        match byte {
            b if b == Command::SwReset.byte() => self.hardware_reset(),
            b if b == Command::SleepIn.byte() => self.sleeping = true,
            b if b == Command::SleepOut.byte() => self.sleeping = false,
            b if b == Command::InvertOff.byte() => self.inverted = false,
            b if b == Command::InvertOn.byte() => self.inverted = true,
            b if b == Command::DisplayOff.byte() => self.display_on = false,
            b if b == Command::DisplayOn.byte() => self.display_on = true,
            b if b == Command::IdleOff.byte() => self.idle = false,
            b if b == Command::IdleOn.byte() => self.idle = true,
            b if b == Command::MemoryWrite.byte() => {
                self.write_x = self.columns.0;
                self.write_y = self.rows.0;
                self.windows.push(AddressWindow {
                    x: self.columns.0,
                    y: self.rows.0,
                    width: self.columns.1.saturating_sub(self.columns.0) + 1,
                    height: self.rows.1.saturating_sub(self.rows.0) + 1,
                });
            }
            _ => {}
        }
    }

    fn on_data(&mut self, byte: u8) {
        let Some(cmd) = self.current else {
            return;
        };
        match cmd {
            c if c == Command::ColumnAddr.byte() || c == Command::RowAddr.byte() => {
                self.params.push(byte);
                if self.params.len() == 4 {
                    let start = u16::from_be_bytes([self.params[0], self.params[1]]);
                    let end = u16::from_be_bytes([self.params[2], self.params[3]]);
                    if c == Command::ColumnAddr.byte() {
                        self.columns = (start, end);
                    } else {
                        self.rows = (start, end);
                    }
                }
            }
            c if c == Command::PixelFormat.byte() => self.pixel_format = Some(byte),
            c if c == Command::GammaSet.byte() => self.gamma = Some(byte),
            c if c == Command::MemoryWrite.byte() => match self.high_byte.take() {
                None => self.high_byte = Some(byte),
                Some(high) => self.store_pixel(u16::from_be_bytes([high, byte])),
            },
            _ => {}
        }
    }

    fn store_pixel(&mut self, raw: u16) {
        let point = Point::new(i32::from(self.write_x), i32::from(self.write_y));
        self.framebuffer.set_pixel(point, Rgb565::from(RawU16::new(raw)));
        self.pixel_writes += 1;

        // write pointer wraps inside the window
        if self.write_x >= self.columns.1 {
            self.write_x = self.columns.0;
            self.write_y = if self.write_y >= self.rows.1 { self.rows.0 } else { self.write_y + 1 };
        } else {
            self.write_x += 1;
        }
    }

    fn pop_read(&mut self) -> u8 {
        if !self.selected {
            self.violations += 1;
        }
        self.read_queue.pop_front().unwrap_or(0)
    }

    /// The color a viewer would see, with inversion and idle mode applied
    pub fn visible(&self, color: Rgb565) -> Rgb888 {
        let mut c = Rgb888::from(color);
        if self.idle {
            // 8-color mode keeps only the channel MSBs
            let msb = |v: u8| if v & 0x80 != 0 { 0xFF } else { 0x00 };
            c = Rgb888::new(msb(c.red), msb(c.green), msb(c.blue));
        }
        if self.inverted {
            c = Rgb888::new(!c.red, !c.green, !c.blue);
        }
        if !self.display_on || self.sleeping {
            c = Rgb888::BLACK;
        }
        c
    }
}

/// Delay that returns at once; the virtual panel needs no settle time
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantDelay;

impl DelayNs for InstantDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

/// Handle on a virtual panel
///
/// Clone it freely; the bus and pins it hands out all feed the same state.
#[derive(Debug, Clone)]
pub struct Emulator {
    geometry: DisplayGeometry,
    state: Arc<Mutex<EmulatorState>>,
}

impl Emulator {
    pub fn new(geometry: DisplayGeometry) -> Self {
        debug!("emulated ST7735 {}x{}", geometry.width, geometry.height);
        Self {
            geometry,
            state: Arc::new(Mutex::new(EmulatorState::new(geometry))),
        }
    }

    pub fn geometry(&self) -> DisplayGeometry {
        self.geometry
    }

    /// Serial transport into this panel
    pub fn bus(&self) -> EmulatorBus {
        EmulatorBus { state: Arc::clone(&self.state) }
    }

    /// CS, D/C and RST lines into this panel
    pub fn pins(&self) -> Pins<EmulatorPin, EmulatorPin, EmulatorPin> {
        let pin = |line| EmulatorPin { line, state: Arc::clone(&self.state) };
        Pins { cs: pin(Line::ChipSelect), dc: pin(Line::DataCommand), rst: pin(Line::Reset) }
    }

    /// Get reference to state for inspection in tests
    pub fn state(&self) -> Arc<Mutex<EmulatorState>> {
        Arc::clone(&self.state)
    }

    pub fn lock(&self) -> MutexGuard<'_, EmulatorState> {
        lock(&self.state)
    }

    /// Raw 565 word at a panel position
    pub fn pixel(&self, x: i32, y: i32) -> Option<u16> {
        self.lock()
            .framebuffer
            .pixel(Point::new(x, y))
            .map(|c| RawU16::from(c).into_inner())
    }

    /// Count of panel pixels holding `color`
    pub fn count_pixels(&self, color: u16) -> usize {
        let color = Rgb565::from(RawU16::new(color));
        self.lock().framebuffer.as_slice().iter().filter(|&&p| p == color).count()
    }

    /// Copy of panel memory
    pub fn snapshot(&self) -> VarFrameBuf<Rgb565> {
        self.lock().framebuffer.clone()
    }

    /// Queue bytes for the next reads
    pub fn queue_read(&self, bytes: &[u8]) {
        self.lock().read_queue.extend(bytes.iter().copied());
    }

    /// Forget the recorded protocol history, keep panel memory
    pub fn reset_counters(&self) {
        let mut state = self.lock();
        state.commands.clear();
        state.windows.clear();
        state.transactions = 0;
        state.pixel_writes = 0;
        state.violations = 0;
    }

    /// Save what the panel shows as a binary PPM
    pub fn save_ppm<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let state = self.lock();
        let fb = &state.framebuffer;

        let mut out = BufWriter::new(File::create(path.as_ref())?);
        write!(out, "P6\n{} {}\n255\n", fb.width(), fb.height())?;
        for &pixel in fb.as_slice() {
            let c = state.visible(pixel);
            out.write_all(&[c.red, c.green, c.blue])?;
        }
        out.flush()?;

        info!("snapshot written to {}", path.as_ref().display());
        Ok(())
    }
}

fn lock(state: &Mutex<EmulatorState>) -> MutexGuard<'_, EmulatorState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Serial side of the virtual panel
#[derive(Debug)]
pub struct EmulatorBus {
    state: Arc<Mutex<EmulatorState>>,
}

impl EmulatorBus {
    fn check(state: &EmulatorState) -> Result<(), BusFault> {
        if state.simulate_bus_failure { Err(BusFault) } else { Ok(()) }
    }
}

impl SerialBus for EmulatorBus {
    type Error = BusFault;

    fn write_byte(&mut self, byte: u8) -> Result<(), BusFault> {
        let mut state = lock(&self.state);
        Self::check(&state)?;
        state.on_byte(byte);
        Ok(())
    }

    fn write_buffer(&mut self, bytes: &[u8]) -> Result<(), BusFault> {
        let mut state = lock(&self.state);
        Self::check(&state)?;
        for &byte in bytes {
            state.on_byte(byte);
        }
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, BusFault> {
        let mut state = lock(&self.state);
        Self::check(&state)?;
        Ok(state.pop_read())
    }

    fn set_clock_rate(&mut self, hz: u32) -> Result<(), BusFault> {
        lock(&self.state).clock_hz = hz;
        Ok(())
    }

    fn set_data_direction(&mut self, direction: PinDirection) -> Result<(), BusFault> {
        lock(&self.state).direction = direction;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line {
    ChipSelect,
    DataCommand,
    Reset,
}

/// One control line of the virtual panel
#[derive(Debug)]
pub struct EmulatorPin {
    line: Line,
    state: Arc<Mutex<EmulatorState>>,
}

impl EmulatorPin {
    fn set(&mut self, high: bool) {
        let mut state = lock(&self.state);
        match self.line {
            Line::ChipSelect => {
                if !high && !state.selected {
                    state.transactions += 1;
                }
                state.selected = !high;
            }
            Line::DataCommand => state.data_mode = high,
            Line::Reset => {
                if !high && state.reset_released {
                    state.reset_pulses += 1;
                    state.hardware_reset();
                }
                state.reset_released = high;
            }
        }
    }
}

impl ErrorType for EmulatorPin {
    type Error = Infallible;
}

impl OutputPin for EmulatorPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.set(true);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wired() -> (Emulator, EmulatorBus, Pins<EmulatorPin, EmulatorPin, EmulatorPin>) {
        let emu = Emulator::new(DisplayGeometry::new(8, 4));
        let bus = emu.bus();
        let pins = emu.pins();
        (emu, bus, pins)
    }

    #[test]
    fn test_bytes_while_deselected_are_violations() {
        let (emu, mut bus, _pins) = wired();
        bus.write_buffer(&[1, 2, 3]).unwrap();
        assert_eq!(emu.lock().violations, 3);
        assert!(emu.lock().commands.is_empty());
    }

    #[test]
    fn test_window_and_pixel_decode() {
        let (emu, mut bus, mut pins) = wired();
        pins.cs.set_low().unwrap();

        pins.dc.set_low().unwrap();
        bus.write_byte(Command::ColumnAddr.byte()).unwrap();
        pins.dc.set_high().unwrap();
        bus.write_dword((2 << 16) | 3).unwrap();

        pins.dc.set_low().unwrap();
        bus.write_byte(Command::RowAddr.byte()).unwrap();
        pins.dc.set_high().unwrap();
        bus.write_dword((1 << 16) | 2).unwrap();

        pins.dc.set_low().unwrap();
        bus.write_byte(Command::MemoryWrite.byte()).unwrap();
        pins.dc.set_high().unwrap();
        for word in [0x1111u16, 0x2222, 0x3333, 0x4444, 0x5555] {
            bus.write_word(word).unwrap();
        }
        pins.cs.set_high().unwrap();

        assert_eq!(emu.pixel(2, 1), Some(0x5555));
        assert_eq!(emu.pixel(3, 1), Some(0x2222));
        assert_eq!(emu.pixel(2, 2), Some(0x3333));
        assert_eq!(emu.pixel(3, 2), Some(0x4444));
        assert_eq!(emu.pixel(0, 0), Some(0));

        let state = emu.lock();
        assert_eq!(state.pixel_writes, 5);
        assert_eq!(state.transactions, 1);
        assert_eq!(state.windows, vec![AddressWindow { x: 2, y: 1, width: 2, height: 2 }]);
    }

    #[test]
    fn test_reset_line_restores_power_on_state() {
        let (emu, mut bus, mut pins) = wired();
        pins.cs.set_low().unwrap();
        pins.dc.set_low().unwrap();
        bus.write_buffer(&[Command::SleepOut.byte(), Command::InvertOn.byte()]).unwrap();
        {
            let state = emu.lock();
            assert!(!state.sleeping && state.inverted);
        }

        pins.rst.set_low().unwrap();
        pins.rst.set_high().unwrap();
        let state = emu.lock();
        assert!(state.sleeping && !state.inverted);
        assert_eq!(state.reset_pulses, 1);
    }

    #[test]
    fn test_injected_fault() {
        let (emu, mut bus, _pins) = wired();
        emu.lock().simulate_bus_failure = true;
        assert_eq!(bus.write_byte(0), Err(BusFault));
    }

    #[test]
    fn test_visible_color_modes() {
        let emu = Emulator::new(DisplayGeometry::new(2, 2));
        let mut state = emu.lock();
        let grey = Rgb565::new(12, 40, 20);
        assert_eq!(state.visible(grey), Rgb888::BLACK);

        state.display_on = true;
        state.sleeping = false;
        state.idle = true;
        assert_eq!(state.visible(grey), Rgb888::new(0, 0xFF, 0xFF));

        state.inverted = true;
        assert_eq!(state.visible(grey), Rgb888::new(0xFF, 0, 0));
    }
}
