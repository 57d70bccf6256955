/*
 *  display/traits.rs
 *
 *  st7735-tft - TFT console over a command/data bus
 *  (c) 2020-26 Stuart Hunter
 *
 *  Core trait definitions: bus transport, character sink, interrupt masking
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

use core::fmt::Debug;
use embedded_hal::spi::SpiBus;

/// Width of one text cell in pixels (5px glyph + 1px spacing)
pub const CELL_WIDTH: i32 = 6;

/// Height of one text cell in pixels (7px glyph + 1px spacing)
pub const CELL_HEIGHT: i32 = 8;

/// Panel geometry and the text grid derived from it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayGeometry {
    /// Display width in pixels
    pub width: u16,

    /// Display height in pixels
    pub height: u16,
}

impl DisplayGeometry {
    /// 128x160 ST7735 panel
    pub const ST7735: DisplayGeometry = DisplayGeometry { width: 128, height: 160 };

    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Text columns per row
    pub const fn columns(&self) -> i32 {
        self.width as i32 / CELL_WIDTH
    }

    /// Text rows per screen
    pub const fn rows(&self) -> i32 {
        self.height as i32 / CELL_HEIGHT
    }

    /// Whether a signed coordinate lies on the panel
    #[inline]
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width as i32 && y < self.height as i32
    }
}

impl Default for DisplayGeometry {
    fn default() -> Self {
        DisplayGeometry::ST7735
    }
}

/// Direction of the bus data-out line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinDirection {
    Input,
    Output,
}

/// Serial bus transport the protocol layer writes through
///
/// Chip-select and data/command are separate GPIO lines owned by the
/// protocol layer; this trait only moves bits on the clock/data lines.
/// Multi-byte words go out most significant byte first.
pub trait SerialBus {
    type Error: Debug;

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error>;

    fn write_buffer(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    fn write_word(&mut self, word: u16) -> Result<(), Self::Error> {
        self.write_buffer(&word.to_be_bytes())
    }

    fn write_dword(&mut self, dword: u32) -> Result<(), Self::Error> {
        self.write_buffer(&dword.to_be_bytes())
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error>;

    fn read_dword(&mut self) -> Result<u32, Self::Error> {
        let mut value = 0u32;
        for _ in 0..4 {
            value = (value << 8) | u32::from(self.read_byte()?);
        }
        Ok(value)
    }

    /// Switch the bus clock
    fn set_clock_rate(&mut self, hz: u32) -> Result<(), Self::Error>;

    /// Turn the data-out line around for read-back
    fn set_data_direction(&mut self, direction: PinDirection) -> Result<(), Self::Error>;

    /// Enable or disable the bus peripheral
    fn set_enabled(&mut self, _enabled: bool) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Emit a single dummy clock cycle
    fn pulse_clock(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<T: SerialBus + ?Sized> SerialBus for &mut T {
    type Error = T::Error;

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        T::write_byte(self, byte)
    }

    fn write_buffer(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        T::write_buffer(self, bytes)
    }

    fn write_word(&mut self, word: u16) -> Result<(), Self::Error> {
        T::write_word(self, word)
    }

    fn write_dword(&mut self, dword: u32) -> Result<(), Self::Error> {
        T::write_dword(self, dword)
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        T::read_byte(self)
    }

    fn read_dword(&mut self) -> Result<u32, Self::Error> {
        T::read_dword(self)
    }

    fn set_clock_rate(&mut self, hz: u32) -> Result<(), Self::Error> {
        T::set_clock_rate(self, hz)
    }

    fn set_data_direction(&mut self, direction: PinDirection) -> Result<(), Self::Error> {
        T::set_data_direction(self, direction)
    }

    fn set_enabled(&mut self, enabled: bool) -> Result<(), Self::Error> {
        T::set_enabled(self, enabled)
    }

    fn pulse_clock(&mut self) -> Result<(), Self::Error> {
        T::pulse_clock(self)
    }
}

/// Adapter for any embedded-hal `SpiBus`
///
/// embedded-hal has no notion of clock switching or line turnaround, so those
/// requests are accepted and ignored; read-back on such a bus is only as good
/// as the wiring allows.
#[derive(Debug)]
pub struct SpiBusTransport<S> {
    spi: S,
}

impl<S> SpiBusTransport<S> {
    pub fn new(spi: S) -> Self {
        Self { spi }
    }

    pub fn release(self) -> S {
        self.spi
    }
}

impl<S: SpiBus<u8>> SerialBus for SpiBusTransport<S> {
    type Error = S::Error;

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        self.spi.write(&[byte])
    }

    fn write_buffer(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.spi.write(bytes)
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        let mut buf = [0u8; 1];
        self.spi.read(&mut buf)?;
        Ok(buf[0])
    }

    fn read_dword(&mut self) -> Result<u32, Self::Error> {
        let mut buf = [0u8; 4];
        self.spi.read(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    fn set_clock_rate(&mut self, _hz: u32) -> Result<(), Self::Error> {
        self.spi.flush()
    }

    fn set_data_direction(&mut self, _direction: PinDirection) -> Result<(), Self::Error> {
        self.spi.flush()
    }
}

/// A single-character output sink
///
/// The text engine implements this so a display can stand in wherever a
/// character stream is expected (see [`crate::display::text::TextWriter`]).
pub trait CharSink {
    type Error;

    fn put_char(&mut self, c: u8) -> Result<(), Self::Error>;
}

impl<T: CharSink + ?Sized> CharSink for &mut T {
    type Error = T::Error;

    fn put_char(&mut self, c: u8) -> Result<(), Self::Error> {
        T::put_char(self, c)
    }
}

/// Interrupt suspension around timing-critical sequences
///
/// `disable` returns whether interrupts were enabled before the call so that
/// `restore` can put the previous state back.
pub trait InterruptMask {
    fn disable(&mut self) -> bool;

    fn restore(&mut self, was_enabled: bool);
}

/// No-op mask for hosted targets where the kernel owns interrupts
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMask;

impl InterruptMask for NoMask {
    fn disable(&mut self) -> bool {
        false
    }

    fn restore(&mut self, _was_enabled: bool) {}
}
