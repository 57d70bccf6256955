/*
 *  display/command.rs
 *
 *  st7735-tft - TFT console over a command/data bus
 *  (c) 2020-26 Stuart Hunter
 *
 *  ST7735 op-codes (datasheet system function command list)
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

/// Controller command byte
///
/// Undefined commands are treated as NOP by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    Nop = 0x00,           // No Operation
    SwReset = 0x01,       // Software reset
    ReadId = 0x04,        // Read Display ID
    ReadStatus = 0x09,    // Read Display Status
    SleepIn = 0x10,       // Sleep in & booster off
    SleepOut = 0x11,      // Sleep out & booster on
    NormalOn = 0x13,      // Partial off (Normal)
    InvertOff = 0x20,     // Display inversion off
    InvertOn = 0x21,      // Display inversion on
    GammaSet = 0x26,      // Gamma curve select
    DisplayOff = 0x28,    // Display off
    DisplayOn = 0x29,     // Display on
    ColumnAddr = 0x2A,    // Column address set
    RowAddr = 0x2B,       // Row address set
    MemoryWrite = 0x2C,   // Memory write
    MemoryRead = 0x2E,    // Memory read
    MemoryAccess = 0x36,  // Memory data access control
    IdleOff = 0x38,       // Idle mode off
    IdleOn = 0x39,        // Idle mode on
    PixelFormat = 0x3A,   // Interface pixel format
}

impl Command {
    /// Select between an off/on command pair
    pub const fn toggle(on: bool, off_cmd: Command, on_cmd: Command) -> Command {
        if on { on_cmd } else { off_cmd }
    }

    pub const fn byte(self) -> u8 {
        self as u8
    }
}

impl From<Command> for u8 {
    fn from(cmd: Command) -> u8 {
        cmd as u8
    }
}

/// COLMOD parameter: 12/16/18 bits per pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PixelFormat {
    Rgb444 = 0b011,
    Rgb565 = 0b101,
    Rgb666 = 0b110,
}

/// GAMSET parameter for gamma curve 1 (G2.2)
pub const GAMMA_CURVE_1: u8 = 0x02;
