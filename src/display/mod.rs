/*
 *  display/mod.rs
 *
 *  st7735-tft - TFT console over a command/data bus
 *  (c) 2020-26 Stuart Hunter
 *
 *  ST7735 display subsystem
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

// Core trait definitions
pub mod traits;
pub mod error;
pub mod color;
pub mod command;

// Wire protocol, rasterizer and text engine
pub mod protocol;
pub mod raster;
pub mod font;
pub mod text;

// Device session
pub mod session;

// Bus and pin implementations
pub mod drivers;

// Re-exports for convenience
pub use traits::{CharSink, DisplayGeometry, InterruptMask, NoMask, PinDirection, SerialBus, SpiBusTransport};
pub use error::DisplayError;
pub use color::{hsv_to_rgb, pack565, pack666, Rgb888};
pub use command::Command;
pub use protocol::{AddressWindow, BusClocks};
pub use raster::CircleAlgorithm;
pub use font::{GlyphSource, MonoGlyphs};
pub use text::{CursorState, TextFlags, TextWriter};
pub use session::{Pins, St7735};
pub use drivers::emulator::Emulator;
