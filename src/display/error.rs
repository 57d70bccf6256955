/*
 *  display/error.rs
 *
 *  st7735-tft - TFT console over a command/data bus
 *  (c) 2020-26 Stuart Hunter
 *
 *  Unified error types for display subsystem
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

use thiserror::Error;

/// Unified error type for all display operations
///
/// Geometry is never an error here: out-of-range shapes are clipped. Only the
/// transport and the control lines can fail.
#[derive(Debug, Error)]
pub enum DisplayError {
    /// Serial bus write/read failed
    #[error("SPI communication error: {0}")]
    SpiError(String),

    /// Chip-select, data/command or reset line failed to toggle
    #[error("GPIO error: {0}")]
    GpioError(String),

    /// Hardware initialization failed
    #[error("Display initialization failed: {0}")]
    InitializationFailed(String),
}

impl DisplayError {
    /// Wrap a transport error, keeping its debug text
    pub fn bus<E: core::fmt::Debug>(err: E) -> Self {
        DisplayError::SpiError(format!("{:?}", err))
    }

    /// Wrap a pin error, naming the line that failed
    pub fn pin<E: core::fmt::Debug>(line: &str, err: E) -> Self {
        DisplayError::GpioError(format!("{} line: {:?}", line, err))
    }
}
