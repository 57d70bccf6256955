/*
 *  display/color.rs
 *
 *  st7735-tft - TFT console over a command/data bus
 *  (c) 2020-26 Stuart Hunter
 *
 *  HSV to RGB conversion and RGB565 / RGB666 packing
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

use embedded_graphics::pixelcolor::{Rgb565, RgbColor};

/// Canonical unpacked color, 8 bits per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb888 {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb888 {
    pub const BLACK: Rgb888 = Rgb888::new(0, 0, 0);
    pub const WHITE: Rgb888 = Rgb888::new(255, 255, 255);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Pack to the 16-bit wire format (5-6-5)
    pub const fn to_565(self) -> u16 {
        pack565(self.red, self.green, self.blue)
    }

    /// Pack to the 18-bit wire format, 6 significant bits per byte
    pub const fn to_666(self) -> u32 {
        pack666(self.red, self.green, self.blue)
    }
}

impl From<Rgb565> for Rgb888 {
    fn from(c: Rgb565) -> Self {
        // widen 5/6-bit channels back to 8 bits
        Rgb888::new(c.r() << 3, c.g() << 2, c.b() << 3)
    }
}

/// RGB to 565: 16-bit color, 16-bit data
pub const fn pack565(red: u8, green: u8, blue: u8) -> u16 {
    (((red & 0xF8) as u16) << 8) | (((green & 0xFC) as u16) << 3) | ((blue >> 3) as u16)
}

/// RGB to 666: 18-bit color, 24-bit data
pub const fn pack666(red: u8, green: u8, blue: u8) -> u32 {
    (((red & 0xFC) as u32) << 16) | (((green & 0xFC) as u32) << 8) | ((blue & 0xFC) as u32)
}

/// Convert HSV to RGB
///
/// * `hue` - 0..=360 degrees
/// * `sat` - 0..=100 percent
/// * `val` - 0..=100 percent
///
/// Anything outside those ranges yields black.
pub fn hsv_to_rgb(hue: u16, sat: u8, val: u8) -> Rgb888 {
    if hue > 360 || sat > 100 || val > 100 {
        return Rgb888::BLACK;
    }

    let sector = (hue / 60) % 6;
    let val = f32::from(val);
    let v_min = (100.0 - f32::from(sat)) * val / 100.0;
    let a = (val - v_min) * (f32::from(hue % 60) / 60.0);
    let v_inc = v_min + a;
    let v_dec = val - a;

    let (red, green, blue) = match sector {
        0 => (val, v_inc, v_min),
        1 => (v_dec, val, v_min),
        2 => (v_min, val, v_inc),
        3 => (v_min, v_dec, val),
        4 => (v_inc, v_min, val),
        _ => (val, v_min, v_dec),
    };

    Rgb888::new(scale_percent(red), scale_percent(green), scale_percent(blue))
}

/// 0..=100 percent to 0..=255, rounded half away from zero
#[inline]
fn scale_percent(p: f32) -> u8 {
    (p * 255.0 / 100.0).round().clamp(0.0, 255.0) as u8
}

/// Common 565 presets
pub mod rgb565 {
    use super::pack565;

    pub const BLACK: u16 = 0x0000;
    pub const WHITE: u16 = 0xFFFF;
    pub const RED: u16 = pack565(255, 0, 0);
    pub const GREEN: u16 = pack565(0, 255, 0);
    pub const BLUE: u16 = pack565(0, 0, 255);
    pub const CYAN: u16 = pack565(0, 168, 168);
    pub const NAVY: u16 = pack565(0, 0, 168);
    pub const YELLOW: u16 = pack565(255, 255, 85);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack565_extremes() {
        assert_eq!(pack565(255, 255, 255), 0xFFFF);
        assert_eq!(pack565(0, 0, 0), 0x0000);
        assert_eq!(pack565(255, 0, 0), 0xF800);
        assert_eq!(pack565(0, 255, 0), 0x07E0);
        assert_eq!(pack565(0, 0, 255), 0x001F);
    }

    #[test]
    fn test_pack565_drops_low_bits() {
        assert_eq!(pack565(0x07, 0x03, 0x07), 0x0000);
        assert_eq!(pack565(0x08, 0x04, 0x08), 0x0821);
    }

    #[test]
    fn test_pack666() {
        assert_eq!(pack666(255, 255, 255), 0x00FC_FCFC);
        assert_eq!(pack666(0, 0, 0), 0);
        assert_eq!(pack666(0x03, 0x81, 0xFF), 0x0000_80FC);
    }

    #[test]
    fn test_hsv_primaries() {
        assert_eq!(hsv_to_rgb(0, 100, 100), Rgb888::new(255, 0, 0));
        assert_eq!(hsv_to_rgb(120, 100, 100), Rgb888::new(0, 255, 0));
        assert_eq!(hsv_to_rgb(240, 100, 100), Rgb888::new(0, 0, 255));
        // 360 wraps to sector 0
        assert_eq!(hsv_to_rgb(360, 100, 100), Rgb888::new(255, 0, 0));
    }

    #[test]
    fn test_hsv_secondaries_and_greys() {
        assert_eq!(hsv_to_rgb(60, 100, 100), Rgb888::new(255, 255, 0));
        assert_eq!(hsv_to_rgb(180, 100, 100), Rgb888::new(0, 255, 255));
        assert_eq!(hsv_to_rgb(300, 100, 100), Rgb888::new(255, 0, 255));
        assert_eq!(hsv_to_rgb(200, 0, 100), Rgb888::WHITE);
        assert_eq!(hsv_to_rgb(200, 0, 0), Rgb888::BLACK);
        // 50% grey rounds 127.5 up
        assert_eq!(hsv_to_rgb(0, 0, 50), Rgb888::new(128, 128, 128));
    }

    #[test]
    fn test_hsv_out_of_range_is_black() {
        assert_eq!(hsv_to_rgb(361, 100, 100), Rgb888::BLACK);
        assert_eq!(hsv_to_rgb(0, 101, 100), Rgb888::BLACK);
        assert_eq!(hsv_to_rgb(0, 100, 255), Rgb888::BLACK);
    }

    #[test]
    fn test_rgb888_packing_helpers() {
        let c = Rgb888::new(0, 168, 168);
        assert_eq!(c.to_565(), pack565(0, 168, 168));
        assert_eq!(c.to_666(), pack666(0, 168, 168));
        assert_eq!(Rgb888::from(Rgb565::WHITE), Rgb888::new(248, 252, 248));
    }
}
