/*
 *  config.rs
 *
 *  st7735-tft - TFT console over a command/data bus
 *  (c) 2020-26 Stuart Hunter
 *
 *  Layered configuration: defaults, YAML file, CLI overrides, validation
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

use clap::{ArgAction, Parser, ValueEnum, ValueHint};
use dirs_next::home_dir;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

use crate::display::protocol::{BusClocks, DEFAULT_READ_HZ, DEFAULT_WRITE_HZ};
use crate::display::traits::DisplayGeometry;

/// Controller RAM limits
const MAX_WIDTH: u16 = 132;
const MAX_HEIGHT: u16 = 162;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level app configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    pub display: Option<DisplayConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DisplayConfig {
    pub width: Option<u16>,
    pub height: Option<u16>,
    pub invert: Option<bool>,
    pub idle: Option<bool>,
    pub write_hz: Option<u32>,
    pub read_hz: Option<u32>,
    pub bus: Option<BusConfig>,     // spidev wiring or the emulator
    pub text: Option<TextConfig>,
}

impl DisplayConfig {
    pub fn geometry(&self) -> DisplayGeometry {
        let default = DisplayGeometry::ST7735;
        DisplayGeometry::new(self.width.unwrap_or(default.width), self.height.unwrap_or(default.height))
    }

    /// Write clock falls back to the SPI speed, then the controller maximum
    pub fn clocks(&self) -> BusClocks {
        let spi_speed = match &self.bus {
            Some(BusConfig::Spi { speed_hz, .. }) => *speed_hz,
            _ => None,
        };
        BusClocks {
            write_hz: self.write_hz.or(spi_speed).unwrap_or(DEFAULT_WRITE_HZ),
            read_hz: self.read_hz.unwrap_or(DEFAULT_READ_HZ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BusConfig {
    Spi {
        bus: String,        // e.g. "/dev/spidev0.0"
        speed_hz: Option<u32>,
        dc_pin: u64,        // sysfs gpio numbering
        rst_pin: u64,
        cs_pin: Option<u64>, // optional if part of /dev/spidevX.Y
    },
    Emulated {
        snapshot: Option<PathBuf>, // PPM written on exit
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TextConfig {
    pub wrap: Option<bool>,
    pub transparent: Option<bool>,
    pub color: Option<u16>,         // RGB565
    pub bg_color: Option<u16>,
}

/// Demo scene to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum Scene {
    #[default]
    Graphics,
    Text,
    Palette,
    Console,
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "st7735-tft", version, about = "ST7735 TFT demo and console")]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    /// Enable debug log level
    #[arg(short = 'v', long = "debug", alias = "verbose", action = ArgAction::SetTrue)]
    pub debug: bool,
    #[arg(long)]
    pub log_level: Option<String>,
    #[arg(long, value_enum, default_value_t = Scene::Graphics)]
    pub scene: Scene,
    #[arg(long)]
    pub display_width: Option<u16>,
    #[arg(long)]
    pub display_height: Option<u16>,
    #[arg(long, action = ArgAction::Set)]
    pub display_invert: Option<bool>,
    #[arg(long, action = ArgAction::Set)]
    pub display_idle: Option<bool>,
    #[arg(long)]
    pub spi_bus: Option<String>,
    #[arg(long)]
    pub spi_speed_hz: Option<u32>,
    #[arg(long)]
    pub dc_pin: Option<u64>,
    #[arg(long)]
    pub rst_pin: Option<u64>,
    #[arg(long)]
    pub cs_pin: Option<u64>,
    /// Drive the virtual panel instead of hardware
    #[arg(long, action = ArgAction::SetTrue)]
    pub emulated: bool,
    /// PPM snapshot of the virtual panel, written on exit
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub snapshot: Option<PathBuf>,
    #[arg(long, action = ArgAction::Set)]
    pub text_wrap: Option<bool>,
    #[arg(long, action = ArgAction::Set)]
    pub text_transparent: Option<bool>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Public entry point: parse CLI, read YAML, merge, validate.
pub fn load() -> Result<(Cli, Config), ConfigError> {
    let cli = Cli::parse();
    let cfg = load_from(&cli)?;
    Ok((cli, cfg))
}

/// Same as [`load`] with an already parsed command line
pub fn load_from(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli)?;

    // 4) Validate
    validate(&cfg)?;

    Ok(cfg)
}

/// Pretty YAML of effective config (nice for debugging)
pub fn dump(cfg: &Config) -> Result<String, ConfigError> {
    Ok(serde_yaml::to_string(cfg)?)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/st7735/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/st7735/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/st7735.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["st7735.yaml", "config.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    // top-level
    if src.log_level.is_some()      { dst.log_level = src.log_level; }
    // display
    match (&mut dst.display, src.display) {
        (None, Some(c)) => dst.display = Some(c),
        (Some(d), Some(s)) => merge_display(d, s),
        _ => {}
    }
}

fn merge_display(dst: &mut DisplayConfig, src: DisplayConfig) {
    if src.width.is_some()       { dst.width = src.width; }
    if src.height.is_some()      { dst.height = src.height; }
    if src.invert.is_some()      { dst.invert = src.invert; }
    if src.idle.is_some()        { dst.idle = src.idle; }
    if src.write_hz.is_some()    { dst.write_hz = src.write_hz; }
    if src.read_hz.is_some()     { dst.read_hz = src.read_hz; }
    if src.bus.is_some()         { dst.bus = src.bus; }
    match (&mut dst.text, src.text) {
        (None, Some(t)) => dst.text = Some(t),
        (Some(d), Some(s)) => merge_text(d, s),
        _ => {}
    }
}

fn merge_text(dst: &mut TextConfig, src: TextConfig) {
    if src.wrap.is_some()        { dst.wrap = src.wrap; }
    if src.transparent.is_some() { dst.transparent = src.transparent; }
    if src.color.is_some()       { dst.color = src.color; }
    if src.bg_color.is_some()    { dst.bg_color = src.bg_color; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) -> Result<(), ConfigError> {
    if cli.log_level.is_some()       { cfg.log_level = cli.log_level.clone(); }
    if cli.debug                     { cfg.log_level = Some("debug".into()); }

    let display = cfg.display.get_or_insert_with(DisplayConfig::default);
    if cli.display_width.is_some()   { display.width = cli.display_width; }
    if cli.display_height.is_some()  { display.height = cli.display_height; }
    if cli.display_invert.is_some()  { display.invert = cli.display_invert; }
    if cli.display_idle.is_some()    { display.idle = cli.display_idle; }

    if cli.emulated {
        display.bus = Some(BusConfig::Emulated { snapshot: cli.snapshot.clone() });
    } else if let Some(path) = cli.spi_bus.as_ref() {
        let (dc_pin, rst_pin) = match (cli.dc_pin, cli.rst_pin, &display.bus) {
            (Some(dc), Some(rst), _) => (dc, rst),
            (dc, rst, Some(BusConfig::Spi { dc_pin, rst_pin, .. })) => {
                (dc.unwrap_or(*dc_pin), rst.unwrap_or(*rst_pin))
            }
            _ => {
                return Err(ConfigError::Validation(
                    "--spi-bus needs --dc-pin and --rst-pin".into(),
                ))
            }
        };
        display.bus = Some(BusConfig::Spi {
            bus: path.clone(),
            speed_hz: cli.spi_speed_hz,
            dc_pin,
            rst_pin,
            cs_pin: cli.cs_pin,
        });
    } else if let Some(BusConfig::Spi { speed_hz, dc_pin, rst_pin, cs_pin, .. }) = display.bus.as_mut() {
        if cli.spi_speed_hz.is_some() { *speed_hz = cli.spi_speed_hz; }
        if let Some(dc) = cli.dc_pin  { *dc_pin = dc; }
        if let Some(rst) = cli.rst_pin { *rst_pin = rst; }
        if cli.cs_pin.is_some()       { *cs_pin = cli.cs_pin; }
    } else if let Some(BusConfig::Emulated { snapshot }) = display.bus.as_mut() {
        if cli.snapshot.is_some()     { *snapshot = cli.snapshot.clone(); }
    }

    if cli.text_wrap.is_some() || cli.text_transparent.is_some() {
        let text = display.text.get_or_insert_with(TextConfig::default);
        if cli.text_wrap.is_some()        { text.wrap = cli.text_wrap; }
        if cli.text_transparent.is_some() { text.transparent = cli.text_transparent; }
    }
    Ok(())
}

/// Put any invariants here (required fields, ranges, etc.)
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    let Some(display) = cfg.display.as_ref() else {
        return Ok(());
    };

    if let Some(w) = display.width {
        if w == 0 || w > MAX_WIDTH {
            return Err(ConfigError::Validation(format!("display width must be 1..={}", MAX_WIDTH)));
        }
    }
    if let Some(h) = display.height {
        if h == 0 || h > MAX_HEIGHT {
            return Err(ConfigError::Validation(format!("display height must be 1..={}", MAX_HEIGHT)));
        }
    }

    let clocks = display.clocks();
    if clocks.write_hz == 0 || clocks.read_hz == 0 {
        return Err(ConfigError::Validation("bus clock rates must be > 0".into()));
    }
    if clocks.read_hz > clocks.write_hz {
        return Err(ConfigError::Validation(format!(
            "read clock {} Hz exceeds write clock {} Hz",
            clocks.read_hz, clocks.write_hz
        )));
    }

    if let Some(BusConfig::Spi { bus, .. }) = display.bus.as_ref() {
        if bus.trim().is_empty() {
            return Err(ConfigError::Validation("spi bus path must not be empty".into()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
log_level: info
display:
  width: 128
  height: 160
  invert: true
  bus:
    type: spi
    bus: /dev/spidev0.0
    dc_pin: 24
    rst_pin: 25
  text:
    wrap: true
    color: 2016
"#;

    fn from_yaml() -> Config {
        serde_yaml::from_str(YAML).unwrap()
    }

    #[test]
    fn test_yaml_parses_tagged_bus() {
        let cfg = from_yaml();
        let display = cfg.display.unwrap();
        assert_eq!(
            display.bus,
            Some(BusConfig::Spi {
                bus: "/dev/spidev0.0".into(),
                speed_hz: None,
                dc_pin: 24,
                rst_pin: 25,
                cs_pin: None,
            })
        );
        assert_eq!(display.text.unwrap().color, Some(0x07E0));
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let mut cfg = from_yaml();
        let overlay = Config {
            log_level: None,
            display: Some(DisplayConfig {
                height: Some(128),
                text: Some(TextConfig { transparent: Some(true), ..Default::default() }),
                ..Default::default()
            }),
        };
        merge(&mut cfg, overlay);

        assert_eq!(cfg.log_level.as_deref(), Some("info"));
        let display = cfg.display.unwrap();
        assert_eq!(display.width, Some(128));
        assert_eq!(display.height, Some(128));
        assert_eq!(display.invert, Some(true));
        let text = display.text.unwrap();
        assert_eq!(text.wrap, Some(true));
        assert_eq!(text.transparent, Some(true));
    }

    #[test]
    fn test_cli_overrides_win() {
        let mut cfg = from_yaml();
        let cli = Cli {
            debug: true,
            display_invert: Some(false),
            dc_pin: Some(5),
            spi_speed_hz: Some(8_000_000),
            ..Default::default()
        };
        apply_cli_overrides(&mut cfg, &cli).unwrap();

        assert_eq!(cfg.log_level.as_deref(), Some("debug"));
        let display = cfg.display.unwrap();
        assert_eq!(display.invert, Some(false));
        assert_eq!(display.clocks().write_hz, 8_000_000);
        match display.bus {
            Some(BusConfig::Spi { dc_pin, rst_pin, .. }) => assert_eq!((dc_pin, rst_pin), (5, 25)),
            other => panic!("unexpected bus {:?}", other),
        }
    }

    #[test]
    fn test_emulated_flag_replaces_bus() {
        let mut cfg = from_yaml();
        let cli = Cli { emulated: true, snapshot: Some("out.ppm".into()), ..Default::default() };
        apply_cli_overrides(&mut cfg, &cli).unwrap();
        assert_eq!(
            cfg.display.unwrap().bus,
            Some(BusConfig::Emulated { snapshot: Some("out.ppm".into()) })
        );
    }

    #[test]
    fn test_spi_bus_without_pins_is_rejected() {
        let mut cfg = Config::default();
        let cli = Cli { spi_bus: Some("/dev/spidev0.1".into()), ..Default::default() };
        assert!(matches!(apply_cli_overrides(&mut cfg, &cli), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_ranges() {
        let mut cfg = from_yaml();
        assert!(validate(&cfg).is_ok());

        cfg.display.as_mut().unwrap().width = Some(133);
        assert!(validate(&cfg).is_err());

        let mut cfg = from_yaml();
        cfg.display.as_mut().unwrap().height = Some(0);
        assert!(validate(&cfg).is_err());

        let mut cfg = from_yaml();
        cfg.display.as_mut().unwrap().read_hz = Some(20_000_000);
        assert!(validate(&cfg).is_err());

        let mut cfg = from_yaml();
        if let Some(BusConfig::Spi { bus, .. }) = cfg.display.as_mut().unwrap().bus.as_mut() {
            bus.clear();
        }
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_defaults_describe_the_stock_panel() {
        let display = DisplayConfig::default();
        assert_eq!(display.geometry(), DisplayGeometry::ST7735);
        assert_eq!(display.clocks(), BusClocks::default());
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_dump_round_trips() {
        let cfg = from_yaml();
        let text = dump(&cfg).unwrap();
        let back: Config = serde_yaml::from_str(&text).unwrap();
        assert_eq!(back, cfg);
    }
}
