use crate::domain::color;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// An RGB color as transmitted to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from floating point components.
    ///
    /// Components are rounded to the nearest integer. Anything outside
    /// `[0, 255]` after rounding is rejected rather than clamped.
    pub fn from_components(r: f64, g: f64, b: f64) -> Result<Self> {
        Ok(Self {
            r: component(r)?,
            g: component(g)?,
            b: component(b)?,
        })
    }

    pub fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

fn component(value: f64) -> Result<u8> {
    let rounded = value.round();
    if !(0.0..=255.0).contains(&rounded) {
        return Err(Error::InvalidColorComponent(value));
    }
    Ok(rounded as u8)
}

/// Requested brightness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Brightness {
    /// Device-native percentage, sent as-is (valid range 1-100).
    Percent(u8),
    /// Host 0-255 scale, scaled and clamped into 1-100.
    Level(u8),
}

impl Brightness {
    pub fn to_percent(self) -> u8 {
        match self {
            Brightness::Percent(p) => p,
            Brightness::Level(level) => color::level_to_percent(level),
        }
    }
}

/// Arguments of a turn-on request. Empty means "just power on".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TurnOn {
    pub brightness: Option<Brightness>,
    pub rgb: Option<Rgb>,
    pub color_temp_kelvin: Option<u16>,
}

impl TurnOn {
    pub fn brightness(mut self, brightness: Brightness) -> Self {
        self.brightness = Some(brightness);
        self
    }

    pub fn rgb(mut self, rgb: Rgb) -> Self {
        self.rgb = Some(rgb);
        self
    }

    pub fn color_temp(mut self, kelvin: u16) -> Self {
        self.color_temp_kelvin = Some(kelvin);
        self
    }

    pub fn has_attributes(&self) -> bool {
        self.brightness.is_some() || self.rgb.is_some() || self.color_temp_kelvin.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ColorMode {
    Brightness,
    ColorTemp,
    Rgb,
}

/// The last state this driver commanded.
///
/// Govee lights never acknowledge a write, so none of this is read back
/// from the device. Fields stay `None` until a command setting them has
/// been dispatched successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LightState {
    pub is_on: Option<bool>,
    /// Brightness in device percent (1-100).
    pub brightness: Option<u8>,
    pub rgb: Option<Rgb>,
    pub color_temp_kelvin: Option<u16>,
    pub color_mode: Option<ColorMode>,
}

impl LightState {
    /// Last commanded brightness on the host 0-255 scale.
    pub fn brightness_level(&self) -> Option<u8> {
        self.brightness.map(color::percent_to_level)
    }
}

/// Connection phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Disconnected,
    Connecting,
    Connected,
    Writing,
}
