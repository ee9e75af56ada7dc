//! Colors and the named color scales used by the built-in parameters.

use serde::{Deserialize, Serialize};

/// RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    /// Parse from hex string (#RRGGBB or #RRGGBBAA).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }
}

/// A named color ramp over the normalized range `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScale {
    /// White through blues to purple, for rain rates
    Precipitation,
    /// Purple through blue, green and yellow to dark red
    Temperature,
    /// Gray through cyan and yellow to dark red
    WindSpeed,
    /// Indigo through green to red
    Pressure,
}

const PRECIPITATION_STOPS: &[(f32, Color)] = &[
    (0.0, Color::rgb(255, 255, 255)),
    (0.1, Color::rgb(198, 219, 239)),
    (0.3, Color::rgb(107, 174, 214)),
    (0.5, Color::rgb(33, 113, 181)),
    (0.7, Color::rgb(8, 48, 107)),
    (1.0, Color::rgb(84, 39, 143)),
];

const TEMPERATURE_STOPS: &[(f32, Color)] = &[
    (0.0, Color::rgb(25, 0, 76)),
    (0.2, Color::rgb(0, 0, 255)),
    (0.4, Color::rgb(0, 255, 255)),
    (0.5, Color::rgb(0, 255, 0)),
    (0.6, Color::rgb(255, 255, 0)),
    (0.75, Color::rgb(255, 165, 0)),
    (0.9, Color::rgb(255, 0, 0)),
    (1.0, Color::rgb(139, 0, 0)),
];

const WIND_SPEED_STOPS: &[(f32, Color)] = &[
    (0.0, Color::rgb(200, 200, 200)),
    (0.25, Color::rgb(0, 200, 255)),
    (0.5, Color::rgb(255, 255, 0)),
    (0.75, Color::rgb(255, 165, 0)),
    (1.0, Color::rgb(139, 0, 0)),
];

const PRESSURE_STOPS: &[(f32, Color)] = &[
    (0.0, Color::rgb(75, 0, 130)),
    (0.2, Color::rgb(0, 0, 255)),
    (0.4, Color::rgb(0, 255, 0)),
    (0.6, Color::rgb(255, 255, 0)),
    (0.8, Color::rgb(255, 0, 0)),
    (1.0, Color::rgb(139, 0, 0)),
];

impl ColorScale {
    /// Color stops as (position in `[0, 1]`, color), ascending by position.
    pub fn stops(&self) -> &'static [(f32, Color)] {
        match self {
            ColorScale::Precipitation => PRECIPITATION_STOPS,
            ColorScale::Temperature => TEMPERATURE_STOPS,
            ColorScale::WindSpeed => WIND_SPEED_STOPS,
            ColorScale::Pressure => PRESSURE_STOPS,
        }
    }
}
