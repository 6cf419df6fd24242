// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Value-to-color ramp for field points.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An sRGB color. Serialized as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Debug, Error)]
#[error("invalid hex color '{0}', expected #rrggbb")]
pub struct InvalidColor(pub String);

impl FromStr for Rgb {
    type Err = InvalidColor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(InvalidColor(s.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_parse| InvalidColor(s.to_string()))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = InvalidColor;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// One breakpoint of a [`ColorRamp`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub value: f64,
    pub color: Rgb,
}

/// Piecewise-linear color ramp over ascending breakpoints.
///
/// Values below the first stop take the first color and values above the
/// last stop take the last color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorRamp {
    pub stops: Vec<ColorStop>,
}

impl Default for ColorRamp {
    fn default() -> Self {
        // Blue (cold) to red (warm), in the variable's native units
        Self {
            stops: vec![
                ColorStop { value: -10.0, color: Rgb::new(0x2c, 0x7b, 0xb6) },
                ColorStop { value: 0.0, color: Rgb::new(0xab, 0xd9, 0xe9) },
                ColorStop { value: 10.0, color: Rgb::new(0xff, 0xff, 0xbf) },
                ColorStop { value: 20.0, color: Rgb::new(0xfd, 0xae, 0x61) },
                ColorStop { value: 30.0, color: Rgb::new(0xd7, 0x19, 0x1c) },
            ],
        }
    }
}

impl ColorRamp {
    const FALLBACK: Rgb = Rgb::new(128, 128, 128);

    /// Color for a value.
    #[must_use]
    pub fn color_at(&self, value: f64) -> Rgb {
        let (Some(first), Some(last)) = (self.stops.first(), self.stops.last()) else {
            return Self::FALLBACK;
        };

        if value.is_nan() || value <= first.value {
            return first.color;
        }
        if value >= last.value {
            return last.color;
        }

        for pair in self.stops.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if value >= lo.value && value <= hi.value {
                let span = hi.value - lo.value;
                let t = if span > 0.0 { (value - lo.value) / span } else { 0.0 };
                return Rgb::new(
                    lerp(lo.color.r, hi.color.r, t),
                    lerp(lo.color.g, hi.color.g, t),
                    lerp(lo.color.b, hi.color.b, t),
                );
            }
        }

        // Unsorted stops
        last.color
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, reason = "result is clamped to 0..=255")]
fn lerp(a: u8, b: u8, t: f64) -> u8 {
    let v = f64::from(a) + (f64::from(b) - f64::from(a)) * t;
    v.round().clamp(0.0, 255.0) as u8
}
