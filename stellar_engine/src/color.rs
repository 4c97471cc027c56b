use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{check_window, ConfigError};
use crate::timeline::{lerp, smoothstep};

/// RGB triple in `[0, 1]`. Serialised as a `#rrggbb` literal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const WHITE: Rgb = Rgb {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub fn from_u32(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    pub fn from_hex(literal: &str) -> Result<Self, ConfigError> {
        let digits = literal.strip_prefix('#').unwrap_or(literal);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ConfigError::InvalidColor(literal.to_string()));
        }
        let hex = u32::from_str_radix(digits, 16)
            .map_err(|_| ConfigError::InvalidColor(literal.to_string()))?;
        Ok(Self::from_u32(hex))
    }

    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        Rgb {
            r: lerp(self.r, other.r, t),
            g: lerp(self.g, other.g, t),
            b: lerp(self.b, other.b, t),
        }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let channel = |value: f32| (value.clamp(0.0, 1.0) * 255.0).round() as u8;
        write!(
            f,
            "#{:02x}{:02x}{:02x}",
            channel(self.r),
            channel(self.g),
            channel(self.b)
        )
    }
}

impl TryFrom<String> for Rgb {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgb::from_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

/// Evenly spaced colour stops blended across a smoothed progress window.
///
/// With three stops the first half of the window blends A→B and the second
/// B→C; both halves share B, so the blend is continuous at the midpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorGradient {
    pub stops: Vec<Rgb>,
    pub window: [f32; 2],
}

impl ColorGradient {
    pub fn new(stops: Vec<Rgb>, window: [f32; 2]) -> Self {
        Self { stops, window }
    }

    pub fn validate(&self, target: &str) -> Result<(), ConfigError> {
        if self.stops.len() < 2 {
            return Err(ConfigError::GradientStops {
                target: target.to_string(),
                count: self.stops.len(),
            });
        }
        check_window(
            &format!("colour gradient on {target}"),
            self.window[0],
            self.window[1],
        )
    }

    pub fn sample(&self, progress: f32) -> Rgb {
        match self.stops.as_slice() {
            [] => Rgb::BLACK,
            [only] => *only,
            stops => {
                let s = smoothstep(progress, self.window[0], self.window[1]);
                let spans = (stops.len() - 1) as f32;
                let scaled = s * spans;
                let index = (scaled.floor() as usize).min(stops.len() - 2);
                let local = scaled - index as f32;
                stops[index].lerp(stops[index + 1], local)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red() -> Rgb {
        Rgb::from_u32(0xff4400)
    }

    fn blue() -> Rgb {
        Rgb::from_u32(0x2266cc)
    }

    fn green() -> Rgb {
        Rgb::from_u32(0x22cc66)
    }

    #[test]
    fn hex_literals_round_trip_through_display() {
        let parsed = Rgb::from_hex("#2266cc").expect("valid literal");
        assert_eq!(parsed, blue());
        assert_eq!(parsed.to_string(), "#2266cc");
        assert!(Rgb::from_hex("#12345").is_err());
        assert!(Rgb::from_hex("zzzzzz").is_err());
    }

    #[test]
    fn signed_literals_are_rejected() {
        for literal in ["#+12345", "+12345", "#-12345"] {
            assert!(
                matches!(Rgb::from_hex(literal), Err(ConfigError::InvalidColor(_))),
                "{literal} should not parse"
            );
        }
    }

    #[test]
    fn three_stop_gradient_hits_middle_stop_at_midpoint() {
        let gradient = ColorGradient::new(vec![red(), blue(), green()], [0.5, 0.75]);
        assert_eq!(gradient.sample(0.625), blue());
        assert_eq!(gradient.sample(0.0), red());
        assert_eq!(gradient.sample(0.5), red());
        assert_eq!(gradient.sample(0.75), green());
        assert_eq!(gradient.sample(1.0), green());
    }

    #[test]
    fn gradient_is_continuous_around_midpoint() {
        let gradient = ColorGradient::new(vec![red(), blue(), green()], [0.5, 0.75]);
        let below = gradient.sample(0.625 - 1e-4);
        let above = gradient.sample(0.625 + 1e-4);
        for (a, b) in below.to_array().iter().zip(above.to_array()) {
            assert!((a - b).abs() < 0.01, "jump across midpoint: {a} vs {b}");
        }
    }

    #[test]
    fn gradient_needs_two_stops() {
        let gradient = ColorGradient::new(vec![red()], [0.0, 1.0]);
        assert!(matches!(
            gradient.validate("planet"),
            Err(ConfigError::GradientStops { count: 1, .. })
        ));
    }

    #[test]
    fn colours_deserialize_from_hex_strings() {
        let gradient: ColorGradient =
            serde_json::from_str(r##"{"stops":["#ff4400","#000000"],"window":[0.5,0.75]}"##)
                .expect("gradient parses");
        assert_eq!(gradient.stops, vec![red(), Rgb::BLACK]);
    }
}
