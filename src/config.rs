//! Style configuration consumed by one render call.
//!
//! The interactive control surface (or the CLI) produces one of these per
//! export. All percentage fields arrive pre-clamped by well-behaved callers,
//! but nothing here assumes that: every numeric is clamped again at its point
//! of use so hostile values degrade instead of panicking.

use crate::foundation::core::Rgba8Premul;
use serde::{Deserialize, Serialize};

/// Fixed set of output aspect ratios; `Auto` follows the source image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "16:9")]
    Wide16x9,
    #[serde(rename = "9:16")]
    Tall9x16,
    #[serde(rename = "4:3")]
    Classic4x3,
    #[serde(rename = "3:4")]
    Classic3x4,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "auto")]
    Auto,
}

impl AspectRatio {
    /// Nominal width/height value, or `None` for `Auto`.
    pub fn nominal(self) -> Option<f64> {
        match self {
            Self::Wide16x9 => Some(16.0 / 9.0),
            Self::Tall9x16 => Some(9.0 / 16.0),
            Self::Classic4x3 => Some(4.0 / 3.0),
            Self::Classic3x4 => Some(3.0 / 4.0),
            Self::Square => Some(1.0),
            Self::Auto => None,
        }
    }
}

/// Visual treatment applied to the framed image.
///
/// A closed set dispatched once per render; each style is a fixed sequence of
/// drawing calls over the shared placement geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameStyle {
    #[default]
    Default,
    Glass,
    Stack,
}

/// Background treatment behind the framed image.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Background {
    Solid {
        color: ColorDef,
    },
    Gradient {
        start: ColorDef,
        end: ColorDef,
        /// Degrees, 0 points up, growing clockwise.
        #[serde(default)]
        angle: f64,
    },
}

/// Immutable per-render style. See module docs for clamping policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub aspect_ratio: AspectRatio,
    /// Percent 0..=100 of the margin budget (40% of the min canvas dimension).
    pub padding: f64,
    /// Percent 0..=100 of the radius budget (8% of the min canvas dimension).
    pub border_radius: f64,
    /// Percent 0..=100 of the shadow budget (15% blur / 6% offset of min dim).
    pub shadow: f64,
    pub frame_style: FrameStyle,
    pub background: Background,
    /// Grain intensity 0..=1; 0 skips the noise stage entirely.
    pub noise_opacity: f64,
    /// Grain coarseness 0..=1; larger values repeat the tile less often.
    pub noise_roughness: f64,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            aspect_ratio: AspectRatio::Auto,
            padding: 10.0,
            border_radius: 10.0,
            shadow: 0.0,
            frame_style: FrameStyle::Default,
            background: Background::Gradient {
                start: ColorDef::rgba(0xbd as f64 / 255.0, 0xc3 as f64 / 255.0, 0xc7 as f64 / 255.0, 1.0),
                end: ColorDef::rgba(0x2c as f64 / 255.0, 0x3e as f64 / 255.0, 0x50 as f64 / 255.0, 1.0),
                angle: 135.0,
            },
            noise_opacity: 0.1,
            noise_roughness: 0.4,
        }
    }
}

impl StyleConfig {
    /// Reject configurations whose numerics cannot be clamped meaningfully.
    pub(crate) fn ensure_finite(&self) -> Result<(), String> {
        let mut fields = vec![
            ("padding", self.padding),
            ("border_radius", self.border_radius),
            ("shadow", self.shadow),
            ("noise_opacity", self.noise_opacity),
            ("noise_roughness", self.noise_roughness),
        ];
        if let Background::Gradient { angle, .. } = self.background {
            fields.push(("background.angle", angle));
        }
        for (name, v) in fields {
            if !v.is_finite() {
                return Err(format!("{name} must be finite, got {v}"));
            }
        }
        Ok(())
    }
}

/// Color in normalized sRGB floats, deserializable from hex strings,
/// `{r,g,b,a}` objects, or `[r,g,b(,a)]` arrays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorDef {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl ColorDef {
    pub fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub(crate) fn to_rgba8_premul(self) -> Rgba8Premul {
        let [r, g, b, a] = self.to_straight_rgba8();
        Rgba8Premul::from_straight_rgba(r, g, b, a)
    }

    pub(crate) fn to_straight_rgba8(self) -> [u8; 4] {
        fn to_u8(x: f64) -> u8 {
            (x.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        [to_u8(self.r), to_u8(self.g), to_u8(self.b), to_u8(self.a)]
    }
}

impl<'de> Deserialize<'de> for ColorDef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Hex(String),
            RgbaObj {
                r: f64,
                g: f64,
                b: f64,
                #[serde(default = "one")]
                a: f64,
            },
            Arr(Vec<f64>),
        }

        fn one() -> f64 {
            1.0
        }

        match Repr::deserialize(deserializer)? {
            Repr::Hex(s) => parse_hex(&s).map_err(serde::de::Error::custom),
            Repr::RgbaObj { r, g, b, a } => Ok(Self::rgba(r, g, b, a)),
            Repr::Arr(v) => {
                if v.len() == 3 {
                    Ok(Self::rgba(v[0], v[1], v[2], 1.0))
                } else if v.len() == 4 {
                    Ok(Self::rgba(v[0], v[1], v[2], v[3]))
                } else {
                    Err(serde::de::Error::custom(
                        "rgba array must have len 3 ([r,g,b]) or 4 ([r,g,b,a])",
                    ))
                }
            }
        }
    }
}

fn parse_hex(s: &str) -> Result<ColorDef, String> {
    let s = s.trim();
    let s = s.strip_prefix('#').unwrap_or(s);

    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    let (r, g, b, a) = match s.len() {
        6 => {
            let r = hex_byte(&s[0..2])?;
            let g = hex_byte(&s[2..4])?;
            let b = hex_byte(&s[4..6])?;
            (r, g, b, 255)
        }
        8 => {
            let r = hex_byte(&s[0..2])?;
            let g = hex_byte(&s[2..4])?;
            let b = hex_byte(&s[4..6])?;
            let a = hex_byte(&s[6..8])?;
            (r, g, b, a)
        }
        _ => {
            return Err("hex color must be #RRGGBB or #RRGGBBAA (case-insensitive)".to_owned());
        }
    };

    Ok(ColorDef::rgba(
        (r as f64) / 255.0,
        (g as f64) / 255.0,
        (b as f64) / 255.0,
        (a as f64) / 255.0,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_hex_rgb_and_rgba() {
        let c: ColorDef = serde_json::from_value(json!("#ff0000")).unwrap();
        assert_eq!(c, ColorDef::rgba(1.0, 0.0, 0.0, 1.0));

        let c: ColorDef = serde_json::from_value(json!("#0000ff80")).unwrap();
        assert!((c.b - 1.0).abs() < 1e-9);
        assert!((c.a - (128.0 / 255.0)).abs() < 1e-9);
    }

    #[test]
    fn parses_rgba_object_and_array() {
        let c: ColorDef = serde_json::from_value(json!({"r": 0.25, "g": 0.5, "b": 0.75})).unwrap();
        assert_eq!(c, ColorDef::rgba(0.25, 0.5, 0.75, 1.0));

        let c: ColorDef = serde_json::from_value(json!([0.25, 0.5, 0.75, 0.9])).unwrap();
        assert_eq!(c, ColorDef::rgba(0.25, 0.5, 0.75, 0.9));
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(serde_json::from_value::<ColorDef>(json!("#12345")).is_err());
        assert!(serde_json::from_value::<ColorDef>(json!("#zzzzzz")).is_err());
    }

    #[test]
    fn aspect_ratio_names_round_trip() {
        for (s, r) in [
            ("16:9", AspectRatio::Wide16x9),
            ("9:16", AspectRatio::Tall9x16),
            ("4:3", AspectRatio::Classic4x3),
            ("3:4", AspectRatio::Classic3x4),
            ("1:1", AspectRatio::Square),
            ("auto", AspectRatio::Auto),
        ] {
            let parsed: AspectRatio = serde_json::from_value(json!(s)).unwrap();
            assert_eq!(parsed, r);
        }
        assert!(serde_json::from_value::<AspectRatio>(json!("21:9")).is_err());
    }

    #[test]
    fn default_config_matches_control_panel_defaults() {
        let c = StyleConfig::default();
        assert_eq!(c.aspect_ratio, AspectRatio::Auto);
        assert_eq!(c.padding, 10.0);
        assert_eq!(c.frame_style, FrameStyle::Default);
        assert!(matches!(c.background, Background::Gradient { angle, .. } if angle == 135.0));
    }

    #[test]
    fn non_finite_numeric_is_rejected() {
        let mut c = StyleConfig::default();
        c.padding = f64::NAN;
        assert!(c.ensure_finite().is_err());
        c.padding = 10.0;
        assert!(c.ensure_finite().is_ok());
    }

    #[test]
    fn config_json_parses_partial_objects() {
        let c: StyleConfig = serde_json::from_value(json!({
            "aspect_ratio": "1:1",
            "background": {"type": "solid", "color": "#18181b"},
            "shadow": 35
        }))
        .unwrap();
        assert_eq!(c.aspect_ratio, AspectRatio::Square);
        assert_eq!(c.shadow, 35.0);
        // Unspecified fields keep their defaults.
        assert_eq!(c.padding, 10.0);
    }
}
