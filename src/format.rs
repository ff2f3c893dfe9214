//! Display-ready palette entries.

use palette::Srgb;
use serde::Serialize;

use crate::{
    color::{Pixel, luminance},
    error::Error,
};

/// Luminance above which a swatch counts as light (dark text reads on it).
pub const LIGHT_THRESHOLD: f64 = 128.0;

/// A palette entry as handed to the display layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaletteColor {
    pub rgb: [u8; 3],
    /// `#rrggbb`, lower-case.
    pub hex: String,
    pub is_light: bool,
}

impl PaletteColor {
    pub fn new(color: Pixel) -> Self {
        Self {
            rgb: [color.red, color.green, color.blue],
            hex: hex_of(color),
            is_light: is_light(color),
        }
    }

    /// Builds an entry from unbounded channel values, clamping each to
    /// `0..=255` and rounding to the nearest integer. NaN becomes 0.
    pub fn from_channels(red: f64, green: f64, blue: f64) -> Self {
        let channel = |x: f64| {
            if x.is_nan() {
                0
            } else {
                x.clamp(0.0, 255.0).round() as u8
            }
        };
        Self::new(Srgb::new(channel(red), channel(green), channel(blue)))
    }

    pub fn color(&self) -> Pixel {
        let [r, g, b] = self.rgb;
        Srgb::new(r, g, b)
    }
}

impl From<Pixel> for PaletteColor {
    fn from(color: Pixel) -> Self {
        Self::new(color)
    }
}

/// `#` followed by two lower-case hex digits per channel.
pub fn hex_of(color: Pixel) -> String {
    format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}

/// Parses `#rrggbb` (the `#` is optional) back into a color.
pub fn parse_hex(hex: &str) -> Result<Pixel, Error> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::InvalidHex(hex.to_owned()));
    }
    digits
        .parse::<Srgb<u8>>()
        .map_err(|_| Error::InvalidHex(hex.to_owned()))
}

/// Strictly brighter than [`LIGHT_THRESHOLD`].
pub fn is_light(color: Pixel) -> bool {
    luminance(color) > LIGHT_THRESHOLD
}

/// Annotates each color for display, keeping the input order.
pub fn format(colors: &[Pixel]) -> Vec<PaletteColor> {
    colors.iter().copied().map(PaletteColor::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_zero_padded_lower_case() {
        assert_eq!(hex_of(Srgb::new(0, 0, 0)), "#000000");
        assert_eq!(hex_of(Srgb::new(255, 10, 171)), "#ff0aab");
        assert_eq!(hex_of(Srgb::new(1, 2, 3)), "#010203");
    }

    #[test]
    fn hex_round_trips_every_channel_value() {
        for v in 0..=255u8 {
            let color = Srgb::new(v, 255 - v, v.wrapping_mul(37));
            let hex = hex_of(color);
            assert_eq!(hex.len(), 7);
            assert!(hex.starts_with('#'));
            assert!(
                hex[1..]
                    .chars()
                    .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
            );
            assert_eq!(parse_hex(&hex).unwrap(), color);
        }
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(parse_hex("#fff").is_err());
        assert!(parse_hex("#12345g").is_err());
        assert!(parse_hex("").is_err());
        assert!(parse_hex("#aébcd").is_err());
        assert!(parse_hex("ab€cd").is_err());
        assert!(parse_hex("#+1a2b3").is_err());
        assert_eq!(parse_hex("ABCDEF").unwrap(), Srgb::new(0xab, 0xcd, 0xef));
    }

    #[test]
    fn light_threshold_is_strict() {
        // The weights sum to one, so a gray sits at its own channel value.
        assert!(!is_light(Srgb::new(128, 128, 128)));
        assert!(is_light(Srgb::new(129, 129, 129)));
        assert!(is_light(Srgb::new(255, 255, 255)));
        assert!(!is_light(Srgb::new(0, 0, 0)));
    }

    #[test]
    fn clamps_and_rounds_raw_channels() {
        let color = PaletteColor::from_channels(-12.0, 127.6, 300.0);
        assert_eq!(color.rgb, [0, 128, 255]);
        assert_eq!(color.hex, "#0080ff");
        assert_eq!(PaletteColor::from_channels(f64::NAN, 0.4, 254.5).rgb, [0, 0, 255]);
    }

    #[test]
    fn keeps_input_order() {
        let colors = [Srgb::new(0, 0, 0), Srgb::new(255, 255, 255)];
        let formatted = format(&colors);
        assert_eq!(formatted[0].hex, "#000000");
        assert!(!formatted[0].is_light);
        assert_eq!(formatted[1].hex, "#ffffff");
        assert!(formatted[1].is_light);
        assert_eq!(formatted[1].color(), colors[1]);
    }

    #[test]
    fn serializes_with_display_field_names() {
        let json = serde_json::to_string(&PaletteColor::new(Srgb::new(200, 200, 200))).unwrap();
        assert_eq!(json, r##"{"rgb":[200,200,200],"hex":"#c8c8c8","isLight":true}"##);
    }
}
