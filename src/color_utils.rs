//! Color utility functions shared across the application.
//!
//! Category colours travel as `#rrggbb` strings; rendering works on [`Rgba`].

use serde::{Deserialize, Serialize};

/// An sRGB colour with 8-bit channels and a float alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    pub const GREEN: Rgba = Rgba::rgb(0, 255, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Same colour with a different alpha.
    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Parse `#rrggbb` (leading `#` optional, case-insensitive).
    pub fn from_hex(hex: &str) -> Option<Self> {
        hex_to_rgb(hex).map(|(r, g, b)| Self::rgb(r, g, b))
    }

    /// `#rrggbb`, alpha dropped.
    pub fn to_hex(&self) -> String {
        rgb_to_hex(self.r, self.g, self.b)
    }

    /// CSS `rgba(...)` notation.
    pub fn to_css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// Parse a `#rrggbb` hex string into its channels.
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
    let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
    let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Format channels as lowercase `#rrggbb`.
pub fn rgb_to_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Darken every channel by `factor` (0.0-1.0), flooring the result.
///
/// Unparseable input is returned unchanged.
pub fn darken(hex: &str, factor: f32) -> String {
    let Some((r, g, b)) = hex_to_rgb(hex) else {
        return hex.to_string();
    };
    let scale = |c: u8| (f32::from(c) * (1.0 - factor)).floor().clamp(0.0, 255.0) as u8;
    rgb_to_hex(scale(r), scale(g), scale(b))
}

/// Parse `hex` and apply `alpha`; unparseable input falls back to green.
pub fn with_alpha(hex: &str, alpha: f32) -> Rgba {
    Rgba::from_hex(hex).unwrap_or(Rgba::GREEN).with_alpha(alpha)
}

/// Black or white, whichever reads better on top of `hex`.
pub fn contrast_color(hex: &str) -> &'static str {
    let Some((r, g, b)) = hex_to_rgb(hex) else {
        return "#000000";
    };
    let brightness = (u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114) / 1000;
    if brightness > 128 { "#000000" } else { "#FFFFFF" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        assert_eq!(hex_to_rgb("#FF6B6B"), Some((255, 107, 107)));
        assert_eq!(hex_to_rgb("4ecdc4"), Some((78, 205, 196)));
        assert_eq!(rgb_to_hex(255, 107, 107), "#ff6b6b");
    }

    #[test]
    fn test_invalid_hex() {
        assert_eq!(hex_to_rgb("#fff"), None);
        assert_eq!(hex_to_rgb("#gg0000"), None);
        assert_eq!(hex_to_rgb(""), None);
    }

    #[test]
    fn test_darken_thirty_percent() {
        // 255 * 0.7 = 178.5 -> 178 (0xb2)
        assert_eq!(darken("#ff0000", 0.3), "#b20000");
        assert_eq!(darken("#000000", 0.3), "#000000");
        assert_eq!(darken("not a colour", 0.3), "not a colour");
    }

    #[test]
    fn test_with_alpha_fallback() {
        let c = with_alpha("bogus", 0.1);
        assert_eq!((c.r, c.g, c.b), (0, 255, 0));
        assert!((c.a - 0.1).abs() < f32::EPSILON);
        assert_eq!(with_alpha("#0000ff", 0.2).to_css(), "rgba(0, 0, 255, 0.2)");
    }

    #[test]
    fn test_contrast_color() {
        assert_eq!(contrast_color("#ffffff"), "#000000");
        assert_eq!(contrast_color("#000080"), "#FFFFFF");
        assert_eq!(contrast_color("???"), "#000000");
    }
}
