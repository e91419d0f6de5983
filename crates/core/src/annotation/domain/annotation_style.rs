use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::shared::constants::STROKE_WIDTH;

#[derive(Error, Debug, PartialEq)]
#[error("invalid color '{0}': expected #RRGGBB")]
pub struct ColorParseError(pub String);

/// An 8-bit RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const GREEN: Rgb = Rgb([0, 255, 0]);
    pub const BLUE: Rgb = Rgb([0, 0, 255]);
    pub const YELLOW: Rgb = Rgb([255, 255, 0]);
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    /// Accepts `#RRGGBB` or `RRGGBB`, any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ColorParseError(s.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ColorParseError(s.to_string()))
        };
        Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02X}{g:02X}{b:02X}")
    }
}

/// Colors and stroke used to outline detections.
///
/// Only the face color is user-selectable; eyes are always blue and
/// smiles yellow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnnotationStyle {
    pub face_color: Rgb,
    pub eyes_color: Rgb,
    pub smile_color: Rgb,
    pub stroke_width: u32,
}

impl AnnotationStyle {
    pub fn with_face_color(face_color: Rgb) -> Self {
        Self {
            face_color,
            ..Self::default()
        }
    }
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            face_color: Rgb::GREEN,
            eyes_color: Rgb::BLUE,
            smile_color: Rgb::YELLOW,
            stroke_width: STROKE_WIDTH,
        }
    }
}
