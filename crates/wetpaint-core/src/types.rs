//! Color and shape types

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An 8-bit-per-channel particle color
///
/// Serialized as a `#RRGGBB` or `#RRGGBBAA` hex string so palettes read
/// naturally in config files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ParticleColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ParticleColor {
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Unpack a color stored as a 32-bit ABGR integer (alpha in the high byte)
    pub fn from_abgr(packed: u32) -> Self {
        Self {
            a: (packed >> 24) as u8,
            b: (packed >> 16) as u8,
            g: (packed >> 8) as u8,
            r: packed as u8,
        }
    }

    /// Pack into a 32-bit ABGR integer
    pub fn to_abgr(self) -> u32 {
        (self.a as u32) << 24 | (self.b as u32) << 16 | (self.g as u32) << 8 | self.r as u32
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        match digits.len() {
            6 => Some(Self::new(channel(0)?, channel(2)?, channel(4)?, 255)),
            8 => Some(Self::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }

    /// Move both colors toward each other by `strength` of their difference.
    ///
    /// Integer mixing, so repeated application converges without drifting.
    pub fn mix(&mut self, other: &mut Self, strength: f32) {
        let factor = (strength.clamp(0.0, 1.0) * 256.0) as i32;
        let mut blend = |a: &mut u8, b: &mut u8| {
            let delta = (factor * (*b as i32 - *a as i32)) >> 8;
            *a = (*a as i32 + delta) as u8;
            *b = (*b as i32 - delta) as u8;
        };
        blend(&mut self.r, &mut other.r);
        blend(&mut self.g, &mut other.g);
        blend(&mut self.b, &mut other.b);
        blend(&mut self.a, &mut other.a);
    }
}

impl Default for ParticleColor {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for ParticleColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for ParticleColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value).ok_or_else(|| format!("invalid color '{}'", value))
    }
}

impl From<ParticleColor> for String {
    fn from(color: ParticleColor) -> Self {
        color.to_string()
    }
}

/// A circle in world space; the footprint of every brush stamp
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        self.center.distance_squared(point) <= self.radius * self.radius
    }

    /// Axis-aligned bounds as (min, max)
    pub fn aabb(&self) -> (Vec2, Vec2) {
        let extent = Vec2::splat(self.radius);
        (self.center - extent, self.center + extent)
    }

    pub fn aabb_contains(&self, point: Vec2) -> bool {
        let (min, max) = self.aabb();
        point.cmpge(min).all() && point.cmple(max).all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abgr_unpacking() {
        let color = ParticleColor::from_abgr(0xFF33_2211);
        assert_eq!(color, ParticleColor::new(0x11, 0x22, 0x33, 0xFF));
        assert_eq!(color.to_abgr(), 0xFF33_2211);
    }

    #[test]
    fn test_hex_parsing() {
        assert_eq!(
            ParticleColor::from_hex("#ff8000"),
            Some(ParticleColor::new(255, 128, 0, 255))
        );
        assert_eq!(
            ParticleColor::from_hex("10203040"),
            Some(ParticleColor::new(0x10, 0x20, 0x30, 0x40))
        );
        assert_eq!(ParticleColor::from_hex("#fff"), None);
        assert_eq!(ParticleColor::from_hex("#gg0000"), None);
    }

    #[test]
    fn test_display_roundtrip_through_serde() {
        let color = ParticleColor::new(1, 2, 3, 4);
        let json = serde_json::to_string(&color).unwrap();
        assert_eq!(json, "\"#01020304\"");
        let back: ParticleColor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, color);
    }

    #[test]
    fn test_mixing_moves_colors_together() {
        let mut a = ParticleColor::new(0, 0, 0, 255);
        let mut b = ParticleColor::new(200, 100, 40, 255);
        a.mix(&mut b, 0.25);
        assert_eq!(a, ParticleColor::new(50, 25, 10, 255));
        assert_eq!(b, ParticleColor::new(150, 75, 30, 255));
    }

    #[test]
    fn test_circle_containment() {
        let circle = Circle::new(Vec2::new(1.0, 1.0), 0.5);
        assert!(circle.contains(Vec2::new(1.3, 1.3)));
        assert!(!circle.contains(Vec2::new(1.4, 1.4)));
        // Corners of the bounding box are outside the circle but inside the AABB
        assert!(circle.aabb_contains(Vec2::new(1.45, 1.45)));
    }
}
