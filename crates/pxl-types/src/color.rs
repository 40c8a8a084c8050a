use serde::{Deserialize, Serialize};

/// Straight-alpha (non-premultiplied) RGBA color, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self { r: 0, g: 0, b: 0, a: 0 };
    pub const WHITE: Self = Self { r: 255, g: 255, b: 255, a: 255 };

    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn is_transparent(&self) -> bool {
        *self == Self::TRANSPARENT
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 0xFF
    }

    /// Convert to `[r, g, b, a]` floats in 0..=1.
    pub fn to_f32(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }

    /// Convert back from floats, clamping each channel to 0..=1.
    pub fn from_f32(v: [f32; 4]) -> Self {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(q(v[0]), q(v[1]), q(v[2]), q(v[3]))
    }

    /// Channel-wise tint multiply (white is identity).
    pub fn modulate(self, tint: Rgba) -> Self {
        let m = |a: u8, b: u8| ((a as u16 * b as u16 + 127) / 255) as u8;
        Self::new(
            m(self.r, tint.r),
            m(self.g, tint.g),
            m(self.b, tint.b),
            m(self.a, tint.a),
        )
    }
}
