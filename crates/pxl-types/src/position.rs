use std::io::{self, Read, Write};
use std::ops::{Add, AddAssign, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::wire;

/// 2D integer position/offset in world or origin space.
///
/// Used for sprite origins, gameplay position deltas, shadow offsets and
/// attachment points. All coordinates are whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ZERO: Self = Self { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Mirror around the vertical axis (x negated, y unchanged).
    pub fn flip_x(self) -> Self {
        Self { x: -self.x, y: self.y }
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        wire::write_i32_le(writer, self.x)?;
        wire::write_i32_le(writer, self.y)
    }

    pub fn read<R: Read>(reader: &mut R) -> io::Result<Self> {
        let x = wire::read_i32_le(reader)?;
        let y = wire::read_i32_le(reader)?;
        Ok(Self { x, y })
    }
}

impl Add for Position {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Position {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Position {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Position {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}
