use std::io::{self, Read, Write};

use anyhow::{Result, ensure};

use crate::Rect;
use crate::wire;

/// Bit-per-pixel occupancy buffer with an explicit bounding rectangle.
///
/// Bits are packed row-major, `ceil(width / 8)` bytes per row, LSB first
/// within a byte. A width or height of zero denotes the empty mask.
/// Coordinates are addressed in the same local space as the bounds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MaskData {
    bounds: Rect,
    bits: Vec<u8>,
}

impl MaskData {
    /// Allocate a cleared mask covering `bounds`.
    pub fn new(bounds: Rect) -> Self {
        if bounds.is_empty() {
            return Self::default();
        }
        Self {
            bits: vec![0u8; Self::row_bytes(bounds.width) * bounds.height as usize],
            bounds,
        }
    }

    fn row_bytes(width: i32) -> usize {
        (width as usize).div_ceil(8)
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn width(&self) -> i32 {
        self.bounds.width
    }

    pub fn height(&self) -> i32 {
        self.bounds.height
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    fn bit_index(&self, x: i32, y: i32) -> Option<(usize, u8)> {
        if !self.bounds.contains_point(x, y) {
            return None;
        }
        let col = (x - self.bounds.x) as usize;
        let row = (y - self.bounds.y) as usize;
        let byte = row * Self::row_bytes(self.bounds.width) + col / 8;
        Some((byte, 1u8 << (col % 8)))
    }

    /// Bit at the given coordinates; `false` outside the bounds.
    pub fn get(&self, x: i32, y: i32) -> bool {
        match self.bit_index(x, y) {
            Some((byte, mask)) => self.bits[byte] & mask != 0,
            None => false,
        }
    }

    /// Set or clear a bit. Coordinates must lie inside the bounds.
    pub fn set(&mut self, x: i32, y: i32, value: bool) {
        let (byte, mask) = match self.bit_index(x, y) {
            Some(v) => v,
            None => panic!("MaskData::set out of bounds: ({x}, {y}) not in {:?}", self.bounds),
        };
        if value {
            self.bits[byte] |= mask;
        } else {
            self.bits[byte] &= !mask;
        }
    }

    /// OR every set bit of `other` into this mask at its own coordinates.
    ///
    /// Fails unless `other`'s bounds lie fully inside this mask's bounds;
    /// merge destinations are sized to the union of their sources, so a
    /// violation means the destination was built wrong.
    pub fn bitwise_or_from(&mut self, other: &MaskData) -> Result<()> {
        ensure!(
            self.bounds.contains_rect(&other.bounds),
            "Mask merge bounds violation: {:?} not contained in {:?}",
            other.bounds,
            self.bounds
        );
        for y in other.bounds.top()..other.bounds.bottom() {
            for x in other.bounds.left()..other.bounds.right() {
                if other.get(x, y) {
                    self.set(x, y, true);
                }
            }
        }
        Ok(())
    }

    /// Count of set bits.
    pub fn count_set(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.bounds.write(writer)?;
        writer.write_all(&self.bits)
    }

    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let bounds = Rect::read(reader)?;
        ensure!(
            bounds.width >= 0 && bounds.height >= 0,
            "Invalid mask bounds: {bounds:?}"
        );
        if bounds.is_empty() {
            return Ok(Self { bounds, bits: Vec::new() });
        }
        let mut bits = vec![0u8; Self::row_bytes(bounds.width) * bounds.height as usize];
        reader.read_exact(&mut bits)?;
        Ok(Self { bounds, bits })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get() {
        let mut m = MaskData::new(Rect::new(-4, -4, 8, 8));
        assert!(!m.get(-4, -4));
        m.set(-4, -4, true);
        m.set(3, 3, true);
        assert!(m.get(-4, -4));
        assert!(m.get(3, 3));
        assert!(!m.get(0, 0));
        m.set(3, 3, false);
        assert!(!m.get(3, 3));
        // Out of bounds reads as unset
        assert!(!m.get(100, 100));
    }

    #[test]
    fn test_or_from_merges_at_offsets() {
        let mut dst = MaskData::new(Rect::new(-8, -8, 16, 16));
        let mut a = MaskData::new(Rect::new(-8, -8, 4, 4));
        let mut b = MaskData::new(Rect::new(4, 4, 4, 4));
        a.set(-8, -8, true);
        b.set(7, 7, true);

        dst.bitwise_or_from(&a).unwrap();
        dst.bitwise_or_from(&b).unwrap();

        assert!(dst.get(-8, -8));
        assert!(dst.get(7, 7));
        assert_eq!(dst.count_set(), 2);
    }

    #[test]
    fn test_or_from_rejects_uncontained() {
        let mut dst = MaskData::new(Rect::new(0, 0, 4, 4));
        let src = MaskData::new(Rect::new(2, 2, 4, 4));
        assert!(dst.bitwise_or_from(&src).is_err());
    }

    #[test]
    fn test_or_from_empty_source_is_noop() {
        let mut dst = MaskData::new(Rect::new(0, 0, 4, 4));
        dst.bitwise_or_from(&MaskData::default()).unwrap();
        assert_eq!(dst.count_set(), 0);
    }

    #[test]
    fn test_wire_round_trip_odd_width() {
        // 13 wide: two bytes per row with padding bits
        let mut m = MaskData::new(Rect::new(-6, 0, 13, 3));
        m.set(-6, 0, true);
        m.set(6, 2, true);
        m.set(0, 1, true);

        let mut buf = Vec::new();
        m.write(&mut buf).unwrap();
        // 16 bounds bytes + 2 bytes/row * 3 rows
        assert_eq!(buf.len(), 16 + 6);

        let back = MaskData::read(&mut buf.as_slice()).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_wire_round_trip_empty() {
        let m = MaskData::default();
        let mut buf = Vec::new();
        m.write(&mut buf).unwrap();
        assert_eq!(buf.len(), 16);
        let back = MaskData::read(&mut buf.as_slice()).unwrap();
        assert!(back.is_empty());
    }
}
