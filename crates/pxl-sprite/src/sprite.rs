use std::io::{self, Read, Write};
use std::sync::Arc;

use anyhow::{Result, ensure};
use image::RgbaImage;

use pxl_types::{Data2D, MaskData, Position, Rect, Rgba, wire};

/// A drawable region of a shared RGBA image with a drawing origin.
///
/// The origin is the pixel within the source region that sits at the world
/// position when the sprite is drawn, so the sprite's world-space bounds are
/// `(-origin.x, -origin.y, width, height)`.
#[derive(Debug, Clone)]
pub struct Sprite {
    pub image: Arc<RgbaImage>,
    pub source_rect: Rect,
    pub origin: Position,
}

impl Sprite {
    pub fn new(image: Arc<RgbaImage>, source_rect: Rect, origin: Position) -> Self {
        Self { image, source_rect, origin }
    }

    /// Build a single-color sprite backed by its own image. Handy for
    /// placeholders and test fixtures.
    pub fn solid(width: u32, height: u32, origin: Position, color: Rgba) -> Self {
        let image = RgbaImage::from_pixel(
            width,
            height,
            image::Rgba([color.r, color.g, color.b, color.a]),
        );
        Self::new(
            Arc::new(image),
            Rect::new(0, 0, width as i32, height as i32),
            origin,
        )
    }

    pub fn width(&self) -> i32 {
        self.source_rect.width
    }

    pub fn height(&self) -> i32 {
        self.source_rect.height
    }

    /// World-space bounds when drawn at the world origin, unflipped.
    pub fn world_bounds(&self) -> Rect {
        Rect::new(-self.origin.x, -self.origin.y, self.width(), self.height())
    }

    /// Source pixel at local coordinates within the source region.
    /// Out-of-range coordinates read as transparent.
    pub fn pixel(&self, x: i32, y: i32) -> Rgba {
        if x < 0 || y < 0 || x >= self.width() || y >= self.height() {
            return Rgba::TRANSPARENT;
        }
        let px = (self.source_rect.x + x) as u32;
        let py = (self.source_rect.y + y) as u32;
        match self.image.get_pixel_checked(px, py) {
            Some(p) => Rgba::new(p.0[0], p.0[1], p.0[2], p.0[3]),
            None => Rgba::TRANSPARENT,
        }
    }

    /// Occupancy mask in world space: a bit is set wherever the source pixel
    /// has non-zero alpha. Bounds equal `world_bounds()`.
    pub fn alpha_mask(&self) -> MaskData {
        let bounds = self.world_bounds();
        let mut mask = MaskData::new(bounds);
        for y in 0..self.height() {
            for x in 0..self.width() {
                if self.pixel(x, y).a != 0 {
                    mask.set(x - self.origin.x, y - self.origin.y, true);
                }
            }
        }
        mask
    }

    /// Copy of the source region as a world-space color buffer.
    pub fn color_data(&self) -> Data2D<Rgba> {
        let bounds = self.world_bounds();
        let mut data = Data2D::with_bounds(bounds);
        for y in 0..self.height() {
            for x in 0..self.width() {
                data.set(x - self.origin.x, y - self.origin.y, self.pixel(x, y));
            }
        }
        data
    }

    /// Write the sprite in place: dimensions, origin, then the source region's
    /// RGBA bytes row-major.
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        wire::write_i32_le(writer, self.width())?;
        wire::write_i32_le(writer, self.height())?;
        self.origin.write(writer)?;
        for y in 0..self.height() {
            for x in 0..self.width() {
                let p = self.pixel(x, y);
                writer.write_all(&[p.r, p.g, p.b, p.a])?;
            }
        }
        Ok(())
    }

    /// Read an in-place sprite. The result owns a fresh image whose source
    /// region starts at (0, 0).
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let width = wire::read_i32_le(reader)?;
        let height = wire::read_i32_le(reader)?;
        ensure!(
            width >= 0 && height >= 0,
            "Invalid sprite dimensions: {width}x{height}"
        );
        let origin = Position::read(reader)?;
        let mut pixels = vec![0u8; (width * height * 4) as usize];
        reader.read_exact(&mut pixels)?;
        let image = RgbaImage::from_raw(width as u32, height as u32, pixels)
            .expect("buffer length matches dimensions");
        Ok(Self {
            image: Arc::new(image),
            source_rect: Rect::new(0, 0, width, height),
            origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker_sprite(size: u32, origin: Position) -> Sprite {
        let mut img = RgbaImage::new(size, size);
        for y in 0..size {
            for x in 0..size {
                let on = (x + y) % 2 == 0;
                let px = if on { [255, 0, 0, 255] } else { [0, 0, 0, 0] };
                img.put_pixel(x, y, image::Rgba(px));
            }
        }
        Sprite::new(
            Arc::new(img),
            Rect::new(0, 0, size as i32, size as i32),
            origin,
        )
    }

    #[test]
    fn test_world_bounds() {
        let s = checker_sprite(32, Position::new(16, 16));
        assert_eq!(s.world_bounds(), Rect::new(-16, -16, 32, 32));
    }

    #[test]
    fn test_alpha_mask_matches_pixels() {
        let s = checker_sprite(4, Position::new(2, 2));
        let mask = s.alpha_mask();
        assert_eq!(mask.bounds(), Rect::new(-2, -2, 4, 4));
        // (0,0) in source space is opaque, maps to (-2,-2) in world space
        assert!(mask.get(-2, -2));
        assert!(!mask.get(-1, -2));
        assert_eq!(mask.count_set(), 8);
    }

    #[test]
    fn test_sub_region_pixel_access() {
        let mut img = RgbaImage::new(8, 8);
        img.put_pixel(5, 6, image::Rgba([1, 2, 3, 4]));
        let s = Sprite::new(Arc::new(img), Rect::new(4, 4, 4, 4), Position::ZERO);
        assert_eq!(s.pixel(1, 2), Rgba::new(1, 2, 3, 4));
        assert_eq!(s.pixel(0, 0), Rgba::TRANSPARENT);
        // Outside the region reads transparent even though the image is larger
        assert_eq!(s.pixel(-1, 0), Rgba::TRANSPARENT);
    }

    #[test]
    fn test_in_place_round_trip() {
        let s = checker_sprite(6, Position::new(3, 1));
        let mut buf = Vec::new();
        s.write(&mut buf).unwrap();
        let back = Sprite::read(&mut buf.as_slice()).unwrap();
        assert_eq!(back.origin, s.origin);
        assert_eq!(back.width(), s.width());
        assert_eq!(back.height(), s.height());
        for y in 0..6 {
            for x in 0..6 {
                assert_eq!(back.pixel(x, y), s.pixel(x, y));
            }
        }
    }
}
