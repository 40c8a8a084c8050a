use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, ensure};
use image::RgbaImage;
use log::debug;

use pxl_types::{Position, Rect};

use crate::sprite::Sprite;

/// A table of sprites sharing decoded image storage.
///
/// A bundle is either fully resident (every sprite's pixels are in memory,
/// safe for strict resolution) or cacheable, meaning it stands in for storage
/// that may be evicted and repopulated on demand. Strict resolution refuses
/// cacheable bundles; best-effort resolution does not care.
#[derive(Debug)]
pub struct ImageBundle {
    sprites: Vec<Sprite>,
    cacheable: bool,
}

impl ImageBundle {
    /// Resident bundle over the given sprite table.
    pub fn new(sprites: Vec<Sprite>) -> Self {
        Self { sprites, cacheable: false }
    }

    /// Bundle backed by evictable storage. Only best-effort resolution may
    /// touch it.
    pub fn new_cacheable(sprites: Vec<Sprite>) -> Self {
        Self { sprites, cacheable: true }
    }

    /// Dummy single-sprite bundle wrapping an unshared sprite.
    pub fn from_sprite(sprite: Sprite) -> Self {
        Self::new(vec![sprite])
    }

    /// Slice a sprite sheet into a bundle. Each frame is a source rectangle
    /// plus the sprite's origin within that rectangle.
    pub fn from_sheet(sheet: RgbaImage, frames: &[(Rect, Position)]) -> Result<Self> {
        let image = Arc::new(sheet);
        let image_rect = Rect::new(0, 0, image.width() as i32, image.height() as i32);
        let mut sprites = Vec::with_capacity(frames.len());
        for (rect, origin) in frames {
            ensure!(
                image_rect.contains_rect(rect),
                "Sheet frame {rect:?} outside image bounds {image_rect:?}"
            );
            sprites.push(Sprite::new(Arc::clone(&image), *rect, *origin));
        }
        debug!(
            "Sliced {}x{} sheet into {} sprites",
            image.width(),
            image.height(),
            sprites.len()
        );
        Ok(Self::new(sprites))
    }

    /// Load a sheet image from disk and slice it.
    pub fn load_sheet(path: &Path, frames: &[(Rect, Position)]) -> Result<Self> {
        let sheet = image::open(path)
            .with_context(|| format!("Failed to load sprite sheet: {}", path.display()))?
            .to_rgba8();
        Self::from_sheet(sheet, frames)
    }

    pub fn is_cacheable(&self) -> bool {
        self.cacheable
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Sprite at `index` with its origin overridden.
    ///
    /// The origin lives on the reference rather than the table entry so that
    /// identical regions with different origins can share one table slot.
    /// Callers hold validated indices (`SpriteRef` construction checks).
    pub fn sprite(&self, index: usize, origin: Position) -> Sprite {
        let mut sprite = self.sprites[index].clone();
        sprite.origin = origin;
        sprite
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pxl_types::Rgba;

    #[test]
    fn test_from_sprite_single_entry() {
        let bundle = ImageBundle::from_sprite(Sprite::solid(4, 4, Position::ZERO, Rgba::WHITE));
        assert_eq!(bundle.len(), 1);
        assert!(!bundle.is_cacheable());
    }

    #[test]
    fn test_from_sheet_slices_regions() {
        let mut sheet = RgbaImage::new(8, 4);
        sheet.put_pixel(0, 0, image::Rgba([10, 0, 0, 255]));
        sheet.put_pixel(4, 0, image::Rgba([20, 0, 0, 255]));
        let frames = [
            (Rect::new(0, 0, 4, 4), Position::new(2, 2)),
            (Rect::new(4, 0, 4, 4), Position::new(0, 0)),
        ];
        let bundle = ImageBundle::from_sheet(sheet, &frames).unwrap();
        assert_eq!(bundle.len(), 2);

        let first = bundle.sprite(0, Position::new(2, 2));
        assert_eq!(first.pixel(0, 0), Rgba::new(10, 0, 0, 255));
        let second = bundle.sprite(1, Position::ZERO);
        assert_eq!(second.pixel(0, 0), Rgba::new(20, 0, 0, 255));
    }

    #[test]
    fn test_from_sheet_rejects_out_of_bounds_frame() {
        let sheet = RgbaImage::new(8, 8);
        let frames = [(Rect::new(4, 4, 8, 8), Position::ZERO)];
        assert!(ImageBundle::from_sheet(sheet, &frames).is_err());
    }

    #[test]
    fn test_load_sheet_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.png");
        let mut sheet = RgbaImage::new(4, 2);
        sheet.put_pixel(2, 0, image::Rgba([7, 8, 9, 255]));
        sheet.save(&path).unwrap();

        let frames = [
            (Rect::new(0, 0, 2, 2), Position::ZERO),
            (Rect::new(2, 0, 2, 2), Position::new(1, 1)),
        ];
        let bundle = ImageBundle::load_sheet(&path, &frames).unwrap();
        assert_eq!(bundle.len(), 2);
        assert_eq!(
            bundle.sprite(1, Position::new(1, 1)).pixel(0, 0),
            Rgba::new(7, 8, 9, 255)
        );
    }

    #[test]
    fn test_sprite_origin_override() {
        let bundle = ImageBundle::from_sprite(Sprite::solid(4, 4, Position::new(1, 1), Rgba::WHITE));
        let resolved = bundle.sprite(0, Position::new(3, 0));
        assert_eq!(resolved.origin, Position::new(3, 0));
    }
}
