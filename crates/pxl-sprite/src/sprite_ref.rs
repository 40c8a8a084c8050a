use std::io::{self, Read, Write};
use std::sync::Arc;

use anyhow::{Result, bail, ensure};

use pxl_types::{Position, wire};

use crate::bundle::ImageBundle;
use crate::context::{DeserializeContext, SerializeContext};
use crate::sprite::Sprite;

/// Reference to a sprite stored in an [`ImageBundle`].
///
/// The origin is stored on the reference so that bundle entries can be
/// de-duplicated by region alone.
#[derive(Debug, Clone)]
pub struct SpriteRef {
    bundle: Arc<ImageBundle>,
    index: usize,
    origin: Position,
}

impl SpriteRef {
    /// Reference into an existing bundle. The index must be in range.
    pub fn new(bundle: Arc<ImageBundle>, index: usize, origin: Position) -> Result<Self> {
        ensure!(
            index < bundle.len(),
            "Sprite index {index} out of range for bundle of {}",
            bundle.len()
        );
        Ok(Self { bundle, index, origin })
    }

    /// Wrap a lone sprite in a dummy bundle. The sprite's image is expected
    /// to be immutable or unshared.
    pub fn from_sprite(sprite: Sprite) -> Self {
        let origin = sprite.origin;
        Self {
            bundle: Arc::new(ImageBundle::from_sprite(sprite)),
            index: 0,
            origin,
        }
    }

    pub fn origin(&self) -> Position {
        self.origin
    }

    /// Resolve for rendering.
    ///
    /// Always succeeds, touching the bundle's storage as a side effect.
    /// The result is not deterministic across machines while a cacheable
    /// bundle warms up, so it must never feed a networked code path.
    pub fn resolve_best_effort(&self) -> Sprite {
        self.bundle.sprite(self.index, self.origin)
    }

    /// Resolve strictly, failing fast when the bundle is cacheable and thus
    /// not guaranteed resident. For tooling and asset-build contexts where
    /// synchronous availability is part of the contract.
    pub fn resolve_require(&self) -> Result<Sprite> {
        if self.bundle.is_cacheable() {
            bail!("Strict sprite resolution on a cacheable bundle");
        }
        Ok(self.bundle.sprite(self.index, self.origin))
    }

    /// Asset codec, write side. Bundled mode writes the table index and
    /// origin; in-place mode writes the sprite pixel-complete, which needs
    /// strict resolution and so fails fast on a cacheable bundle.
    pub fn serialize<W: Write>(&self, context: &mut SerializeContext<'_, W>) -> io::Result<()> {
        if context.is_bundled() {
            wire::write_i32_le(context.writer, self.index as i32)?;
            self.origin.write(context.writer)
        } else {
            let sprite = self.resolve_require().map_err(io::Error::other)?;
            sprite.write(context.writer)
        }
    }

    /// Asset codec, read side, mirroring [`Self::serialize`].
    pub fn deserialize<R: Read>(context: &mut DeserializeContext<'_, R>) -> Result<Self> {
        match context.bundle() {
            Some(bundle) => {
                let bundle = Arc::clone(bundle);
                let index = wire::read_i32_le(context.reader)?;
                ensure!(index >= 0, "Invalid sprite index in stream: {index}");
                let origin = Position::read(context.reader)?;
                Self::new(bundle, index as usize, origin)
            }
            None => {
                let sprite = Sprite::read(context.reader)?;
                Ok(Self::from_sprite(sprite))
            }
        }
    }

    /// Network channel, write side: sprite identity is deliberately not part
    /// of the wire format, so this writes nothing.
    pub fn net_serialize<W: Write>(&self, _writer: &mut W) -> io::Result<()> {
        Ok(())
    }

    /// Network channel, read side: decoding a sprite reference from this
    /// channel is a programming error, caught immediately.
    pub fn net_deserialize<R: Read>(_reader: &mut R) -> Result<Self> {
        bail!("SpriteRef is not decodable from the network channel")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pxl_types::{Rect, Rgba};

    fn test_sprite() -> Sprite {
        Sprite::solid(4, 4, Position::new(2, 2), Rgba::new(9, 9, 9, 255))
    }

    #[test]
    fn test_new_rejects_out_of_range_index() {
        let bundle = Arc::new(ImageBundle::from_sprite(test_sprite()));
        assert!(SpriteRef::new(Arc::clone(&bundle), 1, Position::ZERO).is_err());
        assert!(SpriteRef::new(bundle, 0, Position::ZERO).is_ok());
    }

    #[test]
    fn test_resolve_best_effort() {
        let r = SpriteRef::from_sprite(test_sprite());
        let sprite = r.resolve_best_effort();
        assert_eq!(sprite.origin, Position::new(2, 2));
        assert_eq!(sprite.world_bounds(), Rect::new(-2, -2, 4, 4));
    }

    #[test]
    fn test_resolve_require_fails_on_cacheable_bundle() {
        let bundle = Arc::new(ImageBundle::new_cacheable(vec![test_sprite()]));
        let r = SpriteRef::new(bundle, 0, Position::ZERO).unwrap();
        assert!(r.resolve_require().is_err());
        // Best-effort still works
        let _ = r.resolve_best_effort();
    }

    #[test]
    fn test_in_place_round_trip() {
        let r = SpriteRef::from_sprite(test_sprite());
        let mut buf = Vec::new();
        let mut ctx = SerializeContext::new(&mut buf);
        r.serialize(&mut ctx).unwrap();

        let mut slice = buf.as_slice();
        let mut rctx = DeserializeContext::new(&mut slice);
        let back = SpriteRef::deserialize(&mut rctx).unwrap();
        let sprite = back.resolve_require().unwrap();
        assert_eq!(sprite.origin, Position::new(2, 2));
        assert_eq!(sprite.pixel(0, 0), Rgba::new(9, 9, 9, 255));
    }

    #[test]
    fn test_bundled_round_trip() {
        let bundle = Arc::new(ImageBundle::new(vec![test_sprite(), test_sprite()]));
        let r = SpriteRef::new(Arc::clone(&bundle), 1, Position::new(1, 0)).unwrap();

        let mut buf = Vec::new();
        let mut ctx = SerializeContext::bundled(&mut buf);
        r.serialize(&mut ctx).unwrap();
        // index + origin only, no pixel data
        assert_eq!(buf.len(), 12);

        let mut slice = buf.as_slice();
        let mut rctx = DeserializeContext::with_bundle(&mut slice, bundle);
        let back = SpriteRef::deserialize(&mut rctx).unwrap();
        assert_eq!(back.origin(), Position::new(1, 0));
    }

    #[test]
    fn test_bundled_read_rejects_bad_index() {
        let bundle = Arc::new(ImageBundle::from_sprite(test_sprite()));
        let mut buf = Vec::new();
        wire::write_i32_le(&mut buf, 5).unwrap();
        Position::ZERO.write(&mut buf).unwrap();

        let mut slice = buf.as_slice();
        let mut rctx = DeserializeContext::with_bundle(&mut slice, bundle);
        assert!(SpriteRef::deserialize(&mut rctx).is_err());
    }

    #[test]
    fn test_in_place_write_fails_on_cacheable_bundle() {
        let bundle = Arc::new(ImageBundle::new_cacheable(vec![test_sprite()]));
        let r = SpriteRef::new(bundle, 0, Position::ZERO).unwrap();
        let mut buf = Vec::new();
        let mut ctx = SerializeContext::new(&mut buf);
        assert!(r.serialize(&mut ctx).is_err());
    }

    #[test]
    fn test_net_channel_stub() {
        let r = SpriteRef::from_sprite(test_sprite());
        let mut buf = Vec::new();
        r.net_serialize(&mut buf).unwrap();
        assert!(buf.is_empty());
        assert!(SpriteRef::net_deserialize(&mut buf.as_slice()).is_err());
    }
}
