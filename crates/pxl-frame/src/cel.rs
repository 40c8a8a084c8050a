use std::io::{self, Read, Write};

use anyhow::Result;

use pxl_sprite::{DeserializeContext, DrawContext, SerializeContext, Sprite, SpriteRef};
use pxl_types::{Data2D, Position, Rect, Rgba, wire};

/// Height field used by shadow-receiving layers: for each covered pixel, the
/// height at which a cast shadow should land. Pixels outside the data use
/// the default height.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Heightmap {
    pub default_height: u8,
    pub data: Data2D<u8>,
}

impl Heightmap {
    pub fn new(default_height: u8, data: Data2D<u8>) -> Self {
        Self { default_height, data }
    }

    /// Height at the given coordinates, falling back to the default outside
    /// the data bounds.
    pub fn height_at(&self, x: i32, y: i32) -> u8 {
        self.data.get(x, y).unwrap_or(self.default_height)
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        wire::write_u8(writer, self.default_height)?;
        self.data.bounds().write(writer)?;
        writer.write_all(self.data.as_slice())
    }

    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let default_height = wire::read_u8(reader)?;
        let bounds = Rect::read(reader)?;
        let len = if bounds.is_empty() {
            0
        } else {
            (bounds.width * bounds.height) as usize
        };
        let mut bytes = vec![0u8; len];
        reader.read_exact(&mut bytes)?;
        Ok(Self {
            default_height,
            data: Data2D::from_vec(bounds, bytes)?,
        })
    }
}

/// Marks a layer as shadow-receiving geometry rather than visible pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowReceiver {
    pub heightmap: Heightmap,
}

impl ShadowReceiver {
    pub fn new(heightmap: Heightmap) -> Self {
        Self { heightmap }
    }
}

/// A shadow receiver's heightmap positioned in world space, collected per
/// frame for the shadow pass.
#[derive(Debug, Clone, Copy)]
pub struct HeightmapView<'a> {
    pub heightmap: &'a Heightmap,
    pub position: Position,
    pub flip_x: bool,
}

/// One drawable layer of an animation frame: a sprite reference plus
/// optional shadow-receiver data.
#[derive(Debug, Clone)]
pub struct Cel {
    pub sprite_ref: SpriteRef,
    pub shadow_receiver: Option<ShadowReceiver>,
}

impl Cel {
    pub fn new(sprite_ref: SpriteRef) -> Self {
        Self { sprite_ref, shadow_receiver: None }
    }

    pub fn from_sprite(sprite: Sprite) -> Self {
        Self::new(SpriteRef::from_sprite(sprite))
    }

    pub fn with_shadow_receiver(sprite_ref: SpriteRef, receiver: ShadowReceiver) -> Self {
        Self { sprite_ref, shadow_receiver: Some(receiver) }
    }

    pub fn is_shadow_receiver(&self) -> bool {
        self.shadow_receiver.is_some()
    }

    /// Issue this layer's draw call. Best-effort resolution: render only.
    pub fn draw(&self, context: &mut dyn DrawContext, position: Position, flip_x: bool, tint: Rgba) {
        let sprite = self.sprite_ref.resolve_best_effort();
        context.draw_sprite(&sprite, position, flip_x, tint);
    }

    /// World-space bounds of this layer when drawn at `position`, unflipped
    /// at the world origin. Best-effort resolution: editor/tooling use.
    pub fn graphics_bounds(&self) -> Rect {
        self.sprite_ref.resolve_best_effort().world_bounds()
    }

    pub fn serialize<W: Write>(&self, context: &mut SerializeContext<'_, W>) -> io::Result<()> {
        self.sprite_ref.serialize(context)?;
        match &self.shadow_receiver {
            None => wire::write_bool(context.writer, false),
            Some(receiver) => {
                wire::write_bool(context.writer, true)?;
                receiver.heightmap.write(context.writer)
            }
        }
    }

    pub fn deserialize<R: Read>(context: &mut DeserializeContext<'_, R>) -> Result<Self> {
        let sprite_ref = SpriteRef::deserialize(context)?;
        let shadow_receiver = if wire::read_bool(context.reader)? {
            Some(ShadowReceiver::new(Heightmap::read(context.reader)?))
        } else {
            None
        };
        Ok(Self { sprite_ref, shadow_receiver })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pxl_sprite::RecordingDrawContext;

    fn flat_heightmap() -> Heightmap {
        let mut data = Data2D::with_bounds(Rect::new(0, 0, 2, 2));
        data.set(0, 0, 3);
        data.set(1, 1, 7);
        Heightmap::new(1, data)
    }

    #[test]
    fn test_height_at_falls_back_to_default() {
        let hm = flat_heightmap();
        assert_eq!(hm.height_at(0, 0), 3);
        assert_eq!(hm.height_at(1, 1), 7);
        assert_eq!(hm.height_at(50, 50), 1);
    }

    #[test]
    fn test_draw_issues_single_call() {
        let cel = Cel::from_sprite(Sprite::solid(4, 4, Position::new(2, 2), Rgba::WHITE));
        let mut ctx = RecordingDrawContext::default();
        cel.draw(&mut ctx, Position::new(10, 20), true, Rgba::WHITE);
        assert_eq!(ctx.calls.len(), 1);
        assert_eq!(ctx.calls[0].position, Position::new(10, 20));
        assert!(ctx.calls[0].flip_x);
    }

    #[test]
    fn test_graphics_bounds() {
        let cel = Cel::from_sprite(Sprite::solid(8, 4, Position::new(4, 0), Rgba::WHITE));
        assert_eq!(cel.graphics_bounds(), Rect::new(-4, 0, 8, 4));
    }

    #[test]
    fn test_wire_round_trip_with_shadow_receiver() {
        let sprite = Sprite::solid(2, 2, Position::ZERO, Rgba::new(5, 5, 5, 255));
        let cel = Cel::with_shadow_receiver(
            SpriteRef::from_sprite(sprite),
            ShadowReceiver::new(flat_heightmap()),
        );

        let mut buf = Vec::new();
        let mut ctx = SerializeContext::new(&mut buf);
        cel.serialize(&mut ctx).unwrap();

        let mut slice = buf.as_slice();
        let mut rctx = DeserializeContext::new(&mut slice);
        let back = Cel::deserialize(&mut rctx).unwrap();
        assert!(back.is_shadow_receiver());
        let receiver = back.shadow_receiver.unwrap();
        assert_eq!(receiver.heightmap, flat_heightmap());
    }

    #[test]
    fn test_wire_round_trip_without_shadow_receiver() {
        let cel = Cel::from_sprite(Sprite::solid(2, 2, Position::ZERO, Rgba::WHITE));
        let mut buf = Vec::new();
        let mut ctx = SerializeContext::new(&mut buf);
        cel.serialize(&mut ctx).unwrap();

        let mut slice = buf.as_slice();
        let mut rctx = DeserializeContext::new(&mut slice);
        let back = Cel::deserialize(&mut rctx).unwrap();
        assert!(!back.is_shadow_receiver());
    }
}
