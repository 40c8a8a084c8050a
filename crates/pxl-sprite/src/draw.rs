use pxl_types::{Position, Rect, Rgba};

use crate::sprite::Sprite;

/// Rasterization boundary. Implemented by the rendering backend; the
/// animation core only issues ordered draw calls through it.
pub trait DrawContext {
    /// Draw one sprite at a world position, optionally mirrored around the
    /// vertical axis through that position, modulated by `tint`.
    fn draw_sprite(&mut self, sprite: &Sprite, position: Position, flip_x: bool, tint: Rgba);
}

/// One recorded draw call (sprite captured as its world bounds).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawCall {
    pub sprite_bounds: Rect,
    pub position: Position,
    pub flip_x: bool,
    pub tint: Rgba,
}

/// Draw context that records calls instead of rasterizing. Used to assert
/// draw order and split-draw behavior in tests.
#[derive(Debug, Default)]
pub struct RecordingDrawContext {
    pub calls: Vec<DrawCall>,
}

impl DrawContext for RecordingDrawContext {
    fn draw_sprite(&mut self, sprite: &Sprite, position: Position, flip_x: bool, tint: Rgba) {
        self.calls.push(DrawCall {
            sprite_bounds: sprite.world_bounds(),
            position,
            flip_x,
            tint,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_context_keeps_order() {
        let a = Sprite::solid(2, 2, Position::ZERO, Rgba::WHITE);
        let b = Sprite::solid(4, 4, Position::new(2, 2), Rgba::WHITE);

        let mut ctx = RecordingDrawContext::default();
        ctx.draw_sprite(&a, Position::new(10, 0), false, Rgba::WHITE);
        ctx.draw_sprite(&b, Position::new(20, 0), true, Rgba::WHITE);

        assert_eq!(ctx.calls.len(), 2);
        assert_eq!(ctx.calls[0].sprite_bounds, Rect::new(0, 0, 2, 2));
        assert_eq!(ctx.calls[1].sprite_bounds, Rect::new(-2, -2, 4, 4));
        assert!(ctx.calls[1].flip_x);
    }
}
