// Sprite data and the image-bundle resolution boundary.
//
// A `Sprite` is a region of a shared RGBA image plus a drawing origin. An
// `ImageBundle` is the sprite table a `SpriteRef` resolves against, with a
// best-effort path for rendering and a strict path for tooling. The
// serialize/deserialize contexts decide whether sprites travel in-place or
// as bundle indices.

mod bundle;
mod context;
mod draw;
mod sprite;
mod sprite_ref;

pub use bundle::ImageBundle;
pub use context::{DeserializeContext, SerializeContext};
pub use draw::{DrawCall, DrawContext, RecordingDrawContext};
pub use sprite::Sprite;
pub use sprite_ref::SpriteRef;
