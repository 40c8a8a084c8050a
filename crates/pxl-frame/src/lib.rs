// Animation frame core: tag-conditioned lookup tables, occlusion masks,
// ordered layer stacks with split-draw attachment insertion, gameplay
// triggers, and the deterministic binary codec over all of it.

mod attachment;
mod cel;
mod frame;
mod mask;
mod tag_lookup;
mod tags;

pub use attachment::OutgoingAttachment;
pub use cel::{Cel, Heightmap, HeightmapView, ShadowReceiver};
pub use frame::AnimationFrame;
pub use mask::Mask;
pub use tag_lookup::TagLookup;
pub use tags::TagSet;
