use std::io::{self, Read, Write};

use anyhow::{Result, anyhow, ensure};
use log::debug;

use pxl_sprite::{DeserializeContext, DrawContext, SerializeContext, Sprite};
use pxl_types::{Data2D, MaskData, Position, Rect, Rgba, wire};

use crate::attachment::OutgoingAttachment;
use crate::cel::{Cel, HeightmapView};
use crate::mask::Mask;
use crate::tag_lookup::TagLookup;
use crate::tags::TagSet;

/// One frame of a sprite animation: an ordered stack of layers, derived and
/// hand-authored masks, attachment metadata, gameplay deltas and triggers.
///
/// Layers draw bottom-to-top; `attach_at_layer` marks where an external
/// compositor interleaves an attached child's draw calls between the
/// before/after halves. Masks start absent and are populated by the explicit
/// `regenerate_alpha_mask` pass, which needs sprite pixel data to be
/// resolvable; construction does not.
#[derive(Debug, Clone, Default)]
pub struct AnimationFrame {
    pub layers: Vec<Cel>,

    pub shadow_offset: Position,

    /// Number of ticks this frame lasts for.
    pub delay: i32,

    /// Gameplay position offset applied at the start of this frame.
    pub position_delta: Position,
    pub snap_to_ground: bool,

    /// The layer index where attachments are inserted (before this layer).
    pub attach_at_layer: i32,
    /// True if the layers from `attach_at_layer` up can be drawn over a held
    /// sorted (thick/3D) object. Says: everything above the split is small,
    /// like a hand.
    pub can_draw_layers_above_sorted_attachees: bool,

    pub outgoing_attachments: TagLookup<OutgoingAttachment>,
    pub incoming_attachments: TagLookup<Position>,
    pub masks: TagLookup<Mask>,

    /// Trigger symbols fired when this frame becomes active, or `None` for
    /// no triggers.
    pub triggers: Option<Vec<String>>,

    pub cue: Option<String>,
}

impl AnimationFrame {
    pub fn new(delay: i32) -> Self {
        Self { delay, ..Self::default() }
    }

    pub fn from_cel(cel: Cel, delay: i32) -> Self {
        let mut frame = Self::new(delay);
        frame.layers.push(cel);
        frame
    }

    pub fn from_sprite(sprite: Sprite, delay: i32) -> Self {
        Self::from_cel(Cel::from_sprite(sprite), delay)
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn add_layer(&mut self, cel: Cel) {
        self.layers.push(cel);
    }

    // ------------------------------------------------------------------
    // Triggers
    // ------------------------------------------------------------------

    /// Add a trigger symbol, allocating the list on first use.
    pub fn add_trigger(&mut self, symbol: impl Into<String>) {
        self.triggers.get_or_insert_with(Vec::new).push(symbol.into());
    }

    /// Remove the first occurrence of `symbol`. A no-op returning `false`
    /// when the list is absent; removing the last entry leaves an empty,
    /// still-present list.
    pub fn remove_trigger(&mut self, symbol: &str) -> bool {
        match &mut self.triggers {
            None => false,
            Some(list) => match list.iter().position(|s| s == symbol) {
                Some(i) => {
                    list.remove(i);
                    true
                }
                None => false,
            },
        }
    }

    // ------------------------------------------------------------------
    // Attachments and masks
    // ------------------------------------------------------------------

    pub fn add_outgoing_attachment(
        &mut self,
        rule: TagSet,
        attachment: OutgoingAttachment,
    ) -> Result<()> {
        self.outgoing_attachments.add(rule, attachment)
    }

    pub fn add_incoming_attachment(&mut self, rule: TagSet, position: Position) -> Result<()> {
        self.incoming_attachments.add(rule, position)
    }

    pub fn add_mask(&mut self, rule: TagSet, mask: Mask) -> Result<()> {
        self.masks.add(rule, mask)
    }

    /// Remove the outgoing attachment at `index`. Returns `false` when the
    /// index is out of range.
    pub fn remove_outgoing_attachment(&mut self, index: usize) -> bool {
        if index < self.outgoing_attachments.count() {
            self.outgoing_attachments.remove_at(index);
            true
        } else {
            false
        }
    }

    /// Remove the mask at `index`. Returns `false` when the index is out of
    /// range.
    pub fn remove_mask(&mut self, index: usize) -> bool {
        if index < self.masks.count() {
            self.masks.remove_at(index);
            true
        } else {
            false
        }
    }

    // ------------------------------------------------------------------
    // Alpha mask and bounds
    // ------------------------------------------------------------------

    /// The frame-level generated alpha mask. Fails if
    /// [`Self::regenerate_alpha_mask`] has not run, or if the base entry was
    /// replaced by something that is not a generated mask.
    pub fn alpha_mask_view(&self) -> Result<&Mask> {
        let mask = self
            .masks
            .get_base_fallback()
            .ok_or_else(|| anyhow!("Alpha mask has not been generated for this frame"))?;
        ensure!(
            mask.is_generated_alpha_mask,
            "Base mask entry is not a generated alpha mask"
        );
        Ok(mask)
    }

    /// Derive the frame's occlusion mask from its layers' sprite alpha,
    /// replacing any previous generated base mask. Hand-authored masks under
    /// non-empty rules are untouched. Strict resolution: every layer's
    /// sprite data must be resident.
    pub fn regenerate_alpha_mask(&mut self) -> Result<()> {
        // The old base mask is stale either way
        self.masks.try_remove_base_fallback();

        if self.layers.len() == 1 {
            // Single sprite layer: its alpha mask is the frame mask
            let data = self.layers[0].sprite_ref.resolve_require()?.alpha_mask();
            self.masks.add(TagSet::empty(), Mask::generated(data))?;
        } else {
            let mut layer_masks = Vec::new();
            for cel in &self.layers {
                let mask = cel.sprite_ref.resolve_require()?.alpha_mask();
                if !mask.is_empty() {
                    layer_masks.push(mask);
                }
            }

            let mut max_bounds = Rect::EMPTY;
            for mask in &layer_masks {
                max_bounds = Rect::union_ignore_empty(max_bounds, mask.bounds());
            }

            let mut data = MaskData::new(max_bounds);
            for layer_mask in &layer_masks {
                // Contained by construction: the destination is the union
                data.bitwise_or_from(layer_mask)?;
            }
            debug!(
                "Regenerated alpha mask from {} layers, bounds {:?}",
                layer_masks.len(),
                max_bounds
            );
            self.masks.add(TagSet::empty(), Mask::generated(data))?;
        }
        Ok(())
    }

    /// Maximum world-space bounds of all layers. Best-effort resolution:
    /// editor/tooling use only.
    pub fn graphics_bounds(&self) -> Rect {
        let mut max_bounds = Rect::EMPTY;
        for cel in &self.layers {
            max_bounds = Rect::union_ignore_empty(max_bounds, cel.graphics_bounds());
        }
        max_bounds
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Draw every layer bottom-to-top at `position`.
    pub fn draw(&self, context: &mut dyn DrawContext, position: Position, flip_x: bool, tint: Rgba) {
        for cel in &self.layers {
            cel.draw(context, position, flip_x, tint);
        }
    }

    fn attach_split(&self) -> usize {
        (self.attach_at_layer.max(0) as usize).min(self.layers.len())
    }

    /// Draw the layers below `attach_at_layer`. Together with
    /// [`Self::draw_after_attachment`] this reproduces [`Self::draw`]
    /// exactly, with the attached child's draws interleaved between.
    pub fn draw_before_attachment(
        &self,
        context: &mut dyn DrawContext,
        position: Position,
        flip_x: bool,
        tint: Rgba,
    ) {
        for cel in &self.layers[..self.attach_split()] {
            cel.draw(context, position, flip_x, tint);
        }
    }

    /// Draw the layers from `attach_at_layer` up.
    pub fn draw_after_attachment(
        &self,
        context: &mut dyn DrawContext,
        position: Position,
        flip_x: bool,
        tint: Rgba,
    ) {
        for cel in &self.layers[self.attach_split()..] {
            cel.draw(context, position, flip_x, tint);
        }
    }

    /// Append a positioned heightmap view for every shadow-receiving layer.
    pub fn shadow_receiver_heightmap_views<'a>(
        &'a self,
        position: Position,
        flip_x: bool,
        output: &mut Vec<HeightmapView<'a>>,
    ) {
        for cel in &self.layers {
            if let Some(receiver) = &cel.shadow_receiver {
                output.push(HeightmapView {
                    heightmap: &receiver.heightmap,
                    position,
                    flip_x,
                });
            }
        }
    }

    // ------------------------------------------------------------------
    // Soft rendering
    // ------------------------------------------------------------------

    /// Flatten the frame's visible layers into a single color buffer,
    /// compositing in chain order and skipping shadow receivers. Strict
    /// resolution: tooling/thumbnail use, not the render loop.
    pub fn soft_render(&self) -> Result<Data2D<Rgba>> {
        let mut output: Data2D<Rgba> = Data2D::default();
        for cel in &self.layers {
            if cel.is_shadow_receiver() {
                continue;
            }

            let sprite_data = cel.sprite_ref.resolve_require()?.color_data();

            if output.is_empty() {
                output = sprite_data;
                continue;
            }

            output = output.lazy_copy_expand_to_contain(sprite_data.bounds());
            for y in sprite_data.start_y()..sprite_data.end_y() {
                for x in sprite_data.start_x()..sprite_data.end_x() {
                    let pixel = match sprite_data.get(x, y) {
                        Some(p) => p,
                        None => continue,
                    };
                    if pixel == Rgba::TRANSPARENT {
                        continue;
                    }
                    if pixel.is_opaque() {
                        output.set(x, y, pixel);
                    } else {
                        // Straight-alpha "over" in float space
                        let src = pixel.to_f32();
                        let dst = output.get(x, y).unwrap_or(Rgba::TRANSPARENT).to_f32();
                        let inv = 1.0 - src[3];
                        let blended = Rgba::from_f32([
                            src[0] * src[3] + dst[0] * inv,
                            src[1] * src[3] + dst[1] * inv,
                            src[2] * src[3] + dst[2] * inv,
                            src[3] + dst[3] * inv,
                        ]);
                        output.set(x, y, blended);
                    }
                }
            }
        }

        #[cfg(debug_assertions)]
        if let Ok(bounds) = self.soft_render_bounds() {
            debug_assert_eq!(output.bounds(), bounds);
        }

        Ok(output)
    }

    /// The bounds [`Self::soft_render`] would produce, without compositing.
    pub fn soft_render_bounds(&self) -> Result<Rect> {
        let mut output = Rect::EMPTY;
        for cel in &self.layers {
            if cel.is_shadow_receiver() {
                continue;
            }
            let sprite = cel.sprite_ref.resolve_require()?;
            output = Rect::union_ignore_empty(output, sprite.world_bounds());
        }
        Ok(output)
    }

    // ------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------

    /// Write the frame in the fixed field order of the asset/network format.
    /// `attach_at_layer` is clamped into `[0, layer_count]` so a corrupted
    /// in-memory value never escapes to the stream.
    pub fn serialize<W: Write>(&self, context: &mut SerializeContext<'_, W>) -> io::Result<()> {
        wire::write_i32_le(context.writer, self.delay)?;
        self.position_delta.write(context.writer)?;
        self.shadow_offset.write(context.writer)?;

        wire::write_bool(context.writer, self.snap_to_ground)?;

        wire::write_i32_le(context.writer, self.layers.len() as i32)?;
        for cel in &self.layers {
            cel.serialize(context)?;
        }

        self.masks.serialize(&mut *context.writer, |w, m| m.write(w))?;

        self.outgoing_attachments
            .serialize(&mut *context.writer, |w, a| a.write(w))?;
        self.incoming_attachments
            .serialize(&mut *context.writer, |w, p| p.write(w))?;

        match &self.triggers {
            None => wire::write_i32_le(context.writer, 0)?,
            Some(triggers) => {
                wire::write_i32_le(context.writer, triggers.len() as i32)?;
                for trigger in triggers {
                    wire::write_string(context.writer, trigger)?;
                }
            }
        }

        let clamped = self.attach_at_layer.clamp(0, self.layers.len() as i32);
        wire::write_i32_le(context.writer, clamped)?;
        wire::write_bool(context.writer, self.can_draw_layers_above_sorted_attachees)?;

        wire::write_nullable_string(context.writer, self.cue.as_deref())
    }

    /// Read a frame written by [`Self::serialize`], consuming exactly the
    /// bytes it produced. A trigger count of zero reads back as the absent
    /// state.
    pub fn deserialize<R: Read>(context: &mut DeserializeContext<'_, R>) -> Result<Self> {
        let delay = wire::read_i32_le(context.reader)?;
        let position_delta = Position::read(context.reader)?;
        let shadow_offset = Position::read(context.reader)?;

        let snap_to_ground = wire::read_bool(context.reader)?;

        let layer_count = wire::read_count(context.reader)?;
        let mut layers = Vec::with_capacity(layer_count);
        for _ in 0..layer_count {
            layers.push(Cel::deserialize(context)?);
        }

        let masks = TagLookup::deserialize(&mut *context.reader, |r| Mask::read(r))?;

        let outgoing_attachments =
            TagLookup::deserialize(&mut *context.reader, |r| OutgoingAttachment::read(r))?;
        let incoming_attachments =
            TagLookup::deserialize(&mut *context.reader, |r| Ok(Position::read(r)?))?;

        let trigger_count = wire::read_count(context.reader)?;
        let triggers = if trigger_count > 0 {
            let mut list = Vec::with_capacity(trigger_count);
            for _ in 0..trigger_count {
                list.push(wire::read_string(context.reader)?);
            }
            Some(list)
        } else {
            None
        };

        let attach_at_layer = wire::read_i32_le(context.reader)?;
        let can_draw_layers_above_sorted_attachees = wire::read_bool(context.reader)?;

        let cue = wire::read_nullable_string(context.reader)?;

        Ok(Self {
            layers,
            shadow_offset,
            delay,
            position_delta,
            snap_to_ground,
            attach_at_layer,
            can_draw_layers_above_sorted_attachees,
            outgoing_attachments,
            incoming_attachments,
            masks,
            triggers,
            cue,
        })
    }
}
