use std::io::{self, Read, Write};

use anyhow::Result;

use pxl_types::{Position, Rect};

use crate::tags::TagSet;

/// Describes how a child sprite/object attaches to a frame.
///
/// `position` is the attach point in the frame's origin space. The target
/// context tag sets select which animation and attachment point the attached
/// child should use, and `attach_range` bounds where a sorted (thick/3D)
/// attachee may be placed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutgoingAttachment {
    pub position: Position,
    pub target_animation_context: TagSet,
    pub target_attachment_context: TagSet,
    pub attach_range: Rect,
}

impl OutgoingAttachment {
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.position.write(writer)?;
        self.target_animation_context.write(writer)?;
        self.target_attachment_context.write(writer)?;
        self.attach_range.write(writer)
    }

    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let position = Position::read(reader)?;
        let target_animation_context = TagSet::read(reader)?;
        let target_attachment_context = TagSet::read(reader)?;
        let attach_range = Rect::read(reader)?;
        Ok(Self {
            position,
            target_animation_context,
            target_attachment_context,
            attach_range,
        })
    }
}
