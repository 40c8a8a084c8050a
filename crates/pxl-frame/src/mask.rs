use std::io::{self, Read, Write};

use anyhow::Result;

use pxl_types::{MaskData, wire};

/// Occlusion/collision mask attached to a frame.
///
/// Generated masks are derived from sprite alpha by `regenerate_alpha_mask`
/// and live under the empty rule; hand-authored masks (gameplay hit volumes
/// and the like) carry non-empty tag rules and survive regeneration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Mask {
    pub data: MaskData,
    pub is_generated_alpha_mask: bool,
}

impl Mask {
    pub fn generated(data: MaskData) -> Self {
        Self { data, is_generated_alpha_mask: true }
    }

    pub fn authored(data: MaskData) -> Self {
        Self { data, is_generated_alpha_mask: false }
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.data.write(writer)?;
        wire::write_bool(writer, self.is_generated_alpha_mask)
    }

    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let data = MaskData::read(reader)?;
        let is_generated_alpha_mask = wire::read_bool(reader)?;
        Ok(Self { data, is_generated_alpha_mask })
    }
}
