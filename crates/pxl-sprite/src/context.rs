use std::io::{Read, Write};
use std::sync::Arc;

use crate::bundle::ImageBundle;

/// Write-side codec state.
///
/// In bundled mode sprite references encode as table indices and the pixel
/// data is expected to live in a bundle the reader also has; otherwise every
/// sprite travels in place. The stream does not self-describe the mode, so
/// both sides must agree (the context, not the stream, decides).
pub struct SerializeContext<'a, W: Write> {
    pub writer: &'a mut W,
    bundled: bool,
}

impl<'a, W: Write> SerializeContext<'a, W> {
    /// In-place mode: sprites are written pixel-complete.
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer, bundled: false }
    }

    /// Bundled mode: sprite references are written as indices into a shared
    /// bundle. Every reference in the stream must point into that bundle.
    pub fn bundled(writer: &'a mut W) -> Self {
        Self { writer, bundled: true }
    }

    pub fn is_bundled(&self) -> bool {
        self.bundled
    }
}

/// Read-side codec state, mirroring [`SerializeContext`].
pub struct DeserializeContext<'a, R: Read> {
    pub reader: &'a mut R,
    bundle: Option<Arc<ImageBundle>>,
}

impl<'a, R: Read> DeserializeContext<'a, R> {
    /// In-place mode: sprites are read pixel-complete from the stream.
    pub fn new(reader: &'a mut R) -> Self {
        Self { reader, bundle: None }
    }

    /// Bundled mode: sprite references resolve against the given bundle.
    pub fn with_bundle(reader: &'a mut R, bundle: Arc<ImageBundle>) -> Self {
        Self { reader, bundle: Some(bundle) }
    }

    pub fn bundle(&self) -> Option<&Arc<ImageBundle>> {
        self.bundle.as_ref()
    }
}
