use crate::player::loader::DecodedImage;

/// Ordered decoded frames, immutable once built.
///
/// Failed loads are excluded before construction, so indices are contiguous.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameSet {
    frames: Vec<DecodedImage>,
}

impl FrameSet {
    /// Build from frames in playback order.
    pub fn new(frames: Vec<DecodedImage>) -> Self {
        Self { frames }
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// `true` when nothing loaded.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Clamp `index` into `[0, len - 1]`.
    pub fn clamp_index(&self, index: usize) -> Option<usize> {
        let last = self.frames.len().checked_sub(1)?;
        Some(index.min(last))
    }

    /// Frame at the clamped `index`; `None` only for an empty set.
    pub fn get(&self, index: usize) -> Option<&DecodedImage> {
        self.frames.get(self.clamp_index(index)?)
    }
}
