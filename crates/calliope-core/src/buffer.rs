//! Stereo block views and owned block storage.
//!
//! [`AudioBuffer`] is the borrowed view passed through the pull graph: two
//! equal-length mutable channel slices whose lifetimes match one block
//! render. The backing storage belongs to either the host callback or a
//! pooled [`StereoBlock`].

/// One block of stereo audio as a pair of equal-length mutable views.
///
/// Constructed per render from the host's output slices or from a pooled
/// [`StereoBlock`]. The two channels are always the same length.
pub struct AudioBuffer<'a> {
    /// Left channel samples.
    pub left: &'a mut [f32],
    /// Right channel samples.
    pub right: &'a mut [f32],
}

impl<'a> AudioBuffer<'a> {
    /// Creates a stereo view over two channel slices.
    ///
    /// # Panics
    ///
    /// Panics if the slices differ in length; the equal-length invariant is
    /// what every processor in the graph relies on.
    pub fn new(left: &'a mut [f32], right: &'a mut [f32]) -> Self {
        assert_eq!(
            left.len(),
            right.len(),
            "stereo channels must have equal length"
        );
        Self { left, right }
    }

    /// Number of frames (sample pairs) in the block.
    #[inline]
    pub fn frames(&self) -> usize {
        self.left.len()
    }

    /// Returns true for a zero-length block.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Fills both channels with silence.
    pub fn clear(&mut self) {
        self.left.fill(0.0);
        self.right.fill(0.0);
    }

    /// Adds another block's contents sample-by-sample (mix/accumulate).
    ///
    /// # Panics
    ///
    /// Panics if `other` has a different frame count.
    pub fn accumulate(&mut self, other: &AudioBuffer<'_>) {
        for (dst, src) in self.left.iter_mut().zip(other.left.iter()) {
            *dst += *src;
        }
        for (dst, src) in self.right.iter_mut().zip(other.right.iter()) {
            *dst += *src;
        }
    }

    /// Scales both channels by a gain factor.
    pub fn scale(&mut self, gain: f32) {
        for sample in self.left.iter_mut() {
            *sample *= gain;
        }
        for sample in self.right.iter_mut() {
            *sample *= gain;
        }
    }
}

/// An owned stereo block, the unit of storage managed by
/// [`crate::BufferPool`].
#[derive(Debug, Clone)]
pub struct StereoBlock {
    /// Left channel samples.
    pub left: Vec<f32>,
    /// Right channel samples.
    pub right: Vec<f32>,
}

impl StereoBlock {
    /// Creates a zeroed block with the given frame count.
    pub fn new(frames: usize) -> Self {
        Self {
            left: vec![0.0; frames],
            right: vec![0.0; frames],
        }
    }

    /// Number of frames per channel.
    pub fn frames(&self) -> usize {
        self.left.len()
    }

    /// Resizes both channels, zeroing any new samples.
    pub fn resize(&mut self, frames: usize) {
        self.left.resize(frames, 0.0);
        self.right.resize(frames, 0.0);
    }

    /// Fills both channels with silence.
    pub fn clear(&mut self) {
        self.left.fill(0.0);
        self.right.fill(0.0);
    }

    /// Borrows the first `frames` of the block as an [`AudioBuffer`].
    ///
    /// # Panics
    ///
    /// Panics if `frames` exceeds the block's capacity.
    pub fn as_buffer(&mut self, frames: usize) -> AudioBuffer<'_> {
        AudioBuffer::new(&mut self.left[..frames], &mut self.right[..frames])
    }
}
