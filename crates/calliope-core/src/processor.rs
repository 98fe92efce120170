//! Core Processor trait and related types.
//!
//! The [`Processor`] trait is the foundation of the render pipeline. Every
//! unit in the signal path — oscillators, envelopes, filters, voices, the
//! voice manager itself — implements it, providing a uniform block-based
//! pull interface.
//!
//! ## Design Decisions
//!
//! - **Pull model**: the output side requests samples; a processor fills
//!   the caller-provided buffer synchronously. No queues, no cross-thread
//!   hand-offs inside a block.
//! - **In-place chaining**: source processors *fill* the buffer; effect
//!   processors treat the buffer contents as their input and overwrite it.
//!   This is what lets [`crate::AudioGraph`] run a serial chain through a
//!   single scratch block.
//! - **Object-safe**: chains and voices hold `Box<dyn Processor>` where
//!   runtime selection is needed. The cost model is one virtual call per
//!   block, not per sample.
//! - **No allocations**: all methods are called from the audio thread and
//!   must not touch the heap.

use crate::buffer::AudioBuffer;

/// Timing snapshot for a processor, filled in by implementations that
/// measure themselves. All-zero when the processor does not profile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PerformanceMetrics {
    /// Wall time of the most recent `pull`, in nanoseconds.
    pub last_block_ns: u64,
    /// Worst observed `pull` wall time, in nanoseconds.
    pub max_block_ns: u64,
    /// Number of blocks processed since construction or reset.
    pub blocks_processed: u64,
}

/// Block-based pull-model processing unit.
///
/// A processor writes exactly `output.len()` samples per call, advances its
/// internal state by exactly that many samples of simulated time, and never
/// retains references to the caller's buffer. Two consecutive pulls are
/// equivalent to one longer pull up to floating-point associativity.
///
/// Implementors must override [`pull`](Processor::pull); the stereo path
/// has a default that renders mono into the left channel and duplicates it
/// to the right. Processors with a true stereo identity (panned voices,
/// the voice-manager sum) override [`pull_stereo`](Processor::pull_stereo)
/// as well.
pub trait Processor {
    /// Fill (or transform in place) one mono block.
    ///
    /// Source processors ignore the incoming contents and overwrite them;
    /// effect processors read the buffer as their input and write the
    /// processed result back.
    fn pull(&mut self, output: &mut [f32]);

    /// Fill (or transform in place) one stereo block.
    ///
    /// The default renders the mono path into the left channel and copies
    /// it to the right, which is correct for any mono processor.
    fn pull_stereo(&mut self, output: &mut AudioBuffer<'_>) {
        self.pull(output.left);
        output.right.copy_from_slice(output.left);
    }

    /// Return the processor to its fresh post-construction state.
    ///
    /// Clears phase, stage, and accumulator state only. User-set
    /// parameters (frequency, cutoff, envelope times) survive a reset;
    /// this is what makes reset safe to call when a voice is stolen.
    fn reset(&mut self);

    /// Performance snapshot. Defaults to zeros for processors that do not
    /// measure themselves.
    fn metrics(&self) -> PerformanceMetrics {
        PerformanceMetrics::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Gain(f32);

    impl Processor for Gain {
        fn pull(&mut self, output: &mut [f32]) {
            for sample in output.iter_mut() {
                *sample *= self.0;
            }
        }
        fn reset(&mut self) {}
    }

    struct Ramp {
        next: f32,
    }

    impl Processor for Ramp {
        fn pull(&mut self, output: &mut [f32]) {
            for sample in output.iter_mut() {
                *sample = self.next;
                self.next += 1.0;
            }
        }
        fn reset(&mut self) {
            self.next = 0.0;
        }
    }

    #[test]
    fn mono_pull_transforms_in_place() {
        let mut gain = Gain(2.0);
        let mut buf = [1.0, 2.0, 3.0];
        gain.pull(&mut buf);
        assert_eq!(buf, [2.0, 4.0, 6.0]);
    }

    #[test]
    fn default_stereo_duplicates_left_to_right() {
        let mut ramp = Ramp { next: 0.0 };
        let mut left = [0.0f32; 4];
        let mut right = [9.0f32; 4];
        let mut buf = AudioBuffer::new(&mut left, &mut right);
        ramp.pull_stereo(&mut buf);
        assert_eq!(left, [0.0, 1.0, 2.0, 3.0]);
        assert_eq!(right, [0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn successive_pulls_equal_one_long_pull() {
        let mut a = Ramp { next: 0.0 };
        let mut b = Ramp { next: 0.0 };

        let mut long = [0.0f32; 8];
        a.pull(&mut long);

        let mut first = [0.0f32; 5];
        let mut second = [0.0f32; 3];
        b.pull(&mut first);
        b.pull(&mut second);

        assert_eq!(&long[..5], &first);
        assert_eq!(&long[5..], &second);
    }

    #[test]
    fn default_metrics_are_zero() {
        let gain = Gain(1.0);
        assert_eq!(gain.metrics(), PerformanceMetrics::default());
    }
}
