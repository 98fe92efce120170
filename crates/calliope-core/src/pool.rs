//! Pre-allocated scratch blocks for the audio thread.
//!
//! A [`BufferPool`] owns a free list of [`StereoBlock`]s sized to the
//! negotiated block size. Borrowing hands out a scoped [`PooledBlock`]
//! whose drop returns the block, so the steady-state render loop never
//! touches the heap. The free-list mutex is held only for an O(1)
//! push/pop; with the pool sized above the steady-state borrow count,
//! contention is statistically nil.

use parking_lot::Mutex;

use crate::buffer::StereoBlock;
use crate::logger::AudioLogger;

/// Number of blocks pre-allocated when none is specified.
const DEFAULT_CAPACITY: usize = 32;

/// Fixed pool of reusable stereo scratch blocks.
pub struct BufferPool {
    free: Mutex<Vec<StereoBlock>>,
    block_frames: usize,
}

impl BufferPool {
    /// Creates a pool of [`DEFAULT_CAPACITY`] blocks, each `block_frames`
    /// long.
    pub fn new(block_frames: usize) -> Self {
        Self::with_capacity(block_frames, DEFAULT_CAPACITY)
    }

    /// Creates a pool with an explicit block count.
    pub fn with_capacity(block_frames: usize, capacity: usize) -> Self {
        let free = (0..capacity).map(|_| StereoBlock::new(block_frames)).collect();
        Self {
            free: Mutex::new(free),
            block_frames,
        }
    }

    /// Frame count of pooled blocks.
    pub fn block_frames(&self) -> usize {
        self.block_frames
    }

    /// Number of blocks currently sitting in the free list.
    pub fn available(&self) -> usize {
        self.free.lock().len()
    }

    /// Borrows a block of at least `min_frames`.
    ///
    /// The happy path pops a pre-allocated block. An empty pool (or a
    /// request larger than the negotiated block size) fabricates a fresh
    /// block instead; this is exceptional, allocates, and is reported to
    /// the log ring so the drain thread can flag the misconfiguration.
    pub fn borrow(&self, min_frames: usize) -> PooledBlock<'_> {
        let recycled = if min_frames <= self.block_frames {
            self.free.lock().pop()
        } else {
            None
        };

        let block = match recycled {
            Some(block) => block,
            None => {
                AudioLogger::global().log_message("BufferPool", "fabricating block");
                StereoBlock::new(self.block_frames.max(min_frames))
            }
        };

        PooledBlock {
            pool: self,
            block: Some(block),
        }
    }

    fn give_back(&self, block: StereoBlock) {
        // Oversized fabricated blocks are welcome back; they only grow the
        // pool toward the worst observed request.
        self.free.lock().push(block);
    }
}

/// Scoped handle to a borrowed [`StereoBlock`]; returns it on drop.
pub struct PooledBlock<'a> {
    pool: &'a BufferPool,
    block: Option<StereoBlock>,
}

impl PooledBlock<'_> {
    /// The borrowed block.
    pub fn block(&mut self) -> &mut StereoBlock {
        self.block.as_mut().expect("block present until drop")
    }
}

impl Drop for PooledBlock<'_> {
    fn drop(&mut self) {
        if let Some(block) = self.block.take() {
            self.pool.give_back(block);
        }
    }
}

impl core::ops::Deref for PooledBlock<'_> {
    type Target = StereoBlock;

    fn deref(&self) -> &StereoBlock {
        self.block.as_ref().expect("block present until drop")
    }
}

impl core::ops::DerefMut for PooledBlock<'_> {
    fn deref_mut(&mut self) -> &mut StereoBlock {
        self.block.as_mut().expect("block present until drop")
    }
}
