//! Process-wide storage for hardware-negotiated audio settings.
//!
//! The HAL driver is the single writer: it publishes the negotiated sample
//! rate, block size, and channel count before the first render callback
//! and only updates them outside block renders. Everything else (DSP,
//! control threads) reads. Plain atomics make this safe from any thread
//! without a lock on the hot path.

use core::sync::atomic::{AtomicU32, Ordering};

/// Negotiated hardware state: sample rate, block size, channel count.
pub struct AudioSettings {
    sample_rate: AtomicU32,
    block_size: AtomicU32,
    num_channels: AtomicU32,
}

static GLOBAL: AudioSettings = AudioSettings::new();

impl AudioSettings {
    const fn new() -> Self {
        Self {
            sample_rate: AtomicU32::new(44_100),
            block_size: AtomicU32::new(512),
            num_channels: AtomicU32::new(2),
        }
    }

    /// The process-wide settings instance.
    pub fn global() -> &'static AudioSettings {
        &GLOBAL
    }

    /// Current sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.load(Ordering::Relaxed)
    }

    /// Current block size in frames.
    pub fn block_size(&self) -> u32 {
        self.block_size.load(Ordering::Relaxed)
    }

    /// Current channel count.
    pub fn num_channels(&self) -> u32 {
        self.num_channels.load(Ordering::Relaxed)
    }

    /// HAL-side: publish a new sample rate. Must happen outside renders.
    pub fn set_sample_rate(&self, hz: u32) {
        self.sample_rate.store(hz, Ordering::Relaxed);
    }

    /// HAL-side: publish a new block size. Must happen outside renders.
    pub fn set_block_size(&self, frames: u32) {
        self.block_size.store(frames, Ordering::Relaxed);
    }

    /// HAL-side: publish a new channel count. Must happen outside renders.
    pub fn set_num_channels(&self, channels: u32) {
        self.num_channels.store(channels, Ordering::Relaxed);
    }
}
