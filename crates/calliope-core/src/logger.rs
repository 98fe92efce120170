//! Real-time telemetry through a lock-free SPSC ring.
//!
//! The audio thread must never block or allocate, so it cannot use an
//! ordinary logging backend. Instead it pushes fixed-size [`LogEntry`]
//! records into a single-producer/single-consumer ring buffer, and a
//! non-real-time drain thread pops them at its leisure. When the ring is
//! full the new entry is dropped silently — losing telemetry is acceptable,
//! stalling the render is not.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::OnceLock;

/// Maximum tag length in bytes.
pub const TAG_LEN: usize = 32;
/// Maximum message length in bytes.
pub const MESSAGE_LEN: usize = 64;

/// Default ring capacity (power of two).
const DEFAULT_CAPACITY: usize = 1024;

/// Discriminates the two record layouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogEntryKind {
    /// A static text message.
    Message,
    /// A named numeric event.
    Event,
}

/// One fixed-size telemetry record.
///
/// Tag and message text are stored inline (truncated to [`TAG_LEN`] /
/// [`MESSAGE_LEN`] bytes) so that producing an entry never allocates.
/// The timestamp is the engine's running sample count at the time of the
/// push.
#[derive(Clone, Copy, Debug)]
pub struct LogEntry {
    /// Record kind.
    pub kind: LogEntryKind,
    /// Numeric payload for [`LogEntryKind::Event`] records.
    pub value: f32,
    /// Engine sample time when the entry was produced.
    pub timestamp: u64,
    tag: [u8; TAG_LEN],
    tag_len: u8,
    message: [u8; MESSAGE_LEN],
    message_len: u8,
}

fn copy_truncated(dst: &mut [u8], src: &str) -> u8 {
    let n = src.len().min(dst.len());
    dst[..n].copy_from_slice(&src.as_bytes()[..n]);
    n as u8
}

impl LogEntry {
    fn new(kind: LogEntryKind, tag: &str, timestamp: u64) -> Self {
        let mut entry = Self {
            kind,
            value: 0.0,
            timestamp,
            tag: [0; TAG_LEN],
            tag_len: 0,
            message: [0; MESSAGE_LEN],
            message_len: 0,
        };
        entry.tag_len = copy_truncated(&mut entry.tag, tag);
        entry
    }

    /// The entry's tag. Tags are expected to be ASCII; a tag truncated
    /// mid-codepoint reads back as empty.
    pub fn tag(&self) -> &str {
        core::str::from_utf8(&self.tag[..self.tag_len as usize]).unwrap_or("")
    }

    /// The message text of a [`LogEntryKind::Message`] record (empty for
    /// events).
    pub fn message(&self) -> &str {
        core::str::from_utf8(&self.message[..self.message_len as usize]).unwrap_or("")
    }
}

/// Lock-free single-producer/single-consumer ring.
///
/// `head` is advanced only by the producer, `tail` only by the consumer.
/// Push publishes the written slot with a release store of `head` after an
/// acquire load of `tail`; pop mirrors this with an acquire load of `head`
/// and a release store of `tail`. One slot is sacrificed to distinguish
/// full from empty.
struct SpscRing<T> {
    buffer: Box<[UnsafeCell<T>]>,
    mask: usize,
    head: AtomicUsize,
    tail: AtomicUsize,
}

// One producer and one consumer may touch the ring concurrently; slot
// ownership is handed over through the head/tail release stores.
unsafe impl<T: Copy + Send> Sync for SpscRing<T> {}

impl<T: Copy + Default> SpscRing<T> {
    fn new(min_capacity: usize) -> Self {
        let capacity = min_capacity.next_power_of_two();
        let buffer: Vec<UnsafeCell<T>> =
            (0..capacity).map(|_| UnsafeCell::new(T::default())).collect();
        Self {
            buffer: buffer.into_boxed_slice(),
            mask: capacity - 1,
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Producer side. Returns false (entry dropped) when the ring is full.
    fn push(&self, item: T) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        if ((head + 1) & self.mask) == tail {
            return false;
        }
        // Sole producer: the slot at `head` is not visible to the consumer
        // until the release store below.
        unsafe {
            *self.buffer[head].get() = item;
        }
        self.head.store((head + 1) & self.mask, Ordering::Release);
        true
    }

    /// Consumer side.
    fn pop(&self) -> Option<T> {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        if tail == head {
            return None;
        }
        let item = unsafe { *self.buffer[tail].get() };
        self.tail.store((tail + 1) & self.mask, Ordering::Release);
        Some(item)
    }

    fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }
}

impl Default for LogEntry {
    fn default() -> Self {
        Self::new(LogEntryKind::Message, "", 0)
    }
}

/// Process-wide telemetry sink for the audio thread.
///
/// The audio thread is the sole producer ([`log_message`](Self::log_message)
/// and [`log_event`](Self::log_event)); one drain thread is the sole
/// consumer ([`pop`](Self::pop)). The engine advances the sample clock once
/// per block so entries carry a meaningful timestamp.
pub struct AudioLogger {
    ring: SpscRing<LogEntry>,
    now_samples: AtomicU64,
}

static GLOBAL: OnceLock<AudioLogger> = OnceLock::new();

impl AudioLogger {
    /// Creates a logger with at least `min_capacity` ring slots (rounded up
    /// to a power of two).
    pub fn with_capacity(min_capacity: usize) -> Self {
        Self {
            ring: SpscRing::new(min_capacity),
            now_samples: AtomicU64::new(0),
        }
    }

    /// The process-wide logger instance.
    pub fn global() -> &'static AudioLogger {
        GLOBAL.get_or_init(|| AudioLogger::with_capacity(DEFAULT_CAPACITY))
    }

    /// RT-safe: push a text message. Dropped silently if the ring is full.
    pub fn log_message(&self, tag: &str, message: &str) {
        let mut entry = LogEntry::new(LogEntryKind::Message, tag, self.now());
        entry.message_len = copy_truncated(&mut entry.message, message);
        self.ring.push(entry);
    }

    /// RT-safe: push a named numeric event. Dropped silently if the ring is
    /// full.
    pub fn log_event(&self, tag: &str, value: f32) {
        let mut entry = LogEntry::new(LogEntryKind::Event, tag, self.now());
        entry.value = value;
        self.ring.push(entry);
    }

    /// Drain-thread side: pop the oldest entry, if any.
    pub fn pop(&self) -> Option<LogEntry> {
        self.ring.pop()
    }

    /// True when no entries are waiting.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Advances the logger's sample clock. Called by the engine once per
    /// rendered block.
    pub fn advance_time(&self, samples: u64) {
        self.now_samples.fetch_add(samples, Ordering::Relaxed);
    }

    /// Current sample time used to stamp entries.
    pub fn now(&self) -> u64 {
        self.now_samples.load(Ordering::Relaxed)
    }
}
