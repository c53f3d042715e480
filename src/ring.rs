//! Lossy single-producer ring buffer shared between generator and viewers
//!
//! The layout is `#[repr(C)]` so the generator and a viewer process agree on
//! it when it is mapped from shared memory (see [`crate::shm`]). It can also
//! live on the heap via [`RingLayout::new_boxed`].
//!
//! # Protocol
//!
//! Producer, per sample:
//! 1. store the sample at `write_cursor`
//! 2. advance `write_cursor`
//! 3. if it caught up with `read_cursor`, push `read_cursor` forward one slot,
//!    dropping the oldest unread sample (never blocks)
//! 4. bump `total_produced`
//!
//! After a whole frame it raises `new_data_available`.
//!
//! Consumer: snapshot `write_cursor`; if the flag is up and the snapshot moved
//! since the last poll, drain from `read_cursor` up to the snapshot, store the
//! new `read_cursor` and clear the flag.
//!
//! Cursors and the flag use acquire loads and release stores. Samples are
//! relaxed and ordered by the cursor that publishes them. There is no lock: a
//! viewer may occasionally read a slot that is being overwritten, or see the
//! flag late. That is tolerated, the data only feeds a display.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, AtomicU64, Ordering};

/// Number of sample slots; one is always kept free to tell full from empty
pub const CAPACITY: usize = 16384;

const MASK: usize = CAPACITY - 1;

const _: () = assert!(CAPACITY.is_power_of_two());
const _: () = assert!(CAPACITY <= i32::MAX as usize);

/// Shared ring buffer in its in-memory (and shared-memory) layout
///
/// Field order is fixed: samples, write cursor, read cursor, new-data flag,
/// total produced. Samples are stored as `f64` bit patterns.
#[repr(C)]
pub struct RingLayout {
    samples: [AtomicU64; CAPACITY],
    write_cursor: AtomicI32,
    read_cursor: AtomicI32,
    new_data_available: AtomicBool,
    total_produced: AtomicU32,
}

// Cursors read from another process are masked so a corrupt value can never
// index out of bounds.
#[inline]
fn cursor_index(raw: i32) -> usize {
    (raw as u32 as usize) & MASK
}

#[inline]
fn next_index(index: usize) -> usize {
    (index + 1) & MASK
}

impl RingLayout {
    /// Zero-initialized layout on the heap
    pub fn new_boxed() -> Box<Self> {
        Box::new(Self {
            samples: std::array::from_fn(|_| AtomicU64::new(0)),
            write_cursor: AtomicI32::new(0),
            read_cursor: AtomicI32::new(0),
            new_data_available: AtomicBool::new(false),
            total_produced: AtomicU32::new(0),
        })
    }

    pub const fn capacity(&self) -> usize {
        CAPACITY
    }

    /// Clear every slot, both cursors, the flag and the counter
    pub fn reset(&self) {
        for slot in &self.samples {
            slot.store(0, Ordering::Relaxed);
        }
        self.total_produced.store(0, Ordering::Relaxed);
        self.read_cursor.store(0, Ordering::Release);
        self.write_cursor.store(0, Ordering::Release);
        self.new_data_available.store(false, Ordering::Release);
    }

    pub fn write_position(&self) -> usize {
        cursor_index(self.write_cursor.load(Ordering::Acquire))
    }

    pub fn read_position(&self) -> usize {
        cursor_index(self.read_cursor.load(Ordering::Acquire))
    }

    pub fn is_new_data_available(&self) -> bool {
        self.new_data_available.load(Ordering::Acquire)
    }

    /// Samples written since creation, modulo 2^32
    pub fn total_produced(&self) -> u32 {
        self.total_produced.load(Ordering::Relaxed)
    }

    /// Number of written samples the consumer has not read yet
    pub fn unread_len(&self) -> usize {
        self.write_position().wrapping_sub(self.read_position()) & MASK
    }

    pub fn sample_at(&self, index: usize) -> f64 {
        f64::from_bits(self.samples[index & MASK].load(Ordering::Relaxed))
    }

    /// Append one sample, overwriting the oldest unread one when full
    ///
    /// Does not raise `new_data_available`; see [`RingLayout::publish_frame`].
    pub fn push_sample(&self, sample: f64) {
        let write = self.write_position();
        self.samples[write].store(sample.to_bits(), Ordering::Relaxed);

        let next = next_index(write);
        self.write_cursor.store(next as i32, Ordering::Release);

        // Full: drop the oldest sample. If the consumer moved its cursor in
        // the meantime the buffer is no longer full and nothing is dropped.
        let _ = self.read_cursor.compare_exchange(
            next as i32,
            next_index(next) as i32,
            Ordering::AcqRel,
            Ordering::Acquire,
        );

        self.total_produced.fetch_add(1, Ordering::Relaxed);
    }

    /// Write a whole frame and raise the new-data flag
    ///
    /// An empty frame leaves the flag untouched.
    pub fn publish_frame(&self, frame: &[f64]) -> usize {
        for &sample in frame {
            self.push_sample(sample);
        }
        if !frame.is_empty() {
            self.new_data_available.store(true, Ordering::Release);
        }
        frame.len()
    }
}

/// Consumer-side cursor tracking for one viewer
#[derive(Debug, Default, Clone)]
pub struct RingReader {
    last_write: Option<usize>,
}

impl RingReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write position observed by the last successful drain
    pub fn last_seen_write(&self) -> Option<usize> {
        self.last_write
    }

    /// Drain everything published since the previous poll into `out`
    ///
    /// Returns how many samples were drained; 0 if no new frame was flagged.
    pub fn poll<E: Extend<f64>>(&mut self, ring: &RingLayout, out: &mut E) -> usize {
        let snapshot = ring.write_position();

        if !ring.is_new_data_available() || self.last_write == Some(snapshot) {
            return 0;
        }

        let read = ring.read_position();
        let count = snapshot.wrapping_sub(read) & MASK;

        out.extend((0..count).map(|i| ring.sample_at(read + i)));

        ring.read_cursor.store(snapshot as i32, Ordering::Release);
        ring.new_data_available.store(false, Ordering::Release);
        self.last_write = Some(snapshot);

        count
    }
}
