//! Bounded PCM16 accumulator fed by the speech synthesizer.
//!
//! **Why**: synthesis is buffered to completion before playback starts, so
//! worst-case memory has to be bounded up front. The buffer truncates instead
//! of growing; a very long utterance loses its tail rather than the device
//! losing its heap.
//!
//! **Used by**: sequencer (clear/snapshot/package), synthesizer (push writes)

use log::trace;
use std::sync::{Arc, Mutex};

/// Fixed-capacity PCM16 mono sample buffer.
///
/// Capacity is set once at construction (`sample_rate * max_seconds` samples)
/// and never changes. `append` copies `min(incoming, remaining)` samples and
/// silently drops the rest.
#[derive(Debug)]
pub struct PcmBuffer {
    storage: Vec<i16>,
    capacity: usize,
}

impl PcmBuffer {
    /// Allocate a buffer holding at most `capacity_samples` samples.
    pub fn with_capacity(capacity_samples: usize) -> Self {
        Self {
            storage: Vec::with_capacity(capacity_samples),
            capacity: capacity_samples,
        }
    }

    /// Reset length to zero without releasing the allocation.
    pub fn clear(&mut self) {
        self.storage.clear();
    }

    /// Append samples, truncating at capacity. Returns how many were stored.
    pub fn append(&mut self, samples: &[i16]) -> usize {
        let room = self.capacity - self.storage.len();
        let take = samples.len().min(room);
        self.storage.extend_from_slice(&samples[..take]);
        if take < samples.len() {
            trace!("pcm buffer full, dropped {} samples", samples.len() - take);
        }
        take
    }

    pub fn samples(&self) -> &[i16] {
        &self.storage
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.storage.len()
    }
}

/// Cloneable handle to the shared accumulator.
///
/// One end lives in the sequencer (clear before synthesis, snapshot for
/// packaging), the other in the synthesizer, which may push from its own
/// context after `speak()` has returned.
#[derive(Debug, Clone)]
pub struct PcmSink {
    inner: Arc<Mutex<PcmBuffer>>,
}

impl PcmSink {
    pub fn new(capacity_samples: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PcmBuffer::with_capacity(capacity_samples))),
        }
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Push samples; returns how many were stored (rest truncated).
    pub fn push(&self, samples: &[i16]) -> usize {
        self.lock().append(samples)
    }

    /// Push a little-endian PCM16 byte stream. An odd trailing byte is
    /// dropped; writes happen at sample granularity. Returns bytes consumed.
    pub fn push_bytes(&self, bytes: &[u8]) -> usize {
        let samples: Vec<i16> = bytes
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]))
            .collect();
        self.lock().append(&samples) * 2
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    /// Copy out the accumulated samples for packaging.
    pub fn snapshot(&self) -> Vec<i16> {
        self.lock().samples().to_vec()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PcmBuffer> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
