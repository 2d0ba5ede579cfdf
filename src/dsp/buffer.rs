//! Sample buffer — auto-growing f64 storage with additive writes.

use std::iter;

use tracing::trace;

use crate::dsp::oscillator::MAX_SAMPLES;
use crate::error::{Result, SonoError};

/// Growable mono sample storage.
///
/// The logical length can run ahead of the allocated storage: a blank
/// written past the end only moves `len`, and the unallocated tail reads
/// as silence until something is mixed into it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleBuffer {
    data: Vec<f64>,
    len: usize,
}

impl SampleBuffer {
    pub fn new() -> Self {
        SampleBuffer::default()
    }

    /// Logical number of samples.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of zero-initialised samples currently allocated.
    pub fn allocated(&self) -> usize {
        self.data.len()
    }

    /// Make index `n - 1` addressable, zero-filling new storage.
    ///
    /// Storage grows to `n + len`, so a run of appends costs amortized O(1)
    /// per sample.
    pub fn ensure_length(&mut self, n: usize) -> Result<()> {
        if n <= self.data.len() {
            return Ok(());
        }
        if n > MAX_SAMPLES {
            return Err(SonoError::invalid(format!(
                "sample index {n} is beyond the longest track"
            )));
        }
        let target = n.saturating_add(self.len).min(MAX_SAMPLES);
        trace!(from = self.data.len(), to = target, "growing sample buffer");
        self.data
            .try_reserve_exact(target - self.data.len())
            .map_err(|e| SonoError::invalid(format!("cannot allocate {target} samples: {e}")))?;
        self.data.resize(target, 0.0);
        Ok(())
    }

    /// Extend the logical length to at least `n` without allocating.
    pub fn extend_to(&mut self, n: usize) {
        self.len = self.len.max(n);
    }

    /// Add `values` onto the samples starting at `offset`.
    pub fn mix(&mut self, offset: usize, values: &[f64]) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }
        let end = offset.checked_add(values.len()).ok_or_else(|| {
            SonoError::invalid(format!("cannot write {} samples at index {offset}", values.len()))
        })?;
        self.ensure_length(end)?;
        for (dst, &v) in self.data[offset..end].iter_mut().zip(values) {
            *dst += v;
        }
        self.extend_to(end);
        Ok(())
    }

    /// Iterate over the logical samples.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.data
            .iter()
            .copied()
            .chain(iter::repeat(0.0))
            .take(self.len)
    }

    /// Copy of the logical samples in `start..end`, clamped to the length.
    pub fn slice(&self, start: usize, end: usize) -> Vec<f64> {
        let end = end.min(self.len);
        let start = start.min(end);
        self.iter().skip(start).take(end - start).collect()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.iter().collect()
    }
}
