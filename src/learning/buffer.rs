use crate::state::RelativeState;

use super::TrainingBatch;

/// Sizes governing when a buffer trains and what it keeps afterwards.
#[derive(Debug, Clone, Copy)]
pub struct BufferConfig {
    /// Training is due once the buffer holds more than this many samples
    pub trigger_len: usize,
    /// Samples kept after a successful session
    pub retain_len: usize,
    /// Most recent samples used per session; also the minimum to train at all
    pub batch_len: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            trigger_len: 50,
            retain_len: 30,
            batch_len: 10,
        }
    }
}

/// One observation logged while correcting.
#[derive(Debug, Clone)]
pub struct CorrectionSample {
    pub state: RelativeState,
    pub predicted: Vec<f32>,
    pub ideal: Vec<f32>,
}

/// Rolling per-agent log of correction samples.
#[derive(Debug, Clone)]
pub struct TrainingBuffer {
    samples: Vec<CorrectionSample>,
    config: BufferConfig,
}

impl TrainingBuffer {
    pub fn new(config: BufferConfig) -> Self {
        Self {
            samples: Vec::with_capacity(config.trigger_len + 1),
            config,
        }
    }

    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    pub fn push(&mut self, sample: CorrectionSample) {
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[CorrectionSample] {
        &self.samples
    }

    /// True once the buffer has grown past the trigger length.
    pub fn is_due(&self) -> bool {
        self.samples.len() > self.config.trigger_len
    }

    /// True if there are enough samples for a full session batch.
    pub fn has_signal(&self) -> bool {
        self.samples.len() >= self.config.batch_len
    }

    /// Up to `n` most recent samples, oldest first.
    pub fn recent(&self, n: usize) -> &[CorrectionSample] {
        let start = self.samples.len().saturating_sub(n);
        &self.samples[start..]
    }

    /// Copies the latest `batch_len` samples into a training batch.
    pub fn snapshot_batch(&self) -> TrainingBatch {
        let recent = self.recent(self.config.batch_len);
        TrainingBatch {
            states: recent.iter().map(|s| *s.state.features()).collect(),
            targets: recent.iter().map(|s| s.ideal.clone()).collect(),
        }
    }

    /// Drops everything but the `retain_len` most recent samples.
    pub fn retain_recent(&mut self) {
        let excess = self.samples.len().saturating_sub(self.config.retain_len);
        if excess > 0 {
            self.samples.drain(..excess);
        }
    }
}
