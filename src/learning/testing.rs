//! Deterministic corrector for exercising the scheduler and simulation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

use crate::state::RelativeState;

use super::{
    BufferConfig, CorrectionSample, Corrector, CorrectorError, FitOutcome, OutputEncoding,
    TrainingBatch, TrainingBuffer,
};

#[derive(Debug, Clone)]
pub enum Script {
    Succeed,
    Fail,
    /// Blocks inside `fit` until the test also waits on the barrier
    Gate(Arc<Barrier>),
}

#[derive(Debug)]
pub struct ScriptedSnapshot {
    version: u32,
    script: Script,
    fits: Arc<AtomicUsize>,
}

/// Predicts a fixed output; each successful fit bumps a version number.
#[derive(Debug)]
pub struct ScriptedCorrector {
    encoding: OutputEncoding,
    output: Vec<f32>,
    version: u32,
    script: Script,
    fits: Arc<AtomicUsize>,
}

impl ScriptedCorrector {
    pub fn new(encoding: OutputEncoding, script: Script) -> Self {
        Self {
            encoding,
            output: vec![0.0; encoding.output_size()],
            version: 0,
            script,
            fits: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_output(mut self, output: Vec<f32>) -> Self {
        self.output = output;
        self
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn fits_started(&self) -> usize {
        self.fits.load(Ordering::SeqCst)
    }
}

impl Corrector for ScriptedCorrector {
    type Snapshot = ScriptedSnapshot;

    fn encoding(&self) -> OutputEncoding {
        self.encoding
    }

    fn predict(&self, _state: &RelativeState) -> Result<Vec<f32>, CorrectorError> {
        Ok(self.output.clone())
    }

    fn snapshot(&self) -> ScriptedSnapshot {
        ScriptedSnapshot {
            version: self.version,
            script: self.script.clone(),
            fits: self.fits.clone(),
        }
    }

    fn fit(
        snapshot: ScriptedSnapshot,
        batch: TrainingBatch,
    ) -> Result<FitOutcome<ScriptedSnapshot>, CorrectorError> {
        snapshot.fits.fetch_add(1, Ordering::SeqCst);
        if batch.is_empty() {
            return Err(CorrectorError::EmptyBatch);
        }

        match &snapshot.script {
            Script::Fail => return Err(CorrectorError::Backend("scripted failure".to_string())),
            Script::Gate(barrier) => {
                barrier.wait();
            }
            Script::Succeed => {}
        }

        Ok(FitOutcome {
            snapshot: ScriptedSnapshot {
                version: snapshot.version + 1,
                ..snapshot
            },
            loss: 0.5,
        })
    }

    fn install(&mut self, snapshot: ScriptedSnapshot) {
        self.version = snapshot.version;
    }
}

/// Buffer with default sizes holding `count` samples tagged by index in `dx`.
pub fn filled_buffer(count: usize) -> TrainingBuffer {
    let mut buffer = TrainingBuffer::new(BufferConfig::default());
    for i in 0..count {
        let state = RelativeState::from_features([i as f32, 0.0, 0.0, 0.0, 0.0, 1.0])
            .expect("finite features");
        buffer.push(CorrectionSample {
            state,
            predicted: vec![0.0; 3],
            ideal: vec![-(i as f32) * 0.5, 0.0, 0.0],
        });
    }
    buffer
}
