use std::error::Error;
use std::fmt;
use std::str::FromStr;

use crate::infra::Vec3;
use crate::state::{RelativeState, STATE_DIM};

/// Step size applied to the direct encoding's activation differences
pub const DIRECT_SCALE: f32 = 0.1;
/// Step size applied to the signed encoding's per-axis outputs
pub const SIGNED_SCALE: f32 = 0.15;

#[derive(Debug)]
pub enum CorrectorError {
    /// A relative-state feature was NaN or infinite
    NonFiniteState,
    /// Model produced the wrong number of outputs for its encoding
    OutputSize { expected: usize, actual: usize },
    /// Training was requested with no samples
    EmptyBatch,
    /// Training produced a non-finite loss
    Diverged,
    /// Tensor backend failure
    Backend(String),
    /// No async runtime to run training on
    Runtime(String),
    /// Training task ended without reporting back
    Aborted,
}

impl fmt::Display for CorrectorError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CorrectorError::NonFiniteState => write!(formatter, "relative state is not finite"),
            CorrectorError::OutputSize { expected, actual } => {
                write!(formatter, "expected {} outputs, got {}", expected, actual)
            }
            CorrectorError::EmptyBatch => write!(formatter, "training batch is empty"),
            CorrectorError::Diverged => write!(formatter, "training loss is not finite"),
            CorrectorError::Backend(message) => write!(formatter, "backend error: {}", message),
            CorrectorError::Runtime(message) => write!(formatter, "runtime error: {}", message),
            CorrectorError::Aborted => write!(formatter, "training task aborted"),
        }
    }
}

impl Error for CorrectorError {}

/// How a corrector's raw outputs map onto a position correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputEncoding {
    /// Six activations in [0, 1]: up, down, left, right, forward, back
    Direct,
    /// Three per-axis corrections in [-1, 1]
    Signed,
}

impl OutputEncoding {
    pub fn output_size(&self) -> usize {
        match self {
            OutputEncoding::Direct => 6,
            OutputEncoding::Signed => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputEncoding::Direct => "direct",
            OutputEncoding::Signed => "signed",
        }
    }

    /// Turns raw model outputs into a position correction.
    pub fn decode(&self, raw: &[f32]) -> Result<Vec3, CorrectorError> {
        if raw.len() != self.output_size() {
            return Err(CorrectorError::OutputSize {
                expected: self.output_size(),
                actual: raw.len(),
            });
        }

        let correction = match self {
            OutputEncoding::Direct => {
                let [up, down, left, right, forward, back] = [
                    raw[0], raw[1], raw[2], raw[3], raw[4], raw[5],
                ];
                Vec3::new(right - left, up - down, back - forward) * DIRECT_SCALE
            }
            OutputEncoding::Signed => Vec3::new(raw[0], raw[1], raw[2]) * SIGNED_SCALE,
        };
        Ok(correction)
    }
}

impl fmt::Display for OutputEncoding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(OutputEncoding::Direct),
            "signed" => Ok(OutputEncoding::Signed),
            other => Err(format!("unknown encoding '{}'", other)),
        }
    }
}

/// Inputs and labels for one training session.
#[derive(Debug, Clone, Default)]
pub struct TrainingBatch {
    pub states: Vec<[f32; STATE_DIM]>,
    pub targets: Vec<Vec<f32>>,
}

impl TrainingBatch {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Result of a finished training session.
#[derive(Debug)]
pub struct FitOutcome<S> {
    /// Trained weights, ready to be installed
    pub snapshot: S,
    /// Mean loss over the session
    pub loss: f32,
}

/// A per-agent function approximator from relative state to correction.
///
/// Training never touches the live weights: the scheduler takes a
/// [`Corrector::snapshot`], trains it off-thread with [`Corrector::fit`], and
/// hands the result back through [`Corrector::install`]. Predictions made in
/// between use the old weights.
pub trait Corrector: 'static {
    /// Detached copy of the trainable state.
    type Snapshot: Send + 'static;

    fn encoding(&self) -> OutputEncoding;

    /// Raw outputs, `encoding().output_size()` values.
    fn predict(&self, state: &RelativeState) -> Result<Vec<f32>, CorrectorError>;

    fn snapshot(&self) -> Self::Snapshot;

    /// One epoch over `batch`. Runs on a blocking worker thread.
    fn fit(
        snapshot: Self::Snapshot,
        batch: TrainingBatch,
    ) -> Result<FitOutcome<Self::Snapshot>, CorrectorError>;

    fn install(&mut self, snapshot: Self::Snapshot);

    /// Predicts and decodes in one go.
    fn correction(&self, state: &RelativeState) -> Result<Vec3, CorrectorError> {
        let raw = self.predict(state)?;
        self.encoding().decode(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_decode() {
        // up, down, left, right, forward, back
        let raw = [1.0, 0.0, 0.0, 1.0, 1.0, 0.0];
        let correction = OutputEncoding::Direct.decode(&raw).unwrap();

        assert!((correction.x - 0.1).abs() < 1e-6);
        assert!((correction.y - 0.1).abs() < 1e-6);
        assert!((correction.z + 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_signed_decode() {
        let correction = OutputEncoding::Signed.decode(&[1.0, -0.5, 0.0]).unwrap();

        assert!((correction.x - 0.15).abs() < 1e-6);
        assert!((correction.y + 0.075).abs() < 1e-6);
        assert_eq!(correction.z, 0.0);
    }

    #[test]
    fn test_decode_rejects_wrong_size() {
        let result = OutputEncoding::Signed.decode(&[0.0; 6]);
        assert!(matches!(
            result,
            Err(CorrectorError::OutputSize {
                expected: 3,
                actual: 6
            })
        ));
    }

    #[test]
    fn test_parse_encoding() {
        assert_eq!("Direct".parse::<OutputEncoding>(), Ok(OutputEncoding::Direct));
        assert_eq!(" signed ".parse::<OutputEncoding>(), Ok(OutputEncoding::Signed));
        assert!("sideways".parse::<OutputEncoding>().is_err());
    }
}
