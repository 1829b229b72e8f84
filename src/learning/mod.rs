//! Online correction learning for follower agents
//!
//! Each follower owns a small corrector that maps its relative state to a
//! position correction, plus a rolling buffer of what it predicted and what a
//! hand-written rule says it should have predicted.
//!
//! ```text
//! RelativeState ──▶ Corrector::predict ──▶ OutputEncoding::decode ──▶ correction
//!       │                   │
//!       │                   ▼
//!       └──▶ labels::ideal_output ──▶ TrainingBuffer (state, predicted, ideal)
//!                                             │ len > 50
//!                                             ▼
//!                                    TrainingScheduler ──▶ spawn_blocking(fit)
//!                                             ▲                    │
//!                                             └── oneshot result ◀─┘
//!                                                 install + keep latest 30
//! ```

mod buffer;
mod corrector;
pub mod labels;
pub mod metrics;
pub mod policy;
mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use buffer::{BufferConfig, CorrectionSample, TrainingBuffer};
pub use corrector::{
    Corrector, CorrectorError, DIRECT_SCALE, FitOutcome, OutputEncoding, SIGNED_SCALE,
    TrainingBatch,
};
pub use metrics::{MovingAverage, TrainingMetrics};
pub use policy::{BurnCorrector, CorrectorConfig, CorrectorNet};
pub use scheduler::{FitReport, SessionEvent, TrainingScheduler, TrainingStatus, TriggerOutcome};
