//! Per-agent training trigger
//!
//! ```text
//!        buffer due, idle, enough samples
//!   IDLE ─────────────────────────────────▶ TRAINING
//!    ▲                                         │
//!    └──────── session result received ◀───────┘
//!              (success: install + evict + count)
//! ```
//!
//! Sessions run on tokio's blocking pool. The result comes back over a
//! oneshot channel that is polled once per tick, so the tick never waits.

use tokio::runtime::Handle;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::{debug, info, warn};

use super::metrics::TrainingMetrics;
use super::{Corrector, CorrectorError, FitOutcome, TrainingBuffer};

/// Busy flag plus completed-session counter for one agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrainingStatus {
    busy: bool,
    sessions: u64,
}

impl TrainingStatus {
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn sessions(&self) -> u64 {
        self.sessions
    }
}

/// What a trigger attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A session was started
    Started,
    /// A session is already in flight; the attempt was dropped
    Busy,
    /// The buffer has not grown past its trigger length
    NotDue,
    /// Too few samples for a batch
    LowSignal,
    /// No tokio runtime to train on
    NoRuntime,
}

/// A finished session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitReport {
    pub agent: usize,
    /// Session count after this one
    pub session: u64,
    pub loss: f32,
    pub samples: usize,
}

#[derive(Debug)]
pub enum SessionEvent {
    Completed(FitReport),
    Failed { agent: usize, error: CorrectorError },
}

type FitResult<S> = Result<FitOutcome<S>, CorrectorError>;

struct PendingFit<S> {
    receiver: oneshot::Receiver<FitResult<S>>,
    samples: usize,
}

pub struct TrainingScheduler<C: Corrector> {
    agent: usize,
    status: TrainingStatus,
    pending: Option<PendingFit<C::Snapshot>>,
    metrics: TrainingMetrics,
}

impl<C: Corrector> TrainingScheduler<C> {
    pub fn new(agent: usize) -> Self {
        Self {
            agent,
            status: TrainingStatus::default(),
            pending: None,
            metrics: TrainingMetrics::default(),
        }
    }

    pub fn status(&self) -> TrainingStatus {
        self.status
    }

    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    /// Starts a session if the buffer is due and nothing is in flight.
    ///
    /// Attempts made while busy are dropped, not queued. The buffer is only
    /// read here; eviction waits for a successful result.
    pub fn trigger(&mut self, corrector: &C, buffer: &TrainingBuffer) -> TriggerOutcome {
        if self.status.busy {
            return TriggerOutcome::Busy;
        }
        if !buffer.is_due() {
            return TriggerOutcome::NotDue;
        }
        if !buffer.has_signal() {
            debug!(
                agent = self.agent,
                buffered = buffer.len(),
                "Skipping training, too few samples"
            );
            return TriggerOutcome::LowSignal;
        }

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                warn!(agent = self.agent, "Cannot start training: {}", e);
                return TriggerOutcome::NoRuntime;
            }
        };

        let batch = buffer.snapshot_batch();
        let samples = batch.len();
        let snapshot = corrector.snapshot();
        let (sender, receiver) = oneshot::channel();

        self.status.busy = true;
        handle.spawn_blocking(move || {
            // Receiver may be gone if the simulation was dropped mid-session
            let _ = sender.send(C::fit(snapshot, batch));
        });
        self.pending = Some(PendingFit { receiver, samples });

        debug!(
            agent = self.agent,
            buffered = buffer.len(),
            samples,
            "Training session started"
        );
        TriggerOutcome::Started
    }

    /// Applies a finished session, if any, without waiting.
    pub fn poll(&mut self, corrector: &mut C, buffer: &mut TrainingBuffer) -> Option<SessionEvent> {
        let pending = self.pending.as_mut()?;
        let result = match pending.receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => Err(CorrectorError::Aborted),
        };
        let samples = pending.samples;
        self.pending = None;

        Some(self.complete(result, samples, corrector, buffer))
    }

    /// Waits for the in-flight session, if any, and applies it.
    pub async fn settle(
        &mut self,
        corrector: &mut C,
        buffer: &mut TrainingBuffer,
    ) -> Option<SessionEvent> {
        let pending = self.pending.take()?;
        let result = pending
            .receiver
            .await
            .unwrap_or(Err(CorrectorError::Aborted));

        Some(self.complete(result, pending.samples, corrector, buffer))
    }

    fn complete(
        &mut self,
        result: FitResult<C::Snapshot>,
        samples: usize,
        corrector: &mut C,
        buffer: &mut TrainingBuffer,
    ) -> SessionEvent {
        self.status.busy = false;

        match result {
            Ok(outcome) => {
                corrector.install(outcome.snapshot);
                buffer.retain_recent();
                self.status.sessions += 1;
                self.metrics.record_success(outcome.loss);

                info!(
                    agent = self.agent,
                    session = self.status.sessions,
                    loss = outcome.loss,
                    "Training session complete"
                );
                SessionEvent::Completed(FitReport {
                    agent: self.agent,
                    session: self.status.sessions,
                    loss: outcome.loss,
                    samples,
                })
            }
            Err(error) => {
                self.metrics.record_failure();
                warn!(agent = self.agent, "Training session failed: {}", error);
                SessionEvent::Failed {
                    agent: self.agent,
                    error,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learning::testing::{Script, ScriptedCorrector, filled_buffer};
    use crate::learning::{BufferConfig, OutputEncoding};
    use std::sync::{Arc, Barrier};

    #[tokio::test]
    async fn test_trains_evicts_and_counts() {
        let mut corrector = ScriptedCorrector::new(OutputEncoding::Signed, Script::Succeed);
        let mut buffer = filled_buffer(51);
        let mut scheduler = TrainingScheduler::<ScriptedCorrector>::new(2);

        assert_eq!(scheduler.trigger(&corrector, &buffer), TriggerOutcome::Started);
        assert!(scheduler.status().is_busy());

        let event = scheduler.settle(&mut corrector, &mut buffer).await;
        match event {
            Some(SessionEvent::Completed(report)) => {
                assert_eq!(report.agent, 2);
                assert_eq!(report.session, 1);
                assert_eq!(report.samples, 10);
            }
            other => panic!("unexpected event {:?}", other),
        }

        assert_eq!(buffer.len(), 30);
        assert_eq!(scheduler.status().sessions(), 1);
        assert!(!scheduler.status().is_busy());
        assert_eq!(corrector.version(), 1);
    }

    #[tokio::test]
    async fn test_not_due_until_past_trigger() {
        let corrector = ScriptedCorrector::new(OutputEncoding::Signed, Script::Succeed);
        let buffer = filled_buffer(50);
        let mut scheduler = TrainingScheduler::<ScriptedCorrector>::new(2);

        assert_eq!(scheduler.trigger(&corrector, &buffer), TriggerOutcome::NotDue);
        assert!(!scheduler.status().is_busy());
        assert_eq!(corrector.fits_started(), 0);
    }

    #[tokio::test]
    async fn test_failure_keeps_buffer() {
        let mut corrector = ScriptedCorrector::new(OutputEncoding::Signed, Script::Fail);
        let mut buffer = filled_buffer(55);
        let mut scheduler = TrainingScheduler::<ScriptedCorrector>::new(3);

        assert_eq!(scheduler.trigger(&corrector, &buffer), TriggerOutcome::Started);
        let event = scheduler.settle(&mut corrector, &mut buffer).await;

        assert!(matches!(event, Some(SessionEvent::Failed { agent: 3, .. })));
        assert_eq!(buffer.len(), 55);
        assert_eq!(scheduler.status().sessions(), 0);
        assert!(!scheduler.status().is_busy());
        assert_eq!(scheduler.metrics().failed, 1);
        assert_eq!(corrector.version(), 0);

        // The intact buffer is retried on the next check
        assert_eq!(scheduler.trigger(&corrector, &buffer), TriggerOutcome::Started);
    }

    #[tokio::test]
    async fn test_second_trigger_while_busy_is_dropped() {
        let gate = Arc::new(Barrier::new(2));
        let mut corrector =
            ScriptedCorrector::new(OutputEncoding::Signed, Script::Gate(gate.clone()));
        let mut buffer = filled_buffer(51);
        let mut scheduler = TrainingScheduler::<ScriptedCorrector>::new(2);

        assert_eq!(scheduler.trigger(&corrector, &buffer), TriggerOutcome::Started);

        let before: Vec<f32> = buffer.samples().iter().map(|s| s.state.dx()).collect();
        assert_eq!(scheduler.trigger(&corrector, &buffer), TriggerOutcome::Busy);
        assert_eq!(scheduler.trigger(&corrector, &buffer), TriggerOutcome::Busy);
        let after: Vec<f32> = buffer.samples().iter().map(|s| s.state.dx()).collect();
        assert_eq!(before, after);

        // Still in flight: polling must not block or complete
        assert!(scheduler.poll(&mut corrector, &mut buffer).is_none());
        assert!(scheduler.status().is_busy());

        gate.wait();
        let event = scheduler.settle(&mut corrector, &mut buffer).await;
        assert!(matches!(event, Some(SessionEvent::Completed(_))));
        assert_eq!(corrector.fits_started(), 1);
        assert_eq!(scheduler.status().sessions(), 1);
    }

    #[tokio::test]
    async fn test_low_signal_stays_idle() {
        let corrector = ScriptedCorrector::new(OutputEncoding::Signed, Script::Succeed);
        let config = BufferConfig {
            trigger_len: 4,
            retain_len: 3,
            batch_len: 10,
        };
        let mut buffer = TrainingBuffer::new(config);
        for sample in filled_buffer(6).samples() {
            buffer.push(sample.clone());
        }
        let mut scheduler = TrainingScheduler::<ScriptedCorrector>::new(2);

        assert_eq!(scheduler.trigger(&corrector, &buffer), TriggerOutcome::LowSignal);
        assert!(!scheduler.status().is_busy());
        assert_eq!(corrector.fits_started(), 0);
    }

    #[test]
    fn test_no_runtime_is_local_failure() {
        let corrector = ScriptedCorrector::new(OutputEncoding::Signed, Script::Succeed);
        let buffer = filled_buffer(51);
        let mut scheduler = TrainingScheduler::<ScriptedCorrector>::new(2);

        assert_eq!(scheduler.trigger(&corrector, &buffer), TriggerOutcome::NoRuntime);
        assert!(!scheduler.status().is_busy());
    }

    #[tokio::test]
    async fn test_poll_picks_up_finished_session() {
        let mut corrector = ScriptedCorrector::new(OutputEncoding::Direct, Script::Succeed);
        let mut buffer = filled_buffer(60);
        let mut scheduler = TrainingScheduler::<ScriptedCorrector>::new(4);

        scheduler.trigger(&corrector, &buffer);

        let mut event = None;
        for _ in 0..1000 {
            event = scheduler.poll(&mut corrector, &mut buffer);
            if event.is_some() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }

        assert!(matches!(event, Some(SessionEvent::Completed(_))));
        assert_eq!(buffer.len(), 30);
    }
}
