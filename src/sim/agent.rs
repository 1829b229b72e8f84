use tracing::warn;

use crate::control::FollowPolicy;
use crate::infra::Vec3;
use crate::learning::{
    BufferConfig, CorrectionSample, Corrector, OutputEncoding, SessionEvent, TrainingBuffer,
    TrainingScheduler, TriggerOutcome, labels,
};
use crate::state::{AgentState, RelativeState};

use super::AgentStatus;

/// Learning state owned by one follower.
pub struct Learner<C: Corrector> {
    encoding: OutputEncoding,
    corrector: Option<C>,
    buffer: TrainingBuffer,
    scheduler: TrainingScheduler<C>,
}

impl<C: Corrector> Learner<C> {
    pub fn new(
        agent: usize,
        encoding: OutputEncoding,
        corrector: Option<C>,
        buffer: BufferConfig,
    ) -> Self {
        Self {
            encoding,
            corrector,
            buffer: TrainingBuffer::new(buffer),
            scheduler: TrainingScheduler::new(agent),
        }
    }

    pub fn encoding(&self) -> OutputEncoding {
        self.encoding
    }

    pub fn corrector(&self) -> Option<&C> {
        self.corrector.as_ref()
    }

    pub fn buffer(&self) -> &TrainingBuffer {
        &self.buffer
    }

    pub fn scheduler(&self) -> &TrainingScheduler<C> {
        &self.scheduler
    }

    /// Predicts a correction and logs the sample with its heuristic label.
    /// `None` when there is no corrector or the prediction failed.
    fn observe(&mut self, agent: usize, state: RelativeState, dy: f32) -> Option<Vec3> {
        let corrector = self.corrector.as_ref()?;

        let predicted = match corrector.predict(&state) {
            Ok(predicted) => predicted,
            Err(e) => {
                warn!(agent, "Corrector prediction failed: {}", e);
                return None;
            }
        };
        let correction = match corrector.encoding().decode(&predicted) {
            Ok(correction) => correction,
            Err(e) => {
                warn!(agent, "Corrector output rejected: {}", e);
                return None;
            }
        };

        let ideal = labels::ideal_output(corrector.encoding(), &state, dy);
        self.buffer.push(CorrectionSample {
            state,
            predicted,
            ideal,
        });

        Some(correction)
    }

    fn poll(&mut self) -> Option<SessionEvent> {
        let corrector = self.corrector.as_mut()?;
        self.scheduler.poll(corrector, &mut self.buffer)
    }

    fn trigger(&mut self) -> TriggerOutcome {
        match self.corrector.as_ref() {
            Some(corrector) => self.scheduler.trigger(corrector, &self.buffer),
            None => TriggerOutcome::NotDue,
        }
    }

    async fn settle(&mut self) -> Option<SessionEvent> {
        let corrector = self.corrector.as_mut()?;
        self.scheduler.settle(corrector, &mut self.buffer).await
    }
}

/// One stacked unit. Agent 1 is the base and has no learner.
pub struct Agent<C: Corrector> {
    id: usize,
    pub state: AgentState,
    learner: Option<Learner<C>>,
}

impl<C: Corrector> Agent<C> {
    pub fn base(state: AgentState) -> Self {
        Self {
            id: 1,
            state,
            learner: None,
        }
    }

    pub fn follower(id: usize, state: AgentState, learner: Learner<C>) -> Self {
        Self {
            id,
            state,
            learner: Some(learner),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn learner(&self) -> Option<&Learner<C>> {
        self.learner.as_ref()
    }

    /// Correction for this tick, given the already-moved target.
    ///
    /// A state that fails the finiteness check skips learning for this tick;
    /// the caller still applies baseline motion.
    pub(crate) fn correct(&mut self, target: &AgentState, time: f32) -> Option<Vec3> {
        let learner = self.learner.as_mut()?;

        let state = match RelativeState::capture(&self.state, target, time) {
            Ok(state) => state,
            Err(e) => {
                warn!(agent = self.id, "Skipping correction: {}", e);
                return None;
            }
        };
        let dy = self.state.position.y - FollowPolicy::anchor(&self.state, target).y;

        learner.observe(self.id, state, dy)
    }

    pub(crate) fn poll_training(&mut self) -> Option<SessionEvent> {
        self.learner.as_mut()?.poll()
    }

    pub(crate) fn trigger_training(&mut self) -> Option<TriggerOutcome> {
        self.learner.as_mut().map(|learner| learner.trigger())
    }

    pub(crate) async fn settle_training(&mut self) -> Option<SessionEvent> {
        self.learner.as_mut()?.settle().await
    }

    pub fn status(&self) -> Option<AgentStatus> {
        let learner = self.learner.as_ref()?;
        let status = learner.scheduler.status();

        Some(AgentStatus {
            agent: self.id,
            buffered: learner.buffer.len(),
            sessions: status.sessions(),
            training: status.is_busy(),
            mean_loss: learner.scheduler.metrics().mean_loss(),
        })
    }
}
