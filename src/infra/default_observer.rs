use tracing::{debug, info, warn};

use crate::control::GlobalPhase;
use crate::learning::{CorrectorError, FitReport};
use crate::sim::{SimConfig, StatusSummary};

use super::SimObserver;

/// Logs progress through `tracing`, with a status line every `status_every` ticks.
pub struct DefaultObserver {
    status_every: u64,
}

impl DefaultObserver {
    pub fn new(status_every: u64) -> Self {
        Self { status_every }
    }

    fn is_status_tick(&self, tick: u64) -> bool {
        self.status_every > 0 && tick % self.status_every == 0
    }
}

impl SimObserver for DefaultObserver {
    fn on_start(&mut self, config: &SimConfig) {
        info!("Simulation started");
        info!("- agents: {}", config.heights.len());
        info!("- radius: {}", config.radius);
        info!("- correcting after tick {}", config.correct_after);
        let encodings: Vec<&str> = config.encodings.iter().map(|e| e.as_str()).collect();
        info!("- encodings: {}", encodings.join(", "));
        if let Some(max_ticks) = config.max_ticks {
            info!("- ticks: {}", max_ticks);
        }
    }

    fn on_phase_change(&mut self, phase: GlobalPhase, tick: u64) {
        info!("Phase {} at tick {}", phase, tick);
    }

    fn on_tick(&mut self, status: &StatusSummary) {
        if !self.is_status_tick(status.tick) {
            return;
        }

        let top = status.positions.last().copied().unwrap_or_default();
        info!(
            "tick: {}, time: {:.2}, phase: {}, top: {}",
            status.tick, status.time, status.phase, top
        );

        for learner in &status.learners {
            match learner.mean_loss {
                Some(loss) => info!(
                    "  agent {}: buffered {}, sessions {}, training {}, loss {:.4}",
                    learner.agent, learner.buffered, learner.sessions, learner.training, loss
                ),
                None => info!(
                    "  agent {}: buffered {}, sessions {}, training {}",
                    learner.agent, learner.buffered, learner.sessions, learner.training
                ),
            }
        }
    }

    fn on_training_complete(&mut self, report: &FitReport) {
        debug!(
            "Agent {} session {} on {} samples, loss {:.4}",
            report.agent, report.session, report.samples, report.loss
        );
    }

    fn on_training_failed(&mut self, agent: usize, error: &CorrectorError) {
        warn!("Agent {} kept previous weights: {}", agent, error);
    }

    fn on_finish(&mut self, status: &StatusSummary) {
        info!("Simulation finished after {} ticks", status.tick);
        for (index, position) in status.positions.iter().enumerate() {
            info!("- agent {}: {}", index + 1, position);
        }
        for learner in &status.learners {
            info!(
                "- agent {} trained {} sessions",
                learner.agent, learner.sessions
            );
        }
    }
}
