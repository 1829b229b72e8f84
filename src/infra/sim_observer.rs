use crate::control::GlobalPhase;
use crate::learning::{CorrectorError, FitReport};
use crate::sim::{SimConfig, StatusSummary};

/// Trait for observing simulation events
pub trait SimObserver {
    /// Called once before the first tick
    fn on_start(&mut self, _config: &SimConfig) {}

    /// Called when the global phase changes
    fn on_phase_change(&mut self, phase: GlobalPhase, tick: u64);

    /// Called at the end of every tick
    fn on_tick(&mut self, status: &StatusSummary);

    /// Called when a training session result has been installed
    fn on_training_complete(&mut self, _report: &FitReport) {}

    /// Called when a training session failed; the agent keeps its previous weights
    fn on_training_failed(&mut self, _agent: usize, _error: &CorrectorError) {}

    /// Called after the last tick, once in-flight sessions have settled
    fn on_finish(&mut self, _status: &StatusSummary) {}
}
