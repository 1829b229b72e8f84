use crate::control::GlobalPhase;
use crate::infra::Vec3;

/// Learning progress of one follower.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentStatus {
    pub agent: usize,
    pub buffered: usize,
    pub sessions: u64,
    pub training: bool,
    pub mean_loss: Option<f32>,
}

/// Snapshot handed to observers once per tick.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSummary {
    pub tick: u64,
    pub time: f32,
    pub phase: GlobalPhase,
    /// Position of every agent, base first
    pub positions: Vec<Vec3>,
    /// Per-follower learning status; empty until the correcting phase
    pub learners: Vec<AgentStatus>,
}

impl StatusSummary {
    pub fn position(&self, agent: usize) -> Option<Vec3> {
        agent
            .checked_sub(1)
            .and_then(|index| self.positions.get(index))
            .copied()
    }

    pub fn learner(&self, agent: usize) -> Option<&AgentStatus> {
        self.learners.iter().find(|s| s.agent == agent)
    }
}
