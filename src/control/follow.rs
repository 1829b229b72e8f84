use crate::infra::Vec3;
use crate::state::AgentState;

use super::GlobalPhase;

/// Proportional gains for both control phases.
#[derive(Debug, Clone, Copy)]
pub struct FollowGains {
    /// x/z gain while following
    pub horizontal: f32,
    /// y gain while following
    pub vertical: f32,
    /// Baseline gain on all axes while correcting
    pub correcting: f32,
}

impl Default for FollowGains {
    fn default() -> Self {
        Self {
            horizontal: 0.3,
            vertical: 0.2,
            correcting: 0.02,
        }
    }
}

/// Moves a learner toward the spot directly on top of its target.
#[derive(Debug, Clone, Copy, Default)]
pub struct FollowPolicy {
    gains: FollowGains,
}

impl FollowPolicy {
    pub fn new(gains: FollowGains) -> Self {
        Self { gains }
    }

    pub fn gains(&self) -> &FollowGains {
        &self.gains
    }

    /// Where the learner sits when stacked on the target.
    pub fn anchor(learner: &AgentState, target: &AgentState) -> Vec3 {
        Vec3::new(
            target.position.x,
            target.position.y + target.half_height() + learner.half_height(),
            target.position.z,
        )
    }

    /// Position delta for this tick.
    ///
    /// While correcting, `correction` is added on top of the weak baseline pull.
    /// Without a correction the learner keeps the following-phase gains, so an
    /// agent whose corrector is missing or whose state was rejected still tracks.
    pub fn step(
        &self,
        learner: &AgentState,
        target: &AgentState,
        phase: GlobalPhase,
        correction: Option<Vec3>,
    ) -> Vec3 {
        let error = Self::anchor(learner, target) - learner.position;

        match (phase, correction) {
            (GlobalPhase::Correcting, Some(correction)) => {
                error * self.gains.correcting + correction
            }
            _ => error.scale_by(Vec3::new(
                self.gains.horizontal,
                self.gains.vertical,
                self.gains.horizontal,
            )),
        }
    }
}
