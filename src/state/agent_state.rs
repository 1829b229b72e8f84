use crate::infra::Vec3;

/// Kinematic record of one stacked agent.
///
/// Position is double-buffered: `begin_tick` remembers where the agent was,
/// `finish_tick` derives velocity from the displacement. Velocity is never set
/// directly.
#[derive(Debug, Clone)]
pub struct AgentState {
    pub position: Vec3,
    previous: Vec3,
    velocity: Vec3,
    height: f32,
}

impl AgentState {
    pub fn new(position: Vec3, height: f32) -> Self {
        Self {
            position,
            previous: position,
            velocity: Vec3::ZERO,
            height,
        }
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn half_height(&self) -> f32 {
        self.height / 2.0
    }

    /// Velocity measured over the last completed tick.
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn begin_tick(&mut self) {
        self.previous = self.position;
    }

    pub fn finish_tick(&mut self) {
        self.velocity = self.position - self.previous;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_velocity_is_last_displacement() {
        let mut state = AgentState::new(Vec3::new(1.0, 0.5, 0.0), 1.0);
        assert_eq!(state.velocity(), Vec3::ZERO);

        state.begin_tick();
        state.position = Vec3::new(1.5, 0.5, -0.25);
        state.finish_tick();
        assert_eq!(state.velocity(), Vec3::new(0.5, 0.0, -0.25));

        // A stationary tick resets velocity
        state.begin_tick();
        state.finish_tick();
        assert_eq!(state.velocity(), Vec3::ZERO);
    }

    #[test]
    fn test_half_height() {
        let state = AgentState::new(Vec3::ZERO, 1.5);
        assert!((state.half_height() - 0.75).abs() < 1e-6);
    }
}
