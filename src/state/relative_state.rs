use crate::learning::CorrectorError;

use super::AgentState;

/// Number of features fed to a corrector.
pub const STATE_DIM: usize = 6;

/// Learner-to-target relationship at one instant:
/// `[dx, dz, target_vx, target_vz, sin(time), cos(time)]`.
///
/// Built fresh every tick from current positions; never carried over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativeState {
    features: [f32; STATE_DIM],
}

impl RelativeState {
    /// Fails with `NonFiniteState` if any feature is NaN or infinite.
    pub fn capture(
        learner: &AgentState,
        target: &AgentState,
        time: f32,
    ) -> Result<Self, CorrectorError> {
        let target_velocity = target.velocity();
        let features = [
            learner.position.x - target.position.x,
            learner.position.z - target.position.z,
            target_velocity.x,
            target_velocity.z,
            time.sin(),
            time.cos(),
        ];

        Self::from_features(features)
    }

    pub fn from_features(features: [f32; STATE_DIM]) -> Result<Self, CorrectorError> {
        if features.iter().all(|f| f.is_finite()) {
            Ok(Self { features })
        } else {
            Err(CorrectorError::NonFiniteState)
        }
    }

    pub fn features(&self) -> &[f32; STATE_DIM] {
        &self.features
    }

    pub fn dx(&self) -> f32 {
        self.features[0]
    }

    pub fn dz(&self) -> f32 {
        self.features[1]
    }

    pub fn target_vx(&self) -> f32 {
        self.features[2]
    }

    pub fn target_vz(&self) -> f32 {
        self.features[3]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::Vec3;

    #[test]
    fn test_capture_layout() {
        let mut target = AgentState::new(Vec3::new(1.0, 1.0, 2.0), 2.0);
        target.begin_tick();
        target.position = Vec3::new(1.5, 1.0, 1.5);
        target.finish_tick();

        let learner = AgentState::new(Vec3::new(0.0, 2.5, 0.0), 1.0);
        let state = RelativeState::capture(&learner, &target, 0.0).unwrap();

        let f = state.features();
        assert!((f[0] - -1.5).abs() < 1e-6);
        assert!((f[1] - -1.5).abs() < 1e-6);
        assert!((f[2] - 0.5).abs() < 1e-6);
        assert!((f[3] - -0.5).abs() < 1e-6);
        assert!((f[4] - 0.0).abs() < 1e-6);
        assert!((f[5] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_non_finite() {
        let target = AgentState::new(Vec3::ZERO, 1.0);
        let learner = AgentState::new(Vec3::new(f32::NAN, 0.0, 0.0), 1.0);

        assert!(matches!(
            RelativeState::capture(&learner, &target, 0.0),
            Err(CorrectorError::NonFiniteState)
        ));
    }
}
