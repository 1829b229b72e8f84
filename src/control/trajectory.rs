/// Closed-form circular path for the base agent.
#[derive(Debug, Clone, Copy)]
pub struct TrajectoryDriver {
    radius: f32,
}

impl TrajectoryDriver {
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Returns the base's `(x, z)` at `time`.
    pub fn advance(&self, time: f32) -> (f32, f32) {
        (time.cos() * self.radius, time.sin() * self.radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_on_positive_x_axis() {
        let driver = TrajectoryDriver::new(1.5);
        let (x, z) = driver.advance(0.0);
        assert!((x - 1.5).abs() < 1e-6);
        assert!(z.abs() < 1e-6);
    }

    #[test]
    fn test_stays_on_circle() {
        let driver = TrajectoryDriver::new(1.5);
        for step in 0..1000 {
            let (x, z) = driver.advance(step as f32 * 0.037);
            assert!((x * x + z * z - 2.25).abs() < 1e-4, "off circle at step {}", step);
        }
    }
}
