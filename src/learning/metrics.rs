//! Per-agent training bookkeeping

use std::collections::VecDeque;

/// Moving average calculator
#[derive(Debug, Clone)]
pub struct MovingAverage {
    values: VecDeque<f32>,
    window_size: usize,
    sum: f32,
}

impl MovingAverage {
    pub fn new(window_size: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(window_size),
            window_size,
            sum: 0.0,
        }
    }

    pub fn push(&mut self, value: f32) {
        if self.values.len() >= self.window_size {
            if let Some(old) = self.values.pop_front() {
                self.sum -= old;
            }
        }
        self.values.push_back(value);
        self.sum += value;
    }

    pub fn average(&self) -> Option<f32> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.sum / self.values.len() as f32)
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Session outcomes for one agent's corrector.
#[derive(Debug, Clone)]
pub struct TrainingMetrics {
    pub loss: MovingAverage,
    pub completed: u64,
    pub failed: u64,
}

impl TrainingMetrics {
    pub fn new(window_size: usize) -> Self {
        Self {
            loss: MovingAverage::new(window_size),
            completed: 0,
            failed: 0,
        }
    }

    pub fn record_success(&mut self, loss: f32) {
        self.loss.push(loss);
        self.completed += 1;
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    pub fn mean_loss(&self) -> Option<f32> {
        self.loss.average()
    }
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new(20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moving_average() {
        let mut avg = MovingAverage::new(3);
        assert_eq!(avg.average(), None);

        avg.push(1.0);
        assert!((avg.average().unwrap() - 1.0).abs() < 1e-6);

        avg.push(2.0);
        assert!((avg.average().unwrap() - 1.5).abs() < 1e-6);

        avg.push(3.0);
        assert!((avg.average().unwrap() - 2.0).abs() < 1e-6);

        avg.push(4.0); // Pushes out 1.0
        assert!((avg.average().unwrap() - 3.0).abs() < 1e-6);
        assert_eq!(avg.len(), 3);
    }

    #[test]
    fn test_training_metrics() {
        let mut metrics = TrainingMetrics::default();

        metrics.record_success(0.5);
        metrics.record_failure();
        metrics.record_success(0.25);

        assert_eq!(metrics.completed, 2);
        assert_eq!(metrics.failed, 1);
        assert!((metrics.mean_loss().unwrap() - 0.375).abs() < 1e-6);
    }
}
