use crate::control::GlobalPhase;
use crate::learning::{CorrectorError, FitReport};
use crate::sim::{SimConfig, StatusSummary};

use super::SimObserver;

pub struct CompositeObserver {
    observers: Vec<Box<dyn SimObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Box<dyn SimObserver>>) -> Self {
        Self { observers }
    }
}

impl SimObserver for CompositeObserver {
    fn on_start(&mut self, config: &SimConfig) {
        for observer in &mut self.observers {
            observer.on_start(config);
        }
    }

    fn on_phase_change(&mut self, phase: GlobalPhase, tick: u64) {
        for observer in &mut self.observers {
            observer.on_phase_change(phase, tick);
        }
    }

    fn on_tick(&mut self, status: &StatusSummary) {
        for observer in &mut self.observers {
            observer.on_tick(status);
        }
    }

    fn on_training_complete(&mut self, report: &FitReport) {
        for observer in &mut self.observers {
            observer.on_training_complete(report);
        }
    }

    fn on_training_failed(&mut self, agent: usize, error: &CorrectorError) {
        for observer in &mut self.observers {
            observer.on_training_failed(agent, error);
        }
    }

    fn on_finish(&mut self, status: &StatusSummary) {
        for observer in &mut self.observers {
            observer.on_finish(status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recorder {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl SimObserver for Recorder {
        fn on_phase_change(&mut self, phase: GlobalPhase, tick: u64) {
            self.events.lock().unwrap().push(format!("{}@{}", phase, tick));
        }

        fn on_tick(&mut self, status: &StatusSummary) {
            self.events.lock().unwrap().push(format!("tick {}", status.tick));
        }
    }

    #[test]
    fn test_forwards_to_all() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut composite = CompositeObserver::new(vec![
            Box::new(Recorder {
                events: events.clone(),
            }),
            Box::new(Recorder {
                events: events.clone(),
            }),
        ]);

        composite.on_phase_change(GlobalPhase::Correcting, 600);
        composite.on_tick(&StatusSummary {
            tick: 600,
            time: 6.0,
            phase: GlobalPhase::Correcting,
            positions: Vec::new(),
            learners: Vec::new(),
        });

        let events = events.lock().unwrap();
        assert_eq!(
            *events,
            vec!["CORRECTING@600", "CORRECTING@600", "tick 600", "tick 600"]
        );
    }
}
