use std::fmt;

/// Process-wide control mode. `Correcting` is terminal for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalPhase {
    Following,
    Correcting,
}

impl GlobalPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GlobalPhase::Following => "FOLLOWING",
            GlobalPhase::Correcting => "CORRECTING",
        }
    }
}

impl fmt::Display for GlobalPhase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared simulation clock: tick counter, elapsed time and phase.
#[derive(Debug, Clone)]
pub struct PhaseClock {
    tick: u64,
    time: f32,
    time_step: f32,
    correct_after: u64,
    phase: GlobalPhase,
}

impl PhaseClock {
    pub fn new(time_step: f32, correct_after: u64) -> Self {
        Self {
            tick: 0,
            time: 0.0,
            time_step,
            correct_after,
            phase: GlobalPhase::Following,
        }
    }

    /// Counts a new tick. Returns the new phase if this tick switched it.
    pub fn start_tick(&mut self) -> Option<GlobalPhase> {
        self.tick += 1;

        if self.phase == GlobalPhase::Following && self.tick >= self.correct_after {
            self.phase = GlobalPhase::Correcting;
            return Some(self.phase);
        }
        None
    }

    /// Moves the clock forward once the tick's work is done.
    pub fn finish_tick(&mut self) {
        self.time += self.time_step;
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn phase(&self) -> GlobalPhase {
        self.phase
    }
}
