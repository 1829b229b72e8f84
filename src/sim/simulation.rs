use std::time::Instant;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::control::{FollowPolicy, GlobalPhase, PhaseClock, TrajectoryDriver};
use crate::infra::{SimObserver, Vec3};
use crate::learning::{Corrector, CorrectorError, OutputEncoding, SessionEvent};
use crate::state::AgentState;

use super::{Agent, ConfigError, Learner, SimConfig, StatusSummary};

/// Drives the base around its circle and the followers up the chain.
pub struct Simulation<C: Corrector> {
    config: SimConfig,
    clock: PhaseClock,
    trajectory: TrajectoryDriver,
    policy: FollowPolicy,
    agents: Vec<Agent<C>>,
    observer: Box<dyn SimObserver>,
}

impl<C: Corrector> Simulation<C> {
    /// Builds the stacked chain. `make_corrector` is called once per follower;
    /// a follower whose corrector cannot be built runs on baseline tracking.
    pub fn new<F>(
        config: SimConfig,
        mut make_corrector: F,
        observer: impl SimObserver + 'static,
    ) -> Result<Self, ConfigError>
    where
        F: FnMut(usize, OutputEncoding) -> Result<C, CorrectorError>,
    {
        config.validate()?;

        let agents = config
            .stacked_positions()
            .into_iter()
            .zip(config.heights.iter())
            .enumerate()
            .map(|(index, (position, &height))| {
                let id = index + 1;
                let state = AgentState::new(position, height);
                if id == 1 {
                    return Agent::base(state);
                }

                let encoding = config.encoding_for(id);
                let corrector = match make_corrector(id, encoding) {
                    Ok(corrector) => Some(corrector),
                    Err(e) => {
                        warn!(agent = id, "Corrector unavailable, tracking only: {}", e);
                        None
                    }
                };
                Agent::follower(id, state, Learner::new(id, encoding, corrector, config.buffer))
            })
            .collect();

        Ok(Self {
            clock: PhaseClock::new(config.time_step, config.correct_after),
            trajectory: TrajectoryDriver::new(config.radius),
            policy: FollowPolicy::new(config.gains),
            agents,
            observer: Box::new(observer),
            config,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn agents(&self) -> &[Agent<C>] {
        &self.agents
    }

    pub fn agent(&self, id: usize) -> Option<&Agent<C>> {
        id.checked_sub(1).and_then(|index| self.agents.get(index))
    }

    pub fn phase(&self) -> GlobalPhase {
        self.clock.phase()
    }

    pub fn tick_count(&self) -> u64 {
        self.clock.tick()
    }

    pub fn positions(&self) -> Vec<Vec3> {
        self.agents.iter().map(|a| a.state.position).collect()
    }

    /// Overwrites agent positions, base first, before the next tick.
    /// Extra entries are ignored; missing ones leave agents where they are.
    pub fn sync_positions(&mut self, positions: &[Vec3]) {
        for (agent, position) in self.agents.iter_mut().zip(positions) {
            agent.state.position = *position;
        }
    }

    /// Runs one simulation step and notifies the observer.
    pub fn tick(&mut self) -> StatusSummary {
        if let Some(phase) = self.clock.start_tick() {
            info!(tick = self.clock.tick(), "Phase changed to {}", phase);
            self.observer.on_phase_change(phase, self.clock.tick());
        }
        let phase = self.clock.phase();
        let time = self.clock.time();

        for agent in &mut self.agents {
            agent.state.begin_tick();
        }

        if let Some(base) = self.agents.first_mut() {
            let (x, z) = self.trajectory.advance(time);
            base.state.position.x = x;
            base.state.position.z = z;
        }

        // Bottom-up, so each learner sees its target's position for this tick
        for index in 1..self.agents.len() {
            let (below, rest) = self.agents.split_at_mut(index);
            let target = &below[index - 1];
            let learner = &mut rest[0];

            let correction = match phase {
                GlobalPhase::Correcting => learner.correct(&target.state, time),
                GlobalPhase::Following => None,
            };
            let delta = self
                .policy
                .step(&learner.state, &target.state, phase, correction);
            learner.state.position += delta;
        }

        for agent in &mut self.agents {
            agent.state.finish_tick();
        }

        let mut events = Vec::new();
        for agent in &mut self.agents {
            events.extend(agent.poll_training());
            agent.trigger_training();
        }
        for event in events {
            self.report(event);
        }

        let status = self.status();
        self.clock.finish_tick();
        self.observer.on_tick(&status);
        status
    }

    /// Waits for every in-flight training session and applies the results.
    pub async fn settle(&mut self) {
        let mut events = Vec::new();
        for agent in &mut self.agents {
            events.extend(agent.settle_training().await);
        }
        for event in events {
            self.report(event);
        }
    }

    /// Ticks at the configured rate until `max_ticks`, or forever.
    pub async fn run(&mut self) {
        self.observer.on_start(&self.config);

        let mut ticker = interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while self
            .config
            .max_ticks
            .is_none_or(|max| self.clock.tick() < max)
        {
            ticker.tick().await;

            let tick_start = Instant::now();
            self.tick();

            let tick_duration = tick_start.elapsed();
            if tick_duration > self.config.tick_interval {
                debug!(
                    "Tick {} took {:.2}ms",
                    self.clock.tick(),
                    tick_duration.as_secs_f64() * 1000.0
                );
            }
        }

        self.settle().await;
        let status = self.status();
        self.observer.on_finish(&status);
    }

    /// Current positions, plus learner status once correcting.
    pub fn status(&self) -> StatusSummary {
        let phase = self.clock.phase();
        let learners = match phase {
            GlobalPhase::Correcting => self.agents.iter().filter_map(|a| a.status()).collect(),
            GlobalPhase::Following => Vec::new(),
        };

        StatusSummary {
            tick: self.clock.tick(),
            time: self.clock.time(),
            phase,
            positions: self.positions(),
            learners,
        }
    }

    fn report(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Completed(report) => self.observer.on_training_complete(&report),
            SessionEvent::Failed { agent, error } => {
                self.observer.on_training_failed(agent, &error)
            }
        }
    }
}
