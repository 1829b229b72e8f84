mod agent;
mod config;
mod simulation;
mod status;

pub use agent::{Agent, Learner};
pub use config::{ConfigError, DEFAULT_HEIGHTS, SimConfig};
pub use simulation::Simulation;
pub use status::{AgentStatus, StatusSummary};
