pub mod control;
pub mod infra;
pub mod learning;
pub mod sim;
pub mod state;

// Re-export commonly used types for convenience
pub use infra::{SimObserver, Vec3};
pub use sim::{SimConfig, Simulation, StatusSummary};
