mod follow;
mod phase;
mod trajectory;

pub use follow::{FollowGains, FollowPolicy};
pub use phase::{GlobalPhase, PhaseClock};
pub use trajectory::TrajectoryDriver;
