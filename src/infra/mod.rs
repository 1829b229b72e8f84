mod composite_observer;
mod default_observer;
mod sim_observer;
mod status_log;
mod types;

pub use composite_observer::CompositeObserver;
pub use default_observer::DefaultObserver;
pub use sim_observer::SimObserver;
pub use status_log::StatusLog;
pub use types::Vec3;
