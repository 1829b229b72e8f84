mod agent_state;
mod relative_state;

pub use agent_state::AgentState;
pub use relative_state::{RelativeState, STATE_DIM};
