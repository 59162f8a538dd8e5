use serde::{Deserialize, Serialize};

/// Whether the host application is actively running the simulation or
/// stopped in an editing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Running,
    #[default]
    Stopped,
}

impl RunState {
    pub fn is_running(self) -> bool {
        self == Self::Running
    }
}

/// Host environment consulted once per [`crate::SimulationWorld::step`].
pub trait Environment {
    fn run_state(&self) -> RunState;
}

/// A fixed run state is the simplest environment.
impl Environment for RunState {
    fn run_state(&self) -> RunState {
        *self
    }
}
