use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Stepping and world configuration for a [`crate::SimulationWorld`].
///
/// `max_sub_steps` is signed on purpose:
/// - negative: the whole frame delta is one variable-size step,
/// - zero: the substep estimate is used uncapped,
/// - positive: the substep estimate is capped at this value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed internal update rate.
    pub internal_frequency_hz: f32,
    pub max_sub_steps: i32,
    pub gravity: Vec3,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            internal_frequency_hz: 60.0,
            max_sub_steps: 0,
            gravity: Vec3::new(0.0, -9.81, 0.0),
        }
    }
}

impl SimulationConfig {
    /// Length of one internal step in seconds.
    pub fn internal_step(&self) -> f32 {
        1.0 / self.internal_frequency_hz
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let hz = self.internal_frequency_hz;
        if !hz.is_finite() || hz <= 0.0 {
            return Err(ConfigError::InvalidFrequency(hz));
        }
        let g = self.gravity;
        if !g.is_finite() {
            return Err(ConfigError::NonFiniteGravity(g.x, g.y, g.z));
        }
        Ok(())
    }
}
