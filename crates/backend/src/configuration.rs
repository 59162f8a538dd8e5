use serde::{Deserialize, Serialize};

/// Collision settings shared by the dispatcher and the dynamics world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultCollisionConfiguration {
    /// Separation below which a contact is still generated, for speculative contacts.
    pub contact_breaking_threshold: f32,
    /// Contacts kept per step; further contacts are dropped.
    pub max_contacts: usize,
}

impl Default for DefaultCollisionConfiguration {
    fn default() -> Self {
        Self {
            contact_breaking_threshold: 0.02,
            max_contacts: 4096,
        }
    }
}
