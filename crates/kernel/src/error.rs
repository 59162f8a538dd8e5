use physworld_common::BodyId;

/// Errors raised while validating a [`crate::SimulationConfig`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("internal frequency must be finite and positive, got {0} Hz")]
    InvalidFrequency(f32),
    #[error("gravity must be finite, got ({0}, {1}, {2})")]
    NonFiniteGravity(f32, f32, f32),
}

/// Errors reported by a physics backend collaborator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("failed to construct {resource}: {reason}")]
    Construction {
        resource: &'static str,
        reason: String,
    },
    #[error("body {0:?} is not registered in the world")]
    UnknownBody(BodyId),
    #[error("body {0:?} is already registered in the world")]
    DuplicateBody(BodyId),
    #[error("constraint cannot connect body {0:?} to itself")]
    SelfConstraint(BodyId),
}

/// Errors from [`crate::SimulationWorld`] lifecycle operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    #[error("simulation world is already initialized")]
    AlreadyInitialized,
    #[error("invalid simulation config: {0}")]
    Config(#[from] ConfigError),
    #[error("physics backend error: {0}")]
    Backend(#[from] BackendError),
}
