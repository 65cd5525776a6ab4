use crate::catalog::CapabilitySet;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GenError>;

/// Faults raised while validating inputs or generating an instance.
///
/// Generation itself is pure; every variant here is a precondition that
/// failed before any random draw was wasted on it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenError {
    #[error("catalog contains no archetypes")]
    EmptyCatalog,

    #[error("invalid archetype '{name}': {reason}")]
    InvalidArchetype { name: String, reason: String },

    #[error("capability {0:?} not satisfiable by catalog")]
    UnsatisfiableCapability(CapabilitySet),

    #[error("infeasible demand: {floaters} floaters + {tasks} tasks exceeds {agents} agents")]
    InfeasibleDemand {
        agents: usize,
        tasks: usize,
        floaters: usize,
    },

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("agent {agent} is anchored to task {task} but archetype '{archetype}' lacks {required:?}")]
    AnchorMismatch {
        agent: usize,
        task: usize,
        archetype: String,
        required: CapabilitySet,
    },

    #[error("instance invariant violated: {0}")]
    Invariant(String),
}

impl GenError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
