//! Domain error types.

use common::{CageId, CageType, Diet, Species};
use park_store::StoreError;
use thiserror::Error;
use uuid::Uuid;

/// A placement, removal or status change the facility rules forbid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RuleViolation {
    /// The cage is powered down and cannot take occupants.
    #[error("unable to add dinosaurs to powered down cage")]
    CagePoweredDown,

    /// The cage holds as many dinosaurs as it can.
    #[error("unable to add dinosaurs to cage at capacity ({capacity})")]
    CageAtCapacity { capacity: u32 },

    /// The dinosaur's diet does not match the cage type.
    #[error("unable to add {diet} dinosaur to {cage_type} cage")]
    TypeMismatch { cage_type: CageType, diet: Diet },

    /// A carnivore cage already holds a different species.
    #[error("unable to add {incoming} to cage holding {resident}")]
    SpeciesConflict { resident: Species, incoming: Species },

    /// Nothing to remove from an empty cage.
    #[error("unable to remove dinosaurs from an empty cage")]
    EmptyCageRemoval,

    /// An occupied cage cannot be powered down.
    #[error("unable to power down cage with {occupants} dinosaurs inside")]
    PowerDownWithOccupants { occupants: u32 },

    /// The dinosaur already lives in a cage.
    #[error("dinosaur already lives in cage {cage_id}")]
    DinosaurAlreadyCaged { cage_id: CageId },

    /// The dinosaur does not live in the cage it is being removed from.
    #[error("dinosaur does not live in cage {cage_id}")]
    DinosaurNotInCage { cage_id: CageId },
}

impl RuleViolation {
    /// Stable tag for transports and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RuleViolation::CagePoweredDown => "cage_powered_down",
            RuleViolation::CageAtCapacity { .. } => "cage_at_capacity",
            RuleViolation::TypeMismatch { .. } => "type_mismatch",
            RuleViolation::SpeciesConflict { .. } => "species_conflict",
            RuleViolation::EmptyCageRemoval => "empty_cage_removal",
            RuleViolation::PowerDownWithOccupants { .. } => "power_down_with_occupants",
            RuleViolation::DinosaurAlreadyCaged { .. } => "dinosaur_already_caged",
            RuleViolation::DinosaurNotInCage { .. } => "dinosaur_not_in_cage",
        }
    }
}

/// Domain-level errors.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A referenced cage or dinosaur does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    /// The request itself is malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The request is well formed but the facility rules forbid it.
    #[error(transparent)]
    Rule(#[from] RuleViolation),

    /// The store failed for reasons unrelated to the request.
    #[error("Store error during {operation}: {source}")]
    Store {
        operation: &'static str,
        #[source]
        source: StoreError,
    },
}

impl DomainError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        DomainError::InvalidInput(msg.into())
    }

    /// Stable tag for transports and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::NotFound { .. } => "not_found",
            DomainError::InvalidInput(_) => "invalid_input",
            DomainError::Rule(violation) => violation.kind(),
            DomainError::Store {
                source: StoreError::ConcurrencyConflict { .. },
                ..
            } => "concurrency_conflict",
            DomainError::Store { .. } => "store_failure",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainError::NotFound { .. })
    }

    /// Returns the rule that rejected the request, if any.
    pub fn violation(&self) -> Option<RuleViolation> {
        match self {
            DomainError::Rule(violation) => Some(*violation),
            _ => None,
        }
    }
}

/// Attaches the failing operation to a store error.
///
/// Missing records surface as [`DomainError::NotFound`] rather than as
/// store failures.
pub(crate) trait StoreContext<T> {
    fn context(self, operation: &'static str) -> Result<T, DomainError>;
}

impl<T> StoreContext<T> for Result<T, StoreError> {
    fn context(self, operation: &'static str) -> Result<T, DomainError> {
        self.map_err(|source| match source {
            StoreError::NotFound { entity, id } => DomainError::NotFound { entity, id },
            source => DomainError::Store { operation, source },
        })
    }
}
