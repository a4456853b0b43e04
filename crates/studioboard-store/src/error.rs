use studioboard_client::ApiError;
use studioboard_proto::{EntityId, EntityKind, ValidationError};
use thiserror::Error;

/// Failure of a store operation
///
/// Optimistic state has already been reverted by the time a caller sees one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The target is not in the local collection; no request was sent
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: EntityId },

    #[error(transparent)]
    Api(#[from] ApiError),

    /// Draft or patch rejected before any optimistic change
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// The fetch was cancelled and its result discarded
    #[error("Request cancelled")]
    Cancelled,
}

impl StoreError {
    pub fn not_found(kind: EntityKind, id: &EntityId) -> Self {
        StoreError::NotFound {
            kind,
            id: id.clone(),
        }
    }
}
