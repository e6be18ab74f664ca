//! Workflow error types for parent lifecycles and attestations.
//!
//! A failed signature verification is not an error; it is reported
//! through `VerificationOutcome`.

use thiserror::Error;
use uuid::Uuid;

use crate::workflow::signature::SignatureError;
use crate::workflow::types::{AttestationKind, AttestationStatus, DecisionAction, EntityKind};

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Work paper not found.
    #[error("Work paper {0} not found")]
    WorkPaperNotFound(Uuid),

    /// Business trip not found.
    #[error("Business trip {0} not found")]
    BusinessTripNotFound(Uuid),

    /// Attestation not found.
    #[error("Attestation {0} not found")]
    AttestationNotFound(Uuid),

    /// The transition table has no edge for the requested change.
    #[error("Invalid {entity} status transition from {from} to {to}")]
    InvalidTransition {
        /// The parent entity kind.
        entity: EntityKind,
        /// The current status.
        from: &'static str,
        /// The attempted target status.
        to: &'static str,
    },

    /// The edge exists but an additional precondition does not hold.
    #[error("Cannot move {entity} to {to}: {reason}")]
    GuardFailed {
        /// The parent entity kind.
        entity: EntityKind,
        /// The attempted target status.
        to: &'static str,
        /// Which precondition failed.
        reason: &'static str,
    },

    /// The attestation already left pending.
    #[error("Attestation {id} is already {status}")]
    AlreadyDecided {
        /// The attestation.
        id: Uuid,
        /// Its current status.
        status: AttestationStatus,
    },

    /// Reset requested on a pending attestation.
    #[error("Attestation {0} is already pending")]
    AlreadyPending(Uuid),

    /// Reset requested on an attestation kind that is one-shot.
    #[error("Reset is not supported for {0} attestations")]
    ResetNotSupported(AttestationKind),

    /// Action does not apply to this kind of party.
    #[error("Action {action} is not available to a {kind}")]
    UnsupportedAction {
        /// The requested action.
        action: DecisionAction,
        /// The attestation kind.
        kind: AttestationKind,
    },

    /// A party is already assigned to the parent.
    #[error("User {user_id} already has an attestation on {parent_id}")]
    DuplicateAttestation {
        /// The parent entity.
        parent_id: Uuid,
        /// The duplicated party.
        user_id: Uuid,
    },

    /// The attestation belongs to a different parent.
    #[error("Attestation {attestation_id} does not belong to {parent_id}")]
    ParentMismatch {
        /// The attestation.
        attestation_id: Uuid,
        /// The parent named in the request.
        parent_id: Uuid,
    },

    /// The parent's status does not permit recording decisions.
    #[error("The {entity} is {status} and does not accept decisions")]
    ParentNotAcceptingDecisions {
        /// The parent entity kind.
        entity: EntityKind,
        /// The parent's current status.
        status: &'static str,
    },

    /// The parent is in a final state and cannot be rearranged.
    #[error("The {entity} {id} is finalized")]
    ParentFinalized {
        /// The parent entity kind.
        entity: EntityKind,
        /// The parent.
        id: Uuid,
    },

    /// Signing attempted on an already signed attestation.
    #[error("Attestation {0} is already signed")]
    AlreadySigned(Uuid),

    /// Signing attempted on a rejected attestation.
    #[error("Attestation {0} was rejected and cannot be signed")]
    CannotSignRejected(Uuid),

    /// Verification requested but nothing was signed digitally.
    #[error("Attestation {0} has no digital signature")]
    NoDigitalSignature(Uuid),

    /// Only the assigned party may sign.
    #[error("User {user_id} is not the assigned signer")]
    NotAssignedSigner {
        /// The user who attempted to sign.
        user_id: Uuid,
    },

    /// Signing primitive failure.
    #[error("Signing error: {0}")]
    Signing(#[from] SignatureError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl WorkflowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidTransition { .. }
            | Self::GuardFailed { .. }
            | Self::ResetNotSupported(_)
            | Self::UnsupportedAction { .. }
            | Self::ParentMismatch { .. } => 400,

            Self::NotAssignedSigner { .. } => 403,

            Self::WorkPaperNotFound(_)
            | Self::BusinessTripNotFound(_)
            | Self::AttestationNotFound(_)
            | Self::NoDigitalSignature(_) => 404,

            Self::AlreadyDecided { .. }
            | Self::AlreadyPending(_)
            | Self::DuplicateAttestation { .. }
            | Self::ParentNotAcceptingDecisions { .. }
            | Self::ParentFinalized { .. }
            | Self::AlreadySigned(_)
            | Self::CannotSignRejected(_) => 409,

            Self::Signing(_) | Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::WorkPaperNotFound(_) => "WORK_PAPER_NOT_FOUND",
            Self::BusinessTripNotFound(_) => "BUSINESS_TRIP_NOT_FOUND",
            Self::AttestationNotFound(_) => "ATTESTATION_NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::GuardFailed { .. } => "GUARD_FAILED",
            Self::AlreadyDecided { .. } => "ALREADY_DECIDED",
            Self::AlreadyPending(_) => "ALREADY_PENDING",
            Self::ResetNotSupported(_) => "RESET_NOT_SUPPORTED",
            Self::UnsupportedAction { .. } => "UNSUPPORTED_ACTION",
            Self::DuplicateAttestation { .. } => "DUPLICATE_ATTESTATION",
            Self::ParentMismatch { .. } => "PARENT_MISMATCH",
            Self::ParentNotAcceptingDecisions { .. } => "PARENT_NOT_ACCEPTING_DECISIONS",
            Self::ParentFinalized { .. } => "PARENT_FINALIZED",
            Self::AlreadySigned(_) => "ALREADY_SIGNED",
            Self::CannotSignRejected(_) => "CANNOT_SIGN_REJECTED",
            Self::NoDigitalSignature(_) => "NO_DIGITAL_SIGNATURE",
            Self::NotAssignedSigner { .. } => "NOT_ASSIGNED_SIGNER",
            Self::Signing(_) => "SIGNING_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the not-found error matching an entity kind.
    #[must_use]
    pub fn parent_not_found(entity: EntityKind, id: Uuid) -> Self {
        match entity {
            EntityKind::WorkPaper => Self::WorkPaperNotFound(id),
            EntityKind::BusinessTrip => Self::BusinessTripNotFound(id),
        }
    }
}
