//! Attestation workflow management for Auditflow.
//!
//! This module implements the parent lifecycle state machines (work papers
//! and business trips), per-party attestations, digital signatures, and the
//! consensus rules that connect them.
//!
//! # Modules
//!
//! - `types` - Status sets and decision actions
//! - `error` - Workflow-specific error types
//! - `entity` - Work papers and business trips
//! - `policy` - Transition tables and guards
//! - `attestation` - Per-party decision records
//! - `signature` - Canonical payloads, signing and verification
//! - `consensus` - Aggregation of party decisions into parent transitions
//! - `store` - Unit-of-work persistence traits
//! - `orchestrator` - Use cases

pub mod attestation;
pub mod clock;
pub mod consensus;
pub mod entity;
pub mod error;
pub mod orchestrator;
pub mod policy;
pub mod signature;
pub mod store;
pub mod types;

#[cfg(test)]
mod attestation_props;
#[cfg(test)]
mod consensus_props;
#[cfg(test)]
mod policy_props;
#[cfg(test)]
mod signature_props;
#[cfg(test)]
pub(crate) mod test_support;

pub use attestation::{Attestation, AttestationRecord, Party};
pub use clock::{Clock, FixedClock, SystemClock};
pub use consensus::{
    AdvisorySignatures, ConsensusAggregator, ConsensusDecision, ConsensusPolicy, Tally,
    UnanimousVerification,
};
pub use entity::{BusinessTrip, BusinessTripRecord, ParentEntity, WorkPaper, WorkPaperRecord};
pub use error::WorkflowError;
pub use orchestrator::{
    DecisionOutcome, NewBusinessTrip, NewWorkPaper, Progress, StatusUpdate, VerificationReport,
    WorkflowOrchestrator,
};
pub use policy::{StatusChange, TransitionPermit, TransitionPolicy};
pub use signature::{
    DigitalSignature, DigitalSignatureService, ED25519, Ed25519Primitive, SignatureError,
    SignaturePrimitive, SignedPayload, VerificationOutcome,
};
pub use store::{ParentRepository, UnitOfWork, WorkflowStore};
pub use types::{
    AttestationKind, AttestationStatus, BusinessTripStatus, DecisionAction, EntityKind,
    WorkPaperStatus, WorkflowStatus,
};
