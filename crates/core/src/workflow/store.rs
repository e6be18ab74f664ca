//! Persistence seam for the workflow orchestrator.
//!
//! These traits are implemented by the db crate. Every orchestrator
//! operation runs inside one unit of work: it is committed explicitly, and
//! dropping it without a commit rolls everything back.

use std::future::Future;

use uuid::Uuid;

use crate::workflow::attestation::Attestation;
use crate::workflow::entity::{BusinessTrip, ParentEntity, WorkPaper};
use crate::workflow::error::WorkflowError;
use crate::workflow::types::AttestationKind;

/// Parent rows reachable from a unit of work.
pub trait ParentRepository<P: ParentEntity> {
    /// Read a parent without locking it.
    fn find_parent(
        &mut self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<P>, WorkflowError>> + Send;

    /// Read a parent and hold an exclusive row lock until the unit ends.
    fn lock_parent(
        &mut self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<P>, WorkflowError>> + Send;

    /// Insert a new parent.
    fn insert_parent(&mut self, parent: &P)
    -> impl Future<Output = Result<(), WorkflowError>> + Send;

    /// Persist a parent's status and mutable fields.
    fn save_parent(&mut self, parent: &P) -> impl Future<Output = Result<(), WorkflowError>> + Send;
}

/// A transaction-scoped handle over parents and attestations.
pub trait UnitOfWork: ParentRepository<WorkPaper> + ParentRepository<BusinessTrip> + Send {
    /// Find an attestation by ID.
    fn find_attestation(
        &mut self,
        kind: AttestationKind,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Attestation>, WorkflowError>> + Send;

    /// Find the attestation a user holds on a parent.
    fn find_attestation_by_party(
        &mut self,
        kind: AttestationKind,
        parent_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Option<Attestation>, WorkflowError>> + Send;

    /// List every attestation on a parent, oldest first.
    fn list_attestations(
        &mut self,
        kind: AttestationKind,
        parent_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Attestation>, WorkflowError>> + Send;

    /// Insert a new attestation.
    ///
    /// Returns `DuplicateAttestation` if the (parent, user) pair exists.
    fn insert_attestation(
        &mut self,
        attestation: &Attestation,
    ) -> impl Future<Output = Result<(), WorkflowError>> + Send;

    /// Persist an attestation's decision fields and digital signature.
    fn save_attestation(
        &mut self,
        attestation: &Attestation,
    ) -> impl Future<Output = Result<(), WorkflowError>> + Send;

    /// Delete an attestation. Returns false if it did not exist.
    fn delete_attestation(
        &mut self,
        kind: AttestationKind,
        id: Uuid,
    ) -> impl Future<Output = Result<bool, WorkflowError>> + Send;

    /// Commit all writes made through this unit.
    fn commit(self) -> impl Future<Output = Result<(), WorkflowError>> + Send;
}

/// Opens units of work.
pub trait WorkflowStore: Send + Sync {
    /// The unit of work type.
    type Unit: UnitOfWork;

    /// Begin a new unit of work.
    fn begin(&self) -> impl Future<Output = Result<Self::Unit, WorkflowError>> + Send;
}
