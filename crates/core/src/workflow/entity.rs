//! Parent entities whose lifecycle the workflow drives.
//!
//! Both entities keep their status private: it can be read through `Deref`
//! to the plain record, but only `TransitionPolicy::apply` can change it.

use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::policy::TransitionPermit;
use crate::workflow::types::{
    AttestationKind, BusinessTripStatus, EntityKind, WorkPaperStatus, WorkflowStatus,
};

/// A parent entity with a guarded status lifecycle.
pub trait ParentEntity: Clone + Send + Sync + 'static {
    /// The entity's closed status set.
    type Status: WorkflowStatus;

    /// The kind of attestation parties hold against this entity.
    const ATTESTATION_KIND: AttestationKind;

    /// Returns the entity ID.
    fn id(&self) -> Uuid;

    /// Returns the current status.
    fn status(&self) -> Self::Status;

    /// Checks preconditions beyond the transition table.
    fn check_guard(&self, _target: Self::Status) -> Result<(), WorkflowError> {
        Ok(())
    }

    /// Returns true if parties may currently record decisions.
    fn accepts_decisions(&self) -> bool;

    /// Returns true if the party list may no longer be rearranged.
    fn is_finalized(&self) -> bool;

    /// Stores a status already validated by `TransitionPolicy`.
    fn store_status(&mut self, permit: TransitionPermit, status: Self::Status, at: DateTime<Utc>);

    /// Returns the entity kind.
    fn kind() -> EntityKind {
        <Self::Status as WorkflowStatus>::ENTITY
    }
}

/// Persisted shape of a work paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkPaperRecord {
    /// Work paper ID.
    pub id: Uuid,
    /// Title.
    pub title: String,
    /// Link to the final document; required before completion.
    pub document_link: Option<String>,
    /// Lifecycle status.
    pub status: WorkPaperStatus,
    /// Created at.
    pub created_at: DateTime<Utc>,
    /// Updated at.
    pub updated_at: DateTime<Utc>,
}

/// A reviewable audit document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WorkPaper {
    record: WorkPaperRecord,
}

impl WorkPaper {
    /// Creates a new work paper in `Draft`.
    #[must_use]
    pub fn new(title: impl Into<String>, document_link: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            record: WorkPaperRecord {
                id: Uuid::now_v7(),
                title: title.into(),
                document_link: normalize_link(document_link),
                status: WorkPaperStatus::Draft,
                created_at: now,
                updated_at: now,
            },
        }
    }

    /// Rehydrates a work paper from storage.
    #[must_use]
    pub fn restore(record: WorkPaperRecord) -> Self {
        Self { record }
    }

    /// Consumes the entity, returning its record.
    #[must_use]
    pub fn into_record(self) -> WorkPaperRecord {
        self.record
    }

    /// Returns true if a non-blank document link is attached.
    #[must_use]
    pub fn has_document_link(&self) -> bool {
        self.record.document_link.is_some()
    }

    /// Replaces the document link.
    ///
    /// A completed work paper must keep its link, since completion was
    /// guarded on it.
    pub fn set_document_link(
        &mut self,
        link: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        let link = normalize_link(link);
        if link.is_none() && self.record.status == WorkPaperStatus::Completed {
            return Err(WorkflowError::GuardFailed {
                entity: EntityKind::WorkPaper,
                to: WorkPaperStatus::Completed.as_str(),
                reason: "a completed work paper must keep its document link",
            });
        }
        self.record.document_link = link;
        self.record.updated_at = now;
        Ok(())
    }
}

impl Deref for WorkPaper {
    type Target = WorkPaperRecord;

    fn deref(&self) -> &Self::Target {
        &self.record
    }
}

impl ParentEntity for WorkPaper {
    type Status = WorkPaperStatus;
    const ATTESTATION_KIND: AttestationKind = AttestationKind::Signer;

    fn id(&self) -> Uuid {
        self.record.id
    }

    fn status(&self) -> WorkPaperStatus {
        self.record.status
    }

    fn check_guard(&self, target: WorkPaperStatus) -> Result<(), WorkflowError> {
        if target == WorkPaperStatus::Completed && !self.has_document_link() {
            return Err(WorkflowError::GuardFailed {
                entity: EntityKind::WorkPaper,
                to: target.as_str(),
                reason: "a document link is required",
            });
        }
        Ok(())
    }

    fn accepts_decisions(&self) -> bool {
        self.record.status == WorkPaperStatus::ReadyToSign
    }

    fn is_finalized(&self) -> bool {
        self.record.status == WorkPaperStatus::Completed
    }

    fn store_status(&mut self, _permit: TransitionPermit, status: WorkPaperStatus, at: DateTime<Utc>) {
        self.record.status = status;
        self.record.updated_at = at;
    }
}

/// Persisted shape of a business trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessTripRecord {
    /// Business trip ID.
    pub id: Uuid,
    /// Purpose of the trip.
    pub purpose: String,
    /// Destination.
    pub destination: String,
    /// Lifecycle status.
    pub status: BusinessTripStatus,
    /// Created at.
    pub created_at: DateTime<Utc>,
    /// Updated at.
    pub updated_at: DateTime<Utc>,
}

/// A travel authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BusinessTrip {
    record: BusinessTripRecord,
}

impl BusinessTrip {
    /// Creates a new business trip in `Draft`.
    #[must_use]
    pub fn new(
        purpose: impl Into<String>,
        destination: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            record: BusinessTripRecord {
                id: Uuid::now_v7(),
                purpose: purpose.into(),
                destination: destination.into(),
                status: BusinessTripStatus::Draft,
                created_at: now,
                updated_at: now,
            },
        }
    }

    /// Rehydrates a business trip from storage.
    #[must_use]
    pub fn restore(record: BusinessTripRecord) -> Self {
        Self { record }
    }

    /// Consumes the entity, returning its record.
    #[must_use]
    pub fn into_record(self) -> BusinessTripRecord {
        self.record
    }
}

impl Deref for BusinessTrip {
    type Target = BusinessTripRecord;

    fn deref(&self) -> &Self::Target {
        &self.record
    }
}

impl ParentEntity for BusinessTrip {
    type Status = BusinessTripStatus;
    const ATTESTATION_KIND: AttestationKind = AttestationKind::Verificator;

    fn id(&self) -> Uuid {
        self.record.id
    }

    fn status(&self) -> BusinessTripStatus {
        self.record.status
    }

    fn accepts_decisions(&self) -> bool {
        self.record.status == BusinessTripStatus::ReadyToVerify
    }

    fn is_finalized(&self) -> bool {
        self.record.status == BusinessTripStatus::Completed
    }

    fn store_status(
        &mut self,
        _permit: TransitionPermit,
        status: BusinessTripStatus,
        at: DateTime<Utc>,
    ) {
        self.record.status = status;
        self.record.updated_at = at;
    }
}

fn normalize_link(link: Option<String>) -> Option<String> {
    link.map(|l| l.trim().to_string()).filter(|l| !l.is_empty())
}
