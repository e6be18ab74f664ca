//! Per-party attestation lifecycle.
//!
//! One attestation records one party's decision against one parent:
//! pending → signed/approved, or pending → rejected. Signers may be reset
//! back to pending; verificators decide once. None of these transitions
//! touch the parent; that is the consensus aggregator's job.

use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::signature::{DigitalSignature, VerificationOutcome};
use crate::workflow::types::{AttestationKind, AttestationStatus, DecisionAction};

/// The human party behind an attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    /// The party's user ID in the identity service.
    pub user_id: Uuid,
    /// Display name.
    pub user_name: String,
    /// Role or position, e.g. "Team Leader".
    pub position: String,
}

/// Persisted shape of an attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationRecord {
    /// Attestation ID.
    pub id: Uuid,
    /// The parent work paper or business trip.
    pub parent_id: Uuid,
    /// Signer or verificator.
    pub kind: AttestationKind,
    /// Party user ID.
    pub user_id: Uuid,
    /// Party display name.
    pub user_name: String,
    /// Party role or position.
    pub position: String,
    /// Decision status.
    pub status: AttestationStatus,
    /// Notes attached to the last decision.
    pub notes: Option<String>,
    /// Set exactly when the status leaves pending.
    pub decided_at: Option<DateTime<Utc>>,
    /// Digital signature, signers only.
    pub digital_signature: Option<DigitalSignature>,
    /// Created at.
    pub created_at: DateTime<Utc>,
    /// Updated at.
    pub updated_at: DateTime<Utc>,
}

/// One party's decision record against a parent entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Attestation {
    record: AttestationRecord,
}

impl Attestation {
    /// Creates a pending attestation for a party.
    #[must_use]
    pub fn new(kind: AttestationKind, parent_id: Uuid, party: Party, now: DateTime<Utc>) -> Self {
        Self {
            record: AttestationRecord {
                id: Uuid::now_v7(),
                parent_id,
                kind,
                user_id: party.user_id,
                user_name: party.user_name,
                position: party.position,
                status: AttestationStatus::Pending,
                notes: None,
                decided_at: None,
                digital_signature: None,
                created_at: now,
                updated_at: now,
            },
        }
    }

    /// Rehydrates an attestation from storage.
    #[must_use]
    pub fn restore(record: AttestationRecord) -> Self {
        Self { record }
    }

    /// Consumes the attestation, returning its record.
    #[must_use]
    pub fn into_record(self) -> AttestationRecord {
        self.record
    }

    /// Record a verificator approval.
    ///
    /// # Errors
    /// * `UnsupportedAction` if this is a signer
    /// * `AlreadyDecided` if not pending
    pub fn approve(&mut self, notes: Option<String>, now: DateTime<Utc>) -> Result<(), WorkflowError> {
        self.ensure_kind(DecisionAction::Approve, AttestationKind::Verificator)?;
        self.record_decision(AttestationStatus::Approved, notes, now)
    }

    /// Record a signer sign-off.
    ///
    /// # Errors
    /// * `UnsupportedAction` if this is a verificator
    /// * `AlreadyDecided` if not pending
    pub fn sign(&mut self, notes: Option<String>, now: DateTime<Utc>) -> Result<(), WorkflowError> {
        self.ensure_kind(DecisionAction::Sign, AttestationKind::Signer)?;
        self.record_decision(AttestationStatus::Signed, notes, now)
    }

    /// Record a rejection.
    ///
    /// A positive decision is irrevocable here; signers must be reset first.
    ///
    /// # Errors
    /// * `AlreadyDecided` if not pending
    pub fn reject(&mut self, notes: Option<String>, now: DateTime<Utc>) -> Result<(), WorkflowError> {
        self.record_decision(AttestationStatus::Rejected, notes, now)
    }

    /// Apply a decision action.
    pub fn decide(
        &mut self,
        action: DecisionAction,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        match action {
            DecisionAction::Approve => self.approve(notes, now),
            DecisionAction::Sign => self.sign(notes, now),
            DecisionAction::Reject => self.reject(notes, now),
        }
    }

    /// Return a signer to pending.
    ///
    /// Clears the decision time, the notes and any digital signature.
    ///
    /// # Errors
    /// * `ResetNotSupported` for verificators
    /// * `AlreadyPending` if nothing was decided
    pub fn reset(&mut self, now: DateTime<Utc>) -> Result<(), WorkflowError> {
        if !self.record.kind.supports_reset() {
            return Err(WorkflowError::ResetNotSupported(self.record.kind));
        }
        if !self.record.status.is_decided() {
            return Err(WorkflowError::AlreadyPending(self.record.id));
        }

        self.record.status = AttestationStatus::Pending;
        self.record.decided_at = None;
        self.record.notes = None;
        self.record.digital_signature = None;
        self.record.updated_at = now;
        Ok(())
    }

    /// Reopen a verificator when its parent cycles back to verification.
    pub(crate) fn reopen(&mut self, now: DateTime<Utc>) {
        if self.record.status.is_decided() {
            self.record.status = AttestationStatus::Pending;
            self.record.decided_at = None;
            self.record.notes = None;
            self.record.updated_at = now;
        }
    }

    /// Attach a freshly produced digital signature to a signed attestation.
    pub(crate) fn attach_digital_signature(
        &mut self,
        signature: DigitalSignature,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        if self.record.status != AttestationStatus::Signed {
            return Err(WorkflowError::AlreadyDecided {
                id: self.record.id,
                status: self.record.status,
            });
        }
        self.record.digital_signature = Some(signature);
        self.record.updated_at = now;
        Ok(())
    }

    /// Store the result of a verification run in the signature cache.
    ///
    /// # Errors
    /// * `NoDigitalSignature` if nothing is attached
    pub fn record_verification(
        &mut self,
        outcome: &VerificationOutcome,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        let id = self.record.id;
        let signature = self
            .record
            .digital_signature
            .as_mut()
            .ok_or(WorkflowError::NoDigitalSignature(id))?;

        signature.verified = outcome.is_valid();
        signature.verified_at = Some(now);
        signature.verification_error = outcome.error().map(String::from);
        self.record.updated_at = now;
        Ok(())
    }

    fn ensure_kind(
        &self,
        action: DecisionAction,
        expected: AttestationKind,
    ) -> Result<(), WorkflowError> {
        if self.record.kind == expected {
            Ok(())
        } else {
            Err(WorkflowError::UnsupportedAction {
                action,
                kind: self.record.kind,
            })
        }
    }

    fn record_decision(
        &mut self,
        status: AttestationStatus,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        if self.record.status.is_decided() {
            return Err(WorkflowError::AlreadyDecided {
                id: self.record.id,
                status: self.record.status,
            });
        }

        self.record.status = status;
        self.record.notes = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        self.record.decided_at = Some(now);
        self.record.updated_at = now;
        Ok(())
    }
}

impl Deref for Attestation {
    type Target = AttestationRecord;

    fn deref(&self) -> &Self::Target {
        &self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn party() -> Party {
        Party {
            user_id: Uuid::new_v4(),
            user_name: "Dewi Lestari".to_string(),
            position: "Team Leader".to_string(),
        }
    }

    fn signer() -> Attestation {
        Attestation::new(AttestationKind::Signer, Uuid::new_v4(), party(), Utc::now())
    }

    fn verificator() -> Attestation {
        Attestation::new(AttestationKind::Verificator, Uuid::new_v4(), party(), Utc::now())
    }

    #[test]
    fn test_new_attestation_is_pending() {
        let att = signer();
        assert_eq!(att.status, AttestationStatus::Pending);
        assert!(att.decided_at.is_none());
        assert!(att.notes.is_none());
    }

    #[test]
    fn test_approve_sets_decision_fields() {
        let mut att = verificator();
        let now = Utc::now() + Duration::minutes(5);
        att.approve(Some("looks fine".to_string()), now).unwrap();
        assert_eq!(att.status, AttestationStatus::Approved);
        assert_eq!(att.decided_at, Some(now));
        assert_eq!(att.updated_at, now);
        assert_eq!(att.notes.as_deref(), Some("looks fine"));
    }

    #[test]
    fn test_approve_twice_fails() {
        let mut att = verificator();
        att.approve(None, Utc::now()).unwrap();
        let snapshot = att.clone();
        let result = att.approve(None, Utc::now());
        assert!(matches!(
            result,
            Err(WorkflowError::AlreadyDecided {
                status: AttestationStatus::Approved,
                ..
            })
        ));
        assert_eq!(att, snapshot);
    }

    #[test]
    fn test_reject_after_approve_fails() {
        let mut att = verificator();
        att.approve(None, Utc::now()).unwrap();
        assert!(matches!(
            att.reject(Some("changed my mind".to_string()), Utc::now()),
            Err(WorkflowError::AlreadyDecided { .. })
        ));
        assert_eq!(att.status, AttestationStatus::Approved);
    }

    #[test]
    fn test_reject_twice_fails() {
        let mut att = signer();
        att.reject(None, Utc::now()).unwrap();
        assert!(matches!(
            att.reject(None, Utc::now()),
            Err(WorkflowError::AlreadyDecided { .. })
        ));
    }

    #[test]
    fn test_signer_cannot_approve() {
        let mut att = signer();
        assert!(matches!(
            att.approve(None, Utc::now()),
            Err(WorkflowError::UnsupportedAction {
                action: DecisionAction::Approve,
                kind: AttestationKind::Signer
            })
        ));
    }

    #[test]
    fn test_verificator_cannot_sign() {
        let mut att = verificator();
        assert!(matches!(
            att.decide(DecisionAction::Sign, None, Utc::now()),
            Err(WorkflowError::UnsupportedAction { .. })
        ));
    }

    #[test]
    fn test_blank_notes_are_dropped() {
        let mut att = signer();
        att.sign(Some("  ".to_string()), Utc::now()).unwrap();
        assert!(att.notes.is_none());
    }

    #[test]
    fn test_reset_after_reject_then_sign() {
        let mut att = signer();
        att.reject(Some("x".to_string()), Utc::now()).unwrap();
        att.reset(Utc::now()).unwrap();
        assert_eq!(att.status, AttestationStatus::Pending);
        assert!(att.notes.is_none());
        assert!(att.decided_at.is_none());

        att.sign(Some("y".to_string()), Utc::now()).unwrap();
        assert_eq!(att.status, AttestationStatus::Signed);
        assert_eq!(att.notes.as_deref(), Some("y"));
    }

    #[test]
    fn test_reset_pending_fails() {
        let mut att = signer();
        assert!(matches!(
            att.reset(Utc::now()),
            Err(WorkflowError::AlreadyPending(_))
        ));
    }

    #[test]
    fn test_verificator_reset_not_supported() {
        let mut att = verificator();
        att.reject(None, Utc::now()).unwrap();
        assert!(matches!(
            att.reset(Utc::now()),
            Err(WorkflowError::ResetNotSupported(AttestationKind::Verificator))
        ));
        assert_eq!(att.status, AttestationStatus::Rejected);
    }

    #[test]
    fn test_record_verification_without_signature() {
        let mut att = signer();
        assert!(matches!(
            att.record_verification(&VerificationOutcome::Valid, Utc::now()),
            Err(WorkflowError::NoDigitalSignature(_))
        ));
    }

    #[test]
    fn test_reopen_clears_decision() {
        let mut att = verificator();
        att.reject(Some("wrong dates".to_string()), Utc::now()).unwrap();
        att.reopen(Utc::now());
        assert_eq!(att.status, AttestationStatus::Pending);
        assert!(att.decided_at.is_none());
        assert!(att.notes.is_none());
    }
}
