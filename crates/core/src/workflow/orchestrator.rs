//! Workflow use cases.
//!
//! Every operation opens one unit of work, locks the parent row first,
//! reads the attestations it needs under that lock, and commits once. A
//! failure anywhere drops the unit, which discards every write.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::workflow::attestation::{Attestation, Party};
use crate::workflow::clock::{Clock, SystemClock};
use crate::workflow::consensus::{
    AdvisorySignatures, ConsensusAggregator, ConsensusPolicy, Tally, UnanimousVerification,
};
use crate::workflow::entity::{BusinessTrip, ParentEntity, WorkPaper};
use crate::workflow::error::WorkflowError;
use crate::workflow::policy::{StatusChange, TransitionPolicy};
use crate::workflow::signature::DigitalSignatureService;
use crate::workflow::store::{ParentRepository, UnitOfWork, WorkflowStore};
use crate::workflow::types::{
    AttestationKind, AttestationStatus, BusinessTripStatus, DecisionAction, WorkPaperStatus,
    WorkflowStatus,
};

/// Input for creating a work paper.
#[derive(Debug, Clone, Deserialize)]
pub struct NewWorkPaper {
    /// Title.
    pub title: String,
    /// Optional link to the document.
    #[serde(default)]
    pub document_link: Option<String>,
}

/// Input for creating a business trip.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBusinessTrip {
    /// Purpose of the trip.
    pub purpose: String,
    /// Destination.
    pub destination: String,
    /// Parties who must verify the trip.
    #[serde(default)]
    pub verificators: Vec<Party>,
}

/// A parent with all of its attestations.
#[derive(Debug, Clone, Serialize)]
#[serde(bound(serialize = "P: Serialize"))]
pub struct Progress<P: ParentEntity> {
    /// The parent.
    pub parent: P,
    /// Its attestations, oldest first.
    pub attestations: Vec<Attestation>,
    /// Aggregate counts.
    pub tally: Tally,
}

/// Result of a party decision.
#[derive(Debug, Clone, Serialize)]
#[serde(bound(serialize = "P: Serialize"))]
pub struct DecisionOutcome<P: ParentEntity> {
    /// The decided attestation.
    pub attestation: Attestation,
    /// The parent after aggregation.
    pub parent: P,
    /// The parent transition caused by this decision, if any.
    pub parent_change: Option<StatusChange<P::Status>>,
    /// Aggregate counts after the decision.
    pub tally: Tally,
}

/// Result of an operator status update.
#[derive(Debug, Clone, Serialize)]
#[serde(bound(serialize = "P: Serialize"))]
pub struct StatusUpdate<P: ParentEntity> {
    /// The parent after the update.
    pub parent: P,
    /// The applied change; `None` for a self-transition.
    pub change: Option<StatusChange<P::Status>>,
    /// Attestations returned to pending by the update.
    pub reopened: usize,
    /// A follow-up transition made by consensus right after the update.
    pub consensus_change: Option<StatusChange<P::Status>>,
}

/// Result of a digital signature verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    /// The verified attestation.
    pub attestation_id: Uuid,
    /// Whether the signature is valid.
    pub is_valid: bool,
    /// Why it is not.
    pub error: Option<String>,
    /// When the verification ran.
    pub verified_at: DateTime<Utc>,
}

/// Drives parent lifecycles from party decisions.
pub struct WorkflowOrchestrator<S: WorkflowStore> {
    store: S,
    signatures: DigitalSignatureService,
    clock: Arc<dyn Clock>,
    work_paper_policy: Arc<dyn ConsensusPolicy<WorkPaperStatus>>,
    business_trip_policy: Arc<dyn ConsensusPolicy<BusinessTripStatus>>,
}

impl<S: WorkflowStore> WorkflowOrchestrator<S> {
    /// Creates an orchestrator with the wall clock and the default policies.
    #[must_use]
    pub fn new(store: S, signatures: DigitalSignatureService) -> Self {
        Self {
            store,
            signatures,
            clock: Arc::new(SystemClock),
            work_paper_policy: Arc::new(AdvisorySignatures),
            business_trip_policy: Arc::new(UnanimousVerification),
        }
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the work paper aggregation policy.
    #[must_use]
    pub fn with_work_paper_policy(mut self, policy: Arc<dyn ConsensusPolicy<WorkPaperStatus>>) -> Self {
        self.work_paper_policy = policy;
        self
    }

    /// Replaces the business trip aggregation policy.
    #[must_use]
    pub fn with_business_trip_policy(
        mut self,
        policy: Arc<dyn ConsensusPolicy<BusinessTripStatus>>,
    ) -> Self {
        self.business_trip_policy = policy;
        self
    }

    /// Returns the signature service.
    #[must_use]
    pub fn signatures(&self) -> &DigitalSignatureService {
        &self.signatures
    }

    // Postgres keeps microseconds; stamps must survive a round trip unchanged.
    fn now(&self) -> DateTime<Utc> {
        self.clock.now().trunc_subsecs(6)
    }

    // ------------------------------------------------------------------
    // Parents
    // ------------------------------------------------------------------

    /// Create a work paper in `draft`.
    pub async fn create_work_paper(&self, input: NewWorkPaper) -> Result<WorkPaper, WorkflowError> {
        let paper = WorkPaper::new(input.title, input.document_link, self.now());

        let mut unit = self.store.begin().await?;
        <S::Unit as ParentRepository<WorkPaper>>::insert_parent(&mut unit, &paper).await?;
        unit.commit().await?;

        info!(work_paper_id = %paper.id, "Work paper created");
        Ok(paper)
    }

    /// Create a business trip in `draft` with its verificators.
    ///
    /// # Errors
    /// * `DuplicateAttestation` if a user appears twice in the list
    pub async fn create_business_trip(
        &self,
        input: NewBusinessTrip,
    ) -> Result<Progress<BusinessTrip>, WorkflowError> {
        let now = self.now();
        let trip = BusinessTrip::new(input.purpose, input.destination, now);

        let mut seen = HashSet::new();
        for party in &input.verificators {
            if !seen.insert(party.user_id) {
                return Err(WorkflowError::DuplicateAttestation {
                    parent_id: trip.id,
                    user_id: party.user_id,
                });
            }
        }

        let attestations: Vec<Attestation> = input
            .verificators
            .into_iter()
            .map(|party| Attestation::new(AttestationKind::Verificator, trip.id, party, now))
            .collect();

        let mut unit = self.store.begin().await?;
        <S::Unit as ParentRepository<BusinessTrip>>::insert_parent(&mut unit, &trip).await?;
        for attestation in &attestations {
            unit.insert_attestation(attestation).await?;
        }
        unit.commit().await?;

        info!(
            business_trip_id = %trip.id,
            verificators = attestations.len(),
            "Business trip created"
        );
        let tally = ConsensusAggregator::tally(&attestations);
        Ok(Progress {
            parent: trip,
            attestations,
            tally,
        })
    }

    /// Move a work paper to `target` on an operator's request.
    pub async fn update_work_paper_status(
        &self,
        work_paper_id: Uuid,
        target: WorkPaperStatus,
    ) -> Result<StatusUpdate<WorkPaper>, WorkflowError> {
        let now = self.now();
        let mut unit = self.store.begin().await?;
        let mut paper: WorkPaper = lock_parent(&mut unit, work_paper_id).await?;

        let change = TransitionPolicy::apply(&mut paper, target, now)?;
        if change.is_some() {
            <S::Unit as ParentRepository<WorkPaper>>::save_parent(&mut unit, &paper).await?;
        }
        unit.commit().await?;

        if let Some(change) = &change {
            info!(
                work_paper_id = %work_paper_id,
                from = %change.from,
                to = %change.to,
                "Work paper status updated"
            );
        }
        Ok(StatusUpdate {
            parent: paper,
            change,
            reopened: 0,
            consensus_change: None,
        })
    }

    /// Move a business trip to `target` on an operator's request.
    ///
    /// Moving back to `ready_to_verify` returns every decided verificator
    /// to pending so the trip can be verified again.
    pub async fn update_business_trip_status(
        &self,
        business_trip_id: Uuid,
        target: BusinessTripStatus,
    ) -> Result<StatusUpdate<BusinessTrip>, WorkflowError> {
        let now = self.now();
        let mut unit = self.store.begin().await?;
        let mut trip: BusinessTrip = lock_parent(&mut unit, business_trip_id).await?;

        let change = TransitionPolicy::apply(&mut trip, target, now)?;
        let mut reopened = 0;
        let mut consensus_change = None;
        if let Some(change) = &change {
            <S::Unit as ParentRepository<BusinessTrip>>::save_parent(&mut unit, &trip).await?;

            if change.to == BusinessTripStatus::ReadyToVerify {
                let verificators = unit
                    .list_attestations(AttestationKind::Verificator, business_trip_id)
                    .await?;
                for mut verificator in verificators {
                    if verificator.status.is_decided() {
                        verificator.reopen(now);
                        unit.save_attestation(&verificator).await?;
                        reopened += 1;
                    }
                }

                // No decision will ever arrive for an empty verificator set.
                let policy = self.business_trip_policy.as_ref();
                (consensus_change, _) = aggregate(&mut unit, &mut trip, policy, now).await?;
            }
        }
        unit.commit().await?;

        if let Some(change) = &change {
            info!(
                business_trip_id = %business_trip_id,
                from = %change.from,
                to = %change.to,
                reopened,
                "Business trip status updated"
            );
        }
        Ok(StatusUpdate {
            parent: trip,
            change,
            reopened,
            consensus_change,
        })
    }

    /// Replace a work paper's document link.
    pub async fn set_document_link(
        &self,
        work_paper_id: Uuid,
        document_link: Option<String>,
    ) -> Result<WorkPaper, WorkflowError> {
        let now = self.now();
        let mut unit = self.store.begin().await?;
        let mut paper: WorkPaper = lock_parent(&mut unit, work_paper_id).await?;

        paper.set_document_link(document_link, now)?;
        <S::Unit as ParentRepository<WorkPaper>>::save_parent(&mut unit, &paper).await?;
        unit.commit().await?;

        debug!(work_paper_id = %work_paper_id, has_link = paper.has_document_link(), "Document link updated");
        Ok(paper)
    }

    /// A work paper with its signatures.
    pub async fn work_paper_progress(
        &self,
        work_paper_id: Uuid,
    ) -> Result<Progress<WorkPaper>, WorkflowError> {
        self.progress(work_paper_id).await
    }

    /// A business trip with its verificators.
    pub async fn business_trip_progress(
        &self,
        business_trip_id: Uuid,
    ) -> Result<Progress<BusinessTrip>, WorkflowError> {
        self.progress(business_trip_id).await
    }

    // ------------------------------------------------------------------
    // Parties
    // ------------------------------------------------------------------

    /// Assign a signer to a work paper.
    ///
    /// # Errors
    /// * `ParentFinalized` if the work paper is completed
    /// * `DuplicateAttestation` if the user already signs this paper
    pub async fn add_signer(
        &self,
        work_paper_id: Uuid,
        party: Party,
    ) -> Result<Attestation, WorkflowError> {
        let now = self.now();
        let mut unit = self.store.begin().await?;
        let paper: WorkPaper = lock_parent(&mut unit, work_paper_id).await?;
        ensure_not_finalized(&paper)?;

        let existing = unit
            .find_attestation_by_party(AttestationKind::Signer, work_paper_id, party.user_id)
            .await?;
        if existing.is_some() {
            return Err(WorkflowError::DuplicateAttestation {
                parent_id: work_paper_id,
                user_id: party.user_id,
            });
        }

        let signer = Attestation::new(AttestationKind::Signer, work_paper_id, party, now);
        unit.insert_attestation(&signer).await?;
        unit.commit().await?;

        info!(
            work_paper_id = %work_paper_id,
            signature_id = %signer.id,
            user_id = %signer.user_id,
            "Signer added"
        );
        Ok(signer)
    }

    /// Remove a signer from a work paper.
    ///
    /// # Errors
    /// * `ParentFinalized` if the work paper is completed
    pub async fn remove_signer(
        &self,
        work_paper_id: Uuid,
        signature_id: Uuid,
    ) -> Result<(), WorkflowError> {
        let mut unit = self.store.begin().await?;
        let paper: WorkPaper = lock_parent(&mut unit, work_paper_id).await?;
        ensure_not_finalized(&paper)?;

        let signer =
            load_attestation(&mut unit, AttestationKind::Signer, signature_id, work_paper_id).await?;
        unit.delete_attestation(AttestationKind::Signer, signer.id).await?;
        unit.commit().await?;

        info!(work_paper_id = %work_paper_id, signature_id = %signature_id, "Signer removed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Decisions
    // ------------------------------------------------------------------

    /// Record a signer's decision on a work paper.
    pub async fn decide_signature(
        &self,
        work_paper_id: Uuid,
        signature_id: Uuid,
        action: DecisionAction,
        notes: Option<String>,
    ) -> Result<DecisionOutcome<WorkPaper>, WorkflowError> {
        self.decide(
            work_paper_id,
            signature_id,
            action,
            notes,
            self.work_paper_policy.as_ref(),
        )
        .await
    }

    /// Record a verificator's decision on a business trip.
    pub async fn decide_verification(
        &self,
        business_trip_id: Uuid,
        verificator_id: Uuid,
        action: DecisionAction,
        notes: Option<String>,
    ) -> Result<DecisionOutcome<BusinessTrip>, WorkflowError> {
        self.decide(
            business_trip_id,
            verificator_id,
            action,
            notes,
            self.business_trip_policy.as_ref(),
        )
        .await
    }

    /// Return a signer to pending.
    pub async fn reset_signature(
        &self,
        work_paper_id: Uuid,
        signature_id: Uuid,
    ) -> Result<Attestation, WorkflowError> {
        self.reset::<WorkPaper>(work_paper_id, signature_id).await
    }

    /// Verificators decide once; this always ends in `ResetNotSupported`
    /// for an existing verificator.
    pub async fn reset_verification(
        &self,
        business_trip_id: Uuid,
        verificator_id: Uuid,
    ) -> Result<Attestation, WorkflowError> {
        self.reset::<BusinessTrip>(business_trip_id, verificator_id).await
    }

    // ------------------------------------------------------------------
    // Digital signatures
    // ------------------------------------------------------------------

    /// Sign a work paper on behalf of its assigned signer.
    ///
    /// Records the `signed` decision and attaches a digital signature over
    /// the canonical payload in one step.
    ///
    /// # Errors
    /// * `NotAssignedSigner` if `user_id` is not the signer's party
    /// * `CannotSignRejected` / `AlreadySigned` if already decided
    /// * `ParentNotAcceptingDecisions` unless the paper is `ready_to_sign`
    pub async fn sign_digitally(
        &self,
        work_paper_id: Uuid,
        signature_id: Uuid,
        user_id: Uuid,
    ) -> Result<DecisionOutcome<WorkPaper>, WorkflowError> {
        let now = self.now();
        let mut unit = self.store.begin().await?;
        let mut paper: WorkPaper = lock_parent(&mut unit, work_paper_id).await?;
        let mut signer =
            load_attestation(&mut unit, AttestationKind::Signer, signature_id, work_paper_id).await?;

        if signer.user_id != user_id {
            warn!(
                signature_id = %signature_id,
                user_id = %user_id,
                "Digital signature attempted by another user"
            );
            return Err(WorkflowError::NotAssignedSigner { user_id });
        }
        match signer.status {
            AttestationStatus::Rejected => return Err(WorkflowError::CannotSignRejected(signer.id)),
            AttestationStatus::Signed => return Err(WorkflowError::AlreadySigned(signer.id)),
            AttestationStatus::Pending | AttestationStatus::Approved => {}
        }
        ensure_accepts_decisions(&paper)?;

        signer.sign(None, now)?;
        let digital_signature = self.signatures.sign_attestation(&signer, now)?;
        signer.attach_digital_signature(digital_signature, now)?;
        unit.save_attestation(&signer).await?;

        let (parent_change, tally) =
            aggregate(&mut unit, &mut paper, self.work_paper_policy.as_ref(), now).await?;
        unit.commit().await?;

        info!(
            work_paper_id = %work_paper_id,
            signature_id = %signature_id,
            algorithm = self.signatures.algorithm(),
            "Work paper signed digitally"
        );
        Ok(DecisionOutcome {
            attestation: signer,
            parent: paper,
            parent_change,
            tally,
        })
    }

    /// Verify a signer's digital signature and cache the result.
    ///
    /// An invalid signature is a normal outcome, not an error.
    ///
    /// # Errors
    /// * `NoDigitalSignature` if nothing was signed digitally
    pub async fn verify_digitally(
        &self,
        work_paper_id: Uuid,
        signature_id: Uuid,
    ) -> Result<VerificationReport, WorkflowError> {
        let now = self.now();
        let mut unit = self.store.begin().await?;
        let _paper: WorkPaper = lock_parent(&mut unit, work_paper_id).await?;
        let mut signer =
            load_attestation(&mut unit, AttestationKind::Signer, signature_id, work_paper_id).await?;

        let digital_signature = signer
            .digital_signature
            .clone()
            .ok_or(WorkflowError::NoDigitalSignature(signature_id))?;
        let outcome = self.signatures.verify_attestation(&signer, &digital_signature);

        signer.record_verification(&outcome, now)?;
        unit.save_attestation(&signer).await?;
        unit.commit().await?;

        match outcome.error() {
            None => debug!(signature_id = %signature_id, "Digital signature verified"),
            Some(reason) => warn!(
                signature_id = %signature_id,
                reason,
                "Digital signature verification failed"
            ),
        }
        Ok(VerificationReport {
            attestation_id: signature_id,
            is_valid: outcome.is_valid(),
            error: outcome.error().map(String::from),
            verified_at: now,
        })
    }

    // ------------------------------------------------------------------
    // Shared steps
    // ------------------------------------------------------------------

    async fn progress<P>(&self, parent_id: Uuid) -> Result<Progress<P>, WorkflowError>
    where
        P: ParentEntity,
        S::Unit: ParentRepository<P>,
    {
        let mut unit = self.store.begin().await?;
        let parent = <S::Unit as ParentRepository<P>>::find_parent(&mut unit, parent_id)
            .await?
            .ok_or_else(|| WorkflowError::parent_not_found(P::kind(), parent_id))?;
        let attestations = unit
            .list_attestations(P::ATTESTATION_KIND, parent_id)
            .await?;
        unit.commit().await?;

        let tally = ConsensusAggregator::tally(&attestations);
        Ok(Progress {
            parent,
            attestations,
            tally,
        })
    }

    async fn decide<P>(
        &self,
        parent_id: Uuid,
        attestation_id: Uuid,
        action: DecisionAction,
        notes: Option<String>,
        policy: &dyn ConsensusPolicy<P::Status>,
    ) -> Result<DecisionOutcome<P>, WorkflowError>
    where
        P: ParentEntity,
        S::Unit: ParentRepository<P>,
    {
        let now = self.now();
        let mut unit = self.store.begin().await?;
        let mut parent: P = lock_parent(&mut unit, parent_id).await?;
        let mut attestation =
            load_attestation(&mut unit, P::ATTESTATION_KIND, attestation_id, parent_id).await?;
        ensure_accepts_decisions(&parent)?;

        attestation.decide(action, notes, now)?;
        unit.save_attestation(&attestation).await?;

        let (parent_change, tally) = aggregate(&mut unit, &mut parent, policy, now).await?;
        unit.commit().await?;

        info!(
            entity = %P::kind(),
            parent_id = %parent_id,
            attestation_id = %attestation_id,
            action = %action,
            "Decision recorded"
        );
        Ok(DecisionOutcome {
            attestation,
            parent,
            parent_change,
            tally,
        })
    }

    async fn reset<P>(&self, parent_id: Uuid, attestation_id: Uuid) -> Result<Attestation, WorkflowError>
    where
        P: ParentEntity,
        S::Unit: ParentRepository<P>,
    {
        let now = self.now();
        let mut unit = self.store.begin().await?;
        let parent: P = lock_parent(&mut unit, parent_id).await?;
        let mut attestation =
            load_attestation(&mut unit, P::ATTESTATION_KIND, attestation_id, parent_id).await?;
        ensure_not_finalized(&parent)?;

        attestation.reset(now)?;
        unit.save_attestation(&attestation).await?;
        unit.commit().await?;

        info!(
            entity = %P::kind(),
            parent_id = %parent_id,
            attestation_id = %attestation_id,
            "Attestation reset"
        );
        Ok(attestation)
    }
}

async fn lock_parent<P, U>(unit: &mut U, id: Uuid) -> Result<P, WorkflowError>
where
    P: ParentEntity,
    U: ParentRepository<P> + Send,
{
    <U as ParentRepository<P>>::lock_parent(unit, id)
        .await?
        .ok_or_else(|| WorkflowError::parent_not_found(P::kind(), id))
}

async fn load_attestation<U: UnitOfWork>(
    unit: &mut U,
    kind: AttestationKind,
    attestation_id: Uuid,
    parent_id: Uuid,
) -> Result<Attestation, WorkflowError> {
    let attestation = unit
        .find_attestation(kind, attestation_id)
        .await?
        .ok_or(WorkflowError::AttestationNotFound(attestation_id))?;
    if attestation.parent_id != parent_id {
        return Err(WorkflowError::ParentMismatch {
            attestation_id,
            parent_id,
        });
    }
    Ok(attestation)
}

/// Re-read every party under the parent lock and apply the policy's verdict.
async fn aggregate<P, U>(
    unit: &mut U,
    parent: &mut P,
    policy: &dyn ConsensusPolicy<P::Status>,
    now: DateTime<Utc>,
) -> Result<(Option<StatusChange<P::Status>>, Tally), WorkflowError>
where
    P: ParentEntity,
    U: UnitOfWork + ParentRepository<P>,
{
    let attestations = unit
        .list_attestations(P::ATTESTATION_KIND, parent.id())
        .await?;
    let tally = ConsensusAggregator::tally(&attestations);
    let change = ConsensusAggregator::resolve(parent, &attestations, policy, now)?;

    if let Some(change) = &change {
        <U as ParentRepository<P>>::save_parent(unit, parent).await?;
        info!(
            entity = %P::kind(),
            parent_id = %parent.id(),
            from = %change.from,
            to = %change.to,
            pending = tally.pending,
            rejected = tally.rejected,
            "Consensus moved parent"
        );
    }
    Ok((change, tally))
}

fn ensure_accepts_decisions<P: ParentEntity>(parent: &P) -> Result<(), WorkflowError> {
    if parent.accepts_decisions() {
        Ok(())
    } else {
        Err(WorkflowError::ParentNotAcceptingDecisions {
            entity: P::kind(),
            status: parent.status().as_str(),
        })
    }
}

fn ensure_not_finalized<P: ParentEntity>(parent: &P) -> Result<(), WorkflowError> {
    if parent.is_finalized() {
        Err(WorkflowError::ParentFinalized {
            entity: P::kind(),
            id: parent.id(),
        })
    } else {
        Ok(())
    }
}
