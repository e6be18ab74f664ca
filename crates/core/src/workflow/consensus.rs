//! Consensus aggregation across all parties of a parent.
//!
//! The aggregator turns a fresh read of every attestation on a parent into
//! a parent status decision. Which decision depends on a per-entity policy.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::workflow::attestation::Attestation;
use crate::workflow::entity::ParentEntity;
use crate::workflow::error::WorkflowError;
use crate::workflow::policy::{StatusChange, TransitionPolicy};
use crate::workflow::types::{AttestationStatus, BusinessTripStatus, WorkPaperStatus, WorkflowStatus};

/// Counts of attestation statuses on one parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    /// Number of parties.
    pub total: usize,
    /// Parties still pending.
    pub pending: usize,
    /// Parties who signed or approved.
    pub positive: usize,
    /// Parties who rejected.
    pub rejected: usize,
}

impl Tally {
    /// Counts a set of attestation statuses.
    pub fn from_statuses(statuses: impl IntoIterator<Item = AttestationStatus>) -> Self {
        statuses.into_iter().fold(Self::default(), |mut tally, status| {
            tally.total += 1;
            match status {
                AttestationStatus::Pending => tally.pending += 1,
                AttestationStatus::Signed | AttestationStatus::Approved => tally.positive += 1,
                AttestationStatus::Rejected => tally.rejected += 1,
            }
            tally
        })
    }

    /// Returns true if every party decided positively. Vacuously true for none.
    #[must_use]
    pub fn all_positive(&self) -> bool {
        self.positive == self.total
    }

    /// Returns true if any party rejected.
    #[must_use]
    pub fn any_rejected(&self) -> bool {
        self.rejected > 0
    }
}

/// What the aggregate picture asks of the parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsensusDecision<S> {
    /// Leave the parent where it is.
    Hold,
    /// Every party agreed; move forward.
    Advance(S),
    /// A party vetoed; send the parent back.
    Revert(S),
}

impl<S: Copy> ConsensusDecision<S> {
    /// Returns the target status, if any.
    pub fn target(&self) -> Option<S> {
        match self {
            Self::Hold => None,
            Self::Advance(s) | Self::Revert(s) => Some(*s),
        }
    }
}

/// Maps a tally to a parent status decision.
pub trait ConsensusPolicy<S: WorkflowStatus>: Send + Sync {
    /// Decide the parent's next status from the current one and the tally.
    fn decide(&self, current: S, tally: &Tally) -> ConsensusDecision<S>;
}

/// Business trip verification: unanimity to advance, one veto to revert.
///
/// Only evaluated while the trip is `ready_to_verify`. Both outcomes land
/// on `ongoing`: cleared to proceed, or kicked back for correction.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnanimousVerification;

impl ConsensusPolicy<BusinessTripStatus> for UnanimousVerification {
    fn decide(&self, current: BusinessTripStatus, tally: &Tally) -> ConsensusDecision<BusinessTripStatus> {
        if current != BusinessTripStatus::ReadyToVerify {
            return ConsensusDecision::Hold;
        }
        if tally.any_rejected() {
            ConsensusDecision::Revert(BusinessTripStatus::Ongoing)
        } else if tally.all_positive() {
            ConsensusDecision::Advance(BusinessTripStatus::Ongoing)
        } else {
            ConsensusDecision::Hold
        }
    }
}

/// Work paper signatures are advisory; operators move the paper.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdvisorySignatures;

impl ConsensusPolicy<WorkPaperStatus> for AdvisorySignatures {
    fn decide(&self, _current: WorkPaperStatus, _tally: &Tally) -> ConsensusDecision<WorkPaperStatus> {
        ConsensusDecision::Hold
    }
}

/// Stateless aggregation over a parent's attestations.
pub struct ConsensusAggregator;

impl ConsensusAggregator {
    /// Tally a set of attestations.
    #[must_use]
    pub fn tally(attestations: &[Attestation]) -> Tally {
        Tally::from_statuses(attestations.iter().map(|a| a.status))
    }

    /// Evaluate the policy without touching the parent.
    pub fn evaluate<P: ParentEntity>(
        parent: &P,
        attestations: &[Attestation],
        policy: &dyn ConsensusPolicy<P::Status>,
    ) -> ConsensusDecision<P::Status> {
        policy.decide(parent.status(), &Self::tally(attestations))
    }

    /// Evaluate the policy and apply the resulting transition to the parent.
    ///
    /// `attestations` must be the complete set for the parent, read inside
    /// the same unit of work that holds the parent lock.
    ///
    /// # Returns
    /// * `Ok(Some(change))` if the parent moved
    /// * `Ok(None)` if the policy held or the target equals the current status
    pub fn resolve<P: ParentEntity>(
        parent: &mut P,
        attestations: &[Attestation],
        policy: &dyn ConsensusPolicy<P::Status>,
        now: DateTime<Utc>,
    ) -> Result<Option<StatusChange<P::Status>>, WorkflowError> {
        match Self::evaluate(parent, attestations, policy).target() {
            Some(target) => TransitionPolicy::apply(parent, target, now),
            None => Ok(None),
        }
    }
}
