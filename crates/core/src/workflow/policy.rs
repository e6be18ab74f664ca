//! Transition policy for parent entity statuses.
//!
//! The tables themselves live on the status enums as exhaustive matches;
//! this module adds the always-allowed self-transition, the entity guards,
//! and is the only place a parent's status is written.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::workflow::entity::ParentEntity;
use crate::workflow::error::WorkflowError;
use crate::workflow::types::WorkflowStatus;

/// Proof that a status change was validated by `TransitionPolicy`.
///
/// Cannot be constructed outside this module.
#[derive(Debug)]
pub struct TransitionPermit {
    _private: (),
}

/// A parent status change that was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusChange<S> {
    /// Status before the change.
    pub from: S,
    /// Status after the change.
    pub to: S,
    /// When the change was applied.
    pub at: DateTime<Utc>,
}

/// Stateless policy over the transition tables.
pub struct TransitionPolicy;

impl TransitionPolicy {
    /// Check if a status transition is allowed.
    ///
    /// Self-transitions are always allowed.
    #[must_use]
    pub fn is_allowed<S: WorkflowStatus>(from: S, to: S) -> bool {
        from == to || from.has_edge_to(to)
    }

    /// Validate a transition against the table.
    ///
    /// # Returns
    /// * `Ok(())` if the transition is listed (or is a self-transition)
    /// * `Err(WorkflowError::InvalidTransition)` otherwise
    pub fn validate<S: WorkflowStatus>(from: S, to: S) -> Result<(), WorkflowError> {
        if Self::is_allowed(from, to) {
            Ok(())
        } else {
            Err(WorkflowError::InvalidTransition {
                entity: S::ENTITY,
                from: from.as_str(),
                to: to.as_str(),
            })
        }
    }

    /// Returns every status reachable from `from` in one step, excluding itself.
    #[must_use]
    pub fn targets_from<S: WorkflowStatus>(from: S) -> Vec<S> {
        S::ALL
            .iter()
            .copied()
            .filter(|to| *to != from && from.has_edge_to(*to))
            .collect()
    }

    /// Move an entity to `target`.
    ///
    /// The table is checked first, then the entity guard. On any failure
    /// the entity is left untouched.
    ///
    /// # Returns
    /// * `Ok(Some(change))` if the status changed
    /// * `Ok(None)` for a self-transition
    /// * `Err(WorkflowError::InvalidTransition)` if the table has no edge
    /// * `Err(WorkflowError::GuardFailed)` if the guard rejects the target
    pub fn apply<P: ParentEntity>(
        entity: &mut P,
        target: P::Status,
        now: DateTime<Utc>,
    ) -> Result<Option<StatusChange<P::Status>>, WorkflowError> {
        let from = entity.status();
        Self::validate(from, target)?;
        entity.check_guard(target)?;

        if from == target {
            return Ok(None);
        }

        entity.store_status(TransitionPermit { _private: () }, target, now);
        Ok(Some(StatusChange {
            from,
            to: target,
            at: now,
        }))
    }
}
