//! Workflow domain types for parent lifecycles and party attestations.
//!
//! This module defines the closed status sets of the two parent entities
//! (work papers and business trips), the attestation status set, and the
//! actions a party can take on its own attestation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of parent entity whose lifecycle is being driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A reviewable audit document.
    WorkPaper,
    /// A travel authorization.
    BusinessTrip,
}

impl EntityKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WorkPaper => "work_paper",
            Self::BusinessTrip => "business_trip",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A closed set of lifecycle statuses with a directed transition table.
///
/// Implementors encode their table as an exhaustive `match`, so adding a
/// status without deciding its edges fails to compile.
pub trait WorkflowStatus:
    Copy + Eq + fmt::Debug + fmt::Display + Send + Sync + Serialize + 'static
{
    /// The entity kind this status set belongs to.
    const ENTITY: EntityKind;

    /// Every status in the set, in declaration order.
    const ALL: &'static [Self];

    /// Returns the string representation of the status.
    fn as_str(&self) -> &'static str;

    /// Returns true if the table lists an edge from `self` to `target`.
    ///
    /// Self-transitions are handled by `TransitionPolicy` and need not be
    /// listed here.
    fn has_edge_to(self, target: Self) -> bool;
}

/// Work paper lifecycle status.
///
/// The valid transitions are:
/// - Draft → Ongoing
/// - Ongoing → ReadyToSign | Draft
/// - ReadyToSign → Completed | Ongoing
/// - Completed → ReadyToSign (reopen)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkPaperStatus {
    /// Being drafted; signers may still be arranged.
    Draft,
    /// Review work in progress.
    Ongoing,
    /// Waiting for the assigned signers.
    ReadyToSign,
    /// Finalized; requires a document link.
    Completed,
}

impl WorkPaperStatus {
    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "ongoing" => Some(Self::Ongoing),
            "ready_to_sign" => Some(Self::ReadyToSign),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl WorkflowStatus for WorkPaperStatus {
    const ENTITY: EntityKind = EntityKind::WorkPaper;
    const ALL: &'static [Self] = &[
        Self::Draft,
        Self::Ongoing,
        Self::ReadyToSign,
        Self::Completed,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Ongoing => "ongoing",
            Self::ReadyToSign => "ready_to_sign",
            Self::Completed => "completed",
        }
    }

    fn has_edge_to(self, target: Self) -> bool {
        match self {
            Self::Draft => matches!(target, Self::Ongoing),
            Self::Ongoing => matches!(target, Self::ReadyToSign | Self::Draft),
            Self::ReadyToSign => matches!(target, Self::Completed | Self::Ongoing),
            Self::Completed => matches!(target, Self::ReadyToSign),
        }
    }
}

impl fmt::Display for WorkPaperStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Business trip lifecycle status.
///
/// `Completed` is terminal: it has no outgoing edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessTripStatus {
    /// Being prepared.
    Draft,
    /// Waiting for the verificators' decisions.
    ReadyToVerify,
    /// Cleared to proceed, or kicked back for correction.
    Ongoing,
    /// Called off; may be redrafted.
    Canceled,
    /// Finished (terminal).
    Completed,
}

impl BusinessTripStatus {
    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "ready_to_verify" => Some(Self::ReadyToVerify),
            "ongoing" => Some(Self::Ongoing),
            "canceled" => Some(Self::Canceled),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl WorkflowStatus for BusinessTripStatus {
    const ENTITY: EntityKind = EntityKind::BusinessTrip;
    const ALL: &'static [Self] = &[
        Self::Draft,
        Self::ReadyToVerify,
        Self::Ongoing,
        Self::Canceled,
        Self::Completed,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::ReadyToVerify => "ready_to_verify",
            Self::Ongoing => "ongoing",
            Self::Canceled => "canceled",
            Self::Completed => "completed",
        }
    }

    fn has_edge_to(self, target: Self) -> bool {
        match self {
            Self::Draft => matches!(
                target,
                Self::ReadyToVerify | Self::Ongoing | Self::Completed | Self::Canceled
            ),
            Self::ReadyToVerify => {
                matches!(target, Self::Ongoing | Self::Draft | Self::Canceled)
            }
            Self::Ongoing => matches!(
                target,
                Self::Completed | Self::Canceled | Self::Draft | Self::ReadyToVerify
            ),
            Self::Canceled => matches!(target, Self::Draft),
            Self::Completed => false,
        }
    }
}

impl fmt::Display for BusinessTripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The role a party plays against its parent entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttestationKind {
    /// Signs a work paper; may attach a digital signature and may be reset.
    Signer,
    /// Verifies a business trip; one-shot decision.
    Verificator,
}

impl AttestationKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Signer => "signer",
            Self::Verificator => "verificator",
        }
    }

    /// Returns true if this kind of attestation can go back to pending.
    #[must_use]
    pub fn supports_reset(&self) -> bool {
        matches!(self, Self::Signer)
    }
}

impl fmt::Display for AttestationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of one party's attestation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttestationStatus {
    /// No decision recorded yet.
    Pending,
    /// A signer has signed.
    Signed,
    /// A verificator has approved.
    Approved,
    /// The party rejected.
    Rejected,
}

impl AttestationStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Signed => "signed",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "signed" => Some(Self::Signed),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true for a recorded positive decision (signed or approved).
    #[must_use]
    pub fn is_positive(&self) -> bool {
        matches!(self, Self::Signed | Self::Approved)
    }

    /// Returns true once the status has left `Pending`.
    #[must_use]
    pub fn is_decided(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for AttestationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A decision a party records on its own attestation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionAction {
    /// Verificator approval.
    Approve,
    /// Signer sign-off.
    Sign,
    /// Rejection by either kind of party.
    Reject,
}

impl DecisionAction {
    /// Returns the string representation of the action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Sign => "sign",
            Self::Reject => "reject",
        }
    }

    /// Parses an action from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "approve" => Some(Self::Approve),
            "sign" => Some(Self::Sign),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }
}

impl fmt::Display for DecisionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
