//! Property-based tests for the attestation lifecycle.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use crate::workflow::attestation::{Attestation, Party};
use crate::workflow::error::WorkflowError;
use crate::workflow::types::{AttestationKind, AttestationStatus, DecisionAction};

fn arb_kind() -> impl Strategy<Value = AttestationKind> {
    prop_oneof![Just(AttestationKind::Signer), Just(AttestationKind::Verificator)]
}

fn arb_action() -> impl Strategy<Value = DecisionAction> {
    prop_oneof![
        Just(DecisionAction::Approve),
        Just(DecisionAction::Sign),
        Just(DecisionAction::Reject),
    ]
}

fn new_attestation(kind: AttestationKind) -> Attestation {
    let party = Party {
        user_id: Uuid::new_v4(),
        user_name: "Party".to_string(),
        position: "Reviewer".to_string(),
    };
    let created = Utc.with_ymd_and_hms(2026, 2, 2, 8, 0, 0).unwrap();
    Attestation::new(kind, Uuid::new_v4(), party, created)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A second decision never succeeds and never changes the first one.
    #[test]
    fn prop_second_decision_is_rejected(
        kind in arb_kind(),
        first in arb_action(),
        second in arb_action(),
        notes in prop::option::of("[a-z ]{1,20}"),
    ) {
        let mut att = new_attestation(kind);
        let now = Utc.with_ymd_and_hms(2026, 2, 2, 9, 0, 0).unwrap();
        prop_assume!(att.decide(first, notes, now).is_ok());
        let snapshot = att.clone();

        let result = att.decide(second, None, now + Duration::hours(1));
        let is_rejected = matches!(
            result,
            Err(WorkflowError::AlreadyDecided { .. } | WorkflowError::UnsupportedAction { .. })
        );
        prop_assert!(is_rejected);
        prop_assert_eq!(att, snapshot);
    }

    /// decided_at is set exactly when the status is not pending.
    #[test]
    fn prop_decided_at_tracks_status(
        actions in prop::collection::vec(arb_action(), 0..6),
        resets in prop::collection::vec(any::<bool>(), 0..6),
    ) {
        let mut att = new_attestation(AttestationKind::Signer);
        let mut now = Utc.with_ymd_and_hms(2026, 2, 2, 9, 0, 0).unwrap();
        for (action, reset) in actions.into_iter().zip(resets.into_iter().chain(std::iter::repeat(false))) {
            now += Duration::minutes(1);
            let _ = att.decide(action, Some("note".to_string()), now);
            if reset {
                let _ = att.reset(now);
            }
            prop_assert_eq!(att.decided_at.is_some(), att.status != AttestationStatus::Pending);
            prop_assert_eq!(att.notes.is_some(), att.status != AttestationStatus::Pending);
        }
    }
}
