//! Property-based tests for ConsensusAggregator.
//!
//! Unanimity to advance, single veto to revert, hold otherwise.

use proptest::prelude::*;

use crate::workflow::consensus::{ConsensusDecision, ConsensusPolicy, Tally, UnanimousVerification};
use crate::workflow::types::{AttestationStatus, BusinessTripStatus};

/// Strategy for generating verificator statuses.
fn arb_verificator_status() -> impl Strategy<Value = AttestationStatus> {
    prop_oneof![
        Just(AttestationStatus::Pending),
        Just(AttestationStatus::Approved),
        Just(AttestationStatus::Rejected),
    ]
}

/// Strategy for generating trip statuses other than ready_to_verify.
fn arb_idle_trip_status() -> impl Strategy<Value = BusinessTripStatus> {
    prop_oneof![
        Just(BusinessTripStatus::Draft),
        Just(BusinessTripStatus::Ongoing),
        Just(BusinessTripStatus::Canceled),
        Just(BusinessTripStatus::Completed),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The trip moves iff someone rejected or nobody is left pending.
    #[test]
    fn prop_unanimity_or_veto(statuses in prop::collection::vec(arb_verificator_status(), 0..8)) {
        let tally = Tally::from_statuses(statuses.iter().copied());
        let decision = UnanimousVerification.decide(BusinessTripStatus::ReadyToVerify, &tally);

        let any_rejected = statuses.contains(&AttestationStatus::Rejected);
        let all_approved = statuses.iter().all(|s| *s == AttestationStatus::Approved);

        if any_rejected {
            prop_assert_eq!(decision, ConsensusDecision::Revert(BusinessTripStatus::Ongoing));
        } else if all_approved {
            prop_assert_eq!(decision, ConsensusDecision::Advance(BusinessTripStatus::Ongoing));
        } else {
            prop_assert_eq!(decision, ConsensusDecision::Hold);
        }
    }

    /// Counts always add up.
    #[test]
    fn prop_tally_sums_to_total(statuses in prop::collection::vec(arb_verificator_status(), 0..16)) {
        let tally = Tally::from_statuses(statuses.iter().copied());
        prop_assert_eq!(tally.total, statuses.len());
        prop_assert_eq!(tally.pending + tally.positive + tally.rejected, tally.total);
    }

    /// Outside of verification nothing moves.
    #[test]
    fn prop_hold_outside_verification(
        current in arb_idle_trip_status(),
        statuses in prop::collection::vec(arb_verificator_status(), 0..8),
    ) {
        let tally = Tally::from_statuses(statuses);
        prop_assert_eq!(UnanimousVerification.decide(current, &tally), ConsensusDecision::Hold);
    }
}
