//! Property-based tests for the transition policy.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use crate::workflow::entity::{BusinessTrip, ParentEntity, WorkPaper};
use crate::workflow::error::WorkflowError;
use crate::workflow::policy::TransitionPolicy;
use crate::workflow::types::{BusinessTripStatus, WorkPaperStatus, WorkflowStatus};

fn arb_work_paper_status() -> impl Strategy<Value = WorkPaperStatus> {
    prop::sample::select(WorkPaperStatus::ALL)
}

fn arb_business_trip_status() -> impl Strategy<Value = BusinessTripStatus> {
    prop::sample::select(BusinessTripStatus::ALL)
}

fn arb_link() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("   ".to_string())),
        "https://docs\\.example\\.com/[a-z]{1,8}".prop_map(Some),
    ]
}

fn paper(status: WorkPaperStatus, link: Option<String>) -> WorkPaper {
    let created = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
    let mut record = WorkPaper::new("Payroll", link, created).into_record();
    record.status = status;
    WorkPaper::restore(record)
}

fn trip(status: BusinessTripStatus) -> BusinessTrip {
    let created = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
    let mut record = BusinessTrip::new("Stock take", "Makassar", created).into_record();
    record.status = status;
    BusinessTrip::restore(record)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A pair outside the table is refused and leaves the work paper as it was.
    #[test]
    fn prop_work_paper_unlisted_pair_is_refused(
        from in arb_work_paper_status(),
        to in arb_work_paper_status(),
        link in arb_link(),
    ) {
        let mut entity = paper(from, link);
        let before = entity.clone();
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();

        let result = TransitionPolicy::apply(&mut entity, to, now);

        if TransitionPolicy::is_allowed(from, to) {
            let is_invalid = matches!(result, Err(WorkflowError::InvalidTransition { .. }));
            prop_assert!(!is_invalid);
        } else {
            let is_invalid = matches!(result, Err(WorkflowError::InvalidTransition { .. }));
            prop_assert!(is_invalid);
            prop_assert_eq!(entity, before);
        }
    }

    /// Same for business trips, which have no guards.
    #[test]
    fn prop_business_trip_follows_table(
        from in arb_business_trip_status(),
        to in arb_business_trip_status(),
    ) {
        let mut entity = trip(from);
        let before = entity.clone();
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();

        let result = TransitionPolicy::apply(&mut entity, to, now);

        if TransitionPolicy::is_allowed(from, to) {
            prop_assert!(result.is_ok());
            prop_assert_eq!(entity.status(), to);
        } else {
            prop_assert!(result.is_err());
            prop_assert_eq!(entity, before);
        }
    }

    /// ready_to_sign -> completed succeeds exactly when a non-blank link is present.
    #[test]
    fn prop_completion_guard_iff_link(link in arb_link()) {
        let has_link = link.as_deref().is_some_and(|l| !l.trim().is_empty());
        let mut entity = paper(WorkPaperStatus::ReadyToSign, link);
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();

        let result = TransitionPolicy::apply(&mut entity, WorkPaperStatus::Completed, now);

        prop_assert_eq!(result.is_ok(), has_link);
        if has_link {
            prop_assert_eq!(entity.status(), WorkPaperStatus::Completed);
        } else {
            let guard_failed = matches!(result, Err(WorkflowError::GuardFailed { .. }));
            prop_assert!(guard_failed);
            prop_assert_eq!(entity.status(), WorkPaperStatus::ReadyToSign);
        }
    }
}
