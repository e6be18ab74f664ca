//! Property-based tests for DigitalSignatureService.
//!
//! Every payload must verify against its own signature, and a single
//! changed byte in either the payload or the signature must be detected.

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use crate::workflow::signature::{DigitalSignatureService, ED25519, Ed25519Primitive};

fn service() -> DigitalSignatureService {
    DigitalSignatureService::new(Arc::new(Ed25519Primitive::from_seed(&[42u8; 32])))
}

/// Strategy for generating random UUIDs.
fn arb_uuid() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A signature always verifies against the payload it was made for.
    #[test]
    fn prop_sign_verify_round_trip(payload in "[ -~]{0,200}") {
        let svc = service();
        let signed = svc.sign(&payload).unwrap();
        prop_assert!(svc.verify(&signed.signature, &payload, ED25519).is_valid());
    }

    /// Changing one byte of the payload invalidates the signature.
    #[test]
    fn prop_payload_byte_change_detected(
        payload in "[a-z0-9|=:-]{1,120}",
        index in any::<prop::sample::Index>(),
    ) {
        let svc = service();
        let signed = svc.sign(&payload).unwrap();

        let mut bytes = payload.into_bytes();
        let i = index.index(bytes.len());
        bytes[i] = if bytes[i] == b'#' { b'%' } else { b'#' };
        let tampered = String::from_utf8(bytes).unwrap();

        prop_assert!(!svc.verify(&signed.signature, &tampered, ED25519).is_valid());
    }

    /// Changing one byte of the signature invalidates it.
    #[test]
    fn prop_signature_byte_change_detected(
        payload in "[ -~]{0,120}",
        index in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let svc = service();
        let signed = svc.sign(&payload).unwrap();

        let mut raw = BASE64.decode(&signed.signature).unwrap();
        let i = index.index(raw.len());
        raw[i] ^= flip;
        let tampered = BASE64.encode(raw);

        prop_assert!(!svc.verify(&tampered, &payload, ED25519).is_valid());
    }

    /// The payload depends only on its inputs.
    #[test]
    fn prop_payload_is_deterministic(
        user in arb_uuid(),
        parent in arb_uuid(),
        attestation in arb_uuid(),
        secs in 0i64..4_000_000_000,
        micros in 0u32..1_000_000,
    ) {
        let at = Utc.timestamp_opt(secs, micros * 1_000).unwrap();
        let a = DigitalSignatureService::build_payload(user, parent, attestation, at);
        let b = DigitalSignatureService::build_payload(user, parent, attestation, at);
        prop_assert_eq!(&a, &b);
        prop_assert!(a.starts_with("auditflow-signature:v1|"));
    }
}
