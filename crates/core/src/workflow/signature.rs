//! Digital signatures over attestation decisions.
//!
//! The signed payload is a fixed-order, versioned string built from the
//! attestation's immutable fields plus the signing time. Verification
//! rebuilds it from the stored row, so both a corrupted signature and a
//! corrupted payload are detected.

use std::fmt;
use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use ed25519_dalek::{Signature, Signer as _, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::workflow::attestation::Attestation;

/// Algorithm name stored alongside Ed25519 signatures.
pub const ED25519: &str = "ed25519";

const PAYLOAD_VERSION: &str = "auditflow-signature:v1";

/// Errors raised by a signing primitive.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// The key material is unusable.
    #[error("Invalid signing key: {0}")]
    InvalidKey(String),

    /// Encoded input could not be decoded.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// The primitive failed to produce a signature.
    #[error("Signing failed: {0}")]
    Signing(String),
}

/// A pluggable signing primitive.
pub trait SignaturePrimitive: Send + Sync {
    /// Algorithm name recorded with each signature.
    fn algorithm(&self) -> &'static str;

    /// Sign raw bytes.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SignatureError>;

    /// Verify raw signature bytes. Never errors; a bad signature is `false`.
    fn verify(&self, signature: &[u8], message: &[u8], algorithm: &str) -> bool;
}

/// Ed25519 over a service-held key.
pub struct Ed25519Primitive {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl Ed25519Primitive {
    /// Builds a primitive from a 32-byte seed.
    #[must_use]
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Builds a primitive from a base64-encoded 32-byte seed.
    ///
    /// # Errors
    /// * `Encoding` if the input is not base64
    /// * `InvalidKey` if the seed is not 32 bytes
    pub fn from_base64_seed(encoded: &str) -> Result<Self, SignatureError> {
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| SignatureError::Encoding(e.to_string()))?;
        let seed: [u8; 32] = bytes.try_into().map_err(|_| {
            SignatureError::InvalidKey("expected a 32-byte Ed25519 seed".to_string())
        })?;
        Ok(Self::from_seed(&seed))
    }

    /// Generates a fresh random key.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::rngs::OsRng;
        let signing_key = SigningKey::generate(&mut rng);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Returns the public key, base64-encoded.
    #[must_use]
    pub fn verifying_key_base64(&self) -> String {
        BASE64.encode(self.verifying_key.to_bytes())
    }
}

impl fmt::Debug for Ed25519Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ed25519Primitive")
            .field("verifying_key", &self.verifying_key_base64())
            .finish_non_exhaustive()
    }
}

impl SignaturePrimitive for Ed25519Primitive {
    fn algorithm(&self) -> &'static str {
        ED25519
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SignatureError> {
        let signature = self
            .signing_key
            .try_sign(message)
            .map_err(|e| SignatureError::Signing(e.to_string()))?;
        Ok(signature.to_bytes().to_vec())
    }

    fn verify(&self, signature: &[u8], message: &[u8], algorithm: &str) -> bool {
        if algorithm != ED25519 {
            return false;
        }
        let Ok(signature) = Signature::from_slice(signature) else {
            return false;
        };
        self.verifying_key.verify_strict(message, &signature).is_ok()
    }
}

/// A digital signature attached to a signer attestation.
///
/// The `verified*` fields are a cache of the last verification run; the
/// authoritative answer is always a fresh `verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalSignature {
    /// Signature bytes, base64-encoded.
    pub signature: String,
    /// The exact payload that was signed.
    pub payload: String,
    /// Algorithm name.
    pub algorithm: String,
    /// When the payload was signed.
    pub signed_at: DateTime<Utc>,
    /// Result of the last verification.
    pub verified: bool,
    /// When the last verification ran.
    pub verified_at: Option<DateTime<Utc>>,
    /// Reason the last verification failed.
    pub verification_error: Option<String>,
}

/// Result of verifying a signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "reason", rename_all = "snake_case")]
pub enum VerificationOutcome {
    /// The signature matches the payload.
    Valid,
    /// The signature or payload is corrupt.
    Invalid(String),
}

impl VerificationOutcome {
    /// Returns true if valid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Returns the failure reason, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Valid => None,
            Self::Invalid(reason) => Some(reason),
        }
    }
}

/// A signed payload before it is attached to anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPayload {
    /// The payload that was signed.
    pub payload: String,
    /// Signature bytes, base64-encoded.
    pub signature: String,
    /// Algorithm name.
    pub algorithm: String,
}

/// Produces and checks digital signatures over attestations.
#[derive(Clone)]
pub struct DigitalSignatureService {
    primitive: Arc<dyn SignaturePrimitive>,
}

impl DigitalSignatureService {
    /// Creates a service over a signing primitive.
    #[must_use]
    pub fn new(primitive: Arc<dyn SignaturePrimitive>) -> Self {
        Self { primitive }
    }

    /// Returns the algorithm of the underlying primitive.
    #[must_use]
    pub fn algorithm(&self) -> &'static str {
        self.primitive.algorithm()
    }

    /// Builds the canonical payload for an attestation.
    ///
    /// Timestamps are rendered at microsecond precision so a payload rebuilt
    /// from a database row matches the one that was signed.
    #[must_use]
    pub fn build_payload(
        user_id: Uuid,
        parent_id: Uuid,
        attestation_id: Uuid,
        signed_at: DateTime<Utc>,
    ) -> String {
        format!(
            "{PAYLOAD_VERSION}|user={user_id}|parent={parent_id}|attestation={attestation_id}|signed_at={}",
            signed_at.to_rfc3339_opts(SecondsFormat::Micros, true)
        )
    }

    /// Sign a payload.
    ///
    /// # Errors
    /// Propagates primitive failures.
    pub fn sign(&self, payload: &str) -> Result<SignedPayload, SignatureError> {
        let bytes = self.primitive.sign(payload.as_bytes())?;
        Ok(SignedPayload {
            payload: payload.to_string(),
            signature: BASE64.encode(bytes),
            algorithm: self.primitive.algorithm().to_string(),
        })
    }

    /// Verify a base64 signature against a payload.
    #[must_use]
    pub fn verify(&self, signature: &str, payload: &str, algorithm: &str) -> VerificationOutcome {
        if algorithm != self.primitive.algorithm() {
            return VerificationOutcome::Invalid(format!("unsupported algorithm: {algorithm}"));
        }
        let bytes = match BASE64.decode(signature) {
            Ok(bytes) => bytes,
            Err(e) => {
                return VerificationOutcome::Invalid(format!("signature is not valid base64: {e}"));
            }
        };
        if self.primitive.verify(&bytes, payload.as_bytes(), algorithm) {
            VerificationOutcome::Valid
        } else {
            VerificationOutcome::Invalid("signature does not match payload".to_string())
        }
    }

    /// Produce a digital signature for an attestation.
    ///
    /// The signing time is truncated to microseconds and embedded in the
    /// payload before signing. The result starts out `verified`, trusting
    /// our own key.
    ///
    /// # Errors
    /// Propagates primitive failures.
    pub fn sign_attestation(
        &self,
        attestation: &Attestation,
        signed_at: DateTime<Utc>,
    ) -> Result<DigitalSignature, SignatureError> {
        let signed_at = signed_at.trunc_subsecs(6);
        let payload = Self::build_payload(
            attestation.user_id,
            attestation.parent_id,
            attestation.id,
            signed_at,
        );
        let signed = self.sign(&payload)?;
        Ok(DigitalSignature {
            signature: signed.signature,
            payload: signed.payload,
            algorithm: signed.algorithm,
            signed_at,
            verified: true,
            verified_at: Some(signed_at),
            verification_error: None,
        })
    }

    /// Verify an attestation's digital signature.
    ///
    /// The payload is rebuilt from the attestation and must equal the stored
    /// one before the signature itself is checked.
    #[must_use]
    pub fn verify_attestation(
        &self,
        attestation: &Attestation,
        signature: &DigitalSignature,
    ) -> VerificationOutcome {
        let expected = Self::build_payload(
            attestation.user_id,
            attestation.parent_id,
            attestation.id,
            signature.signed_at,
        );
        if expected != signature.payload {
            return VerificationOutcome::Invalid(
                "stored payload does not match the attestation".to_string(),
            );
        }
        self.verify(&signature.signature, &signature.payload, &signature.algorithm)
    }
}

impl fmt::Debug for DigitalSignatureService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigitalSignatureService")
            .field("algorithm", &self.primitive.algorithm())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::attestation::Party;
    use crate::workflow::types::AttestationKind;
    use chrono::TimeZone;

    fn service() -> DigitalSignatureService {
        DigitalSignatureService::new(Arc::new(Ed25519Primitive::from_seed(&[7u8; 32])))
    }

    fn signed_attestation() -> Attestation {
        let party = Party {
            user_id: Uuid::new_v4(),
            user_name: "Rina".to_string(),
            position: "Auditor".to_string(),
        };
        let mut att = Attestation::new(AttestationKind::Signer, Uuid::new_v4(), party, Utc::now());
        att.sign(None, Utc::now()).unwrap();
        att
    }

    #[test]
    fn test_payload_is_canonical() {
        let user = Uuid::nil();
        let parent = Uuid::from_u128(1);
        let att = Uuid::from_u128(2);
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 8, 30, 0).unwrap();
        let payload = DigitalSignatureService::build_payload(user, parent, att, at);
        assert_eq!(
            payload,
            format!(
                "auditflow-signature:v1|user={user}|parent={parent}|attestation={att}|signed_at=2026-03-01T08:30:00.000000Z"
            )
        );
    }

    #[test]
    fn test_sign_then_verify() {
        let svc = service();
        let signed = svc.sign("hello").unwrap();
        assert_eq!(signed.algorithm, ED25519);
        assert!(svc.verify(&signed.signature, "hello", ED25519).is_valid());
    }

    #[test]
    fn test_verify_rejects_changed_payload() {
        let svc = service();
        let signed = svc.sign("hello").unwrap();
        let outcome = svc.verify(&signed.signature, "hellp", ED25519);
        assert!(!outcome.is_valid());
        assert_eq!(outcome.error(), Some("signature does not match payload"));
    }

    #[test]
    fn test_verify_rejects_bad_base64() {
        let svc = service();
        let outcome = svc.verify("not base64!!", "hello", ED25519);
        assert!(!outcome.is_valid());
    }

    #[test]
    fn test_verify_rejects_unknown_algorithm() {
        let svc = service();
        let signed = svc.sign("hello").unwrap();
        let outcome = svc.verify(&signed.signature, "hello", "hmac-sha256");
        assert!(matches!(outcome, VerificationOutcome::Invalid(reason) if reason.contains("hmac-sha256")));
    }

    #[test]
    fn test_other_key_does_not_verify() {
        let signed = service().sign("hello").unwrap();
        let other = DigitalSignatureService::new(Arc::new(Ed25519Primitive::generate()));
        assert!(!other.verify(&signed.signature, "hello", ED25519).is_valid());
    }

    #[test]
    fn test_attestation_round_trip() {
        let svc = service();
        let att = signed_attestation();
        let sig = svc.sign_attestation(&att, Utc::now()).unwrap();
        assert!(sig.verified);
        assert_eq!(sig.verified_at, Some(sig.signed_at));
        assert!(svc.verify_attestation(&att, &sig).is_valid());
    }

    #[test]
    fn test_attestation_payload_tamper_detected() {
        let svc = service();
        let att = signed_attestation();
        let mut sig = svc.sign_attestation(&att, Utc::now()).unwrap();
        sig.payload.push('x');
        let outcome = svc.verify_attestation(&att, &sig);
        assert_eq!(
            outcome.error(),
            Some("stored payload does not match the attestation")
        );
    }

    #[test]
    fn test_attestation_signature_tamper_detected() {
        let svc = service();
        let att = signed_attestation();
        let mut sig = svc.sign_attestation(&att, Utc::now()).unwrap();
        let mut raw = BASE64.decode(&sig.signature).unwrap();
        raw[10] ^= 0x01;
        sig.signature = BASE64.encode(raw);
        assert!(!svc.verify_attestation(&att, &sig).is_valid());
    }

    #[test]
    fn test_from_base64_seed() {
        let encoded = BASE64.encode([7u8; 32]);
        let primitive = Ed25519Primitive::from_base64_seed(&encoded).unwrap();
        let reference = Ed25519Primitive::from_seed(&[7u8; 32]);
        assert_eq!(
            primitive.verifying_key_base64(),
            reference.verifying_key_base64()
        );

        assert!(matches!(
            Ed25519Primitive::from_base64_seed(&BASE64.encode([1u8; 16])),
            Err(SignatureError::InvalidKey(_))
        ));
        assert!(matches!(
            Ed25519Primitive::from_base64_seed("***"),
            Err(SignatureError::Encoding(_))
        ));
    }

    #[test]
    fn test_debug_hides_secret() {
        let primitive = Ed25519Primitive::from_seed(&[7u8; 32]);
        let rendered = format!("{primitive:?}");
        assert!(rendered.contains("verifying_key"));
        assert!(!rendered.contains("signing_key"));
    }
}
