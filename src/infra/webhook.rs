//! Outbound webhook signing.
//!
//! Registry events forwarded to an operator endpoint are signed with
//! HMAC-SHA256 over the raw payload bytes. The tag travels hex-encoded in
//! the [`SIGNATURE_HEADER`] header; receivers recompute it with the shared
//! secret and compare in constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex-encoded payload signature.
pub const SIGNATURE_HEADER: &str = "x-hokusai-signature";

/// Sign a payload, returning the hex-encoded HMAC-SHA256 tag.
pub fn sign_payload(secret: &str, payload: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a received signature against the payload.
///
/// The hex decode tolerates mixed case; the tag comparison itself is
/// constant-time to prevent timing attacks.
pub fn verify_signature(secret: &str, payload: &[u8], signature: &str) -> bool {
    let Ok(received) = hex::decode(signature.trim()) else {
        return false;
    };

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(payload);
    let expected = mac.finalize().into_bytes();

    expected.as_slice().ct_eq(&received).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_matches_rfc_4231_vector() {
        // RFC 4231 test case 2
        let tag = sign_payload("Jefe", b"what do ya want for nothing?");
        assert_eq!(
            tag,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn verify_accepts_own_signature() {
        let payload = br#"{"event":"stage_transition","model":"churn","stage":"Production"}"#;
        let tag = sign_payload("shared-secret", payload);
        assert!(verify_signature("shared-secret", payload, &tag));
    }

    #[test]
    fn verify_accepts_uppercase_hex() {
        let payload = b"payload";
        let tag = sign_payload("shared-secret", payload).to_uppercase();
        assert!(verify_signature("shared-secret", payload, &tag));
    }

    #[test]
    fn verify_rejects_tampered_payload() {
        let tag = sign_payload("shared-secret", b"original");
        assert!(!verify_signature("shared-secret", b"tampered", &tag));
    }

    #[test]
    fn verify_rejects_wrong_secret_and_garbage() {
        let payload = b"payload";
        let tag = sign_payload("shared-secret", payload);
        assert!(!verify_signature("other-secret", payload, &tag));
        assert!(!verify_signature("shared-secret", payload, "not hex at all"));
        assert!(!verify_signature("shared-secret", payload, ""));
    }

    #[test]
    fn receiver_extracts_header_and_verifies() {
        let payload = br#"{"event":"model_version_created","model":"churn","version":"4"}"#;

        let mut headers = reqwest::header::HeaderMap::new();
        let tag = sign_payload("shared-secret", payload);
        headers.insert(SIGNATURE_HEADER, tag.parse().unwrap());

        let received = headers[SIGNATURE_HEADER].to_str().unwrap();
        assert!(verify_signature("shared-secret", payload, received));
    }
}
