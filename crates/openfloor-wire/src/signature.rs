//! Detached ed25519 signature verification for signed envelopes.
//!
//! The signature travels as base64 over the wire; the key is the raw
//! 32-byte session key registered at login. Verification is a pure
//! yes/no check: malformed signatures, wrong lengths, and invalid key
//! points are all verification failures, not protocol errors.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use openfloor_types::SessionKey;

/// Verify `signature_b64` over the UTF-8 bytes of `payload` with `key`.
///
/// Never panics and never propagates an error: any failure to decode or
/// verify returns `false`.
#[must_use]
pub fn verify(key: &SessionKey, payload: &str, signature_b64: &str) -> bool {
    let Ok(sig_bytes) = BASE64.decode(signature_b64) else {
        return false;
    };
    let Ok(sig_array) = <[u8; 64]>::try_from(sig_bytes.as_slice()) else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(key.as_bytes()) else {
        return false;
    };
    let signature = Signature::from_bytes(&sig_array);
    verifying_key.verify(payload.as_bytes(), &signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    fn keypair() -> (SigningKey, SessionKey) {
        let signing_key = SigningKey::generate(&mut rand::thread_rng());
        let session_key = SessionKey::from_bytes(signing_key.verifying_key().to_bytes());
        (signing_key, session_key)
    }

    fn sign(signing_key: &SigningKey, payload: &str) -> String {
        BASE64.encode(signing_key.sign(payload.as_bytes()).to_bytes())
    }

    #[test]
    fn valid_signature_verifies() {
        let (signing_key, session_key) = keypair();
        let payload = r#"{"command":"say_hello","id":1,"params":["hi"]}"#;
        let signature = sign(&signing_key, payload);
        assert!(verify(&session_key, payload, &signature));
    }

    #[test]
    fn wrong_key_fails() {
        let (signing_key, _) = keypair();
        let (_, other_session_key) = keypair();
        let payload = "message";
        let signature = sign(&signing_key, payload);
        assert!(!verify(&other_session_key, payload, &signature));
    }

    #[test]
    fn tampered_payload_fails() {
        let (signing_key, session_key) = keypair();
        let signature = sign(&signing_key, "original payload");
        assert!(!verify(&session_key, "tampered payload", &signature));
    }

    #[test]
    fn malformed_base64_fails_quietly() {
        let (_, session_key) = keypair();
        assert!(!verify(&session_key, "payload", "not-base64!!!"));
        assert!(!verify(&session_key, "payload", ""));
    }

    #[test]
    fn wrong_signature_length_fails_quietly() {
        let (_, session_key) = keypair();
        let short = BASE64.encode([0u8; 32]);
        assert!(!verify(&session_key, "payload", &short));
        let long = BASE64.encode([0u8; 96]);
        assert!(!verify(&session_key, "payload", &long));
    }
}
