//! Webhook signature verification using HMAC-SHA256.
//!
//! The calling platform signs each webhook body with a shared secret and sends
//! the hex-encoded HMAC-SHA256 in the `x-vapi-signature` header. Verification
//! runs over the exact raw request bytes, before any JSON parsing.
//!
//! # Trust boundary
//!
//! When no secret is configured for the deployment, [`verify_request`] accepts
//! every request. This is an operational fallback for environments where the
//! platform's signing is not enabled; it is not a safe default. The server
//! logs a warning at startup whenever it runs in this mode.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Optional prefix some senders put in front of the hex digest.
const ALGORITHM_PREFIX: &str = "sha256=";

/// Parses a signature header value into raw bytes.
///
/// Accepts plain hex (the platform's format) and, for compatibility,
/// `sha256=<hex>`. Surrounding whitespace is ignored.
///
/// Returns `None` for malformed input (bad hex, odd length, empty).
/// Never panics.
///
/// # Examples
///
/// ```
/// use vapi_lead_relay::webhooks::parse_signature;
///
/// assert_eq!(parse_signature("1234abcd"), Some(vec![0x12, 0x34, 0xab, 0xcd]));
/// assert_eq!(parse_signature("sha256=1234abcd"), Some(vec![0x12, 0x34, 0xab, 0xcd]));
/// assert!(parse_signature("xyz").is_none());
/// assert!(parse_signature("").is_none());
/// ```
pub fn parse_signature(header: &str) -> Option<Vec<u8>> {
    let trimmed = header.trim();
    let hex_sig = trimmed.strip_prefix(ALGORITHM_PREFIX).unwrap_or(trimmed);
    if hex_sig.is_empty() {
        return None;
    }
    hex::decode(hex_sig).ok()
}

/// Computes the HMAC-SHA256 signature of a payload using the given secret.
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Formats a signature as the lowercase hex string carried in the header.
pub fn format_signature(signature: &[u8]) -> String {
    hex::encode(signature)
}

/// Verifies a webhook signature against the payload and secret.
///
/// Returns `true` if the signature is valid, `false` otherwise (including
/// malformed signatures). Uses constant-time comparison.
///
/// # Examples
///
/// ```
/// use vapi_lead_relay::webhooks::{compute_signature, format_signature, verify_signature};
///
/// let payload = b"abc";
/// let header = format_signature(&compute_signature(payload, b"s"));
///
/// assert!(verify_signature(payload, &header, b"s"));
/// assert!(!verify_signature(payload, &header, b"other"));
/// ```
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let expected_signature = match parse_signature(signature_header) {
        Some(sig) => sig,
        None => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload);

    // Constant-time comparison via the HMAC library
    mac.verify_slice(&expected_signature).is_ok()
}

/// Verifies an inbound request, honouring the "no secret configured" bypass.
///
/// * `secret == None` - verification is disabled; always `true`.
/// * `signature_header == None` with a secret - `false`.
/// * otherwise - [`verify_signature`].
pub fn verify_request(payload: &[u8], signature_header: Option<&str>, secret: Option<&[u8]>) -> bool {
    let Some(secret) = secret else {
        return true;
    };
    match signature_header {
        Some(header) => verify_signature(payload, header, secret),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // ========================================================================
    // Unit tests for known vectors and edge cases
    // ========================================================================

    /// HMAC-SHA256(key = "s", message = "abc").
    const ABC_WITH_S: &str = "47d920ed90784dc5eae635bfd0824f612d05f09f9a47f60390de873ad37e546b";

    #[test]
    fn test_parse_signature_plain_hex() {
        assert_eq!(parse_signature("1234abcd"), Some(vec![0x12, 0x34, 0xab, 0xcd]));
    }

    #[test]
    fn test_parse_signature_prefixed() {
        assert_eq!(
            parse_signature("sha256=1234abcd"),
            Some(vec![0x12, 0x34, 0xab, 0xcd])
        );
    }

    #[test]
    fn test_parse_signature_trims_whitespace() {
        assert_eq!(parse_signature("  1234abcd\n"), Some(vec![0x12, 0x34, 0xab, 0xcd]));
    }

    #[test]
    fn test_parse_signature_uppercase_hex() {
        assert_eq!(parse_signature("ABCD1234"), Some(vec![0xab, 0xcd, 0x12, 0x34]));
    }

    #[test]
    fn test_parse_signature_rejects_malformed() {
        assert_eq!(parse_signature(""), None);
        assert_eq!(parse_signature("sha256="), None);
        assert_eq!(parse_signature("xyz"), None);
        assert_eq!(parse_signature("abc"), None);
        assert_eq!(parse_signature("sha1=abcd"), None);
    }

    #[test]
    fn test_known_vector() {
        let header = format_signature(&compute_signature(b"abc", b"s"));
        assert_eq!(header, ABC_WITH_S);
        assert!(verify_signature(b"abc", ABC_WITH_S, b"s"));
        assert!(verify_signature(b"abc", &ABC_WITH_S.to_uppercase(), b"s"));
    }

    #[test]
    fn test_verify_signature_wrong_secret() {
        let header = format_signature(&compute_signature(b"payload", b"correct"));
        assert!(verify_signature(b"payload", &header, b"correct"));
        assert!(!verify_signature(b"payload", &header, b"wrong"));
    }

    #[test]
    fn test_verify_signature_modified_payload() {
        let header = format_signature(&compute_signature(b"original", b"secret"));
        assert!(!verify_signature(b"modified", &header, b"secret"));
    }

    #[test]
    fn test_verify_signature_truncated_signature() {
        let header = format_signature(&compute_signature(b"abc", b"s"));
        assert!(!verify_signature(b"abc", &header[..62], b"s"));
    }

    #[test]
    fn test_verify_signature_malformed_header_returns_false() {
        for header in ["", "sha256=", "not-hex", "zzzz", "abc"] {
            assert!(!verify_signature(b"abc", header, b"s"), "header {header:?}");
        }
    }

    #[test]
    fn test_verify_request_bypass_without_secret() {
        assert!(verify_request(b"abc", None, None));
        assert!(verify_request(b"abc", Some("garbage"), None));
        assert!(verify_request(b"abc", Some(""), None));
    }

    #[test]
    fn test_verify_request_missing_header_with_secret() {
        assert!(!verify_request(b"abc", None, Some(b"s".as_slice())));
    }

    #[test]
    fn test_verify_request_valid_header_with_secret() {
        let header = format_signature(&compute_signature(b"abc", b"s"));
        assert!(verify_request(b"abc", Some(header.as_str()), Some(b"s".as_slice())));
    }

    // ========================================================================
    // Property-based tests
    // ========================================================================

    proptest! {
        #[test]
        fn prop_sign_verify_roundtrip(payload: Vec<u8>, secret: Vec<u8>) {
            let header = format_signature(&compute_signature(&payload, &secret));
            prop_assert!(verify_signature(&payload, &header, &secret));
        }

        /// Flipping any single bit of the payload causes rejection.
        #[test]
        fn prop_payload_bit_flip_fails(
            payload in prop::collection::vec(any::<u8>(), 1..256),
            secret in any::<Vec<u8>>(),
            index in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let header = format_signature(&compute_signature(&payload, &secret));
            let mut mutated = payload.clone();
            let i = index.index(mutated.len());
            mutated[i] ^= 1 << bit;
            prop_assert!(!verify_signature(&mutated, &header, &secret));
        }

        /// Flipping any single bit of the signature causes rejection.
        #[test]
        fn prop_signature_bit_flip_fails(
            payload: Vec<u8>,
            secret in any::<Vec<u8>>(),
            index in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let mut sig = compute_signature(&payload, &secret);
            let i = index.index(sig.len());
            sig[i] ^= 1 << bit;
            prop_assert!(!verify_signature(&payload, &format_signature(&sig), &secret));
        }

        #[test]
        fn prop_wrong_secret_fails(payload: Vec<u8>, secret1: Vec<u8>, secret2: Vec<u8>) {
            prop_assume!(secret1 != secret2);
            let header = format_signature(&compute_signature(&payload, &secret1));
            prop_assert!(!verify_signature(&payload, &header, &secret2));
        }

        /// Without a configured secret every request passes, signed or not.
        #[test]
        fn prop_no_secret_accepts_anything(
            payload in any::<Vec<u8>>(),
            header in prop::option::of(".*"),
        ) {
            prop_assert!(verify_request(&payload, header.as_deref(), None));
        }

        #[test]
        fn prop_malformed_header_no_panic(header: String, payload: Vec<u8>, secret: Vec<u8>) {
            let _ = parse_signature(&header);
            let _ = verify_signature(&payload, &header, &secret);
        }

        #[test]
        fn prop_signature_length(payload: Vec<u8>, secret: Vec<u8>) {
            prop_assert_eq!(compute_signature(&payload, &secret).len(), 32);
        }
    }
}
