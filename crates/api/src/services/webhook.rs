//! Webhook signature verification for the Resend callback.
//!
//! Resend delivers events through Svix, whose signature header carries a
//! space-separated list of `version,signature` pairs; older deployments used
//! a `t=<timestamp>,v1=<hex signature>` header instead. Both formats are
//! accepted. Verification never errors on malformed input: a header that
//! cannot be parsed simply fails to verify.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Prefix Svix puts on shared secrets; stripped before base64 decoding.
const SECRET_PREFIX: &str = "whsec_";

/// Verifies that inbound webhook calls were signed with the shared secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: Option<SecretString>,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl WebhookVerifier {
    /// Create a verifier. `None` disables verification entirely.
    #[must_use]
    pub const fn new(secret: Option<SecretString>) -> Self {
        Self { secret }
    }

    /// Whether a signing secret is configured.
    #[must_use]
    pub const fn has_secret(&self) -> bool {
        self.secret.is_some()
    }

    /// Verify a webhook call in either supported header format.
    ///
    /// With no configured secret every call is trusted — an operational
    /// fallback for environments without the secret set, not a security
    /// posture; the skip is logged as a warning.
    #[must_use]
    pub fn verify(&self, payload: &[u8], signature: &str, timestamp: &str, msg_id: &str) -> bool {
        let Some(secret) = self.secret.as_ref() else {
            warn!("RESEND_WEBHOOK_SECRET not configured, skipping signature verification");
            return true;
        };

        let key = decode_secret(secret.expose_secret());

        // Svix pairs lead with the version (`v1,<base64>`); the legacy header
        // is a `k=v` list, so it can never start a part with `v1,`.
        if signature.split(' ').any(|part| part.starts_with("v1,")) {
            verify_svix(&key, payload, signature, timestamp, msg_id)
        } else {
            verify_legacy(&key, payload, signature)
        }
    }
}

/// Strip the `whsec_` prefix and base64-decode the remainder into key bytes.
///
/// An undecodable secret is used verbatim; signatures then simply never match,
/// so a misconfigured secret fails closed instead of panicking.
fn decode_secret(secret: &str) -> Vec<u8> {
    let trimmed = secret.strip_prefix(SECRET_PREFIX).unwrap_or(secret);
    BASE64
        .decode(trimmed)
        .unwrap_or_else(|_| trimmed.as_bytes().to_vec())
}

/// Svix format: space-separated `version,signature` pairs, base64 signatures.
///
/// Only `v1` pairs are considered. The signed content is
/// `timestamp.payload`, or `msgId.timestamp.payload` when a message id header
/// was sent; both candidates are tried so historical deployments keep
/// verifying.
fn verify_svix(key: &[u8], payload: &[u8], signature: &str, timestamp: &str, msg_id: &str) -> bool {
    let signatures: Vec<&str> = signature
        .split(' ')
        .filter_map(|part| {
            let (version, sig) = part.split_once(',')?;
            (version == "v1").then_some(sig)
        })
        .collect();

    if signatures.is_empty() {
        warn!("no v1 signature found in svix header");
        return false;
    }

    let mut signed_payloads = Vec::with_capacity(2);
    if !msg_id.is_empty() {
        signed_payloads.push(format!("{msg_id}.{timestamp}."));
    }
    signed_payloads.push(format!("{timestamp}."));

    for prefix in signed_payloads {
        let expected = BASE64.encode(hmac_sha256(key, prefix.as_bytes(), payload));

        if signatures
            .iter()
            .any(|received| constant_time_compare(&expected, received))
        {
            return true;
        }
    }

    warn!("svix webhook signature verification failed");
    false
}

/// Legacy format: `t=<timestamp>,v1=<hex signature>` over `timestamp.payload`.
fn verify_legacy(key: &[u8], payload: &[u8], signature: &str) -> bool {
    let mut timestamp = None;
    let mut received = None;

    for part in signature.split(',') {
        if let Some((k, v)) = part.split_once('=') {
            match k {
                "t" => timestamp = Some(v),
                "v1" => received = Some(v),
                _ => {}
            }
        }
    }

    let (Some(timestamp), Some(received)) = (timestamp, received) else {
        warn!("invalid legacy webhook signature format");
        return false;
    };

    let expected = hex::encode(hmac_sha256(key, format!("{timestamp}.").as_bytes(), payload));

    constant_time_compare(&expected, received)
}

/// HMAC-SHA256 over `prefix || payload` with the given key bytes.
fn hmac_sha256(key: &[u8], prefix: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(prefix);
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const KEY_B64: &str = "MfKQ9r8GKYqrTwjUPD8ILPZIo2LaLaSw"; // valid base64, 24 key bytes

    fn verifier() -> WebhookVerifier {
        WebhookVerifier::new(Some(SecretString::from(format!("whsec_{KEY_B64}"))))
    }

    fn sign_svix(payload: &[u8], timestamp: &str, msg_id: &str) -> String {
        let key = BASE64.decode(KEY_B64).unwrap();
        let prefix = if msg_id.is_empty() {
            format!("{timestamp}.")
        } else {
            format!("{msg_id}.{timestamp}.")
        };
        format!(
            "v1,{}",
            BASE64.encode(hmac_sha256(&key, prefix.as_bytes(), payload))
        )
    }

    fn sign_legacy(payload: &[u8], timestamp: &str) -> String {
        let key = BASE64.decode(KEY_B64).unwrap();
        format!(
            "t={timestamp},v1={}",
            hex::encode(hmac_sha256(&key, format!("{timestamp}.").as_bytes(), payload))
        )
    }

    #[test]
    fn test_svix_signature_verifies() {
        let payload = br#"{"type":"email.delivered","data":{}}"#;
        let signature = sign_svix(payload, "1712000000", "");

        assert!(verifier().verify(payload, &signature, "1712000000", ""));
    }

    #[test]
    fn test_svix_signature_with_msg_id_verifies() {
        let payload = br#"{"type":"email.opened","data":{}}"#;
        let signature = sign_svix(payload, "1712000000", "msg_2KWPBgLlAfxdpx2AI54pPJ85f4W");

        assert!(verifier().verify(
            payload,
            &signature,
            "1712000000",
            "msg_2KWPBgLlAfxdpx2AI54pPJ85f4W"
        ));
    }

    #[test]
    fn test_svix_multiple_signatures_any_match() {
        let payload = br#"{"type":"email.delivered"}"#;
        let good = sign_svix(payload, "1712000000", "");
        let header = format!("v1,Zm9yZ2VkZm9yZ2VkZm9yZ2Vk {good} v2,aWdub3JlZA==");

        assert!(verifier().verify(payload, &header, "1712000000", ""));
    }

    #[test]
    fn test_svix_rejects_mutated_payload() {
        let payload = br#"{"type":"email.delivered","data":{}}"#;
        let signature = sign_svix(payload, "1712000000", "");
        let mut tampered = payload.to_vec();
        tampered[0] ^= 0x01;

        assert!(!verifier().verify(&tampered, &signature, "1712000000", ""));
    }

    #[test]
    fn test_svix_rejects_mutated_timestamp() {
        let payload = br#"{"type":"email.delivered","data":{}}"#;
        let signature = sign_svix(payload, "1712000000", "");

        assert!(!verifier().verify(payload, &signature, "1712000001", ""));
    }

    #[test]
    fn test_svix_rejects_mutated_signature() {
        let payload = br#"{"type":"email.delivered","data":{}}"#;
        let mut signature = sign_svix(payload, "1712000000", "");
        // Flip the final base64 character
        let last = signature.pop().unwrap();
        signature.push(if last == 'A' { 'B' } else { 'A' });

        assert!(!verifier().verify(payload, &signature, "1712000000", ""));
    }

    #[test]
    fn test_svix_no_v1_pair_rejected() {
        let payload = b"{}";
        assert!(!verifier().verify(payload, "v2,c29tZXRoaW5n", "1712000000", ""));
    }

    #[test]
    fn test_legacy_signature_verifies() {
        let payload = br#"{"type":"email.bounced"}"#;
        let signature = sign_legacy(payload, "1712000000");

        assert!(verifier().verify(payload, &signature, "", ""));
    }

    #[test]
    fn test_legacy_rejects_mutated_payload() {
        let payload = br#"{"type":"email.bounced"}"#;
        let signature = sign_legacy(payload, "1712000000");
        let mut tampered = payload.to_vec();
        tampered[0] ^= 0x01;

        assert!(!verifier().verify(&tampered, &signature, "", ""));
    }

    #[test]
    fn test_legacy_missing_parts_rejected() {
        let payload = b"{}";
        assert!(!verifier().verify(payload, "t=1712000000", "", ""));
        assert!(!verifier().verify(payload, "v1=deadbeef", "", ""));
        assert!(!verifier().verify(payload, "garbage", "", ""));
        assert!(!verifier().verify(payload, "", "", ""));
    }

    #[test]
    fn test_no_secret_skips_verification() {
        let verifier = WebhookVerifier::new(None);
        assert!(verifier.verify(b"{}", "anything", "0", ""));
        assert!(!verifier.has_secret());
    }

    #[test]
    fn test_secret_without_prefix_accepted() {
        let verifier = WebhookVerifier::new(Some(SecretString::from(KEY_B64)));
        let payload = br#"{"type":"email.clicked"}"#;
        let signature = sign_svix(payload, "1712000000", "");

        assert!(verifier.verify(payload, &signature, "1712000000", ""));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "ab"));
        assert!(constant_time_compare("", ""));
    }
}
