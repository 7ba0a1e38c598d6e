//! HMAC-SHA256 over `"<timestamp>.<body>"`, rendered as lowercase hex.
//!
//! `body` is the exact JSON string sent on the wire and `timestamp` is Unix
//! seconds, the same value sent in the timestamp header.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::WebhookError;

type HmacSha256 = Hmac<Sha256>;

fn mac_for(secret: &str, timestamp: u64, body: &str) -> Result<HmacSha256, WebhookError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| WebhookError::InvalidKey)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body.as_bytes());
    Ok(mac)
}

pub fn sign(secret: &str, timestamp: u64, body: &str) -> Result<String, WebhookError> {
    let mac = mac_for(secret, timestamp, body)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Receiver-side check. Constant-time comparison.
pub fn verify(secret: &str, timestamp: u64, body: &str, signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };
    match mac_for(secret, timestamp, body) {
        Ok(mac) => mac.verify_slice(&expected).is_ok(),
        Err(_) => false,
    }
}

/// Current Unix time in whole seconds.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_known_vector() {
        // HMAC-SHA256("key", "1700000000.{}")
        let sig = sign("key", 1_700_000_000, "{}").unwrap();
        let mut mac = HmacSha256::new_from_slice(b"key").unwrap();
        mac.update(b"1700000000.{}");
        assert_eq!(sig, hex::encode(mac.finalize().into_bytes()));
    }

    #[test]
    fn signature_is_lowercase_hex() {
        let sig = sign("secret", 1, r#"{"a":1}"#).unwrap();
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn verify_accepts_own_signature() {
        let body = r#"{"taskId":"t"}"#;
        let sig = sign("secret", 42, body).unwrap();
        assert!(verify("secret", 42, body, &sig));
    }

    #[test]
    fn verify_rejects_tampering() {
        let body = r#"{"taskId":"t"}"#;
        let sig = sign("secret", 42, body).unwrap();

        assert!(!verify("other", 42, body, &sig));
        assert!(!verify("secret", 43, body, &sig));
        assert!(!verify("secret", 42, r#"{"taskId":"u"}"#, &sig));
        assert!(!verify("secret", 42, body, "not-hex"));
    }

    #[test]
    fn empty_secret_still_signs() {
        assert!(sign("", 0, "").is_ok());
    }

    #[test]
    fn unix_now_is_seconds() {
        // Seconds, not milliseconds: well below year 3000 in seconds.
        let now = unix_now();
        assert!(now > 1_600_000_000);
        assert!(now < 32_503_680_000);
    }
}
