//! Checkout signature checks.
//!
//! The gateway signs `"{order_id}|{payment_id}"` with the merchant key secret
//! using HMAC-SHA256 and hands the hex digest to the browser, which posts it
//! back on verification.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn mac_for(secret: &str, order_id: &str, payment_id: &str) -> HmacSha256 {
    // HMAC accepts keys of any length, so construction cannot fail.
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC takes keys of any size"));
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    mac
}

/// Lowercase hex HMAC-SHA256 of `"{order_id}|{payment_id}"`.
#[must_use]
pub fn payment_signature(secret: &str, order_id: &str, payment_id: &str) -> String {
    hex::encode(mac_for(secret, order_id, payment_id).finalize().into_bytes())
}

/// Constant-time check of a hex signature. Malformed hex never matches.
#[must_use]
pub fn verify_payment_signature(
    secret: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> bool {
    let Ok(given) = hex::decode(signature.trim()) else {
        return false;
    };
    mac_for(secret, order_id, payment_id)
        .verify_slice(&given)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn signature_is_hex_sha256() {
        let sig = payment_signature("key_secret", "order_abc", "pay_123");
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn matching_signature_verifies() {
        let sig = payment_signature("key_secret", "order_abc", "pay_123");
        assert!(verify_payment_signature("key_secret", "order_abc", "pay_123", &sig));
        assert!(verify_payment_signature(
            "key_secret",
            "order_abc",
            "pay_123",
            &sig.to_uppercase()
        ));
    }

    #[rstest]
    #[case::other_secret("other_secret", "order_abc", "pay_123")]
    #[case::other_order("key_secret", "order_abd", "pay_123")]
    #[case::other_payment("key_secret", "order_abc", "pay_124")]
    fn tampered_inputs_fail(
        #[case] secret: &str,
        #[case] order_id: &str,
        #[case] payment_id: &str,
    ) {
        let sig = payment_signature("key_secret", "order_abc", "pay_123");
        assert!(!verify_payment_signature(secret, order_id, payment_id, &sig));
    }

    #[rstest]
    #[case::not_hex("zz")]
    #[case::empty("")]
    #[case::truncated("5f3a")]
    fn malformed_signatures_fail(#[case] signature: &str) {
        assert!(!verify_payment_signature("key_secret", "order_abc", "pay_123", signature));
    }

    #[test]
    fn separator_is_part_of_the_message() {
        assert_ne!(
            payment_signature("s", "ab", "c"),
            payment_signature("s", "a", "bc")
        );
    }
}
