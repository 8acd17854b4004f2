use md5::{Digest, Md5};
use rust_decimal::Decimal;

/// Formats an amount the way the gateway expects it inside hash input:
/// exactly two decimal places, no grouping separators. Any other rendering
/// breaks signature verification on both sides.
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}

fn md5_upper_hex(input: &str) -> String {
    let digest = Md5::digest(input.as_bytes());
    hex::encode(digest).to_uppercase()
}

/// Hash sent to the gateway when initiating a checkout.
///
/// Field order is fixed by the protocol: merchant id, order reference,
/// amount (two decimal places), currency, then the uppercased MD5 of the
/// merchant secret.
pub fn merchant_hash(
    merchant_id: &str,
    merchant_secret: &str,
    order_reference: &str,
    amount: Decimal,
    currency: &str,
) -> String {
    let secret_hash = md5_upper_hex(merchant_secret);
    md5_upper_hex(&format!(
        "{}{}{}{}{}",
        merchant_id,
        order_reference,
        format_amount(amount),
        currency,
        secret_hash
    ))
}

/// Expected signature of a webhook notification.
///
/// `amount` and `status_code` are the literal strings the gateway sent;
/// re-formatting them locally would diverge from what was signed.
pub fn notify_signature(
    merchant_id: &str,
    merchant_secret: &str,
    order_reference: &str,
    amount: &str,
    currency: &str,
    status_code: &str,
) -> String {
    let secret_hash = md5_upper_hex(merchant_secret);
    md5_upper_hex(&format!(
        "{}{}{}{}{}{}",
        merchant_id, order_reference, amount, currency, status_code, secret_hash
    ))
}

/// Case-insensitive comparison without an early exit on the first
/// mismatching byte, so comparison time does not depend on where the
/// candidate diverges.
pub fn verify_signature(expected: &str, candidate: &str) -> bool {
    let expected = expected.to_uppercase();
    let candidate = candidate.to_uppercase();
    if expected.len() != candidate.len() {
        return false;
    }
    expected
        .bytes()
        .zip(candidate.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn format_amount_always_two_decimal_places() {
        assert_eq!(format_amount(Decimal::from(100)), "100.00");
        assert_eq!(format_amount(Decimal::from_str("99.9").unwrap()), "99.90");
        assert_eq!(format_amount(Decimal::from_str("30.005").unwrap()), "30.00");
        assert_eq!(format_amount(Decimal::from_str("1234567.5").unwrap()), "1234567.50");
    }

    #[test]
    fn merchant_hash_is_deterministic() {
        let a = merchant_hash("M1209", "secret", "DON_1", Decimal::from(100), "LKR");
        let b = merchant_hash("M1209", "secret", "DON_1", Decimal::from(100), "LKR");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn merchant_hash_changes_with_any_field() {
        let base = merchant_hash("M1209", "secret", "DON_1", Decimal::from(100), "LKR");
        assert_ne!(base, merchant_hash("M1210", "secret", "DON_1", Decimal::from(100), "LKR"));
        assert_ne!(base, merchant_hash("M1209", "other", "DON_1", Decimal::from(100), "LKR"));
        assert_ne!(base, merchant_hash("M1209", "secret", "DON_2", Decimal::from(100), "LKR"));
        assert_ne!(base, merchant_hash("M1209", "secret", "DON_1", Decimal::from(101), "LKR"));
        assert_ne!(base, merchant_hash("M1209", "secret", "DON_1", Decimal::from(100), "USD"));
    }

    #[test]
    fn notify_signature_round_trips_through_verify() {
        let sig = notify_signature("M1209", "secret", "DON_1", "100.00", "LKR", "2");
        assert!(verify_signature(&sig, &sig));
        assert!(verify_signature(&sig, &sig.to_lowercase()));
    }

    #[test]
    fn verify_rejects_single_character_tamper() {
        let sig = notify_signature("M1209", "secret", "DON_1", "100.00", "LKR", "2");
        for i in 0..sig.len() {
            let mut tampered: Vec<u8> = sig.bytes().collect();
            tampered[i] = if tampered[i] == b'0' { b'1' } else { b'0' };
            let tampered = String::from_utf8(tampered).unwrap();
            if tampered != sig {
                assert!(!verify_signature(&sig, &tampered), "tamper at {i} accepted");
            }
        }
    }

    #[test]
    fn verify_rejects_length_mismatch() {
        let sig = notify_signature("M1209", "secret", "DON_1", "100.00", "LKR", "2");
        assert!(!verify_signature(&sig, &sig[..31]));
        assert!(!verify_signature(&sig, ""));
    }

    #[test]
    fn amount_formatting_is_part_of_the_signature() {
        // "100.00" and "100.0" must not verify against each other.
        let canonical = notify_signature("M1209", "secret", "DON_1", "100.00", "LKR", "2");
        let sloppy = notify_signature("M1209", "secret", "DON_1", "100.0", "LKR", "2");
        assert_ne!(canonical, sloppy);
    }
}
