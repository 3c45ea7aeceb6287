//! Deterministic card-number derivation
//!
//! 16 digits: a constant 7-digit issuer prefix, 8 digits from a linear
//! congruential recurrence seeded by the account number plus the refresh
//! generation, and a Luhn check digit. Pure functions throughout; no clock,
//! no randomness.

use chrono::{DateTime, Datelike, Utc};

/// Constant issuer identifier prefixed to every card number.
pub const ISSUER_PREFIX: &str = "4532015";

/// Seed used when the account number contains no digits.
const FALLBACK_SEED: i64 = 1234;

/// Derive the card number for `account_number` at `generation`.
///
/// Same inputs always yield the same 16-digit, Luhn-valid number; bumping
/// the generation reseeds the recurrence and produces a fresh number.
pub fn derive_card_number(account_number: &str, generation: i64) -> String {
    let mut seed = extract_numeric(account_number);
    if seed == 0 {
        seed = FALLBACK_SEED;
    }
    seed += generation;

    let mut number = String::with_capacity(16);
    number.push_str(ISSUER_PREFIX);
    push_middle_digits(&mut number, seed);

    let check = luhn_check_digit(&number);
    number.push(char::from_digit(check, 10).unwrap_or('0'));
    number
}

/// Concatenated digits of `s` as an integer; 0 if there are none (or the
/// digits do not fit an i64).
fn extract_numeric(s: &str) -> i64 {
    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return 0;
    }
    digits.parse().unwrap_or(0)
}

/// Eight digits from the recurrence `state = (state*9301 + 49297) % 233280`,
/// each mapped to `state * 10 / 233280`.
fn push_middle_digits(out: &mut String, seed: i64) {
    let mut state = seed;
    for _ in 0..8 {
        state = (state * 9301 + 49297) % 233_280;
        let digit = (state * 10 / 233_280) as u32;
        out.push(char::from_digit(digit, 10).unwrap_or('0'));
    }
}

/// Luhn check digit for `payload`: double every second digit from the
/// rightmost position (the rightmost included, since the check digit will
/// shift it), subtract 9 from doubles above 9, sum, take the complement.
pub fn luhn_check_digit(payload: &str) -> u32 {
    let mut sum = 0;
    let mut double = true;
    for ch in payload.chars().rev() {
        let mut digit = ch.to_digit(10).unwrap_or(0);
        if double {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
        double = !double;
    }
    (10 - sum % 10) % 10
}

/// Standard Luhn validation of a full number (check digit included).
pub fn is_luhn_valid(number: &str) -> bool {
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let mut sum = 0;
    let mut double = false;
    for ch in number.chars().rev() {
        let mut digit = ch.to_digit(10).unwrap_or(0);
        if double {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
        double = !double;
    }
    sum % 10 == 0
}

/// Expiry label for a card created at `now`: creation month, year + 3,
/// rendered `MM/YY`.
pub fn expiry_label(now: DateTime<Utc>) -> String {
    format!("{:02}/{:02}", now.month(), (now.year() + 3) % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn derivation_is_deterministic() {
        let a = derive_card_number("0042317896", 0);
        let b = derive_card_number("0042317896", 0);
        assert_eq!(a, b);
    }

    #[test]
    fn known_vectors() {
        assert_eq!(derive_card_number("0042317896", 0), "4532015671566062");
        assert_eq!(derive_card_number("0042317896", 1), "4532015669757541");
        assert_eq!(derive_card_number("ACCT-12345", 3), "4532015557813364");
    }

    #[test]
    fn sixteen_digits_and_luhn_valid() {
        for generation in 0..20 {
            let number = derive_card_number("8891002744", generation);
            assert_eq!(number.len(), 16);
            assert!(number.starts_with(ISSUER_PREFIX));
            assert!(is_luhn_valid(&number), "{number} failed Luhn");
        }
    }

    #[test]
    fn generations_produce_distinct_numbers() {
        let g0 = derive_card_number("1234567890", 0);
        let g1 = derive_card_number("1234567890", 1);
        assert_ne!(g0, g1);
    }

    #[test]
    fn no_digits_falls_back_to_fixed_seed() {
        let fallback = derive_card_number("no-digits-here", 0);
        assert_eq!(fallback, "4532015422041274");
        // An all-zero account number hits the same fallback.
        assert_eq!(derive_card_number("0000000000", 0), fallback);
    }

    #[test]
    fn luhn_rejects_corruption() {
        let number = derive_card_number("0042317896", 0);
        let mut corrupted = number.into_bytes();
        corrupted[10] = if corrupted[10] == b'9' { b'0' } else { corrupted[10] + 1 };
        assert!(!is_luhn_valid(std::str::from_utf8(&corrupted).unwrap()));
        assert!(!is_luhn_valid(""));
        assert!(!is_luhn_valid("4532abc"));
    }

    #[test]
    fn expiry_is_month_slash_year_plus_three() {
        let now = Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap();
        assert_eq!(expiry_label(now), "08/29");

        let december = Utc.with_ymd_and_hms(2099, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(expiry_label(december), "12/02");
    }
}
