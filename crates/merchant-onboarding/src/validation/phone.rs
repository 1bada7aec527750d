use once_cell::sync::Lazy;
use regex::Regex;

use super::{digits_only, VerificationFailure, VerificationResult};

/// NANP: area code and exchange both start with 2-9.
static NANP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[2-9][0-9]{2}[2-9][0-9]{6}$").expect("static pattern compiles"));

/// Render ten digits as `(AAA) PPP-LLLL`; anything else is returned untouched.
pub fn format_normalized_phone(normalized: &str) -> String {
    if normalized.len() != 10 || !normalized.bytes().all(|byte| byte.is_ascii_digit()) {
        return normalized.to_string();
    }
    format!(
        "({}) {}-{}",
        &normalized[..3],
        &normalized[3..6],
        &normalized[6..]
    )
}

/// Validate a North American phone number, tolerating a leading country code `1`.
pub fn verify_phone_number(input: &str) -> VerificationResult {
    let trimmed = input.trim();
    let digits = digits_only(trimmed);
    let national = match digits.strip_prefix('1') {
        Some(rest) if digits.len() == 11 => rest,
        _ => digits.as_str(),
    };

    if NANP.is_match(national) {
        return VerificationResult::valid(national.to_string(), format_normalized_phone(national));
    }

    VerificationResult::invalid(
        VerificationFailure::InvalidFormat,
        trimmed.to_string(),
        "Enter a valid 10-digit phone number.",
    )
}
