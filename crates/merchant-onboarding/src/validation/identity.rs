use super::{all_same_digit, digits_only, VerificationFailure, VerificationResult};

const ID_DIGITS: usize = 9;

fn leading_digits(value: &str) -> String {
    let mut digits = digits_only(value);
    digits.truncate(ID_DIGITS);
    digits
}

/// Group up to nine digits as `XX-XXXXXXX`; two digits or fewer are returned bare.
pub fn format_ein(value: &str) -> String {
    let digits = leading_digits(value);
    if digits.len() <= 2 {
        return digits;
    }
    format!("{}-{}", &digits[..2], &digits[2..])
}

/// Group up to nine digits as `XXX-XX-XXXX`, progressively as digits arrive.
pub fn format_ssn(value: &str) -> String {
    let digits = leading_digits(value);
    match digits.len() {
        0..=3 => digits,
        4..=5 => format!("{}-{}", &digits[..3], &digits[3..]),
        _ => format!("{}-{}-{}", &digits[..3], &digits[3..5], &digits[5..]),
    }
}

/// Validate an Employer Identification Number.
pub fn verify_ein(value: &str) -> VerificationResult {
    if digits_only(value).len() != ID_DIGITS {
        return VerificationResult::invalid(
            VerificationFailure::InvalidLength,
            format_ein(value),
            "Enter a 9-digit EIN (XX-XXXXXXX).",
        );
    }

    let normalized = leading_digits(value);
    let formatted = format_ein(&normalized);

    if all_same_digit(&normalized) {
        return VerificationResult::invalid(
            VerificationFailure::RepeatingDigits,
            formatted,
            "Enter a working EIN, not repeating digits.",
        );
    }

    if normalized.starts_with("00") {
        return VerificationResult::invalid(
            VerificationFailure::ReservedPrefix,
            formatted,
            "EIN cannot start with 00.",
        );
    }

    VerificationResult::valid(normalized, formatted)
}

/// Validate a Social Security Number against the SSA area/group/serial rules.
pub fn verify_ssn(value: &str) -> VerificationResult {
    if digits_only(value).len() != ID_DIGITS {
        return VerificationResult::invalid(
            VerificationFailure::InvalidLength,
            format_ssn(value),
            "Enter a 9-digit SSN (XXX-XX-XXXX).",
        );
    }

    let normalized = leading_digits(value);
    let formatted = format_ssn(&normalized);

    if all_same_digit(&normalized) {
        return VerificationResult::invalid(
            VerificationFailure::RepeatingDigits,
            formatted,
            "Enter a real SSN, not repeating digits.",
        );
    }

    let (area, rest) = normalized.split_at(3);
    let (group, serial) = rest.split_at(2);

    // Areas 900-999 are reserved for ITINs.
    if area == "000" || area == "666" || area.starts_with('9') {
        return VerificationResult::invalid(
            VerificationFailure::InvalidAreaNumber,
            formatted,
            "SSN area number is invalid.",
        );
    }

    if group == "00" || serial == "0000" {
        return VerificationResult::invalid(
            VerificationFailure::InvalidGroupOrSerial,
            formatted,
            "SSN group/serial numbers are invalid.",
        );
    }

    VerificationResult::valid(normalized, formatted)
}
