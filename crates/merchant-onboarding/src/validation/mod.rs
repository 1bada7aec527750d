//! Format validators for merchant identity documents and phone numbers.
//!
//! Every validator returns a [`VerificationResult`]; failures are values, never `Err`, so callers
//! branch on `is_valid`. The same functions back as-you-type feedback and server-side checks.

pub mod identity;
pub mod phone;
pub mod remote;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub use identity::{format_ein, format_ssn, verify_ein, verify_ssn};
pub use phone::{format_normalized_phone, verify_phone_number};
pub use remote::{
    cancellation_pair, CancellationHandle, CancellationSignal, CarrierLookup, CarrierVerdict,
    HttpCarrierLookup, LookupError, PhoneCheck, RemotePhoneVerifier,
};

static NON_DIGIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9]").expect("static pattern compiles"));

/// Strip everything but ASCII digits. Other Unicode digits are dropped too.
pub fn digits_only(input: &str) -> String {
    NON_DIGIT.replace_all(input, "").into_owned()
}

/// Outcome of a single validator run.
///
/// `normalized` is non-empty only when `is_valid`; `formatted` is always populated on a
/// best-effort basis from the raw input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub is_valid: bool,
    pub normalized: String,
    pub formatted: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<VerificationFailure>,
}

impl VerificationResult {
    pub(crate) fn valid(normalized: String, formatted: String) -> Self {
        Self {
            is_valid: true,
            normalized,
            formatted,
            reason: None,
            failure: None,
        }
    }

    pub(crate) fn invalid(
        failure: VerificationFailure,
        formatted: String,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            is_valid: false,
            normalized: String::new(),
            formatted,
            reason: Some(reason.into()),
            failure: Some(failure),
        }
    }
}

/// Why a value failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationFailure {
    InvalidLength,
    RepeatingDigits,
    ReservedPrefix,
    InvalidAreaNumber,
    InvalidGroupOrSerial,
    InvalidFormat,
    /// The carrier lookup answered that the number is not in service.
    Unconfirmed,
}

impl VerificationFailure {
    pub const fn label(self) -> &'static str {
        match self {
            VerificationFailure::InvalidLength => "invalid_length",
            VerificationFailure::RepeatingDigits => "repeating_digits",
            VerificationFailure::ReservedPrefix => "reserved_prefix",
            VerificationFailure::InvalidAreaNumber => "invalid_area_number",
            VerificationFailure::InvalidGroupOrSerial => "invalid_group_or_serial",
            VerificationFailure::InvalidFormat => "invalid_format",
            VerificationFailure::Unconfirmed => "unconfirmed",
        }
    }
}

fn all_same_digit(digits: &str) -> bool {
    let mut bytes = digits.bytes();
    match bytes.next() {
        Some(first) => bytes.all(|byte| byte == first),
        None => false,
    }
}
