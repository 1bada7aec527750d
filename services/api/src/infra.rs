use merchant_onboarding::config::PhoneLookupConfig;
use merchant_onboarding::validation::{
    CancellationSignal, HttpCarrierLookup, LookupError, RemotePhoneVerifier,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type PhoneVerifier = RemotePhoneVerifier<HttpCarrierLookup>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) phone_verifier: Arc<PhoneVerifier>,
    /// Fires when the server begins shutting down so outbound lookups stop waiting.
    pub(crate) shutdown: CancellationSignal,
}

pub(crate) fn build_phone_verifier(config: &PhoneLookupConfig) -> Result<PhoneVerifier, LookupError> {
    let lookup = HttpCarrierLookup::from_config(config)?;
    Ok(RemotePhoneVerifier::new(lookup))
}

/// Keep the last four digits of a formatted identifier visible.
pub(crate) fn redact(formatted: &str) -> String {
    let digit_count = formatted.chars().filter(char::is_ascii_digit).count();
    let mut seen = 0;
    formatted
        .chars()
        .map(|ch| {
            if !ch.is_ascii_digit() {
                return ch;
            }
            seen += 1;
            if digit_count - seen < 4 {
                ch
            } else {
                '*'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_keeps_last_four_digits() {
        assert_eq!(redact("123-45-6789"), "***-**-6789");
        assert_eq!(redact("12-3456789"), "**-***6789");
        assert_eq!(redact("(212) 555-0199"), "(***) ***-0199");
        assert_eq!(redact("123"), "123");
    }

    #[test]
    fn unconfigured_lookup_builds_local_only_verifier() {
        let verifier = build_phone_verifier(&PhoneLookupConfig::default()).expect("builds");
        assert!(!verifier.is_configured());
    }
}
