use crate::infra::{build_phone_verifier, redact};
use clap::Args;
use merchant_onboarding::config::AppConfig;
use merchant_onboarding::error::AppError;
use merchant_onboarding::onboarding::{
    check_complete, screen_identity, ApplicationError, ApplicationPatch, ApplicationStore,
    InMemoryApplicationRepository, Section, SectionKind, SubmissionReceipt, SubmissionRequest,
    UserId,
};
use merchant_onboarding::validation::{
    verify_ein, verify_ssn, CancellationSignal, VerificationResult,
};
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Merchant user id the walkthrough runs as
    #[arg(long, default_value = "demo-merchant")]
    pub(crate) user_id: String,
    /// Skip the identity screening summary at the end of the walkthrough
    #[arg(long)]
    pub(crate) skip_screening: bool,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            user_id: "demo-merchant".to_string(),
            skip_screening: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum VerifyTarget {
    Ein(String),
    Ssn(String),
    Phone { value: String, remote: bool },
}

pub(crate) async fn run_verification(target: VerifyTarget) -> Result<(), AppError> {
    match target {
        VerifyTarget::Ein(value) => render_verification("EIN", &verify_ein(&value)),
        VerifyTarget::Ssn(value) => render_verification("SSN", &verify_ssn(&value)),
        VerifyTarget::Phone { value, remote } => {
            let config = if remote {
                AppConfig::load()?.phone_lookup
            } else {
                Default::default()
            };
            let verifier = build_phone_verifier(&config)?;
            if remote && !verifier.is_configured() {
                println!("Carrier lookup is not configured; running the local check only.");
            }

            let check = verifier.verify(&value, &CancellationSignal::never()).await;
            render_verification("Phone", &check.verification);
            if check.remote_checked {
                println!("  Carrier lookup: consulted");
            }
            if let Some(notice) = &check.notice {
                println!("  Note: {}", notice);
            }
        }
    }

    Ok(())
}

fn render_verification(label: &str, result: &VerificationResult) {
    if result.is_valid {
        println!("{} {} is valid", label, result.formatted);
        println!("  Normalized: {}", result.normalized);
    } else {
        println!(
            "{} {} is invalid: {}",
            label,
            display_or_blank(&result.formatted),
            result.reason.as_deref().unwrap_or("unknown reason")
        );
        if let Some(failure) = result.failure {
            println!("  Failure: {}", failure.label());
        }
    }
}

fn display_or_blank(formatted: &str) -> &str {
    if formatted.is_empty() {
        "(blank)"
    } else {
        formatted
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        user_id,
        skip_screening,
    } = args;

    println!("Merchant onboarding demo (identifiers redacted)");
    let repository = Arc::new(InMemoryApplicationRepository::default());
    let store = ApplicationStore::new(repository);
    let user = UserId(user_id);

    let draft = store.create_or_get_draft(&user)?;
    println!(
        "- Draft {} created for {} -> status {}",
        draft.id, draft.user_id, draft.status
    );

    let resumed = store.create_or_get_draft(&user)?;
    println!(
        "  Returning visit resumes the same draft: {}",
        resumed.id == draft.id
    );

    let partial = ApplicationPatch::default()
        .with_section(SectionKind::BusinessInfo, Some(demo_business_info()))
        .with_section(SectionKind::OwnerInfo, Some(demo_owner_info()))
        .with_section(SectionKind::BusinessAddress, Some(demo_business_address()));
    let updated = store.update_sections(&draft.id, partial)?;
    let completeness = check_complete(&updated);
    println!(
        "- Saved business, owner, and address sections; missing: {}",
        completeness.missing.join(", ")
    );

    let early = store.submit(&draft.id, demo_submission(true));
    report_rejection("Early submission", early)?;

    let remaining = ApplicationPatch::default()
        .with_section(SectionKind::BankAccount, Some(demo_bank_account()))
        .with_section(SectionKind::ProcessingDetails, Some(demo_processing_details()));
    let completed = store.update_sections(&draft.id, remaining)?;
    println!(
        "- Saved bank and processing sections; complete: {}",
        check_complete(&completed).complete
    );

    let unsigned = store.submit(&draft.id, demo_submission(false));
    report_rejection("Submission without terms", unsigned)?;

    let submitted = store.submit(&draft.id, demo_submission(true))?;
    match SubmissionReceipt::for_application(&submitted) {
        Some(receipt) => println!(
            "- {}: {} -> {} at {}",
            receipt.message,
            receipt.id,
            receipt.status,
            receipt.submitted_at.to_rfc3339()
        ),
        None => println!("- Submission stored without a timestamp"),
    }

    let late_edit = store.update_sections(
        &draft.id,
        ApplicationPatch::default().with_section(SectionKind::BankAccount, None),
    );
    report_rejection("Edit after submission", late_edit)?;

    if skip_screening {
        return Ok(());
    }

    let screening = screen_identity(&submitted);
    println!("\nIdentity screening");
    let fields = [
        ("EIN", &screening.ein),
        ("SSN", &screening.ssn),
        ("Business phone", &screening.business_phone),
        ("Owner cell", &screening.owner_phone),
    ];
    for (label, result) in fields {
        match result {
            Some(result) if result.is_valid => {
                println!("  - {}: {} ok", label, redact(&result.formatted))
            }
            Some(result) => println!(
                "  - {}: {} ({})",
                label,
                redact(&result.formatted),
                result.reason.as_deref().unwrap_or("invalid")
            ),
            None => println!("  - {}: not provided", label),
        }
    }
    println!(
        "  Overall: {}",
        if screening.is_clear() {
            "clear"
        } else {
            "needs review"
        }
    );

    Ok(())
}

/// Print an expected store rejection; anything other than a rejection is a demo failure.
fn report_rejection<T>(
    step: &str,
    outcome: Result<T, ApplicationError>,
) -> Result<(), AppError> {
    match outcome {
        Ok(_) => {
            println!("  {} unexpectedly succeeded", step);
            Ok(())
        }
        Err(ApplicationError::Repository(err)) => Err(ApplicationError::Repository(err).into()),
        Err(ApplicationError::ApplicationIncomplete { missing }) => {
            println!("  {} rejected: incomplete ({})", step, missing.join(", "));
            Ok(())
        }
        Err(err) => {
            println!("  {} rejected: {}", step, err);
            Ok(())
        }
    }
}

fn demo_submission(terms_accepted: bool) -> SubmissionRequest {
    SubmissionRequest {
        electronic_signature: Some("Priya Natarajan".to_string()),
        terms_accepted,
    }
}

fn section(fields: &[(&str, &str)]) -> Section {
    let map: Map<String, Value> = fields
        .iter()
        .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
        .collect();
    Section::from(map)
}

fn demo_business_info() -> Section {
    section(&[
        ("businessName", "Lantern Street Bakery LLC"),
        ("dba", "Lantern Bakery"),
        ("ein", "47-2953106"),
        ("phone", "(503) 555-0148"),
        ("businessType", "llc"),
    ])
}

fn demo_owner_info() -> Section {
    section(&[
        ("fullName", "Priya Natarajan"),
        ("title", "Owner"),
        ("ssn", "512-38-7746"),
        ("cellPhone", "1-971-555-0163"),
        ("email", "priya@lanternbakery.example"),
    ])
}

fn demo_business_address() -> Section {
    section(&[
        ("physicalAddress", "2210 SE Division St"),
        ("city", "Portland"),
        ("state", "OR"),
        ("zip", "97202"),
    ])
}

fn demo_bank_account() -> Section {
    section(&[
        ("bankName", "Cascade Community Bank"),
        ("routingNumber", "123006800"),
        ("accountType", "checking"),
    ])
}

fn demo_processing_details() -> Section {
    section(&[
        ("monthlyVolume", "42000"),
        ("averageTicketSize", "18"),
        ("cardPresentPercentage", "85"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use merchant_onboarding::onboarding::RepositoryError;

    #[test]
    fn demo_walkthrough_runs_to_completion() {
        run_demo(DemoArgs::default()).expect("demo completes");
    }

    #[test]
    fn demo_sections_pass_identity_screening() {
        let store = ApplicationStore::new(Arc::new(InMemoryApplicationRepository::default()));
        let draft = store
            .create_or_get_draft(&UserId("demo".to_string()))
            .expect("draft");
        let application = store
            .update_sections(
                &draft.id,
                ApplicationPatch::default()
                    .with_section(SectionKind::BusinessInfo, Some(demo_business_info()))
                    .with_section(SectionKind::OwnerInfo, Some(demo_owner_info())),
            )
            .expect("update");

        let screening = screen_identity(&application);
        assert!(screening.is_clear(), "failures: {:?}", screening.failures());
        assert!(screening.owner_phone.is_some());
    }

    #[test]
    fn rejections_are_reported_but_outages_propagate() {
        assert!(report_rejection::<()>("step", Err(ApplicationError::TermsNotAccepted)).is_ok());
        assert!(report_rejection::<()>(
            "step",
            Err(ApplicationError::Repository(
                RepositoryError::Unavailable("offline".to_string())
            ))
        )
        .is_err());
    }

    #[tokio::test]
    async fn local_verification_commands_succeed() {
        run_verification(VerifyTarget::Ein("12-3456789".to_string()))
            .await
            .expect("ein check");
        run_verification(VerifyTarget::Phone {
            value: "555-0100".to_string(),
            remote: false,
        })
        .await
        .expect("phone check");
    }
}
