use serde::Serialize;

use super::domain::{Application, ApplicationId, Section};
use crate::validation::{verify_ein, verify_phone_number, verify_ssn, VerificationResult};

/// Validator results for the identity and contact fields found in an application's sections.
///
/// Fields the merchant has not filled in yet are omitted rather than reported as invalid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityScreening {
    pub application_id: ApplicationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ein: Option<VerificationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssn: Option<VerificationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_phone: Option<VerificationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_phone: Option<VerificationResult>,
    pub clear: bool,
}

impl IdentityScreening {
    pub fn is_clear(&self) -> bool {
        self.clear
    }

    fn results(&self) -> impl Iterator<Item = &VerificationResult> {
        [&self.ein, &self.ssn, &self.business_phone, &self.owner_phone]
            .into_iter()
            .flatten()
    }

    /// Reasons for every failing field, keyed by field label.
    pub fn failures(&self) -> Vec<(&'static str, &str)> {
        let labelled = [
            ("ein", &self.ein),
            ("ssn", &self.ssn),
            ("businessPhone", &self.business_phone),
            ("ownerPhone", &self.owner_phone),
        ];
        labelled
            .into_iter()
            .filter_map(|(label, result)| {
                result
                    .as_ref()
                    .filter(|result| !result.is_valid)
                    .map(|result| (label, result.reason.as_deref().unwrap_or_default()))
            })
            .collect()
    }
}

fn field<'a>(section: Option<&'a Section>, name: &str) -> Option<&'a str> {
    section.and_then(|section| section.text(name))
}

/// Run the format validators over `businessInfo.ein`, `ownerInfo.ssn`, `businessInfo.phone`, and
/// `ownerInfo.cellPhone`.
pub fn screen_identity(application: &Application) -> IdentityScreening {
    let business = application.business_info.as_ref();
    let owner = application.owner_info.as_ref();

    let mut screening = IdentityScreening {
        application_id: application.id.clone(),
        ein: field(business, "ein").map(verify_ein),
        ssn: field(owner, "ssn").map(verify_ssn),
        business_phone: field(business, "phone").map(verify_phone_number),
        owner_phone: field(owner, "cellPhone").map(verify_phone_number),
        clear: false,
    };
    let clear = screening.results().all(|result| result.is_valid);
    screening.clear = clear;
    screening
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::domain::UserId;
    use chrono::Utc;
    use serde_json::json;

    fn section(value: serde_json::Value) -> Option<Section> {
        value.as_object().cloned().map(Section::from)
    }

    #[test]
    fn empty_application_is_clear() {
        let application = Application::draft(UserId("user-1".into()), Utc::now());
        let screening = screen_identity(&application);
        assert!(screening.is_clear());
        assert!(screening.ein.is_none());
        assert!(screening.failures().is_empty());
    }

    #[test]
    fn reports_each_present_field() {
        let mut application = Application::draft(UserId("user-1".into()), Utc::now());
        application.business_info = section(json!({
            "businessName": "Corner Deli",
            "ein": "00-1234567",
            "phone": "1 (212) 555-0199"
        }));
        application.owner_info = section(json!({
            "fullName": "Dana Ruiz",
            "ssn": "123-45-6789",
            "cellPhone": "123-455-0199"
        }));

        let screening = screen_identity(&application);

        assert!(!screening.is_clear());
        assert!(screening.ssn.as_ref().is_some_and(|result| result.is_valid));
        assert_eq!(
            screening
                .business_phone
                .as_ref()
                .map(|result| result.formatted.as_str()),
            Some("(212) 555-0199")
        );
        let failing: Vec<&str> = screening
            .failures()
            .into_iter()
            .map(|(label, _)| label)
            .collect();
        assert_eq!(failing, vec!["ein", "ownerPhone"]);
    }

    #[test]
    fn non_ascii_digits_in_stored_sections_are_reported_invalid() {
        let mut application = Application::draft(UserId("user-1".into()), Utc::now());
        application.business_info = section(json!({
            "ein": "１２-３４５６７８９",
            "phone": "2١2555٠١99"
        }));
        application.owner_info = section(json!({ "ssn": "١٢٣-٤٥-٦٧٨٩" }));

        let screening = screen_identity(&application);

        assert!(!screening.is_clear());
        let failing: Vec<&str> = screening
            .failures()
            .into_iter()
            .map(|(label, _)| label)
            .collect();
        assert_eq!(failing, vec!["ein", "ssn", "businessPhone"]);
    }
}
