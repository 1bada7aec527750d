use serde::Serialize;

use super::domain::{Application, SectionKind};

/// Completeness diagnostic for an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completeness {
    pub complete: bool,
    /// Missing section names in declaration order.
    pub missing: Vec<&'static str>,
}

/// Report which required sections are still absent.
pub fn check_complete(application: &Application) -> Completeness {
    let missing: Vec<&'static str> = SectionKind::REQUIRED
        .into_iter()
        .filter(|kind| application.section(*kind).is_none())
        .map(SectionKind::field_name)
        .collect();

    Completeness {
        complete: missing.is_empty(),
        missing,
    }
}
