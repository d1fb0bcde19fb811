//! # Requirement Text Normalization
//!
//! Builds the canonical text representation of a [`Requirement`] that is
//! fed to the embedding generator. Field order is fixed:
//!
//! ```text
//! [<official code>]
//! Path: <domain path>        (or `Chapter: <chapter>` when no path resolves)
//! <title>
//! <body>
//! Domain: <domain label>
//! Sub-domain: <sub-domain label>
//! Tags: <tag>, <tag>, ...
//! Risk level: <risk level>
//! Obligation: <obligation>
//! ```
//!
//! Blank or missing fields are omitted entirely. The output is a pure
//! function of the record, so an unchanged requirement always re-embeds to
//! the same vector.

use crate::model::Requirement;

/// Produce the canonical embedding input for a requirement.
pub fn normalize_requirement(req: &Requirement) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(9);

    if let Some(code) = non_blank(&req.official_code) {
        parts.push(format!("[{code}]"));
    }

    match (
        req.domain_path.as_deref().and_then(non_blank),
        req.chapter.as_deref().and_then(non_blank),
    ) {
        (Some(path), _) => parts.push(format!("Path: {path}")),
        (None, Some(chapter)) => parts.push(format!("Chapter: {chapter}")),
        (None, None) => {}
    }

    if let Some(title) = non_blank(&req.title) {
        parts.push(title.to_string());
    }
    if let Some(body) = non_blank(&req.body) {
        parts.push(body.to_string());
    }
    if let Some(domain) = req.domain_label.as_deref().and_then(non_blank) {
        parts.push(format!("Domain: {domain}"));
    }
    if let Some(sub) = req.subdomain_label.as_deref().and_then(non_blank) {
        parts.push(format!("Sub-domain: {sub}"));
    }

    let tags: Vec<&str> = req.tags.iter().filter_map(|t| non_blank(t)).collect();
    if !tags.is_empty() {
        parts.push(format!("Tags: {}", tags.join(", ")));
    }

    if let Some(risk) = req.risk_level {
        parts.push(format!("Risk level: {risk}"));
    }
    if let Some(obligation) = req.obligation {
        parts.push(format!("Obligation: {obligation}"));
    }

    parts.join("\n")
}

fn non_blank(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::FrameworkId;
    use crate::taxonomy::{ComplianceObligation, RiskLevel};
    use proptest::prelude::*;

    fn full() -> Requirement {
        let mut r = Requirement::new(
            FrameworkId::new(),
            "A.5.1",
            "Policies for information security",
            "A set of policies shall be defined.",
        )
        .with_domain("Organizational controls")
        .with_tags(["policy", "governance"]);
        r.domain_path = Some("Organizational > Policies".into());
        r.chapter = Some("Chapter 5".into());
        r.subdomain_label = Some("Policies".into());
        r.risk_level = Some(RiskLevel::High);
        r.obligation = Some(ComplianceObligation::Mandatory);
        r
    }

    #[test]
    fn full_record_in_fixed_order() {
        let text = normalize_requirement(&full());
        assert_eq!(
            text,
            "[A.5.1]\n\
             Path: Organizational > Policies\n\
             Policies for information security\n\
             A set of policies shall be defined.\n\
             Domain: Organizational controls\n\
             Sub-domain: Policies\n\
             Tags: policy, governance\n\
             Risk level: high\n\
             Obligation: mandatory"
        );
    }

    #[test]
    fn chapter_used_when_path_blank() {
        let mut r = full();
        r.domain_path = Some("  ".into());
        let text = normalize_requirement(&r);
        assert!(text.contains("\nChapter: Chapter 5\n"));
        assert!(!text.contains("Path:"));
    }

    #[test]
    fn missing_fields_are_skipped() {
        let r = Requirement::new(FrameworkId::new(), "", "Only a title", "");
        assert_eq!(normalize_requirement(&r), "Only a title");
    }

    #[test]
    fn blank_tags_are_dropped() {
        let r = Requirement::new(FrameworkId::new(), "X", "T", "B").with_tags(["", " "]);
        assert_eq!(normalize_requirement(&r), "[X]\nT\nB");
    }

    proptest! {
        #[test]
        fn normalization_is_deterministic(
            code in "[A-Z]\\.[0-9]{1,2}",
            title in "[a-zA-Z ]{0,40}",
            body in "[a-zA-Z ]{0,80}",
            tags in proptest::collection::vec("[a-z]{0,8}", 0..4),
        ) {
            let r = Requirement::new(FrameworkId::new(), code, title, body).with_tags(tags);
            let once = normalize_requirement(&r);
            let twice = normalize_requirement(&r.clone());
            prop_assert_eq!(&once, &twice);
        }
    }
}
