//! Per-section risk tags

use shartnoma_domain::{ComplianceIssue, Section, Severity, TaggedSection};

/// Attach to every section the highest severity of the issues pointing at it
///
/// Issue references whose index does not match the section list, or whose label
/// disagrees with the section at that index, are ignored.
pub fn tag_sections(sections: &[Section], issues: &[ComplianceIssue]) -> Vec<TaggedSection> {
    let mut risks: Vec<Option<Severity>> = vec![None; sections.len()];

    for issue in issues.iter().filter(|i| !i.resolved) {
        let Some(reference) = issue.section else {
            continue;
        };
        let Some(section) = sections.get(reference.index) else {
            continue;
        };
        if section.label != reference.label {
            continue;
        }
        let slot = &mut risks[reference.index];
        *slot = (*slot).max(Some(issue.severity));
    }

    sections
        .iter()
        .cloned()
        .zip(risks)
        .map(|(section, risk)| TaggedSection { section, risk })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shartnoma_domain::{IssueType, SectionLabel};

    #[test]
    fn test_highest_severity_wins() {
        let sections = vec![
            Section::new(SectionLabel::Parties, 0, 10, 1.0),
            Section::new(SectionLabel::Liability, 10, 20, 1.0),
        ];
        let issues = vec![
            ComplianceIssue::new(IssueType::OneSided, Severity::Medium, "a", "b")
                .in_section(1, SectionLabel::Liability),
            ComplianceIssue::new(IssueType::UnlawfulClause, Severity::Critical, "a", "b")
                .in_section(1, SectionLabel::Liability),
            ComplianceIssue::new(IssueType::MissingInfo, Severity::High, "a", "b"),
        ];

        let tagged = tag_sections(&sections, &issues);
        assert_eq!(tagged.len(), 2);
        assert_eq!(tagged[0].risk, None);
        assert_eq!(tagged[1].risk, Some(Severity::Critical));
        assert_eq!(tagged[1].section, sections[1]);
    }

    #[test]
    fn test_stale_references_are_ignored() {
        let sections = vec![Section::new(SectionLabel::Price, 0, 10, 1.0)];
        let issues = vec![
            ComplianceIssue::new(IssueType::Other, Severity::High, "a", "b")
                .in_section(5, SectionLabel::Price),
            ComplianceIssue::new(IssueType::Other, Severity::High, "a", "b")
                .in_section(0, SectionLabel::Term),
        ];
        assert_eq!(tag_sections(&sections, &issues)[0].risk, None);
    }
}
