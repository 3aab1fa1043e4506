//! Fidelity validator: structural diff between a reference template and a
//! generated output. Read-only; findings are advisory and never trigger
//! auto-correction.

use std::collections::{BTreeMap, HashSet};

use docx_package::DocxDocument;
use shared_types::{FidelityDiff, FidelityReport, Severity};

use shared_types::PatternKind;

use crate::heuristics::{LOST_CONTENT_SAMPLE_CAP, PARAGRAPH_COUNT_TOLERANCE};
use crate::scanner;

/// Template lines the pipeline rewrites rather than preserves: placement
/// consumes placeholder lines, and chapter markers are merged or retitled.
fn is_replaceable(text: &str) -> bool {
    matches!(
        scanner::classify(0, text).map(|m| m.kind),
        Some(PatternKind::Placeholder) | Some(PatternKind::Chapter)
    )
}

/// Compare output against its template and produce a severity-weighted
/// report. Neither document is mutated.
pub fn validate(template: &DocxDocument, output: &DocxDocument) -> FidelityReport {
    let mut diffs: BTreeMap<String, Vec<FidelityDiff>> = BTreeMap::new();
    let mut push = |category: &str, diff: FidelityDiff| {
        diffs.entry(category.to_string()).or_default().push(diff);
    };

    // Style inventory
    let template_styles: HashSet<&str> = template.styles.ids().map(String::as_str).collect();
    let output_styles: HashSet<&str> = output.styles.ids().map(String::as_str).collect();
    for style in template_styles.difference(&output_styles) {
        push(
            "styles",
            FidelityDiff::StyleRemoved {
                style: (*style).to_string(),
                severity: Severity::Warning,
            },
        );
    }
    for style in output_styles.difference(&template_styles) {
        push(
            "styles",
            FidelityDiff::StyleAdded {
                style: (*style).to_string(),
                severity: Severity::Info,
            },
        );
    }

    // Numbering definitions
    if template.has_numbering() && !output.has_numbering() {
        push(
            "numbering",
            FidelityDiff::NumberingRemoved {
                severity: Severity::Warning,
            },
        );
    } else if template.numbering_count != output.numbering_count {
        push(
            "numbering",
            FidelityDiff::NumberingDefinitionChanged {
                template_count: template.numbering_count,
                output_count: output.numbering_count,
                severity: Severity::Info,
            },
        );
    }

    // Margins: template's page geometry must survive generation exactly
    if let Some(template_margins) = template.margins {
        if output.margins != Some(template_margins) {
            push(
                "margins",
                FidelityDiff::MarginsChanged {
                    template: template_margins.as_tuple(),
                    output: output.margins.map(|m| m.as_tuple()).unwrap_or([0; 4]),
                    severity: Severity::Critical,
                },
            );
        }
    }

    if template.section_count != output.section_count {
        push(
            "sections",
            FidelityDiff::SectionCountChanged {
                template_count: template.section_count,
                output_count: output.section_count,
                severity: Severity::Warning,
            },
        );
    }

    if output.paragraphs.len() + PARAGRAPH_COUNT_TOLERANCE < template.paragraphs.len() {
        push(
            "paragraph_count",
            FidelityDiff::ParagraphCountDecreased {
                template_count: template.paragraphs.len(),
                output_count: output.paragraphs.len(),
                severity: Severity::Critical,
            },
        );
    }

    // Non-blank template paragraphs must survive verbatim, except the
    // replaceable ones
    let output_texts: HashSet<&str> = output
        .paragraphs
        .iter()
        .map(|p| p.text.trim())
        .filter(|t| !t.is_empty())
        .collect();
    let lost: Vec<&str> = template
        .paragraphs
        .iter()
        .map(|p| p.text.trim())
        .filter(|t| !t.is_empty() && !is_replaceable(t) && !output_texts.contains(t))
        .collect();
    if !lost.is_empty() {
        push(
            "content_changes",
            FidelityDiff::TemplateContentLost {
                count: lost.len(),
                samples: lost
                    .iter()
                    .take(LOST_CONTENT_SAMPLE_CAP)
                    .map(|t| (*t).to_string())
                    .collect(),
                severity: Severity::Critical,
            },
        );
    }

    let report = FidelityReport::from_diffs(diffs);
    tracing::info!(
        fidelity_score = report.fidelity_score,
        is_valid = report.is_valid,
        diffs = report.diff_count(),
        "fidelity validation complete"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_package::Paragraph;
    use pretty_assertions::assert_eq;
    use shared_types::Margins;

    fn template() -> DocxDocument {
        let mut doc = DocxDocument::empty();
        doc.margins = Some(Margins::from_cm(4.0, 3.0, 4.0, 3.0));
        doc.section_count = 1;
        doc.paragraphs = vec![
            Paragraph::new("BAB I PENDAHULUAN"),
            Paragraph::new("1.1 Latar Belakang"),
        ];
        doc
    }

    #[test]
    fn test_identical_resave_is_valid() {
        let template = template();
        let output = template.clone();
        let report = validate(&template, &output);
        assert!(report.is_valid);
        assert_eq!(report.fidelity_score, 1.0);
        assert_eq!(report.diff_count(), 0);
    }

    #[test]
    fn test_margin_mismatch_is_critical() {
        let template = template();
        let mut output = template.clone();
        output.margins = Some(Margins::from_cm(2.5, 2.5, 2.5, 2.5));
        let report = validate(&template, &output);
        assert!(!report.is_valid);
        assert!(report.fidelity_score <= 0.7);
    }

    #[test]
    fn test_lost_content_is_critical_with_capped_samples() {
        let mut template = template();
        for i in 0..10 {
            template.paragraphs.push(Paragraph::new(format!("Alinea nomor {i}")));
        }
        let mut output = template.clone();
        output.paragraphs.truncate(2);

        let report = validate(&template, &output);
        assert!(!report.is_valid);
        let lost = &report.diffs["content_changes"];
        match &lost[0] {
            FidelityDiff::TemplateContentLost { count, samples, .. } => {
                assert_eq!(*count, 10);
                assert_eq!(samples.len(), 3);
            }
            other => panic!("unexpected diff {other:?}"),
        }
        // 10 paragraphs below the template count is also critical
        assert!(report.diffs.contains_key("paragraph_count"));
    }

    #[test]
    fn test_replaceable_template_lines_are_not_flagged() {
        let mut template = template();
        template
            .paragraphs
            .push(Paragraph::new("TULISKAN latar belakang penelitian di sini"));
        template.paragraphs.push(Paragraph::new("BAB II"));

        // Placement consumed the instruction line and the heading was
        // retitled, yet the body text survived
        let mut output = template.clone();
        output.paragraphs.retain(|p| !p.text.starts_with("TULISKAN"));
        output
            .paragraphs
            .iter_mut()
            .filter(|p| p.text == "BAB II")
            .for_each(|p| p.text = "BAB II\nTINJAUAN PUSTAKA".to_string());

        let report = validate(&template, &output);
        assert!(report.is_valid);
        assert!(!report.diffs.contains_key("content_changes"));
    }

    #[test]
    fn test_small_issues_accumulate() {
        let template = template();
        let mut output = template.clone();
        output.section_count = 2;
        output.numbering_count = 3;
        let report = validate(&template, &output);
        // warning + info penalties stack additively
        assert!((report.fidelity_score - 0.88).abs() < 1e-9);
        assert!(report.is_valid);
    }

    #[test]
    fn test_validator_does_not_mutate() {
        let template = template();
        let output = template.clone();
        let before = output.paragraphs.clone();
        let _ = validate(&template, &output);
        assert_eq!(output.paragraphs, before);
    }
}
