//! Fidelity report types: the structural diff between a reference template
//! and a generated output.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    /// Additive penalty applied to the fidelity score.
    pub fn penalty(&self) -> f64 {
        match self {
            Severity::Critical => 0.30,
            Severity::Warning => 0.10,
            Severity::Info => 0.02,
        }
    }
}

/// One structural difference between template and output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FidelityDiff {
    StyleRemoved {
        style: String,
        severity: Severity,
    },
    StyleAdded {
        style: String,
        severity: Severity,
    },
    NumberingRemoved {
        severity: Severity,
    },
    NumberingDefinitionChanged {
        template_count: usize,
        output_count: usize,
        severity: Severity,
    },
    MarginsChanged {
        template: [i64; 4],
        output: [i64; 4],
        severity: Severity,
    },
    SectionCountChanged {
        template_count: usize,
        output_count: usize,
        severity: Severity,
    },
    ParagraphCountDecreased {
        template_count: usize,
        output_count: usize,
        severity: Severity,
    },
    TemplateContentLost {
        count: usize,
        samples: Vec<String>,
        severity: Severity,
    },
}

impl FidelityDiff {
    pub fn severity(&self) -> Severity {
        match self {
            FidelityDiff::StyleRemoved { severity, .. }
            | FidelityDiff::StyleAdded { severity, .. }
            | FidelityDiff::NumberingRemoved { severity }
            | FidelityDiff::NumberingDefinitionChanged { severity, .. }
            | FidelityDiff::MarginsChanged { severity, .. }
            | FidelityDiff::SectionCountChanged { severity, .. }
            | FidelityDiff::ParagraphCountDecreased { severity, .. }
            | FidelityDiff::TemplateContentLost { severity, .. } => *severity,
        }
    }
}

/// Severity-weighted structural comparison result.
///
/// The score is an additive-penalty gate, not a quality measure: many small
/// diffs can push a document below the acceptance threshold on purpose.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FidelityReport {
    /// Diffs keyed by comparison category (styles, margins, ...)
    pub diffs: BTreeMap<String, Vec<FidelityDiff>>,
    /// 1.0 minus accumulated penalties, floored at 0.0
    pub fidelity_score: f64,
    /// True iff no critical diff exists
    pub is_valid: bool,
}

impl FidelityReport {
    pub fn from_diffs(diffs: BTreeMap<String, Vec<FidelityDiff>>) -> Self {
        let penalty: f64 = diffs
            .values()
            .flatten()
            .map(|d| d.severity().penalty())
            .sum();
        let is_valid = !diffs
            .values()
            .flatten()
            .any(|d| d.severity() == Severity::Critical);
        FidelityReport {
            diffs,
            fidelity_score: (1.0 - penalty).max(0.0),
            is_valid,
        }
    }

    pub fn diff_count(&self) -> usize {
        self.diffs.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_is_valid() {
        let report = FidelityReport::from_diffs(BTreeMap::new());
        assert!(report.is_valid);
        assert_eq!(report.fidelity_score, 1.0);
    }

    #[test]
    fn test_critical_diff_invalidates() {
        let mut diffs = BTreeMap::new();
        diffs.insert(
            "margins".to_string(),
            vec![FidelityDiff::MarginsChanged {
                template: [2268, 1701, 2268, 1701],
                output: [1440, 1440, 1440, 1440],
                severity: Severity::Critical,
            }],
        );
        let report = FidelityReport::from_diffs(diffs);
        assert!(!report.is_valid);
        assert!((report.fidelity_score - 0.70).abs() < 1e-9);
    }

    #[test]
    fn test_penalties_accumulate_and_floor() {
        let mut diffs = BTreeMap::new();
        diffs.insert(
            "styles".to_string(),
            (0..6)
                .map(|i| FidelityDiff::StyleRemoved {
                    style: format!("S{}", i),
                    severity: Severity::Critical,
                })
                .collect(),
        );
        let report = FidelityReport::from_diffs(diffs);
        assert_eq!(report.fidelity_score, 0.0);
    }

    #[test]
    fn test_warnings_alone_stay_valid() {
        let mut diffs = BTreeMap::new();
        diffs.insert(
            "sections".to_string(),
            vec![FidelityDiff::SectionCountChanged {
                template_count: 2,
                output_count: 3,
                severity: Severity::Warning,
            }],
        );
        let report = FidelityReport::from_diffs(diffs);
        assert!(report.is_valid);
        assert!((report.fidelity_score - 0.90).abs() < 1e-9);
    }
}
