//! Template-fidelity formatting engine.
//!
//! Infers document structure from a reference template, enforces the
//! template's formatting rules on a generated draft, resolves duplicated
//! chapter headings, and validates the final artifact against the template.

pub mod adapter;
pub mod dedupe;
pub mod enforcer;
pub mod heuristics;
pub mod normalizer;
pub mod placer;
pub mod scanner;
pub mod validator;
pub mod zones;

use docx_package::DocxDocument;
use serde::Serialize;
use shared_types::{FidelityReport, FrontMatterInfo, StyleConfig};
use thiserror::Error;

pub use adapter::{FontSummary, TemplateAnalysis};
pub use enforcer::EnforceSummary;
pub use normalizer::NormalizeSummary;
pub use placer::PlacementSummary;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("package error: {0}")]
    Package(#[from] docx_package::PackageError),
    #[error("no chapter heading found outside the front matter; refusing to place content")]
    NoMainContent,
}

/// Outcome of a full formatting run over a generated draft.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub placement: PlacementSummary,
    pub enforcement: EnforceSummary,
    pub duplicates_removed: usize,
    pub report: FidelityReport,
}

/// Run the post-generation pipeline: place draft content into a copy of
/// the template at the analyzed insertion points, enforce formatting,
/// collapse duplicate chapters, then validate the result against the
/// template. The validator runs last and only observes.
pub fn run_pipeline(
    template: &DocxDocument,
    analysis: &TemplateAnalysis,
    draft: &DocxDocument,
    info: &FrontMatterInfo,
    config: &StyleConfig,
) -> Result<(DocxDocument, PipelineOutcome), EngineError> {
    let (mut merged, placement) = placer::place_content(template, draft, analysis)?;
    let enforcement = enforcer::enforce(&mut merged, info, config);
    let duplicates_removed = dedupe::resolve_duplicates(&mut merged);
    let report = validator::validate(template, &merged);
    Ok((
        merged,
        PipelineOutcome {
            placement,
            enforcement,
            duplicates_removed,
            report,
        },
    ))
}

/// Derive a style configuration from a template analysis, falling back to
/// the thesis-standard defaults for anything the template does not supply.
pub fn style_config_from(analysis: &TemplateAnalysis, template: &DocxDocument) -> StyleConfig {
    let mut config = StyleConfig::default();
    if let Some(margins) = template.margins {
        config.margins = margins;
    }
    config.style_mapping = analysis.style_mapping.clone();
    config
}
