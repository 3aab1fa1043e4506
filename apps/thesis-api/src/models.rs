//! Request and response models for the thesis formatting API

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared_types::FrontMatterInfo;
use template_engine::TemplateAnalysis;
use uuid::Uuid;

use crate::state::StoredTemplate;

/// Summary returned after a template upload.
#[derive(Debug, Serialize)]
pub struct TemplateSummary {
    pub id: Uuid,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub template_type: String,
    pub chapter_count: usize,
    pub subsection_count: usize,
    pub placeholder_count: usize,
}

impl From<&StoredTemplate> for TemplateSummary {
    fn from(t: &StoredTemplate) -> Self {
        TemplateSummary {
            id: t.id,
            filename: t.filename.clone(),
            uploaded_at: t.uploaded_at,
            template_type: t.analysis.template_type.clone(),
            chapter_count: t.analysis.chapters.len(),
            subsection_count: t.analysis.subsections.len(),
            placeholder_count: t.analysis.placeholders.len(),
        }
    }
}

/// Full analysis for a registered template.
#[derive(Debug, Serialize)]
pub struct TemplateDetail {
    pub id: Uuid,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub analysis: TemplateAnalysis,
}

/// Multipart form fields accepted by the generate endpoint.
///
/// Two workflows are supported: template plus raw text content, or a
/// finished document uploaded for direct formatting.
#[derive(Debug, Default)]
pub struct GenerateForm {
    pub content: Option<String>,
    pub document: Option<Vec<u8>>,
    pub template: Option<(String, Vec<u8>)>,
    pub template_id: Option<Uuid>,
    pub include_front_matter: bool,
    pub output_format: OutputFormat,
    pub title: Option<String>,
    pub author: Option<String>,
    pub identifier: Option<String>,
    pub institution: Option<String>,
    pub year: Option<u32>,
    pub abstract_primary: Option<String>,
    pub abstract_secondary: Option<String>,
    pub keywords: Option<String>,
}

impl GenerateForm {
    pub fn front_matter(&self) -> FrontMatterInfo {
        if !self.include_front_matter {
            return FrontMatterInfo::default();
        }
        FrontMatterInfo {
            title: self.title.clone(),
            author: self.author.clone(),
            identifier: self.identifier.clone(),
            institution: self.institution.clone(),
            year: self.year,
            abstract_primary: self.abstract_primary.clone(),
            abstract_secondary: self.abstract_secondary.clone(),
            keywords: self.keywords.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Docx,
    Doc,
}

impl OutputFormat {
    pub fn parse(value: &str) -> OutputFormat {
        match value.trim().to_ascii_lowercase().as_str() {
            "doc" => OutputFormat::Doc,
            _ => OutputFormat::Docx,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Docx => "docx",
            OutputFormat::Doc => "doc",
        }
    }
}
