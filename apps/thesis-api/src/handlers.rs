//! HTTP handlers for the thesis formatting API

use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use docx_package::DocxDocument;
use serde_json::json;
use shared_types::{FidelityReport, StyleConfig};
use std::sync::Arc;
use template_engine::{dedupe, enforcer, style_config_from, validator, TemplateAnalysis};
use uuid::Uuid;

use crate::convert::{self, ConversionPath, LegacyConversion};
use crate::error::ApiError;
use crate::markdown::normalize_text_to_markdown;
use crate::models::*;
use crate::state::{AppState, StoredTemplate};

const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const DOC_MIME: &str = "application/msword";

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Upload and analyze a template document
pub async fn upload_template(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<TemplateSummary>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("template.docx").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::InvalidRequest(format!("Invalid upload: {}", e)))?;
            upload = Some((filename, bytes.to_vec()));
        }
    }

    let (filename, bytes) =
        upload.ok_or_else(|| ApiError::InvalidRequest("Missing 'file' field".into()))?;

    let stored = store_template(&state, filename, &bytes).await?;
    let summary = TemplateSummary::from(&stored);
    state.register_template(stored);

    tracing::info!(
        "Registered template {} ({}, {} chapters)",
        summary.id,
        summary.template_type,
        summary.chapter_count
    );

    Ok(Json(summary))
}

/// List registered templates
pub async fn list_templates(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<TemplateSummary>> {
    let templates = state.list_templates();
    Json(templates.iter().map(TemplateSummary::from).collect())
}

/// Get full analysis for a registered template
pub async fn get_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TemplateDetail>, ApiError> {
    let template = state
        .get_template(&id)
        .ok_or_else(|| ApiError::TemplateNotFound(id.to_string()))?;

    Ok(Json(TemplateDetail {
        id: template.id,
        filename: template.filename,
        uploaded_at: template.uploaded_at,
        analysis: template.analysis,
    }))
}

/// Generate a formatted document.
///
/// Two workflows: template plus raw text content goes through the markdown
/// converter, then the converted chapters are placed into a copy of the
/// template and formatted; an uploaded DOCX is formatted in place.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let form = parse_generate_form(multipart).await?;
    let info = form.front_matter();
    let job_id = Uuid::new_v4();

    if let Some(content) = &form.content {
        // Workflow 1: template-based generation
        let template = resolve_template(&state, &form).await?;
        let template_doc = DocxDocument::open(&template.path)?;

        let markdown = normalize_text_to_markdown(content);
        let md_path = state.work_dir().join(format!("{}.md", job_id));
        tokio::fs::write(&md_path, &markdown).await?;

        let draft_path = state.work_dir().join(format!("{}.docx", job_id));
        convert::markdown_to_docx(&md_path, &template.path, &draft_path).await?;

        let draft = DocxDocument::open(&draft_path)?;
        let config = style_config_from(&template.analysis, &template_doc);
        let (output, outcome) = template_engine::run_pipeline(
            &template_doc,
            &template.analysis,
            &draft,
            &info,
            &config,
        )?;

        let out_path = state.output_dir().join(format!("{}.docx", job_id));
        output.save(&out_path)?;

        tracing::info!(
            "Generated {} from template {}: {} chapters placed, {} bodies styled, fidelity {:.2}",
            job_id,
            template.id,
            outcome.placement.chapters_placed,
            outcome.enforcement.body_paragraphs_styled,
            outcome.report.fidelity_score
        );

        let (bytes, path) = finish_output(&state, &out_path, form.output_format).await?;
        file_response(
            bytes,
            form.output_format,
            path,
            Some(outcome.report.fidelity_score),
        )
    } else if let Some(document) = &form.document {
        // Workflow 2: direct formatting of an uploaded document
        let mut draft = DocxDocument::from_bytes(document)?;
        let config = StyleConfig::default();
        let enforcement = enforcer::enforce(&mut draft, &info, &config);
        let duplicates_removed = dedupe::resolve_duplicates(&mut draft);

        let out_path = state.output_dir().join(format!("{}.docx", job_id));
        draft.save(&out_path)?;

        tracing::info!(
            "Formatted upload {}: {} bodies styled, {} duplicates removed",
            job_id,
            enforcement.body_paragraphs_styled,
            duplicates_removed
        );

        let bytes = tokio::fs::read(&out_path).await?;
        file_response(bytes, OutputFormat::Docx, ConversionPath::Direct, None)
    } else {
        Err(ApiError::InvalidRequest(
            "Provide either 'content' with a template, or 'file' with a document to format".into(),
        ))
    }
}

/// Compare a template against a generated document
pub async fn validate(mut multipart: Multipart) -> Result<Json<FidelityReport>, ApiError> {
    let mut template_bytes: Option<Vec<u8>> = None;
    let mut output_bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid upload: {}", e)))?;
        match name.as_str() {
            "template" => template_bytes = Some(bytes.to_vec()),
            "output" => output_bytes = Some(bytes.to_vec()),
            _ => {}
        }
    }

    let template_bytes = template_bytes
        .ok_or_else(|| ApiError::InvalidRequest("Missing 'template' field".into()))?;
    let output_bytes =
        output_bytes.ok_or_else(|| ApiError::InvalidRequest("Missing 'output' field".into()))?;

    let template = DocxDocument::from_bytes(&template_bytes)?;
    let output = DocxDocument::from_bytes(&output_bytes)?;

    Ok(Json(validator::validate(&template, &output)))
}

/// Describe the formatting phases this service applies
pub async fn status() -> Json<serde_json::Value> {
    Json(json!({
        "status": "available",
        "version": env!("CARGO_PKG_VERSION"),
        "phases": {
            "place": "Template content placement at analyzed insertion points",
            "merge": "Chapter marker and title merging (soft line break)",
            "body_style": "Body paragraph style and spacing",
            "headings": "Heading styles with outline levels",
            "page_breaks": "Page break before each chapter",
            "toc": "Table of contents field insertion",
            "front_matter": "Title and abstract page generation",
            "dedupe": "Duplicate chapter heading resolution",
            "validate": "Template fidelity report",
        },
    }))
}

async fn store_template(
    state: &Arc<AppState>,
    filename: String,
    bytes: &[u8],
) -> Result<StoredTemplate, ApiError> {
    let doc = DocxDocument::from_bytes(bytes)?;
    let analysis = TemplateAnalysis::analyze(&doc);

    let id = Uuid::new_v4();
    let path = state.template_dir().join(format!("{}.docx", id));
    tokio::fs::write(&path, bytes).await?;

    Ok(StoredTemplate {
        id,
        filename,
        path,
        uploaded_at: Utc::now(),
        analysis,
    })
}

async fn resolve_template(
    state: &Arc<AppState>,
    form: &GenerateForm,
) -> Result<StoredTemplate, ApiError> {
    if let Some((filename, bytes)) = &form.template {
        let stored = store_template(state, filename.clone(), bytes).await?;
        state.register_template(stored.clone());
        return Ok(stored);
    }
    if let Some(id) = &form.template_id {
        return state
            .get_template(id)
            .ok_or_else(|| ApiError::TemplateNotFound(id.to_string()));
    }
    Err(ApiError::InvalidRequest(
        "Provide 'template' or 'template_id' with text content".into(),
    ))
}

/// Apply the requested output format, falling back to DOCX when the legacy
/// converter is unavailable.
async fn finish_output(
    state: &Arc<AppState>,
    docx_path: &std::path::Path,
    format: OutputFormat,
) -> Result<(Vec<u8>, ConversionPath), ApiError> {
    match format {
        OutputFormat::Docx => {
            let bytes = tokio::fs::read(docx_path).await?;
            Ok((bytes, ConversionPath::Pandoc))
        }
        OutputFormat::Doc => match convert::docx_to_doc(docx_path, &state.output_dir()).await? {
            LegacyConversion::Converted(doc_path) => {
                let bytes = tokio::fs::read(&doc_path).await?;
                Ok((bytes, ConversionPath::PandocLibreOffice))
            }
            LegacyConversion::Unavailable => {
                let bytes = tokio::fs::read(docx_path).await?;
                Ok((bytes, ConversionPath::DocxFallback))
            }
        },
    }
}

fn file_response(
    bytes: Vec<u8>,
    format: OutputFormat,
    path: ConversionPath,
    fidelity_score: Option<f64>,
) -> Result<Response, ApiError> {
    // A doc request that fell back still serves docx bytes
    let (mime, extension) = match (format, path) {
        (OutputFormat::Doc, ConversionPath::PandocLibreOffice) => (DOC_MIME, format.extension()),
        _ => (DOCX_MIME, OutputFormat::Docx.extension()),
    };

    let mut response = (StatusCode::OK, bytes).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(mime));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"formatted.{}\"", extension))
            .map_err(|e| ApiError::Internal(e.into()))?,
    );
    headers.insert(
        "X-Conversion-Path",
        HeaderValue::from_static(path.as_str()),
    );
    if let Some(score) = fidelity_score {
        headers.insert(
            "X-Fidelity-Score",
            HeaderValue::from_str(&format!("{:.2}", score))
                .map_err(|e| ApiError::Internal(e.into()))?,
        );
    }
    Ok(response)
}

async fn parse_generate_form(mut multipart: Multipart) -> Result<GenerateForm, ApiError> {
    let mut form = GenerateForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "content" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::InvalidRequest(format!("Invalid content: {}", e)))?;
                form.content = Some(text);
            }
            "file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::InvalidRequest(format!("Invalid upload: {}", e)))?;
                form.document = Some(bytes.to_vec());
            }
            "template" => {
                let filename = field.file_name().unwrap_or("template.docx").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::InvalidRequest(format!("Invalid upload: {}", e)))?;
                form.template = Some((filename, bytes.to_vec()));
            }
            "template_id" => {
                let text = field.text().await.unwrap_or_default();
                let id = text
                    .trim()
                    .parse()
                    .map_err(|_| ApiError::InvalidRequest(format!("Invalid template_id: {}", text)))?;
                form.template_id = Some(id);
            }
            "include_front_matter" => {
                let text = field.text().await.unwrap_or_default();
                form.include_front_matter =
                    matches!(text.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes");
            }
            "output_format" => {
                let text = field.text().await.unwrap_or_default();
                form.output_format = OutputFormat::parse(&text);
            }
            "title" => form.title = read_text_field(field).await?,
            "author" => form.author = read_text_field(field).await?,
            "identifier" => form.identifier = read_text_field(field).await?,
            "institution" => form.institution = read_text_field(field).await?,
            "year" => {
                if let Some(text) = read_text_field(field).await? {
                    form.year = text.trim().parse().ok();
                }
            }
            "abstract_primary" => form.abstract_primary = read_text_field(field).await?,
            "abstract_secondary" => form.abstract_secondary = read_text_field(field).await?,
            "keywords" => form.keywords = read_text_field(field).await?,
            other => {
                tracing::debug!("Ignoring unknown form field '{}'", other);
            }
        }
    }

    Ok(form)
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> Result<Option<String>, ApiError> {
    let text = field
        .text()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid field value: {}", e)))?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}
