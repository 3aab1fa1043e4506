//! External converter glue.
//!
//! Markdown to DOCX goes through pandoc with the template as the reference
//! document, so the draft inherits the template's style definitions before
//! any formatting pass runs. Legacy `.doc` output goes through LibreOffice
//! when it is installed; when it is not, the caller falls back to serving
//! the `.docx` and reports which path was taken.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

use crate::error::ApiError;

pub const CONVERT_TIMEOUT_SECS: u64 = 120;

/// Which converter produced the bytes that were served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionPath {
    Pandoc,
    PandocLibreOffice,
    /// Legacy format was requested but LibreOffice is not installed.
    DocxFallback,
    /// An uploaded DOCX was formatted in place; no converter ran.
    Direct,
}

impl ConversionPath {
    pub fn as_str(self) -> &'static str {
        match self {
            ConversionPath::Pandoc => "pandoc",
            ConversionPath::PandocLibreOffice => "pandoc+libreoffice",
            ConversionPath::DocxFallback => "docx-fallback",
            ConversionPath::Direct => "direct",
        }
    }
}

/// Convert markdown to DOCX using the template as pandoc's reference doc.
pub async fn markdown_to_docx(
    markdown: &Path,
    reference: &Path,
    output: &Path,
) -> Result<(), ApiError> {
    let mut command = Command::new("pandoc");
    command
        .arg(markdown)
        .arg("--from")
        .arg("markdown+header_attributes")
        .arg("--reference-doc")
        .arg(reference)
        .arg("-o")
        .arg(output);

    let result = run_with_timeout(command, "pandoc").await?;
    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(ApiError::Conversion(format!(
            "pandoc exited with {}: {}",
            result.status,
            stderr.trim()
        )));
    }
    if !output.exists() {
        return Err(ApiError::Conversion(
            "pandoc reported success but produced no output file".into(),
        ));
    }
    Ok(())
}

/// Outcome of a legacy `.doc` conversion attempt.
pub enum LegacyConversion {
    Converted(PathBuf),
    Unavailable,
}

/// Convert a DOCX to legacy `.doc` via LibreOffice. A missing binary is not
/// an error; the caller serves the DOCX instead.
pub async fn docx_to_doc(docx: &Path, out_dir: &Path) -> Result<LegacyConversion, ApiError> {
    let mut command = Command::new("soffice");
    command
        .arg("--headless")
        .arg("--convert-to")
        .arg("doc")
        .arg("--outdir")
        .arg(out_dir)
        .arg(docx);

    let result = match run_with_timeout(command, "soffice").await {
        Ok(output) => output,
        Err(ApiError::ConverterMissing(_)) => {
            tracing::warn!("LibreOffice not available, serving docx instead");
            return Ok(LegacyConversion::Unavailable);
        }
        Err(e) => return Err(e),
    };

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(ApiError::Conversion(format!(
            "soffice exited with {}: {}",
            result.status,
            stderr.trim()
        )));
    }

    let converted = out_dir.join(
        docx.with_extension("doc")
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("output.doc")),
    );
    if !converted.exists() {
        return Err(ApiError::Conversion(
            "soffice reported success but produced no output file".into(),
        ));
    }
    Ok(LegacyConversion::Converted(converted))
}

async fn run_with_timeout(
    mut command: Command,
    name: &'static str,
) -> Result<std::process::Output, ApiError> {
    // A timed-out converter must not keep running after the request fails
    command.kill_on_drop(true);
    let running = command.output();
    match tokio::time::timeout(Duration::from_secs(CONVERT_TIMEOUT_SECS), running).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) if e.kind() == ErrorKind::NotFound => Err(ApiError::ConverterMissing(name)),
        Ok(Err(e)) => Err(ApiError::Io(e)),
        Err(_) => Err(ApiError::ConversionTimeout(CONVERT_TIMEOUT_SECS)),
    }
}
