//! Heading and table-of-contents normalizer.
//!
//! Re-derives heading levels from text shape and style hints, assigns the
//! built-in heading styles with explicit outline levels, then inserts a
//! native TOC field scoped to chapters only. Heading styling must run before
//! TOC insertion because the field resolves against outline levels.

use docx_package::{DocxDocument, Paragraph, StyleSheet};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::heuristics::{ALL_CAPS_MAX_LEN, ALL_CAPS_MIN_LEN};
use crate::scanner;

/// Chapters only. The field is left unresolved; the consuming word
/// processor computes the entries on update.
pub const TOC_FIELD_INSTRUCTION: &str = "TOC \\o \"1-1\" \\h \\z \\u";
pub const TOC_PLACEHOLDER_TEXT: &str = "[Daftar Isi - Tekan F9 di Word untuk update]";

lazy_static! {
    static ref CHAPTER_PREFIX: Regex = Regex::new(r"(?i)^BAB\s+([IVXLCDM]+|\d+)\b").unwrap();
    static ref HEADING_STYLE: Regex = Regex::new(r"(?i)heading\s*(\d)").unwrap();
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizeSummary {
    /// Paragraph count styled per level, index 0 = level 1
    pub headings: [usize; 3],
    pub toc_inserted: bool,
}

/// Heading level of a paragraph, in priority order: chapter prefix, all-caps
/// heading shape, then an existing heading style hint. TOC listing lines are
/// never headings.
pub fn detect_heading_level(paragraph: &Paragraph) -> Option<u8> {
    let text = paragraph.text.trim();
    if text.is_empty() || scanner::looks_like_toc_entry(text) {
        return None;
    }

    if CHAPTER_PREFIX.is_match(text) {
        return Some(1);
    }

    let has_letters = text.chars().any(|c| c.is_alphabetic());
    let all_caps = has_letters && !text.chars().any(|c| c.is_lowercase());
    if all_caps && text.len() > ALL_CAPS_MIN_LEN && text.len() < ALL_CAPS_MAX_LEN {
        return Some(2);
    }

    if let Some(style) = &paragraph.style {
        if let Some(caps) = HEADING_STYLE.captures(style) {
            let level: u8 = caps[1].parse().ok()?;
            if (1..=3).contains(&level) {
                return Some(level);
            }
        }
    }
    None
}

/// Style identifier for a built-in heading level, resolved against the
/// document's style sheet when it names the style differently.
pub fn heading_style_id(styles: &StyleSheet, level: u8) -> String {
    styles
        .find_by_name(&format!("heading {level}"))
        .map(|s| s.style_id.clone())
        .unwrap_or_else(|| format!("Heading{level}"))
}

/// Assign heading styles and outline levels in one pass.
pub fn apply_heading_styles(doc: &mut DocxDocument) -> [usize; 3] {
    let mut counts = [0usize; 3];
    let style_ids: Vec<String> = (1..=3).map(|l| heading_style_id(&doc.styles, l)).collect();

    for paragraph in &mut doc.paragraphs {
        if paragraph.field.is_some() {
            continue;
        }
        if let Some(level) = detect_heading_level(paragraph) {
            paragraph.style = Some(style_ids[(level - 1) as usize].clone());
            // 0-indexed so the TOC field can resolve it without style names
            paragraph.outline_level = Some(level - 1);
            counts[(level - 1) as usize] += 1;
        }
    }
    counts
}

/// Insert the TOC field as the first paragraph, followed by a forced page
/// break on whatever content comes next. No-op when a TOC field exists.
pub fn insert_toc(doc: &mut DocxDocument) -> bool {
    let already_present = doc
        .paragraphs
        .iter()
        .any(|p| p.field.as_deref().is_some_and(|f| f.starts_with("TOC")));
    if already_present {
        return false;
    }

    let mut field_paragraph = Paragraph::new(TOC_PLACEHOLDER_TEXT);
    field_paragraph.field = Some(TOC_FIELD_INSTRUCTION.to_string());
    doc.paragraphs.insert(0, field_paragraph);

    if let Some(next) = doc.paragraphs.get_mut(1) {
        next.page_break_before = true;
    }
    true
}

/// Full normalizer pass: heading discipline first, then the TOC field.
pub fn normalize(doc: &mut DocxDocument) -> NormalizeSummary {
    let headings = apply_heading_styles(doc);
    let toc_inserted = insert_toc(doc);
    tracing::debug!(?headings, toc_inserted, "normalized headings");
    NormalizeSummary {
        headings,
        toc_inserted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_detect_levels() {
        assert_eq!(detect_heading_level(&Paragraph::new("BAB III METODE PENELITIAN")), Some(1));
        assert_eq!(detect_heading_level(&Paragraph::new("KATA PENGANTAR")), Some(2));
        assert_eq!(detect_heading_level(&Paragraph::new("Paragraf isi biasa.")), None);

        let mut styled = Paragraph::new("Latar Belakang Masalah");
        styled.style = Some("Heading3".to_string());
        assert_eq!(detect_heading_level(&styled), Some(3));

        let mut deep = Paragraph::new("Sangat dalam");
        deep.style = Some("Heading5".to_string());
        assert_eq!(detect_heading_level(&deep), None);
    }

    #[test]
    fn test_toc_lines_never_become_headings() {
        assert_eq!(detect_heading_level(&Paragraph::new("BAB I PENDAHULUAN\t1")), None);
        assert_eq!(detect_heading_level(&Paragraph::new("DAFTAR PUSTAKA  88")), None);
    }

    #[test]
    fn test_all_caps_length_window() {
        assert_eq!(detect_heading_level(&Paragraph::new("ABC")), None);
        let long = "A".repeat(80);
        assert_eq!(detect_heading_level(&Paragraph::new(long)), None);
        assert_eq!(detect_heading_level(&Paragraph::new("ABSTRAK")), Some(2));
    }

    #[test]
    fn test_apply_sets_style_and_outline() {
        let mut doc = DocxDocument::empty();
        doc.paragraphs = vec![
            Paragraph::new("BAB I\nPENDAHULUAN"),
            Paragraph::new("Isi paragraf pertama."),
            Paragraph::new("TINJAUAN SINGKAT"),
        ];
        let counts = apply_heading_styles(&mut doc);
        assert_eq!(counts, [1, 1, 0]);
        assert_eq!(doc.paragraphs[0].style.as_deref(), Some("Heading1"));
        assert_eq!(doc.paragraphs[0].outline_level, Some(0));
        assert_eq!(doc.paragraphs[1].style, None);
        assert_eq!(doc.paragraphs[2].outline_level, Some(1));
    }

    #[test]
    fn test_insert_toc_once() {
        let mut doc = DocxDocument::empty();
        doc.paragraphs = vec![Paragraph::new("BAB I PENDAHULUAN")];

        assert!(insert_toc(&mut doc));
        assert_eq!(doc.paragraphs.len(), 2);
        assert_eq!(
            doc.paragraphs[0].field.as_deref(),
            Some(TOC_FIELD_INSTRUCTION)
        );
        assert!(doc.paragraphs[1].page_break_before);

        // Second run is a no-op
        assert!(!insert_toc(&mut doc));
        assert_eq!(doc.paragraphs.len(), 2);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut doc = DocxDocument::empty();
        doc.paragraphs = vec![
            Paragraph::new("BAB I\nPENDAHULUAN"),
            Paragraph::new("Isi paragraf."),
        ];
        normalize(&mut doc);
        let once = doc.paragraphs.clone();
        normalize(&mut doc);
        assert_eq!(doc.paragraphs, once);
    }
}
