//! Multi-phase format enforcer.
//!
//! Each phase consumes the current paragraph snapshot and produces a new
//! one, is idempotent, and never fails on malformed input: a paragraph that
//! does not fit a phase's pattern is left untouched. Phases run in a fixed
//! order; front matter is prepended last so body-style enforcement never
//! touches the generated preliminary pages. Generated front-matter
//! paragraphs are built in the exact shape the heading and body phases
//! would produce, which keeps a full re-run a no-op.

use docx_package::{DocxDocument, Paragraph, Spacing};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use shared_types::{FrontMatterInfo, ParagraphDefaults, StyleConfig};

use crate::heuristics::{
    ALL_CAPS_MAX_LEN, ALL_CAPS_MIN_LEN, BODY_TEXT_MIN_LEN, CHAPTER_SPACE_AFTER,
    SUBSECTION_SPACE_AFTER, SUBSECTION_SPACE_BEFORE,
};
use crate::normalizer;

const BODY_STYLE_FALLBACK: &str = "IsiParagraf";

/// Style families that body-style enforcement must never touch.
const PROTECTED_STYLE_PARTS: &[&str] = &["Heading", "TOC", "List", "Table", "Caption", "Title"];

lazy_static! {
    static ref CHAPTER_BARE: Regex = Regex::new(r"(?i)^BAB\s+([IVXLCDM]+|\d+)\s*$").unwrap();
    static ref CHAPTER_PREFIX: Regex = Regex::new(r"(?i)^BAB\s+([IVXLCDM]+|\d+)\b").unwrap();
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnforceSummary {
    pub titles_merged: usize,
    pub body_paragraphs_styled: usize,
    pub headings_styled: [usize; 3],
    pub page_breaks_inserted: usize,
    pub numbering_part_added: bool,
    pub toc_inserted: bool,
    pub front_matter_paragraphs: usize,
}

fn is_all_caps_title(text: &str) -> bool {
    let has_letters = text.chars().any(|c| c.is_alphabetic());
    has_letters
        && !text.chars().any(|c| c.is_lowercase())
        && text.len() > ALL_CAPS_MIN_LEN
        && text.len() < ALL_CAPS_MAX_LEN
}

/// Merge a bare chapter marker with the all-caps title paragraph that
/// follows it, joined by a soft line break.
pub fn merge_chapter_titles(doc: &mut DocxDocument) -> usize {
    let source = std::mem::take(&mut doc.paragraphs);
    let mut merged: Vec<Paragraph> = Vec::with_capacity(source.len());
    let mut count = 0;

    let mut iter = source.into_iter().peekable();
    while let Some(paragraph) = iter.next() {
        let is_bare_marker = CHAPTER_BARE.is_match(paragraph.text.trim());
        let next_is_title = iter
            .peek()
            .map(|n| is_all_caps_title(n.text.trim()) && !CHAPTER_PREFIX.is_match(n.text.trim()))
            .unwrap_or(false);

        if is_bare_marker && next_is_title {
            let title = iter
                .next()
                .map(|n| n.text.trim().to_string())
                .unwrap_or_default();
            let mut heading = paragraph;
            heading.text = format!("{}\n{}", heading.text.trim(), title);
            merged.push(heading);
            count += 1;
        } else {
            merged.push(paragraph);
        }
    }

    doc.paragraphs = merged;
    count
}

fn is_body_paragraph(doc: &DocxDocument, paragraph: &Paragraph) -> bool {
    let text = paragraph.text.trim();
    if text.len() < BODY_TEXT_MIN_LEN || paragraph.field.is_some() {
        return false;
    }
    if normalizer::detect_heading_level(paragraph).is_some() || paragraph.is_list_item() {
        return false;
    }
    if paragraph.has_style_containing(PROTECTED_STYLE_PARTS) {
        return false;
    }
    if let Some(style_id) = &paragraph.style {
        if let Some(style) = doc.styles.get(style_id) {
            if PROTECTED_STYLE_PARTS
                .iter()
                .any(|part| style.name.contains(part))
            {
                return false;
            }
        }
    }
    true
}

fn body_style_id(config: &StyleConfig) -> String {
    config
        .style_mapping
        .get("body")
        .cloned()
        .unwrap_or_else(|| BODY_STYLE_FALLBACK.to_string())
}

/// Canonical body shape: designated style, justification, indent, spacing.
fn apply_body_shape(paragraph: &mut Paragraph, style_id: &str, defaults: &ParagraphDefaults) {
    paragraph.style = Some(style_id.to_string());
    paragraph.alignment = Some(defaults.alignment.clone());
    paragraph.spacing = Spacing {
        before: Some(defaults.space_before),
        after: Some(defaults.space_after),
        line: Some(defaults.line),
    };
    paragraph.first_line_indent = Some(defaults.first_line_indent);
}

/// Canonical heading shape per level. Chapter headings are centered with
/// space after; lower levels keep their alignment and get uniform spacing.
fn apply_heading_shape(paragraph: &mut Paragraph, level: u8, style_ids: &[String; 3]) {
    paragraph.style = Some(style_ids[(level - 1) as usize].clone());
    paragraph.outline_level = Some(level - 1);
    paragraph.first_line_indent = None;
    match level {
        1 => {
            paragraph.alignment = Some("center".to_string());
            paragraph.spacing = Spacing {
                before: Some(0),
                after: Some(CHAPTER_SPACE_AFTER),
                line: paragraph.spacing.line,
            };
        }
        _ => {
            paragraph.spacing = Spacing {
                before: Some(SUBSECTION_SPACE_BEFORE),
                after: Some(SUBSECTION_SPACE_AFTER),
                line: paragraph.spacing.line,
            };
        }
    }
}

fn heading_style_ids(doc: &DocxDocument) -> [String; 3] {
    [
        normalizer::heading_style_id(&doc.styles, 1),
        normalizer::heading_style_id(&doc.styles, 2),
        normalizer::heading_style_id(&doc.styles, 3),
    ]
}

/// Assign the designated body style with its indent, spacing and
/// justification to every body content paragraph.
pub fn enforce_body_style(doc: &mut DocxDocument, config: &StyleConfig) -> usize {
    let style_id = body_style_id(config);

    let eligible: Vec<usize> = doc
        .paragraphs
        .iter()
        .enumerate()
        .filter(|(_, p)| is_body_paragraph(doc, p))
        .map(|(i, _)| i)
        .collect();

    for &i in &eligible {
        apply_body_shape(&mut doc.paragraphs[i], &style_id, &config.paragraph);
    }
    eligible.len()
}

/// Re-apply heading styles, outline levels and uniform heading spacing,
/// overriding whatever the upstream converter produced.
pub fn enforce_heading_styles(doc: &mut DocxDocument) -> [usize; 3] {
    let style_ids = heading_style_ids(doc);
    let mut counts = [0usize; 3];

    for paragraph in &mut doc.paragraphs {
        if paragraph.field.is_some() {
            continue;
        }
        if let Some(level) = normalizer::detect_heading_level(paragraph) {
            apply_heading_shape(paragraph, level, &style_ids);
            counts[(level - 1) as usize] += 1;
        }
    }
    counts
}

/// Force a page break before every chapter heading except the first, and
/// make sure a numbering part exists when list items are present.
pub fn enforce_page_breaks(doc: &mut DocxDocument) -> (usize, bool) {
    let mut chapter_seen = false;
    let mut inserted = 0;

    for paragraph in &mut doc.paragraphs {
        if !CHAPTER_PREFIX.is_match(paragraph.text.trim()) {
            continue;
        }
        if chapter_seen && !paragraph.page_break_before {
            paragraph.page_break_before = true;
            inserted += 1;
        }
        chapter_seen = true;
    }

    let has_lists = doc.paragraphs.iter().any(|p| p.is_list_item());
    let numbering_added = if has_lists {
        doc.ensure_numbering_part()
    } else {
        false
    };
    (inserted, numbering_added)
}

fn centered(text: impl Into<String>, page_break: bool) -> Paragraph {
    let mut p = Paragraph::new(text);
    p.alignment = Some("center".to_string());
    p.page_break_before = page_break;
    p
}

/// Prepend front-matter pages built from the supplied metadata: title page,
/// abstract in each language with its keyword line. Each page starts with a
/// forced page break. Missing fields degrade to omitted sections.
pub fn generate_front_matter(
    doc: &mut DocxDocument,
    info: &FrontMatterInfo,
    config: &StyleConfig,
) -> usize {
    if info.is_empty() {
        return 0;
    }
    // Already prepended when the document opens with the first generated page
    if let Some(first) = doc.paragraphs.first() {
        let text = first.text.trim();
        let already = match &info.title {
            Some(title) => text.eq_ignore_ascii_case(&title.to_uppercase()),
            None => text == "ABSTRAK" || text == "ABSTRACT",
        };
        if already {
            return 0;
        }
    }

    let mut pages: Vec<Paragraph> = Vec::new();

    if let Some(title) = &info.title {
        pages.push(centered(title.to_uppercase(), false));
        pages.push(centered("SKRIPSI", false));
        if let Some(author) = &info.author {
            pages.push(centered("Oleh:", false));
            let byline = match &info.identifier {
                Some(id) => format!("{}\n{}", author.to_uppercase(), id),
                None => author.to_uppercase(),
            };
            pages.push(centered(byline, false));
        }
        if let Some(institution) = &info.institution {
            let line = match info.year {
                Some(year) => format!("{}\n{}", institution.to_uppercase(), year),
                None => institution.to_uppercase(),
            };
            pages.push(centered(line, false));
        }
    }

    if let Some(abstract_text) = &info.abstract_primary {
        pages.push(centered("ABSTRAK", true));
        pages.push(Paragraph::new(abstract_text.as_str()));
        if let Some(keywords) = &info.keywords {
            pages.push(Paragraph::new(format!("Kata Kunci: {keywords}")));
        }
    }
    if let Some(abstract_text) = &info.abstract_secondary {
        pages.push(centered("ABSTRACT", true));
        pages.push(Paragraph::new(abstract_text.as_str()));
        if let Some(keywords) = &info.keywords {
            pages.push(Paragraph::new(format!("Keywords: {keywords}")));
        }
    }

    if pages.is_empty() {
        return 0;
    }

    // Pre-shape the generated paragraphs so a later heading or body pass
    // leaves them unchanged.
    let style_ids = heading_style_ids(doc);
    let body_style = body_style_id(config);
    for paragraph in &mut pages {
        if let Some(level) = normalizer::detect_heading_level(paragraph) {
            apply_heading_shape(paragraph, level, &style_ids);
        } else if is_body_paragraph(doc, paragraph) {
            apply_body_shape(paragraph, &body_style, &config.paragraph);
        }
    }

    // The page after the front matter starts fresh
    if let Some(first_content) = doc.paragraphs.first_mut() {
        first_content.page_break_before = true;
    }
    let count = pages.len();
    doc.paragraphs.splice(0..0, pages);
    count
}

/// Run every phase in order on a generated draft.
pub fn enforce(
    doc: &mut DocxDocument,
    info: &FrontMatterInfo,
    config: &StyleConfig,
) -> EnforceSummary {
    let titles_merged = merge_chapter_titles(doc);
    let body_paragraphs_styled = enforce_body_style(doc, config);
    let headings_styled = enforce_heading_styles(doc);
    let (page_breaks_inserted, numbering_part_added) = enforce_page_breaks(doc);
    let toc_inserted = normalizer::insert_toc(doc);
    let front_matter_paragraphs = generate_front_matter(doc, info, config);

    let summary = EnforceSummary {
        titles_merged,
        body_paragraphs_styled,
        headings_styled,
        page_breaks_inserted,
        numbering_part_added,
        toc_inserted,
        front_matter_paragraphs,
    };
    tracing::info!(?summary, "format enforcement complete");
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn draft() -> DocxDocument {
        let mut doc = DocxDocument::empty();
        doc.paragraphs = vec![
            Paragraph::new("BAB I"),
            Paragraph::new("PENDAHULUAN"),
            Paragraph::new("Latar belakang penelitian ini cukup panjang untuk dianggap isi."),
            Paragraph::new("BAB II TINJAUAN PUSTAKA"),
            Paragraph::new("Teori pendukung dijelaskan pada bagian ini secara ringkas."),
        ];
        doc
    }

    #[test]
    fn test_merge_chapter_titles() {
        let mut doc = draft();
        assert_eq!(merge_chapter_titles(&mut doc), 1);
        assert_eq!(doc.paragraphs.len(), 4);
        assert_eq!(doc.paragraphs[0].text, "BAB I\nPENDAHULUAN");

        // Re-running finds nothing left to merge
        assert_eq!(merge_chapter_titles(&mut doc), 0);
        assert_eq!(doc.paragraphs.len(), 4);
    }

    #[test]
    fn test_bare_marker_before_next_chapter_is_kept() {
        let mut doc = DocxDocument::empty();
        doc.paragraphs = vec![Paragraph::new("BAB I"), Paragraph::new("BAB II")];
        assert_eq!(merge_chapter_titles(&mut doc), 0);
        assert_eq!(doc.paragraphs.len(), 2);
    }

    #[test]
    fn test_enforce_body_style() {
        let mut doc = draft();
        merge_chapter_titles(&mut doc);
        let config = StyleConfig::default();
        let styled = enforce_body_style(&mut doc, &config);
        assert_eq!(styled, 2);

        let body = &doc.paragraphs[1];
        assert_eq!(body.style.as_deref(), Some("IsiParagraf"));
        assert_eq!(body.alignment.as_deref(), Some("both"));
        assert_eq!(body.spacing.line, Some(360));
        assert_eq!(body.first_line_indent, Some(567));

        // Headings keep their shape
        assert_eq!(doc.paragraphs[0].style, None);

        // A second pass restyles the same paragraphs without changing them
        let once = doc.paragraphs.clone();
        assert_eq!(enforce_body_style(&mut doc, &config), 2);
        assert_eq!(doc.paragraphs, once);
    }

    #[test]
    fn test_heading_spacing_uniform() {
        let mut doc = draft();
        merge_chapter_titles(&mut doc);
        let counts = enforce_heading_styles(&mut doc);
        assert_eq!(counts, [2, 0, 0]);
        let heading = &doc.paragraphs[0];
        assert_eq!(heading.style.as_deref(), Some("Heading1"));
        assert_eq!(heading.outline_level, Some(0));
        assert_eq!(heading.alignment.as_deref(), Some("center"));
        assert_eq!(heading.spacing.after, Some(CHAPTER_SPACE_AFTER));
    }

    #[test]
    fn test_page_breaks_skip_first_chapter() {
        let mut doc = draft();
        merge_chapter_titles(&mut doc);
        let (inserted, numbering) = enforce_page_breaks(&mut doc);
        assert_eq!(inserted, 1);
        assert!(!numbering);
        assert!(!doc.paragraphs[0].page_break_before);
        assert!(doc.paragraphs[2].page_break_before);

        let (second_run, _) = enforce_page_breaks(&mut doc);
        assert_eq!(second_run, 0);
    }

    #[test]
    fn test_numbering_part_added_for_lists() {
        let mut doc = DocxDocument::empty();
        let mut item = Paragraph::new("Butir pertama");
        item.numbering = Some((0, 1));
        doc.paragraphs = vec![item];
        let (_, numbering) = enforce_page_breaks(&mut doc);
        assert!(numbering);
        assert!(doc.has_numbering());
    }

    #[test]
    fn test_front_matter_order_and_idempotence() {
        let mut doc = draft();
        let info = FrontMatterInfo {
            title: Some("Sistem Pakar Diagnosa".to_string()),
            author: Some("Budi Santoso".to_string()),
            identifier: Some("13523001".to_string()),
            institution: Some("Universitas Islam Indonesia".to_string()),
            year: Some(2024),
            abstract_primary: Some("Abstrak dalam bahasa Indonesia.".to_string()),
            abstract_secondary: Some("Abstract in English.".to_string()),
            keywords: Some("sistem pakar, diagnosa".to_string()),
        };
        let config = StyleConfig::default();
        let added = generate_front_matter(&mut doc, &info, &config);
        assert!(added > 0);
        assert_eq!(doc.paragraphs[0].text, "SISTEM PAKAR DIAGNOSA");
        let texts: Vec<&str> = doc.paragraphs.iter().map(|p| p.text.as_str()).collect();
        let abstrak = texts.iter().position(|t| *t == "ABSTRAK").unwrap();
        let abstract_en = texts.iter().position(|t| *t == "ABSTRACT").unwrap();
        assert!(abstrak < abstract_en);
        assert!(doc.paragraphs[abstrak].page_break_before);

        assert_eq!(generate_front_matter(&mut doc, &info, &config), 0);
    }

    #[test]
    fn test_missing_fields_degrade_gracefully() {
        let mut doc = draft();
        let info = FrontMatterInfo {
            abstract_primary: Some("Hanya abstrak.".to_string()),
            ..Default::default()
        };
        let added = generate_front_matter(&mut doc, &info, &StyleConfig::default());
        assert_eq!(added, 2);
        assert_eq!(doc.paragraphs[0].text, "ABSTRAK");

        assert_eq!(
            generate_front_matter(&mut doc, &info, &StyleConfig::default()),
            0
        );
    }

    #[test]
    fn test_full_enforce_is_idempotent() {
        let mut doc = draft();
        let info = FrontMatterInfo {
            title: Some("Judul Skripsi".to_string()),
            author: Some("Budi Santoso".to_string()),
            abstract_primary: Some("Abstrak singkat untuk pengujian pipeline pemformatan.".to_string()),
            keywords: Some("pengujian, pemformatan".to_string()),
            ..Default::default()
        };
        let config = StyleConfig::default();
        enforce(&mut doc, &info, &config);
        let once = doc.paragraphs.clone();
        enforce(&mut doc, &info, &config);
        assert_eq!(doc.paragraphs, once);
    }
}
