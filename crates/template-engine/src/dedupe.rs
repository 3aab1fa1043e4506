//! Duplicate chapter resolver.
//!
//! A generated draft can carry two headings for the same chapter number:
//! the template's placeholder (still holding instructional text or a bare
//! marker) and the injected, properly titled heading. This pass collapses
//! them to one heading per chapter number.
//!
//! Strategy precedence is deterministic: headings are grouped by chapter
//! number, and when every duplicated number carries matching placeholder and
//! titled counts the pairwise replacement runs within each group; otherwise
//! the canonical per-number dedupe runs. Deletions always proceed in
//! descending position order so earlier indices stay valid.

use std::collections::BTreeMap;

use docx_package::DocxDocument;
use lazy_static::lazy_static;
use regex::Regex;

use crate::scanner;

lazy_static! {
    static ref CHAPTER_HEAD: Regex = Regex::new(r"(?i)^BAB\s+([IVXLCDM]+|\d+)\b").unwrap();
    static ref CHAPTER_BARE: Regex = Regex::new(r"(?i)^BAB\s+([IVXLCDM]+|\d+)\s*[:\-]?\s*$").unwrap();
    static ref PLACEHOLDER_HINT: Regex =
        Regex::new(r"(?i)TULISKAN|KETIK|JUDUL\s+BAB|\[[^\]]*\]|___+|\.\.\.+").unwrap();
}

/// Canonical titles used when the draft gives no usable one.
static STANDARD_TITLES: &[(u32, &str)] = &[
    (1, "PENDAHULUAN"),
    (2, "TINJAUAN PUSTAKA"),
    (3, "METODOLOGI PENELITIAN"),
    (4, "HASIL DAN PEMBAHASAN"),
    (5, "PENUTUP"),
    (6, "KESIMPULAN DAN SARAN"),
];

#[derive(Debug, Clone)]
struct ChapterHeading {
    position: usize,
    chapter_num: u32,
    is_placeholder: bool,
    text: String,
}

fn chapter_number_of(text: &str) -> Option<u32> {
    let flat = text.trim().replace('\n', " ");
    let caps = CHAPTER_HEAD.captures(&flat)?;
    let numeral = &caps[1];
    scanner::roman_to_int(numeral).or_else(|| numeral.parse().ok())
}

fn collect_headings(doc: &DocxDocument) -> Vec<ChapterHeading> {
    doc.paragraphs
        .iter()
        .enumerate()
        .filter_map(|(position, p)| {
            let text = p.text.trim();
            // TOC listing lines repeat chapter headings without being
            // duplicates of them
            if scanner::looks_like_toc_entry(text) {
                return None;
            }
            let chapter_num = chapter_number_of(text)?;
            let flat = text.replace('\n', " ");
            let is_placeholder =
                CHAPTER_BARE.is_match(&flat) || PLACEHOLDER_HINT.is_match(&flat);
            Some(ChapterHeading {
                position,
                chapter_num,
                is_placeholder,
                text: text.to_string(),
            })
        })
        .collect()
}

fn has_duplicates(headings: &[ChapterHeading]) -> bool {
    let mut seen = std::collections::HashSet::new();
    headings.iter().any(|h| !seen.insert(h.chapter_num))
}

fn standard_title(chapter_num: u32) -> Option<&'static str> {
    STANDARD_TITLES
        .iter()
        .find(|(n, _)| *n == chapter_num)
        .map(|(_, t)| *t)
}

fn group_by_number(headings: &[ChapterHeading]) -> BTreeMap<u32, Vec<ChapterHeading>> {
    let mut groups: BTreeMap<u32, Vec<ChapterHeading>> = BTreeMap::new();
    for heading in headings {
        groups.entry(heading.chapter_num).or_default().push(heading.clone());
    }
    groups
}

/// Pairwise strategy: within each chapter number, placeholders take over
/// their titled partner's text in document order, then the titled paragraph
/// is removed. Pairing never crosses chapter numbers.
fn resolve_pairwise(doc: &mut DocxDocument, groups: &[&Vec<ChapterHeading>]) -> usize {
    let mut delete: Vec<usize> = Vec::new();
    for group in groups {
        let placeholders = group.iter().filter(|h| h.is_placeholder);
        let titled = group.iter().filter(|h| !h.is_placeholder);
        for (placeholder, replacement) in placeholders.zip(titled) {
            doc.paragraphs[placeholder.position].text = replacement.text.clone();
            delete.push(replacement.position);
        }
    }
    delete.sort_unstable();
    for position in delete.iter().rev() {
        doc.paragraphs.remove(*position);
    }
    delete.len()
}

/// Canonical strategy: keep the first heading per chapter number, rewrite it
/// to a standard title, blank the rest, then compact the blanked positions.
fn resolve_canonical(doc: &mut DocxDocument, headings: &[ChapterHeading]) -> usize {
    let mut first_seen: std::collections::HashMap<u32, usize> = std::collections::HashMap::new();
    let mut blanked: Vec<usize> = Vec::new();

    for heading in headings {
        if first_seen.contains_key(&heading.chapter_num) {
            doc.paragraphs[heading.position].text.clear();
            blanked.push(heading.position);
        } else {
            first_seen.insert(heading.chapter_num, heading.position);
            if let Some(title) = standard_title(heading.chapter_num) {
                doc.paragraphs[heading.position].text = format!(
                    "BAB {}\n{}",
                    scanner::int_to_roman(heading.chapter_num),
                    title
                );
            }
        }
    }

    blanked.sort_unstable();
    for position in blanked.iter().rev() {
        doc.paragraphs.remove(*position);
    }
    blanked.len()
}

/// Collapse duplicated chapter headings. Returns the number of paragraphs
/// removed; zero when no chapter number repeats.
pub fn resolve_duplicates(doc: &mut DocxDocument) -> usize {
    let headings = collect_headings(doc);
    if !has_duplicates(&headings) {
        return 0;
    }

    let groups = group_by_number(&headings);
    let duplicated: Vec<&Vec<ChapterHeading>> =
        groups.values().filter(|group| group.len() > 1).collect();
    let pairwise_applicable = duplicated.iter().all(|group| {
        let placeholders = group.iter().filter(|h| h.is_placeholder).count();
        placeholders > 0 && placeholders * 2 == group.len()
    });

    let removed = if pairwise_applicable {
        tracing::debug!(
            chapters = duplicated.len(),
            "resolving duplicate chapters pairwise"
        );
        resolve_pairwise(doc, &duplicated)
    } else {
        tracing::debug!(
            headings = headings.len(),
            "resolving duplicate chapters by canonical title"
        );
        resolve_canonical(doc, &headings)
    };
    tracing::info!(removed, "duplicate chapter resolution complete");
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_package::Paragraph;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pairwise_replacement() {
        let mut doc = DocxDocument::empty();
        doc.paragraphs = vec![
            Paragraph::new("BAB II TULISKAN JUDUL BAB DI SINI"),
            Paragraph::new("Isi templat."),
            Paragraph::new("BAB II\nTINJAUAN PUSTAKA"),
        ];
        let removed = resolve_duplicates(&mut doc);
        assert_eq!(removed, 1);
        assert_eq!(doc.paragraphs.len(), 2);
        // The placeholder position carries the proper title now
        assert_eq!(doc.paragraphs[0].text, "BAB II\nTINJAUAN PUSTAKA");
        assert_eq!(doc.paragraphs[1].text, "Isi templat.");
    }

    #[test]
    fn test_one_heading_per_number_remains() {
        let mut doc = DocxDocument::empty();
        doc.paragraphs = vec![
            Paragraph::new("BAB I\nPENDAHULUAN"),
            Paragraph::new("Isi bab satu."),
            Paragraph::new("BAB II TULISKAN JUDUL BAB DI SINI"),
            Paragraph::new("Isi templat."),
            Paragraph::new("BAB II\nTINJAUAN PUSTAKA"),
            Paragraph::new("Isi bab dua."),
        ];
        let before = doc.paragraphs.len();
        let removed = resolve_duplicates(&mut doc);
        assert_eq!(removed, 1);
        assert_eq!(doc.paragraphs.len(), before - 1);

        let bab2: Vec<&str> = doc
            .paragraphs
            .iter()
            .map(|p| p.text.as_str())
            .filter(|t| t.to_uppercase().starts_with("BAB II"))
            .collect();
        assert_eq!(bab2.len(), 1);
        assert!(bab2[0].contains("TINJAUAN PUSTAKA"));
        assert!(!bab2[0].contains("TULISKAN"));
    }

    #[test]
    fn test_pairwise_pairs_within_chapter_number() {
        // Placeholders and titled headings interleaved across two chapter
        // numbers: pairing must follow the number, not the list order.
        let mut doc = DocxDocument::empty();
        doc.paragraphs = vec![
            Paragraph::new("BAB II"),
            Paragraph::new("BAB V\nPENUTUP"),
            Paragraph::new("BAB V"),
            Paragraph::new("BAB II\nTINJAUAN PUSTAKA"),
        ];
        let removed = resolve_duplicates(&mut doc);
        assert_eq!(removed, 2);
        assert_eq!(doc.paragraphs.len(), 2);
        assert_eq!(doc.paragraphs[0].text, "BAB II\nTINJAUAN PUSTAKA");
        assert_eq!(doc.paragraphs[1].text, "BAB V\nPENUTUP");
    }

    #[test]
    fn test_canonical_fallback_on_count_mismatch() {
        let mut doc = DocxDocument::empty();
        doc.paragraphs = vec![
            Paragraph::new("BAB II"),
            Paragraph::new("BAB II\nTINJAUAN PUSTAKA"),
            Paragraph::new("BAB II TEORI LAMA"),
            Paragraph::new("Isi bab."),
        ];
        // One placeholder, two titled: counts mismatch, canonical dedupe runs
        let removed = resolve_duplicates(&mut doc);
        assert_eq!(removed, 2);
        assert_eq!(doc.paragraphs.len(), 2);
        assert_eq!(doc.paragraphs[0].text, "BAB II\nTINJAUAN PUSTAKA");
        assert_eq!(doc.paragraphs[1].text, "Isi bab.");
    }

    #[test]
    fn test_toc_listing_lines_are_not_headings() {
        let mut doc = DocxDocument::empty();
        doc.paragraphs = vec![
            Paragraph::new("BAB I PENDAHULUAN\t1"),
            Paragraph::new("BAB I PENDAHULUAN"),
        ];
        assert_eq!(resolve_duplicates(&mut doc), 0);
        assert_eq!(doc.paragraphs.len(), 2);
    }

    #[test]
    fn test_no_duplicates_is_a_no_op() {
        let mut doc = DocxDocument::empty();
        doc.paragraphs = vec![
            Paragraph::new("BAB I\nPENDAHULUAN"),
            Paragraph::new("BAB II\nTINJAUAN PUSTAKA"),
        ];
        assert_eq!(resolve_duplicates(&mut doc), 0);
        assert_eq!(doc.paragraphs.len(), 2);
    }

    #[test]
    fn test_legitimate_empty_paragraphs_survive_compaction() {
        let mut doc = DocxDocument::empty();
        doc.paragraphs = vec![
            Paragraph::new(""),
            Paragraph::new("BAB III"),
            Paragraph::new("BAB III METODE USANG"),
            Paragraph::new("BAB III\nMETODOLOGI PENELITIAN"),
            Paragraph::new(""),
        ];
        let removed = resolve_duplicates(&mut doc);
        assert_eq!(removed, 2);
        // Only the blanked duplicates disappear, not the empty spacers
        assert_eq!(doc.paragraphs.len(), 3);
        assert_eq!(doc.paragraphs[0].text, "");
        assert_eq!(doc.paragraphs[1].text, "BAB III\nMETODOLOGI PENELITIAN");
        assert_eq!(doc.paragraphs[2].text, "");
    }
}
