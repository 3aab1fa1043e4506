//! Content placer: merges converted draft chapters into a copy of the
//! reference template.
//!
//! The template copy is the output skeleton, so every template paragraph
//! survives unless placement consumes it. Draft chapter content lands at
//! the adapter's insertion points inside the matching chapter span: a
//! placeholder anchor is replaced in place, any other anchor keeps its
//! paragraph and the content follows it. Placeholder paragraphs in a span
//! that received content are consumed. The whole pass builds a fresh
//! paragraph sequence in one left-to-right walk.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};

use docx_package::{DocxDocument, Paragraph};
use serde::Serialize;
use shared_types::{InsertionKind, PatternKind};

use crate::adapter::TemplateAnalysis;
use crate::heuristics::{ALL_CAPS_MAX_LEN, ALL_CAPS_MIN_LEN};
use crate::scanner;
use crate::EngineError;

/// Outcome of one placement run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlacementSummary {
    pub chapters_placed: usize,
    pub paragraphs_inserted: usize,
    pub placeholders_consumed: usize,
    /// Draft chapter numbers without a template counterpart; their content
    /// is appended ahead of the back matter.
    pub unmatched_chapters: Vec<u32>,
}

#[derive(Debug)]
struct DraftChapter {
    heading_text: String,
    titled: bool,
    content: Vec<Paragraph>,
}

fn is_placeholder_title(title: &str) -> bool {
    scanner::classify(0, title).map(|m| m.kind) == Some(PatternKind::Placeholder)
}

fn looks_like_title(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.chars().any(|c| c.is_alphabetic())
        && !trimmed.chars().any(|c| c.is_lowercase())
        && trimmed.len() > ALL_CAPS_MIN_LEN
        && trimmed.len() < ALL_CAPS_MAX_LEN
        && scanner::classify(0, trimmed).map(|m| m.kind) != Some(PatternKind::Chapter)
}

/// Group the draft into one entry per chapter number. A bare marker adopts
/// the all-caps title on the next line; a repeated marker (converter
/// artifact) keeps the titled heading and concatenates the content.
fn collect_draft_chapters(draft: &DocxDocument) -> BTreeMap<u32, DraftChapter> {
    let marks: Vec<(usize, u32, Option<String>)> = scanner::scan(&draft.paragraphs)
        .into_iter()
        .filter(|m| m.kind == PatternKind::Chapter)
        .filter_map(|m| {
            m.metadata
                .chapter_num
                .map(|n| (m.position, n, m.metadata.title))
        })
        .collect();

    let mut chapters: BTreeMap<u32, DraftChapter> = BTreeMap::new();
    for (i, (position, num, title)) in marks.iter().enumerate() {
        let span_end = marks
            .get(i + 1)
            .map(|(p, _, _)| *p)
            .unwrap_or(draft.paragraphs.len());
        let mut heading_text = draft.paragraphs[*position].text.trim().to_string();
        let mut content_start = *position + 1;

        if title.is_none() {
            if let Some(next) = draft.paragraphs.get(content_start) {
                if looks_like_title(&next.text) {
                    heading_text = format!("{}\n{}", heading_text, next.text.trim());
                    content_start += 1;
                }
            }
        }
        let titled = match title {
            Some(t) => !is_placeholder_title(t),
            None => heading_text.contains('\n'),
        };
        let content: Vec<Paragraph> = draft.paragraphs[content_start..span_end]
            .iter()
            .filter(|p| !p.is_empty())
            .cloned()
            .collect();

        match chapters.entry(*num) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                if titled && !existing.titled {
                    existing.heading_text = heading_text;
                    existing.titled = true;
                }
                existing.content.extend(content);
            }
            Entry::Vacant(entry) => {
                entry.insert(DraftChapter {
                    heading_text,
                    titled,
                    content,
                });
            }
        }
    }
    chapters
}

/// Place draft chapter content into a copy of the template. The template is
/// never mutated; the returned document carries its full paragraph sequence
/// with content merged in and consumed placeholders removed.
pub fn place_content(
    template: &DocxDocument,
    draft: &DocxDocument,
    analysis: &TemplateAnalysis,
) -> Result<(DocxDocument, PlacementSummary), EngineError> {
    let drafts = collect_draft_chapters(draft);
    let mut summary = PlacementSummary::default();

    let mut retitle: HashMap<usize, String> = HashMap::new();
    let mut consumed: HashSet<usize> = HashSet::new();
    let mut replace_at: HashMap<usize, Vec<Paragraph>> = HashMap::new();
    let mut insert_after: HashMap<usize, Vec<Paragraph>> = HashMap::new();
    let mut appended: Vec<Paragraph> = Vec::new();

    for (num, chapter) in &drafts {
        let points = analysis.insertion_points(*num)?;
        let heading = match analysis
            .chapters
            .iter()
            .find(|c| c.metadata.chapter_num == Some(*num))
        {
            Some(h) => h,
            None => {
                tracing::warn!(chapter = *num, "draft chapter has no template counterpart");
                summary.unmatched_chapters.push(*num);
                summary.paragraphs_inserted += chapter.content.len();
                appended.push(Paragraph::new(chapter.heading_text.as_str()));
                appended.extend(chapter.content.iter().cloned());
                continue;
            }
        };

        // A template heading still carrying instructional text yields its
        // position to the draft's real title.
        let template_title_pending = match &heading.metadata.title {
            Some(title) => is_placeholder_title(title),
            None => true,
        };
        if chapter.titled && template_title_pending {
            retitle.insert(heading.position, chapter.heading_text.clone());
        }

        if chapter.content.is_empty() {
            continue;
        }
        for point in points.iter().filter(|p| p.kind == InsertionKind::Placeholder) {
            consumed.insert(point.position);
        }
        let anchor = points
            .first()
            .map(|p| p.position)
            .unwrap_or(heading.position);
        summary.paragraphs_inserted += chapter.content.len();
        summary.chapters_placed += 1;
        if consumed.contains(&anchor) {
            replace_at.insert(anchor, chapter.content.clone());
        } else {
            insert_after.insert(anchor, chapter.content.clone());
        }
    }

    let mut merged = template.clone();
    let mut paragraphs: Vec<Paragraph> =
        Vec::with_capacity(template.paragraphs.len() + summary.paragraphs_inserted);
    let append_before = analysis
        .zones
        .back_matter_start
        .min(template.paragraphs.len());

    for (i, paragraph) in template.paragraphs.iter().enumerate() {
        if i == append_before && !appended.is_empty() {
            paragraphs.append(&mut appended);
        }
        if let Some(text) = retitle.get(&i) {
            let mut heading = paragraph.clone();
            heading.text = text.clone();
            paragraphs.push(heading);
        } else if consumed.contains(&i) {
            summary.placeholders_consumed += 1;
            if let Some(block) = replace_at.remove(&i) {
                paragraphs.extend(block);
            }
            continue;
        } else {
            paragraphs.push(paragraph.clone());
        }
        if let Some(block) = insert_after.remove(&i) {
            paragraphs.extend(block);
        }
    }
    // Unmatched chapters land at the end when the template has no back matter
    paragraphs.append(&mut appended);
    merged.paragraphs = paragraphs;

    tracing::info!(
        chapters = summary.chapters_placed,
        inserted = summary.paragraphs_inserted,
        consumed = summary.placeholders_consumed,
        unmatched = summary.unmatched_chapters.len(),
        "content placement complete"
    );
    Ok((merged, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn template() -> DocxDocument {
        let mut doc = DocxDocument::empty();
        doc.paragraphs = vec![
            Paragraph::new("DAFTAR ISI"),
            Paragraph::new("BAB I PENDAHULUAN\t1"),
            Paragraph::new("BAB I TULISKAN JUDUL BAB DI SINI"),
            Paragraph::new("1.1 Latar Belakang"),
            Paragraph::new("TULISKAN latar belakang penelitian di sini"),
            Paragraph::new("BAB II TINJAUAN PUSTAKA"),
            Paragraph::new("2.1 Landasan Teori"),
            Paragraph::new("DAFTAR PUSTAKA"),
        ];
        doc
    }

    fn draft() -> DocxDocument {
        let mut doc = DocxDocument::empty();
        doc.paragraphs = vec![
            Paragraph::new("BAB I"),
            Paragraph::new("PENDAHULUAN"),
            Paragraph::new("Latar belakang penelitian diuraikan di sini."),
            Paragraph::new("BAB II\nTINJAUAN PUSTAKA"),
            Paragraph::new("Teori pendukung dirangkum."),
        ];
        doc
    }

    #[test]
    fn test_template_text_survives_and_placeholders_are_consumed() {
        let template = template();
        let analysis = TemplateAnalysis::analyze(&template);
        let (merged, summary) = place_content(&template, &draft(), &analysis).unwrap();

        let texts: Vec<&str> = merged.paragraphs.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "DAFTAR ISI",
                "BAB I PENDAHULUAN\t1",
                "BAB I\nPENDAHULUAN",
                "1.1 Latar Belakang",
                "Latar belakang penelitian diuraikan di sini.",
                "BAB II TINJAUAN PUSTAKA",
                "2.1 Landasan Teori",
                "Teori pendukung dirangkum.",
                "DAFTAR PUSTAKA",
            ]
        );
        assert_eq!(summary.chapters_placed, 2);
        assert_eq!(summary.paragraphs_inserted, 2);
        assert_eq!(summary.placeholders_consumed, 1);
        assert!(summary.unmatched_chapters.is_empty());
    }

    #[test]
    fn test_titled_template_heading_is_kept() {
        let template = template();
        let analysis = TemplateAnalysis::analyze(&template);
        let (merged, _) = place_content(&template, &draft(), &analysis).unwrap();

        // Chapter two already carries a real title, the draft's does not win
        assert!(merged
            .paragraphs
            .iter()
            .any(|p| p.text == "BAB II TINJAUAN PUSTAKA"));
    }

    #[test]
    fn test_unmatched_chapter_appends_before_back_matter() {
        let template = template();
        let analysis = TemplateAnalysis::analyze(&template);
        let mut draft = draft();
        draft.paragraphs.push(Paragraph::new("BAB III\nMETODOLOGI PENELITIAN"));
        draft.paragraphs.push(Paragraph::new("Metode penelitian dijelaskan."));

        let (merged, summary) = place_content(&template, &draft, &analysis).unwrap();
        assert_eq!(summary.unmatched_chapters, vec![3]);

        let texts: Vec<&str> = merged.paragraphs.iter().map(|p| p.text.as_str()).collect();
        let bab3 = texts
            .iter()
            .position(|t| *t == "BAB III\nMETODOLOGI PENELITIAN")
            .unwrap();
        let back = texts.iter().position(|t| *t == "DAFTAR PUSTAKA").unwrap();
        assert!(bab3 < back);
        assert_eq!(texts[bab3 + 1], "Metode penelitian dijelaskan.");
    }

    #[test]
    fn test_no_main_content_is_an_error() {
        let mut template = DocxDocument::empty();
        template.paragraphs = vec![
            Paragraph::new("DAFTAR ISI"),
            Paragraph::new("BAB I PENDAHULUAN\t1"),
        ];
        let analysis = TemplateAnalysis::analyze(&template);
        assert!(matches!(
            place_content(&template, &draft(), &analysis),
            Err(EngineError::NoMainContent)
        ));
    }

    #[test]
    fn test_chapterless_draft_leaves_template_untouched() {
        let template = template();
        let analysis = TemplateAnalysis::analyze(&template);
        let mut draft = DocxDocument::empty();
        draft.paragraphs = vec![Paragraph::new("Catatan lepas tanpa struktur bab.")];

        let (merged, summary) = place_content(&template, &draft, &analysis).unwrap();
        assert_eq!(merged.paragraphs, template.paragraphs);
        assert_eq!(summary.chapters_placed, 0);
        assert_eq!(summary.paragraphs_inserted, 0);
    }
}
