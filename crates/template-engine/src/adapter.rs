//! Template adapter: composes the scanner and zone classifier into a
//! queryable structural model of a reference template.

use std::collections::HashMap;

use docx_package::DocxDocument;
use serde::Serialize;
use shared_types::{DocumentZones, InsertionKind, InsertionPoint, PatternKind, PatternMatch};

use crate::scanner;
use crate::zones::classify_zones;
use crate::EngineError;

/// Style names hinting that a paragraph carries body content.
const BODY_STYLE_KEYWORDS: &[&str] = &["isi", "paragraf", "body", "content"];

/// A short instructional line in a body-styled paragraph marks a zone where
/// generated content belongs.
const CONTENT_ZONE_MAX_LEN: usize = 100;
const BODY_SAMPLE_MIN_LEN: usize = 50;

/// Resolved font defaults for a style role.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontSummary {
    pub name: String,
    pub size: f64,
}

/// Immutable structural model of one template snapshot.
///
/// Built once per uploaded template; positions refer to the snapshot the
/// analysis was taken from and are stale after any mutation.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateAnalysis {
    pub template_type: String,
    pub chapters: Vec<PatternMatch>,
    pub subsections: Vec<PatternMatch>,
    pub placeholders: Vec<PatternMatch>,
    /// Positions of short body-styled instruction lines, with a snippet
    pub content_zones: Vec<(usize, String)>,
    pub zones: DocumentZones,
    pub style_mapping: HashMap<String, String>,
    pub font_info: HashMap<String, FontSummary>,
}

impl TemplateAnalysis {
    /// Analyze a template document. Pure function of the document content.
    pub fn analyze(doc: &DocxDocument) -> TemplateAnalysis {
        let matches = scanner::scan(&doc.paragraphs);
        let zones = classify_zones(&doc.paragraphs, &matches);

        let mut chapters = Vec::new();
        let mut subsections = Vec::new();
        let mut placeholders = Vec::new();
        for m in matches {
            match m.kind {
                PatternKind::Chapter => chapters.push(m),
                PatternKind::Subsection => subsections.push(m),
                PatternKind::Placeholder => placeholders.push(m),
                PatternKind::FrontMatterMarker => {}
            }
        }
        chapters.sort_by_key(|c| c.metadata.chapter_num.unwrap_or(0));

        let style_mapping = extract_style_mapping(doc);
        let font_info = extract_font_info(doc, &style_mapping);
        let content_zones = detect_content_zones(doc, &zones);
        let template_type = identify_template_type(doc);

        tracing::info!(
            template_type,
            chapters = chapters.len(),
            subsections = subsections.len(),
            placeholders = placeholders.len(),
            "template analysis complete"
        );

        TemplateAnalysis {
            template_type,
            chapters,
            subsections,
            placeholders,
            content_zones,
            zones,
            style_mapping,
            font_info,
        }
    }

    /// Positions after which generated content for `chapter_num` may be
    /// inserted. Restricted to the span between that chapter's heading and
    /// the next chapter, and always inside the main content zone.
    pub fn insertion_points(&self, chapter_num: u32) -> Result<Vec<InsertionPoint>, EngineError> {
        if self.zones.main_content_start.is_none() {
            return Err(EngineError::NoMainContent);
        }

        let chapter = match self
            .chapters
            .iter()
            .find(|c| c.metadata.chapter_num == Some(chapter_num))
        {
            Some(c) => c,
            None => return Ok(Vec::new()),
        };
        let span_start = chapter.position + 1;
        let span_end = self
            .chapters
            .iter()
            .map(|c| c.position)
            .filter(|&p| p > chapter.position)
            .min()
            .unwrap_or(self.zones.back_matter_start)
            .min(self.zones.back_matter_start);

        let in_span = |pos: usize| {
            pos >= span_start && pos < span_end && self.zones.in_main_content(pos)
        };

        let mut points = Vec::new();
        for s in self.subsections.iter().filter(|s| in_span(s.position)) {
            points.push(InsertionPoint {
                position: s.position,
                kind: InsertionKind::AfterSubsectionHeading,
                snippet: snippet_of(&s.text),
            });
        }
        for p in self.placeholders.iter().filter(|p| in_span(p.position)) {
            points.push(InsertionPoint {
                position: p.position,
                kind: InsertionKind::Placeholder,
                snippet: snippet_of(&p.text),
            });
        }
        for (pos, text) in self.content_zones.iter().filter(|(pos, _)| in_span(*pos)) {
            if points.iter().any(|pt| pt.position == *pos) {
                continue;
            }
            points.push(InsertionPoint {
                position: *pos,
                kind: InsertionKind::ContentZone,
                snippet: snippet_of(text),
            });
        }
        points.sort_by_key(|p| p.position);
        Ok(points)
    }
}

fn snippet_of(text: &str) -> String {
    text.chars().take(50).collect()
}

fn style_name_of(doc: &DocxDocument, style_id: &str) -> String {
    doc.styles
        .get(style_id)
        .map(|s| s.name.clone())
        .unwrap_or_else(|| style_id.to_string())
}

/// Map style roles to concrete style identifiers by sampling how the
/// template actually uses its styles.
fn extract_style_mapping(doc: &DocxDocument) -> HashMap<String, String> {
    let mut mapping = HashMap::new();

    for p in &doc.paragraphs {
        let style_id = match &p.style {
            Some(s) => s,
            None => continue,
        };
        let name = style_name_of(doc, style_id).to_lowercase();
        let text = p.text.trim();

        if !mapping.contains_key("body")
            && BODY_STYLE_KEYWORDS.iter().any(|k| name.contains(k))
            && text.len() > BODY_SAMPLE_MIN_LEN
        {
            mapping.insert("body".to_string(), style_id.clone());
        }
        if name.contains("heading") {
            if scanner::classify(0, text).map(|m| m.kind) == Some(PatternKind::Chapter) {
                mapping
                    .entry("chapter_heading".to_string())
                    .or_insert_with(|| style_id.clone());
            } else if scanner::classify(0, text).map(|m| m.kind) == Some(PatternKind::Subsection) {
                mapping
                    .entry("subsection_heading".to_string())
                    .or_insert_with(|| style_id.clone());
            }
        }
    }
    mapping
}

fn extract_font_info(
    doc: &DocxDocument,
    style_mapping: &HashMap<String, String>,
) -> HashMap<String, FontSummary> {
    let mut info = HashMap::new();

    let default_style = style_mapping
        .get("body")
        .cloned()
        .or_else(|| doc.styles.find_by_name("normal").map(|s| s.style_id.clone()));
    let font = match default_style {
        Some(id) => doc.styles.resolved_font(&id),
        None => docx_package::FontInfo::default(),
    };
    info.insert(
        "default".to_string(),
        FontSummary {
            name: font.name,
            size: font.size,
        },
    );

    if let Some(id) = style_mapping.get("chapter_heading") {
        let font = doc.styles.resolved_font(id);
        info.insert(
            "heading".to_string(),
            FontSummary {
                name: font.name,
                size: font.size,
            },
        );
    }
    info
}

/// Body-styled paragraphs whose text is a short instruction line mark
/// content zones.
fn detect_content_zones(doc: &DocxDocument, zones: &DocumentZones) -> Vec<(usize, String)> {
    doc.paragraphs
        .iter()
        .enumerate()
        .filter(|(i, p)| {
            if !zones.in_main_content(*i) {
                return false;
            }
            let text = p.text.trim();
            if text.is_empty() || text.len() >= CONTENT_ZONE_MAX_LEN {
                return false;
            }
            match &p.style {
                Some(id) => {
                    let name = style_name_of(doc, id).to_lowercase();
                    BODY_STYLE_KEYWORDS.iter().any(|k| name.contains(k))
                }
                None => false,
            }
        })
        .map(|(i, p)| (i, p.text.trim().to_string()))
        .collect()
}

/// Heuristic profile discriminator based on institution names near the
/// start of the template.
fn identify_template_type(doc: &DocxDocument) -> String {
    let head: String = doc
        .paragraphs
        .iter()
        .take(100)
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase();

    if head.contains("UNIVERSITAS ISLAM INDONESIA") {
        "uii".to_string()
    } else if head.contains("UNIVERSITAS GADJAH MADA") {
        "ugm".to_string()
    } else if head.contains("UNIVERSITAS INDONESIA") {
        "ui".to_string()
    } else {
        "generic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_package::Paragraph;
    use pretty_assertions::assert_eq;

    fn template_doc() -> DocxDocument {
        let mut doc = DocxDocument::empty();
        doc.paragraphs = vec![
            Paragraph::new("DAFTAR ISI"),
            Paragraph::new("BAB I PENDAHULUAN\t1"),
            Paragraph::new("BAB I PENDAHULUAN"),
            Paragraph::new("1.1 Latar Belakang"),
            Paragraph::new("TULISKAN latar belakang penelitian di sini"),
            Paragraph::new("1.2 Rumusan Masalah"),
            Paragraph::new("BAB II TINJAUAN PUSTAKA"),
            Paragraph::new("2.1 Landasan Teori"),
            Paragraph::new("DAFTAR PUSTAKA"),
        ];
        doc
    }

    #[test]
    fn test_insertion_points_stay_inside_chapter_span() {
        let analysis = TemplateAnalysis::analyze(&template_doc());
        let main = analysis.zones.main_content_start.unwrap();
        assert_eq!(main, 2);

        let points = analysis.insertion_points(1).unwrap();
        let positions: Vec<usize> = points.iter().map(|p| p.position).collect();
        assert_eq!(positions, vec![3, 4, 5]);
        assert!(positions.iter().all(|&p| p > main && p < 6));

        let points = analysis.insertion_points(2).unwrap();
        let positions: Vec<usize> = points.iter().map(|p| p.position).collect();
        assert_eq!(positions, vec![7]);
    }

    #[test]
    fn test_unknown_chapter_yields_no_points() {
        let analysis = TemplateAnalysis::analyze(&template_doc());
        assert_eq!(analysis.insertion_points(9).unwrap(), Vec::new());
    }

    #[test]
    fn test_no_main_content_fails_loudly() {
        let mut doc = DocxDocument::empty();
        doc.paragraphs = vec![
            Paragraph::new("DAFTAR ISI"),
            Paragraph::new("BAB I PENDAHULUAN\t3"),
        ];
        let analysis = TemplateAnalysis::analyze(&doc);
        assert!(matches!(
            analysis.insertion_points(1),
            Err(EngineError::NoMainContent)
        ));
    }

    #[test]
    fn test_template_type_detection() {
        let mut doc = DocxDocument::empty();
        doc.paragraphs = vec![Paragraph::new("UNIVERSITAS ISLAM INDONESIA")];
        assert_eq!(identify_template_type(&doc), "uii");
        let mut doc = DocxDocument::empty();
        doc.paragraphs = vec![Paragraph::new("Politeknik Negeri Semarang")];
        assert_eq!(identify_template_type(&doc), "generic");
    }
}
