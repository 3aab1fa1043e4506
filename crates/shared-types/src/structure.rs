//! Structural pattern types produced by template analysis.
//!
//! A scanned template becomes an ordered sequence of [`PatternMatch`] values,
//! one per classified paragraph, plus a [`DocumentZones`] partition of the
//! paragraph sequence into front matter, main body and back matter.

use serde::{Deserialize, Serialize};

/// Classification assigned to a single template paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// Top-level chapter heading ("BAB I PENDAHULUAN")
    Chapter,
    /// Dotted-numbered or keyword subsection heading ("1.1 Latar Belakang")
    Subsection,
    /// Instructional text the generator must replace or remove
    Placeholder,
    /// Front-matter section header ("DAFTAR ISI", "ABSTRAK")
    FrontMatterMarker,
}

/// Kind-specific detail extracted by a recognizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternMetadata {
    /// Chapter number resolved from roman or arabic numerals
    pub chapter_num: Option<u32>,
    /// Original roman numeral, when the heading used one
    pub roman: Option<String>,
    /// Full dotted subsection number, e.g. "1.2.3"
    pub full_number: Option<String>,
    /// Nesting depth: 1 for chapters, 2 for "1.1", 3 for "1.1.1"
    pub depth: Option<u8>,
    /// Title with the numbering prefix stripped
    pub title: Option<String>,
    /// Name of the recognizer that produced this match
    pub recognizer: String,
}

/// One classified paragraph in a document snapshot.
///
/// `position` is the paragraph's index in the snapshot it was scanned from;
/// it is stale as soon as the underlying document is mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub position: usize,
    pub kind: PatternKind,
    pub text: String,
    /// In [0, 1]; strictly higher for more specific recognizers
    pub confidence: f64,
    pub metadata: PatternMetadata,
}

/// Partition of a paragraph sequence into front matter / main body / back matter.
///
/// Invariant: `front_matter_end <= main_content_start <= back_matter_start
/// <= paragraph_count`. `main_content_start` is `None` when no chapter
/// heading survives the TOC-entry exclusion; content insertion must then
/// fail rather than write into the front matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentZones {
    pub front_matter_end: usize,
    pub main_content_start: Option<usize>,
    pub back_matter_start: usize,
    pub paragraph_count: usize,
}

impl DocumentZones {
    /// True when `position` lies in the main content span.
    pub fn in_main_content(&self, position: usize) -> bool {
        match self.main_content_start {
            Some(start) => position >= start && position < self.back_matter_start,
            None => false,
        }
    }
}

/// What kind of paragraph an insertion point sits after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertionKind {
    AfterSubsectionHeading,
    Placeholder,
    ContentZone,
}

/// A position after which generated chapter content may be inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertionPoint {
    pub position: usize,
    pub kind: InsertionKind,
    /// Leading text of the anchor paragraph, for diagnostics
    pub snippet: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_main_content_bounds() {
        let zones = DocumentZones {
            front_matter_end: 10,
            main_content_start: Some(12),
            back_matter_start: 40,
            paragraph_count: 50,
        };
        assert!(!zones.in_main_content(11));
        assert!(zones.in_main_content(12));
        assert!(zones.in_main_content(39));
        assert!(!zones.in_main_content(40));
    }

    #[test]
    fn test_no_main_content_rejects_everything() {
        let zones = DocumentZones {
            front_matter_end: 10,
            main_content_start: None,
            back_matter_start: 50,
            paragraph_count: 50,
        };
        assert!(!zones.in_main_content(20));
    }
}
