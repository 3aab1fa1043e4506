//! Style configuration and front-matter metadata passed between
//! generation stages.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Page margins in twentieths of a point (twips), the unit the package
/// format stores them in. 1 cm = 567 twips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Margins {
    pub top: i64,
    pub bottom: i64,
    pub left: i64,
    pub right: i64,
}

impl Margins {
    pub fn from_cm(top: f64, bottom: f64, left: f64, right: f64) -> Self {
        Margins {
            top: cm_to_twips(top),
            bottom: cm_to_twips(bottom),
            left: cm_to_twips(left),
            right: cm_to_twips(right),
        }
    }

    pub fn as_tuple(&self) -> [i64; 4] {
        [self.top, self.bottom, self.left, self.right]
    }
}

/// Convert centimeters to twips (1 cm = 566.93 twips).
pub fn cm_to_twips(cm: f64) -> i64 {
    (cm * 566.93).round() as i64
}

/// Paragraph-level defaults for body text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphDefaults {
    /// First-line indent in twips
    pub first_line_indent: i64,
    /// Line spacing in 240ths of a line (360 = 1.5 lines)
    pub line: i64,
    /// Space before/after in twips
    pub space_before: i64,
    pub space_after: i64,
    /// "both" for justified, per the package format
    pub alignment: String,
}

impl Default for ParagraphDefaults {
    fn default() -> Self {
        ParagraphDefaults {
            first_line_indent: cm_to_twips(1.0),
            line: 360,
            space_before: 0,
            space_after: 0,
            alignment: "both".to_string(),
        }
    }
}

/// Style configuration handed from template analysis to generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleConfig {
    pub margins: Margins,
    pub paragraph: ParagraphDefaults,
    /// Role name ("body", "chapter_heading") -> concrete style identifier
    pub style_mapping: HashMap<String, String>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        // Indonesian thesis standard: 4/3/4/3 cm margins
        StyleConfig {
            margins: Margins::from_cm(4.0, 3.0, 4.0, 3.0),
            paragraph: ParagraphDefaults::default(),
            style_mapping: HashMap::new(),
        }
    }
}

/// Front-matter metadata supplied with a generation request.
///
/// Every field is optional; a missing field degrades to an empty section
/// in the generated front matter, never a failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrontMatterInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    /// Student identifier (NIM)
    pub identifier: Option<String>,
    pub institution: Option<String>,
    pub year: Option<u32>,
    pub abstract_primary: Option<String>,
    pub abstract_secondary: Option<String>,
    pub keywords: Option<String>,
}

impl FrontMatterInfo {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.identifier.is_none()
            && self.institution.is_none()
            && self.year.is_none()
            && self.abstract_primary.is_none()
            && self.abstract_secondary.is_none()
            && self.keywords.is_none()
    }
}
