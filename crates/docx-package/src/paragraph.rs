//! Paragraph-level document model.

/// Direct spacing overrides on a paragraph, in the package's native units
/// (twips for before/after, 240ths of a line for `line`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Spacing {
    pub before: Option<i64>,
    pub after: Option<i64>,
    pub line: Option<i64>,
}

/// One paragraph of the document body.
///
/// `text` carries run text with `\n` for soft line breaks and `\t` for tab
/// stops; the writer maps them back to the package's break and tab elements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Paragraph {
    pub text: String,
    /// Style identifier from the paragraph properties, if any
    pub style: Option<String>,
    /// Explicit outline level (0 = top-level chapter)
    pub outline_level: Option<u8>,
    pub page_break_before: bool,
    /// "both", "center", "left", "right"
    pub alignment: Option<String>,
    pub spacing: Spacing,
    /// First-line indent in twips
    pub first_line_indent: Option<i64>,
    /// (ilvl, numId) when the paragraph is a list item
    pub numbering: Option<(u32, u32)>,
    /// Field instruction for field paragraphs (e.g. a TOC field)
    pub field: Option<String>,
}

impl Paragraph {
    pub fn new(text: impl Into<String>) -> Self {
        Paragraph {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_style(text: impl Into<String>, style: impl Into<String>) -> Self {
        Paragraph {
            text: text.into(),
            style: Some(style.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.field.is_none()
    }

    pub fn is_list_item(&self) -> bool {
        self.numbering.is_some()
    }

    /// Style-name check used when deciding whether a paragraph is body text.
    pub fn has_style_containing(&self, needles: &[&str]) -> bool {
        match &self.style {
            Some(style) => {
                let lower = style.to_lowercase();
                needles.iter().any(|n| lower.contains(&n.to_lowercase()))
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_detection() {
        assert!(Paragraph::new("   ").is_empty());
        assert!(!Paragraph::new("BAB I").is_empty());

        let field = Paragraph {
            field: Some("TOC \\o \"1-1\"".to_string()),
            ..Default::default()
        };
        assert!(!field.is_empty());
    }

    #[test]
    fn test_style_containing() {
        let p = Paragraph::with_style("text", "IsiParagraf");
        assert!(p.has_style_containing(&["isi", "body"]));
        assert!(!p.has_style_containing(&["Heading"]));
    }
}
