//! Plain-text to markdown normalization.
//!
//! Raw manuscript text carries manual numbering ("1.1", "A.", "IV.") and
//! chapter lines in free form. The converter downstream maps `#` to the
//! chapter heading style and `##` to subsections, so numbering is stripped
//! here and re-applied by the document styles.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Manual numbering prefixes: "1.1 ", "1.2.3. ", "A. ", "IV. "
    static ref MANUAL_NUMBERING: Regex =
        Regex::new(r"^(\d+(\.\d+)*\.?|[A-Z]\.|[IVX]+\.)\s+").unwrap();
    static ref CHAPTER_LINE: Regex = Regex::new(r"(?i)^BAB\s+[IVX\d]+").unwrap();
    static ref DASH_SPLIT: Regex = Regex::new(r"[-\u{2014}]").unwrap();
}

/// Un-numbered subsection titles common in Indonesian theses.
const KEYWORD_SUBSECTIONS: &[&str] = &[
    "latar belakang",
    "rumusan masalah",
    "tujuan penelitian",
    "manfaat penelitian",
];

/// Convert raw manuscript text to markdown with `#`/`##` headings.
pub fn normalize_text_to_markdown(text: &str) -> String {
    let mut md: Vec<String> = Vec::new();

    for raw in text.lines() {
        let line = raw.trim();

        if line.is_empty() {
            md.push(String::new());
            continue;
        }

        if CHAPTER_LINE.is_match(line) {
            // "BAB I - Pendahuluan" splits into a heading with a soft break
            if let Some(dash) = DASH_SPLIT.find(line) {
                let bab_part = line[..dash.start()].trim().to_uppercase();
                let title_part = line[dash.end()..].trim().to_uppercase();
                md.push(format!("# {}  \n{}", bab_part, title_part));
            } else {
                md.push(format!("# {}", line.to_uppercase()));
            }
            continue;
        }

        let clean = MANUAL_NUMBERING.replace(line, "").trim().to_string();
        let was_numbered = MANUAL_NUMBERING.is_match(line);

        if was_numbered && !clean.is_empty() && is_title_like(&clean) {
            md.push(format!("## {}", clean));
            continue;
        }

        if KEYWORD_SUBSECTIONS.contains(&clean.to_lowercase().as_str()) {
            md.push(format!("## {}", to_title_case(&clean)));
            continue;
        }

        md.push(line.to_string());
    }

    md.join("\n\n")
}

/// A line reads like a section title when it starts with a capital and is
/// either fully title-cased or a multi-word phrase.
fn is_title_like(text: &str) -> bool {
    let mut chars = text.chars();
    let first_upper = chars.next().map(|c| c.is_uppercase()).unwrap_or(false);
    if !first_upper {
        return false;
    }
    let all_words_capitalized = text.split_whitespace().all(|w| {
        w.chars()
            .next()
            .map(|c| c.is_uppercase() || !c.is_alphabetic())
            .unwrap_or(false)
    });
    all_words_capitalized || text.contains(' ')
}

fn to_title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_chapter_line_becomes_h1_uppercase() {
        let md = normalize_text_to_markdown("bab i pendahuluan");
        assert_eq!(md, "# BAB I PENDAHULUAN");
    }

    #[test]
    fn test_dashed_chapter_splits_with_soft_break() {
        let md = normalize_text_to_markdown("BAB II - Tinjauan Pustaka");
        assert_eq!(md, "# BAB II  \nTINJAUAN PUSTAKA");
    }

    #[test]
    fn test_numbered_title_becomes_h2_without_numbering() {
        let md = normalize_text_to_markdown("1.1 Latar Belakang");
        assert_eq!(md, "## Latar Belakang");
    }

    #[test]
    fn test_keyword_subsection_detected_without_numbering() {
        let md = normalize_text_to_markdown("rumusan masalah");
        assert_eq!(md, "## Rumusan Masalah");
    }

    #[test]
    fn test_numbered_sentence_stays_a_paragraph() {
        // Looks like a list item, not a heading
        let input = "1. penelitian ini menggunakan metode kualitatif";
        let md = normalize_text_to_markdown(input);
        assert_eq!(md, input);
    }

    #[test]
    fn test_paragraphs_joined_with_blank_lines() {
        let input = "BAB I PENDAHULUAN\n1.1 Latar Belakang\nTeks paragraf biasa di sini.";
        let md = normalize_text_to_markdown(input);
        assert_eq!(
            md,
            "# BAB I PENDAHULUAN\n\n## Latar Belakang\n\nTeks paragraf biasa di sini."
        );
    }

    #[test]
    fn test_blank_lines_preserved_as_separators() {
        let md = normalize_text_to_markdown("Satu.\n\nDua.");
        assert_eq!(md, "Satu.\n\n\n\nDua.");
    }
}
