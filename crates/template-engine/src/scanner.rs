//! Paragraph pattern scanner.
//!
//! Walks a paragraph sequence and classifies each paragraph with an ordered
//! set of recognizers, most specific first. A paragraph that looks like a
//! table-of-contents listing line is excluded before any classification runs,
//! so TOC entries never masquerade as structural headings.

use docx_package::Paragraph;
use lazy_static::lazy_static;
use regex::Regex;
use shared_types::{PatternKind, PatternMatch, PatternMetadata};

lazy_static! {
    /// Chapter marker with a title on the same line.
    static ref CHAPTER_TITLED: Regex =
        Regex::new(r"(?i)^BAB\s+([IVXLCDM]+|\d+)\s*[:\-]?\s+(\S.*)$").unwrap();
    /// Bare chapter marker, title expected on the next line.
    static ref CHAPTER_BARE: Regex =
        Regex::new(r"(?i)^BAB\s+([IVXLCDM]+|\d+)\s*$").unwrap();
    static ref SUBSECTION_3LEVEL: Regex =
        Regex::new(r"^(\d+)\.(\d+)\.(\d+)\.?\s+(\S.*)$").unwrap();
    static ref SUBSECTION_2LEVEL: Regex =
        Regex::new(r"^(\d+)\.(\d+)\.?\s+(\S.*)$").unwrap();
    /// Dotted numeral missing its chapter part, e.g. ".2 Rumusan Masalah"
    static ref SUBSECTION_ORPHAN: Regex = Regex::new(r"^\.(\d+)\s+(\S.*)$").unwrap();
    /// Keyword marker with a title after it; a bare "Subbab" line is an
    /// empty placeholder, not a heading
    static ref SUBSECTION_KEYWORD: Regex =
        Regex::new(r"(?i)^(anak\s+)?sub-?(bab|section)\b\s+\S").unwrap();
    static ref TOC_ENTRY_TAIL: Regex = Regex::new(r"\s+\d{1,4}\s*$").unwrap();
    static ref ROMAN: Regex = Regex::new(r"(?i)^[IVXLCDM]+$").unwrap();
}

/// Instructional token list for placeholder detection, checked in order.
static PLACEHOLDER_RULES: &[(&str, &str, f64)] = &[
    (r"(?i)^TULISKAN\b", "instruction", 0.9),
    (r"(?i)^KETIKKAN?\b", "instruction", 0.9),
    (r"(?i)^ISIKAN\b", "instruction", 0.8),
    (r"\[[^\]]+\]", "brackets", 0.9),
    (r"___+", "underscores", 0.8),
    (r"\.\.\.+", "dots", 0.7),
    (r"(?i)^(anak\s+)?subbab\s*$", "empty_subsection", 0.8),
];

/// Front-matter section headers, matched case-insensitively on the whole line.
static FRONT_MATTER_MARKERS: &[&str] = &[
    "DAFTAR ISI",
    "DAFTAR GAMBAR",
    "DAFTAR TABEL",
    "DAFTAR LAMPIRAN",
    "KATA PENGANTAR",
    "HALAMAN PENGESAHAN",
    "LEMBAR PENGESAHAN",
    "PERNYATAAN KEASLIAN",
    "ABSTRAK",
    "ABSTRACT",
];

/// Back-matter section headers.
static BACK_MATTER_MARKERS: &[&str] = &["DAFTAR PUSTAKA", "LAMPIRAN"];

lazy_static! {
    static ref PLACEHOLDER_REGEXES: Vec<(Regex, &'static str, f64)> = PLACEHOLDER_RULES
        .iter()
        .map(|(p, name, conf)| (Regex::new(p).unwrap(), *name, *conf))
        .collect();
}

/// True for lines shaped like a table-of-contents listing entry: an embedded
/// tab stop, or trailing whitespace followed by a page number.
pub fn looks_like_toc_entry(text: &str) -> bool {
    text.contains('\t') || TOC_ENTRY_TAIL.is_match(text)
}

pub fn is_front_matter_marker(text: &str) -> bool {
    let upper = text.trim().to_uppercase();
    FRONT_MATTER_MARKERS.iter().any(|m| upper == *m)
}

pub fn is_back_matter_marker(text: &str) -> bool {
    let upper = text.trim().to_uppercase();
    BACK_MATTER_MARKERS.iter().any(|m| upper == *m)
}

/// Parse a roman numeral using subtractive notation. Returns `None` for
/// strings containing non-numeral characters.
pub fn roman_to_int(roman: &str) -> Option<u32> {
    if roman.is_empty() {
        return None;
    }
    let mut total: i64 = 0;
    let mut prev: i64 = 0;
    for c in roman.to_uppercase().chars().rev() {
        let val: i64 = match c {
            'I' => 1,
            'V' => 5,
            'X' => 10,
            'L' => 50,
            'C' => 100,
            'D' => 500,
            'M' => 1000,
            _ => return None,
        };
        if val < prev {
            total -= val;
        } else {
            total += val;
        }
        prev = val;
    }
    u32::try_from(total).ok()
}

/// Render a chapter number as the roman numeral used in standard headings.
pub fn int_to_roman(mut value: u32) -> String {
    const TABLE: &[(u32, &str)] = &[
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for (weight, digits) in TABLE {
        while value >= *weight {
            out.push_str(digits);
            value -= weight;
        }
    }
    out
}

fn parse_chapter_numeral(numeral: &str) -> (Option<u32>, Option<String>) {
    if ROMAN.is_match(numeral) {
        (roman_to_int(numeral), Some(numeral.to_uppercase()))
    } else {
        (numeral.parse().ok(), None)
    }
}

fn classify_chapter(position: usize, text: &str) -> Option<PatternMatch> {
    // Merged headings carry the title after a soft break
    let flat = text.replace(['\n', '\x0b'], " ");
    if let Some(caps) = CHAPTER_TITLED.captures(flat.trim()) {
        let (chapter_num, roman) = parse_chapter_numeral(&caps[1]);
        let num = chapter_num?;
        return Some(PatternMatch {
            position,
            kind: PatternKind::Chapter,
            text: text.to_string(),
            confidence: 1.0,
            metadata: PatternMetadata {
                chapter_num: Some(num),
                roman,
                depth: Some(1),
                title: Some(caps[2].trim().to_string()),
                recognizer: "chapter_titled".to_string(),
                ..PatternMetadata::default()
            },
        });
    }
    if let Some(caps) = CHAPTER_BARE.captures(text.trim()) {
        let (chapter_num, roman) = parse_chapter_numeral(&caps[1]);
        let num = chapter_num?;
        return Some(PatternMatch {
            position,
            kind: PatternKind::Chapter,
            text: text.to_string(),
            confidence: 0.9,
            metadata: PatternMetadata {
                chapter_num: Some(num),
                roman,
                depth: Some(1),
                title: None,
                recognizer: "chapter_bare".to_string(),
                ..PatternMetadata::default()
            },
        });
    }
    None
}

fn classify_subsection(position: usize, text: &str) -> Option<PatternMatch> {
    let trimmed = text.trim();
    if let Some(caps) = SUBSECTION_3LEVEL.captures(trimmed) {
        return Some(PatternMatch {
            position,
            kind: PatternKind::Subsection,
            text: text.to_string(),
            confidence: 0.95,
            metadata: PatternMetadata {
                chapter_num: caps[1].parse().ok(),
                full_number: Some(format!("{}.{}.{}", &caps[1], &caps[2], &caps[3])),
                depth: Some(3),
                title: Some(caps[4].trim().to_string()),
                recognizer: "subsection_dotted3".to_string(),
                ..PatternMetadata::default()
            },
        });
    }
    if let Some(caps) = SUBSECTION_2LEVEL.captures(trimmed) {
        return Some(PatternMatch {
            position,
            kind: PatternKind::Subsection,
            text: text.to_string(),
            confidence: 0.9,
            metadata: PatternMetadata {
                chapter_num: caps[1].parse().ok(),
                full_number: Some(format!("{}.{}", &caps[1], &caps[2])),
                depth: Some(2),
                title: Some(caps[3].trim().to_string()),
                recognizer: "subsection_dotted2".to_string(),
                ..PatternMetadata::default()
            },
        });
    }
    if SUBSECTION_KEYWORD.is_match(trimmed) {
        return Some(PatternMatch {
            position,
            kind: PatternKind::Subsection,
            text: text.to_string(),
            confidence: 0.8,
            metadata: PatternMetadata {
                depth: Some(2),
                title: Some(trimmed.to_string()),
                recognizer: "subsection_keyword".to_string(),
                ..PatternMetadata::default()
            },
        });
    }
    // A numeral missing its chapter part is malformed input, not a heading.
    // Surface it as a low-confidence placeholder so the enforcer can repair it.
    if let Some(caps) = SUBSECTION_ORPHAN.captures(trimmed) {
        return Some(PatternMatch {
            position,
            kind: PatternKind::Placeholder,
            text: text.to_string(),
            confidence: 0.5,
            metadata: PatternMetadata {
                full_number: Some(format!(".{}", &caps[1])),
                title: Some(caps[2].trim().to_string()),
                recognizer: "subsection_orphan".to_string(),
                ..PatternMetadata::default()
            },
        });
    }
    None
}

fn classify_placeholder(position: usize, text: &str) -> Option<PatternMatch> {
    let trimmed = text.trim();
    for (regex, name, confidence) in PLACEHOLDER_REGEXES.iter() {
        if regex.is_match(trimmed) {
            return Some(PatternMatch {
                position,
                kind: PatternKind::Placeholder,
                text: text.to_string(),
                confidence: *confidence,
                metadata: PatternMetadata {
                    recognizer: (*name).to_string(),
                    ..PatternMetadata::default()
                },
            });
        }
    }
    None
}

fn classify_front_matter(position: usize, text: &str) -> Option<PatternMatch> {
    if !is_front_matter_marker(text) {
        return None;
    }
    Some(PatternMatch {
        position,
        kind: PatternKind::FrontMatterMarker,
        text: text.to_string(),
        confidence: 1.0,
        metadata: PatternMetadata {
            title: Some(text.trim().to_uppercase()),
            recognizer: "front_matter_marker".to_string(),
            ..PatternMetadata::default()
        },
    })
}

/// Classify a single paragraph. Recognizers run in decreasing specificity;
/// the first match wins, so at most one match is produced per position.
pub fn classify(position: usize, text: &str) -> Option<PatternMatch> {
    let trimmed = text.trim();
    if trimmed.is_empty() || looks_like_toc_entry(trimmed) {
        return None;
    }
    classify_front_matter(position, trimmed)
        .or_else(|| classify_chapter(position, text))
        .or_else(|| classify_subsection(position, text))
        .or_else(|| classify_placeholder(position, text))
}

/// Scan a full paragraph sequence into an ordered match list.
pub fn scan(paragraphs: &[Paragraph]) -> Vec<PatternMatch> {
    let matches: Vec<PatternMatch> = paragraphs
        .iter()
        .enumerate()
        .filter_map(|(i, p)| classify(i, &p.text))
        .collect();
    tracing::debug!(paragraphs = paragraphs.len(), matches = matches.len(), "scanned document");
    matches
}
