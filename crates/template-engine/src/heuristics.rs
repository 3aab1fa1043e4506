//! Tunable classification thresholds, grouped so a new template dialect can
//! be supported by adjusting constants instead of recognizer logic.

/// An all-caps line must be strictly longer than this to count as a heading.
pub const ALL_CAPS_MIN_LEN: usize = 3;

/// An all-caps line must be strictly shorter than this to count as a heading.
/// Longer all-caps runs are almost always shouted body text.
pub const ALL_CAPS_MAX_LEN: usize = 80;

/// Forward scan limit when estimating where a front-matter section ends.
/// Bounds the walk in malformed documents with runaway listings.
pub const FRONT_MATTER_SCAN_WINDOW: usize = 200;

/// Body-style enforcement treats only lines at least this long as prose.
/// Shorter fragments are labels, captions or stray numbering.
pub const BODY_TEXT_MIN_LEN: usize = 30;

/// Output may fall at most this many paragraphs short of the template before
/// the validator flags the loss as critical.
pub const PARAGRAPH_COUNT_TOLERANCE: usize = 5;

/// Cap on verbatim samples reported for lost template content.
pub const LOST_CONTENT_SAMPLE_CAP: usize = 3;

/// Heading spacing in twentieths of a point: 24pt after a chapter heading.
pub const CHAPTER_SPACE_AFTER: i64 = 480;

/// 24pt before and 12pt after subsection headings.
pub const SUBSECTION_SPACE_BEFORE: i64 = 480;
pub const SUBSECTION_SPACE_AFTER: i64 = 240;
