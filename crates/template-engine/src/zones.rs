//! Zone classifier: partitions a scanned paragraph sequence into front
//! matter, main content and back matter.

use docx_package::Paragraph;
use shared_types::{DocumentZones, PatternKind, PatternMatch};

use crate::heuristics::FRONT_MATTER_SCAN_WINDOW;
use crate::scanner;

/// Compute zone boundaries from the scan results.
///
/// `main_content_start` is the first Chapter match; the scanner has already
/// excluded TOC-shaped lines, so a chapter listed inside a table of contents
/// never qualifies. When no chapter survives that exclusion the start is
/// `None` and content insertion downstream must refuse to run.
pub fn classify_zones(paragraphs: &[Paragraph], matches: &[PatternMatch]) -> DocumentZones {
    let paragraph_count = paragraphs.len();

    let main_content_start = matches
        .iter()
        .find(|m| m.kind == PatternKind::Chapter)
        .map(|m| m.position);
    if main_content_start.is_none() {
        tracing::warn!("no chapter heading survives TOC exclusion; content insertion disabled");
    }

    let last_marker = matches
        .iter()
        .filter(|m| m.kind == PatternKind::FrontMatterMarker)
        .map(|m| m.position)
        .last();

    let mut front_matter_end = match last_marker {
        Some(marker) => {
            // The marker's section runs until the next marker or the first
            // true chapter, inside a bounded window.
            let mut end = (marker + 1).min(paragraph_count);
            let limit = marker
                .saturating_add(1 + FRONT_MATTER_SCAN_WINDOW)
                .min(paragraph_count);
            for pos in (marker + 1)..limit {
                if main_content_start == Some(pos)
                    || scanner::is_front_matter_marker(&paragraphs[pos].text)
                {
                    break;
                }
                end = pos + 1;
            }
            end
        }
        None => 0,
    };
    if let Some(main) = main_content_start {
        front_matter_end = front_matter_end.min(main);
    }

    let back_matter_start = match main_content_start {
        Some(main) => paragraphs
            .iter()
            .enumerate()
            .skip(main + 1)
            .find(|(_, p)| scanner::is_back_matter_marker(&p.text))
            .map(|(i, _)| i)
            .unwrap_or(paragraph_count),
        None => paragraph_count,
    };

    DocumentZones {
        front_matter_end,
        main_content_start,
        back_matter_start,
        paragraph_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(texts: &[&str]) -> Vec<Paragraph> {
        texts.iter().map(|t| Paragraph::new(*t)).collect()
    }

    fn zones_of(texts: &[&str]) -> DocumentZones {
        let paragraphs = doc(texts);
        let matches = scanner::scan(&paragraphs);
        classify_zones(&paragraphs, &matches)
    }

    #[test]
    fn test_toc_listing_does_not_shadow_first_chapter() {
        // "DAFTAR ISI" followed by 30 tab-and-page-number lines, then the
        // first real chapter heading.
        let mut texts = vec!["DAFTAR ISI".to_string()];
        for i in 1..=30 {
            texts.push(format!("BAB {i} Judul Bagian\t{i}"));
        }
        texts.push("BAB I PENDAHULUAN".to_string());
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();

        let zones = zones_of(&refs);
        assert_eq!(zones.main_content_start, Some(31));
        assert_eq!(zones.front_matter_end, 31);
        assert_eq!(zones.back_matter_start, 32);
        assert_eq!(zones.paragraph_count, 32);
    }

    #[test]
    fn test_zone_ordering_invariant() {
        let zones = zones_of(&[
            "KATA PENGANTAR",
            "Terima kasih kepada semua pihak.",
            "DAFTAR ISI",
            "1.1 Latar Belakang\t2",
            "BAB I PENDAHULUAN",
            "Isi bab satu.",
            "DAFTAR PUSTAKA",
            "Referensi pertama.",
        ]);
        let main = zones.main_content_start.unwrap();
        assert!(zones.front_matter_end <= main);
        assert!(main <= zones.back_matter_start);
        assert!(zones.back_matter_start <= zones.paragraph_count);
        assert_eq!(main, 4);
        assert_eq!(zones.back_matter_start, 6);
    }

    #[test]
    fn test_no_chapter_means_no_main_content() {
        let zones = zones_of(&["DAFTAR ISI", "BAB I PENDAHULUAN\t3", "Penutup 12"]);
        assert_eq!(zones.main_content_start, None);
        assert!(!zones.in_main_content(1));
        assert_eq!(zones.back_matter_start, 3);
    }

    #[test]
    fn test_no_front_matter_markers() {
        let zones = zones_of(&["BAB I PENDAHULUAN", "Isi."]);
        assert_eq!(zones.front_matter_end, 0);
        assert_eq!(zones.main_content_start, Some(0));
    }
}
