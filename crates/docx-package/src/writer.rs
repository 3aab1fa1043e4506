//! Document body serialization and package assembly.

use std::io::Write;

use quick_xml::escape::escape;
use zip::write::FileOptions;

use crate::paragraph::Paragraph;
use crate::PackageError;

const DOCUMENT_PART: &str = "word/document.xml";

const DOCUMENT_HEADER: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#,
);

/// Assemble the whole package: every part is copied through verbatim and the
/// document body is rebuilt from the paragraph list.
pub fn write_package(
    parts: &[(String, Vec<u8>)],
    paragraphs: &[Paragraph],
    sect_pr: Option<&str>,
) -> Result<Vec<u8>, PackageError> {
    let document_xml = write_document_xml(paragraphs, sect_pr);

    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (name, data) in parts {
        zip.start_file(name.as_str(), options)?;
        zip.write_all(data)?;
    }
    zip.start_file(DOCUMENT_PART, options)?;
    zip.write_all(document_xml.as_bytes())?;

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

pub fn write_document_xml(paragraphs: &[Paragraph], sect_pr: Option<&str>) -> String {
    let mut xml = String::with_capacity(paragraphs.len() * 160 + 256);
    xml.push_str(DOCUMENT_HEADER);
    for paragraph in paragraphs {
        write_paragraph(&mut xml, paragraph);
    }
    if let Some(sect_pr) = sect_pr {
        xml.push_str(sect_pr);
    }
    xml.push_str("</w:body></w:document>");
    xml
}

fn write_paragraph(xml: &mut String, p: &Paragraph) {
    xml.push_str("<w:p>");
    write_properties(xml, p);
    if let Some(instr) = &p.field {
        xml.push_str("<w:fldSimple w:instr=\"");
        xml.push_str(&escape(instr));
        xml.push_str("\">");
        write_runs(xml, &p.text);
        xml.push_str("</w:fldSimple>");
    } else {
        write_runs(xml, &p.text);
    }
    xml.push_str("</w:p>");
}

fn write_properties(xml: &mut String, p: &Paragraph) {
    let spacing_set =
        p.spacing.before.is_some() || p.spacing.after.is_some() || p.spacing.line.is_some();
    let has_props = p.style.is_some()
        || p.page_break_before
        || p.numbering.is_some()
        || spacing_set
        || p.first_line_indent.is_some()
        || p.alignment.is_some()
        || p.outline_level.is_some();
    if !has_props {
        return;
    }

    xml.push_str("<w:pPr>");
    if let Some(style) = &p.style {
        xml.push_str("<w:pStyle w:val=\"");
        xml.push_str(&escape(style));
        xml.push_str("\"/>");
    }
    if p.page_break_before {
        xml.push_str("<w:pageBreakBefore/>");
    }
    if let Some((ilvl, num_id)) = p.numbering {
        xml.push_str(&format!(
            "<w:numPr><w:ilvl w:val=\"{ilvl}\"/><w:numId w:val=\"{num_id}\"/></w:numPr>"
        ));
    }
    if spacing_set {
        xml.push_str("<w:spacing");
        if let Some(before) = p.spacing.before {
            xml.push_str(&format!(" w:before=\"{before}\""));
        }
        if let Some(after) = p.spacing.after {
            xml.push_str(&format!(" w:after=\"{after}\""));
        }
        if let Some(line) = p.spacing.line {
            xml.push_str(&format!(" w:line=\"{line}\" w:lineRule=\"auto\""));
        }
        xml.push_str("/>");
    }
    if let Some(indent) = p.first_line_indent {
        xml.push_str(&format!("<w:ind w:firstLine=\"{indent}\"/>"));
    }
    if let Some(alignment) = &p.alignment {
        xml.push_str("<w:jc w:val=\"");
        xml.push_str(&escape(alignment));
        xml.push_str("\"/>");
    }
    if let Some(level) = p.outline_level {
        xml.push_str(&format!("<w:outlineLvl w:val=\"{level}\"/>"));
    }
    xml.push_str("</w:pPr>");
}

/// Emit the paragraph text as a single run. Newlines become soft breaks
/// and tabs become tab elements, mirroring how the body is read back.
fn write_runs(xml: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    xml.push_str("<w:r>");
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            xml.push_str("<w:br/>");
        }
        for (j, segment) in line.split('\t').enumerate() {
            if j > 0 {
                xml.push_str("<w:tab/>");
            }
            if !segment.is_empty() {
                xml.push_str("<w:t xml:space=\"preserve\">");
                xml.push_str(&escape(segment));
                xml.push_str("</w:t>");
            }
        }
    }
    xml.push_str("</w:r>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paragraph::Spacing;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_paragraph() {
        let p = Paragraph::new("Halo dunia");
        let mut xml = String::new();
        write_paragraph(&mut xml, &p);
        assert_eq!(
            xml,
            "<w:p><w:r><w:t xml:space=\"preserve\">Halo dunia</w:t></w:r></w:p>"
        );
    }

    #[test]
    fn test_soft_break_and_escaping() {
        let p = Paragraph::new("BAB I\nA & B");
        let mut xml = String::new();
        write_paragraph(&mut xml, &p);
        assert_eq!(
            xml,
            "<w:p><w:r><w:t xml:space=\"preserve\">BAB I</w:t><w:br/>\
             <w:t xml:space=\"preserve\">A &amp; B</w:t></w:r></w:p>"
        );
    }

    #[test]
    fn test_full_properties() {
        let mut p = Paragraph::new("Isi");
        p.style = Some("IsiParagraf".to_string());
        p.alignment = Some("both".to_string());
        p.spacing = Spacing {
            before: Some(0),
            after: Some(0),
            line: Some(360),
        };
        p.first_line_indent = Some(567);
        let mut xml = String::new();
        write_paragraph(&mut xml, &p);
        assert!(xml.contains("<w:pStyle w:val=\"IsiParagraf\"/>"));
        assert!(xml.contains("w:line=\"360\""));
        assert!(xml.contains("<w:ind w:firstLine=\"567\"/>"));
        assert!(xml.contains("<w:jc w:val=\"both\"/>"));
    }

    #[test]
    fn test_field_paragraph() {
        let mut p = Paragraph::new("Klik kanan untuk memperbarui daftar isi.");
        p.field = Some("TOC \\o \"1-1\" \\h \\z \\u".to_string());
        let mut xml = String::new();
        write_paragraph(&mut xml, &p);
        assert!(xml.starts_with("<w:p><w:fldSimple w:instr=\"TOC \\o &quot;1-1&quot; \\h \\z \\u\">"));
        assert!(xml.ends_with("</w:fldSimple></w:p>"));
    }

    #[test]
    fn test_round_trip_through_reader() {
        let mut p = Paragraph::new("Judul\tHalaman 3");
        p.style = Some("Heading2".to_string());
        p.outline_level = Some(1);
        let xml = write_document_xml(&[p.clone()], None);
        let parsed = crate::document::parse_body(&xml).unwrap();
        assert_eq!(parsed, vec![p]);
    }
}
