//! Package-level document: load, parse, mutate paragraphs, save.

use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use shared_types::Margins;

use crate::paragraph::{Paragraph, Spacing};
use crate::styles::StyleSheet;
use crate::{writer, PackageError};

const DOCUMENT_PART: &str = "word/document.xml";
const STYLES_PART: &str = "word/styles.xml";
const NUMBERING_PART: &str = "word/numbering.xml";
const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";

const MINIMAL_NUMBERING_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:abstractNum w:abstractNumId="0"><w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="decimal"/><w:lvlText w:val="%1."/><w:lvlJc w:val="left"/></w:lvl></w:abstractNum><w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num></w:numbering>"#;

/// An in-memory document snapshot loaded from a package file.
///
/// Components mutate `paragraphs` and call [`DocxDocument::save`]; every
/// package part other than the document body is copied through untouched,
/// so styles, numbering and relationships survive a round trip.
#[derive(Debug, Clone)]
pub struct DocxDocument {
    /// All package parts except the document body, in archive order
    parts: Vec<(String, Vec<u8>)>,
    pub paragraphs: Vec<Paragraph>,
    pub styles: StyleSheet,
    pub margins: Option<Margins>,
    pub section_count: usize,
    pub numbering_count: usize,
    /// Raw section properties of the body, re-emitted verbatim on save
    sect_pr: Option<String>,
}

fn local_name(q: &[u8]) -> &[u8] {
    match q.iter().position(|&b| b == b':') {
        Some(i) => &q[i + 1..],
        None => q,
    }
}

fn attr_val(e: &BytesStart<'_>, key_local: &[u8]) -> Option<String> {
    for a in e.attributes().with_checks(false).flatten() {
        if local_name(a.key.as_ref()) == key_local {
            return Some(String::from_utf8_lossy(&a.value).into_owned());
        }
    }
    None
}

const MINIMAL_CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const MINIMAL_ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const MINIMAL_DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#;

impl DocxDocument {
    /// A minimal valid package with no paragraphs.
    pub fn empty() -> DocxDocument {
        DocxDocument {
            parts: vec![
                (
                    CONTENT_TYPES_PART.to_string(),
                    MINIMAL_CONTENT_TYPES_XML.as_bytes().to_vec(),
                ),
                (
                    "_rels/.rels".to_string(),
                    MINIMAL_ROOT_RELS_XML.as_bytes().to_vec(),
                ),
                (
                    DOCUMENT_RELS_PART.to_string(),
                    MINIMAL_DOCUMENT_RELS_XML.as_bytes().to_vec(),
                ),
            ],
            paragraphs: Vec::new(),
            styles: StyleSheet::default(),
            margins: None,
            section_count: 0,
            numbering_count: 0,
            sect_pr: None,
        }
    }

    pub fn open(path: impl AsRef<Path>) -> Result<DocxDocument, PackageError> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<DocxDocument, PackageError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;

        let mut parts = Vec::with_capacity(archive.len());
        let mut document_xml: Option<String> = None;
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            if name == DOCUMENT_PART {
                document_xml = Some(String::from_utf8_lossy(&data).into_owned());
            } else {
                parts.push((name, data));
            }
        }

        let document_xml =
            document_xml.ok_or_else(|| PackageError::MissingPart(DOCUMENT_PART.to_string()))?;

        let styles = match parts.iter().find(|(n, _)| n == STYLES_PART) {
            Some((_, data)) => StyleSheet::parse(&String::from_utf8_lossy(data))?,
            None => StyleSheet::default(),
        };

        let paragraphs = parse_body(&document_xml)?;
        let sect_pr = extract_sect_pr(&document_xml);
        let margins = sect_pr.as_deref().and_then(parse_margins);
        let section_count = document_xml.matches("<w:sectPr").count();

        let numbering_count = match parts.iter().find(|(n, _)| n == NUMBERING_PART) {
            Some((_, data)) => count_numbering_definitions(&String::from_utf8_lossy(data)),
            None => 0,
        };

        Ok(DocxDocument {
            parts,
            paragraphs,
            styles,
            margins,
            section_count,
            numbering_count,
            sect_pr,
        })
    }

    pub fn has_numbering(&self) -> bool {
        self.parts.iter().any(|(n, _)| n == NUMBERING_PART)
    }

    /// Add a minimal numbering part (one decimal list definition) when the
    /// package has none. Returns true when a part was added.
    pub fn ensure_numbering_part(&mut self) -> bool {
        if self.has_numbering() {
            return false;
        }
        self.parts.push((
            NUMBERING_PART.to_string(),
            MINIMAL_NUMBERING_XML.as_bytes().to_vec(),
        ));
        self.numbering_count = 1;

        // Register the new part with the package plumbing
        if let Some((_, data)) = self
            .parts
            .iter_mut()
            .find(|(n, _)| n == CONTENT_TYPES_PART)
        {
            let xml = String::from_utf8_lossy(data).into_owned();
            if !xml.contains("/word/numbering.xml") {
                let patched = xml.replace(
                    "</Types>",
                    r#"<Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/></Types>"#,
                );
                *data = patched.into_bytes();
            }
        }
        if let Some((_, data)) = self
            .parts
            .iter_mut()
            .find(|(n, _)| n == DOCUMENT_RELS_PART)
        {
            let xml = String::from_utf8_lossy(data).into_owned();
            if !xml.contains("numbering.xml") {
                let patched = xml.replace(
                    "</Relationships>",
                    r#"<Relationship Id="rIdNumbering1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering" Target="numbering.xml"/></Relationships>"#,
                );
                *data = patched.into_bytes();
            }
        }
        tracing::info!("added minimal numbering part to package");
        true
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, PackageError> {
        writer::write_package(&self.parts, &self.paragraphs, self.sect_pr.as_deref())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PackageError> {
        let bytes = self.to_bytes()?;
        fs::write(path, bytes)?;
        Ok(())
    }
}

/// Parse the document body into paragraphs.
pub(crate) fn parse_body(document_xml: &str) -> Result<Vec<Paragraph>, PackageError> {
    let mut reader = Reader::from_str(document_xml);
    reader.trim_text(false);
    let mut buf = Vec::new();

    let mut paragraphs = Vec::new();
    let mut current: Option<Paragraph> = None;
    let mut in_text_run = false;
    let mut pending_ilvl: Option<u32> = None;
    let mut pending_num_id: Option<u32> = None;

    loop {
        buf.clear();
        let event = reader.read_event_into(&mut buf).map_err(|e| PackageError::Xml {
            part: DOCUMENT_PART.to_string(),
            message: e.to_string(),
        })?;
        match event {
            ev @ (Event::Start(_) | Event::Empty(_)) => {
                let (e, is_start) = match &ev {
                    Event::Start(e) => (e, true),
                    Event::Empty(e) => (e, false),
                    _ => unreachable!(),
                };
                match local_name(e.name().as_ref()) {
                    b"p" if is_start => {
                        current = Some(Paragraph::default());
                        pending_ilvl = None;
                        pending_num_id = None;
                    }
                    b"pStyle" => {
                        if let (Some(p), Some(val)) = (current.as_mut(), attr_val(e, b"val")) {
                            p.style = Some(val);
                        }
                    }
                    b"outlineLvl" => {
                        if let (Some(p), Some(val)) = (current.as_mut(), attr_val(e, b"val")) {
                            p.outline_level = val.parse().ok();
                        }
                    }
                    b"pageBreakBefore" => {
                        if let Some(p) = current.as_mut() {
                            let disabled = attr_val(e, b"val")
                                .map(|v| v == "0" || v.eq_ignore_ascii_case("false"))
                                .unwrap_or(false);
                            p.page_break_before = !disabled;
                        }
                    }
                    b"jc" => {
                        if let (Some(p), Some(val)) = (current.as_mut(), attr_val(e, b"val")) {
                            p.alignment = Some(val);
                        }
                    }
                    b"spacing" => {
                        if let Some(p) = current.as_mut() {
                            p.spacing = Spacing {
                                before: attr_val(e, b"before").and_then(|v| v.parse().ok()),
                                after: attr_val(e, b"after").and_then(|v| v.parse().ok()),
                                line: attr_val(e, b"line").and_then(|v| v.parse().ok()),
                            };
                        }
                    }
                    b"ind" => {
                        if let Some(p) = current.as_mut() {
                            p.first_line_indent =
                                attr_val(e, b"firstLine").and_then(|v| v.parse().ok());
                        }
                    }
                    b"ilvl" => pending_ilvl = attr_val(e, b"val").and_then(|v| v.parse().ok()),
                    b"numId" => pending_num_id = attr_val(e, b"val").and_then(|v| v.parse().ok()),
                    b"fldSimple" => {
                        if let (Some(p), Some(instr)) = (current.as_mut(), attr_val(e, b"instr")) {
                            p.field = Some(instr);
                        }
                    }
                    b"t" if is_start => in_text_run = true,
                    b"br" => {
                        if let Some(p) = current.as_mut() {
                            p.text.push('\n');
                        }
                    }
                    b"tab" => {
                        if let Some(p) = current.as_mut() {
                            p.text.push('\t');
                        }
                    }
                    _ => {}
                }
            }
            Event::End(e) => match local_name(e.name().as_ref()) {
                b"t" => in_text_run = false,
                b"p" => {
                    if let Some(mut p) = current.take() {
                        if let Some(num_id) = pending_num_id {
                            p.numbering = Some((pending_ilvl.unwrap_or(0), num_id));
                        }
                        paragraphs.push(p);
                    }
                }
                _ => {}
            },
            Event::Text(t) => {
                if in_text_run {
                    if let (Some(p), Ok(text)) = (current.as_mut(), t.unescape()) {
                        p.text.push_str(&text);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

/// Extract the body-level section properties element verbatim.
fn extract_sect_pr(document_xml: &str) -> Option<String> {
    let start = document_xml.rfind("<w:sectPr")?;
    let tail = &document_xml[start..];
    // Self-closing or full element
    if let Some(end) = tail.find("</w:sectPr>") {
        Some(tail[..end + "</w:sectPr>".len()].to_string())
    } else {
        let end = tail.find("/>")?;
        Some(tail[..end + 2].to_string())
    }
}

/// Parse page margins out of a section properties fragment.
fn parse_margins(sect_pr: &str) -> Option<Margins> {
    let mut reader = Reader::from_str(sect_pr);
    reader.trim_text(true);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if local_name(e.name().as_ref()) == b"pgMar" {
                    return Some(Margins {
                        top: attr_val(&e, b"top")?.parse().ok()?,
                        bottom: attr_val(&e, b"bottom")?.parse().ok()?,
                        left: attr_val(&e, b"left")?.parse().ok()?,
                        right: attr_val(&e, b"right")?.parse().ok()?,
                    });
                }
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

/// Count `w:num` definitions in a numbering part.
fn count_numbering_definitions(numbering_xml: &str) -> usize {
    let mut reader = Reader::from_str(numbering_xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut count = 0;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if local_name(e.name().as_ref()) == b"num" {
                    count += 1;
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BODY_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
<w:p><w:pPr><w:pStyle w:val="Heading1"/><w:outlineLvl w:val="0"/></w:pPr><w:r><w:t>BAB I</w:t><w:br/><w:t>PENDAHULUAN</w:t></w:r></w:p>
<w:p><w:pPr><w:jc w:val="both"/><w:ind w:firstLine="567"/></w:pPr><w:r><w:t xml:space="preserve">Isi paragraf pertama.</w:t></w:r></w:p>
<w:p><w:pPr><w:numPr><w:ilvl w:val="0"/><w:numId w:val="3"/></w:numPr></w:pPr><w:r><w:t>Butir satu</w:t></w:r></w:p>
<w:p><w:r><w:t>DAFTAR ISI</w:t><w:tab/><w:t>12</w:t></w:r></w:p>
<w:sectPr><w:pgMar w:top="2268" w:bottom="1701" w:left="2268" w:right="1701"/></w:sectPr>
</w:body></w:document>"#;

    #[test]
    fn test_parse_body_paragraphs() {
        let paragraphs = parse_body(BODY_XML).unwrap();
        assert_eq!(paragraphs.len(), 4);
        assert_eq!(paragraphs[0].text, "BAB I\nPENDAHULUAN");
        assert_eq!(paragraphs[0].style.as_deref(), Some("Heading1"));
        assert_eq!(paragraphs[0].outline_level, Some(0));
        assert_eq!(paragraphs[1].alignment.as_deref(), Some("both"));
        assert_eq!(paragraphs[1].first_line_indent, Some(567));
        assert_eq!(paragraphs[2].numbering, Some((0, 3)));
        assert_eq!(paragraphs[3].text, "DAFTAR ISI\t12");
    }

    #[test]
    fn test_margins_from_sect_pr() {
        let sect_pr = extract_sect_pr(BODY_XML).unwrap();
        let margins = parse_margins(&sect_pr).unwrap();
        assert_eq!(margins.as_tuple(), [2268, 1701, 2268, 1701]);
    }

    #[test]
    fn test_numbering_count() {
        let xml = r#"<w:numbering xmlns:w="ns"><w:abstractNum w:abstractNumId="0"/><w:num w:numId="1"/><w:num w:numId="2"/></w:numbering>"#;
        assert_eq!(count_numbering_definitions(xml), 2);
    }
}
