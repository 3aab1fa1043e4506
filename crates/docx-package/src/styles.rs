//! Style sheet parsing and based-on inheritance resolution.

use std::collections::{HashMap, HashSet};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::PackageError;

/// System fallback applied when an inheritance chain is exhausted or cyclic.
pub const DEFAULT_FONT: &str = "Times New Roman";
pub const DEFAULT_SIZE: f64 = 12.0;

/// One paragraph style definition from the package's style part.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleDefinition {
    pub style_id: String,
    /// Human-readable name ("Isi Paragraf")
    pub name: String,
    /// Parent style id in the based-on chain
    pub based_on: Option<String>,
    pub font: Option<String>,
    /// Font size in points
    pub size: Option<f64>,
    pub outline_level: Option<u8>,
}

/// Resolved font attributes for a style after walking its inheritance chain.
#[derive(Debug, Clone, PartialEq)]
pub struct FontInfo {
    pub name: String,
    pub size: f64,
}

impl Default for FontInfo {
    fn default() -> Self {
        FontInfo {
            name: DEFAULT_FONT.to_string(),
            size: DEFAULT_SIZE,
        }
    }
}

/// All paragraph styles of a document, keyed by style id.
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    styles: HashMap<String, StyleDefinition>,
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

impl StyleSheet {
    /// Parse the style part XML into a style sheet.
    pub fn parse(styles_xml: &str) -> Result<StyleSheet, PackageError> {
        let mut reader = Reader::from_str(styles_xml);
        reader.trim_text(true);
        let mut buf = Vec::new();

        let mut styles = HashMap::new();
        let mut current: Option<StyleDefinition> = None;

        loop {
            buf.clear();
            let event = reader.read_event_into(&mut buf).map_err(|e| PackageError::Xml {
                part: "word/styles.xml".to_string(),
                message: e.to_string(),
            })?;
            match event {
                Event::Start(e) | Event::Empty(e) => match local_name(e.name().as_ref()) {
                    b"style" => {
                        if let Some(done) = current.take() {
                            styles.insert(done.style_id.clone(), done);
                        }
                        if let Some(id) = attr_val(&e, b"styleId") {
                            current = Some(StyleDefinition {
                                style_id: id,
                                ..Default::default()
                            });
                        }
                    }
                    b"name" => {
                        if let (Some(style), Some(val)) = (current.as_mut(), attr_val(&e, b"val")) {
                            style.name = val;
                        }
                    }
                    b"basedOn" => {
                        if let (Some(style), Some(val)) = (current.as_mut(), attr_val(&e, b"val")) {
                            style.based_on = Some(val);
                        }
                    }
                    b"rFonts" => {
                        if let (Some(style), Some(val)) = (current.as_mut(), attr_val(&e, b"ascii"))
                        {
                            style.font = Some(val);
                        }
                    }
                    b"sz" => {
                        if let (Some(style), Some(val)) = (current.as_mut(), attr_val(&e, b"val")) {
                            // Stored in half-points
                            if let Ok(half) = val.parse::<f64>() {
                                style.size = Some(half / 2.0);
                            }
                        }
                    }
                    b"outlineLvl" => {
                        if let (Some(style), Some(val)) = (current.as_mut(), attr_val(&e, b"val")) {
                            style.outline_level = val.parse().ok();
                        }
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }
        if let Some(done) = current.take() {
            styles.insert(done.style_id.clone(), done);
        }

        Ok(StyleSheet { styles })
    }

    pub fn get(&self, style_id: &str) -> Option<&StyleDefinition> {
        self.styles.get(style_id)
    }

    /// Find a style id by its human-readable name, case-insensitively.
    pub fn find_by_name(&self, name: &str) -> Option<&StyleDefinition> {
        self.styles
            .values()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.styles.keys()
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Resolve font name and size for a style, walking the based-on chain.
    ///
    /// A style missing its own font or size inherits from its parent,
    /// recursively. The walk keeps a visited set so a cyclic chain
    /// terminates at the system default instead of looping.
    pub fn resolved_font(&self, style_id: &str) -> FontInfo {
        let mut font: Option<String> = None;
        let mut size: Option<f64> = None;
        let mut visited: HashSet<&str> = HashSet::new();
        let mut cursor = Some(style_id);

        while let Some(id) = cursor {
            if !visited.insert(id) {
                tracing::warn!(style = id, "based-on cycle in style sheet");
                break;
            }
            let Some(style) = self.styles.get(id) else {
                break;
            };
            if font.is_none() {
                font = style.font.clone();
            }
            if size.is_none() {
                size = style.size;
            }
            if font.is_some() && size.is_some() {
                break;
            }
            cursor = style.based_on.as_deref();
        }

        FontInfo {
            name: font.unwrap_or_else(|| DEFAULT_FONT.to_string()),
            size: size.unwrap_or(DEFAULT_SIZE),
        }
    }
}
