//! Template style catalog.
//!
//! Generated paragraphs reference styles by ID only, so the template must
//! define them. The catalog is read to report headings the template lacks.

use crate::error::{Error, Result};
use crate::model::ParagraphStyle;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;

/// Style type (paragraph, character, table, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleType {
    Paragraph,
    Character,
    Table,
    Numbering,
}

/// A style definition from styles.xml.
#[derive(Debug, Clone, Default)]
pub struct Style {
    /// Style ID (e.g., "Heading1")
    pub id: String,
    /// Style name (e.g., "heading 1")
    pub name: String,
    /// Style type
    pub style_type: Option<StyleType>,
    /// Based on another style
    pub based_on: Option<String>,
    /// Outline level (for headings)
    pub outline_level: Option<u8>,
    /// Marked as the default style of its type
    pub is_default: bool,
}

/// Collection of styles from styles.xml.
#[derive(Debug, Clone, Default)]
pub struct StyleMap {
    /// Styles by ID
    pub styles: HashMap<String, Style>,
    /// Default paragraph style
    pub default_paragraph: Option<String>,
}

impl StyleMap {
    /// Parse styles from XML content.
    pub fn parse(xml: &str) -> Result<Self> {
        if xml.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut map = StyleMap::default();
        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut current_style: Option<Style> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) if e.name().as_ref() == b"w:style" => {
                    current_style = Some(style_from_start(&e));
                }
                Ok(Event::Empty(e)) => match e.name().as_ref() {
                    b"w:style" => map.insert(style_from_start(&e)),
                    name => {
                        if let Some(ref mut style) = current_style {
                            let val = || get_val(&e);
                            match name {
                                b"w:name" => style.name = val().unwrap_or_default(),
                                b"w:basedOn" => style.based_on = val(),
                                b"w:outlineLvl" => {
                                    style.outline_level = val().and_then(|v| v.parse().ok())
                                }
                                _ => {}
                            }
                        }
                    }
                },
                Ok(Event::End(e)) if e.name().as_ref() == b"w:style" => {
                    if let Some(style) = current_style.take() {
                        map.insert(style);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Ok(map)
    }

    fn insert(&mut self, style: Style) {
        if style.id.is_empty() {
            return;
        }
        if style.is_default
            && style.style_type == Some(StyleType::Paragraph)
            && self.default_paragraph.is_none()
        {
            self.default_paragraph = Some(style.id.clone());
        }
        self.styles.insert(style.id.clone(), style);
    }

    /// Get a style by ID.
    pub fn get(&self, id: &str) -> Option<&Style> {
        self.styles.get(id)
    }

    /// Check if a paragraph style with this ID is defined.
    pub fn has_paragraph_style(&self, id: &str) -> bool {
        self.get(id)
            .is_some_and(|s| matches!(s.style_type, None | Some(StyleType::Paragraph)))
    }

    /// Outline level of a style, following `basedOn` links.
    pub fn outline_level(&self, id: &str) -> Option<u8> {
        let mut current = self.get(id);
        // Bounded walk; basedOn chains may be cyclic in broken templates
        for _ in 0..10 {
            let style = current?;
            if style.outline_level.is_some() {
                return style.outline_level;
            }
            current = style.based_on.as_deref().and_then(|base| self.get(base));
        }
        None
    }

    /// Styles from `wanted` that have an ID but no definition here.
    pub fn missing_styles(&self, wanted: &[ParagraphStyle]) -> Vec<ParagraphStyle> {
        wanted
            .iter()
            .filter(|style| {
                style
                    .style_id()
                    .is_some_and(|id| !self.has_paragraph_style(id))
            })
            .copied()
            .collect()
    }

    /// Number of styles.
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Check if no styles are defined.
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

fn style_from_start(e: &BytesStart<'_>) -> Style {
    let mut style = Style::default();
    for attr in e.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value);
        match attr.key.as_ref() {
            b"w:styleId" => style.id = value.to_string(),
            b"w:type" => {
                style.style_type = match value.as_ref() {
                    "paragraph" => Some(StyleType::Paragraph),
                    "character" => Some(StyleType::Character),
                    "table" => Some(StyleType::Table),
                    "numbering" => Some(StyleType::Numbering),
                    _ => None,
                };
            }
            b"w:default" => style.is_default = value == "1" || value == "true",
            _ => {}
        }
    }
    style
}

/// Get the `w:val` attribute of an element.
fn get_val(e: &BytesStart<'_>) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"w:val")
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}
