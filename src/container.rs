//! ZIP container abstraction for OOXML packages.
//!
//! Reads parts, relationships and content types from a Word package held
//! in memory, and copies untouched parts into a new archive.

use crate::encoding;
use crate::error::{Error, Result};
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use std::cell::RefCell;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;
use zip::ZipWriter;

/// Location of the content types part.
pub const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";

/// Location of the package-level relationships.
pub const PACKAGE_RELS_PATH: &str = "_rels/.rels";

const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

/// A relationship entry from a .rels file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1")
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target path (relative or absolute) or external URI
    pub target: String,
    /// Whether the target is external
    pub external: bool,
}

impl Relationship {
    /// Create a relationship to an external target.
    pub fn external(
        id: impl Into<String>,
        rel_type: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            rel_type: rel_type.into(),
            target: target.into(),
            external: true,
        }
    }
}

/// Relationships of one part, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships {
    entries: Vec<Relationship>,
}

impl Relationships {
    /// Create a new empty relationships collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the XML of a .rels part.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut rels = Relationships::new();
        if xml.trim().is_empty() {
            return Ok(rels);
        }

        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    let mut rel = Relationship {
                        id: String::new(),
                        rel_type: String::new(),
                        target: String::new(),
                        external: false,
                    };

                    for attr in e.attributes().flatten() {
                        let value = attr
                            .unescape_value()
                            .map_err(|e| Error::XmlParse(e.to_string()))?
                            .into_owned();
                        match attr.key.as_ref() {
                            b"Id" => rel.id = value,
                            b"Type" => rel.rel_type = value,
                            b"Target" => rel.target = value,
                            b"TargetMode" => rel.external = value.eq_ignore_ascii_case("external"),
                            _ => {}
                        }
                    }

                    if !rel.id.is_empty() {
                        rels.add(rel);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Get a relationship by ID.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.entries.iter().find(|rel| rel.id == id)
    }

    /// Get relationships by type.
    pub fn get_by_type(&self, rel_type: &str) -> Vec<&Relationship> {
        self.entries
            .iter()
            .filter(|rel| rel.rel_type == rel_type)
            .collect()
    }

    /// Add a relationship, replacing any entry with the same ID.
    pub fn add(&mut self, rel: Relationship) {
        match self.entries.iter_mut().find(|existing| existing.id == rel.id) {
            Some(existing) => *existing = rel,
            None => self.entries.push(rel),
        }
    }

    /// Remove and return every relationship of a type.
    pub fn remove_by_type(&mut self, rel_type: &str) -> Vec<Relationship> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|rel| rel.rel_type == rel_type);
        self.entries = kept;
        removed
    }

    /// Return an ID of the form `rIdN` not used by any entry.
    pub fn next_id(&self) -> String {
        (self.entries.len() + 1..)
            .map(|n| format!("rId{}", n))
            .find(|id| self.get(id).is_none())
            .unwrap_or_default()
    }

    /// Iterate over relationships in file order.
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.entries.iter()
    }

    /// Number of relationships.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no relationships.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize to the XML of a .rels part.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(128 + self.entries.len() * 160);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(&format!(r#"<Relationships xmlns="{}">"#, RELATIONSHIPS_NS));
        for rel in &self.entries {
            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}""#,
                escape(rel.id.as_str()),
                escape(rel.rel_type.as_str()),
                escape(rel.target.as_str())
            ));
            if rel.external {
                xml.push_str(r#" TargetMode="External""#);
            }
            xml.push_str("/>");
        }
        xml.push_str("</Relationships>");
        xml
    }
}

/// Parsed `[Content_Types].xml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypes {
    /// `(extension, content type)` defaults
    defaults: Vec<(String, String)>,
    /// `(part name, content type)` overrides; part names start with `/`
    overrides: Vec<(String, String)>,
}

impl ContentTypes {
    /// Parse the XML of the content types part.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut types = ContentTypes::default();
        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"Default" => {
                        if let (Some(ext), Some(ct)) =
                            (attr_value(&e, b"Extension")?, attr_value(&e, b"ContentType")?)
                        {
                            types.defaults.push((ext, ct));
                        }
                    }
                    b"Override" => {
                        if let (Some(part), Some(ct)) =
                            (attr_value(&e, b"PartName")?, attr_value(&e, b"ContentType")?)
                        {
                            types.overrides.push((part, ct));
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Ok(types)
    }

    /// Content type of a part, from its override or its extension default.
    ///
    /// Part names are compared case-insensitively, with or without the
    /// leading `/`.
    pub fn content_type_of(&self, part: &str) -> Option<&str> {
        let part_name = part_name(part);
        if let Some((_, ct)) = self
            .overrides
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(&part_name))
        {
            return Some(ct);
        }

        let ext = part_name.rsplit_once('.').map(|(_, ext)| ext)?;
        self.defaults
            .iter()
            .find(|(e, _)| e.eq_ignore_ascii_case(ext))
            .map(|(_, ct)| ct.as_str())
    }

    /// Set the override for a part, adding it when missing.
    pub fn set_override(&mut self, part: &str, content_type: &str) {
        let part_name = part_name(part);
        match self
            .overrides
            .iter_mut()
            .find(|(name, _)| name.eq_ignore_ascii_case(&part_name))
        {
            Some((_, ct)) => *ct = content_type.to_string(),
            None => self.overrides.push((part_name, content_type.to_string())),
        }
    }

    /// Remove the override for a part, if any.
    pub fn remove_override(&mut self, part: &str) {
        let part_name = part_name(part);
        self.overrides
            .retain(|(name, _)| !name.eq_ignore_ascii_case(&part_name));
    }

    /// Serialize to the XML of the content types part.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.overrides.len() * 160);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(&format!(r#"<Types xmlns="{}">"#, CONTENT_TYPES_NS));
        for (ext, ct) in &self.defaults {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape(ext.as_str()),
                escape(ct.as_str())
            ));
        }
        for (part, ct) in &self.overrides {
            xml.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape(part.as_str()),
                escape(ct.as_str())
            ));
        }
        xml.push_str("</Types>");
        xml
    }
}

fn part_name(part: &str) -> String {
    if part.starts_with('/') {
        part.to_string()
    } else {
        format!("/{}", part)
    }
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            let value = attr
                .unescape_value()
                .map_err(|e| Error::XmlParse(e.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Fix the XML declaration after transcoding to UTF-8.
///
/// Decoded UTF-16 text still declares `encoding="UTF-16"`, which quick-xml
/// would then try to honor.
fn fix_xml_encoding_declaration(content: &str) -> String {
    if content.starts_with("<?xml") {
        if let Some(end_decl) = content.find("?>") {
            let decl = &content[..end_decl + 2];
            let rest = &content[end_decl + 2..];

            let fixed_decl = decl
                .replace("encoding=\"UTF-16\"", "encoding=\"UTF-8\"")
                .replace("encoding='UTF-16'", "encoding='UTF-8'")
                .replace("encoding=\"utf-16\"", "encoding=\"UTF-8\"")
                .replace("encoding='utf-16'", "encoding='UTF-8'");

            return format!("{}{}", fixed_decl, rest);
        }
    }
    content.to_string()
}

/// Decode the bytes of an XML part.
///
/// Parts are UTF-8 unless a byte order mark says otherwise.
pub fn decode_xml_bytes(bytes: &[u8]) -> Result<String> {
    let decoded = encoding::decode(bytes, encoding_rs::UTF_8);
    if decoded.had_errors {
        return Err(Error::Encoding(format!(
            "malformed {} in package part",
            decoded.encoding.name()
        )));
    }
    if decoded.encoding == encoding_rs::UTF_8 {
        Ok(decoded.text.into_owned())
    } else {
        Ok(fix_xml_encoding_declaration(&decoded.text))
    }
}

/// OOXML container abstraction over a ZIP archive held in memory.
pub struct OoxmlContainer {
    archive: RefCell<zip::ZipArchive<Cursor<Vec<u8>>>>,
}

impl OoxmlContainer {
    /// Open an OOXML container from a file path.
    ///
    /// The whole file is buffered, so the source may be removed or
    /// overwritten afterwards.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use xml2docx::container::OoxmlContainer;
    ///
    /// let container = OoxmlContainer::open("template.dotx")?;
    /// assert!(container.exists("word/document.xml"));
    /// # Ok::<(), xml2docx::Error>(())
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Create an OOXML container from a byte vector.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let archive = zip::ZipArchive::new(Cursor::new(data))?;
        Ok(Self {
            archive: RefCell::new(archive),
        })
    }

    /// Read an XML part as a string.
    pub fn read_xml(&self, path: &str) -> Result<String> {
        let mut archive = self.archive.borrow_mut();
        let mut file = archive
            .by_name(path)
            .map_err(|_| Error::MissingComponent(path.to_string()))?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        decode_xml_bytes(&bytes)
    }

    /// Check if a part exists in the archive.
    pub fn exists(&self, path: &str) -> bool {
        let archive = self.archive.borrow();
        let found = archive.file_names().any(|n| n == path);
        found
    }

    /// List all entries in archive order.
    pub fn list_files(&self) -> Vec<String> {
        let archive = self.archive.borrow();
        (0..archive.len())
            .filter_map(|i| archive.name_for_index(i).map(String::from))
            .collect()
    }

    /// Read the content types part.
    pub fn read_content_types(&self) -> Result<ContentTypes> {
        let xml = self.read_xml(CONTENT_TYPES_PATH)?;
        ContentTypes::parse(&xml)
    }

    /// Read the relationships of a part. A missing .rels part is empty.
    pub fn read_relationships(&self, part_path: &str) -> Result<Relationships> {
        self.parse_relationships(&Self::rels_path_for(part_path))
    }

    /// Read package-level relationships (`_rels/.rels`).
    pub fn read_package_relationships(&self) -> Result<Relationships> {
        self.parse_relationships(PACKAGE_RELS_PATH)
    }

    fn parse_relationships(&self, rels_path: &str) -> Result<Relationships> {
        if !self.exists(rels_path) {
            return Ok(Relationships::new());
        }
        let content = self.read_xml(rels_path)?;
        Relationships::parse(&content)
    }

    /// Copy every entry not named in `skip` into `writer` without
    /// recompressing it. Returns the number of entries copied.
    pub fn copy_parts_into<W: Write + Seek>(
        &self,
        writer: &mut ZipWriter<W>,
        skip: &[&str],
    ) -> Result<usize> {
        let mut archive = self.archive.borrow_mut();
        let mut copied = 0;
        for index in 0..archive.len() {
            let file = archive.by_index_raw(index)?;
            if skip.contains(&file.name()) {
                continue;
            }
            writer.raw_copy_file(file)?;
            copied += 1;
        }
        Ok(copied)
    }

    /// Path of the .rels part holding a part's relationships.
    pub fn rels_path_for(part_path: &str) -> String {
        let part_path = part_path.trim_start_matches('/');
        if part_path.is_empty() {
            return PACKAGE_RELS_PATH.to_string();
        }
        match part_path.rsplit_once('/') {
            Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
            None => format!("_rels/{}.rels", part_path),
        }
    }

    /// Resolve a relationship target against the part that owns it.
    pub fn resolve_path(base: &str, relative: &str) -> String {
        if let Some(stripped) = relative.strip_prefix('/') {
            return stripped.to_string();
        }

        let base_path = Path::new(base);
        let base_dir = base_path.parent().unwrap_or(Path::new(""));

        let mut result = base_dir.to_path_buf();
        for component in Path::new(relative).components() {
            match component {
                std::path::Component::ParentDir => {
                    result.pop();
                }
                std::path::Component::Normal(c) => {
                    result.push(c);
                }
                _ => {}
            }
        }

        result.to_string_lossy().replace('\\', "/")
    }
}

impl std::fmt::Debug for OoxmlContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OoxmlContainer")
            .field("files", &self.archive.borrow().len())
            .finish()
    }
}
