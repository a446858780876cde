//! Package kind detection for Word packages.

use crate::container::{ContentTypes, OoxmlContainer};
use crate::error::{Error, Result};
use std::path::Path;

/// ZIP file magic bytes: PK\x03\x04
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Relationship type of the package's main part.
pub const OFFICE_DOCUMENT_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

/// Main part location used when the package relationships do not name one.
pub const DEFAULT_MAIN_PART: &str = "word/document.xml";

/// Content type for a document main part.
pub const DOCUMENT_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";

/// Content type for a template main part.
pub const TEMPLATE_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.template.main+xml";

/// Content type for a macro-enabled document main part.
pub const MACRO_DOCUMENT_CONTENT_TYPE: &str = "application/vnd.ms-word.document.macroEnabled.main+xml";

/// Content type for a macro-enabled template main part.
pub const MACRO_TEMPLATE_CONTENT_TYPE: &str = "application/vnd.ms-word.template.macroEnabledTemplate.main+xml";

/// Kind of Word package, from its main part's content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordPackageKind {
    /// Word document (.docx)
    Document,
    /// Word template (.dotx)
    Template,
    /// Macro-enabled document (.docm)
    MacroEnabledDocument,
    /// Macro-enabled template (.dotm)
    MacroEnabledTemplate,
}

impl WordPackageKind {
    /// Map a main-part content type to a package kind.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type {
            DOCUMENT_CONTENT_TYPE => Some(WordPackageKind::Document),
            TEMPLATE_CONTENT_TYPE => Some(WordPackageKind::Template),
            MACRO_DOCUMENT_CONTENT_TYPE => Some(WordPackageKind::MacroEnabledDocument),
            MACRO_TEMPLATE_CONTENT_TYPE => Some(WordPackageKind::MacroEnabledTemplate),
            _ => None,
        }
    }

    /// Content type of the main part for this kind.
    pub fn content_type(&self) -> &'static str {
        match self {
            WordPackageKind::Document => DOCUMENT_CONTENT_TYPE,
            WordPackageKind::Template => TEMPLATE_CONTENT_TYPE,
            WordPackageKind::MacroEnabledDocument => MACRO_DOCUMENT_CONTENT_TYPE,
            WordPackageKind::MacroEnabledTemplate => MACRO_TEMPLATE_CONTENT_TYPE,
        }
    }

    /// Returns the file extension for this kind.
    pub fn extension(&self) -> &'static str {
        match self {
            WordPackageKind::Document => "docx",
            WordPackageKind::Template => "dotx",
            WordPackageKind::MacroEnabledDocument => "docm",
            WordPackageKind::MacroEnabledTemplate => "dotm",
        }
    }

    /// Returns a human-readable name for this kind.
    pub fn name(&self) -> &'static str {
        match self {
            WordPackageKind::Document => "Word Document",
            WordPackageKind::Template => "Word Template",
            WordPackageKind::MacroEnabledDocument => "Word Macro-Enabled Document",
            WordPackageKind::MacroEnabledTemplate => "Word Macro-Enabled Template",
        }
    }

    /// Check if the package carries macros.
    pub fn is_macro_enabled(&self) -> bool {
        matches!(
            self,
            WordPackageKind::MacroEnabledDocument | WordPackageKind::MacroEnabledTemplate
        )
    }
}

impl std::fmt::Display for WordPackageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Main part and kind of a Word package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    /// Path of the main document part inside the archive
    pub main_part: String,
    /// Package kind
    pub kind: WordPackageKind,
}

/// Locate the main part of an opened package and detect its kind.
pub fn detect_package(
    container: &OoxmlContainer,
    content_types: &ContentTypes,
) -> Result<PackageInfo> {
    let package_rels = container.read_package_relationships()?;
    let main_part = package_rels
        .get_by_type(OFFICE_DOCUMENT_REL)
        .first()
        .map(|rel| OoxmlContainer::resolve_path("", &rel.target))
        .unwrap_or_else(|| DEFAULT_MAIN_PART.to_string());

    if !container.exists(&main_part) {
        return Err(Error::MissingComponent(main_part));
    }

    let content_type = content_types
        .content_type_of(&main_part)
        .ok_or_else(|| Error::MissingComponent(format!("content type of '{}'", main_part)))?;

    let kind = WordPackageKind::from_content_type(content_type)
        .ok_or_else(|| Error::UnsupportedFormat(content_type.to_string()))?;

    Ok(PackageInfo { main_part, kind })
}

/// Detect the kind of a Word package held in memory.
pub fn detect_package_from_bytes(data: &[u8]) -> Result<PackageInfo> {
    if !is_zip_file(data) {
        return Err(Error::UnknownFormat);
    }
    let container = OoxmlContainer::from_bytes(data.to_vec())?;
    let content_types = container.read_content_types()?;
    detect_package(&container, &content_types)
}

/// Detect the kind of a Word package on disk.
///
/// # Example
///
/// ```no_run
/// use xml2docx::detect::detect_package_from_path;
///
/// let info = detect_package_from_path("template.dotx")?;
/// println!("{} ({})", info.kind, info.main_part);
/// # Ok::<(), xml2docx::Error>(())
/// ```
pub fn detect_package_from_path(path: impl AsRef<Path>) -> Result<PackageInfo> {
    let data = std::fs::read(path.as_ref())?;
    detect_package_from_bytes(&data)
}

/// Check if data starts with ZIP magic bytes.
pub fn is_zip_file(data: &[u8]) -> bool {
    data.len() >= 4 && data[..4] == ZIP_MAGIC
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    fn package(main_content_type: &str, package_rels: Option<&str>) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        zip.start_file("[Content_Types].xml", options).unwrap();
        write!(
            zip,
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/main.xml" ContentType="{}"/></Types>"#,
            main_content_type
        )
        .unwrap();
        if let Some(rels) = package_rels {
            zip.start_file("_rels/.rels", options).unwrap();
            zip.write_all(rels.as_bytes()).unwrap();
        }
        zip.start_file("word/main.xml", options).unwrap();
        zip.write_all(b"<w:document/>").unwrap();
        zip.finish().unwrap().into_inner()
    }

    const MAIN_RELS: &str = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="/word/main.xml"/></Relationships>"#;

    #[test]
    fn test_kind_display() {
        assert_eq!(WordPackageKind::Document.to_string(), "Word Document");
        assert_eq!(WordPackageKind::Template.extension(), "dotx");
        assert!(WordPackageKind::MacroEnabledTemplate.is_macro_enabled());
        assert!(!WordPackageKind::Template.is_macro_enabled());
    }

    #[test]
    fn test_kind_content_types() {
        for kind in [
            WordPackageKind::Document,
            WordPackageKind::Template,
            WordPackageKind::MacroEnabledDocument,
            WordPackageKind::MacroEnabledTemplate,
        ] {
            assert_eq!(WordPackageKind::from_content_type(kind.content_type()), Some(kind));
        }
        assert_eq!(WordPackageKind::from_content_type("application/xml"), None);
    }

    #[test]
    fn test_is_zip_file() {
        assert!(is_zip_file(&[0x50, 0x4B, 0x03, 0x04, 0x00]));
        assert!(!is_zip_file(&[0x00, 0x00, 0x00, 0x00]));
        assert!(!is_zip_file(&[0x50, 0x4B]));
    }

    #[test]
    fn test_detect_invalid_data() {
        let result = detect_package_from_bytes(&[0x00, 0x00, 0x00, 0x00]);
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_detect_template_via_package_rels() {
        let data = package(TEMPLATE_CONTENT_TYPE, Some(MAIN_RELS));
        let info = detect_package_from_bytes(&data).unwrap();
        assert_eq!(info.main_part, "word/main.xml");
        assert_eq!(info.kind, WordPackageKind::Template);
    }

    #[test]
    fn test_detect_missing_main_part() {
        let data = package(TEMPLATE_CONTENT_TYPE, None);
        assert!(matches!(
            detect_package_from_bytes(&data),
            Err(Error::MissingComponent(part)) if part == DEFAULT_MAIN_PART
        ));
    }

    #[test]
    fn test_detect_non_word_package() {
        let data = package(
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml",
            Some(MAIN_RELS),
        );
        assert!(matches!(
            detect_package_from_bytes(&data),
            Err(Error::UnsupportedFormat(_))
        ));
    }
}
