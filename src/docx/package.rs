//! Editable Word package built from a template.

use super::styles::StyleMap;
use super::writer::document_xml;
use crate::container::{
    ContentTypes, OoxmlContainer, Relationship, Relationships, CONTENT_TYPES_PATH,
};
use crate::detect::{detect_package, is_zip_file, WordPackageKind};
use crate::error::{Error, Result};
use crate::model::{Body, Paragraph, ParagraphStyle};
use log::{debug, info};
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Relationship type linking a document to the template it was made from.
pub const ATTACHED_TEMPLATE_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/attachedTemplate";

/// Relationship type of the styles part.
pub const STYLES_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

/// Relationship type of a VBA project part.
pub const VBA_PROJECT_REL: &str =
    "http://schemas.microsoft.com/office/2006/relationships/vbaProject";

/// A Word package opened for writing.
///
/// The template's parts stay in memory untouched. Only the content types,
/// the main part and the main part's relationships are regenerated on save;
/// the main part is rebuilt from [`WordPackage::body`], which starts empty.
///
/// # Example
///
/// ```no_run
/// use xml2docx::detect::WordPackageKind;
/// use xml2docx::docx::WordPackage;
/// use xml2docx::model::Paragraph;
///
/// let mut package = WordPackage::open("report.dotx")?;
/// package.change_document_type(WordPackageKind::Document)?;
/// package.append_paragraph(Paragraph::heading("Report"));
/// package.save("report.docx")?;
/// # Ok::<(), xml2docx::Error>(())
/// ```
#[derive(Debug)]
pub struct WordPackage {
    container: OoxmlContainer,
    source_kind: WordPackageKind,
    kind: WordPackageKind,
    main_part: String,
    content_types: ContentTypes,
    main_rels: Relationships,
    styles: StyleMap,
    body: Body,
    /// Template parts left out on save
    dropped_parts: Vec<String>,
}

impl WordPackage {
    /// Open a package from a file path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes(data)
    }

    /// Open a package from its bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        if !is_zip_file(&data) {
            return Err(Error::UnknownFormat);
        }

        let container = OoxmlContainer::from_bytes(data)?;
        let content_types = container.read_content_types()?;
        let info = detect_package(&container, &content_types)?;

        let main_rels = container.read_relationships(&info.main_part)?;
        let styles = Self::read_styles(&container, &info.main_part, &main_rels)?;
        debug!(
            "opened {} with main part '{}', {} relationships, {} styles",
            info.kind,
            info.main_part,
            main_rels.len(),
            styles.len()
        );

        Ok(Self {
            container,
            source_kind: info.kind,
            kind: info.kind,
            main_part: info.main_part,
            content_types,
            main_rels,
            styles,
            body: Body::new(),
            dropped_parts: Vec::new(),
        })
    }

    fn read_styles(
        container: &OoxmlContainer,
        main_part: &str,
        main_rels: &Relationships,
    ) -> Result<StyleMap> {
        let styles_path = main_rels
            .get_by_type(STYLES_REL)
            .first()
            .map(|rel| OoxmlContainer::resolve_path(main_part, &rel.target))
            .unwrap_or_else(|| OoxmlContainer::resolve_path(main_part, "styles.xml"));

        if container.exists(&styles_path) {
            StyleMap::parse(&container.read_xml(&styles_path)?)
        } else {
            Ok(StyleMap::default())
        }
    }

    /// Kind of the package as opened.
    pub fn source_kind(&self) -> WordPackageKind {
        self.source_kind
    }

    /// Kind the package will be saved as.
    pub fn kind(&self) -> WordPackageKind {
        self.kind
    }

    /// Path of the main part inside the archive.
    pub fn main_part(&self) -> &str {
        &self.main_part
    }

    /// Change the package kind by rewriting the main part's content type.
    ///
    /// Only the macro-free kinds can be targeted. Converting a macro-enabled
    /// package drops its VBA project and the parts the project references.
    pub fn change_document_type(&mut self, kind: WordPackageKind) -> Result<()> {
        if kind.is_macro_enabled() {
            return Err(Error::UnsupportedFormat(kind.to_string()));
        }
        self.drop_macro_parts()?;
        self.content_types
            .set_override(&self.main_part, kind.content_type());
        self.kind = kind;
        Ok(())
    }

    fn drop_macro_parts(&mut self) -> Result<()> {
        for rel in self.main_rels.remove_by_type(VBA_PROJECT_REL) {
            if rel.external {
                continue;
            }
            let project = OoxmlContainer::resolve_path(&self.main_part, &rel.target);
            let referenced: Vec<String> = self
                .container
                .read_relationships(&project)?
                .iter()
                .filter(|child| !child.external)
                .map(|child| OoxmlContainer::resolve_path(&project, &child.target))
                .collect();

            for part in referenced {
                self.drop_part(part);
            }
            self.drop_part(OoxmlContainer::rels_path_for(&project));
            self.drop_part(project);
        }
        Ok(())
    }

    fn drop_part(&mut self, part: String) {
        debug!("dropping template part '{}'", part);
        self.content_types.remove_override(&part);
        self.dropped_parts.push(part);
    }

    /// Link the document to its template by absolute URI.
    ///
    /// Returns the new relationship ID.
    pub fn attach_template(&mut self, template_uri: &str) -> String {
        let id = self.main_rels.next_id();
        self.main_rels.add(Relationship::external(
            id.as_str(),
            ATTACHED_TEMPLATE_REL,
            template_uri,
        ));
        id
    }

    /// Relationships of the main part.
    pub fn relationships(&self) -> &Relationships {
        &self.main_rels
    }

    /// Content types that will be written.
    pub fn content_types(&self) -> &ContentTypes {
        &self.content_types
    }

    /// Styles defined by the template.
    pub fn styles(&self) -> &StyleMap {
        &self.styles
    }

    /// The document body.
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Append a paragraph to the body.
    pub fn append_paragraph(&mut self, paragraph: Paragraph) {
        self.body.push(paragraph);
    }

    /// Styles used by the body that the template does not define.
    pub fn missing_styles(&self) -> Vec<ParagraphStyle> {
        self.styles.missing_styles(&self.body.styles_used())
    }

    /// Serialize the package.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let main_rels_path = OoxmlContainer::rels_path_for(&self.main_part);
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        writer.start_file(CONTENT_TYPES_PATH, options)?;
        writer.write_all(self.content_types.to_xml().as_bytes())?;

        writer.start_file(self.main_part.as_str(), options)?;
        writer.write_all(document_xml(&self.body).as_bytes())?;

        writer.start_file(main_rels_path.as_str(), options)?;
        writer.write_all(self.main_rels.to_xml().as_bytes())?;

        let mut skip = vec![
            CONTENT_TYPES_PATH,
            self.main_part.as_str(),
            main_rels_path.as_str(),
        ];
        skip.extend(self.dropped_parts.iter().map(String::as_str));
        let copied = self.container.copy_parts_into(&mut writer, &skip)?;
        debug!("copied {} template parts", copied);

        Ok(writer.finish()?.into_inner())
    }

    /// Serialize the package and write it to `path`.
    ///
    /// Nothing is written if serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!(
            "saved {} ({} bytes) to {}",
            self.kind,
            bytes.len(),
            path.as_ref().display()
        );
        Ok(())
    }
}
