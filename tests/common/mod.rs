//! Shared fixtures for integration tests: an in-memory Word template and
//! helpers to inspect produced packages.

#![allow(dead_code)]

use chrono::{DateTime, FixedOffset};
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use xml2docx::{ConvertOptions, OoxmlContainer};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

pub const TEMPLATE_CT: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.template.main+xml";

pub const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
  <w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:pPr><w:outlineLvl w:val="0"/></w:pPr></w:style>
  <w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:pPr><w:outlineLvl w:val="1"/></w:pPr></w:style>
</w:styles>"#;

/// Bytes standing in for an image part, stored uncompressed.
pub const LOGO_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n-not-really-a-png-";

/// Work items used by most tests.
pub const WORK_ITEMS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<WorkItems>
  <WorkItem id="1">
    <Fields>
      <Field Name="Title" Value="Report A"/>
      <Field Name="State" Value="Active"/>
      <Field Name="Notes">Line1
Line2</Field>
    </Fields>
  </WorkItem>
  <WorkItem id="2">
    <Fields>
      <Field Name="Title" Value="Report B"/>
      <Field Name="State" Value="Closed"/>
      <Field Name="Notes">Single</Field>
    </Fields>
  </WorkItem>
</WorkItems>"#;

pub const MACRO_TEMPLATE_CT: &str =
    "application/vnd.ms-word.template.macroEnabledTemplate.main+xml";

/// Build a Word template package with the given main-part content type.
pub fn template_bytes(main_content_type: &str) -> Vec<u8> {
    build_template(main_content_type, false)
}

/// Build a macro-enabled template carrying a VBA project.
pub fn macro_template_bytes() -> Vec<u8> {
    build_template(MACRO_TEMPLATE_CT, true)
}

fn build_template(main_content_type: &str, with_macros: bool) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    zip.start_file("[Content_Types].xml", options).unwrap();
    write!(
        zip,
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Default Extension="png" ContentType="image/png"/>
  <Override PartName="/word/document.xml" ContentType="{}"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>{}
</Types>"#,
        main_content_type,
        if with_macros {
            r#"
  <Default Extension="bin" ContentType="application/vnd.ms-office.vbaProject"/>
  <Override PartName="/word/vbaData.xml" ContentType="application/vnd.ms-word.vbaData+xml"/>"#
        } else {
            ""
        }
    )
    .unwrap();

    zip.start_file("_rels/.rels", options).unwrap();
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#,
    )
    .unwrap();

    zip.start_file("word/_rels/document.xml.rels", options).unwrap();
    write!(
        zip,
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/logo.png"/>{}
</Relationships>"#,
        if with_macros {
            r#"
  <Relationship Id="rId3" Type="http://schemas.microsoft.com/office/2006/relationships/vbaProject" Target="vbaProject.bin"/>"#
        } else {
            ""
        }
    )
    .unwrap();

    if with_macros {
        zip.start_file("word/vbaProject.bin", stored).unwrap();
        zip.write_all(b"\xD0\xCF\x11\xE0not-really-ole").unwrap();

        zip.start_file("word/_rels/vbaProject.bin.rels", options).unwrap();
        zip.write_all(
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.microsoft.com/office/2006/relationships/wordVbaData" Target="vbaData.xml"/>
</Relationships>"#,
        )
        .unwrap();

        zip.start_file("word/vbaData.xml", options).unwrap();
        zip.write_all(
            br#"<wne:vbaSuppData xmlns:wne="http://schemas.microsoft.com/office/word/2006/wordml"/>"#,
        )
        .unwrap();
    }

    zip.start_file("word/document.xml", options).unwrap();
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Template body text</w:t></w:r></w:p>
    <w:sectPr/>
  </w:body>
</w:document>"#,
    )
    .unwrap();

    zip.start_file("word/styles.xml", options).unwrap();
    zip.write_all(STYLES_XML.as_bytes()).unwrap();

    zip.start_file("word/media/logo.png", stored).unwrap();
    zip.write_all(LOGO_BYTES).unwrap();

    zip.finish().unwrap().into_inner()
}

/// Write a file into `dir` and return its path.
pub fn write_file(dir: &Path, name: &str, content: impl AsRef<[u8]>) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Write the default template into `dir`.
pub fn write_template(dir: &Path) -> PathBuf {
    write_file(dir, "Report.dotx", template_bytes(TEMPLATE_CT))
}

/// Options with a pinned timestamp.
pub fn fixed_options() -> ConvertOptions {
    ConvertOptions::new().with_timestamp(fixed_time())
}

pub fn fixed_time() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2024-05-06T07:08:09.5+02:00").unwrap()
}

/// Read a part of a produced package as text.
pub fn read_part(package: &Path, part: &str) -> String {
    OoxmlContainer::open(package)
        .unwrap()
        .read_xml(part)
        .unwrap()
}

/// Read a part of a package as raw bytes.
pub fn read_raw_part(package: &Path, part: &str) -> Vec<u8> {
    use std::io::Read;
    let file = fs::File::open(package).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut entry = archive.by_name(part).unwrap();
    let mut data = Vec::new();
    entry.read_to_end(&mut data).unwrap();
    data
}

/// A paragraph of a produced document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphView {
    pub style: Option<String>,
    pub runs: Vec<String>,
    pub breaks: usize,
}

impl ParagraphView {
    pub fn text(&self) -> String {
        self.runs.join("\n")
    }
}

/// Paragraphs of a produced document's body, in order.
pub fn paragraphs(package: &Path) -> Vec<ParagraphView> {
    let xml = read_part(package, "word/document.xml");
    let doc = roxmltree::Document::parse(&xml).unwrap();
    doc.descendants()
        .filter(|n| n.has_tag_name((W_NS, "p")))
        .map(|p| ParagraphView {
            style: p
                .descendants()
                .find(|n| n.has_tag_name((W_NS, "pStyle")))
                .and_then(|n| n.attribute((W_NS, "val")))
                .map(String::from),
            runs: p
                .children()
                .filter(|n| n.has_tag_name((W_NS, "r")))
                .map(|r| {
                    r.descendants()
                        .filter(|n| n.has_tag_name((W_NS, "t")))
                        .filter_map(|t| t.text())
                        .collect::<String>()
                })
                .collect(),
            breaks: p
                .descendants()
                .filter(|n| n.has_tag_name((W_NS, "br")))
                .count(),
        })
        .collect()
}
