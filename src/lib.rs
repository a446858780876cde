//! # xml2docx
//!
//! Extract values from an XML document with XPath rules and write them as
//! styled paragraphs into a Word document built from a template.
//!
//! ## Quick Start
//!
//! ```no_run
//! use xml2docx::{run, ConvertOptions, Invocation};
//!
//! let invocation = Invocation::from_args(&[
//!     "workitems.xml",
//!     "utf-8",
//!     "Default.dotx",
//!     "workitems.docx",
//!     "/WorkItems/WorkItem",
//!     "Heading2:./Fields/Field[@Name='Title']:Value:",
//!     "Paragraph:./Fields/Field[@Name='State']::State: {0}",
//! ])
//! .expect("five positional arguments");
//!
//! let outcome = run(&invocation, &ConvertOptions::default());
//! if !outcome.is_success() {
//!     eprint!("{}", outcome.report());
//! }
//! ```
//!
//! ## In-Memory Conversion
//!
//! ```no_run
//! use xml2docx::{render_bytes, ConvertOptions};
//!
//! let xml = std::fs::read_to_string("workitems.xml")?;
//! let template = std::fs::read("Default.dotx")?;
//! let docx = render_bytes(
//!     &xml,
//!     "/WorkItems/WorkItem",
//!     &["Heading2:./Title::"],
//!     template,
//!     &ConvertOptions::new().with_title("Work items"),
//! )?;
//! std::fs::write("workitems.docx", docx)?;
//! # Ok::<(), xml2docx::Error>(())
//! ```

pub mod container;
pub mod detect;
pub mod docx;
pub mod encoding;
pub mod error;
pub mod extract;
pub mod format;
pub mod model;
pub mod options;
pub mod pipeline;
pub mod rule;
pub mod xpath;

// Re-exports
pub use container::{ContentTypes, OoxmlContainer, Relationship, Relationships};
pub use detect::{detect_package_from_bytes, detect_package_from_path, WordPackageKind};
pub use docx::WordPackage;
pub use encoding::{list_encodings, resolve_encoding, EncodingInfo};
pub use error::{Error, Result};
pub use model::{Body, Paragraph, ParagraphStyle};
pub use options::ConvertOptions;
pub use pipeline::{format_error_report, run, ErrorMessage, ExitCode, Invocation, Outcome};
pub use rule::{parse_rules, ItemRule, RuleError, RulePath};
pub use xpath::XPath;

/// Convert XML text into Word package bytes without touching the file
/// system.
///
/// Works like [`run`] but reports the first problem as an [`Error`]:
/// rule arguments that cannot be parsed are an [`Error::InvalidData`], a
/// rule XPath that does not compile is an [`Error::XPathSyntax`], and a
/// root XPath matching nothing is an [`Error::Extraction`]. Without
/// template or input paths there is no template link, and the title comes
/// from `options` alone.
pub fn render_bytes<S: AsRef<str>>(
    xml: &str,
    root_xpath: &str,
    rules: &[S],
    template: Vec<u8>,
    options: &ConvertOptions,
) -> Result<Vec<u8>> {
    let document = roxmltree::Document::parse_with_options(
        xml,
        roxmltree::ParsingOptions {
            allow_dtd: true,
            ..roxmltree::ParsingOptions::default()
        },
    )?;

    let parsed = parse_rules(rules);
    if !parsed.errors.is_empty() {
        let messages: Vec<String> = parsed.errors.iter().map(|e| e.to_string()).collect();
        return Err(Error::InvalidData(messages.join(" ")));
    }

    let elements = XPath::compile(root_xpath)?.select_elements(document.root_element())?;
    if elements.is_empty() {
        return Err(Error::Extraction(format!(
            "no element matches '{}'",
            root_xpath
        )));
    }

    let mut package = WordPackage::from_bytes(template)?;
    package.change_document_type(WordPackageKind::Document)?;
    let title = options.title.as_deref().unwrap_or(&options.default_title);
    package.append_paragraph(Paragraph::heading(title));
    package.append_paragraph(Paragraph::with_text(
        ParagraphStyle::Paragraph,
        &options.timestamp_line(),
    ));

    for paragraph in extract::extract_paragraphs(&elements, &parsed.rules)? {
        package.append_paragraph(paragraph);
    }
    package.to_bytes()
}
