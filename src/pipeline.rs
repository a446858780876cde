//! The conversion pipeline.
//!
//! Seven stages run in order; the first stage that records an error stops
//! the run. Every stage reports through [`RunContext`], which collects the
//! error messages and the exit code of the failure.

use crate::detect::WordPackageKind;
use crate::docx::WordPackage;
use crate::encoding::{decode, resolve_encoding};
use crate::error::{Error, Result};
use crate::extract::extract_paragraphs;
use crate::model::{Paragraph, ParagraphStyle};
use crate::options::ConvertOptions;
use crate::rule::parse_rules;
use crate::xpath::XPath;
use encoding_rs::Encoding;
use log::{debug, info, warn};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitCode {
    Success,
    Usage,
    EncodingsListed,
    /// A stage failed without setting a code
    Unknown,
    InputMissing,
    TemplateMissing,
    InvalidEncoding,
    XmlReadFailed,
    DocumentInitFailed,
    RootNotFound,
    RuleParseFailed,
    SaveFailed,
    /// Rule arguments could not be parsed at all; per-argument problems
    /// are `RuleParseFailed`
    RuleParseException,
    ExtractionFailed,
}

impl ExitCode {
    /// Numeric process exit code.
    pub fn code(self) -> i32 {
        match self {
            ExitCode::Success => 0,
            ExitCode::Usage => 1,
            ExitCode::EncodingsListed => 2,
            ExitCode::Unknown => 99,
            ExitCode::InputMissing => 100,
            ExitCode::TemplateMissing => 101,
            ExitCode::InvalidEncoding => 102,
            ExitCode::XmlReadFailed => 103,
            ExitCode::DocumentInitFailed => 104,
            ExitCode::RootNotFound => 105,
            ExitCode::RuleParseFailed => 106,
            ExitCode::SaveFailed => 107,
            ExitCode::RuleParseException => 108,
            ExitCode::ExtractionFailed => 109,
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A reported error: a short message and an optional detail line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMessage {
    pub message: String,
    pub detail: Option<String>,
}

impl ErrorMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: Some(detail.into()),
        }
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}\n{}", self.message, detail),
            None => f.write_str(&self.message),
        }
    }
}

/// Per-run state shared by the stages.
#[derive(Debug, Default)]
pub struct RunContext {
    errors: Vec<ErrorMessage>,
    encoding: Option<&'static Encoding>,
    title: Option<String>,
    exit_code: Option<ExitCode>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error without touching the exit code.
    pub fn add_error(&mut self, error: ErrorMessage) {
        debug!("recorded error: {}", error.message);
        self.errors.push(error);
    }

    /// Record an error and the exit code it maps to.
    pub fn fail(&mut self, code: ExitCode, error: ErrorMessage) {
        self.exit_code = Some(code);
        self.add_error(error);
    }

    /// Set the exit code used if the current stage fails.
    pub fn set_exit_code(&mut self, code: ExitCode) {
        self.exit_code = Some(code);
    }

    /// Whether the run is still error free.
    pub fn check_errors(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ErrorMessage] {
        &self.errors
    }

    pub fn encoding(&self) -> Option<&'static Encoding> {
        self.encoding
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn exit_code(&self) -> Option<ExitCode> {
        self.exit_code
    }

    fn finish(self, completed: bool, paragraphs: usize) -> Outcome {
        let exit_code = if completed && self.errors.is_empty() {
            ExitCode::Success
        } else {
            self.exit_code.unwrap_or(ExitCode::Unknown)
        };
        Outcome {
            exit_code,
            errors: self.errors,
            paragraphs,
        }
    }
}

/// Arguments of a conversion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// XML file to read
    pub input: PathBuf,
    /// Name of the XML file's text encoding
    pub encoding: String,
    /// Word template (.dotx/.docx)
    pub template: PathBuf,
    /// Word document to write
    pub output: PathBuf,
    /// XPath selecting the repeating elements
    pub root_xpath: String,
    /// Extraction rules, `Style:xpath:[attribute]:[format]`
    pub rules: Vec<String>,
}

impl Invocation {
    /// Minimum number of positional arguments.
    pub const MIN_ARGS: usize = 5;

    /// Build from positional arguments; `None` when fewer than five.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Option<Self> {
        if args.len() < Self::MIN_ARGS {
            return None;
        }
        Some(Self {
            input: PathBuf::from(args[0].as_ref()),
            encoding: args[1].as_ref().to_string(),
            template: PathBuf::from(args[2].as_ref()),
            output: PathBuf::from(args[3].as_ref()),
            root_xpath: args[4].as_ref().to_string(),
            rules: args[5..].iter().map(|s| s.as_ref().to_string()).collect(),
        })
    }
}

/// Result of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub exit_code: ExitCode,
    /// Every error recorded, in order
    pub errors: Vec<ErrorMessage>,
    /// Paragraphs written to the body, title and timestamp included
    pub paragraphs: usize,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        self.exit_code == ExitCode::Success
    }

    /// Plain-text error report; empty on success.
    pub fn report(&self) -> String {
        format_error_report(&self.errors)
    }
}

/// Format errors as the report printed on failure.
pub fn format_error_report(errors: &[ErrorMessage]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let mut out = String::from("Errors occured\n===============\n\n");
    for error in errors {
        out.push_str(&error.to_string());
        out.push_str("\n\n");
    }
    out.push('\n');
    out
}

/// Run a conversion.
///
/// # Example
///
/// ```no_run
/// use xml2docx::{run, ConvertOptions, Invocation};
///
/// let invocation = Invocation::from_args(&[
///     "items.xml",
///     "utf-8",
///     "report.dotx",
///     "report.docx",
///     "/WorkItems/WorkItem",
///     "Heading2:./Fields/Field[@Name='Title']:Value:",
/// ])
/// .unwrap();
/// let outcome = run(&invocation, &ConvertOptions::default());
/// std::process::exit(outcome.exit_code.code());
/// ```
pub fn run(invocation: &Invocation, options: &ConvertOptions) -> Outcome {
    let mut ctx = RunContext::new();
    let mut paragraphs = 0;
    let completed = execute(&mut ctx, invocation, options, &mut paragraphs);
    ctx.finish(completed, paragraphs)
}

fn execute(
    ctx: &mut RunContext,
    inv: &Invocation,
    options: &ConvertOptions,
    paragraphs: &mut usize,
) -> bool {
    if !(verify_input_file(ctx, &inv.input, options)
        && verify_xml_encoding(ctx, &inv.encoding)
        && verify_template_file(ctx, &inv.template))
    {
        return false;
    }

    let Some(text) = read_xml_file(ctx, &inv.input) else {
        return false;
    };
    let Some(document) = parse_xml_text(ctx, &text) else {
        return false;
    };
    let Some(mut package) = prepare_word_file(ctx, &inv.template, options) else {
        return false;
    };

    let ok = generate_content(ctx, &document, &inv.root_xpath, &inv.rules, &mut package)
        && commit_word_file(ctx, &package, &inv.output);
    *paragraphs = package.body().len();
    ok
}

/// Check that the input exists and derive the title from its file stem.
fn verify_input_file(ctx: &mut RunContext, path: &Path, options: &ConvertOptions) -> bool {
    if !path.is_file() {
        ctx.fail(
            ExitCode::InputMissing,
            ErrorMessage::new(format!("File does not exist '{}'", path.display())),
        );
    }

    ctx.title = options.title.clone().or_else(|| {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
    });

    ctx.check_errors()
}

fn verify_template_file(ctx: &mut RunContext, path: &Path) -> bool {
    if !path.is_file() {
        ctx.fail(
            ExitCode::TemplateMissing,
            ErrorMessage::new(format!("File does not exist '{}'", path.display())),
        );
    }
    ctx.check_errors()
}

fn verify_xml_encoding(ctx: &mut RunContext, name: &str) -> bool {
    match resolve_encoding(name) {
        Ok(encoding) => {
            debug!("using encoding {} for '{}'", encoding.name(), name);
            ctx.encoding = Some(encoding);
        }
        Err(_) => ctx.fail(
            ExitCode::InvalidEncoding,
            ErrorMessage::new(format!("Invalid encoding '{}'.", name)),
        ),
    }
    ctx.check_errors()
}

fn read_failed(ctx: &mut RunContext, err: impl fmt::Display) {
    ctx.fail(
        ExitCode::XmlReadFailed,
        ErrorMessage::with_detail("Failed to read XML file", err.to_string()),
    );
}

/// Read and decode the input file.
fn read_xml_file(ctx: &mut RunContext, path: &Path) -> Option<String> {
    let encoding = ctx.encoding.unwrap_or(encoding_rs::UTF_8);
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            read_failed(ctx, e);
            return None;
        }
    };

    let decoded = decode(&bytes, encoding);
    if decoded.had_errors {
        warn!(
            "'{}' contains byte sequences that are not valid {}; they were replaced",
            path.display(),
            decoded.encoding.name()
        );
    }
    debug!("read {} bytes from {}", bytes.len(), path.display());
    Some(decoded.text.into_owned())
}

fn parse_xml_text<'input>(
    ctx: &mut RunContext,
    text: &'input str,
) -> Option<roxmltree::Document<'input>> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    match roxmltree::Document::parse_with_options(text, options) {
        Ok(document) => Some(document),
        Err(e) => {
            read_failed(ctx, Error::from(e));
            None
        }
    }
}

/// Open the template and start the output document.
fn prepare_word_file(
    ctx: &mut RunContext,
    template: &Path,
    options: &ConvertOptions,
) -> Option<WordPackage> {
    let title = ctx
        .title
        .clone()
        .unwrap_or_else(|| options.default_title.clone());
    match init_document(template, &title, options) {
        Ok(package) => Some(package),
        Err(e) => {
            ctx.fail(
                ExitCode::DocumentInitFailed,
                ErrorMessage::with_detail("Failed to create in-memory Word document.", e.to_string()),
            );
            None
        }
    }
}

fn init_document(template: &Path, title: &str, options: &ConvertOptions) -> Result<WordPackage> {
    let mut package = WordPackage::open(template)?;
    let source = package.source_kind();
    debug!("template kind: {} (.{})", source, source.extension());
    package.change_document_type(WordPackageKind::Document)?;

    if options.attach_template {
        let uri = template_uri(template)?;
        let id = package.attach_template(uri.as_str());
        debug!("attached template {} as {}", uri, id);
    }

    package.append_paragraph(Paragraph::heading(title));
    package.append_paragraph(Paragraph::with_text(
        ParagraphStyle::Paragraph,
        &options.timestamp_line(),
    ));
    Ok(package)
}

/// Absolute `file://` URI of the template.
pub fn template_uri(path: &Path) -> Result<Url> {
    let absolute = std::path::absolute(path)?;
    Url::from_file_path(&absolute).map_err(|_| {
        Error::InvalidData(format!(
            "cannot express '{}' as a file URI",
            absolute.display()
        ))
    })
}

/// Match the root elements, parse the rules and append the paragraphs.
fn generate_content(
    ctx: &mut RunContext,
    document: &roxmltree::Document<'_>,
    root_xpath: &str,
    rule_specs: &[String],
    package: &mut WordPackage,
) -> bool {
    let not_found = format!("Cound not find root element from path '{}'", root_xpath);
    let elements = match XPath::compile(root_xpath)
        .and_then(|xpath| xpath.select_elements(document.root_element()))
    {
        Ok(elements) if !elements.is_empty() => elements,
        Ok(_) => {
            ctx.fail(ExitCode::RootNotFound, ErrorMessage::new(not_found));
            return false;
        }
        Err(e) => {
            ctx.fail(
                ExitCode::RootNotFound,
                ErrorMessage::with_detail(not_found, e.to_string()),
            );
            return false;
        }
    };
    debug!("'{}' matched {} elements", root_xpath, elements.len());

    ctx.set_exit_code(ExitCode::RuleParseFailed);
    let parsed = parse_rules(rule_specs);
    for error in &parsed.errors {
        ctx.add_error(ErrorMessage::new(error.to_string()));
    }
    let rules = parsed.rules;
    debug!("parsed {} of {} rules", rules.len(), rule_specs.len());

    match extract_paragraphs(&elements, &rules) {
        Ok(paragraphs) => {
            for paragraph in paragraphs {
                package.append_paragraph(paragraph);
            }
        }
        Err(e) => ctx.fail(
            ExitCode::ExtractionFailed,
            ErrorMessage::with_detail(
                "An error occured while generating the document content.",
                e.to_string(),
            ),
        ),
    }

    for style in package.missing_styles() {
        warn!("template does not define paragraph style '{}'", style);
    }

    ctx.check_errors()
}

fn commit_word_file(ctx: &mut RunContext, package: &WordPackage, output: &Path) -> bool {
    if let Err(e) = package.save(output) {
        ctx.fail(
            ExitCode::SaveFailed,
            ErrorMessage::with_detail("Failed to save word document.", e.to_string()),
        );
    } else {
        info!(
            "wrote {} paragraphs to {}",
            package.body().len(),
            output.display()
        );
    }
    ctx.check_errors()
}
