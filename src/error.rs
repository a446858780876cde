//! Error types for the xml2docx library.

use std::io;
use thiserror::Error;

/// Result type alias for xml2docx operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading the input or building the document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The package format could not be determined.
    #[error("Unknown file format")]
    UnknownFormat,

    /// The package format is recognized but not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Error reading or writing the ZIP archive.
    #[error("ZIP archive error: {0}")]
    ZipArchive(String),

    /// Error parsing XML content.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// An XPath expression could not be compiled.
    #[error("Invalid XPath '{expr}': {reason}")]
    XPathSyntax { expr: String, reason: String },

    /// An XPath expression failed during evaluation.
    #[error("XPath evaluation error: {0}")]
    XPathEval(String),

    /// A composite format string is malformed.
    #[error("Input string was not in a correct format: {0}")]
    Format(String),

    /// The requested text encoding is unknown.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// A value could not be extracted from the input document.
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// Invalid or malformed data in the package.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A required package component is missing.
    #[error("Missing component: {0}")]
    MissingComponent(String),
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipArchive(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<roxmltree::Error> for Error {
    fn from(err: roxmltree::Error) -> Self {
        Error::XmlParse(err.to_string())
    }
}
