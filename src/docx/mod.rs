//! Word package writing.
//!
//! A [`WordPackage`] is opened from a template, receives a fresh body and
//! is saved as a standalone document.

mod package;
pub mod styles;
mod writer;

pub use package::{WordPackage, ATTACHED_TEMPLATE_REL, STYLES_REL};
pub use styles::StyleMap;
pub use writer::document_xml;
