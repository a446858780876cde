//! Output document model.
//!
//! The pipeline builds a [`Body`] of styled [`Paragraph`]s; the `docx`
//! module serializes it into the package's main part.

mod document;
mod paragraph;

pub use document::*;
pub use paragraph::*;
