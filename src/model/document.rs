//! Document body model.

use super::{Paragraph, ParagraphStyle};

/// The body of a generated document.
///
/// Paragraphs are kept in insertion order, which is the order they are
/// serialized in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Body {
    paragraphs: Vec<Paragraph>,
}

impl Body {
    /// Create a new empty body.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a paragraph.
    pub fn push(&mut self, paragraph: Paragraph) {
        self.paragraphs.push(paragraph);
    }

    /// Paragraphs in document order.
    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    /// Number of paragraphs.
    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    /// Check if the body has no paragraphs.
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    /// Distinct styles used by the body, in first-use order.
    pub fn styles_used(&self) -> Vec<ParagraphStyle> {
        let mut styles = Vec::new();
        for para in &self.paragraphs {
            if !styles.contains(&para.style) {
                styles.push(para.style);
            }
        }
        styles
    }
}
