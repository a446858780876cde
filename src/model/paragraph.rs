//! Paragraph and paragraph style models.

use std::fmt;
use std::str::FromStr;

/// Paragraph style applied to generated content.
///
/// Names map one-to-one onto paragraph style IDs of the output document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ParagraphStyle {
    /// Body text in the template's default paragraph style
    #[default]
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
}

impl ParagraphStyle {
    /// Every style in numeric order.
    pub const ALL: [ParagraphStyle; 4] = [
        ParagraphStyle::Paragraph,
        ParagraphStyle::Heading1,
        ParagraphStyle::Heading2,
        ParagraphStyle::Heading3,
    ];

    /// Name as written in rules.
    pub fn name(&self) -> &'static str {
        match self {
            ParagraphStyle::Paragraph => "Paragraph",
            ParagraphStyle::Heading1 => "Heading1",
            ParagraphStyle::Heading2 => "Heading2",
            ParagraphStyle::Heading3 => "Heading3",
        }
    }

    /// Style ID emitted in `w:pStyle`, or `None` for the default style.
    pub fn style_id(&self) -> Option<&'static str> {
        match self {
            ParagraphStyle::Paragraph => None,
            other => Some(other.name()),
        }
    }

    /// Create a style from its numeric value (0-3).
    pub fn from_value(n: u8) -> Option<Self> {
        Self::ALL.get(n as usize).copied()
    }
}

impl fmt::Display for ParagraphStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ParagraphStyle {
    type Err = String;

    /// Parse a case-sensitive style name or its numeric value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(style) = Self::ALL.iter().find(|style| style.name() == s) {
            return Ok(*style);
        }
        s.parse::<u8>()
            .ok()
            .and_then(Self::from_value)
            .ok_or_else(|| format!("unknown paragraph style '{}'", s))
    }
}

/// A paragraph of generated text.
///
/// Each line becomes a text run; consecutive runs are separated by an
/// explicit line break.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    /// Paragraph style
    pub style: ParagraphStyle,
    /// Text lines, in order
    pub lines: Vec<String>,
}

impl Paragraph {
    /// Create a paragraph from text, splitting it on `\n`.
    ///
    /// A trailing `\r` on a line is dropped, so CRLF text yields the same
    /// lines as LF text. Empty text yields one empty line.
    pub fn with_text(style: ParagraphStyle, text: &str) -> Self {
        let lines = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect();
        Self { style, lines }
    }

    /// Create a `Heading1` paragraph.
    pub fn heading(text: &str) -> Self {
        Self::with_text(ParagraphStyle::Heading1, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_from_name() {
        assert_eq!(
            "Heading2".parse::<ParagraphStyle>().unwrap(),
            ParagraphStyle::Heading2
        );
        assert_eq!(
            "Paragraph".parse::<ParagraphStyle>().unwrap(),
            ParagraphStyle::Paragraph
        );
        assert!("heading2".parse::<ParagraphStyle>().is_err());
        assert!("Heading4".parse::<ParagraphStyle>().is_err());
        assert!("".parse::<ParagraphStyle>().is_err());
    }

    #[test]
    fn test_style_from_number() {
        assert_eq!(
            "0".parse::<ParagraphStyle>().unwrap(),
            ParagraphStyle::Paragraph
        );
        assert_eq!(
            "3".parse::<ParagraphStyle>().unwrap(),
            ParagraphStyle::Heading3
        );
        assert!("4".parse::<ParagraphStyle>().is_err());
        assert!("-1".parse::<ParagraphStyle>().is_err());
    }

    #[test]
    fn test_style_ids() {
        assert_eq!(ParagraphStyle::Paragraph.style_id(), None);
        assert_eq!(ParagraphStyle::Heading1.style_id(), Some("Heading1"));
        assert_eq!(ParagraphStyle::from_value(2), Some(ParagraphStyle::Heading2));
        assert_eq!(ParagraphStyle::Heading1.to_string(), "Heading1");
    }

    #[test]
    fn test_paragraph_lines() {
        let para = Paragraph::with_text(ParagraphStyle::Paragraph, "Line1\nLine2");
        assert_eq!(para.lines, vec!["Line1", "Line2"]);

        let para = Paragraph::with_text(ParagraphStyle::Paragraph, "a\r\nb\r\n");
        assert_eq!(para.lines, vec!["a", "b", ""]);
    }

    #[test]
    fn test_empty_paragraph() {
        let para = Paragraph::with_text(ParagraphStyle::Heading1, "");
        assert_eq!(para.lines, vec![""]);
        assert_eq!(Paragraph::heading("Title").style, ParagraphStyle::Heading1);
    }
}
