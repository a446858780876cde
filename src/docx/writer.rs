//! Main document part serialization.

use crate::model::{Body, Paragraph};
use quick_xml::escape::escape;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Serialize a body into a complete `word/document.xml`.
pub fn document_xml(body: &Body) -> String {
    let mut xml = String::with_capacity(256 + body.len() * 128);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(&format!(
        r#"<w:document xmlns:w="{}" xmlns:r="{}"><w:body>"#,
        W_NS, R_NS
    ));
    for para in body.paragraphs() {
        write_paragraph(&mut xml, para);
    }
    xml.push_str("</w:body></w:document>");
    xml
}

/// Append one `w:p` element.
///
/// Every line is a run; all runs but the last end in a `w:br`.
fn write_paragraph(xml: &mut String, para: &Paragraph) {
    xml.push_str("<w:p>");
    if let Some(style_id) = para.style.style_id() {
        xml.push_str(&format!(
            r#"<w:pPr><w:pStyle w:val="{}"/></w:pPr>"#,
            style_id
        ));
    }

    let last = para.lines.len().saturating_sub(1);
    for (i, line) in para.lines.iter().enumerate() {
        xml.push_str("<w:r>");
        let text = xml_text(line);
        if !text.is_empty() {
            xml.push_str(r#"<w:t xml:space="preserve">"#);
            xml.push_str(&escape(text.as_str()));
            xml.push_str("</w:t>");
        }
        if i < last {
            xml.push_str("<w:br/>");
        }
        xml.push_str("</w:r>");
    }

    xml.push_str("</w:p>");
}

/// Drop characters XML 1.0 cannot carry.
fn xml_text(s: &str) -> String {
    s.chars()
        .filter(|&c| {
            matches!(c, '\t' | '\n' | '\r')
                || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ParagraphStyle;

    fn body_of(paras: Vec<Paragraph>) -> Body {
        let mut body = Body::new();
        for p in paras {
            body.push(p);
        }
        body
    }

    #[test]
    fn test_empty_body() {
        let xml = document_xml(&Body::new());
        assert!(xml.starts_with("<?xml"));
        assert!(xml.ends_with("<w:body></w:body></w:document>"));
    }

    #[test]
    fn test_heading_paragraph() {
        let xml = document_xml(&body_of(vec![Paragraph::heading("Report A")]));
        assert!(xml.contains(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t xml:space="preserve">Report A</w:t></w:r></w:p>"#
        ));
    }

    #[test]
    fn test_plain_paragraph_has_no_style() {
        let xml = document_xml(&body_of(vec![Paragraph::with_text(
            ParagraphStyle::Paragraph,
            " Static line",
        )]));
        assert!(!xml.contains("w:pStyle"));
        assert!(xml.contains(r#"<w:t xml:space="preserve"> Static line</w:t>"#));
    }

    #[test]
    fn test_line_breaks() {
        let xml = document_xml(&body_of(vec![Paragraph::with_text(
            ParagraphStyle::Paragraph,
            "Line1\nLine2",
        )]));
        assert!(xml.contains(
            r#"<w:r><w:t xml:space="preserve">Line1</w:t><w:br/></w:r><w:r><w:t xml:space="preserve">Line2</w:t></w:r>"#
        ));
        assert_eq!(xml.matches("<w:br/>").count(), 1);
    }

    #[test]
    fn test_escaping_and_control_chars() {
        let xml = document_xml(&body_of(vec![Paragraph::with_text(
            ParagraphStyle::Paragraph,
            "a < b & \"c\"\u{1}",
        )]));
        assert!(xml.contains("a &lt; b &amp; &quot;c&quot;</w:t>"));
        assert!(!xml.contains('\u{1}'));
    }
}
