//! Applies extraction rules to matched XML elements.

use crate::error::{Error, Result};
use crate::format::format_value;
use crate::model::Paragraph;
use crate::rule::{ItemRule, RulePath};
use crate::xpath::XNode;
use log::trace;
use roxmltree::Node;

/// Compute the value of one rule for one matched element.
///
/// - with a path: the first selected element's attribute or text,
///   substituted into the format when one is given;
/// - without a path: the format text itself, or the empty string;
/// - with a path that does not compile: the syntax error.
pub fn extract_value(rule: &ItemRule, element: Node<'_, '_>) -> Result<String> {
    let path = match &rule.path {
        RulePath::Literal => return Ok(rule.format.clone().unwrap_or_default()),
        RulePath::Compiled(path) => path,
        RulePath::Invalid { expr, reason } => {
            return Err(Error::XPathSyntax {
                expr: expr.clone(),
                reason: reason.clone(),
            })
        }
    };

    let target = path.select_element(element)?.ok_or_else(|| {
        Error::Extraction(format!(
            "no element matches '{}' below <{}>",
            path,
            element.tag_name().name()
        ))
    })?;

    let value = match &rule.attribute {
        Some(name) => attribute_value(target, name)?,
        None => XNode::Tree(target).string_value(),
    };

    match &rule.format {
        Some(format) => format_value(format, &value),
        None => Ok(value),
    }
}

/// Read an attribute by name. A `prefix:local` name resolves its prefix
/// in scope of the element.
fn attribute_value(element: Node<'_, '_>, name: &str) -> Result<String> {
    let found = match name.split_once(':') {
        Some((prefix, local)) => element
            .lookup_namespace_uri(Some(prefix))
            .and_then(|uri| element.attribute((uri, local))),
        None => element.attribute(name),
    };

    found.map(str::to_string).ok_or_else(|| {
        Error::Extraction(format!(
            "element <{}> has no attribute '{}'",
            element.tag_name().name(),
            name
        ))
    })
}

/// Build the paragraphs for every matched element, rule by rule.
///
/// The first failure aborts extraction.
pub fn extract_paragraphs(elements: &[Node<'_, '_>], rules: &[ItemRule]) -> Result<Vec<Paragraph>> {
    let mut paragraphs = Vec::with_capacity(elements.len() * rules.len());
    for (index, element) in elements.iter().enumerate() {
        for rule in rules {
            let value = extract_value(rule, *element)?;
            trace!("element {} -> {} '{}'", index + 1, rule.style, value);
            paragraphs.push(Paragraph::with_text(rule.style, &value));
        }
    }
    Ok(paragraphs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ParagraphStyle;
    use crate::rule::parse_rules;

    const ITEMS: &str = r#"<WorkItems xmlns:m="urn:meta">
  <WorkItem id="1" m:owner="ann">
    <Fields>
      <Field Name="Title" Value="Report A"/>
      <Field Name="Notes">Line1
Line2</Field>
    </Fields>
  </WorkItem>
  <WorkItem id="2">
    <Fields>
      <Field Name="Title" Value="Report B"/>
    </Fields>
  </WorkItem>
</WorkItems>"#;

    fn items<'a, 'input>(doc: &'a roxmltree::Document<'input>) -> Vec<Node<'a, 'input>> {
        doc.root_element()
            .children()
            .filter(|n| n.is_element())
            .collect()
    }

    fn rule(spec: &str) -> ItemRule {
        parse_rules(&[spec]).rules.remove(0)
    }

    #[test]
    fn test_attribute_value() {
        let doc = roxmltree::Document::parse(ITEMS).unwrap();
        let items = items(&doc);
        let rule = rule("Heading2:./Fields/Field[@Name='Title']:Value:");
        assert_eq!(extract_value(&rule, items[0]).unwrap(), "Report A");
        assert_eq!(extract_value(&rule, items[1]).unwrap(), "Report B");
    }

    #[test]
    fn test_text_and_format() {
        let doc = roxmltree::Document::parse(ITEMS).unwrap();
        let rule = rule("Paragraph:Fields/Field[@Name='Notes']::Notes: {0}");
        assert_eq!(
            extract_value(&rule, items(&doc)[0]).unwrap(),
            "Notes: Line1\nLine2"
        );
    }

    #[test]
    fn test_prefixed_attribute() {
        let doc = roxmltree::Document::parse(ITEMS).unwrap();
        let element = items(&doc)[0];
        assert_eq!(attribute_value(element, "m:owner").unwrap(), "ann");
        assert!(attribute_value(element, "x:owner").is_err());
        assert_eq!(attribute_value(element, "id").unwrap(), "1");
    }

    #[test]
    fn test_literal_and_empty_rules() {
        let doc = roxmltree::Document::parse(ITEMS).unwrap();
        let element = items(&doc)[0];
        assert_eq!(
            extract_value(&rule("Paragraph::: Static line"), element).unwrap(),
            " Static line"
        );
        assert_eq!(extract_value(&rule("Paragraph::x:"), element).unwrap(), "");
    }

    #[test]
    fn test_missing_targets_fail() {
        let doc = roxmltree::Document::parse(ITEMS).unwrap();
        let element = items(&doc)[1];
        let missing_element = rule("Paragraph:Fields/Field[@Name='Notes']::");
        assert!(matches!(
            extract_value(&missing_element, element),
            Err(Error::Extraction(_))
        ));
        let missing_attribute = rule("Paragraph:Fields/Field:Other:");
        assert!(matches!(
            extract_value(&missing_attribute, element),
            Err(Error::Extraction(_))
        ));
    }

    #[test]
    fn test_uncompiled_path_fails_when_applied() {
        let doc = roxmltree::Document::parse(ITEMS).unwrap();
        let rule = rule("Paragraph:Fields/Field[:Value:");
        assert!(matches!(
            extract_value(&rule, items(&doc)[0]),
            Err(Error::XPathSyntax { .. })
        ));
    }

    #[test]
    fn test_indented_element_text() {
        let doc = roxmltree::Document::parse(
            "<Items>\n  <Item>\n    <Desc>\n      <b>bold</b>\n      <i>it</i>\n    </Desc>\n  </Item>\n</Items>",
        )
        .unwrap();
        let rule = rule("Paragraph:Desc::");
        assert_eq!(extract_value(&rule, items(&doc)[0]).unwrap(), "boldit");
    }

    #[test]
    fn test_bad_format_fails() {
        let doc = roxmltree::Document::parse(ITEMS).unwrap();
        let rule = rule("Paragraph:Fields/Field:Value:{1}");
        assert!(matches!(
            extract_value(&rule, items(&doc)[0]),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_paragraph_order() {
        let doc = roxmltree::Document::parse(ITEMS).unwrap();
        let rules = parse_rules(&[
            "Heading2:Fields/Field[@Name='Title']:Value:",
            "Paragraph::: Static line",
        ])
        .rules;

        let paragraphs = extract_paragraphs(&items(&doc), &rules).unwrap();
        let texts: Vec<_> = paragraphs.iter().map(|p| p.lines.join("\n")).collect();
        assert_eq!(
            texts,
            vec!["Report A", " Static line", "Report B", " Static line"]
        );
        assert_eq!(paragraphs[0].style, ParagraphStyle::Heading2);
        assert_eq!(paragraphs[1].style, ParagraphStyle::Paragraph);
    }

    #[test]
    fn test_multiline_value_becomes_lines() {
        let doc = roxmltree::Document::parse(ITEMS).unwrap();
        let rules = vec![rule("Paragraph:Fields/Field[@Name='Notes']::")];
        let paragraphs = extract_paragraphs(&items(&doc)[..1], &rules).unwrap();
        assert_eq!(paragraphs[0].lines, vec!["Line1", "Line2"]);
    }
}
