//! XPath 1.0 selection over `roxmltree` documents.
//!
//! Expressions are compiled once with [`XPath::compile`] and evaluated
//! against any context node. Unprefixed name tests match elements by local
//! name in any namespace; prefixed name tests resolve the prefix in scope of
//! the candidate node. Variables and the `namespace` axis are not supported.
//!
//! ```
//! use xml2docx::xpath::XPath;
//!
//! let doc = roxmltree::Document::parse(
//!     r#"<Items><Item id="a"/><Item id="b"/></Items>"#,
//! ).unwrap();
//! let items = XPath::compile("./Item[@id='b']")?.select_elements(doc.root_element())?;
//! assert_eq!(items.len(), 1);
//! # Ok::<(), xml2docx::Error>(())
//! ```

mod eval;
mod lexer;
mod parser;

use crate::error::{Error, Result};
use eval::{evaluate, number_to_string, parse_number, Context};
use parser::Expr;
use roxmltree::Node;

/// A node visited by an XPath expression.
///
/// `roxmltree` does not model attributes as nodes, so they are addressed by
/// their owner element and index.
#[derive(Debug, Clone, Copy)]
pub enum XNode<'a, 'input> {
    /// Root, element, text, comment or processing-instruction node
    Tree(Node<'a, 'input>),
    /// The `index`-th attribute of `owner`
    Attribute {
        owner: Node<'a, 'input>,
        index: usize,
    },
}

impl<'a, 'input> XNode<'a, 'input> {
    /// The tree node, unless this is an attribute.
    pub fn as_tree(&self) -> Option<Node<'a, 'input>> {
        match self {
            XNode::Tree(node) => Some(*node),
            XNode::Attribute { .. } => None,
        }
    }

    fn attribute(&self) -> Option<roxmltree::Attribute<'a, 'input>> {
        match self {
            XNode::Attribute { owner, index } => owner.attributes().nth(*index),
            XNode::Tree(_) => None,
        }
    }

    /// Document order key; attributes sort right after their owner.
    fn order_key(&self) -> (usize, usize) {
        match self {
            XNode::Tree(node) => (node.id().get_usize(), 0),
            XNode::Attribute { owner, index } => (owner.id().get_usize(), index + 1),
        }
    }

    fn document_root(&self) -> XNode<'a, 'input> {
        let node = match self {
            XNode::Tree(node) => *node,
            XNode::Attribute { owner, .. } => *owner,
        };
        XNode::Tree(node.document().root())
    }

    /// The element used to resolve namespace prefixes for this node.
    fn scope_element(&self) -> Node<'a, 'input> {
        match self {
            XNode::Tree(node) => *node,
            XNode::Attribute { owner, .. } => *owner,
        }
    }

    /// Local name of an element, attribute or processing instruction target.
    pub fn local_name(&self) -> &'a str {
        match self {
            XNode::Tree(node) => {
                if node.is_element() {
                    node.tag_name().name()
                } else if let Some(pi) = node.pi() {
                    pi.target
                } else {
                    ""
                }
            }
            XNode::Attribute { .. } => self.attribute().map(|a| a.name()).unwrap_or_default(),
        }
    }

    /// Namespace URI of an element or attribute.
    pub fn namespace_uri(&self) -> Option<&'a str> {
        match self {
            XNode::Tree(node) if node.is_element() => node.tag_name().namespace(),
            XNode::Tree(_) => None,
            XNode::Attribute { .. } => self.attribute().and_then(|a| a.namespace()),
        }
    }

    /// Name with the in-scope prefix, if any (e.g. "w:p").
    pub fn qualified_name(&self) -> String {
        let local = self.local_name();
        let prefix = self
            .namespace_uri()
            .and_then(|uri| self.scope_element().lookup_prefix(uri))
            .filter(|prefix| !prefix.is_empty());
        match prefix {
            Some(prefix) => format!("{}:{}", prefix, local),
            None => local.to_string(),
        }
    }

    /// Whether this is whitespace-only text dropped from the loaded tree.
    pub(crate) fn is_ignorable_whitespace(&self) -> bool {
        match self {
            XNode::Tree(node) => is_ignorable_whitespace(*node),
            XNode::Attribute { .. } => false,
        }
    }

    /// XPath string-value: concatenated descendant text for roots and
    /// elements, the value itself for attributes and text.
    pub fn string_value(&self) -> String {
        match self {
            XNode::Tree(node) => {
                if node.is_element() || node.is_root() {
                    node.descendants()
                        .filter(|d| d.is_text() && !is_ignorable_whitespace(*d))
                        .filter_map(|d| d.text())
                        .collect()
                } else if let Some(pi) = node.pi() {
                    pi.value.unwrap_or_default().to_string()
                } else {
                    node.text().unwrap_or_default().to_string()
                }
            }
            XNode::Attribute { .. } => self
                .attribute()
                .map(|a| a.value().to_string())
                .unwrap_or_default(),
        }
    }
}

/// Text made only of XML whitespace, outside any `xml:space="preserve"`
/// scope. Such nodes are indentation and take no part in selection or
/// string-values.
fn is_ignorable_whitespace(node: Node<'_, '_>) -> bool {
    node.is_text()
        && node
            .text()
            .is_some_and(|t| t.chars().all(|c| matches!(c, ' ' | '\t' | '\r' | '\n')))
        && node
            .ancestors()
            .find_map(|n| n.attribute((roxmltree::NS_XML_URI, "space")))
            != Some("preserve")
}

/// Result of evaluating an expression.
#[derive(Debug, Clone)]
pub enum Value<'a, 'input> {
    /// Nodes in document order, without duplicates
    NodeSet(Vec<XNode<'a, 'input>>),
    String(String),
    Number(f64),
    Boolean(bool),
}

impl<'a, 'input> Value<'a, 'input> {
    /// XPath `boolean()` conversion.
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::NodeSet(nodes) => !nodes.is_empty(),
            Value::String(s) => !s.is_empty(),
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Boolean(b) => *b,
        }
    }

    /// XPath `number()` conversion.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Boolean(true) => 1.0,
            Value::Boolean(false) => 0.0,
            Value::Number(n) => *n,
            other => parse_number(&other.to_string_value()),
        }
    }

    /// XPath `string()` conversion.
    pub fn to_string_value(&self) -> String {
        match self {
            Value::NodeSet(nodes) => nodes
                .first()
                .map(|n| n.string_value())
                .unwrap_or_default(),
            Value::String(s) => s.clone(),
            Value::Number(n) => number_to_string(*n),
            Value::Boolean(b) => b.to_string(),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::NodeSet(_) => "node-set",
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Boolean(_) => "boolean",
        }
    }
}

/// A compiled XPath expression.
#[derive(Debug, Clone)]
pub struct XPath {
    source: String,
    expr: Expr,
}

impl XPath {
    /// Compile an expression.
    pub fn compile(source: &str) -> Result<Self> {
        let expr = parser::parse(source).map_err(|(reason, offset)| Error::XPathSyntax {
            expr: source.to_string(),
            reason: format!("{} at offset {}", reason, offset),
        })?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    /// The source text of the expression.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Evaluate against a context node.
    pub fn evaluate<'a, 'input>(&self, context: Node<'a, 'input>) -> Result<Value<'a, 'input>> {
        evaluate(&self.expr, &Context::new(XNode::Tree(context)))
    }

    /// Select elements, in document order.
    ///
    /// Fails when the expression does not produce a node-set or produces
    /// anything other than elements.
    pub fn select_elements<'a, 'input>(
        &self,
        context: Node<'a, 'input>,
    ) -> Result<Vec<Node<'a, 'input>>> {
        let nodes = match self.evaluate(context)? {
            Value::NodeSet(nodes) => nodes,
            other => {
                return Err(Error::XPathEval(format!(
                    "'{}' evaluates to a {}, not to elements",
                    self.source,
                    other.type_name()
                )))
            }
        };

        nodes
            .into_iter()
            .map(|node| match node.as_tree() {
                Some(element) if element.is_element() => Ok(element),
                _ => Err(Error::XPathEval(format!(
                    "'{}' selects nodes that are not elements",
                    self.source
                ))),
            })
            .collect()
    }

    /// Select the first element in document order, if any.
    pub fn select_element<'a, 'input>(
        &self,
        context: Node<'a, 'input>,
    ) -> Result<Option<Node<'a, 'input>>> {
        Ok(self.select_elements(context)?.into_iter().next())
    }
}

impl std::fmt::Display for XPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}
