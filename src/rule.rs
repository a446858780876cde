//! Extraction rules given on the command line.
//!
//! A rule has the form `Style:xpath:[attribute]:[format]`. The format part
//! keeps any further colons, so `Paragraph:::Time: {0}` is a literal rule
//! whose text is `Time: {0}`.

use crate::error::Error;
use crate::model::ParagraphStyle;
use crate::xpath::XPath;
use std::fmt;

/// Where a rule reads its value from.
#[derive(Debug, Clone)]
pub enum RulePath {
    /// No path; the rule writes its format text
    Literal,
    /// Element to read, relative to each matched root element
    Compiled(XPath),
    /// A path that does not compile; applying the rule fails
    Invalid { expr: String, reason: String },
}

impl RulePath {
    fn compile(source: &str) -> Self {
        if source.is_empty() {
            return RulePath::Literal;
        }
        match XPath::compile(source) {
            Ok(xpath) => RulePath::Compiled(xpath),
            Err(Error::XPathSyntax { expr, reason }) => RulePath::Invalid { expr, reason },
            Err(e) => RulePath::Invalid {
                expr: source.to_string(),
                reason: e.to_string(),
            },
        }
    }
}

/// One extraction rule.
#[derive(Debug, Clone)]
pub struct ItemRule {
    /// Style of the generated paragraph
    pub style: ParagraphStyle,
    /// Value source
    pub path: RulePath,
    /// Attribute to read instead of the element text
    pub attribute: Option<String>,
    /// Composite format applied to the value, or the literal text
    pub format: Option<String>,
}

impl ItemRule {
    /// Check if the rule produces fixed text.
    pub fn is_literal(&self) -> bool {
        matches!(self.path, RulePath::Literal)
    }
}

/// A rule argument that could not be fully understood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// Fewer than three `:` separators; the argument is skipped.
    NotEnoughParameters(String),
    /// Unknown style; the rule is kept with the `Paragraph` style.
    InvalidStyle(String),
}

impl RuleError {
    /// The argument the error refers to.
    pub fn spec(&self) -> &str {
        match self {
            RuleError::NotEnoughParameters(spec) | RuleError::InvalidStyle(spec) => spec,
        }
    }
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleError::NotEnoughParameters(spec) => {
                write!(f, "Not enough parameters in '{}'.", spec)
            }
            RuleError::InvalidStyle(spec) => write!(f, "Invalid style in '{}'.", spec),
        }
    }
}

/// Rules parsed from the trailing arguments.
#[derive(Debug, Clone, Default)]
pub struct ParsedRules {
    /// Usable rules, in argument order
    pub rules: Vec<ItemRule>,
    /// Per-argument problems, in argument order
    pub errors: Vec<RuleError>,
}

/// Parse rule arguments.
///
/// Malformed arguments are collected in [`ParsedRules::errors`] and parsing
/// carries on with the next one. An XPath that fails to compile is kept as
/// [`RulePath::Invalid`] and reported when the rule is applied.
///
/// # Example
///
/// ```
/// use xml2docx::model::ParagraphStyle;
/// use xml2docx::rule::parse_rules;
///
/// let parsed = parse_rules(&["Heading2:./Fields/Field[Name='Title']:Value:", "oops"]);
/// assert_eq!(parsed.rules.len(), 1);
/// assert_eq!(parsed.rules[0].style, ParagraphStyle::Heading2);
/// assert_eq!(parsed.errors[0].to_string(), "Not enough parameters in 'oops'.");
/// ```
pub fn parse_rules<S: AsRef<str>>(specs: &[S]) -> ParsedRules {
    let mut parsed = ParsedRules {
        rules: Vec::with_capacity(specs.len()),
        errors: Vec::new(),
    };

    for spec in specs {
        let spec = spec.as_ref();
        if spec.matches(':').count() < 3 {
            parsed
                .errors
                .push(RuleError::NotEnoughParameters(spec.to_string()));
            continue;
        }

        let mut parts = spec.splitn(4, ':');
        let style_part = parts.next().unwrap_or_default();
        let path_part = parts.next().unwrap_or_default();
        let attribute_part = parts.next().unwrap_or_default();
        let format_part = parts.next().unwrap_or_default();

        let style = match style_part.parse::<ParagraphStyle>() {
            Ok(style) => style,
            Err(_) => {
                parsed.errors.push(RuleError::InvalidStyle(spec.to_string()));
                ParagraphStyle::default()
            }
        };

        parsed.rules.push(ItemRule {
            style,
            path: RulePath::compile(path_part),
            attribute: (!attribute_part.trim().is_empty()).then(|| attribute_part.to_string()),
            format: (!format_part.is_empty()).then(|| format_part.to_string()),
        });
    }

    parsed
}
