//! XPath 1.0 expression parser.

use super::lexer::{tokenize, Token};

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

/// Navigation axes. The `namespace` axis is not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
    Attribute,
    SelfNode,
}

impl Axis {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "child" => Axis::Child,
            "descendant" => Axis::Descendant,
            "descendant-or-self" => Axis::DescendantOrSelf,
            "parent" => Axis::Parent,
            "ancestor" => Axis::Ancestor,
            "ancestor-or-self" => Axis::AncestorOrSelf,
            "following-sibling" => Axis::FollowingSibling,
            "preceding-sibling" => Axis::PrecedingSibling,
            "following" => Axis::Following,
            "preceding" => Axis::Preceding,
            "attribute" => Axis::Attribute,
            "self" => Axis::SelfNode,
            _ => return None,
        })
    }
}

/// Node tests.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NodeTest {
    /// `*`
    Any,
    /// `prefix:*`
    AnyInPrefix(String),
    /// `name` or `prefix:name`
    Name {
        prefix: Option<String>,
        local: String,
    },
    Text,
    Node,
    Comment,
    ProcessingInstruction(Option<String>),
}

/// A single location step.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    fn descendant_or_self() -> Self {
        Step {
            axis: Axis::DescendantOrSelf,
            test: NodeTest::Node,
            predicates: Vec::new(),
        }
    }
}

/// Core function library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Function {
    Last,
    Position,
    Count,
    LocalName,
    Name,
    NamespaceUri,
    String,
    Concat,
    StartsWith,
    Contains,
    SubstringBefore,
    SubstringAfter,
    Substring,
    StringLength,
    NormalizeSpace,
    Translate,
    Boolean,
    Not,
    True,
    False,
    Number,
    Sum,
    Floor,
    Ceiling,
    Round,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "last" => Function::Last,
            "position" => Function::Position,
            "count" => Function::Count,
            "local-name" => Function::LocalName,
            "name" => Function::Name,
            "namespace-uri" => Function::NamespaceUri,
            "string" => Function::String,
            "concat" => Function::Concat,
            "starts-with" => Function::StartsWith,
            "contains" => Function::Contains,
            "substring-before" => Function::SubstringBefore,
            "substring-after" => Function::SubstringAfter,
            "substring" => Function::Substring,
            "string-length" => Function::StringLength,
            "normalize-space" => Function::NormalizeSpace,
            "translate" => Function::Translate,
            "boolean" => Function::Boolean,
            "not" => Function::Not,
            "true" => Function::True,
            "false" => Function::False,
            "number" => Function::Number,
            "sum" => Function::Sum,
            "floor" => Function::Floor,
            "ceiling" => Function::Ceiling,
            "round" => Function::Round,
            _ => return None,
        })
    }

    /// Accepted argument count as (min, max); `None` means unbounded.
    fn arity(&self) -> (usize, Option<usize>) {
        match self {
            Function::Last | Function::Position | Function::True | Function::False => {
                (0, Some(0))
            }
            Function::LocalName
            | Function::Name
            | Function::NamespaceUri
            | Function::String
            | Function::StringLength
            | Function::NormalizeSpace
            | Function::Number => (0, Some(1)),
            Function::Count
            | Function::Boolean
            | Function::Not
            | Function::Sum
            | Function::Floor
            | Function::Ceiling
            | Function::Round => (1, Some(1)),
            Function::StartsWith
            | Function::Contains
            | Function::SubstringBefore
            | Function::SubstringAfter => (2, Some(2)),
            Function::Substring => (2, Some(3)),
            Function::Translate => (3, Some(3)),
            Function::Concat => (2, None),
        }
    }
}

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Compare(CompareOp, Box<Expr>, Box<Expr>),
    Arithmetic(ArithmeticOp, Box<Expr>, Box<Expr>),
    Negate(Box<Expr>),
    Union(Box<Expr>, Box<Expr>),
    Literal(String),
    Number(f64),
    Function(Function, Vec<Expr>),
    Path {
        absolute: bool,
        steps: Vec<Step>,
    },
    /// A primary expression filtered by predicates and/or followed by steps.
    Filter {
        primary: Box<Expr>,
        predicates: Vec<Expr>,
        steps: Vec<Step>,
    },
}

/// Parse an expression. Errors carry a reason and a byte offset.
pub(crate) fn parse(input: &str) -> Result<Expr, (String, usize)> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(("empty expression".to_string(), 0));
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        end: input.len(),
    };
    let expr = parser.parse_or()?;
    if let Some((token, offset)) = parser.tokens.get(parser.pos) {
        return Err((format!("unexpected {:?}", token), *offset));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    end: usize,
}

type ParseResult<T> = Result<T, (String, usize)>;

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_at(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead).map(|(t, _)| t)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(_, o)| *o)
            .unwrap_or(self.end)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> ParseResult<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {:?}", expected)))
        }
    }

    fn error(&self, what: &str) -> (String, usize) {
        match self.peek() {
            Some(token) => (format!("{}, found {:?}", what, token), self.offset()),
            None => (format!("{}, found end of expression", what), self.end),
        }
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::Or) {
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_equality()?;
        while self.eat(&Token::And) {
            let right = self.parse_equality()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => CompareOp::Eq,
                Some(Token::NotEq) => CompareOp::NotEq,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_relational()?;
            left = Expr::Compare(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => CompareOp::Lt,
                Some(Token::Le) => CompareOp::Le,
                Some(Token::Gt) => CompareOp::Gt,
                Some(Token::Ge) => CompareOp::Ge,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_additive()?;
            left = Expr::Compare(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => ArithmeticOp::Add,
                Some(Token::Minus) => ArithmeticOp::Subtract,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_multiplicative()?;
            left = Expr::Arithmetic(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Multiply) => ArithmeticOp::Multiply,
                Some(Token::Div) => ArithmeticOp::Divide,
                Some(Token::Mod) => ArithmeticOp::Modulo,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expr::Arithmetic(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        if self.eat(&Token::Minus) {
            let inner = self.parse_unary()?;
            return Ok(Expr::Negate(Box::new(inner)));
        }
        self.parse_union()
    }

    fn parse_union(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_path_expr()?;
        while self.eat(&Token::Pipe) {
            let right = self.parse_path_expr()?;
            left = Expr::Union(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_path_expr(&mut self) -> ParseResult<Expr> {
        match self.peek() {
            Some(Token::Slash) | Some(Token::DoubleSlash) => self.parse_location_path(),
            Some(Token::Dot)
            | Some(Token::DotDot)
            | Some(Token::At)
            | Some(Token::Star)
            | Some(Token::PrefixStar(_)) => self.parse_location_path(),
            Some(Token::Name(name)) => {
                let is_call = self.peek_at(1) == Some(&Token::LParen);
                if is_call && !is_node_type(name) {
                    self.parse_filter_expr()
                } else {
                    self.parse_location_path()
                }
            }
            Some(Token::LParen) | Some(Token::Literal(_)) | Some(Token::Number(_)) => {
                self.parse_filter_expr()
            }
            Some(Token::Dollar) => Err((
                "variable references are not supported".to_string(),
                self.offset(),
            )),
            _ => Err(self.error("expected an expression")),
        }
    }

    fn parse_filter_expr(&mut self) -> ParseResult<Expr> {
        let primary = self.parse_primary()?;
        let predicates = self.parse_predicates()?;

        let mut steps = Vec::new();
        if self.eat(&Token::Slash) {
            self.parse_relative_steps(&mut steps)?;
        } else if self.eat(&Token::DoubleSlash) {
            steps.push(Step::descendant_or_self());
            self.parse_relative_steps(&mut steps)?;
        }

        if predicates.is_empty() && steps.is_empty() {
            Ok(primary)
        } else {
            Ok(Expr::Filter {
                primary: Box::new(primary),
                predicates,
                steps,
            })
        }
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let offset = self.offset();
        match self.advance() {
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Literal(s)) => Ok(Expr::Literal(s)),
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Name(name)) => {
                let function = Function::from_name(&name)
                    .ok_or_else(|| (format!("unknown function '{}'", name), offset))?;
                self.expect(&Token::LParen)?;

                let mut args = Vec::new();
                if !self.eat(&Token::RParen) {
                    loop {
                        args.push(self.parse_or()?);
                        if self.eat(&Token::Comma) {
                            continue;
                        }
                        self.expect(&Token::RParen)?;
                        break;
                    }
                }

                let (min, max) = function.arity();
                if args.len() < min || max.is_some_and(|max| args.len() > max) {
                    return Err((
                        format!(
                            "function '{}' does not take {} argument(s)",
                            name,
                            args.len()
                        ),
                        offset,
                    ));
                }
                Ok(Expr::Function(function, args))
            }
            _ => Err(("expected a primary expression".to_string(), offset)),
        }
    }

    fn parse_location_path(&mut self) -> ParseResult<Expr> {
        let mut steps = Vec::new();
        let absolute = match self.peek() {
            Some(Token::Slash) => {
                self.pos += 1;
                if self.peek().is_some_and(can_start_step) {
                    self.parse_relative_steps(&mut steps)?;
                }
                true
            }
            Some(Token::DoubleSlash) => {
                self.pos += 1;
                steps.push(Step::descendant_or_self());
                self.parse_relative_steps(&mut steps)?;
                true
            }
            _ => {
                self.parse_relative_steps(&mut steps)?;
                false
            }
        };
        Ok(Expr::Path { absolute, steps })
    }

    fn parse_relative_steps(&mut self, steps: &mut Vec<Step>) -> ParseResult<()> {
        steps.push(self.parse_step()?);
        loop {
            if self.eat(&Token::Slash) {
                steps.push(self.parse_step()?);
            } else if self.eat(&Token::DoubleSlash) {
                steps.push(Step::descendant_or_self());
                steps.push(self.parse_step()?);
            } else {
                return Ok(());
            }
        }
    }

    fn parse_step(&mut self) -> ParseResult<Step> {
        if self.eat(&Token::Dot) {
            return Ok(Step {
                axis: Axis::SelfNode,
                test: NodeTest::Node,
                predicates: Vec::new(),
            });
        }
        if self.eat(&Token::DotDot) {
            return Ok(Step {
                axis: Axis::Parent,
                test: NodeTest::Node,
                predicates: Vec::new(),
            });
        }

        let axis = if self.eat(&Token::At) {
            Axis::Attribute
        } else if let (Some(Token::Name(name)), Some(Token::DoubleColon)) =
            (self.peek(), self.peek_at(1))
        {
            let axis = Axis::from_name(name)
                .ok_or_else(|| (format!("unknown axis '{}'", name), self.offset()))?;
            self.pos += 2;
            axis
        } else {
            Axis::Child
        };

        let test = self.parse_node_test()?;
        let predicates = self.parse_predicates()?;
        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn parse_node_test(&mut self) -> ParseResult<NodeTest> {
        let offset = self.offset();
        match self.advance() {
            Some(Token::Star) => Ok(NodeTest::Any),
            Some(Token::PrefixStar(prefix)) => Ok(NodeTest::AnyInPrefix(prefix)),
            Some(Token::Name(name)) => {
                if is_node_type(&name) && self.eat(&Token::LParen) {
                    let test = match name.as_str() {
                        "text" => NodeTest::Text,
                        "node" => NodeTest::Node,
                        "comment" => NodeTest::Comment,
                        _ => {
                            let target = match self.peek() {
                                Some(Token::Literal(target)) => {
                                    let target = target.clone();
                                    self.pos += 1;
                                    Some(target)
                                }
                                _ => None,
                            };
                            NodeTest::ProcessingInstruction(target)
                        }
                    };
                    self.expect(&Token::RParen)?;
                    return Ok(test);
                }

                Ok(match name.split_once(':') {
                    Some((prefix, local)) => NodeTest::Name {
                        prefix: Some(prefix.to_string()),
                        local: local.to_string(),
                    },
                    None => NodeTest::Name {
                        prefix: None,
                        local: name,
                    },
                })
            }
            _ => Err(("expected a node test".to_string(), offset)),
        }
    }

    fn parse_predicates(&mut self) -> ParseResult<Vec<Expr>> {
        let mut predicates = Vec::new();
        while self.eat(&Token::LBracket) {
            predicates.push(self.parse_or()?);
            self.expect(&Token::RBracket)?;
        }
        Ok(predicates)
    }
}

fn is_node_type(name: &str) -> bool {
    matches!(
        name,
        "text" | "node" | "comment" | "processing-instruction"
    )
}

fn can_start_step(token: &Token) -> bool {
    matches!(
        token,
        Token::Dot
            | Token::DotDot
            | Token::At
            | Token::Star
            | Token::PrefixStar(_)
            | Token::Name(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_step(axis: Axis, local: &str) -> Step {
        Step {
            axis,
            test: NodeTest::Name {
                prefix: None,
                local: local.to_string(),
            },
            predicates: Vec::new(),
        }
    }

    #[test]
    fn test_relative_path() {
        let expr = parse("./Fields/Field").unwrap();
        assert_eq!(
            expr,
            Expr::Path {
                absolute: false,
                steps: vec![
                    Step {
                        axis: Axis::SelfNode,
                        test: NodeTest::Node,
                        predicates: vec![],
                    },
                    name_step(Axis::Child, "Fields"),
                    name_step(Axis::Child, "Field"),
                ],
            }
        );
    }

    #[test]
    fn test_double_slash_expands() {
        let expr = parse("//item/@id").unwrap();
        match expr {
            Expr::Path { absolute, steps } => {
                assert!(absolute);
                assert_eq!(steps.len(), 3);
                assert_eq!(steps[0], Step::descendant_or_self());
                assert_eq!(steps[2], name_step(Axis::Attribute, "id"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_root_only() {
        assert_eq!(
            parse("/").unwrap(),
            Expr::Path {
                absolute: true,
                steps: vec![]
            }
        );
    }

    #[test]
    fn test_predicate_with_comparison() {
        let expr = parse("Field[Name='Title']").unwrap();
        match expr {
            Expr::Path { steps, .. } => {
                assert_eq!(steps.len(), 1);
                assert!(matches!(
                    steps[0].predicates[0],
                    Expr::Compare(CompareOp::Eq, _, _)
                ));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_precedence() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        let expr = parse("1 + 2 * 3").unwrap();
        assert_eq!(
            expr,
            Expr::Arithmetic(
                ArithmeticOp::Add,
                Box::new(Expr::Number(1.0)),
                Box::new(Expr::Arithmetic(
                    ArithmeticOp::Multiply,
                    Box::new(Expr::Number(2.0)),
                    Box::new(Expr::Number(3.0)),
                )),
            )
        );
    }

    #[test]
    fn test_function_and_node_type() {
        assert!(matches!(
            parse("count(item)").unwrap(),
            Expr::Function(Function::Count, _)
        ));
        match parse("text()").unwrap() {
            Expr::Path { steps, .. } => assert_eq!(steps[0].test, NodeTest::Text),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_filter_expression() {
        let expr = parse("(//a)[1]/b").unwrap();
        assert!(matches!(expr, Expr::Filter { .. }));
    }

    #[test]
    fn test_syntax_errors() {
        assert!(parse("").is_err());
        assert!(parse("/a[").is_err());
        assert!(parse("a]").is_err());
        assert!(parse("unknown-fn(1)").is_err());
        assert!(parse("bogus::a").is_err());
        assert!(parse("count()").is_err());
        assert!(parse("$var").is_err());
        assert!(parse("a/").is_err());
    }
}
