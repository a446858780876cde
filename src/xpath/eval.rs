//! XPath 1.0 evaluation over a `roxmltree` document.

use super::parser::{ArithmeticOp, Axis, CompareOp, Expr, Function, NodeTest, Step};
use super::{Value, XNode};
use crate::error::{Error, Result};

/// Evaluation context: the context node with its proximity position and size.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Context<'a, 'input> {
    pub node: XNode<'a, 'input>,
    pub position: usize,
    pub size: usize,
}

impl<'a, 'input> Context<'a, 'input> {
    pub(crate) fn new(node: XNode<'a, 'input>) -> Self {
        Self {
            node,
            position: 1,
            size: 1,
        }
    }
}

pub(crate) fn evaluate<'a, 'input>(
    expr: &Expr,
    ctx: &Context<'a, 'input>,
) -> Result<Value<'a, 'input>> {
    match expr {
        Expr::Or(left, right) => {
            let value = evaluate(left, ctx)?.to_boolean() || evaluate(right, ctx)?.to_boolean();
            Ok(Value::Boolean(value))
        }
        Expr::And(left, right) => {
            let value = evaluate(left, ctx)?.to_boolean() && evaluate(right, ctx)?.to_boolean();
            Ok(Value::Boolean(value))
        }
        Expr::Compare(op, left, right) => {
            let left = evaluate(left, ctx)?;
            let right = evaluate(right, ctx)?;
            Ok(Value::Boolean(compare(*op, &left, &right)))
        }
        Expr::Arithmetic(op, left, right) => {
            let a = evaluate(left, ctx)?.to_number();
            let b = evaluate(right, ctx)?.to_number();
            Ok(Value::Number(match op {
                ArithmeticOp::Add => a + b,
                ArithmeticOp::Subtract => a - b,
                ArithmeticOp::Multiply => a * b,
                ArithmeticOp::Divide => a / b,
                ArithmeticOp::Modulo => a % b,
            }))
        }
        Expr::Negate(inner) => Ok(Value::Number(-evaluate(inner, ctx)?.to_number())),
        Expr::Union(left, right) => {
            let mut nodes = expect_nodes(evaluate(left, ctx)?, "|")?;
            nodes.extend(expect_nodes(evaluate(right, ctx)?, "|")?);
            sort_document_order(&mut nodes);
            Ok(Value::NodeSet(nodes))
        }
        Expr::Literal(s) => Ok(Value::String(s.clone())),
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Function(function, args) => call(*function, args, ctx),
        Expr::Path { absolute, steps } => {
            let start = if *absolute {
                ctx.node.document_root()
            } else {
                ctx.node
            };
            Ok(Value::NodeSet(apply_steps(vec![start], steps)?))
        }
        Expr::Filter {
            primary,
            predicates,
            steps,
        } => {
            let mut nodes = expect_nodes(evaluate(primary, ctx)?, "a filter expression")?;
            for predicate in predicates {
                nodes = filter(nodes, predicate)?;
            }
            Ok(Value::NodeSet(apply_steps(nodes, steps)?))
        }
    }
}

fn expect_nodes<'a, 'input>(value: Value<'a, 'input>, what: &str) -> Result<Vec<XNode<'a, 'input>>> {
    match value {
        Value::NodeSet(nodes) => Ok(nodes),
        other => Err(Error::XPathEval(format!(
            "{} requires a node-set, found {}",
            what,
            other.type_name()
        ))),
    }
}

fn sort_document_order(nodes: &mut Vec<XNode<'_, '_>>) {
    nodes.sort_by_key(|n| n.order_key());
    nodes.dedup_by_key(|n| n.order_key());
}

fn apply_steps<'a, 'input>(
    mut nodes: Vec<XNode<'a, 'input>>,
    steps: &[Step],
) -> Result<Vec<XNode<'a, 'input>>> {
    for step in steps {
        let mut next = Vec::new();
        for node in &nodes {
            let mut candidates: Vec<XNode<'a, 'input>> = axis_nodes(*node, step.axis)
                .into_iter()
                .filter(|candidate| matches_test(*candidate, &step.test, step.axis))
                .collect();
            for predicate in &step.predicates {
                candidates = filter(candidates, predicate)?;
            }
            next.extend(candidates);
        }
        sort_document_order(&mut next);
        nodes = next;
    }
    Ok(nodes)
}

/// Keep the nodes for which `predicate` holds. Positions follow the order of `nodes`.
fn filter<'a, 'input>(
    nodes: Vec<XNode<'a, 'input>>,
    predicate: &Expr,
) -> Result<Vec<XNode<'a, 'input>>> {
    let size = nodes.len();
    let mut kept = Vec::with_capacity(size);
    for (i, node) in nodes.into_iter().enumerate() {
        let ctx = Context {
            node,
            position: i + 1,
            size,
        };
        let keep = match evaluate(predicate, &ctx)? {
            Value::Number(n) => n == (i + 1) as f64,
            other => other.to_boolean(),
        };
        if keep {
            kept.push(node);
        }
    }
    Ok(kept)
}

/// Nodes along an axis, in axis order (reverse axes nearest first).
/// Whitespace-only text is skipped.
fn axis_nodes<'a, 'input>(node: XNode<'a, 'input>, axis: Axis) -> Vec<XNode<'a, 'input>> {
    let mut nodes = all_axis_nodes(node, axis);
    nodes.retain(|n| !n.is_ignorable_whitespace());
    nodes
}

fn all_axis_nodes<'a, 'input>(node: XNode<'a, 'input>, axis: Axis) -> Vec<XNode<'a, 'input>> {
    let tree = match node {
        XNode::Tree(n) => n,
        XNode::Attribute { owner, .. } => {
            return match axis {
                Axis::SelfNode => vec![node],
                Axis::Parent => vec![XNode::Tree(owner)],
                Axis::Ancestor | Axis::AncestorOrSelf => {
                    let mut out = Vec::new();
                    if axis == Axis::AncestorOrSelf {
                        out.push(node);
                    }
                    out.extend(ancestors_or_self(owner).into_iter().map(XNode::Tree));
                    out
                }
                Axis::Following => {
                    let mut out: Vec<XNode<'a, 'input>> =
                        owner.descendants().skip(1).map(XNode::Tree).collect();
                    out.extend(following(owner));
                    out
                }
                Axis::Preceding => preceding(owner),
                _ => Vec::new(),
            };
        }
    };

    match axis {
        Axis::Child => tree.children().map(XNode::Tree).collect(),
        Axis::Descendant => tree.descendants().skip(1).map(XNode::Tree).collect(),
        Axis::DescendantOrSelf => tree.descendants().map(XNode::Tree).collect(),
        Axis::Parent => tree.parent().map(XNode::Tree).into_iter().collect(),
        Axis::Ancestor => ancestors_or_self(tree)
            .into_iter()
            .skip(1)
            .map(XNode::Tree)
            .collect(),
        Axis::AncestorOrSelf => ancestors_or_self(tree)
            .into_iter()
            .map(XNode::Tree)
            .collect(),
        Axis::FollowingSibling => {
            let mut out = Vec::new();
            let mut current = tree.next_sibling();
            while let Some(sibling) = current {
                out.push(XNode::Tree(sibling));
                current = sibling.next_sibling();
            }
            out
        }
        Axis::PrecedingSibling => {
            let mut out = Vec::new();
            let mut current = tree.prev_sibling();
            while let Some(sibling) = current {
                out.push(XNode::Tree(sibling));
                current = sibling.prev_sibling();
            }
            out
        }
        Axis::Following => following(tree),
        Axis::Preceding => preceding(tree),
        Axis::Attribute => {
            if tree.is_element() {
                (0..tree.attributes().count())
                    .map(|index| XNode::Attribute { owner: tree, index })
                    .collect()
            } else {
                Vec::new()
            }
        }
        Axis::SelfNode => vec![node],
    }
}

fn ancestors_or_self<'a, 'input>(node: roxmltree::Node<'a, 'input>) -> Vec<roxmltree::Node<'a, 'input>> {
    let mut out = vec![node];
    let mut current = node.parent();
    while let Some(parent) = current {
        out.push(parent);
        current = parent.parent();
    }
    out
}

fn following<'a, 'input>(node: roxmltree::Node<'a, 'input>) -> Vec<XNode<'a, 'input>> {
    let mut out = Vec::new();
    for ancestor in ancestors_or_self(node) {
        let mut current = ancestor.next_sibling();
        while let Some(sibling) = current {
            out.extend(sibling.descendants().map(XNode::Tree));
            current = sibling.next_sibling();
        }
    }
    out
}

fn preceding<'a, 'input>(node: roxmltree::Node<'a, 'input>) -> Vec<XNode<'a, 'input>> {
    let mut out = Vec::new();
    for ancestor in ancestors_or_self(node) {
        let mut current = ancestor.prev_sibling();
        while let Some(sibling) = current {
            let mut subtree: Vec<XNode<'a, 'input>> = sibling.descendants().map(XNode::Tree).collect();
            subtree.reverse();
            out.extend(subtree);
            current = sibling.prev_sibling();
        }
    }
    out
}

fn matches_test(node: XNode<'_, '_>, test: &NodeTest, axis: Axis) -> bool {
    let principal = match node {
        XNode::Attribute { .. } => axis == Axis::Attribute,
        XNode::Tree(t) => axis != Axis::Attribute && t.is_element(),
    };

    match test {
        NodeTest::Node => true,
        NodeTest::Any => principal,
        NodeTest::AnyInPrefix(prefix) => principal && prefix_matches(node, prefix),
        NodeTest::Name { prefix, local } => {
            principal
                && node.local_name() == local.as_str()
                && prefix
                    .as_deref()
                    .map_or(true, |prefix| prefix_matches(node, prefix))
        }
        NodeTest::Text => matches!(node, XNode::Tree(t) if t.is_text()),
        NodeTest::Comment => matches!(node, XNode::Tree(t) if t.is_comment()),
        NodeTest::ProcessingInstruction(target) => match node {
            XNode::Tree(t) => match t.pi() {
                Some(pi) => target.as_deref().map_or(true, |target| pi.target == target),
                None => false,
            },
            XNode::Attribute { .. } => false,
        },
    }
}

/// Whether `prefix`, resolved in scope of the node, is the node's namespace.
fn prefix_matches(node: XNode<'_, '_>, prefix: &str) -> bool {
    let scope = node.scope_element();
    match (scope.lookup_namespace_uri(Some(prefix)), node.namespace_uri()) {
        (Some(bound), Some(actual)) => bound == actual,
        _ => false,
    }
}

fn compare(op: CompareOp, left: &Value<'_, '_>, right: &Value<'_, '_>) -> bool {
    match (left, right) {
        (Value::NodeSet(a), Value::NodeSet(b)) => {
            let right_values: Vec<String> = b.iter().map(|n| n.string_value()).collect();
            a.iter().any(|n| {
                let left_value = n.string_value();
                right_values
                    .iter()
                    .any(|r| compare_atoms(op, &Atom::String(&left_value), &Atom::String(r)))
            })
        }
        (Value::NodeSet(nodes), other) => compare_node_set(op, nodes, other, false),
        (other, Value::NodeSet(nodes)) => compare_node_set(op, nodes, other, true),
        (a, b) => compare_atoms(op, &Atom::from_value(a), &Atom::from_value(b)),
    }
}

fn compare_node_set(
    op: CompareOp,
    nodes: &[XNode<'_, '_>],
    other: &Value<'_, '_>,
    nodes_on_right: bool,
) -> bool {
    let swap = nodes_on_right;
    match other {
        Value::Boolean(b) => compare_ordered(
            op,
            swap,
            &Atom::Boolean(!nodes.is_empty()),
            &Atom::Boolean(*b),
        ),
        Value::Number(n) => nodes.iter().any(|node| {
            let value = parse_number(&node.string_value());
            compare_ordered(op, swap, &Atom::Number(value), &Atom::Number(*n))
        }),
        Value::String(s) => nodes.iter().any(|node| {
            let value = node.string_value();
            compare_ordered(op, swap, &Atom::String(&value), &Atom::String(s))
        }),
        Value::NodeSet(_) => false,
    }
}

/// Compare `node_side` with `other_side`, keeping the operand order of the source.
fn compare_ordered(op: CompareOp, swap: bool, node_side: &Atom<'_>, other_side: &Atom<'_>) -> bool {
    if swap {
        compare_atoms(op, other_side, node_side)
    } else {
        compare_atoms(op, node_side, other_side)
    }
}

enum Atom<'s> {
    String(&'s str),
    Number(f64),
    Boolean(bool),
}

impl<'s> Atom<'s> {
    fn from_value(value: &'s Value<'_, '_>) -> Self {
        match value {
            Value::String(s) => Atom::String(s),
            Value::Number(n) => Atom::Number(*n),
            Value::Boolean(b) => Atom::Boolean(*b),
            Value::NodeSet(nodes) => Atom::Boolean(!nodes.is_empty()),
        }
    }

    fn to_number(&self) -> f64 {
        match self {
            Atom::String(s) => parse_number(s),
            Atom::Number(n) => *n,
            Atom::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    fn to_boolean(&self) -> bool {
        match self {
            Atom::String(s) => !s.is_empty(),
            Atom::Number(n) => *n != 0.0 && !n.is_nan(),
            Atom::Boolean(b) => *b,
        }
    }
}

fn compare_atoms(op: CompareOp, a: &Atom<'_>, b: &Atom<'_>) -> bool {
    match op {
        CompareOp::Eq | CompareOp::NotEq => {
            let equal = match (a, b) {
                (Atom::Boolean(_), _) | (_, Atom::Boolean(_)) => a.to_boolean() == b.to_boolean(),
                (Atom::Number(_), _) | (_, Atom::Number(_)) => a.to_number() == b.to_number(),
                (Atom::String(x), Atom::String(y)) => x == y,
            };
            if op == CompareOp::Eq {
                equal
            } else {
                !equal
            }
        }
        CompareOp::Lt => a.to_number() < b.to_number(),
        CompareOp::Le => a.to_number() <= b.to_number(),
        CompareOp::Gt => a.to_number() > b.to_number(),
        CompareOp::Ge => a.to_number() >= b.to_number(),
    }
}

/// XPath `number()` conversion of a string: optional minus, digits, optional
/// fraction, surrounding whitespace. Anything else is NaN.
pub(crate) fn parse_number(s: &str) -> f64 {
    let trimmed = s.trim_matches(|c| matches!(c, ' ' | '\t' | '\r' | '\n'));
    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);

    let mut seen_digit = false;
    let mut seen_dot = false;
    for c in digits.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return f64::NAN,
        }
    }
    if !seen_digit {
        return f64::NAN;
    }
    trimmed.parse().unwrap_or(f64::NAN)
}

/// XPath `string()` conversion of a number.
pub(crate) fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}

fn call<'a, 'input>(
    function: Function,
    args: &[Expr],
    ctx: &Context<'a, 'input>,
) -> Result<Value<'a, 'input>> {
    let string_arg = |i: usize| -> Result<String> {
        match args.get(i) {
            Some(arg) => Ok(evaluate(arg, ctx)?.to_string_value()),
            None => Ok(ctx.node.string_value()),
        }
    };
    let number_arg = |i: usize| -> Result<f64> {
        match args.get(i) {
            Some(arg) => Ok(evaluate(arg, ctx)?.to_number()),
            None => Ok(parse_number(&ctx.node.string_value())),
        }
    };
    // First node (document order) of an optional node-set argument.
    let node_arg = |name: &str| -> Result<Option<XNode<'a, 'input>>> {
        match args.first() {
            Some(arg) => Ok(expect_nodes(evaluate(arg, ctx)?, name)?.first().copied()),
            None => Ok(Some(ctx.node)),
        }
    };

    let value = match function {
        Function::Last => Value::Number(ctx.size as f64),
        Function::Position => Value::Number(ctx.position as f64),
        Function::Count => {
            let nodes = expect_nodes(evaluate(&args[0], ctx)?, "count()")?;
            Value::Number(nodes.len() as f64)
        }
        Function::LocalName => Value::String(
            node_arg("local-name()")?
                .map(|n| n.local_name().to_string())
                .unwrap_or_default(),
        ),
        Function::Name => Value::String(
            node_arg("name()")?
                .map(|n| n.qualified_name())
                .unwrap_or_default(),
        ),
        Function::NamespaceUri => Value::String(
            node_arg("namespace-uri()")?
                .and_then(|n| n.namespace_uri().map(str::to_string))
                .unwrap_or_default(),
        ),
        Function::String => Value::String(string_arg(0)?),
        Function::Concat => {
            let mut out = String::new();
            for arg in args {
                out.push_str(&evaluate(arg, ctx)?.to_string_value());
            }
            Value::String(out)
        }
        Function::StartsWith => Value::Boolean(string_arg(0)?.starts_with(&string_arg(1)?)),
        Function::Contains => Value::Boolean(string_arg(0)?.contains(&string_arg(1)?)),
        Function::SubstringBefore => {
            let haystack = string_arg(0)?;
            let needle = string_arg(1)?;
            Value::String(
                haystack
                    .find(&needle)
                    .map(|i| haystack[..i].to_string())
                    .unwrap_or_default(),
            )
        }
        Function::SubstringAfter => {
            let haystack = string_arg(0)?;
            let needle = string_arg(1)?;
            Value::String(
                haystack
                    .find(&needle)
                    .map(|i| haystack[i + needle.len()..].to_string())
                    .unwrap_or_default(),
            )
        }
        Function::Substring => {
            let s = string_arg(0)?;
            let start = round(number_arg(1)?);
            let end = if args.len() > 2 {
                start + round(number_arg(2)?)
            } else {
                f64::INFINITY
            };
            Value::String(
                s.chars()
                    .enumerate()
                    .filter(|(i, _)| {
                        let position = (*i + 1) as f64;
                        position >= start && position < end
                    })
                    .map(|(_, c)| c)
                    .collect(),
            )
        }
        Function::StringLength => Value::Number(string_arg(0)?.chars().count() as f64),
        Function::NormalizeSpace => Value::String(
            string_arg(0)?
                .split(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        ),
        Function::Translate => {
            let s = string_arg(0)?;
            let from: Vec<char> = string_arg(1)?.chars().collect();
            let to: Vec<char> = string_arg(2)?.chars().collect();
            Value::String(
                s.chars()
                    .filter_map(|c| match from.iter().position(|&f| f == c) {
                        Some(i) => to.get(i).copied(),
                        None => Some(c),
                    })
                    .collect(),
            )
        }
        Function::Boolean => Value::Boolean(evaluate(&args[0], ctx)?.to_boolean()),
        Function::Not => Value::Boolean(!evaluate(&args[0], ctx)?.to_boolean()),
        Function::True => Value::Boolean(true),
        Function::False => Value::Boolean(false),
        Function::Number => Value::Number(number_arg(0)?),
        Function::Sum => {
            let nodes = expect_nodes(evaluate(&args[0], ctx)?, "sum()")?;
            Value::Number(
                nodes
                    .iter()
                    .map(|n| parse_number(&n.string_value()))
                    .sum(),
            )
        }
        Function::Floor => Value::Number(number_arg(0)?.floor()),
        Function::Ceiling => Value::Number(number_arg(0)?.ceil()),
        Function::Round => Value::Number(round(number_arg(0)?)),
    };

    Ok(value)
}

/// XPath rounding: halves round towards positive infinity.
fn round(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() {
        n
    } else if (-0.5..0.0).contains(&n) {
        -0.0
    } else {
        (n + 0.5).floor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 42 "), 42.0);
        assert_eq!(parse_number("-1.5"), -1.5);
        assert_eq!(parse_number(".5"), 0.5);
        assert!(parse_number("1e3").is_nan());
        assert!(parse_number("+1").is_nan());
        assert!(parse_number("").is_nan());
        assert!(parse_number("-").is_nan());
        assert!(parse_number("inf").is_nan());
    }

    #[test]
    fn test_number_to_string() {
        assert_eq!(number_to_string(3.0), "3");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(2.5), "2.5");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_round() {
        assert_eq!(round(2.5), 3.0);
        assert_eq!(round(-2.5), -2.0);
        assert_eq!(round(1.4), 1.0);
        assert!(round(-0.2).is_sign_negative());
    }
}
