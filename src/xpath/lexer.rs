//! XPath 1.0 tokenizer.

/// A lexical token with its byte offset in the source expression.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Slash,
    DoubleSlash,
    LBracket,
    RBracket,
    LParen,
    RParen,
    At,
    Comma,
    Pipe,
    Dot,
    DotDot,
    DoubleColon,
    Dollar,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Multiply,
    And,
    Or,
    Mod,
    Div,
    /// `*` used as a name test
    Star,
    /// `prefix:*`
    PrefixStar(String),
    /// NCName or `prefix:local`
    Name(String),
    Literal(String),
    Number(f64),
}

impl Token {
    /// Whether a `*` or an operator name following this token must be read
    /// as an operator (XPath 1.0, section 3.7).
    fn forces_operator(&self) -> bool {
        !matches!(
            self,
            Token::At
                | Token::DoubleColon
                | Token::LParen
                | Token::LBracket
                | Token::Comma
                | Token::Slash
                | Token::DoubleSlash
                | Token::Pipe
                | Token::Plus
                | Token::Minus
                | Token::Eq
                | Token::NotEq
                | Token::Lt
                | Token::Le
                | Token::Gt
                | Token::Ge
                | Token::Multiply
                | Token::And
                | Token::Or
                | Token::Mod
                | Token::Div
                | Token::Dollar
        )
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '\u{B7}')
}

/// Split an expression into tokens.
///
/// Returns the reason and offset of the first lexical error.
pub(crate) fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, (String, usize)> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut tokens: Vec<(Token, usize)> = Vec::new();
    let mut i = 0;

    let peek = |idx: usize| chars.get(idx).map(|&(_, c)| c);

    while i < chars.len() {
        let (offset, c) = chars[i];
        let operator_context = tokens
            .last()
            .map(|(t, _)| t.forces_operator())
            .unwrap_or(false);

        let token = match c {
            ' ' | '\t' | '\r' | '\n' => {
                i += 1;
                continue;
            }
            '/' => {
                if peek(i + 1) == Some('/') {
                    i += 2;
                    Token::DoubleSlash
                } else {
                    i += 1;
                    Token::Slash
                }
            }
            '[' => {
                i += 1;
                Token::LBracket
            }
            ']' => {
                i += 1;
                Token::RBracket
            }
            '(' => {
                i += 1;
                Token::LParen
            }
            ')' => {
                i += 1;
                Token::RParen
            }
            '@' => {
                i += 1;
                Token::At
            }
            ',' => {
                i += 1;
                Token::Comma
            }
            '|' => {
                i += 1;
                Token::Pipe
            }
            '$' => {
                i += 1;
                Token::Dollar
            }
            '+' => {
                i += 1;
                Token::Plus
            }
            '-' => {
                i += 1;
                Token::Minus
            }
            '=' => {
                i += 1;
                Token::Eq
            }
            '!' => {
                if peek(i + 1) == Some('=') {
                    i += 2;
                    Token::NotEq
                } else {
                    return Err(("expected '=' after '!'".to_string(), offset));
                }
            }
            '<' => {
                if peek(i + 1) == Some('=') {
                    i += 2;
                    Token::Le
                } else {
                    i += 1;
                    Token::Lt
                }
            }
            '>' => {
                if peek(i + 1) == Some('=') {
                    i += 2;
                    Token::Ge
                } else {
                    i += 1;
                    Token::Gt
                }
            }
            ':' => {
                if peek(i + 1) == Some(':') {
                    i += 2;
                    Token::DoubleColon
                } else {
                    return Err(("unexpected ':'".to_string(), offset));
                }
            }
            '*' => {
                i += 1;
                if operator_context {
                    Token::Multiply
                } else {
                    Token::Star
                }
            }
            '"' | '\'' => {
                let quote = c;
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && chars[end].1 != quote {
                    end += 1;
                }
                if end >= chars.len() {
                    return Err(("unterminated string literal".to_string(), offset));
                }
                let literal: String = chars[start..end].iter().map(|&(_, c)| c).collect();
                i = end + 1;
                Token::Literal(literal)
            }
            '.' => {
                if peek(i + 1) == Some('.') {
                    i += 2;
                    Token::DotDot
                } else if peek(i + 1).is_some_and(|c| c.is_ascii_digit()) {
                    let (number, next) = read_number(&chars, i);
                    i = next;
                    Token::Number(number)
                } else {
                    i += 1;
                    Token::Dot
                }
            }
            c if c.is_ascii_digit() => {
                let (number, next) = read_number(&chars, i);
                i = next;
                Token::Number(number)
            }
            c if is_name_start(c) => {
                let (name, next) = read_ncname(&chars, i);
                i = next;

                if operator_context {
                    match name.as_str() {
                        "and" => Token::And,
                        "or" => Token::Or,
                        "mod" => Token::Mod,
                        "div" => Token::Div,
                        _ => {
                            return Err((format!("expected an operator, found '{}'", name), offset))
                        }
                    }
                } else if peek(i) == Some(':') && peek(i + 1) != Some(':') {
                    match peek(i + 1) {
                        Some('*') => {
                            i += 2;
                            Token::PrefixStar(name)
                        }
                        Some(c) if is_name_start(c) => {
                            let (local, next) = read_ncname(&chars, i + 1);
                            i = next;
                            Token::Name(format!("{}:{}", name, local))
                        }
                        _ => return Err(("incomplete qualified name".to_string(), offset)),
                    }
                } else {
                    Token::Name(name)
                }
            }
            other => return Err((format!("unexpected character '{}'", other), offset)),
        };

        tokens.push((token, offset));
    }

    Ok(tokens)
}

fn read_ncname(chars: &[(usize, char)], start: usize) -> (String, usize) {
    let mut end = start;
    while end < chars.len() && is_name_char(chars[end].1) {
        end += 1;
    }
    (chars[start..end].iter().map(|&(_, c)| c).collect(), end)
}

fn read_number(chars: &[(usize, char)], start: usize) -> (f64, usize) {
    let mut end = start;
    let mut seen_dot = false;
    while end < chars.len() {
        let c = chars[end].1;
        if c.is_ascii_digit() {
            end += 1;
        } else if c == '.' && !seen_dot {
            seen_dot = true;
            end += 1;
        } else {
            break;
        }
    }
    let text: String = chars[start..end].iter().map(|&(_, c)| c).collect();
    (text.parse().unwrap_or(f64::NAN), end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|(t, _)| t)
            .collect()
    }

    #[test]
    fn test_path_tokens() {
        assert_eq!(
            kinds("./Fields/Field[Name='Title']"),
            vec![
                Token::Dot,
                Token::Slash,
                Token::Name("Fields".into()),
                Token::Slash,
                Token::Name("Field".into()),
                Token::LBracket,
                Token::Name("Name".into()),
                Token::Eq,
                Token::Literal("Title".into()),
                Token::RBracket,
            ]
        );
    }

    #[test]
    fn test_star_disambiguation() {
        assert_eq!(
            kinds("*[2 * 3]"),
            vec![
                Token::Star,
                Token::LBracket,
                Token::Number(2.0),
                Token::Multiply,
                Token::Number(3.0),
                Token::RBracket,
            ]
        );
    }

    #[test]
    fn test_operator_names() {
        assert_eq!(
            kinds("and and or"),
            vec![
                Token::Name("and".into()),
                Token::And,
                Token::Name("or".into()),
            ]
        );
        assert_eq!(
            kinds("6 div 2 mod 4"),
            vec![
                Token::Number(6.0),
                Token::Div,
                Token::Number(2.0),
                Token::Mod,
                Token::Number(4.0),
            ]
        );
    }

    #[test]
    fn test_qualified_names_and_axes() {
        assert_eq!(
            kinds("w:p/w:*/child::x"),
            vec![
                Token::Name("w:p".into()),
                Token::Slash,
                Token::PrefixStar("w".into()),
                Token::Slash,
                Token::Name("child".into()),
                Token::DoubleColon,
                Token::Name("x".into()),
            ]
        );
    }

    #[test]
    fn test_numbers_and_dots() {
        assert_eq!(
            kinds(".. . .5 1.25"),
            vec![
                Token::DotDot,
                Token::Dot,
                Token::Number(0.5),
                Token::Number(1.25),
            ]
        );
    }

    #[test]
    fn test_names_with_dots_and_dashes() {
        assert_eq!(
            kinds("li.nr/starts-with"),
            vec![
                Token::Name("li.nr".into()),
                Token::Slash,
                Token::Name("starts-with".into()),
            ]
        );
    }

    #[test]
    fn test_lexical_errors() {
        assert_eq!(tokenize("'abc").unwrap_err().1, 0);
        assert!(tokenize("a ! b").is_err());
        assert!(tokenize("a : b").is_err());
        assert!(tokenize("#").is_err());
    }
}
