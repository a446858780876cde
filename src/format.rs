//! Composite format substitution for extracted values.
//!
//! Rules may carry a format template such as `DateChanged: {0}`. The
//! template follows composite formatting: `{0}` inserts the value,
//! `{0,10}` / `{0,-10}` pad it to a minimum width, `{0:spec}` is accepted
//! (a spec has no effect on text), and `{{` / `}}` are literal braces.

use crate::error::{Error, Result};

/// Substitute `value` into a composite format template.
///
/// Only placeholder index 0 exists. Any other index, an unterminated
/// placeholder or a stray closing brace is an error.
///
/// # Example
///
/// ```
/// use xml2docx::format::format_value;
///
/// assert_eq!(format_value("Status: {0}", "open")?, "Status: open");
/// assert_eq!(format_value("[{0,6}]", "ab")?, "[    ab]");
/// # Ok::<(), xml2docx::Error>(())
/// ```
pub fn format_value(template: &str, value: &str) -> Result<String> {
    let mut out = String::with_capacity(template.len() + value.len());
    let mut chars = template.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        match ch {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let placeholder = parse_placeholder(&mut chars, pos)?;
                if placeholder.index != 0 {
                    return Err(Error::Format(format!(
                        "placeholder {{{}}} at offset {} refers to a missing argument",
                        placeholder.index, pos
                    )));
                }
                push_aligned(&mut out, value, placeholder.alignment);
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                    out.push('}');
                } else {
                    return Err(Error::Format(format!(
                        "unexpected '}}' at offset {}",
                        pos
                    )));
                }
            }
            _ => out.push(ch),
        }
    }

    Ok(out)
}

#[derive(Debug)]
struct Placeholder {
    index: usize,
    alignment: i64,
}

fn parse_placeholder(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    start: usize,
) -> Result<Placeholder> {
    let unterminated = || Error::Format(format!("unterminated placeholder at offset {}", start));

    let mut digits = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if c.is_ascii_digit() {
            digits.push(c);
            chars.next();
        } else {
            break;
        }
    }
    if digits.is_empty() {
        return Err(Error::Format(format!(
            "placeholder at offset {} has no index",
            start
        )));
    }
    let index: usize = digits
        .parse()
        .map_err(|_| Error::Format(format!("placeholder index '{}' is too large", digits)))?;

    skip_spaces(chars);

    let mut alignment = 0i64;
    if matches!(chars.peek(), Some((_, ','))) {
        chars.next();
        skip_spaces(chars);
        let mut width = String::new();
        if matches!(chars.peek(), Some((_, '-'))) {
            chars.next();
            width.push('-');
        }
        while let Some(&(_, c)) = chars.peek() {
            if c.is_ascii_digit() {
                width.push(c);
                chars.next();
            } else {
                break;
            }
        }
        alignment = width.parse().map_err(|_| {
            Error::Format(format!("invalid alignment in placeholder at offset {}", start))
        })?;
        skip_spaces(chars);
    }

    if matches!(chars.peek(), Some((_, ':'))) {
        chars.next();
        loop {
            match chars.next() {
                Some((_, '}')) => return Ok(Placeholder { index, alignment }),
                Some((_, '{')) => {
                    return Err(Error::Format(format!(
                        "unexpected '{{' in format spec at offset {}",
                        start
                    )))
                }
                Some(_) => {}
                None => return Err(unterminated()),
            }
        }
    }

    match chars.next() {
        Some((_, '}')) => Ok(Placeholder { index, alignment }),
        Some((pos, c)) => Err(Error::Format(format!(
            "unexpected '{}' in placeholder at offset {}",
            c, pos
        ))),
        None => Err(unterminated()),
    }
}

fn skip_spaces(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>) {
    while matches!(chars.peek(), Some((_, ' '))) {
        chars.next();
    }
}

fn push_aligned(out: &mut String, value: &str, alignment: i64) {
    let width = alignment.unsigned_abs() as usize;
    let len = value.chars().count();
    let pad = width.saturating_sub(len);

    if alignment > 0 {
        out.extend(std::iter::repeat(' ').take(pad));
        out.push_str(value);
    } else {
        out.push_str(value);
        out.extend(std::iter::repeat(' ').take(pad));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_placeholder() {
        assert_eq!(
            format_value("DateChanged: {0}", "2024-01-01").unwrap(),
            "DateChanged: 2024-01-01"
        );
        assert_eq!(format_value("{0}/{0}", "x").unwrap(), "x/x");
    }

    #[test]
    fn test_template_without_placeholder() {
        assert_eq!(format_value("constant", "ignored").unwrap(), "constant");
    }

    #[test]
    fn test_escaped_braces() {
        assert_eq!(format_value("{{{0}}}", "v").unwrap(), "{v}");
        assert_eq!(format_value("}}", "v").unwrap(), "}");
    }

    #[test]
    fn test_alignment() {
        assert_eq!(format_value("[{0,5}]", "ab").unwrap(), "[   ab]");
        assert_eq!(format_value("[{0,-5}]", "ab").unwrap(), "[ab   ]");
        assert_eq!(format_value("[{0, 2}]", "abcd").unwrap(), "[abcd]");
    }

    #[test]
    fn test_format_spec_is_ignored() {
        assert_eq!(format_value("{0:yyyy-MM-dd}", "raw").unwrap(), "raw");
        assert_eq!(format_value("{0,4:N2}", "1").unwrap(), "   1");
    }

    #[test]
    fn test_malformed_templates() {
        assert!(matches!(format_value("{1}", "v"), Err(Error::Format(_))));
        assert!(matches!(format_value("{0", "v"), Err(Error::Format(_))));
        assert!(matches!(format_value("{}", "v"), Err(Error::Format(_))));
        assert!(matches!(format_value("a } b", "v"), Err(Error::Format(_))));
        assert!(matches!(format_value("{x}", "v"), Err(Error::Format(_))));
        assert!(matches!(format_value("{0,x}", "v"), Err(Error::Format(_))));
    }
}
