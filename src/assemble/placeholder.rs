//! Placeholder expansion for argument templates.
//!
//! Template strings reference environment values with `{name}`:
//!
//! - `{prefix}`, `{libdir}` - install prefix and library directory
//! - `{jobs}` - parallel job count
//! - `{cc}`, `{cxx}` - compiler binaries
//! - `{opt:<dep>}` - install prefix of a planned dependency
//! - `{option:<key>}` - value of an option
//!
//! `{{` and `}}` produce literal braces.

use crate::environment::BuildEnvironment;
use crate::error::{KilnError, Result};

/// A segment of a template string.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Literal(String),
    Placeholder(String),
}

/// Split a template string into literal and placeholder segments.
///
/// An unterminated `{` is kept as literal text.
pub fn parse_placeholders(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if closed {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(name));
                } else {
                    literal.push('{');
                    literal.push_str(&name);
                }
            }
            _ => literal.push(c),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

/// Look up one placeholder.
fn lookup(name: &str, env: &BuildEnvironment) -> Option<String> {
    match name {
        "prefix" => Some(env.prefix.display().to_string()),
        "libdir" => Some(env.libdir.display().to_string()),
        "jobs" => Some(env.jobs.to_string()),
        "cc" => Some(env.toolchain.cc.clone()),
        "cxx" => Some(env.toolchain.cxx.clone()),
        _ => {
            if let Some(dep) = name.strip_prefix("opt:") {
                env.dependency(dep).map(|p| p.display().to_string())
            } else if let Some(key) = name.strip_prefix("option:") {
                env.selection.get(key).map(|v| v.as_text())
            } else {
                None
            }
        }
    }
}

/// Expand every placeholder in `input`.
///
/// Fails with [`KilnError::UnresolvedPlaceholder`] when a placeholder names
/// something the environment does not have, such as an unplanned
/// dependency.
pub fn render(input: &str, env: &BuildEnvironment) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    for segment in parse_placeholders(input) {
        match segment {
            Segment::Literal(text) => out.push_str(&text),
            Segment::Placeholder(name) => match lookup(&name, env) {
                Some(value) => out.push_str(&value),
                None => {
                    return Err(KilnError::UnresolvedPlaceholder {
                        name,
                        template: input.to_string(),
                    })
                }
            },
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_literal_only() {
        assert_eq!(
            parse_placeholders("install"),
            vec![Segment::Literal("install".into())]
        );
    }

    #[test]
    fn parse_mixed() {
        assert_eq!(
            parse_placeholders("--with-icu={opt:icu4c}/lib"),
            vec![
                Segment::Literal("--with-icu=".into()),
                Segment::Placeholder("opt:icu4c".into()),
                Segment::Literal("/lib".into()),
            ]
        );
    }

    #[test]
    fn parse_escaped_braces() {
        assert_eq!(
            parse_placeholders("{{jobs}}"),
            vec![Segment::Literal("{jobs}".into())]
        );
    }

    #[test]
    fn parse_unterminated_brace_is_literal() {
        assert_eq!(
            parse_placeholders("a{b"),
            vec![Segment::Literal("a{b".into())]
        );
    }

    #[test]
    fn parse_adjacent_placeholders() {
        assert_eq!(
            parse_placeholders("{cc}{cxx}"),
            vec![
                Segment::Placeholder("cc".into()),
                Segment::Placeholder("cxx".into()),
            ]
        );
    }
}
