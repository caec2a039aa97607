//! Compound selectors
//!
//! Grammar: a comma-separated list of compound selectors, each an optional
//! tag (or `*`) followed by any number of `#id`, `.class`, `[attr]` and
//! `[attr="value"]`. Combinators are rejected.

use std::iter::Peekable;
use std::str::Chars;

use super::Element;
use crate::error::{ContactError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrTest {
    name: String,
    value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

impl Compound {
    fn matches(&self, el: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if !el.tag().eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.id() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| el.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|test| match (&test.value, el.attr(&test.name)) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(expected), Some(actual)) => expected == actual,
        })
    }
}

/// A parsed selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Compound>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self> {
        let mut chars = source.chars().peekable();
        let mut alternatives = Vec::new();
        loop {
            skip_whitespace(&mut chars);
            alternatives.push(parse_compound(source, &mut chars)?);
            skip_whitespace(&mut chars);
            match chars.next() {
                None => break,
                Some(',') => continue,
                Some(c) => {
                    return Err(invalid(
                        source,
                        format!("unexpected {c:?} (combinators are not supported)"),
                    ))
                }
            }
        }
        Ok(Self {
            source: source.to_string(),
            alternatives,
        })
    }

    pub fn matches(&self, el: &Element) -> bool {
        self.alternatives.iter().any(|c| c.matches(el))
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

fn invalid(source: &str, reason: impl Into<String>) -> ContactError {
    ContactError::InvalidSelector {
        selector: source.to_string(),
        reason: reason.into(),
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
}

fn read_ident(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut ident = String::new();
    while let Some(&c) = chars.peek() {
        if !is_ident_char(c) {
            break;
        }
        ident.push(c);
        chars.next();
    }
    ident
}

fn parse_compound(source: &str, chars: &mut Peekable<Chars<'_>>) -> Result<Compound> {
    let mut compound = Compound::default();
    let mut universal = false;

    match chars.peek() {
        Some('*') => {
            chars.next();
            universal = true;
        }
        Some(&c) if is_ident_char(c) => {
            compound.tag = Some(read_ident(chars).to_ascii_lowercase());
        }
        _ => {}
    }

    loop {
        match chars.peek() {
            Some('#') => {
                chars.next();
                let id = read_ident(chars);
                if id.is_empty() {
                    return Err(invalid(source, "empty id"));
                }
                compound.id = Some(id);
            }
            Some('.') => {
                chars.next();
                let class = read_ident(chars);
                if class.is_empty() {
                    return Err(invalid(source, "empty class"));
                }
                compound.classes.push(class);
            }
            Some('[') => {
                chars.next();
                compound.attrs.push(parse_attr(source, chars)?);
            }
            _ => break,
        }
    }

    if compound == Compound::default() && !universal {
        return Err(invalid(source, "empty selector"));
    }
    Ok(compound)
}

fn parse_attr(source: &str, chars: &mut Peekable<Chars<'_>>) -> Result<AttrTest> {
    skip_whitespace(chars);
    let name = read_ident(chars).to_ascii_lowercase();
    if name.is_empty() {
        return Err(invalid(source, "empty attribute name"));
    }
    skip_whitespace(chars);
    let value = match chars.next() {
        Some(']') => return Ok(AttrTest { name, value: None }),
        Some('=') => {
            skip_whitespace(chars);
            match chars.peek() {
                Some(&quote @ ('"' | '\'')) => {
                    chars.next();
                    let mut value = String::new();
                    loop {
                        match chars.next() {
                            Some(c) if c == quote => break,
                            Some(c) => value.push(c),
                            None => return Err(invalid(source, "unterminated string")),
                        }
                    }
                    value
                }
                _ => read_ident(chars),
            }
        }
        _ => return Err(invalid(source, "only [attr] and [attr=value] are supported")),
    };
    skip_whitespace(chars);
    if chars.next() != Some(']') {
        return Err(invalid(source, "expected ]"));
    }
    Ok(AttrTest {
        name,
        value: Some(value),
    })
}
