//! Recognizer for sed-style correction lines.
//!
//! The grammar is fixed: an optional `nick: ` prefix, a mode character
//! (`s` or `y`), a user-chosen delimiter, and delimiter-separated fields in
//! which the delimiter may appear only backslash-escaped. The closing
//! delimiter must be the same code point that opened the fields, which rules
//! out a single regex here (that would need a backreference), so the parse is
//! a plain character walk.

use crate::ast::{Directive, DirectiveAction, SubstituteCmd, SubstituteFlags, TransliterateCmd};
use thiserror::Error;

/// Classification of one raw chat line.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// Ordinary chat. Goes to history, not to the engine.
    NotADirective,
    /// Recognizable `s`-correction missing its closing delimiter.
    Malformed,
    /// Shaped like a directive but fails per-mode validation.
    Invalid(ValidationError),
    Directive(Directive),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unknown substitution option '{0}' (only g and i are understood)")]
    InvalidOptions(char),
    #[error("transliteration sets must be the same length ({from} vs {to})")]
    LengthMismatch { from: usize, to: usize },
}

/// Classify a raw chat line.
pub fn parse_line(line: &str) -> ParseOutcome {
    if let Some((target, body)) = split_target(line) {
        match parse_body(body) {
            // A prefixed line that is not a directive may still be one when
            // read whole, e.g. "s: foo: bar" where ':' is the delimiter.
            ParseOutcome::NotADirective => {}
            ParseOutcome::Directive(mut directive) => {
                directive.target_override = Some(target.to_string());
                return ParseOutcome::Directive(directive);
            }
            outcome => return outcome,
        }
    }
    parse_body(line)
}

/// Split a leading `nick: ` prefix. The nick is one or more non-whitespace
/// characters followed by a literal colon-space.
fn split_target(line: &str) -> Option<(&str, &str)> {
    let idx = line.find(": ")?;
    let target = &line[..idx];
    if target.is_empty() || target.chars().any(char::is_whitespace) {
        return None;
    }
    Some((target, &line[idx + 2..]))
}

fn parse_body(body: &str) -> ParseOutcome {
    let mut chars = body.chars();
    let mode = match chars.next() {
        Some(c @ ('s' | 'y')) => c,
        _ => return ParseOutcome::NotADirective,
    };
    let delim = match chars.next() {
        Some(d) if !d.is_whitespace() && !d.is_alphanumeric() => d,
        _ => return ParseOutcome::NotADirective,
    };
    let rest = chars.as_str();

    let (first, rest) = scan_field(rest, delim);
    let Some(rest) = rest else {
        return ParseOutcome::NotADirective;
    };
    let (second, options) = scan_field(rest, delim);
    let Some(options) = options else {
        // Both payload fields are present but the line never closes. For `s`
        // this is the single most common typo (s/old/new), so it gets its own
        // classification and a hint instead of being archived as chat.
        return if mode == 's' {
            ParseOutcome::Malformed
        } else {
            ParseOutcome::NotADirective
        };
    };

    if mode == 's' {
        parse_substitute(first, second, options)
    } else {
        parse_transliterate(&first, &second, options)
    }
}

fn parse_substitute(pattern: String, replacement: String, options: &str) -> ParseOutcome {
    let mut flags = SubstituteFlags::default();
    for c in options.chars() {
        match c {
            'g' => flags.global = true,
            'i' => flags.case_insensitive = true,
            other => return ParseOutcome::Invalid(ValidationError::InvalidOptions(other)),
        }
    }
    ParseOutcome::Directive(Directive {
        target_override: None,
        action: DirectiveAction::Substitute(SubstituteCmd {
            // The pattern keeps its escapes: they are regex syntax.
            pattern,
            replacement: unescape(&replacement),
            flags,
        }),
    })
}

fn parse_transliterate(from: &str, to: &str, options: &str) -> ParseOutcome {
    if let Some(stray) = options.chars().next() {
        return ParseOutcome::Invalid(ValidationError::InvalidOptions(stray));
    }
    let from: Vec<char> = unescape(from).chars().collect();
    let to: Vec<char> = unescape(to).chars().collect();
    if from.len() != to.len() {
        return ParseOutcome::Invalid(ValidationError::LengthMismatch {
            from: from.len(),
            to: to.len(),
        });
    }
    ParseOutcome::Directive(Directive {
        target_override: None,
        action: DirectiveAction::Transliterate(TransliterateCmd { from, to }),
    })
}

/// Read one field up to an unescaped occurrence of `delim`.
///
/// Returns the field text (escapes preserved) and the remainder after the
/// delimiter, or `None` for the remainder if the field never closes. A
/// trailing lone backslash cannot close a field either.
fn scan_field(input: &str, delim: char) -> (String, Option<&str>) {
    let mut field = String::new();
    let mut iter = input.char_indices();
    while let Some((idx, c)) = iter.next() {
        if c == '\\' {
            match iter.next() {
                Some((_, escaped)) => {
                    field.push('\\');
                    field.push(escaped);
                }
                None => {
                    field.push('\\');
                    return (field, None);
                }
            }
        } else if c == delim {
            return (field, Some(&input[idx + c.len_utf8()..]));
        } else {
            field.push(c);
        }
    }
    (field, None)
}

/// Collapse `\X` to `X`. Used for the fields that are plain text rather than
/// regex source.
fn unescape(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut chars = field.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(escaped) => out.push(escaped),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
