//! Applies a compiled directive to a history snapshot.

use std::collections::HashMap;

use regex::{Regex, RegexBuilder};
use resay_parser::{DirectiveAction, SubstituteCmd, TransliterateCmd};
use thiserror::Error;

use crate::history::Utterance;
use crate::scheduler::CancelToken;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid regex: {0}")]
    InvalidRegex(#[from] regex::Error),
}

/// Directive with its pattern compiled, ready to run against a snapshot.
/// Compilation happens before the job is submitted, so a bad pattern is
/// reported synchronously and never touches history.
pub enum CompiledDirective {
    Substitute {
        regex: Regex,
        replacement: String,
        global: bool,
    },
    Transliterate {
        from: Vec<char>,
        mapping: HashMap<char, char>,
    },
}

pub fn compile(action: &DirectiveAction, size_limit: usize) -> Result<CompiledDirective, EngineError> {
    match action {
        DirectiveAction::Substitute(SubstituteCmd {
            pattern,
            replacement,
            flags,
        }) => {
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(flags.case_insensitive)
                .size_limit(size_limit)
                .build()?;
            Ok(CompiledDirective::Substitute {
                regex,
                replacement: replacement.clone(),
                global: flags.global,
            })
        }
        DirectiveAction::Transliterate(TransliterateCmd { from, to }) => {
            let mapping = from.iter().copied().zip(to.iter().copied()).collect();
            Ok(CompiledDirective::Transliterate {
                from: from.clone(),
                mapping,
            })
        }
    }
}

/// Scan the snapshot oldest to newest, keep the last eligible entry, and
/// return its transformed text as a fresh utterance of the same kind.
/// `None` means no entry was eligible (or the job was cancelled mid-scan);
/// that is silence, not an error.
///
/// Runs on a worker thread; the token is checked between entries and between
/// replacement steps so an abandoned job winds down instead of finishing a
/// long scan nobody is waiting for.
pub fn apply(
    compiled: &CompiledDirective,
    snapshot: &[Utterance],
    cancel: &CancelToken,
) -> Option<Utterance> {
    let mut chosen = None;
    for entry in snapshot {
        if cancel.is_cancelled() {
            return None;
        }
        if eligible(compiled, &entry.text) {
            chosen = Some(entry);
        }
    }
    let entry = chosen?;
    let text = match compiled {
        CompiledDirective::Substitute {
            regex,
            replacement,
            global,
        } => substitute(regex, &entry.text, replacement, *global, cancel)?,
        CompiledDirective::Transliterate { mapping, .. } => transliterate(mapping, &entry.text),
    };
    Some(Utterance {
        speaker: entry.speaker.clone(),
        text,
        kind: entry.kind,
    })
}

fn eligible(compiled: &CompiledDirective, text: &str) -> bool {
    match compiled {
        CompiledDirective::Substitute { regex, .. } => regex.is_match(text),
        // Every source character must appear, not just one. Asymmetric with
        // substitute mode on purpose.
        CompiledDirective::Transliterate { from, .. } => from.iter().all(|c| text.contains(*c)),
    }
}

fn substitute(
    regex: &Regex,
    text: &str,
    replacement: &str,
    global: bool,
    cancel: &CancelToken,
) -> Option<String> {
    if !global {
        return Some(regex.replace(text, replacement).into_owned());
    }
    // Manual walk instead of replace_all so the cancel flag is honoured
    // between matches.
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in regex.captures_iter(text) {
        if cancel.is_cancelled() {
            return None;
        }
        let m = caps.get(0)?;
        out.push_str(&text[last..m.start()]);
        caps.expand(replacement, &mut out);
        last = m.end();
    }
    out.push_str(&text[last..]);
    Some(out)
}

fn transliterate(mapping: &HashMap<char, char>, text: &str) -> String {
    text.chars()
        .map(|c| mapping.get(&c).copied().unwrap_or(c))
        .collect()
}
