use serde::{Deserialize, Serialize};

/// A parsed correction command.
///
/// The target override and the per-mode payload share a common parse prefix;
/// the payload is a tagged variant so a transliteration can never carry
/// substitution options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directive {
    /// `nick: ` prefix naming whose history to correct, if present.
    pub target_override: Option<String>,
    pub action: DirectiveAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DirectiveAction {
    Substitute(SubstituteCmd),
    Transliterate(TransliterateCmd),
}

/// `s<delim>pattern<delim>replacement<delim>options`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstituteCmd {
    /// Regex source text, escapes preserved as written.
    pub pattern: String,
    /// Replacement text with the delimiter escapes collapsed.
    pub replacement: String,
    pub flags: SubstituteFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubstituteFlags {
    /// `g`: replace every non-overlapping match instead of only the first.
    pub global: bool,
    /// `i`: compile the pattern case-insensitively.
    pub case_insensitive: bool,
}

/// `y<delim>from<delim>to<delim>` with `from` and `to` of equal length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransliterateCmd {
    pub from: Vec<char>,
    pub to: Vec<char>,
}
