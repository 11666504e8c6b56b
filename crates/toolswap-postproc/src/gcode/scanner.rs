//! Line scanning and parameter extraction
//!
//! Lightweight, allocation-free inspection of single G-code lines. Nothing here
//! builds a structured model of the line; callers only ask "which command is
//! this", "does it carry parameter X", and "is this a tool change".

use regex::Regex;
use std::sync::OnceLock;

/// Returns true when the first non-whitespace token is `T` followed by digits
///
/// `T1`, `  T12 ; extruder 2` and `T0\r\n` are tool changes; `T`, `Tx1`,
/// `T1X` and `G1 T1` are not.
pub fn is_tool_change(line: &str) -> bool {
    static TOOL_CHANGE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = TOOL_CHANGE_REGEX
        .get_or_init(|| Regex::new(r"^\s*T\d+(?:\s|;|$)").expect("invalid regex pattern"));
    regex.is_match(line)
}

/// Extract the value of parameter `letter` from a line
///
/// Only the code part of the line is searched (anything after `;` or `(` is a
/// comment). A word matches when it starts with `letter` (case-insensitive) and
/// the rest of the word is a plain decimal literal with an optional sign.
/// Returns `None` when no such word exists; a missing parameter is never
/// reported as zero.
pub fn extract_param(line: &str, letter: char) -> Option<f64> {
    ScannedLine::new(line).param(letter)
}

/// Returns true when the line's command word is exactly `prefix`
///
/// `G1` matches `G1 X5` but not `G10` or `G11 ; G1`.
pub fn starts_with_command(line: &str, prefix: &str) -> bool {
    ScannedLine::new(line).starts_with_command(prefix)
}

fn is_numeric_literal(text: &str) -> bool {
    static NUMBER_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = NUMBER_REGEX.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)$").expect("invalid regex pattern")
    });
    regex.is_match(text)
}

/// A borrowed view of one instruction line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannedLine<'a> {
    raw: &'a str,
}

impl<'a> ScannedLine<'a> {
    /// Wrap a line; a trailing `\n` or `\r\n` is ignored
    pub fn new(raw: &'a str) -> Self {
        Self {
            raw: raw.trim_end_matches(['\n', '\r']),
        }
    }

    /// The line without its terminator
    pub fn text(&self) -> &'a str {
        self.raw
    }

    /// Everything before the first comment delimiter
    pub fn code(&self) -> &'a str {
        match self.raw.find([';', '(']) {
            Some(pos) => &self.raw[..pos],
            None => self.raw,
        }
    }

    /// Text of a trailing `;` comment, without the delimiter
    pub fn comment(&self) -> Option<&'a str> {
        self.raw.find(';').map(|pos| self.raw[pos + 1..].trim())
    }

    /// Whitespace-delimited words of the code part
    pub fn words(&self) -> impl Iterator<Item = &'a str> {
        self.code().split_whitespace()
    }

    /// The first word, e.g. `G1`, `M600` or `T0`
    pub fn command(&self) -> Option<&'a str> {
        self.words().next()
    }

    /// See [`starts_with_command`]
    pub fn starts_with_command(&self, prefix: &str) -> bool {
        self.command()
            .is_some_and(|cmd| cmd.eq_ignore_ascii_case(prefix))
    }

    /// See [`extract_param`]
    pub fn param(&self, letter: char) -> Option<f64> {
        self.words().find_map(|word| {
            let mut chars = word.chars();
            let first = chars.next()?;
            if !first.eq_ignore_ascii_case(&letter) {
                return None;
            }
            let value = chars.as_str();
            if is_numeric_literal(value) {
                value.parse::<f64>().ok()
            } else {
                None
            }
        })
    }

    /// See [`is_tool_change`]
    pub fn is_tool_change(&self) -> bool {
        is_tool_change(self.raw)
    }
}
