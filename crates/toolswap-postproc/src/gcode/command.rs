//! Synthesized command lines
//!
//! Builders for the lines a macro emits. Every generated line follows
//! `<letter><number> [<param><value>]... [; comment]`, with decimal parameters
//! written to two places and integer-only parameters written plainly.

use std::fmt;

/// One synthesized G-code line
///
/// # Example
/// ```
/// use toolswap_postproc::CommandLine;
///
/// let line = CommandLine::new('G', 1).param('E', -200.0).param('F', 1500.0);
/// assert_eq!(line.to_string(), "G1 E-200.00 F1500.00");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    text: String,
}

impl CommandLine {
    /// Start a line with a command word such as `G1` or `M600`
    pub fn new(letter: char, number: u32) -> Self {
        Self {
            text: format!("{}{}", letter, number),
        }
    }

    /// Start a line from literal text, e.g. a dialect-specific pause phrase
    pub fn raw(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Append a decimal parameter, formatted with two decimal places
    pub fn param(mut self, letter: char, value: f64) -> Self {
        self.text.push_str(&format!(" {}{:.2}", letter, value));
        self
    }

    /// Append a decimal parameter only when a value is given
    pub fn param_opt(self, letter: char, value: Option<f64>) -> Self {
        match value {
            Some(v) => self.param(letter, v),
            None => self,
        }
    }

    /// Append an integer-only parameter (temperatures, timeouts, axis selectors)
    pub fn int_param(mut self, letter: char, value: i64) -> Self {
        self.text.push_str(&format!(" {}{}", letter, value));
        self
    }

    /// Append free text as the argument, e.g. an `M117` display message
    pub fn text(mut self, text: &str) -> Self {
        self.text.push(' ');
        self.text.push_str(text);
        self
    }

    /// Append a trailing `; comment`
    pub fn comment(mut self, comment: &str) -> Self {
        self.text.push_str(" ; ");
        self.text.push_str(comment);
        self
    }

    /// The line text, without terminator
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Appends macro lines to a buffer, each terminated by exactly one newline
#[derive(Debug)]
pub struct MacroBuilder<'a> {
    out: &'a mut String,
}

impl<'a> MacroBuilder<'a> {
    /// Append to `out`
    pub fn new(out: &'a mut String) -> Self {
        Self { out }
    }

    /// Append a command line
    pub fn line(&mut self, command: CommandLine) -> &mut Self {
        self.out.push_str(command.as_str());
        self.out.push('\n');
        self
    }

    /// Append a bare `;comment` line
    pub fn comment(&mut self, comment: &str) -> &mut Self {
        self.out.push(';');
        self.out.push_str(comment);
        self.out.push('\n');
        self
    }

    /// Append user-supplied text unchanged, adding a newline only if it lacks one
    pub fn verbatim(&mut self, text: &str) -> &mut Self {
        self.out.push_str(text);
        if !text.ends_with('\n') {
            self.out.push('\n');
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_formatting() {
        let line = CommandLine::new('M', 600)
            .param('E', -30.0)
            .param_opt('X', None)
            .param_opt('Y', Some(12.5))
            .comment("note");
        assert_eq!(line.as_str(), "M600 E-30.00 Y12.50 ; note");
    }

    #[test]
    fn test_int_params_are_unformatted() {
        let line = CommandLine::new('M', 104).int_param('S', 175);
        assert_eq!(line.to_string(), "M104 S175");
    }

    #[test]
    fn test_macro_builder_terminates_lines() {
        let mut out = String::from("G1 X1\n");
        MacroBuilder::new(&mut out)
            .comment("TYPE:CUSTOM")
            .line(CommandLine::new('M', 83))
            .verbatim("M300 S440 P200")
            .verbatim("M400\n");
        assert_eq!(out, "G1 X1\n;TYPE:CUSTOM\nM83\nM300 S440 P200\nM400\n");
    }
}
