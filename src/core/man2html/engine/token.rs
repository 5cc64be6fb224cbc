//! Token definitions for the roff tokenizer.

use std::fmt;

/// Punctuation troff attaches to the preceding word.
pub const CLOSING_DELIMITERS: &[&str] = &[".", ",", ":", ";", ")", "]", "?", "!"];

/// Punctuation that attaches to the following word.
pub const OPENING_DELIMITERS: &[&str] = &["(", "["];

/// A word as extracted from a line, before any escape is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    /// Source text, with the surrounding quotes removed and `""` collapsed.
    pub text: String,
    /// Quoted words are never macro names or delimiters.
    pub quoted: bool,
}

impl Word {
    pub fn new(text: impl Into<String>, quoted: bool) -> Self {
        Word {
            text: text.into(),
            quoted,
        }
    }

    /// Whether this word is exactly `name` and could name a macro.
    pub fn is(&self, name: &str) -> bool {
        !self.quoted && self.text == name
    }

    pub fn is_closing_delimiter(&self) -> bool {
        !self.quoted && is_closing_delimiter(&self.text)
    }

    pub fn is_opening_delimiter(&self) -> bool {
        !self.quoted && is_opening_delimiter(&self.text)
    }

    pub fn is_middle_delimiter(&self) -> bool {
        !self.quoted && is_middle_delimiter(&self.text)
    }

    pub fn is_delimiter(&self) -> bool {
        self.is_closing_delimiter() || self.is_opening_delimiter() || self.is_middle_delimiter()
    }
}

/// One lexical unit handed to the interpreter.
///
/// `value` is HTML-safe and may already carry font spans; `raw` is the
/// source text it came from. `closing` is whatever follows the token in
/// the output: folded closing punctuation plus the inter-word space, or
/// nothing when spacing is suppressed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub raw: String,
    pub closing: String,
    pub is_macro: bool,
}

impl Token {
    pub fn new(value: impl Into<String>, raw: impl Into<String>) -> Self {
        Token {
            value: value.into(),
            raw: raw.into(),
            closing: String::new(),
            is_macro: false,
        }
    }

    /// Token for a callable macro name found among the arguments.
    pub fn macro_name(name: impl Into<String>) -> Self {
        let name = name.into();
        Token {
            value: name.clone(),
            raw: name,
            closing: String::new(),
            is_macro: true,
        }
    }

    /// Synthesized output with no source word behind it.
    pub fn html(value: impl Into<String>) -> Self {
        Token::new(value, String::new())
    }

    pub fn empty() -> Self {
        Token::default()
    }

    pub fn with_closing(mut self, closing: impl Into<String>) -> Self {
        self.closing = closing.into();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty() && self.closing.is_empty()
    }

    /// Value followed by its closing text.
    pub fn into_html(self) -> String {
        let mut out = self.value;
        out.push_str(&self.closing);
        out
    }

    /// Concatenate tokens, keeping the closing of the last one separate so
    /// an enclosing macro can move it outside its brackets.
    pub fn join(parts: Vec<Token>) -> Token {
        let mut parts: Vec<Token> = parts.into_iter().filter(|t| !t.is_empty()).collect();
        let Some(last) = parts.pop() else {
            return Token::empty();
        };
        let mut value = String::new();
        let mut raw = String::new();
        for part in parts {
            raw.push_str(&part.raw);
            raw.push(' ');
            value.push_str(&part.value);
            value.push_str(&part.closing);
        }
        value.push_str(&last.value);
        raw.push_str(&last.raw);
        Token {
            value,
            raw,
            closing: last.closing,
            is_macro: false,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.closing)
    }
}

pub fn is_closing_delimiter(text: &str) -> bool {
    CLOSING_DELIMITERS.contains(&text)
}

pub fn is_opening_delimiter(text: &str) -> bool {
    OPENING_DELIMITERS.contains(&text)
}

pub fn is_middle_delimiter(text: &str) -> bool {
    text == "|"
}
