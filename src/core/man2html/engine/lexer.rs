//! Roff Tokenizer
//!
//! Turns one line, or the unread remainder of a macro line, into words and
//! tokens. This follows troff input rules:
//! - blank separated words, `"` quoting with `""` for a literal quote
//! - escapes kept whole while splitting (`\h'1 i'` is one word)
//! - closing punctuation folded into the preceding token
//!
//! Rendering resolves escapes to HTML and tracks a [`FormatState`] that
//! survives line boundaries. Every rendered fragment reopens the held font,
//! color and baseline spans at its start and closes them at its end, so the
//! output nests correctly whatever the input does.

use std::fmt::Write;

use mandox_glyphs::{lookup_escape, named_glyph, predefined_string};

use super::primitives::{
    escape_len, parse_delimited, parse_escape_name, MAX_INTERPOLATION_DEPTH,
};
use super::token::{Token, Word};
use super::Registers;
use crate::core::man2html::macros::callable;
use crate::core::man2html::utils::{css_color, html_escape, push_escaped, to_css_width};
use crate::core::man2html::ConversionWarning;
use crate::utils::loss::LOSS_MARKER_CLASS;

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Read the next word from `s`. Returns the word and the bytes consumed,
/// including leading blanks and a closing quote.
pub fn read_word(s: &str) -> Option<(Word, usize)> {
    let start = s.len() - s.trim_start_matches(is_blank).len();
    let body = &s[start..];
    if body.is_empty() {
        return None;
    }
    let (quoted, offset) = match body.strip_prefix('"') {
        Some(_) => (true, 1),
        None => (false, 0),
    };
    let src = &body[offset..];
    let mut text = String::new();
    let mut i = 0;
    while let Some(c) = src[i..].chars().next() {
        match c {
            '"' if quoted => {
                if src[i + 1..].starts_with('"') {
                    text.push('"');
                    i += 2;
                    continue;
                }
                return Some((Word::new(text, true), start + offset + i + 1));
            }
            '\\' => {
                let n = 1 + escape_len(&src[i + 1..]);
                text.push_str(&src[i..i + n]);
                i += n;
            }
            c if !quoted && is_blank(c) => break,
            c => {
                text.push(c);
                i += c.len_utf8();
            }
        }
    }
    Some((Word::new(text, quoted), start + offset + i))
}

/// Read position within one line.
#[derive(Debug, Clone)]
pub struct LineCursor {
    text: String,
    pos: usize,
    line: usize,
    parse_macros: bool,
}

impl LineCursor {
    pub fn new(text: impl Into<String>, line: usize) -> Self {
        LineCursor {
            text: text.into(),
            pos: 0,
            line,
            parse_macros: false,
        }
    }

    /// Recognize callable mdoc macro names among the words.
    pub fn parsing_macros(mut self, parse: bool) -> Self {
        self.parse_macros = parse;
        self
    }

    pub fn parses_macros(&self) -> bool {
        self.parse_macros
    }

    /// Source line the words came from.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn rest(&self) -> &str {
        &self.text[self.pos..]
    }

    pub fn is_empty(&self) -> bool {
        self.rest().trim_matches(is_blank).is_empty()
    }

    pub fn peek_word(&self) -> Option<Word> {
        read_word(self.rest()).map(|(word, _)| word)
    }

    pub fn next_word(&mut self) -> Option<Word> {
        let (word, used) = read_word(self.rest())?;
        self.pos += used;
        Some(word)
    }

    /// Everything left on the line, unsplit.
    pub fn take_rest(&mut self) -> String {
        let rest = self.rest().trim_start_matches(is_blank).to_string();
        self.pos = self.text.len();
        rest
    }

    pub fn take_words(&mut self) -> Vec<Word> {
        let mut words = Vec::new();
        while let Some(word) = self.next_word() {
            words.push(word);
        }
        words
    }
}

/// Troff fonts reachable through `\f` and `.ft`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
    Italic,
    BoldItalic,
    Courier,
    CourierItalic,
}

impl Font {
    pub fn from_name(name: &str) -> Option<Font> {
        match name {
            "R" | "1" | "CR" => Some(Font::Regular),
            "B" | "3" => Some(Font::Bold),
            "I" | "2" => Some(Font::Italic),
            "BI" | "4" => Some(Font::BoldItalic),
            "C" | "CW" | "CB" => Some(Font::Courier),
            "CI" => Some(Font::CourierItalic),
            _ => None,
        }
    }

    /// CSS class of the span carrying this font.
    pub fn class(self) -> Option<&'static str> {
        match self {
            Font::Regular => None,
            Font::Bold => Some("bold"),
            Font::Italic => Some("italic"),
            Font::BoldItalic => Some("bold-italic"),
            Font::Courier => Some("pre"),
            Font::CourierItalic => Some("courier-italic"),
        }
    }
}

/// Cross-line font, color and baseline state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatState {
    pub fonts: Vec<Font>,
    pub colors: Vec<String>,
    /// Positive inside `\u`, negative inside `\d`.
    pub vertical: i32,
}

impl FormatState {
    pub fn font(&self) -> Font {
        self.fonts.last().copied().unwrap_or(Font::Regular)
    }

    /// Select a font. Roman drops the whole stack.
    pub fn set_font(&mut self, font: Font) {
        if font == Font::Regular {
            self.fonts.clear();
        } else {
            self.fonts.push(font);
        }
    }

    /// `\fP`: back to the previous font.
    pub fn previous_font(&mut self) {
        self.fonts.pop();
    }

    pub fn is_plain(&self) -> bool {
        self.font() == Font::Regular && self.colors.is_empty() && self.vertical == 0
    }

    pub fn reset(&mut self) {
        *self = FormatState::default();
    }
}

/// Word splitting and escape rendering for one document.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    pub format: FormatState,
    pub registers: Registers,
    /// Inter-word spacing; `Sm off` clears it.
    pub spacing: bool,
    source_markers: bool,
    warnings: Vec<ConversionWarning>,
}

impl Tokenizer {
    pub fn new(source_markers: bool) -> Self {
        Tokenizer {
            format: FormatState::default(),
            registers: Registers::new(),
            spacing: true,
            source_markers,
            warnings: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.format.reset();
        self.registers.clear();
        self.spacing = true;
        self.warnings.clear();
    }

    pub fn take_warnings(&mut self) -> Vec<ConversionWarning> {
        std::mem::take(&mut self.warnings)
    }

    fn marker(&self, line: usize) -> String {
        if self.source_markers {
            format!(" x-source=\"{}\"", line)
        } else {
            String::new()
        }
    }

    /// Render one fragment of source text to HTML.
    pub fn render(&mut self, text: &str, line: usize) -> String {
        let mut out = String::with_capacity(text.len());
        self.open_held(&mut out, line);
        self.render_into(text, line, &mut out, 0);
        self.close_held(&mut out);
        out
    }

    fn render_into(&mut self, text: &str, line: usize, out: &mut String, depth: usize) {
        let mut rest = text;
        while let Some(idx) = rest.find('\\') {
            push_escaped(out, &rest[..idx]);
            let after = &rest[idx + 1..];
            let used = self.render_escape(after, line, out, depth);
            rest = &after[used.min(after.len())..];
        }
        push_escaped(out, rest);
    }

    /// Render the escape whose selector starts `after`. Returns the bytes
    /// consumed after the backslash.
    fn render_escape(&mut self, after: &str, line: usize, out: &mut String, depth: usize) -> usize {
        let Some(sel) = after.chars().next() else {
            return 0;
        };
        if let Some((len, value)) = lookup_escape(after) {
            out.push_str(value);
            return len;
        }
        let rest = &after[sel.len_utf8()..];
        let full = escape_len(after);
        match sel {
            '*' => {
                if let Some((name, used)) = parse_escape_name(rest) {
                    if let Some(value) = self.registers.string(&name).map(str::to_string) {
                        if depth >= MAX_INTERPOLATION_DEPTH {
                            self.warn(ConversionWarning::macro_loop(&name).at_line(line));
                        } else {
                            self.render_into(&value, line, out, depth + 1);
                        }
                        return 1 + used;
                    }
                    if let Some(value) = predefined_string(&name) {
                        out.push_str(value);
                        return 1 + used;
                    }
                }
                self.unsupported(&after[..full], line, out)
            }
            'f' => match parse_escape_name(rest) {
                Some((name, used)) => {
                    self.change_font(&name, line, out);
                    1 + used
                }
                None => full,
            },
            'm' => match parse_escape_name(rest) {
                Some((name, used)) => {
                    self.close_held(out);
                    if name.is_empty() {
                        self.format.colors.pop();
                    } else if let Some(color) = css_color(&name) {
                        self.format.colors.push(color);
                    }
                    self.open_held(out, line);
                    1 + used
                }
                None => full,
            },
            's' | 'v' | 'k' => full,
            'u' => {
                self.shift(1, line, out);
                1
            }
            'd' => {
                self.shift(-1, line, out);
                1
            }
            'h' => match parse_delimited(rest) {
                Some((arg, used)) => {
                    let _ = write!(
                        out,
                        "<span class=\"moved\" style=\"margin-left:{}\"></span>",
                        to_css_width(&arg)
                    );
                    1 + used
                }
                None => self.unsupported(&after[..full], line, out),
            },
            'z' => {
                let inner_len = match rest.chars().next() {
                    Some('\\') => 1 + escape_len(&rest[1..]),
                    Some(c) => c.len_utf8(),
                    None => 0,
                };
                let mut inner = String::new();
                self.render_into(&rest[..inner_len], line, &mut inner, depth + 1);
                let _ = write!(out, "<span class=\"zero-width\">{}</span>", inner);
                1 + inner_len
            }
            'l' | 'L' => match parse_delimited(rest) {
                Some((arg, used)) => {
                    let length: String = arg
                        .chars()
                        .take_while(|c| c.is_ascii_digit() || ".+-cipPvmnuM".contains(*c))
                        .collect();
                    let (class, property) = if sel == 'l' {
                        ("rule-horizontal", "width")
                    } else {
                        ("rule-vertical", "height")
                    };
                    let _ = write!(
                        out,
                        "<span class=\"{}\" style=\"{}:{}\"></span>",
                        class,
                        property,
                        to_css_width(&length)
                    );
                    1 + used
                }
                None => self.unsupported(&after[..full], line, out),
            },
            'n' => {
                let sign = usize::from(rest.starts_with('+') || rest.starts_with('-'));
                match parse_escape_name(&rest[sign..]) {
                    Some((name, used)) => {
                        let value = self.registers.number(&name).unwrap_or("0").to_string();
                        push_escaped(out, &value);
                        1 + sign + used
                    }
                    None => full,
                }
            }
            '[' => {
                let name = after[1..full.max(1)].trim_end_matches(']');
                match glyph_by_name(name) {
                    Some(glyph) => {
                        out.push_str(&glyph);
                        full
                    }
                    None => self.unsupported(&after[..full], line, out),
                }
            }
            'N' => {
                let code = parse_delimited(rest)
                    .and_then(|(arg, _)| arg.parse::<u32>().ok())
                    .and_then(char::from_u32);
                match code {
                    Some(c) => {
                        push_escaped(out, c.encode_utf8(&mut [0; 4]));
                        full
                    }
                    None => self.unsupported(&after[..full], line, out),
                }
            }
            'C' => match parse_delimited(rest).and_then(|(name, _)| glyph_by_name(&name)) {
                Some(glyph) => {
                    out.push_str(&glyph);
                    full
                }
                None => self.unsupported(&after[..full], line, out),
            },
            '\\' => {
                out.push('\\');
                1
            }
            '"' | '#' => after.len(),
            _ => self.unsupported(&after[..full], line, out),
        }
    }

    fn unsupported(&mut self, escape: &str, line: usize, out: &mut String) -> usize {
        let marker = self.marker(line);
        let _ = write!(
            out,
            "<span class=\"{}\"{}>\\{}</span>",
            LOSS_MARKER_CLASS,
            marker,
            html_escape(escape)
        );
        self.warn(ConversionWarning::unsupported_escape(escape).at_line(line));
        escape.len()
    }

    fn warn(&mut self, warning: ConversionWarning) {
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }

    fn change_font(&mut self, name: &str, line: usize, out: &mut String) {
        self.close_held(out);
        match name {
            "P" | "" => self.format.previous_font(),
            other => match Font::from_name(other) {
                Some(font) => self.format.set_font(font),
                None => self.warn(
                    ConversionWarning::unsupported_escape(&format!("f{}", other)).at_line(line),
                ),
            },
        }
        self.open_held(out, line);
    }

    /// Apply a `.ft` request.
    pub fn select_font(&mut self, name: &str) {
        match name {
            "P" | "" => self.format.previous_font(),
            other => {
                if let Some(font) = Font::from_name(other) {
                    self.format.set_font(font);
                }
            }
        }
    }

    fn shift(&mut self, delta: i32, line: usize, out: &mut String) {
        self.close_held(out);
        self.format.vertical += delta;
        self.open_held(out, line);
    }

    fn open_held(&self, out: &mut String, line: usize) {
        if let Some(class) = self.format.font().class() {
            let _ = write!(out, "<span class=\"{}\"{}>", class, self.marker(line));
        }
        if let Some(color) = self.format.colors.last() {
            let _ = write!(out, "<span style=\"color:{}\"{}>", color, self.marker(line));
        }
        match self.format.vertical {
            v if v > 0 => out.push_str("<sup>"),
            v if v < 0 => out.push_str("<sub>"),
            _ => {}
        }
    }

    fn close_held(&self, out: &mut String) {
        match self.format.vertical {
            v if v > 0 => out.push_str("</sup>"),
            v if v < 0 => out.push_str("</sub>"),
            _ => {}
        }
        if !self.format.colors.is_empty() {
            out.push_str("</span>");
        }
        if self.format.font().class().is_some() {
            out.push_str("</span>");
        }
    }

    /// Whether `word` names a callable macro on this line.
    pub fn is_macro_word(&self, word: &Word, args: &LineCursor) -> bool {
        args.parses_macros() && !word.quoted && callable(&word.text).is_some()
    }

    /// Next token from the line. Callable macro names come back unrendered
    /// with `is_macro` set; text tokens carry their folded closing.
    pub fn next_token(&mut self, args: &mut LineCursor) -> Option<Token> {
        let word = args.next_word()?;
        if self.is_macro_word(&word, args) {
            return Some(Token::macro_name(word.text));
        }
        let value = self.render(&word.text, args.line());
        let opening = word.is_opening_delimiter();
        let mut token = Token::new(value, word.text);
        if !opening {
            token.closing = self.fold_closing(args);
        }
        Some(token)
    }

    /// Consume closing punctuation that follows the current token and
    /// return it together with the inter-word space, if any.
    pub fn fold_closing(&mut self, args: &mut LineCursor) -> String {
        let mut closing = String::new();
        while let Some(word) = args.peek_word() {
            if word.is_closing_delimiter() {
                args.next_word();
                closing.push_str(&html_escape(&word.text));
            } else if word.is_middle_delimiter() {
                args.next_word();
                closing.push_str(" |");
            } else {
                break;
            }
        }
        if self.spacing && !self.space_suppressed(args) {
            closing.push(' ');
        }
        closing
    }

    fn space_suppressed(&self, args: &LineCursor) -> bool {
        args.parses_macros()
            && args
                .peek_word()
                .is_some_and(|word| word.is("Ns") || word.is("Ap"))
    }
}

/// `\[name]` and `\C'name'`: Unicode (`u00E9`), decimal (`char46`) or a
/// named glyph.
fn glyph_by_name(name: &str) -> Option<String> {
    if let Some(hex) = name.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            let c = u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)?;
            return Some(html_escape(c.encode_utf8(&mut [0; 4])));
        }
    }
    if let Some(dec) = name.strip_prefix("char") {
        let c = dec.parse::<u32>().ok().and_then(char::from_u32)?;
        return Some(html_escape(c.encode_utf8(&mut [0; 4])));
    }
    named_glyph(name).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer() -> Tokenizer {
        Tokenizer::new(true)
    }

    #[test]
    fn test_read_word() {
        assert_eq!(read_word("  foo bar"), Some((Word::new("foo", false), 5)));
        assert_eq!(
            read_word("\"two words\" x"),
            Some((Word::new("two words", true), 11))
        );
        assert_eq!(
            read_word("\"a \"\"q\"\"\""),
            Some((Word::new("a \"q\"", true), 9))
        );
        assert_eq!(
            read_word("a\\ b c"),
            Some((Word::new("a\\ b", false), 4))
        );
        assert_eq!(read_word("\\h'1 i'x y").map(|(w, _)| w.text), Some("\\h'1 i'x".into()));
        assert_eq!(read_word("   "), None);
    }

    #[test]
    fn test_cursor_words() {
        let mut cursor = LineCursor::new("Fl v Ar file", 2);
        assert_eq!(cursor.peek_word().map(|w| w.text), Some("Fl".into()));
        assert_eq!(cursor.next_word().map(|w| w.text), Some("Fl".into()));
        assert_eq!(cursor.take_rest(), "v Ar file");
        assert!(cursor.is_empty());
        assert_eq!(cursor.line(), 2);
    }

    #[test]
    fn test_font_span_closes() {
        let mut tk = tokenizer();
        assert_eq!(
            tk.render("\\fBbold\\fP text", 0),
            "<span class=\"bold\" x-source=\"0\">bold</span> text"
        );
        assert!(tk.format.is_plain());
    }

    #[test]
    fn test_font_held_across_lines() {
        let mut tk = tokenizer();
        assert_eq!(
            tk.render("a \\fIb", 1),
            "a <span class=\"italic\" x-source=\"1\">b</span>"
        );
        assert_eq!(
            tk.render("c\\fR d", 2),
            "<span class=\"italic\" x-source=\"2\">c</span> d"
        );
    }

    #[test]
    fn test_glyphs_and_registers() {
        let mut tk = tokenizer();
        tk.registers.strings.insert("V".into(), "1.0".into());
        tk.registers.numbers.insert("N".into(), "7".into());
        assert_eq!(tk.render("\\(co \\*V \\nN", 0), "© 1.0 7");
        assert_eq!(tk.render("\\*(Px", 0), "POSIX");
        assert_eq!(tk.render("\\[u00E9]\\N'65'\\e", 0), "éA\\");
        assert_eq!(tk.render("a\\&<b", 0), "a&lt;b");
    }

    #[test]
    fn test_sub_and_superscript() {
        let mut tk = tokenizer();
        assert_eq!(tk.render("x\\u2\\d", 0), "x<sup>2</sup>");
    }

    #[test]
    fn test_unknown_escape_degrades() {
        let mut tk = tokenizer();
        let html = tk.render("\\(zz!", 4);
        assert_eq!(
            html,
            "<span class=\"unimplemented\" x-source=\"4\">\\(zz</span>!"
        );
        assert_eq!(tk.take_warnings().len(), 1);
    }

    #[test]
    fn test_self_referential_string_stops() {
        let mut tk = tokenizer();
        tk.registers.strings.insert("x".into(), "a\\*x".into());
        let html = tk.render("\\*x", 0);
        assert!(html.starts_with("aaaa"));
        assert!(!tk.take_warnings().is_empty());
    }

    #[test]
    fn test_closing_delimiters_fold() {
        let mut tk = tokenizer();
        let mut cursor = LineCursor::new("file ) , next", 0).parsing_macros(true);
        let token = tk.next_token(&mut cursor).unwrap();
        assert_eq!(token.value, "file");
        assert_eq!(token.closing, "), ");
        let token = tk.next_token(&mut cursor).unwrap();
        assert_eq!(token.value, "next");
        assert_eq!(token.closing, " ");
    }

    #[test]
    fn test_pipe_and_opening_delimiters() {
        let mut tk = tokenizer();
        let mut cursor = LineCursor::new("( a | b", 0).parsing_macros(true);
        let open = tk.next_token(&mut cursor).unwrap();
        assert_eq!((open.value.as_str(), open.closing.as_str()), ("(", ""));
        let a = tk.next_token(&mut cursor).unwrap();
        assert_eq!(a.closing, " | ");
    }

    #[test]
    fn test_macro_words_and_ns() {
        let mut tk = tokenizer();
        let mut cursor = LineCursor::new("x Ns Ar", 0).parsing_macros(true);
        let x = tk.next_token(&mut cursor).unwrap();
        assert_eq!(x.closing, "");
        let ns = tk.next_token(&mut cursor).unwrap();
        assert!(ns.is_macro);

        let mut plain = LineCursor::new("x Ns", 0);
        let x = tk.next_token(&mut plain).unwrap();
        assert_eq!(x.closing, " ");
        assert!(!tk.next_token(&mut plain).unwrap().is_macro);
    }

    #[test]
    fn test_spacing_off() {
        let mut tk = tokenizer();
        tk.spacing = false;
        let mut cursor = LineCursor::new("a b", 0);
        assert_eq!(tk.next_token(&mut cursor).unwrap().closing, "");
    }

    #[test]
    fn test_markers_disabled() {
        let mut tk = Tokenizer::new(false);
        assert_eq!(
            tk.render("\\fBx\\fR", 0),
            "<span class=\"bold\">x</span>"
        );
    }
}
