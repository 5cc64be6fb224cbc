//! Inline macro handlers
//!
//! Inline macros consume words from the current line only and return one
//! token. Text words keep the closing punctuation folded by the tokenizer
//! outside of the span they are wrapped in, so `.Ar file .` renders the
//! period right after the argument span.

use mandox_glyphs::{ATT_VERSIONS, STANDARDS};

use super::context::{Enders, FunctionBlock, ManConverter};
use super::engine::{LineCursor, Step, Token, Word};
use super::macros::{callable, MacroKind};
use super::utils::{anchor_id, html_escape, join_names};
use super::ConversionWarning;

impl ManConverter<'_> {
    // =========================================================================
    // Argument helpers
    // =========================================================================

    /// Callable macro named by the next word, if any.
    pub(crate) fn peek_macro(&self, args: &LineCursor) -> Option<MacroKind> {
        let word = args.peek_word()?;
        if self.tokenizer.is_macro_word(&word, args) {
            callable(&word.text)
        } else {
            None
        }
    }

    /// Next word unless it is a callable macro or a delimiter.
    pub(crate) fn next_argument(&mut self, args: &mut LineCursor) -> Option<Word> {
        let word = args.peek_word()?;
        if word.is_delimiter() || self.tokenizer.is_macro_word(&word, args) {
            return None;
        }
        args.next_word()
    }

    /// Next word unless it is a callable macro; delimiters included.
    fn delimiter_argument(&mut self, args: &mut LineCursor) -> Option<Word> {
        if self.peek_macro(args).is_some() {
            return None;
        }
        args.next_word()
    }

    /// All arguments up to the next callable macro or delimiter.
    fn arguments(&mut self, args: &mut LineCursor) -> Vec<Word> {
        let mut words = Vec::new();
        while let Some(word) = self.next_argument(args) {
            words.push(word);
        }
        words
    }

    /// Text tokens up to the next callable macro, each word passed through
    /// `wrap`. Delimiters are kept unwrapped. Returns the joined token and
    /// the number of wrapped words.
    fn wrapped_run(
        &mut self,
        args: &mut LineCursor,
        wrap: &mut dyn FnMut(&Self, String, usize) -> String,
    ) -> (Token, usize) {
        let line = args.line();
        let mut parts = Vec::new();
        let mut words = 0;
        while let Some(word) = args.peek_word() {
            if self.tokenizer.is_macro_word(&word, args) {
                break;
            }
            let Some(mut token) = self.tokenizer.next_token(args) else {
                break;
            };
            if !word.is_delimiter() {
                token.value = wrap(self, token.value, line);
                words += 1;
            }
            parts.push(token);
        }
        (Token::join(parts), words)
    }

    /// Semantic markup: every text word becomes a span of `class`.
    pub(crate) fn styled(&mut self, args: &mut LineCursor, class: &str) -> Token {
        self.wrapped_run(args, &mut |this, value, line| this.span(class, &value, line))
            .0
    }

    /// [`Self::styled`] with a placeholder when no word is given.
    pub(crate) fn styled_or(&mut self, args: &mut LineCursor, class: &str, default: &str) -> Token {
        let (token, words) =
            self.wrapped_run(args, &mut |this, value, line| this.span(class, &value, line));
        if words > 0 {
            return token;
        }
        let placeholder = Token::html(self.span(class, default, args.line()));
        if token.is_empty() {
            placeholder.with_closing(self.tokenizer.fold_closing(args))
        } else {
            Token::join(vec![placeholder, token])
        }
    }

    /// `No`: text back in the normal font.
    pub(crate) fn plain(&mut self, args: &mut LineCursor) -> Token {
        self.wrapped_run(args, &mut |_, value, _| value).0
    }

    /// `<br>` before every synopsis entry after the first.
    fn synopsis_break(&mut self) -> &'static str {
        if !self.state.synopsis {
            return "";
        }
        self.state.synopsis_entries += 1;
        if self.state.synopsis_entries > 1 {
            "<br>"
        } else {
            ""
        }
    }

    // =========================================================================
    // Names, flags and functions
    // =========================================================================

    /// `Nm`: the utility name. The first name given is remembered and
    /// printed by later `Nm` without arguments.
    pub(crate) fn name(&mut self, args: &mut LineCursor) -> Step<Token> {
        let line = args.line();
        let brk = self.synopsis_break();
        if self.state.meta.name.is_none() {
            if let Some(word) = args.peek_word().filter(|w| !w.is_delimiter()) {
                if !self.tokenizer.is_macro_word(&word, args) {
                    self.state.meta.name = Some(word.text);
                }
            }
        }
        let (mut token, words) =
            self.wrapped_run(args, &mut |this, value, line| this.span("name", &value, line));
        if words == 0 {
            let name = self.state.meta.name.clone().unwrap_or_default();
            let rendered = self.tokenizer.render(&name, line);
            let value = Token::html(self.span("name", &rendered, line));
            token = if token.is_empty() {
                value.with_closing(self.tokenizer.fold_closing(args))
            } else {
                Token::join(vec![value, token])
            };
        }
        token.value = format!("{}{}", brk, token.value);
        Ok(token)
    }

    /// `Fl`: each word gets a leading dash. A bare `Fl` right before another
    /// macro prints only the dash, attached (`Fl Fl long` is `--long`).
    pub(crate) fn flag(&mut self, args: &mut LineCursor) -> Token {
        let (token, words) = self.wrapped_run(args, &mut |this, value, line| {
            this.span("flag", &format!("-{}", value), line)
        });
        if words > 0 {
            return token;
        }
        let dash = Token::html(self.span("flag", "-", args.line()));
        if !token.is_empty() {
            return Token::join(vec![dash, token]);
        }
        if self.peek_macro(args).is_some() {
            dash
        } else {
            dash.with_closing(self.tokenizer.fold_closing(args))
        }
    }

    /// `Fa`: inside `Fo` the words are collected as prototype arguments.
    pub(crate) fn function_argument(&mut self, args: &mut LineCursor) -> Token {
        if self.state.function.is_none() {
            return self.styled(args, "function-argument");
        }
        let line = args.line();
        let words = self.arguments(args);
        for word in words {
            let rendered = self.tokenizer.render(&word.text, line);
            let span = self.span("function-argument", &rendered, line);
            if let Some(function) = self.state.function.as_mut() {
                function.args.push(span);
            }
        }
        Token::empty()
    }

    /// `Fn name args...`
    pub(crate) fn function(&mut self, args: &mut LineCursor) -> Token {
        let line = args.line();
        let Some(name) = self.next_argument(args) else {
            self.warn(ConversionWarning::missing_argument("Fn").at_line(line));
            return Token::empty();
        };
        let mut function = FunctionBlock {
            name: self.tokenizer.render(&name.text, line),
            args: Vec::new(),
        };
        for word in self.arguments(args) {
            let rendered = self.tokenizer.render(&word.text, line);
            function.args.push(self.span("function-argument", &rendered, line));
        }
        let closing = self.tokenizer.fold_closing(args);
        let mut token = self.prototype(&function, line);
        if !self.state.synopsis {
            token.closing = closing;
        }
        token
    }

    /// `name(arg, ...)`, terminated as a declaration in the synopsis.
    pub(crate) fn prototype(&mut self, function: &FunctionBlock, line: usize) -> Token {
        let mut value = format!(
            "{}({})",
            self.span("function", &function.name, line),
            function.args.join(", ")
        );
        if self.state.synopsis {
            value.push_str(";<br>");
        }
        Token::html(value)
    }

    /// `Ft`: function type, on its own line in the synopsis.
    pub(crate) fn function_type(&mut self, args: &mut LineCursor) -> Token {
        let brk = self.synopsis_break();
        let mut token = self.styled(args, "function-type");
        if self.state.synopsis {
            token.value = format!("{}{}<br>", brk, token.value);
            token.closing.clear();
        }
        token
    }

    /// `Fd`: preprocessor directive.
    pub(crate) fn directive(&mut self, args: &mut LineCursor) -> Token {
        let line = args.line();
        let text = args.take_rest();
        let rendered = self.tokenizer.render(&text, line);
        let mut value = self.span("define", &rendered, line);
        if self.state.synopsis {
            value.push_str("<br>");
        }
        Token::html(value)
    }

    /// `In header`: `#include <header>` in the synopsis, `<header>` elsewhere.
    pub(crate) fn include(&mut self, args: &mut LineCursor) -> Token {
        let line = args.line();
        let Some(header) = self.next_argument(args) else {
            self.warn(ConversionWarning::missing_argument("In").at_line(line));
            return Token::empty();
        };
        let rendered = self.tokenizer.render(&header.text, line);
        if self.state.synopsis {
            let value = format!("#include &lt;{}&gt;", rendered);
            return Token::html(format!("{}<br>", self.span("include", &value, line)));
        }
        let value = format!("&lt;{}&gt;", rendered);
        Token::html(self.span("include", &value, line))
            .with_closing(self.tokenizer.fold_closing(args))
    }

    /// `Lb library`
    pub(crate) fn library(&mut self, args: &mut LineCursor) -> Token {
        let line = args.line();
        let name = args.take_rest();
        if name.is_empty() {
            self.warn(ConversionWarning::missing_argument("Lb").at_line(line));
            return Token::empty();
        }
        let rendered = self.tokenizer.render(&name, line);
        Token::html(format!(
            "library \u{201C}{}\u{201D}",
            self.span("library", &rendered, line)
        ))
    }

    /// `An`: author name, or the `-split`/`-nosplit` mode switch.
    pub(crate) fn author(&mut self, args: &mut LineCursor) -> Token {
        match args.peek_word() {
            Some(word) if word.is("-split") => {
                args.next_word();
                self.state.author_split = true;
                return Token::empty();
            }
            Some(word) if word.is("-nosplit") => {
                args.next_word();
                self.state.author_split = false;
                return Token::empty();
            }
            _ => {}
        }
        let mut token = self.styled(args, "author");
        self.state.authors += 1;
        if self.state.author_split && self.state.authors > 1 {
            token.value = format!("<br>{}", token.value);
        }
        token
    }

    // =========================================================================
    // Links and cross references
    // =========================================================================

    /// `Xr name section`
    pub(crate) fn cross_reference(&mut self, args: &mut LineCursor) -> Token {
        let line = args.line();
        let Some(name) = self.next_argument(args) else {
            self.warn(ConversionWarning::missing_argument("Xr").at_line(line));
            return Token::empty();
        };
        let section = self.next_argument(args);
        let label = self.tokenizer.render(&name.text, line);
        let (href, label) = match section {
            Some(section) => {
                let sec = self.tokenizer.render(&section.text, line);
                (
                    format!("man:{}({})", html_escape(&name.text), html_escape(&section.text)),
                    format!("{}({})", label, sec),
                )
            }
            None => (format!("man:{}", html_escape(&name.text)), label),
        };
        Token::html(format!(
            "<a class=\"xref\" href=\"{}\"{}>{}</a>",
            href,
            self.marker(line),
            label
        ))
        .with_closing(self.tokenizer.fold_closing(args))
    }

    /// `Sx title`: link to a section of this page.
    pub(crate) fn section_reference(&mut self, args: &mut LineCursor) -> Token {
        let line = args.line();
        let (token, words) = self.wrapped_run(args, &mut |_, value, _| value);
        if words == 0 {
            self.warn(ConversionWarning::missing_argument("Sx").at_line(line));
            return token;
        }
        Token {
            value: format!(
                "<a class=\"link-sec\" href=\"#{}\"{}>{}</a>",
                anchor_id(&token.raw),
                self.marker(line),
                token.value
            ),
            ..token
        }
    }

    /// `Lk url [text ...]`
    pub(crate) fn link(&mut self, args: &mut LineCursor) -> Token {
        let line = args.line();
        let Some(url) = self.next_argument(args) else {
            self.warn(ConversionWarning::missing_argument("Lk").at_line(line));
            return Token::empty();
        };
        let words = self.arguments(args);
        let label = if words.is_empty() {
            self.tokenizer.render(&url.text, line)
        } else {
            words
                .iter()
                .map(|w| self.tokenizer.render(&w.text, line))
                .collect::<Vec<_>>()
                .join(" ")
        };
        Token::html(format!(
            "<a class=\"link-ext\" href=\"{}\"{}>{}</a>",
            html_escape(&url.text),
            self.marker(line),
            label
        ))
        .with_closing(self.tokenizer.fold_closing(args))
    }

    /// `Mt address`
    pub(crate) fn mail_link(&mut self, args: &mut LineCursor) -> Token {
        let line = args.line();
        let mut parts = Vec::new();
        while let Some(address) = self.next_argument(args) {
            let label = self.tokenizer.render(&address.text, line);
            let value = format!(
                "<a class=\"link-mail\" href=\"mailto:{}\"{}>{}</a>",
                html_escape(&address.text),
                self.marker(line),
                label
            );
            parts.push(Token::new(value, address.text).with_closing(self.tokenizer.fold_closing(args)));
        }
        if parts.is_empty() {
            self.warn(ConversionWarning::missing_argument("Mt").at_line(line));
        }
        Token::join(parts)
    }

    // =========================================================================
    // Spacing
    // =========================================================================

    /// `Pf prefix`: the prefix attaches to what follows.
    pub(crate) fn prefix(&mut self, args: &mut LineCursor) -> Token {
        let line = args.line();
        match args.next_word() {
            Some(word) => {
                let value = self.tokenizer.render(&word.text, line);
                Token::new(value, word.text)
            }
            None => Token::empty(),
        }
    }

    /// `Sm [on|off]`
    pub(crate) fn spacing_mode(&mut self, args: &mut LineCursor) -> Token {
        self.tokenizer.spacing = match args.next_word() {
            Some(word) if word.text == "on" => true,
            Some(word) if word.text == "off" => false,
            _ => !self.tokenizer.spacing,
        };
        args.take_rest();
        Token::empty()
    }

    // =========================================================================
    // Enclosures
    // =========================================================================

    /// `Aq Bq Brq Dq Op Pq Qq Sq Ql`: enclose the rest of the line. Trailing
    /// punctuation stays outside the brackets.
    pub(crate) fn partial_enclosure(
        &mut self,
        kind: MacroKind,
        args: &mut LineCursor,
        enders: &Enders,
    ) -> Step<Token> {
        let line = args.line();
        let (open, close) = kind.brackets().unwrap_or(("", ""));
        let inner = self.parse_inline(args, enders, &[MacroKind::Ta])?;
        let body = if kind == MacroKind::Ql {
            self.span("literal", &inner.value, line)
        } else {
            inner.value
        };
        Ok(Token {
            value: format!("{}{}{}", open, body, close),
            raw: inner.raw,
            closing: inner.closing,
            is_macro: false,
        })
    }

    /// `Ao ... Ac` and the other explicit enclosures, on one line or
    /// spanning lines until the closing macro.
    pub(crate) fn explicit_enclosure(
        &mut self,
        kind: MacroKind,
        args: &mut LineCursor,
        enders: &Enders,
    ) -> Step<Token> {
        let line = args.line();
        let Some(closer) = kind.closer() else {
            return Ok(Token::empty());
        };
        let (open, close) = kind.brackets().unwrap_or(("", ""));
        let mut open = open.to_string();
        let mut close = close.to_string();
        if kind == MacroKind::Eo {
            if let Some(word) = self.delimiter_argument(args) {
                open = self.tokenizer.render(&word.text, line);
            }
        }
        let inner = self.parse_inline(args, enders, &[closer])?;
        let inner_html = format!("{}{}", inner.value, inner.closing);

        if self.peek_macro(args) == Some(closer) {
            args.next_word();
            if closer == MacroKind::Ec {
                if let Some(word) = self.delimiter_argument(args) {
                    close = self.tokenizer.render(&word.text, line);
                }
            }
            let value = format!("{}{}{}", open, inner_html.trim_end(), close);
            return Ok(Token::new(value, inner.raw).with_closing(self.tokenizer.fold_closing(args)));
        }

        let body = self.parse_block(&enders.with(&[closer]))?;
        let mut value = format!("{}{}", open, inner_html);
        if !body.is_empty() {
            value.push('\n');
            value.push_str(body.trim_end());
        }
        let value = value.trim_end().to_string();
        match self.end_line(closer) {
            Some(end) => {
                let tail = self.line_tail(&end, enders)?;
                let closed = Token::html(format!("{}{}", value, close));
                Ok(Token::join(vec![closed, tail]))
            }
            None => {
                self.warn(
                    ConversionWarning::unterminated_block(&format!("{:?}", kind)).at_line(line),
                );
                Ok(Token::html(format!("{}{}", value, close)))
            }
        }
    }

    // =========================================================================
    // Generated text
    // =========================================================================

    /// `Bt`, `Ud`
    pub(crate) fn fixed_sentence(&mut self, args: &mut LineCursor, text: &str) -> Token {
        args.take_rest();
        Token::html(text)
    }

    /// `Ux` and other fixed words that take punctuation.
    pub(crate) fn fixed_word(&mut self, args: &mut LineCursor, text: &str) -> Token {
        Token::html(text).with_closing(self.tokenizer.fold_closing(args))
    }

    /// Utility names given to `Ex`/`Rv`, or the page's name.
    fn names_or_default(&mut self, args: &mut LineCursor, class: &str, suffix: &str) -> Vec<String> {
        let line = args.line();
        let mut words: Vec<String> = args
            .take_words()
            .into_iter()
            .filter(|w| !w.is("-std"))
            .map(|w| w.text)
            .collect();
        if words.is_empty() {
            words.extend(self.state.meta.name.clone());
        }
        words
            .iter()
            .map(|name| {
                let rendered = self.tokenizer.render(name, line);
                format!("{}{}", self.span(class, &rendered, line), suffix)
            })
            .collect()
    }

    /// `Ex -std [utility ...]`
    pub(crate) fn exit_status(&mut self, args: &mut LineCursor) -> Token {
        let line = args.line();
        let names = self.names_or_default(args, "name", "");
        if names.is_empty() {
            self.warn(ConversionWarning::missing_argument("Ex").at_line(line));
            return Token::empty();
        }
        let (noun, verb) = if names.len() == 1 {
            ("utility", "exits")
        } else {
            ("utilities", "exit")
        };
        Token::html(format!(
            "The {} {} {} 0 on success, and &gt;0 if an error occurs.",
            join_names(&names),
            noun,
            verb
        ))
    }

    /// `Rv -std [function ...]`
    pub(crate) fn return_values(&mut self, args: &mut LineCursor) -> Token {
        let line = args.line();
        let names = self.names_or_default(args, "function", "()");
        if names.is_empty() {
            self.warn(ConversionWarning::missing_argument("Rv").at_line(line));
            return Token::empty();
        }
        let (noun, verb) = if names.len() == 1 {
            ("function", "returns")
        } else {
            ("functions", "return")
        };
        let errno = self.span("variable", "errno", line);
        Token::html(format!(
            "The {} {} {} the value 0 if successful; otherwise the value -1 is returned and \
             the global variable {} is set to indicate the error.",
            join_names(&names),
            noun,
            verb,
            errno
        ))
    }

    /// `St -p1003.1`
    pub(crate) fn standard(&mut self, args: &mut LineCursor) -> Token {
        let line = args.line();
        let Some(word) = self.next_argument(args) else {
            self.warn(ConversionWarning::missing_argument("St").at_line(line));
            return Token::empty();
        };
        let value = match STANDARDS.get(word.text.as_str()) {
            Some(name) => html_escape(name),
            None => {
                self.warn(ConversionWarning::missing_argument(&format!("St {}", word.text)).at_line(line));
                self.unimplemented(&word.text, line)
            }
        };
        Token::new(value, word.text).with_closing(self.tokenizer.fold_closing(args))
    }

    /// `At [version]`
    pub(crate) fn att_version(&mut self, args: &mut LineCursor) -> Token {
        let version = self.next_argument(args);
        let value = version
            .as_ref()
            .and_then(|w| ATT_VERSIONS.get(w.text.as_str()).copied())
            .unwrap_or("AT&amp;T UNIX");
        Token::html(value).with_closing(self.tokenizer.fold_closing(args))
    }

    /// `Bx [version [variant]]`, e.g. `4.4BSD-Lite`.
    pub(crate) fn bsd_version(&mut self, args: &mut LineCursor) -> Token {
        let line = args.line();
        let value = match self.next_argument(args) {
            None => "BSD".to_string(),
            Some(version) => {
                let version = self.tokenizer.render(&version.text, line);
                match self.next_argument(args) {
                    Some(variant) => format!(
                        "{}BSD-{}",
                        version,
                        self.tokenizer.render(&variant.text, line)
                    ),
                    None => format!("{}BSD", version),
                }
            }
        };
        Token::html(value).with_closing(self.tokenizer.fold_closing(args))
    }

    /// `Bsx Fx Nx Ox Dx [version]`
    pub(crate) fn os_version(&mut self, args: &mut LineCursor, os: &str) -> Token {
        let line = args.line();
        let value = match self.next_argument(args) {
            Some(version) => format!("{} {}", os, self.tokenizer.render(&version.text, line)),
            None => os.to_string(),
        };
        Token::html(value).with_closing(self.tokenizer.fold_closing(args))
    }

    // =========================================================================
    // man font macros
    // =========================================================================

    /// `B`, `I`, `SM`, `SB`. Without arguments the font applies to the next
    /// text line.
    pub(crate) fn man_font(&mut self, args: &mut LineCursor, class: &'static str) -> Token {
        let line = args.line();
        let words = args.take_words();
        if words.is_empty() {
            self.state.pending_font = Some(class);
            return Token::empty();
        }
        let text = words
            .iter()
            .map(|w| self.tokenizer.render(&w.text, line))
            .collect::<Vec<_>>()
            .join(" ");
        Token::html(self.span(class, &text, line))
    }

    /// `BI BR IB IR RB RI`: words alternate between two fonts, unspaced.
    pub(crate) fn man_alternating(
        &mut self,
        args: &mut LineCursor,
        first: Option<&str>,
        second: Option<&str>,
    ) -> Token {
        let line = args.line();
        let mut value = String::new();
        for (idx, word) in args.take_words().iter().enumerate() {
            let rendered = self.tokenizer.render(&word.text, line);
            let class = if idx % 2 == 0 { first } else { second };
            match class {
                Some(class) => value.push_str(&self.span(class, &rendered, line)),
                None => value.push_str(&rendered),
            }
        }
        Token::html(value)
    }

    /// `OP flag [argument]`
    pub(crate) fn man_option(&mut self, args: &mut LineCursor) -> Token {
        let line = args.line();
        let words = args.take_words();
        let Some(flag) = words.first() else {
            self.warn(ConversionWarning::missing_argument("OP").at_line(line));
            return Token::empty();
        };
        let flag = self.tokenizer.render(&flag.text, line);
        let mut value = format!("[{}", self.span("bold", &flag, line));
        for word in &words[1..] {
            let rendered = self.tokenizer.render(&word.text, line);
            value.push(' ');
            value.push_str(&self.span("italic", &rendered, line));
        }
        value.push(']');
        Token::html(value)
    }
}
