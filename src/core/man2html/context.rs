//! Core state and structures for man/mdoc to HTML conversion
//!
//! This module contains the options, the per-document conversion state and
//! the main converter with its line and argument parsing primitives. The
//! macro handlers themselves live in `inline.rs`, `blocks.rs` and `table/`.

use indexmap::IndexMap;

use super::engine::primitives::{is_control_line, parse_request};
use super::engine::{
    Interrupt, LineCursor, LineStream, MacroProcessor, RedirectGuard, SourceLine, Step, Token,
    Tokenizer,
};
use super::macros::{callable, line_macro, lookup, MacroKind, RefField};
use super::page::render_page;
use super::utils::html_escape;
use super::{ConversionOutput, ConversionWarning};
use crate::utils::charset::split_lines;
use crate::utils::error::{ConversionError, ConversionResult};
use crate::utils::files::{FileResolver, NoopFileResolver};
use crate::utils::loss::LOSS_MARKER_CLASS;

// =============================================================================
// man/mdoc → HTML Conversion Options
// =============================================================================

/// Where the page stylesheet comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stylesheet {
    /// `<link rel="stylesheet">` to the given href
    Link(String),
    /// The default stylesheet inlined in a `<style>` element
    Embedded,
}

/// Options for man/mdoc to HTML conversion
#[derive(Debug, Clone)]
pub struct M2HOptions {
    /// Stylesheet reference in the page head
    /// Default: `Link("mandox.css")`
    pub stylesheet: Stylesheet,

    /// Emit `x-source` line attributes on rendered spans
    /// Default: true
    pub source_markers: bool,

    /// Resolve `.so` while preprocessing. When false the request reaches the
    /// interpreter, which restarts the pipeline on the target.
    /// Default: true
    pub inline_includes: bool,

    /// Maximum number of `.so` redirections followed for one document
    /// Default: 3
    pub redirect_limit: usize,

    /// Maximum nesting depth of user macro expansion
    /// Default: 1000
    pub max_expansions: usize,

    /// Footer operating system when `.Os` gives none
    /// Default: empty
    pub default_os: String,

    /// Wrap the page in a complete HTML document
    /// Default: true
    pub full_page: bool,
}

impl Default for M2HOptions {
    fn default() -> Self {
        Self {
            stylesheet: Stylesheet::Link("mandox.css".to_string()),
            source_markers: true,
            inline_includes: true,
            redirect_limit: 3,
            max_expansions: 1000,
            default_os: String::new(),
            full_page: true,
        }
    }
}

impl M2HOptions {
    /// Create new options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Standalone page with the stylesheet inlined
    pub fn standalone() -> Self {
        Self {
            stylesheet: Stylesheet::Embedded,
            ..Self::default()
        }
    }

    /// Page fragment for embedding in a host document (editor preview)
    pub fn fragment() -> Self {
        Self {
            full_page: false,
            ..Self::default()
        }
    }

    /// Output without provenance attributes
    pub fn plain() -> Self {
        Self {
            source_markers: false,
            ..Self::default()
        }
    }
}

// =============================================================================
// Conversion State
// =============================================================================

/// Page header and footer data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub title: String,
    pub section: String,
    /// Volume name from `.Dt`/`.TH`; falls back to the section's volume
    pub volume: Option<String>,
    pub date: String,
    pub os: Option<String>,
    /// First name given to `.Nm`, reused by `.Nm`, `.Ex` and `.Rv` without arguments
    pub name: Option<String>,
}

/// Fields gathered between `.Rs` and `.Re`.
#[derive(Debug, Clone, Default)]
pub struct RsState {
    pub line: usize,
    pub fields: IndexMap<RefField, Vec<String>>,
}

/// Function prototype gathered between `.Fo` and `.Fc`.
#[derive(Debug, Clone, Default)]
pub struct FunctionBlock {
    pub name: String,
    pub args: Vec<String>,
}

/// Conversion state for one document
#[derive(Debug, Clone)]
pub struct ConversionState {
    pub meta: PageMeta,
    /// Inside `SYNOPSIS`
    pub synopsis: bool,
    /// `Nm`/`Ft` lines already seen in the current synopsis
    pub synopsis_entries: usize,
    /// Fill mode; `nf`, `EX` and literal displays clear it
    pub fill: bool,
    pub references: Option<RsState>,
    pub function: Option<FunctionBlock>,
    /// Font set by a man font macro without arguments, for the next text line
    pub pending_font: Option<&'static str>,
    /// `An -split`: authors on separate lines
    pub author_split: bool,
    /// `An` entries in the current section
    pub authors: usize,
    pub warnings: Vec<ConversionWarning>,
}

impl Default for ConversionState {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionState {
    pub fn new() -> Self {
        Self {
            meta: PageMeta::default(),
            synopsis: false,
            synopsis_entries: 0,
            fill: true,
            references: None,
            function: None,
            pending_font: None,
            author_split: false,
            authors: 0,
            warnings: Vec::new(),
        }
    }
}

/// Macros that end the block being parsed.
///
/// A nested block composes its own enders with its parent's, so an
/// ancestor's terminator also closes every block opened inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enders(Vec<MacroKind>);

impl Enders {
    pub fn none() -> Self {
        Enders(Vec::new())
    }

    pub fn of(kinds: &[MacroKind]) -> Self {
        Enders(kinds.to_vec())
    }

    /// These enders plus `kinds`.
    pub fn with(&self, kinds: &[MacroKind]) -> Self {
        let mut all = self.0.clone();
        all.extend(kinds.iter().copied().filter(|k| !self.0.contains(k)));
        Enders(all)
    }

    /// These enders minus `kinds`.
    pub fn without(&self, kinds: &[MacroKind]) -> Self {
        Enders(self.0.iter().copied().filter(|k| !kinds.contains(k)).collect())
    }

    pub fn contains(&self, kind: MacroKind) -> bool {
        self.0.contains(&kind)
    }

    /// Whether a source line starts with one of these macros.
    pub fn ends(&self, line: &SourceLine) -> bool {
        line_macro(&line.text).is_some_and(|kind| self.contains(kind))
    }
}

// =============================================================================
// Converter
// =============================================================================

/// The man/mdoc to HTML converter
pub struct ManConverter<'r> {
    pub(crate) options: M2HOptions,
    pub(crate) resolver: &'r dyn FileResolver,
    pub(crate) state: ConversionState,
    pub(crate) tokenizer: Tokenizer,
    pub(crate) lines: LineStream,
}

impl ManConverter<'static> {
    /// Create a converter with default options and no file access
    pub fn new() -> Self {
        Self::with_options(M2HOptions::default())
    }

    /// Create a converter with custom options and no file access
    pub fn with_options(options: M2HOptions) -> Self {
        ManConverter::with_resolver(options, &NoopFileResolver)
    }
}

impl Default for ManConverter<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> ManConverter<'r> {
    /// Create a converter that loads `.so` targets through `resolver`
    pub fn with_resolver(options: M2HOptions, resolver: &'r dyn FileResolver) -> Self {
        let tokenizer = Tokenizer::new(options.source_markers);
        Self {
            options,
            resolver,
            state: ConversionState::new(),
            tokenizer,
            lines: LineStream::default(),
        }
    }

    /// Get a reference to the current options
    pub fn options(&self) -> &M2HOptions {
        &self.options
    }

    /// Page metadata of the last converted document
    pub fn meta(&self) -> &PageMeta {
        &self.state.meta
    }

    /// Convert one document, following `.so` redirections.
    pub fn convert(&mut self, input: &str) -> ConversionResult<ConversionOutput> {
        let mut lines = split_lines(input);
        let mut guard = RedirectGuard::new(self.options.redirect_limit, &lines);
        loop {
            self.reset();
            match self.run(lines, &mut guard) {
                Ok(body) => {
                    let output = render_page(&self.state.meta, &body, &self.options);
                    let mut warnings = std::mem::take(&mut self.state.warnings);
                    warnings.extend(self.tokenizer.take_warnings());
                    warnings.sort_by_key(|w| w.line);
                    return Ok(ConversionOutput { output, warnings });
                }
                Err(Interrupt::Redirect(path)) => {
                    log::debug!("restarting conversion on {}", path);
                    let text = self.resolver.load(&path).map_err(|e| {
                        ConversionError::redirect(format!("cannot open {}: {}", path, e))
                    })?;
                    lines = guard.follow(&path, split_lines(&text))?;
                }
                Err(Interrupt::Fatal(err)) => return Err(err),
            }
        }
    }

    fn reset(&mut self) {
        self.state = ConversionState::new();
        self.tokenizer.reset();
        self.lines = LineStream::default();
    }

    fn run(&mut self, lines: Vec<String>, guard: &mut RedirectGuard) -> Step<String> {
        let pre = MacroProcessor::new(lines, self.resolver, guard, &self.options).run()?;
        self.state.warnings.extend(pre.warnings);
        self.tokenizer.registers = pre.registers;
        self.lines = LineStream::new(pre.lines);
        self.parse_block(&Enders::none())
    }

    // =========================================================================
    // Line parsing
    // =========================================================================

    /// Interpret lines until one starts with a macro in `enders`. That line
    /// is left unread.
    pub(crate) fn parse_block(&mut self, enders: &Enders) -> Step<String> {
        let mut out = String::new();
        loop {
            if self.lines.peek().is_some_and(|line| enders.ends(line)) {
                break;
            }
            let Some(line) = self.lines.next_line() else {
                break;
            };
            if matches!(line_macro(&line.text), Some(MacroKind::Ns | MacroKind::Ap)) {
                let kept = out.trim_end().len();
                out.truncate(kept);
            }
            let html = self.parse_line(line, enders)?;
            out.push_str(&html);
        }
        Ok(out)
    }

    /// Interpret one source line.
    pub(crate) fn parse_line(&mut self, line: SourceLine, enders: &Enders) -> Step<String> {
        if is_control_line(&line.text) {
            self.parse_macro_line(line, enders)
        } else {
            Ok(self.parse_text_line(line))
        }
    }

    fn parse_macro_line(&mut self, line: SourceLine, enders: &Enders) -> Step<String> {
        let Some(request) = parse_request(&line.text) else {
            return Ok(String::new());
        };
        if request.name.is_empty() {
            return Ok(String::new());
        }
        let Some(kind) = lookup(request.name) else {
            let html = self.unimplemented(&line.text, line.number);
            self.warn(ConversionWarning::unsupported_macro(request.name).at_line(line.number));
            return Ok(html + "\n");
        };
        let mut args = LineCursor::new(request.args, line.number).parsing_macros(kind.is_parsed());
        let head = self.dispatch(kind, &mut args, enders)?;
        let rest = if kind.is_parsed() {
            self.parse_inline(&mut args, enders, &[])?
        } else {
            Token::empty()
        };
        let html = Token::join(vec![head, rest]).into_html();
        let html = html.trim_end_matches(' ');
        if html.is_empty() {
            return Ok(String::new());
        }
        let mut out = html.to_string();
        if self.tokenizer.spacing {
            out.push('\n');
        }
        Ok(out)
    }

    fn parse_text_line(&mut self, line: SourceLine) -> String {
        let m = self.marker(line.number);
        if line.text.trim().is_empty() {
            return if self.state.fill {
                format!("<div class=\"spacer\"{}></div>\n", m)
            } else {
                "\n".to_string()
            };
        }
        let mut body = self.tokenizer.render(&line.text, line.number);
        if let Some(class) = self.state.pending_font.take() {
            body = format!("<span class=\"{}\"{}>{}</span>", class, m, body);
        }
        let mut out = String::new();
        if self.state.fill && line.text.starts_with(|c: char| c == ' ' || c == '\t') {
            out.push_str("<br>");
        }
        out.push_str(&format!("<span class=\"text\"{}>{}</span>", m, body));
        if self.tokenizer.spacing || !self.state.fill {
            out.push('\n');
        }
        out
    }

    /// Interpret the rest of a macro line: callable macros are dispatched
    /// as they are met, other words become text tokens. Stops before any
    /// macro in `stop`, leaving it unread.
    pub(crate) fn parse_inline(
        &mut self,
        args: &mut LineCursor,
        enders: &Enders,
        stop: &[MacroKind],
    ) -> Step<Token> {
        let mut parts = Vec::new();
        while let Some(word) = args.peek_word() {
            if self.tokenizer.is_macro_word(&word, args) {
                let Some(kind) = callable(&word.text) else {
                    break;
                };
                if stop.contains(&kind) {
                    break;
                }
                args.next_word();
                parts.push(self.dispatch(kind, args, enders)?);
                continue;
            }
            match self.tokenizer.next_token(args) {
                Some(token) => parts.push(token),
                None => break,
            }
        }
        Ok(Token::join(parts))
    }

    /// Pop the next line if it starts with `kind`.
    pub(crate) fn end_line(&mut self, kind: MacroKind) -> Option<SourceLine> {
        if self
            .lines
            .peek()
            .is_some_and(|line| line_macro(&line.text) == Some(kind))
        {
            self.lines.next_line()
        } else {
            None
        }
    }

    /// Interpret the arguments of a closing macro line, after its name.
    pub(crate) fn line_tail(&mut self, line: &SourceLine, enders: &Enders) -> Step<Token> {
        let args = parse_request(&line.text).map_or("", |request| request.args);
        let mut cursor = LineCursor::new(args, line.number).parsing_macros(true);
        self.parse_inline(&mut cursor, enders, &[])
    }

    // =========================================================================
    // Output helpers
    // =========================================================================

    /// ` x-source="N"` when markers are enabled.
    pub(crate) fn marker(&self, line: usize) -> String {
        if self.options.source_markers {
            format!(" x-source=\"{}\"", line)
        } else {
            String::new()
        }
    }

    pub(crate) fn span(&self, class: &str, value: &str, line: usize) -> String {
        format!(
            "<span class=\"{}\"{}>{}</span>",
            class,
            self.marker(line),
            value
        )
    }

    /// Visibly marked fragment for input that has no rendering.
    pub(crate) fn unimplemented(&self, source: &str, line: usize) -> String {
        self.span(LOSS_MARKER_CLASS, &html_escape(source), line)
    }

    pub(crate) fn warn(&mut self, warning: ConversionWarning) {
        log::warn!("{}", warning);
        self.state.warnings.push(warning);
    }

    // =========================================================================
    // Shared requests
    // =========================================================================

    /// `Pp`, `Lp`, `PP`, `LP`, `P`
    pub(crate) fn paragraph(&mut self, args: &mut LineCursor) -> Token {
        args.take_rest();
        Token::html(format!(
            "<div class=\"paragraph\"{}></div>",
            self.marker(args.line())
        ))
    }

    /// `sp`
    pub(crate) fn vertical_space(&mut self, args: &mut LineCursor) -> Token {
        args.take_rest();
        Token::html(format!(
            "<div class=\"spacer\"{}></div>",
            self.marker(args.line())
        ))
    }

    /// `so` met by the interpreter restarts the pipeline on its target.
    pub(crate) fn redirect(&mut self, args: &mut LineCursor) -> Step<Token> {
        match args.next_word() {
            Some(word) => {
                log::debug!("line {}: redirect to {}", args.line(), word.text);
                Err(Interrupt::Redirect(word.text))
            }
            None => {
                self.warn(ConversionWarning::missing_argument("so").at_line(args.line()));
                Ok(Token::empty())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enders_compose() {
        let outer = Enders::of(&[MacroKind::Sh]);
        let inner = outer.with(&[MacroKind::It, MacroKind::El, MacroKind::Sh]);
        assert!(inner.contains(MacroKind::Sh));
        assert!(inner.contains(MacroKind::El));
        assert!(!outer.contains(MacroKind::El));
        assert!(inner.ends(&SourceLine::new(0, ".Sh SEE ALSO")));
        assert!(!inner.ends(&SourceLine::new(0, "Sh text")));
        let narrowed = inner.without(&[MacroKind::It]);
        assert!(!narrowed.contains(MacroKind::It));
        assert!(narrowed.contains(MacroKind::Sh));
    }

    #[test]
    fn test_options_presets() {
        assert!(M2HOptions::default().full_page);
        assert!(!M2HOptions::fragment().full_page);
        assert_eq!(M2HOptions::standalone().stylesheet, Stylesheet::Embedded);
        assert!(!M2HOptions::plain().source_markers);
        assert_eq!(M2HOptions::new().redirect_limit, 3);
    }

    #[test]
    fn test_state_resets_between_documents() {
        let mut converter = ManConverter::with_options(M2HOptions::fragment());
        converter.convert(".Dt ONE 1\n\\fBopen").unwrap();
        assert_eq!(converter.meta().title, "ONE");
        let out = converter.convert("plain").unwrap();
        assert!(!out.output.contains("bold"));
        assert_eq!(converter.meta().title, "");
    }

    #[test]
    fn test_redirect_restarts_pipeline() {
        let resolver = crate::utils::files::MemoryFileResolver::new()
            .with_file("target.1", "target text");
        let options = M2HOptions {
            inline_includes: false,
            ..M2HOptions::fragment()
        };
        let mut converter = ManConverter::with_resolver(options, &resolver);
        let out = converter.convert("before\n.so target.1\nafter").unwrap();
        assert!(out.output.contains("target text"));
        assert!(!out.output.contains("before"));
    }
}
