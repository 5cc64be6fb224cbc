//! Block macro handlers
//!
//! This module handles everything that spans lines:
//! - the document prologue (`Dd`, `Dt`, `Os`, `TH`)
//! - sections (`Sh`, `Ss`, `SH`, `SS`)
//! - lists (`Bl`/`It`/`El`) and displays (`Bd`, `D1`, `Dl`, `Bf`, `Bk`)
//! - function prototypes (`Fo`/`Fc`) and references (`Rs`/`Re`)
//! - man paragraphs (`TP`, `IP`, `HP`, `RS`), no-fill blocks and links
//!
//! A block reads lines through [`ManConverter::parse_block`] with its own
//! enders added to its parent's, and consumes its explicit terminator
//! afterwards if there is one.

use std::fmt::Write;

use indexmap::IndexMap;
use mandox_glyphs::volume_title;

use super::context::{Enders, FunctionBlock, ManConverter, RsState};
use super::engine::primitives::parse_request;
use super::engine::{LineCursor, SourceLine, Step, Token};
use super::macros::{line_macro, MacroKind, RefField};
use super::utils::{anchor_id, html_escape, join_names, normalize_date, to_css_width};
use super::ConversionWarning;

/// Default `-width` of tagged lists.
const DEFAULT_TAG_WIDTH: &str = "8n";

/// Default indent of man paragraphs and `RS`.
const DEFAULT_MAN_INDENT: &str = "7n";

/// Macros ending a man paragraph body.
const MAN_PARAGRAPH_ENDERS: [MacroKind; 7] = [
    MacroKind::ManTp,
    MacroKind::ManTq,
    MacroKind::ManIp,
    MacroKind::ManPp,
    MacroKind::ManHp,
    MacroKind::ManSs,
    MacroKind::ManSh,
];

/// `Bl` list types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListKind {
    Tag,
    Bullet,
    Dash,
    Enum,
    Item,
    Hang,
    Inset,
    Ohang,
    Diag,
    Column,
    Unsupported(String),
}

impl ListKind {
    fn from_flag(flag: &str) -> Option<ListKind> {
        match flag {
            "-tag" => Some(ListKind::Tag),
            "-bullet" => Some(ListKind::Bullet),
            "-dash" | "-hyphen" => Some(ListKind::Dash),
            "-enum" => Some(ListKind::Enum),
            "-item" => Some(ListKind::Item),
            "-hang" => Some(ListKind::Hang),
            "-inset" => Some(ListKind::Inset),
            "-ohang" => Some(ListKind::Ohang),
            "-diag" => Some(ListKind::Diag),
            "-column" => Some(ListKind::Column),
            _ => None,
        }
    }
}

/// Arguments of a `Bl` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSpec {
    pub kind: ListKind,
    pub width: String,
    pub offset: Option<String>,
    pub compact: bool,
    /// Column widths of a `-column` list, as CSS lengths
    pub columns: Vec<String>,
}

impl ListSpec {
    pub fn parse(words: &[String]) -> ListSpec {
        let mut spec = ListSpec {
            kind: ListKind::Unsupported(String::new()),
            width: to_css_width(DEFAULT_TAG_WIDTH),
            offset: None,
            compact: false,
            columns: Vec::new(),
        };
        let mut kind = None;
        let mut iter = words.iter();
        while let Some(word) = iter.next() {
            match word.as_str() {
                "-width" => {
                    if let Some(width) = iter.next() {
                        spec.width = to_css_width(width);
                    }
                }
                "-offset" => {
                    spec.offset = iter.next().map(|offset| offset_width(offset));
                }
                "-compact" => spec.compact = true,
                flag => match ListKind::from_flag(flag) {
                    Some(found) if kind.is_none() => kind = Some(found),
                    Some(_) => {}
                    None if kind == Some(ListKind::Column) && !flag.starts_with('-') => {
                        spec.columns.push(to_css_width(flag));
                    }
                    None if kind.is_none() && flag.starts_with('-') => {
                        kind = Some(ListKind::Unsupported(flag.to_string()));
                    }
                    None => {}
                },
            }
        }
        if let Some(kind) = kind {
            spec.kind = kind;
        }
        spec
    }
}

/// `-offset` value: `left` is no offset; keywords and widths as usual.
fn offset_width(offset: &str) -> String {
    match offset {
        "left" => "0".to_string(),
        "right" | "center" | "centre" => "6em".to_string(),
        other => to_css_width(other),
    }
}

fn offset_style(offset: &Option<String>) -> String {
    match offset {
        Some(width) if width != "0" => format!(" style=\"margin-left:{}\"", width),
        _ => String::new(),
    }
}

impl ManConverter<'_> {
    // =========================================================================
    // Prologue
    // =========================================================================

    /// `Dd date`
    pub(crate) fn document_date(&mut self, args: &mut LineCursor) -> Token {
        let raw = args.take_rest();
        self.state.meta.date = normalize_date(&raw);
        Token::empty()
    }

    /// `Dt TITLE section [arch]`
    pub(crate) fn document_title(&mut self, args: &mut LineCursor) -> Token {
        let words = args.take_words();
        let mut words = words.into_iter().map(|w| w.text);
        self.state.meta.title = words.next().unwrap_or_default();
        self.state.meta.section = words.next().unwrap_or_default();
        self.state.meta.volume = volume_title(&self.state.meta.section).map(str::to_string);
        Token::empty()
    }

    /// `Os [system]`
    pub(crate) fn operating_system(&mut self, args: &mut LineCursor) -> Token {
        let text = args.take_rest();
        self.state.meta.os = Some(if text.is_empty() {
            self.options.default_os.clone()
        } else {
            text
        });
        Token::empty()
    }

    /// `TH title section [date [source [manual]]]`
    pub(crate) fn man_title(&mut self, args: &mut LineCursor) -> Token {
        let words: Vec<String> = args.take_words().into_iter().map(|w| w.text).collect();
        let meta = &mut self.state.meta;
        meta.title = words.first().cloned().unwrap_or_default();
        meta.section = words.get(1).cloned().unwrap_or_default();
        meta.date = words.get(2).map(|d| normalize_date(d)).unwrap_or_default();
        meta.os = words
            .get(3)
            .cloned()
            .or_else(|| Some(self.options.default_os.clone()));
        meta.volume = words
            .get(4)
            .cloned()
            .or_else(|| volume_title(&meta.section).map(str::to_string));
        Token::empty()
    }

    // =========================================================================
    // Sections
    // =========================================================================

    fn enter_section(&mut self, title: &str, subsection: bool) {
        if !subsection {
            self.state.synopsis = title == "SYNOPSIS";
            self.state.synopsis_entries = 0;
            self.state.authors = 0;
        }
    }

    fn section_html(&self, title: &str, anchor: &str, body: &str, subsection: bool, line: usize) -> String {
        let (class, tag) = if subsection {
            ("subsection", "h3")
        } else {
            ("section", "h2")
        };
        format!(
            "<section class=\"{class}\"><{tag} class=\"{class}-header\" id=\"{}\"{}>{}</{tag}>\n{}</section>",
            anchor_id(anchor),
            self.marker(line),
            title,
            body
        )
    }

    /// `Sh`/`Ss`: the section runs until the next heading of the same or a
    /// higher level.
    pub(crate) fn section(
        &mut self,
        args: &mut LineCursor,
        enders: &Enders,
        subsection: bool,
    ) -> Step<Token> {
        let line = args.line();
        let title = self.parse_inline(args, enders, &[])?;
        let anchor = title.raw.clone();
        let title = title.into_html();
        self.enter_section(&anchor, subsection);
        let own: &[MacroKind] = if subsection {
            &[MacroKind::Sh, MacroKind::Ss]
        } else {
            &[MacroKind::Sh]
        };
        let body = self.parse_block(&enders.with(own))?;
        Ok(Token::html(self.section_html(
            title.trim_end(),
            &anchor,
            &body,
            subsection,
            line,
        )))
    }

    /// `SH`/`SS`. Without arguments the title is the next text line.
    pub(crate) fn man_section(
        &mut self,
        args: &mut LineCursor,
        enders: &Enders,
        subsection: bool,
    ) -> Step<Token> {
        let line = args.line();
        let mut raw = args
            .take_words()
            .into_iter()
            .map(|w| w.text)
            .collect::<Vec<_>>()
            .join(" ");
        if raw.is_empty()
            && self
                .lines
                .peek()
                .is_some_and(|next| parse_request(&next.text).is_none())
        {
            if let Some(next) = self.lines.next_line() {
                raw = next.text.trim().to_string();
            }
        }
        let title = self.tokenizer.render(&raw, line);
        self.enter_section(&raw, subsection);
        let own: &[MacroKind] = if subsection {
            &[MacroKind::ManSh, MacroKind::ManSs]
        } else {
            &[MacroKind::ManSh]
        };
        let body = self.parse_block(&enders.with(own))?;
        Ok(Token::html(
            self.section_html(&title, &raw, &body, subsection, line),
        ))
    }

    // =========================================================================
    // Displays
    // =========================================================================

    /// Parse a block body with fill mode switched off when `no_fill` is set.
    fn block_body(&mut self, enders: &Enders, no_fill: bool) -> Step<String> {
        let saved = self.state.fill;
        if no_fill {
            self.state.fill = false;
        }
        let body = self.parse_block(enders);
        self.state.fill = saved;
        body
    }

    /// Consume the terminator of a block, or report it missing.
    fn close_block(&mut self, end: MacroKind, opener: &str, line: usize) -> Option<SourceLine> {
        let closing = self.end_line(end);
        if closing.is_none() {
            self.warn(ConversionWarning::unterminated_block(opener).at_line(line));
        }
        closing
    }

    /// `Bd -type [-offset width] [-compact]` ... `Ed`
    pub(crate) fn display(&mut self, args: &mut LineCursor, enders: &Enders) -> Step<Token> {
        let line = args.line();
        let words: Vec<String> = args.take_words().into_iter().map(|w| w.text).collect();
        let mut kind = "filled";
        let mut offset = None;
        let mut iter = words.iter();
        while let Some(word) = iter.next() {
            match word.as_str() {
                "-literal" => kind = "literal",
                "-unfilled" => kind = "unfilled",
                "-filled" => kind = "filled",
                "-ragged" => kind = "ragged",
                "-centered" | "-centred" => kind = "centered",
                "-offset" => offset = iter.next().map(|o| offset_width(o)),
                "-file" => {
                    iter.next();
                }
                _ => {}
            }
        }
        let no_fill = matches!(kind, "literal" | "unfilled");
        let body = self.block_body(&enders.with(&[MacroKind::Ed]), no_fill)?;
        self.close_block(MacroKind::Ed, "Bd", line);
        Ok(Token::html(format!(
            "<div class=\"display {}\"{}{}>{}</div>",
            kind,
            offset_style(&offset),
            self.marker(line),
            body.trim_end()
        )))
    }

    /// `D1` and `Dl`: one indented line, `Dl` in a literal font.
    pub(crate) fn one_line_display(
        &mut self,
        kind: MacroKind,
        args: &mut LineCursor,
        enders: &Enders,
    ) -> Step<Token> {
        let line = args.line();
        let inner = self.parse_inline(args, enders, &[])?.into_html();
        let class = if kind == MacroKind::Dl {
            "display literal"
        } else {
            "display"
        };
        Ok(Token::html(format!(
            "<div class=\"{}\" style=\"margin-left:{}\"{}>{}</div>",
            class,
            to_css_width("indent"),
            self.marker(line),
            inner.trim_end()
        )))
    }

    /// `Bf -emphasis|-literal|-symbolic` ... `Ef`
    pub(crate) fn font_block(&mut self, args: &mut LineCursor, enders: &Enders) -> Step<Token> {
        let line = args.line();
        let class = match args.next_word().map(|w| w.text).as_deref() {
            Some("-emphasis" | "Em") => "emphasis",
            Some("-literal" | "Li") => "literal",
            Some("-symbolic" | "Sy") => "symbolic",
            other => {
                let name = format!("Bf {}", other.unwrap_or(""));
                self.warn(ConversionWarning::missing_argument(name.trim_end()).at_line(line));
                "plain"
            }
        };
        args.take_rest();
        let body = self.parse_block(&enders.with(&[MacroKind::Ef]))?;
        self.close_block(MacroKind::Ef, "Bf", line);
        Ok(Token::html(format!(
            "<div class=\"{}\"{}>{}</div>",
            class,
            self.marker(line),
            body.trim_end()
        )))
    }

    /// `Bk -words` ... `Ek`: keep the enclosed words on one line.
    pub(crate) fn keep_block(&mut self, args: &mut LineCursor, enders: &Enders) -> Step<Token> {
        let line = args.line();
        args.take_rest();
        let body = self.parse_block(&enders.with(&[MacroKind::Ek]))?;
        self.close_block(MacroKind::Ek, "Bk", line);
        Ok(Token::html(format!(
            "<span class=\"keep\"{}>{}</span>",
            self.marker(line),
            body.trim_end()
        )))
    }

    // =========================================================================
    // Lists
    // =========================================================================

    /// `Bl -type ...` ... `El`
    ///
    /// Lines are read until this list's `El`. An `It` starts an item; an
    /// ancestor's ender or a section heading closes the list without being
    /// consumed.
    pub(crate) fn list(&mut self, args: &mut LineCursor, enders: &Enders) -> Step<Token> {
        let enders = &enders.with(&[MacroKind::Sh, MacroKind::ManSh]);
        let line = args.line();
        let words: Vec<String> = args.take_words().into_iter().map(|w| w.text).collect();
        let spec = ListSpec::parse(&words);
        let mut out = String::new();
        if let ListKind::Unsupported(name) = &spec.kind {
            let source = format!("Bl {}", name);
            out.push_str(&self.unimplemented(source.trim_end(), line));
            self.warn(ConversionWarning::unsupported_list_type(name).at_line(line));
        }

        let item_enders = enders.with(&[MacroKind::It, MacroKind::El]);
        let mut items = String::new();
        loop {
            let Some(next) = self.lines.peek() else {
                self.warn(ConversionWarning::unterminated_block("Bl").at_line(line));
                break;
            };
            match line_macro(&next.text) {
                Some(MacroKind::El) => {
                    self.lines.next_line();
                    break;
                }
                Some(MacroKind::It) => {
                    let Some(item) = self.lines.next_line() else {
                        break;
                    };
                    let html = self.list_item(&spec, item, &item_enders)?;
                    items.push_str(&html);
                }
                Some(kind) if enders.contains(kind) => {
                    self.warn(ConversionWarning::unterminated_block("Bl").at_line(line));
                    break;
                }
                _ => {
                    let Some(other) = self.lines.next_line() else {
                        break;
                    };
                    let html = self.parse_line(other, &item_enders)?;
                    items.push_str(&html);
                }
            }
        }

        let compact = if spec.compact { " compact" } else { "" };
        let style = offset_style(&spec.offset);
        let m = self.marker(line);
        let _ = match spec.kind {
            ListKind::Tag => write!(out, "<div class=\"tag-list{compact}\"{style}{m}>\n{items}</div>"),
            ListKind::Bullet => write!(out, "<ul class=\"bullet-list{compact}\"{style}{m}>\n{items}</ul>"),
            ListKind::Dash => write!(out, "<ul class=\"dash-list{compact}\"{style}{m}>\n{items}</ul>"),
            ListKind::Enum => write!(out, "<ol class=\"enum-list{compact}\"{style}{m}>\n{items}</ol>"),
            ListKind::Item | ListKind::Unsupported(_) => {
                write!(out, "<ul class=\"item-list{compact}\"{style}{m}>\n{items}</ul>")
            }
            ListKind::Hang | ListKind::Inset | ListKind::Ohang => {
                write!(out, "<div class=\"hang-list{compact}\"{style}{m}>\n{items}</div>")
            }
            ListKind::Diag => write!(out, "<div class=\"diag-list{compact}\"{style}{m}>\n{items}</div>"),
            ListKind::Column => {
                write!(out, "<table class=\"list-table{compact}\"{style}{m}>\n{items}</table>")
            }
        };
        Ok(Token::html(out))
    }

    /// One `It` line and the body lines that follow it.
    fn list_item(&mut self, spec: &ListSpec, item: SourceLine, enders: &Enders) -> Step<String> {
        let line = item.number;
        let args = parse_request(&item.text).map_or(String::new(), |r| r.args.to_string());
        let m = self.marker(line);

        if spec.kind == ListKind::Column {
            let mut cells = self.column_cells(&args, line, enders)?;
            let body = self.parse_block(enders)?;
            let body = body.trim_end();
            if !body.is_empty() {
                match cells.last_mut() {
                    Some(last) => {
                        last.push(' ');
                        last.push_str(body);
                    }
                    None => cells.push(body.to_string()),
                }
            }
            let mut row = format!("<tr{}>", m);
            for (idx, cell) in cells.iter().enumerate() {
                match spec.columns.get(idx) {
                    Some(width) => {
                        let _ = write!(row, "<td style=\"width:{}\">{}</td>", width, cell);
                    }
                    None => {
                        let _ = write!(row, "<td>{}</td>", cell);
                    }
                }
            }
            row.push_str("</tr>\n");
            return Ok(row);
        }

        let mut cursor = LineCursor::new(args, line).parsing_macros(true);
        let head = self.parse_inline(&mut cursor, enders, &[])?.into_html();
        let head = head.trim_end();
        let body = self.parse_block(enders)?;
        let body = body.trim_end();
        let html = match &spec.kind {
            ListKind::Tag => format!(
                "<div class=\"tag-description\"{m}><div class=\"tag\">{head}</div>\
                 <div class=\"description\" style=\"margin-left:{}\">{body}</div></div>\n",
                spec.width
            ),
            ListKind::Hang => format!(
                "<div class=\"hang-item\" style=\"padding-left:{w};text-indent:-{w}\"{m}>\
                 <span class=\"hang-head\">{head}</span> {body}</div>\n",
                w = spec.width
            ),
            ListKind::Inset => format!(
                "<div class=\"hang-item\"{m}><span class=\"hang-head\">{head}</span> {body}</div>\n"
            ),
            ListKind::Ohang => format!(
                "<div class=\"hang-item\"{m}><div class=\"hang-head\">{head}</div>{body}</div>\n"
            ),
            ListKind::Diag => format!(
                "<div class=\"diag-item\"{m}><span class=\"diag-head\">{head}</span> {body}</div>\n"
            ),
            _ => {
                let sep = if head.is_empty() || body.is_empty() { "" } else { " " };
                format!("<li{m}>{head}{sep}{body}</li>\n")
            }
        };
        Ok(html)
    }

    /// Cells of a column list row: split on tabs, then on `Ta`.
    fn column_cells(&mut self, args: &str, line: usize, enders: &Enders) -> Step<Vec<String>> {
        let mut cells = Vec::new();
        for segment in args.split('\t') {
            let mut cursor = LineCursor::new(segment, line).parsing_macros(true);
            loop {
                let cell = self.parse_inline(&mut cursor, enders, &[MacroKind::Ta])?;
                cells.push(cell.into_html().trim_end().to_string());
                if self.peek_macro(&cursor) == Some(MacroKind::Ta) {
                    cursor.next_word();
                } else {
                    break;
                }
            }
        }
        Ok(cells)
    }

    // =========================================================================
    // Function prototypes and references
    // =========================================================================

    /// `Fo name` ... `Fa` lines ... `Fc`
    pub(crate) fn function_block(&mut self, args: &mut LineCursor, enders: &Enders) -> Step<Token> {
        let line = args.line();
        let name = match args.next_word() {
            Some(word) => self.tokenizer.render(&word.text, line),
            None => {
                self.warn(ConversionWarning::missing_argument("Fo").at_line(line));
                String::new()
            }
        };
        args.take_rest();
        let saved = self.state.function.replace(FunctionBlock {
            name,
            args: Vec::new(),
        });
        let body = self.parse_block(&enders.with(&[MacroKind::Fc]));
        let function = std::mem::replace(&mut self.state.function, saved).unwrap_or_default();
        let body = body?;
        let tail = match self.close_block(MacroKind::Fc, "Fo", line) {
            Some(end) => self.line_tail(&end, enders)?,
            None => Token::empty(),
        };
        let mut prototype = self.prototype(&function, line);
        prototype.value.push_str(body.trim_end());
        Ok(Token::join(vec![prototype, tail]))
    }

    /// `Rs` ... `%X` lines ... `Re`
    pub(crate) fn reference_block(&mut self, args: &mut LineCursor, enders: &Enders) -> Step<Token> {
        let line = args.line();
        args.take_rest();
        let saved = self.state.references.replace(RsState {
            line,
            fields: IndexMap::new(),
        });
        let body = self.parse_block(&enders.with(&[MacroKind::Re]));
        let references = std::mem::replace(&mut self.state.references, saved).unwrap_or_default();
        let body = body?;
        self.close_block(MacroKind::Re, "Rs", line);
        let mut html = self.render_reference(&references);
        html.push_str(body.trim_end());
        Ok(Token::html(html))
    }

    /// `%A`, `%T`, ...: stored while inside `Rs`, printed as text elsewhere.
    pub(crate) fn reference_field(&mut self, field: RefField, args: &mut LineCursor) -> Token {
        let line = args.line();
        let text = args.take_rest();
        let rendered = self.tokenizer.render(&text, line);
        match self.state.references.as_mut() {
            Some(references) => {
                references.fields.entry(field).or_default().push(rendered);
                Token::empty()
            }
            None => Token::html(rendered),
        }
    }

    /// Fields in reference order, joined by `, ` and closed with a period.
    pub(crate) fn render_reference(&self, references: &RsState) -> String {
        let mut parts = Vec::new();
        for field in RefField::ORDER {
            let Some(values) = references.fields.get(&field) else {
                continue;
            };
            let part = match field {
                RefField::Author => join_names(values),
                RefField::Title => format!("<span class=\"ref-title\">{}</span>", values.join(" ")),
                RefField::Book => format!("<span class=\"ref-book\">{}</span>", values.join(" ")),
                RefField::Journal => {
                    format!("<span class=\"ref-journal\">{}</span>", values.join(" "))
                }
                RefField::Uri => values
                    .iter()
                    .map(|uri| format!("<a class=\"link-ext\" href=\"{0}\">{0}</a>", uri))
                    .collect::<Vec<_>>()
                    .join(", "),
                _ => values.join(", "),
            };
            parts.push(part);
        }
        if parts.is_empty() {
            return String::new();
        }
        format!(
            "<div class=\"bibliographic\"{}>{}.</div>",
            self.marker(references.line),
            parts.join(", ")
        )
    }

    // =========================================================================
    // man paragraphs
    // =========================================================================

    fn man_indent(&self, word: Option<&str>) -> String {
        to_css_width(word.unwrap_or(DEFAULT_MAN_INDENT))
    }

    /// Interpret the next line as a paragraph tag unless it ends the paragraph.
    fn man_tag_line(&mut self, enders: &Enders) -> Step<Option<String>> {
        if self.lines.peek().is_some_and(|next| enders.ends(next)) {
            return Ok(None);
        }
        match self.lines.next_line() {
            Some(next) => {
                let html = self.parse_line(next, enders)?;
                Ok(Some(html.trim_end().to_string()))
            }
            None => Ok(None),
        }
    }

    fn tagged_item(&self, heads: &[String], body: &str, width: &str, line: usize) -> String {
        format!(
            "<div class=\"tag-description\"{}><div class=\"tag\">{}</div>\
             <div class=\"description\" style=\"margin-left:{}\">{}</div></div>",
            self.marker(line),
            heads.join("<br>"),
            width,
            body.trim_end()
        )
    }

    /// `TP [width]`: the next line is the tag, `TQ` adds further tags.
    pub(crate) fn man_tagged_paragraph(
        &mut self,
        args: &mut LineCursor,
        enders: &Enders,
    ) -> Step<Token> {
        let line = args.line();
        let width = self.man_indent(args.next_word().as_ref().map(|w| w.text.as_str()));
        args.take_rest();
        let para_enders = enders.with(&MAN_PARAGRAPH_ENDERS);
        let mut heads = Vec::new();
        heads.extend(self.man_tag_line(&para_enders)?);
        while self.end_line(MacroKind::ManTq).is_some() {
            heads.extend(self.man_tag_line(&para_enders)?);
        }
        let body = self.parse_block(&para_enders)?;
        Ok(Token::html(self.tagged_item(&heads, &body, &width, line)))
    }

    /// `IP [tag [width]]`
    pub(crate) fn man_indented_paragraph(
        &mut self,
        args: &mut LineCursor,
        enders: &Enders,
    ) -> Step<Token> {
        let line = args.line();
        let words = args.take_words();
        let width = self.man_indent(words.get(1).map(|w| w.text.as_str()));
        let body = self.parse_block(&enders.with(&MAN_PARAGRAPH_ENDERS))?;
        match words.first() {
            Some(tag) => {
                let head = self.tokenizer.render(&tag.text, line);
                Ok(Token::html(self.tagged_item(&[head], &body, &width, line)))
            }
            None => Ok(Token::html(format!(
                "<div class=\"indented\" style=\"margin-left:{}\"{}>{}</div>",
                width,
                self.marker(line),
                body.trim_end()
            ))),
        }
    }

    /// `HP [width]`: hanging paragraph.
    pub(crate) fn man_hanging_paragraph(
        &mut self,
        args: &mut LineCursor,
        enders: &Enders,
    ) -> Step<Token> {
        let line = args.line();
        let width = self.man_indent(args.next_word().as_ref().map(|w| w.text.as_str()));
        args.take_rest();
        let body = self.parse_block(&enders.with(&MAN_PARAGRAPH_ENDERS))?;
        Ok(Token::html(format!(
            "<div class=\"hang-item\" style=\"padding-left:{w};text-indent:-{w}\"{}>{}</div>",
            self.marker(line),
            body.trim_end(),
            w = width
        )))
    }

    /// `RS [width]` ... `RE`. Paragraph macros inside stay inside; any
    /// other ancestor terminator still closes the inset.
    pub(crate) fn man_relative_inset(
        &mut self,
        args: &mut LineCursor,
        enders: &Enders,
    ) -> Step<Token> {
        let line = args.line();
        let width = self.man_indent(args.next_word().as_ref().map(|w| w.text.as_str()));
        args.take_rest();
        let inset_enders = enders.without(&MAN_PARAGRAPH_ENDERS).with(&[
            MacroKind::ManRe,
            MacroKind::ManSh,
            MacroKind::ManSs,
        ]);
        let body = self.parse_block(&inset_enders)?;
        self.close_block(MacroKind::ManRe, "RS", line);
        Ok(Token::html(format!(
            "<div class=\"indent\" style=\"margin-left:{}\"{}>{}</div>",
            width,
            self.marker(line),
            body.trim_end()
        )))
    }

    /// `nf` ... `fi` and `EX` ... `EE`: lines kept as written.
    pub(crate) fn no_fill_block(
        &mut self,
        args: &mut LineCursor,
        enders: &Enders,
        class: &str,
        end: MacroKind,
    ) -> Step<Token> {
        let line = args.line();
        args.take_rest();
        let body = self.block_body(&enders.with(&[end]), true)?;
        self.end_line(end);
        Ok(Token::html(format!(
            "<div class=\"{}\"{}>{}</div>",
            class,
            self.marker(line),
            body.trim_end_matches('\n')
        )))
    }

    /// `UR url` ... `UE` and `MT address` ... `ME`
    pub(crate) fn man_link(
        &mut self,
        args: &mut LineCursor,
        enders: &Enders,
        mail: bool,
    ) -> Step<Token> {
        let line = args.line();
        let target = args.take_rest();
        let end = if mail {
            MacroKind::ManMe
        } else {
            MacroKind::ManUe
        };
        let body = self.parse_block(&enders.with(&[end]))?;
        let tail = match self.close_block(end, if mail { "MT" } else { "UR" }, line) {
            Some(closing) => self.line_tail(&closing, enders)?,
            None => Token::empty(),
        };
        let label = match body.trim() {
            "" => self.tokenizer.render(&target, line),
            text => text.to_string(),
        };
        let (class, href) = if mail {
            ("link-mail", format!("mailto:{}", html_escape(&target)))
        } else {
            ("link-ext", html_escape(&target))
        };
        let link = Token::html(format!(
            "<a class=\"{}\" href=\"{}\"{}>{}</a>",
            class,
            href,
            self.marker(line),
            label
        ));
        Ok(Token::join(vec![link, tail]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_list_spec_tag() {
        let spec = ListSpec::parse(&words("-tag -width indent -compact"));
        assert_eq!(spec.kind, ListKind::Tag);
        assert_eq!(spec.width, "3em");
        assert!(spec.compact);
        assert_eq!(spec.offset, None);
    }

    #[test]
    fn test_list_spec_defaults() {
        let spec = ListSpec::parse(&words("-bullet -offset indent"));
        assert_eq!(spec.kind, ListKind::Bullet);
        assert_eq!(spec.width, "4em");
        assert_eq!(spec.offset.as_deref(), Some("3em"));
    }

    #[test]
    fn test_list_spec_columns() {
        let spec = ListSpec::parse(&words("-column Name Description -offset left"));
        assert_eq!(spec.kind, ListKind::Column);
        assert_eq!(spec.columns, vec!["2em".to_string(), "5.5em".to_string()]);
        assert_eq!(offset_style(&spec.offset), "");
    }

    #[test]
    fn test_list_spec_unknown_type() {
        let spec = ListSpec::parse(&words("-fancy"));
        assert_eq!(spec.kind, ListKind::Unsupported("-fancy".into()));
        let spec = ListSpec::parse(&[]);
        assert_eq!(spec.kind, ListKind::Unsupported(String::new()));
    }
}
