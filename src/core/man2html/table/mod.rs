//! `tbl` support
//!
//! A `.TS` block is read as raw lines up to `.TE`, parsed into a layout and
//! data rows, and rendered as an HTML table. Only column justification,
//! widths and the `b`/`i` font modifiers are honored.

mod parser;

use parser::{parse_table, Table};

use std::fmt::Write;

use super::context::ManConverter;
use super::engine::{LineCursor, Step, Token};
use super::macros::{line_macro, MacroKind};
use super::ConversionWarning;

impl ManConverter<'_> {
    /// `TS` ... `TE`
    pub(crate) fn table(&mut self, args: &mut LineCursor) -> Step<Token> {
        let start = args.line();
        args.take_rest();
        let mut lines = Vec::new();
        let mut closed = false;
        while let Some(line) = self.lines.next_line() {
            if line_macro(&line.text) == Some(MacroKind::TableEnd) {
                closed = true;
                break;
            }
            lines.push(line);
        }
        if !closed {
            self.warn(ConversionWarning::unterminated_block("TS").at_line(start));
        }
        let table = parse_table(&lines);
        log::trace!(
            "table at line {}: {} layout rows, {} data rows",
            start,
            table.layout.rows.len(),
            table.rows.len()
        );
        Ok(Token::html(self.render_table(&table, start)))
    }

    fn render_table(&mut self, table: &Table, line: usize) -> String {
        let mut out = format!("<table class=\"tbl\"{}>\n", self.marker(line));
        for (idx, row) in table.rows.iter().enumerate() {
            let specs = table.layout.row(idx);
            let _ = write!(out, "<tr{}>", self.marker(row.line));
            for (col, cell) in row.cells.iter().enumerate() {
                let spec = specs.get(col).cloned().unwrap_or_default();
                let mut style = format!("text-align:{}", spec.align.css());
                if let Some(width) = &spec.width {
                    let _ = write!(style, ";width:{}", width);
                }
                let mut text = self.tokenizer.render(cell.trim(), row.line);
                if let Some(class) = spec.font {
                    text = format!("<span class=\"{}\">{}</span>", class, text);
                }
                let _ = write!(out, "<td style=\"{}\">{}</td>", style, text);
            }
            out.push_str("</tr>\n");
        }
        out.push_str("</table>");
        out
    }
}

#[cfg(test)]
mod tests;
