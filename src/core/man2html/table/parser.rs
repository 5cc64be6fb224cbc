//! `tbl` block parsing: options, layout lines and data rows.

use super::super::engine::primitives::is_control_line;
use super::super::engine::SourceLine;
use super::super::utils::to_css_width;

/// Column justification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Right,
    Center,
    /// Numeric columns are right aligned
    Numeric,
}

impl Align {
    pub fn css(self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Right | Align::Numeric => "right",
            Align::Center => "center",
        }
    }
}

/// One column of a layout line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSpec {
    pub align: Align,
    /// CSS width from `w(N)` or a bare number
    pub width: Option<String>,
    /// Font class from `b`, `i`, `fB`, `fI`
    pub font: Option<&'static str>,
}

/// Options and layout lines of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    pub tab: char,
    pub rows: Vec<Vec<ColumnSpec>>,
}

impl Default for TableLayout {
    fn default() -> Self {
        TableLayout {
            tab: '\t',
            rows: Vec::new(),
        }
    }
}

impl TableLayout {
    /// Layout for data row `index`; the last layout line repeats.
    pub fn row(&self, index: usize) -> &[ColumnSpec] {
        match self.rows.len() {
            0 => &[],
            n => &self.rows[index.min(n - 1)],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub line: usize,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub layout: TableLayout,
    pub rows: Vec<TableRow>,
}

/// `tab(x)` from an options line, if any.
fn parse_options(line: &str) -> Option<char> {
    let start = line.find("tab(")? + 4;
    line[start..].chars().next().filter(|c| *c != ')')
}

fn parse_width(text: &str) -> String {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    to_css_width(&compact)
}

/// Parse one layout line into rows of column specs. Commas separate
/// rows written on the same line.
pub fn parse_layout_line(line: &str) -> Vec<Vec<ColumnSpec>> {
    let line = line.trim().trim_end_matches('.');
    let mut rows = Vec::new();
    for part in line.split(',') {
        let mut columns: Vec<ColumnSpec> = Vec::new();
        let mut chars = part.chars().peekable();
        while let Some(c) = chars.next() {
            let align = match c {
                'l' | 'L' | 'a' | 'A' | 's' | 'S' | '^' => Some(Align::Left),
                'r' | 'R' => Some(Align::Right),
                'c' | 'C' => Some(Align::Center),
                'n' | 'N' => Some(Align::Numeric),
                _ => None,
            };
            if let Some(align) = align {
                columns.push(ColumnSpec {
                    align,
                    ..ColumnSpec::default()
                });
                continue;
            }
            let Some(column) = columns.last_mut() else {
                continue;
            };
            match c {
                'b' | 'B' => column.font = Some("bold"),
                'i' | 'I' => column.font = Some("italic"),
                'f' | 'F' => match chars.next() {
                    Some('B') => column.font = Some("bold"),
                    Some('I') => column.font = Some("italic"),
                    _ => {}
                },
                'w' | 'W' => {
                    let mut width = String::new();
                    if chars.peek() == Some(&'(') {
                        chars.next();
                        for c in chars.by_ref() {
                            if c == ')' {
                                break;
                            }
                            width.push(c);
                        }
                    } else {
                        while let Some(c) = chars.next_if(|c| c.is_ascii_digit() || *c == '.') {
                            width.push(c);
                        }
                        if let Some(unit) = chars.next_if(|c| "cipPvmnuM".contains(*c)) {
                            width.push(unit);
                        }
                    }
                    if !width.is_empty() {
                        column.width = Some(parse_width(&width));
                    }
                }
                d if d.is_ascii_digit() => {
                    let mut width = d.to_string();
                    while let Some(c) = chars.next_if(|c| c.is_ascii_digit()) {
                        width.push(c);
                    }
                    column.width = Some(parse_width(&width));
                }
                _ => {}
            }
        }
        if !columns.is_empty() {
            rows.push(columns);
        }
    }
    rows
}

fn is_rule_row(text: &str) -> bool {
    matches!(text.trim(), "_" | "=" | "-")
}

/// Parse the lines between `.TS` and `.TE`.
pub fn parse_table(lines: &[SourceLine]) -> Table {
    let mut table = Table::default();
    let mut iter = lines.iter().peekable();

    if let Some(first) = iter.peek() {
        if first.text.trim_end().ends_with(';') {
            if let Some(tab) = parse_options(&first.text) {
                table.layout.tab = tab;
            }
            iter.next();
        }
    }

    for line in iter.by_ref() {
        table.layout.rows.extend(parse_layout_line(&line.text));
        if line.text.trim_end().ends_with('.') {
            break;
        }
    }

    let tab = table.layout.tab;
    let mut pending: Option<TableRow> = None;
    let mut block: Option<String> = None;
    for line in iter {
        if let Some(text) = block.as_mut() {
            // Inside a T{ ... T} text block
            if let Some(rest) = line.text.strip_prefix("T}") {
                let cell = std::mem::take(text);
                block = None;
                if let Some(row) = pending.as_mut() {
                    row.cells.push(cell);
                    let rest = rest.strip_prefix(tab).unwrap_or(rest);
                    if !rest.is_empty() {
                        push_cells(row, rest, tab, &mut block);
                    }
                }
                if block.is_none() {
                    table.rows.extend(pending.take());
                }
            } else {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(line.text.trim());
            }
            continue;
        }
        if is_control_line(&line.text) || is_rule_row(&line.text) {
            continue;
        }
        let mut row = TableRow {
            line: line.number,
            cells: Vec::new(),
        };
        push_cells(&mut row, &line.text, tab, &mut block);
        if block.is_some() {
            pending = Some(row);
        } else {
            table.rows.push(row);
        }
    }
    if let Some(mut row) = pending {
        row.cells.extend(block);
        table.rows.push(row);
    }
    table
}

/// Split `text` on `tab`; a trailing `T{` opens a text block.
fn push_cells(row: &mut TableRow, text: &str, tab: char, block: &mut Option<String>) {
    let cells: Vec<&str> = text.split(tab).collect();
    let last = cells.len().saturating_sub(1);
    for (idx, cell) in cells.into_iter().enumerate() {
        if idx == last && cell.trim_end() == "T{" {
            *block = Some(String::new());
            return;
        }
        row.cells.push(cell.to_string());
    }
}
