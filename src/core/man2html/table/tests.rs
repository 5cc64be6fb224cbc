//! Regression tests for tbl parsing

use super::parser::*;
use crate::core::man2html::engine::SourceLine;
use crate::core::man2html::{man_to_html_with_options, M2HOptions};

fn lines(text: &str) -> Vec<SourceLine> {
    text.lines()
        .enumerate()
        .map(|(idx, line)| SourceLine::new(idx, line))
        .collect()
}

#[test]
fn test_layout_keys() {
    let rows = parse_layout_line("l r c n.");
    assert_eq!(rows.len(), 1);
    let aligns: Vec<Align> = rows[0].iter().map(|c| c.align).collect();
    assert_eq!(
        aligns,
        vec![Align::Left, Align::Right, Align::Center, Align::Numeric]
    );
}

#[test]
fn test_layout_widths_and_fonts() {
    let rows = parse_layout_line("lw(2i) rb lfI 10");
    let row = &rows[0];
    assert_eq!(row[0].width.as_deref(), Some("12em"));
    assert_eq!(row[1].font, Some("bold"));
    assert_eq!(row[2].font, Some("italic"));
    assert_eq!(row[2].width.as_deref(), Some("5em"));
}

#[test]
fn test_layout_comma_rows() {
    let rows = parse_layout_line("c c, l r.");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][1].align, Align::Right);
}

#[test]
fn test_basic_table() {
    let table = parse_table(&lines("l r.\nA\tB\n1\t2"));
    assert_eq!(table.layout.rows.len(), 1);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0].cells, vec!["A", "B"]);
    assert_eq!(table.rows[1].line, 2);
}

#[test]
fn test_options_tab() {
    let table = parse_table(&lines("tab(:) box;\nl l.\na:b\nc:d"));
    assert_eq!(table.layout.tab, ':');
    assert_eq!(table.rows[1].cells, vec!["c", "d"]);
}

#[test]
fn test_last_layout_line_repeats() {
    let table = parse_table(&lines("c c\nl r.\nH1\tH2\nx\ty\nz\tw"));
    assert_eq!(table.layout.rows.len(), 2);
    assert_eq!(table.layout.row(0)[0].align, Align::Center);
    assert_eq!(table.layout.row(1)[1].align, Align::Right);
    assert_eq!(table.layout.row(7)[1].align, Align::Right);
}

#[test]
fn test_rules_and_requests_skipped() {
    let table = parse_table(&lines("l l.\n_\na\tb\n.sp\n=\nc\td"));
    assert_eq!(table.rows.len(), 2);
}

#[test]
fn test_text_block() {
    let table = parse_table(&lines("l l.\nkey\tT{\nlong\ntext\nT}\nnext\trow"));
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0].cells, vec!["key", "long text"]);
    assert_eq!(table.rows[1].cells, vec!["next", "row"]);
}

#[test]
fn test_empty_table() {
    let table = parse_table(&[]);
    assert!(table.rows.is_empty());
    assert!(table.layout.row(0).is_empty());
}

#[test]
fn test_rendered_table_shape() {
    let input = ".TS\nl r.\nA\tB\n1\t2\n.TE\n";
    let output = man_to_html_with_options(input, M2HOptions::fragment());
    assert_eq!(output.matches("<tr").count(), 2);
    assert_eq!(output.matches("<td").count(), 4);
    assert!(output.contains("<td style=\"text-align:left\">A</td>"));
    assert!(output.contains("<td style=\"text-align:right\">2</td>"));
    assert!(output.contains("<tr x-source=\"2\">"));
}
