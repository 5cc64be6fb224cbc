//! Utility functions for man/mdoc to HTML conversion
//!
//! This module contains pure helpers that don't depend on converter state.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Roff scaled number: value plus optional unit.
    static ref ROFF_WIDTH: Regex =
        Regex::new(r"^([+-]?(?:\d+\.?\d*|\.\d+))([cipPvmnuM]?)$").expect("valid roff width pattern");
    /// Lengths already written in CSS units.
    static ref CSS_WIDTH: Regex =
        Regex::new(r"^\d+(?:\.\d+)?(?:em|ex|px|%)$").expect("valid css width pattern");
}

// =============================================================================
// HTML Text
// =============================================================================

/// Escape `<`, `>`, `&` and `"` for HTML text and attribute values.
pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    push_escaped(&mut out, text);
    out
}

pub fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

/// Color name or `#rrggbb` usable in a style attribute.
pub fn css_color(name: &str) -> Option<String> {
    let valid = !name.is_empty()
        && name.len() <= 32
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '#');
    valid.then(|| name.to_string())
}

/// Fragment identifier for a section title, e.g. `SEE ALSO` -> `SEE_ALSO`.
pub fn anchor_id(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect()
}

// =============================================================================
// Widths
// =============================================================================

/// Ems per roff scaling unit.
fn unit_factor(unit: &str) -> f64 {
    match unit {
        "c" => 2.36,
        "i" => 6.0,
        "P" => 1.0,
        "p" => 1.0 / 12.0,
        "v" => 1.0,
        "m" => 1.0,
        "u" => 0.025,
        "M" => 0.01,
        // `n` and the default unit
        _ => 0.5,
    }
}

/// Two decimals at most, without trailing zeros.
pub fn format_number(value: f64) -> String {
    let text = format!("{:.2}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text.is_empty() || text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Convert a list or indent width (`-width 6n`, `Ds`, `indent`, a sample
/// string) into a CSS length.
///
/// Scaled numbers use fixed unit ratios; anything else is taken as sample
/// text and measured at half an em per character.
pub fn to_css_width(spec: &str) -> String {
    let spec = spec.trim();
    match spec {
        "Ds" | "indent" => return "3em".to_string(),
        "indent-two" => return "6em".to_string(),
        _ => {}
    }
    if CSS_WIDTH.is_match(spec) {
        return spec.to_string();
    }
    if let Some(caps) = ROFF_WIDTH.captures(spec) {
        let value: f64 = caps[1].parse().unwrap_or(0.0);
        let unit = caps.get(2).map_or("", |m| m.as_str());
        return format!("{}em", format_number(value * unit_factor(unit)));
    }
    let chars = spec.chars().count() as f64;
    format!("{}em", format_number(chars / 2.0))
}

// =============================================================================
// Dates
// =============================================================================

/// Normalise a `Dd`/`TH` date to `Month D, YYYY`.
///
/// Accepts `$Mdocdate: May 5 2020 $`, ISO `2020-05-05` and `May 5 2020`.
/// A bare `$Mdocdate$` has no date; other text is kept as written.
pub fn normalize_date(text: &str) -> String {
    let text = text.trim();
    if let Some(inner) = text
        .strip_prefix("$Mdocdate")
        .and_then(|rest| rest.strip_suffix('$'))
    {
        let inner = inner.trim_start_matches(':').trim();
        return parse_date(inner).unwrap_or_else(|| inner.to_string());
    }
    parse_date(text).unwrap_or_else(|| text.to_string())
}

fn parse_date(text: &str) -> Option<String> {
    ["%Y-%m-%d", "%B %d %Y", "%B %d, %Y", "%b %d %Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .map(|date| date.format("%B %-d, %Y").to_string())
}

// =============================================================================
// Lists of names
// =============================================================================

/// `A`, `A and B`, `A, B, and C`.
pub fn join_names(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [one] => one.clone(),
        [a, b] => format!("{} and {}", a, b),
        [init @ .., last] => format!("{}, and {}", init.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("a<b & \"c\">"), "a&lt;b &amp; &quot;c&quot;&gt;");
    }

    #[test]
    fn test_css_width_units() {
        assert_eq!(to_css_width("6n"), "3em");
        assert_eq!(to_css_width("1i"), "6em");
        assert_eq!(to_css_width("2c"), "4.72em");
        assert_eq!(to_css_width("12p"), "1em");
        assert_eq!(to_css_width("10"), "5em");
        assert_eq!(to_css_width("40u"), "1em");
        assert_eq!(to_css_width("0.5m"), "0.5em");
        assert_eq!(to_css_width("6em"), "6em");
    }

    #[test]
    fn test_css_width_keywords_and_samples() {
        assert_eq!(to_css_width("Ds"), "3em");
        assert_eq!(to_css_width("indent"), "3em");
        assert_eq!(to_css_width("indent-two"), "6em");
        assert_eq!(to_css_width("-verbose"), "4em");
        assert_eq!(to_css_width("Fl"), "1em");
        assert_eq!(to_css_width("abc"), "1.5em");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(0.125), "0.13");
        assert_eq!(format_number(0.0), "0");
    }

    #[test]
    fn test_normalize_date() {
        assert_eq!(normalize_date("$Mdocdate: May 5 2020 $"), "May 5, 2020");
        assert_eq!(normalize_date("2021-11-03"), "November 3, 2021");
        assert_eq!(normalize_date("January 12, 2019"), "January 12, 2019");
        assert_eq!(normalize_date("$Mdocdate$"), "");
        assert_eq!(normalize_date("spring 1999"), "spring 1999");
    }

    #[test]
    fn test_anchor_id() {
        assert_eq!(anchor_id("SEE ALSO"), "SEE_ALSO");
        assert_eq!(anchor_id("a \"b\" <c>"), "a_b_c");
    }

    #[test]
    fn test_join_names() {
        let names = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(join_names(&names(&["A"])), "A");
        assert_eq!(join_names(&names(&["A", "B"])), "A and B");
        assert_eq!(join_names(&names(&["A", "B", "C"])), "A, B, and C");
    }

    #[test]
    fn test_css_color() {
        assert_eq!(css_color("red"), Some("red".into()));
        assert_eq!(css_color("#ff0000"), Some("#ff0000".into()));
        assert_eq!(css_color("red;x:y"), None);
    }
}
