//! Roff request primitives.
//!
//! This module handles the low-level syntax shared by the preprocessor and
//! the tokenizer:
//! - escape extent and escape names (`\*x`, `\*(xx`, `\*[name]`)
//! - comment detection and truncation
//! - request lines (`.name args`) and macro argument splitting
//! - `\$N` placeholder substitution and copy mode
//! - conditions of `.if`/`.ie` and `\{ ... \}` brace blocks

use fxhash::FxHashMap;

/// Maximum nesting of defined strings resolved inside one line.
pub const MAX_INTERPOLATION_DEPTH: usize = 8;

/// A control line split into request name and argument text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request<'a> {
    pub name: &'a str,
    pub args: &'a str,
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Whether `text` starts with a control character.
pub fn is_control_line(text: &str) -> bool {
    text.starts_with('.') || text.starts_with('\'')
}

/// Split a control line into request name and arguments.
pub fn parse_request(text: &str) -> Option<Request<'_>> {
    let rest = text
        .strip_prefix('.')
        .or_else(|| text.strip_prefix('\''))?;
    let rest = rest.trim_start_matches(is_blank);
    let end = rest.find(is_blank).unwrap_or(rest.len());
    Some(Request {
        name: &rest[..end],
        args: rest[end..].trim_start_matches(is_blank),
    })
}

/// `.\"` and `'\"` lines, including the `.\#` groff form.
pub fn is_comment_line(text: &str) -> bool {
    let Some(rest) = text.strip_prefix('.').or_else(|| text.strip_prefix('\'')) else {
        return false;
    };
    let rest = rest.trim_start_matches(is_blank);
    rest.starts_with("\\\"") || rest.starts_with("\\#")
}

/// Byte offset of a trailing `\"` or `\#` comment.
pub fn comment_start(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            match bytes.get(i + 1) {
                Some(b'"') | Some(b'#') => return Some(i),
                Some(_) => i += 2,
                None => i += 1,
            }
        } else {
            i += 1;
        }
    }
    None
}

/// Parse the name of a `\*`, `\n`, `\f` style escape, given the text after
/// the selector. Returns the name and the bytes consumed.
pub fn parse_escape_name(s: &str) -> Option<(String, usize)> {
    let first = s.chars().next()?;
    match first {
        '(' => {
            let name: String = s[1..].chars().take(2).collect();
            if name.chars().count() < 2 {
                return None;
            }
            Some((name.clone(), 1 + name.len()))
        }
        '[' => {
            let close = s.find(']')?;
            Some((s[1..close].to_string(), close + 1))
        }
        c => Some((c.to_string(), c.len_utf8())),
    }
}

/// Parse a delimited argument such as `'1i'` in `\h'1i'`. Returns the inner
/// text and the bytes consumed including both delimiters.
pub fn parse_delimited(s: &str) -> Option<(String, usize)> {
    let delim = s.chars().next()?;
    if delim.is_whitespace() || delim == '\\' {
        return None;
    }
    let body = &s[delim.len_utf8()..];
    let close = body.find(delim)?;
    Some((
        body[..close].to_string(),
        delim.len_utf8() + close + delim.len_utf8(),
    ))
}

/// Extent of a `\s` size argument after the selector.
pub fn size_len(s: &str) -> usize {
    let sign = usize::from(s.starts_with('+') || s.starts_with('-'));
    let rest = &s[sign..];
    let body = match rest.chars().next() {
        Some('(') => 1 + rest[1..].chars().take(2).map(char::len_utf8).sum::<usize>(),
        Some('[') => rest.find(']').map_or(rest.len(), |i| i + 1),
        Some('\'') => parse_delimited(rest).map_or(0, |(_, n)| n),
        Some(c) if c.is_ascii_digit() => {
            let two = matches!(c, '1'..='3')
                && rest[1..].chars().next().is_some_and(|d| d.is_ascii_digit());
            if two {
                2
            } else {
                1
            }
        }
        _ => 0,
    };
    sign + body
}

/// Bytes taken by the escape whose selector starts `after` (the text after
/// the backslash). Used to keep escapes whole while splitting words.
pub fn escape_len(after: &str) -> usize {
    let Some(sel) = after.chars().next() else {
        return 0;
    };
    let sel_len = sel.len_utf8();
    let rest = &after[sel_len..];
    match sel {
        '[' => rest.find(']').map_or(after.len(), |i| sel_len + i + 1),
        '(' => sel_len + rest.chars().take(2).map(char::len_utf8).sum::<usize>(),
        '*' | 'f' | 'F' | 'm' | 'M' | 'g' | 'k' | 'V' | 'Y' | '$' => {
            sel_len + parse_escape_name(rest).map_or(0, |(_, n)| n)
        }
        'n' => {
            let sign = usize::from(rest.starts_with('+') || rest.starts_with('-'));
            sel_len + sign + parse_escape_name(&rest[sign..]).map_or(0, |(_, n)| n)
        }
        's' => sel_len + size_len(rest),
        'h' | 'v' | 'w' | 'l' | 'L' | 'N' | 'C' | 'D' | 'b' | 'H' | 'o' | 'S' | 'x' | 'X'
        | 'A' | 'B' | 'R' | 'Z' => sel_len + parse_delimited(rest).map_or(0, |(_, n)| n),
        _ => sel_len,
    }
}

/// Split macro arguments: blank separated, `"` quoting, `""` for a literal
/// quote inside a quoted argument.
pub fn split_macro_args(text: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut chars = text.chars().peekable();
    loop {
        while chars.peek().is_some_and(|c| is_blank(*c)) {
            chars.next();
        }
        let Some(&first) = chars.peek() else {
            break;
        };
        let mut arg = String::new();
        if first == '"' {
            chars.next();
            while let Some(c) = chars.next() {
                if c == '"' {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        arg.push('"');
                        continue;
                    }
                    break;
                }
                arg.push(c);
                if c == '\\' {
                    if let Some(next) = chars.next() {
                        arg.push(next);
                    }
                }
            }
        } else {
            while let Some(&c) = chars.peek() {
                if is_blank(c) {
                    break;
                }
                chars.next();
                arg.push(c);
                if c == '\\' {
                    if let Some(next) = chars.next() {
                        arg.push(next);
                    }
                }
            }
        }
        args.push(arg);
    }
    args
}

/// Copy mode as applied to `.de` bodies: `\\` becomes `\`.
pub fn copy_mode(line: &str) -> String {
    line.replace("\\\\", "\\")
}

/// Replace `\$1`..`\$9`, `\$(nn`, `\$[n]`, `\$*` and `\$@` with macro
/// arguments. Missing arguments become empty.
pub fn substitute_args(line: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(idx) = rest.find('\\') {
        out.push_str(&rest[..idx]);
        let after = &rest[idx + 1..];
        if let Some(tail) = after.strip_prefix('\\') {
            out.push_str("\\\\");
            rest = tail;
            continue;
        }
        let Some(spec) = after.strip_prefix('$') else {
            out.push('\\');
            rest = after;
            continue;
        };
        match spec.chars().next() {
            Some('*') => {
                out.push_str(&args.join(" "));
                rest = &spec[1..];
            }
            Some('@') => {
                let quoted: Vec<String> = args.iter().map(|a| format!("\"{}\"", a)).collect();
                out.push_str(&quoted.join(" "));
                rest = &spec[1..];
            }
            Some(c) if c.is_ascii_digit() => {
                push_arg(&mut out, args, c.to_digit(10).unwrap_or(0) as usize);
                rest = &spec[1..];
            }
            Some('(') | Some('[') => match parse_escape_name(spec) {
                Some((name, used)) => {
                    push_arg(&mut out, args, name.parse().unwrap_or(0));
                    rest = &spec[used..];
                }
                None => {
                    out.push_str("\\$");
                    rest = spec;
                }
            },
            _ => {
                out.push_str("\\$");
                rest = spec;
            }
        }
    }
    out.push_str(rest);
    out
}

fn push_arg(out: &mut String, args: &[String], index: usize) {
    if index > 0 {
        if let Some(arg) = args.get(index - 1) {
            out.push_str(arg);
        }
    }
}

/// Textual `\*x`, `\*(xx`, `\*[name]` substitution of defined strings.
/// Unknown names are left for the tokenizer.
pub fn interpolate_strings(text: &str, strings: &FxHashMap<String, String>) -> String {
    if strings.is_empty() || !text.contains("\\*") {
        return text.to_string();
    }
    let mut current = text.to_string();
    for _ in 0..MAX_INTERPOLATION_DEPTH {
        let (next, changed) = interpolate_once(&current, strings);
        current = next;
        if !changed || !current.contains("\\*") {
            break;
        }
    }
    current
}

fn interpolate_once(text: &str, strings: &FxHashMap<String, String>) -> (String, bool) {
    let mut out = String::with_capacity(text.len());
    let mut changed = false;
    let mut rest = text;
    while let Some(idx) = rest.find('\\') {
        out.push_str(&rest[..idx]);
        let after = &rest[idx + 1..];
        if let Some(tail) = after.strip_prefix('\\') {
            out.push_str("\\\\");
            rest = tail;
            continue;
        }
        if let Some(name_src) = after.strip_prefix('*') {
            if let Some((name, used)) = parse_escape_name(name_src) {
                if let Some(value) = strings.get(&name) {
                    out.push_str(value);
                    rest = &name_src[used..];
                    changed = true;
                    continue;
                }
            }
        }
        out.push('\\');
        rest = after;
    }
    out.push_str(rest);
    (out, changed)
}

/// Evaluate the condition at the start of an `.if`/`.ie` argument string.
/// Returns the outcome and the remaining body text.
///
/// `n` is false (not a terminal), `t` is true, `o`/`e` (page parity) are
/// always false, `\nX=value` compares the register as a string, and every
/// other form is false.
pub fn parse_condition<'a>(text: &'a str, numbers: &FxHashMap<String, String>) -> (bool, &'a str) {
    let text = text.trim_start_matches(is_blank);
    let (negate, text) = match text.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (value, used) = evaluate(text, numbers);
    let body = text[used..].trim_start_matches(is_blank);
    (value != negate, body)
}

fn evaluate(text: &str, numbers: &FxHashMap<String, String>) -> (bool, usize) {
    let ends_word = |idx: usize| {
        text[idx..]
            .chars()
            .next()
            .map_or(true, |c| is_blank(c) || c == '\\')
    };
    match text.chars().next() {
        Some('n') if ends_word(1) => (false, 1),
        Some('t') if ends_word(1) => (true, 1),
        Some('o') | Some('e') if ends_word(1) => (false, 1),
        Some('\\') if text[1..].starts_with('n') => register_condition(text, numbers),
        Some('\'') => {
            let mut used = 1;
            for _ in 0..2 {
                match text[used..].find('\'') {
                    Some(i) => used += i + 1,
                    None => return (false, text.len()),
                }
            }
            (false, used)
        }
        _ => (false, text.find(is_blank).unwrap_or(text.len())),
    }
}

fn register_condition(text: &str, numbers: &FxHashMap<String, String>) -> (bool, usize) {
    let word_end = text.find(is_blank).unwrap_or(text.len());
    let Some((name, used)) = parse_escape_name(&text[2..]) else {
        return (false, word_end);
    };
    let value = numbers.get(&name).map(String::as_str).unwrap_or("0");
    let after = 2 + used;
    let op_rest = &text[after..word_end.max(after)];
    let expected = op_rest
        .strip_prefix("==")
        .or_else(|| op_rest.strip_prefix('='));
    let result = match expected {
        Some(expected) => value == expected,
        None if op_rest.is_empty() => !value.is_empty() && value != "0",
        None => false,
    };
    (result, word_end.max(after))
}

/// Scan `text` for `\{`/`\}` starting at brace `depth`. Returns the new
/// depth and, when the depth reaches zero, the byte offset of the closing
/// `\}`.
pub fn scan_braces(text: &str, mut depth: usize) -> (usize, Option<usize>) {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'\\' {
            match bytes[i + 1] {
                b'{' => depth += 1,
                b'}' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return (0, Some(i));
                    }
                }
                _ => {}
            }
            i += 2;
        } else {
            i += 1;
        }
    }
    (depth, None)
}

/// Remove a trailing lone `\` (line continuation).
pub fn trim_continuation(text: &str) -> &str {
    let trailing = text.len() - text.trim_end_matches('\\').len();
    if trailing % 2 == 1 {
        &text[..text.len() - 1]
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(pairs: &[(&str, &str)]) -> FxHashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_request() {
        let req = parse_request(".  Bl -tag  -width Ds").unwrap();
        assert_eq!(req.name, "Bl");
        assert_eq!(req.args, "-tag  -width Ds");
        let req = parse_request("'br").unwrap();
        assert_eq!(req.name, "br");
        assert_eq!(req.args, "");
        assert!(parse_request("text").is_none());
    }

    #[test]
    fn test_comments() {
        assert!(is_comment_line(".\\\" a comment"));
        assert!(is_comment_line("'\\\" tbl"));
        assert!(!is_comment_line(".Nm"));
        assert_eq!(comment_start("text \\\" note"), Some(5));
        assert_eq!(comment_start("a \\\\\" b"), None);
        assert_eq!(comment_start("plain"), None);
    }

    #[test]
    fn test_escape_names() {
        assert_eq!(parse_escape_name("x rest"), Some(("x".into(), 1)));
        assert_eq!(parse_escape_name("(Px"), Some(("Px".into(), 3)));
        assert_eq!(parse_escape_name("[long]x"), Some(("long".into(), 6)));
        assert_eq!(parse_escape_name("[open"), None);
    }

    #[test]
    fn test_escape_len() {
        assert_eq!(escape_len("fBx"), 2);
        assert_eq!(escape_len("f(CWx"), 4);
        assert_eq!(escape_len("(co x"), 3);
        assert_eq!(escape_len("[u00E9] x"), 7);
        assert_eq!(escape_len("h'1 i'x"), 6);
        assert_eq!(escape_len("s-2x"), 3);
        assert_eq!(escape_len("s12x"), 3);
        assert_eq!(escape_len("-x"), 1);
    }

    #[test]
    fn test_split_macro_args() {
        assert_eq!(
            split_macro_args(r#"one "two words" "say ""hi""" \ x"#),
            vec!["one", "two words", "say \"hi\"", "\\ x"]
        );
        assert!(split_macro_args("   ").is_empty());
    }

    #[test]
    fn test_substitute_args() {
        let args = vec!["a".to_string(), "b c".to_string()];
        assert_eq!(substitute_args(".B \\$1 \\$2 \\$3", &args), ".B a b c ");
        assert_eq!(substitute_args("\\$*", &args), "a b c");
        assert_eq!(substitute_args("\\$@", &args), "\"a\" \"b c\"");
        assert_eq!(substitute_args("\\\\$1", &args), "\\\\$1");
        assert_eq!(substitute_args("\\fB\\$1", &args), "\\fBa");
    }

    #[test]
    fn test_copy_mode() {
        assert_eq!(copy_mode(".B \\\\$1"), ".B \\$1");
    }

    #[test]
    fn test_interpolate_strings() {
        let strings = numbers(&[("x", "ex"), ("Lo", "long \\*x"), ("name", "N")]);
        assert_eq!(interpolate_strings("a\\*x b", &strings), "aex b");
        assert_eq!(interpolate_strings("\\*(Lo", &strings), "long ex");
        assert_eq!(interpolate_strings("\\*[name]!", &strings), "N!");
        assert_eq!(interpolate_strings("\\*q \\\\*x", &strings), "\\*q \\\\*x");
    }

    #[test]
    fn test_conditions() {
        let regs = numbers(&[("X", "1"), ("(.g", "")]);
        assert_eq!(parse_condition("n .B x", &regs), (false, ".B x"));
        assert_eq!(parse_condition("t .B x", &regs), (true, ".B x"));
        assert_eq!(parse_condition("!n text", &regs), (true, "text"));
        assert_eq!(parse_condition("o \\{", &regs), (false, "\\{"));
        assert_eq!(parse_condition("\\nX=1 yes", &regs), (true, "yes"));
        assert_eq!(parse_condition("\\nX=2 no", &regs), (false, "no"));
        assert_eq!(parse_condition("\\nX body", &regs), (true, "body"));
        assert_eq!(parse_condition("'a'a' body", &regs), (false, "body"));
        assert_eq!(parse_condition("(1) body", &regs), (false, "body"));
    }

    #[test]
    fn test_scan_braces() {
        assert_eq!(scan_braces("a \\} b", 1), (0, Some(2)));
        assert_eq!(scan_braces("\\{ x \\}", 1), (1, None));
        assert_eq!(scan_braces("\\{ x \\} \\}", 1), (0, Some(8)));
        assert_eq!(scan_braces("\\\\}", 1), (1, None));
    }

    #[test]
    fn test_trim_continuation() {
        assert_eq!(trim_continuation("abc\\"), "abc");
        assert_eq!(trim_continuation("abc\\\\"), "abc\\\\");
        assert_eq!(trim_continuation("abc"), "abc");
    }
}
