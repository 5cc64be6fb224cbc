//! Source decoding.
//!
//! Manual pages are expected to be UTF-8. A common corruption is a lone
//! Latin-1 `0xB1` for `±`; it is repaired before decoding. Anything still
//! invalid is read as Windows-1252.

use encoding_rs::WINDOWS_1252;

const LATIN1_PLUS_MINUS: u8 = 0xB1;

/// Decode raw page bytes into text.
pub fn decode_source(bytes: &[u8]) -> String {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_string();
    }
    if let Some(text) = repair_plus_minus(bytes) {
        log::debug!("repaired Latin-1 plus-minus sign in source");
        return text;
    }
    let (text, _, _) = WINDOWS_1252.decode(bytes);
    log::debug!("source is not UTF-8, decoded as windows-1252");
    text.into_owned()
}

/// Replace each invalid `0xB1` byte with `±`. Gives up when any other
/// invalid sequence is found.
fn repair_plus_minus(bytes: &[u8]) -> Option<String> {
    let mut out = String::with_capacity(bytes.len() + 4);
    let mut rest = bytes;
    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                return Some(out);
            }
            Err(err) => {
                let (valid, tail) = rest.split_at(err.valid_up_to());
                out.push_str(std::str::from_utf8(valid).ok()?);
                if tail.first() != Some(&LATIN1_PLUS_MINUS) {
                    return None;
                }
                out.push('±');
                rest = &tail[1..];
            }
        }
    }
}

/// Split decoded text into source lines, dropping the final empty line that
/// a trailing newline would produce.
pub fn split_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let mut lines: Vec<String> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect();
    if text.ends_with('\n') {
        lines.pop();
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_passthrough() {
        assert_eq!(decode_source("a ± b".as_bytes()), "a ± b");
    }

    #[test]
    fn test_latin1_plus_minus_repair() {
        let bytes = b"5 \xB1 1";
        assert_eq!(decode_source(bytes), "5 ± 1");
    }

    #[test]
    fn test_windows_1252_fallback() {
        // 0xE9 is é in Windows-1252 and invalid on its own in UTF-8.
        let bytes = b"caf\xE9";
        assert_eq!(decode_source(bytes), "café");
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines("a\nb\n"), vec!["a", "b"]);
        assert_eq!(split_lines("a\r\nb"), vec!["a", "b"]);
        assert_eq!(split_lines(""), Vec::<String>::new());
        assert_eq!(split_lines("\n"), vec![""]);
    }
}
