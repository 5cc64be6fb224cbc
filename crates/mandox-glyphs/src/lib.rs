//! Static glyph tables for the mandox roff engine.
//!
//! Every table is a compile-time `phf` map. Escape values are already
//! HTML-safe and are emitted verbatim by the tokenizer.

use phf::phf_map;

/// Longest key in [`ESCAPES`], in bytes. Lookups try this length first and
/// shrink until a key matches.
pub const MAX_ESCAPE_KEY_LEN: usize = 4;

/// Troff escapes keyed by the text that follows the backslash.
///
/// Keys cover zero-width and spacing escapes, the `\(xx` special character
/// set (punctuation, quotes, math, arrows, accents, Greek) and the
/// predefined mdoc strings (`\*q`, `\*(Px`, ...).
pub static ESCAPES: phf::Map<&'static str, &'static str> = phf_map! {
    // Zero-width and spacing
    "&" => "",
    ")" => "",
    "%" => "",
    ":" => "",
    "|" => "",
    "^" => "",
    "/" => "",
    "," => "",
    "c" => "",
    "p" => "",
    "{" => "",
    "}" => "",
    " " => "&nbsp;",
    "~" => "&nbsp;",
    "0" => "&#8199;",
    "t" => "&#9;",
    // Literal characters
    "e" => "\\",
    "E" => "\\",
    "-" => "-",
    "." => ".",
    "'" => "´",
    "`" => "`",
    // Lines and markers
    "(ba" => "|",
    "(br" => "│",
    "(ul" => "_",
    "(ru" => "_",
    "(rn" => "‾",
    "(bb" => "¦",
    "(sl" => "/",
    "(rs" => "\\",
    "(ci" => "○",
    "(bu" => "•",
    "(dd" => "‡",
    "(dg" => "†",
    "(lz" => "◊",
    "(sq" => "□",
    "(ps" => "¶",
    "(sc" => "§",
    "(lh" => "☜",
    "(rh" => "☞",
    "(at" => "@",
    "(sh" => "#",
    "(CR" => "↵",
    "(OK" => "✓",
    // Legal
    "(co" => "©",
    "(rg" => "®",
    "(tm" => "™",
    // Punctuation
    "(em" => "—",
    "(en" => "–",
    "(hy" => "‐",
    "(r!" => "¡",
    "(r?" => "¿",
    // Quotes
    "(Bq" => "„",
    "(bq" => "‚",
    "(lq" => "“",
    "(rq" => "”",
    "(oq" => "‘",
    "(cq" => "’",
    "(aq" => "'",
    "(dq" => "&quot;",
    "(Fo" => "«",
    "(Fc" => "»",
    "(fo" => "‹",
    "(fc" => "›",
    // Brackets
    "(lB" => "[",
    "(rB" => "]",
    "(lC" => "{",
    "(rC" => "}",
    "(la" => "⟨",
    "(ra" => "⟩",
    "(bv" => "⎪",
    // Math
    "(mi" => "−",
    "(pl" => "+",
    "(-+" => "∓",
    "(+-" => "±",
    "(pc" => "·",
    "(mu" => "×",
    "(di" => "÷",
    "(f/" => "⁄",
    "(**" => "∗",
    "(<=" => "≤",
    "(>=" => "≥",
    "(!=" => "≠",
    "(==" => "≡",
    "(~=" => "≅",
    "(~~" => "≈",
    "(ap" => "∼",
    "(pt" => "∝",
    "(es" => "∅",
    "(mo" => "∈",
    "(nm" => "∉",
    "(sb" => "⊂",
    "(sp" => "⊃",
    "(ca" => "∩",
    "(cu" => "∪",
    "(if" => "∞",
    "(sr" => "√",
    "(is" => "∫",
    "(gr" => "∇",
    "(pd" => "∂",
    "(fa" => "∀",
    "(te" => "∃",
    "(no" => "¬",
    "(AN" => "∧",
    "(OR" => "∨",
    "(12" => "½",
    "(14" => "¼",
    "(34" => "¾",
    "(S1" => "¹",
    "(S2" => "²",
    "(S3" => "³",
    "(Im" => "ℑ",
    "(Re" => "ℜ",
    "(Ah" => "ℵ",
    "(wp" => "℘",
    // Arrows
    "(->" => "→",
    "(<-" => "←",
    "(<>" => "↔",
    "(ua" => "↑",
    "(da" => "↓",
    "(rA" => "⇒",
    "(lA" => "⇐",
    "(hA" => "⇔",
    // Units and currency
    "(de" => "°",
    "(%0" => "‰",
    "(fm" => "′",
    "(sd" => "″",
    "(ct" => "¢",
    "(Do" => "$",
    "(Eu" => "€",
    "(eu" => "€",
    "(Ye" => "¥",
    "(Po" => "£",
    "(Cs" => "¤",
    "(Fn" => "ƒ",
    // Letters and accents
    "(ss" => "ß",
    "(ae" => "æ",
    "(AE" => "Æ",
    "(o/" => "ø",
    "(O/" => "Ø",
    "(oe" => "œ",
    "(OE" => "Œ",
    "(ij" => "ĳ",
    "(IJ" => "Ĳ",
    "(/l" => "ł",
    "(/L" => "Ł",
    "(ga" => "`",
    "(aa" => "´",
    "(a\"" => "˝",
    "(a-" => "¯",
    "(a." => "˙",
    "(a^" => "^",
    "(ha" => "^",
    "(ti" => "~",
    "(ao" => "˚",
    "(ab" => "˘",
    "(ac" => "¸",
    "(ah" => "ˇ",
    "(:a" => "ä",
    "(:o" => "ö",
    "(:u" => "ü",
    "(:A" => "Ä",
    "(:O" => "Ö",
    "(:U" => "Ü",
    "('a" => "á",
    "('e" => "é",
    "('E" => "É",
    "(`a" => "à",
    "(`e" => "è",
    "(^e" => "ê",
    "(,c" => "ç",
    "(,C" => "Ç",
    "(~n" => "ñ",
    "(~N" => "Ñ",
    // Greek
    "(*a" => "α",
    "(*b" => "β",
    "(*g" => "γ",
    "(*d" => "δ",
    "(*e" => "ε",
    "(*z" => "ζ",
    "(*y" => "η",
    "(*h" => "θ",
    "(*i" => "ι",
    "(*k" => "κ",
    "(*l" => "λ",
    "(*m" => "μ",
    "(*n" => "ν",
    "(*c" => "ξ",
    "(*o" => "ο",
    "(*p" => "π",
    "(*r" => "ρ",
    "(*s" => "σ",
    "(ts" => "ς",
    "(*t" => "τ",
    "(*u" => "υ",
    "(*f" => "φ",
    "(*x" => "χ",
    "(*q" => "ψ",
    "(*w" => "ω",
    "(*A" => "Α",
    "(*B" => "Β",
    "(*G" => "Γ",
    "(*D" => "Δ",
    "(*E" => "Ε",
    "(*Z" => "Ζ",
    "(*Y" => "Η",
    "(*H" => "Θ",
    "(*I" => "Ι",
    "(*K" => "Κ",
    "(*L" => "Λ",
    "(*M" => "Μ",
    "(*N" => "Ν",
    "(*C" => "Ξ",
    "(*O" => "Ο",
    "(*P" => "Π",
    "(*R" => "Ρ",
    "(*S" => "Σ",
    "(*T" => "Τ",
    "(*U" => "Υ",
    "(*F" => "Φ",
    "(*X" => "Χ",
    "(*Q" => "Ψ",
    "(*W" => "Ω",
    // Predefined mdoc strings
    "*q" => "&quot;",
    "*R" => "®",
    "*(Ba" => "|",
    "*(Ne" => "≠",
    "*(Ge" => "≥",
    "*(Le" => "≤",
    "*(Gt" => "&gt;",
    "*(Lt" => "&lt;",
    "*(Pm" => "±",
    "*(If" => "∞",
    "*(Pi" => "π",
    "*(Na" => "NaN",
    "*(Am" => "&amp;",
    "*(Rq" => "”",
    "*(Lq" => "“",
    "*(lq" => "“",
    "*(rq" => "”",
    "*(Tm" => "™",
    "*(Px" => "POSIX",
    "*(Ai" => "ANSI",
    "*(ua" => "↑",
    "*(aa" => "´",
    "*(ga" => "`",
};

/// Resolve the escape at the start of `rest` (the text after a backslash).
///
/// Tries every key length from [`MAX_ESCAPE_KEY_LEN`] down to one and
/// returns the byte length consumed together with the HTML output.
pub fn lookup_escape(rest: &str) -> Option<(usize, &'static str)> {
    let longest = MAX_ESCAPE_KEY_LEN.min(rest.len());
    (1..=longest).rev().find_map(|len| {
        let key = rest.get(..len)?;
        ESCAPES.get(key).map(|value| (len, *value))
    })
}

/// Resolve a named glyph as used by `\[name]` and `\C'name'`.
///
/// Two-letter names map onto the `\(xx` entries; a few long names are
/// accepted as groff spells them.
pub fn named_glyph(name: &str) -> Option<&'static str> {
    if name.chars().count() == 2 {
        let key = format!("({}", name);
        if let Some(value) = ESCAPES.get(key.as_str()) {
            return Some(value);
        }
    }
    LONG_GLYPHS.get(name).copied()
}

static LONG_GLYPHS: phf::Map<&'static str, &'static str> = phf_map! {
    "dq" => "&quot;",
    "aq" => "'",
    "ti" => "~",
    "ha" => "^",
    "rs" => "\\",
    "Bq" => "„",
    "bq" => "‚",
    "lq" => "“",
    "rq" => "”",
    "oq" => "‘",
    "cq" => "’",
    "em" => "—",
    "en" => "–",
    "hy" => "‐",
    "bullet" => "•",
    "minus" => "−",
    "lbrace" => "{",
    "rbrace" => "}",
};

/// Predefined string resolution for `\*[name]` and two-letter `\*(xx`.
pub fn predefined_string(name: &str) -> Option<&'static str> {
    let key = if name.chars().count() == 1 {
        format!("*{}", name)
    } else {
        format!("*({}", name)
    };
    ESCAPES.get(key.as_str()).copied()
}

/// Standards referenced by `St`.
pub static STANDARDS: phf::Map<&'static str, &'static str> = phf_map! {
    "-p1003.1-88" => "IEEE Std 1003.1-1988 (“POSIX.1”)",
    "-p1003.1-90" => "IEEE Std 1003.1-1990 (“POSIX.1”)",
    "-p1003.1-96" => "ISO/IEC 9945-1:1996 (“POSIX.1”)",
    "-p1003.1-2001" => "IEEE Std 1003.1-2001 (“POSIX.1”)",
    "-p1003.1-2004" => "IEEE Std 1003.1-2004 (“POSIX.1”)",
    "-p1003.1-2008" => "IEEE Std 1003.1-2008 (“POSIX.1”)",
    "-p1003.1" => "IEEE Std 1003.1 (“POSIX.1”)",
    "-p1003.1b" => "IEEE Std 1003.1b (“POSIX.1b”)",
    "-p1003.1c-95" => "IEEE Std 1003.1c-1995 (“POSIX.1c”)",
    "-p1003.2" => "IEEE Std 1003.2 (“POSIX.2”)",
    "-p1003.2-92" => "IEEE Std 1003.2-1992 (“POSIX.2”)",
    "-ansiC" => "ANSI X3.159-1989 (“ANSI C89”)",
    "-ansiC-89" => "ANSI X3.159-1989 (“ANSI C89”)",
    "-isoC" => "ISO/IEC 9899:1990 (“ISO C90”)",
    "-isoC-90" => "ISO/IEC 9899:1990 (“ISO C90”)",
    "-isoC-99" => "ISO/IEC 9899:1999 (“ISO C99”)",
    "-isoC-2011" => "ISO/IEC 9899:2011 (“ISO C11”)",
    "-xpg3" => "X/Open Portability Guide Issue 3 (“XPG3”)",
    "-xpg4" => "X/Open Portability Guide Issue 4 (“XPG4”)",
    "-xpg4.2" => "X/Open Portability Guide Issue 4, Version 2 (“XPG4.2”)",
    "-susv1" => "Version 1 of the Single UNIX Specification (“SUSv1”)",
    "-susv2" => "Version 2 of the Single UNIX Specification (“SUSv2”)",
    "-susv3" => "Version 3 of the Single UNIX Specification (“SUSv3”)",
    "-susv4" => "Version 4 of the Single UNIX Specification (“SUSv4”)",
    "-svid4" => "System V Interface Definition, Fourth Edition (“SVID4”)",
    "-ieee754" => "IEEE Std 754-1985",
    "-iso8601" => "ISO 8601",
    "-iso8802-3" => "ISO 8802-3: 1989",
};

/// AT&T UNIX versions referenced by `At`.
pub static ATT_VERSIONS: phf::Map<&'static str, &'static str> = phf_map! {
    "v1" => "Version 1 AT&amp;T UNIX",
    "v2" => "Version 2 AT&amp;T UNIX",
    "v3" => "Version 3 AT&amp;T UNIX",
    "v4" => "Version 4 AT&amp;T UNIX",
    "v5" => "Version 5 AT&amp;T UNIX",
    "v6" => "Version 6 AT&amp;T UNIX",
    "v7" => "Version 7 AT&amp;T UNIX",
    "32v" => "Version 32V AT&amp;T UNIX",
    "III" => "AT&amp;T System III UNIX",
    "V" => "AT&amp;T System V UNIX",
    "V.1" => "AT&amp;T System V Release 1 UNIX",
    "V.2" => "AT&amp;T System V Release 2 UNIX",
    "V.3" => "AT&amp;T System V Release 3 UNIX",
    "V.4" => "AT&amp;T System V Release 4 UNIX",
};

/// Volume titles printed in the page header, keyed by manual section.
pub static VOLUMES: phf::Map<&'static str, &'static str> = phf_map! {
    "1" => "General Commands Manual",
    "2" => "System Calls Manual",
    "3" => "Library Functions Manual",
    "3p" => "Perl Library Functions Manual",
    "4" => "Device Drivers Manual",
    "5" => "File Formats Manual",
    "6" => "Games Manual",
    "7" => "Miscellaneous Information Manual",
    "8" => "System Manager's Manual",
    "9" => "Kernel Developer's Manual",
};

/// Volume title for a section, looking at the leading digit when the full
/// section (e.g. `3ssl`) is not listed.
pub fn volume_title(section: &str) -> Option<&'static str> {
    VOLUMES.get(section).copied().or_else(|| {
        let digit = section.get(..1)?;
        VOLUMES.get(digit).copied()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_match_wins() {
        assert_eq!(lookup_escape("*(Px rest"), Some((4, "POSIX")));
        assert_eq!(lookup_escape("*qx"), Some((2, "&quot;")));
        assert_eq!(lookup_escape("(co"), Some((3, "©")));
        assert_eq!(lookup_escape("e(co"), Some((1, "\\")));
    }

    #[test]
    fn test_unknown_escape() {
        assert_eq!(lookup_escape("(zz"), None);
        assert_eq!(lookup_escape(""), None);
    }

    #[test]
    fn test_non_ascii_remainder() {
        // Slicing must respect char boundaries.
        assert_eq!(lookup_escape("&é"), Some((1, "")));
        assert_eq!(lookup_escape("é"), None);
    }

    #[test]
    fn test_named_glyphs() {
        assert_eq!(named_glyph("em"), Some("—"));
        assert_eq!(named_glyph("bullet"), Some("•"));
        assert_eq!(named_glyph("nothing"), None);
        assert_eq!(predefined_string("Px"), Some("POSIX"));
        assert_eq!(predefined_string("q"), Some("&quot;"));
    }

    #[test]
    fn test_volume_title() {
        assert_eq!(volume_title("1"), Some("General Commands Manual"));
        assert_eq!(volume_title("3ssl"), Some("Library Functions Manual"));
        assert_eq!(volume_title("x"), None);
    }
}
