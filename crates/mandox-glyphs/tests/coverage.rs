use mandox_glyphs::{lookup_escape, ESCAPES, MAX_ESCAPE_KEY_LEN, STANDARDS};

fn is_html_safe(value: &str) -> bool {
    if value.contains('<') || value.contains('>') || value.contains('"') {
        return false;
    }
    // Every ampersand must start an entity.
    value.match_indices('&').all(|(idx, _)| {
        let tail = &value[idx..];
        tail.find(';').map(|end| end > 1).unwrap_or(false)
    })
}

#[test]
fn escape_values_are_html_safe() {
    for (key, value) in ESCAPES.entries() {
        assert!(is_html_safe(value), "escape {:?} maps to unsafe {:?}", key, value);
    }
}

#[test]
fn every_key_resolves_to_itself() {
    for (key, value) in ESCAPES.entries() {
        assert!(key.len() <= MAX_ESCAPE_KEY_LEN, "key {:?} is too long", key);
        assert_eq!(lookup_escape(key), Some((key.len(), *value)), "key {:?}", key);
    }
}

#[test]
fn standards_are_prefixed_with_dash() {
    for key in STANDARDS.keys() {
        assert!(key.starts_with('-'), "{}", key);
    }
}
