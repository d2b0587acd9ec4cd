//! Canonical key-name derivation from raw key events.
//!
//! A raw key-down event carries two identifying fields: `key` (the logical
//! character) and `code` (the physical key). Matching works on a single
//! canonical name derived from both, so an entry registered as `"S"` fires
//! for `key="s"`/`code="KeyS"` regardless of layout quirks.
//!
//! Normalization is case-sensitive; comparisons against registered entries
//! are not.

/// Derive the canonical key name from the raw `key` and `code` fields of a
/// key-down event. `code` may be empty when the event source does not report
/// a physical key, in which case `key` is transformed instead.
pub fn key_name_from_event(key: &str, code: &str) -> String {
    if is_single_ascii_letter(key) {
        return key.to_ascii_uppercase();
    }
    if is_single_ascii_digit(key) {
        return format!("Num{key}");
    }
    second_level(if code.is_empty() { key } else { code })
}

/// Fix historically misspelled author-supplied key names.
///
/// Applied once, at registration time. Matching is untouched, so an entry
/// registered as `"BackQuart"` is stored and matched as `"BackQuote"`.
pub fn fix_key_name_typo(name: &str) -> &str {
    match name {
        "BackQuart" => "BackQuote",
        "SingleQuart" => "SingleQuote",
        _ => name,
    }
}

fn is_single_ascii_letter(s: &str) -> bool {
    matches!(s.as_bytes(), [b] if b.is_ascii_alphabetic())
}

fn is_single_ascii_digit(s: &str) -> bool {
    matches!(s.as_bytes(), [b] if b.is_ascii_digit())
}

fn second_level(name: &str) -> String {
    final_fixup(convert(name))
}

fn convert(name: &str) -> String {
    if let Some(digit) = name.strip_prefix("Digit") {
        if is_single_ascii_digit(digit) {
            return format!("Num{digit}");
        }
    }
    if let Some(digit) = name.strip_prefix("Numpad") {
        if is_single_ascii_digit(digit) {
            return format!("Num{digit}");
        }
    }
    if name.starts_with("Volume") && name.len() > "Volume".len() {
        return format!("Audio{name}");
    }
    if name.starts_with("Arrow") && name.len() > "Arrow".len() {
        return name["Arrow".len()..].to_string();
    }
    // Physical-side modifier keys: ShiftLeft, AltRight, ControlLeft, OSLeft,
    // MetaRight, ... lose their Left/Right suffix.
    if name.starts_with(['S', 'A', 'C', 'O', 'M']) {
        if let Some(base) = name
            .strip_suffix("Left")
            .or_else(|| name.strip_suffix("Right"))
        {
            if base.len() >= 2 {
                return base.to_string();
            }
        }
    }
    // "Blace" is a historical misspelling kept for compatibility with
    // already-registered key names.
    let name = match name.strip_prefix("Bracket") {
        Some(rest) => format!("Blace{rest}"),
        None => name.to_string(),
    };
    let name = match name.strip_prefix("Page") {
        Some(rest) => format!("Pg{rest}"),
        None => name,
    };
    match name.strip_prefix("Numpad") {
        Some(rest) => rest.to_string(),
        None => name,
    }
}

fn final_fixup(name: String) -> String {
    match name.as_str() {
        "Escape" => "ESC".to_string(),
        "Control" => "Ctrl".to_string(),
        "OS" => "Meta".to_string(),
        "Minus" => "Hyphen".to_string(),
        "Quote" => "SingleQuote".to_string(),
        "Decimal" => "Period".to_string(),
        _ => name,
    }
}
