//! Literal classification used by type inference, declarations, and typed
//! comparisons. Precedence everywhere is integer → float → string.

/// Whether the trimmed text reparses as an integer and reproduces itself
/// exactly. Leading zeros, signs that vanish on reparse, and trailing junk
/// all fail the round trip.
pub fn is_integer(text: &str) -> bool {
    let t = text.trim();
    match t.parse::<i64>() {
        Ok(v) => v.to_string() == t,
        Err(_) => false,
    }
}

/// Value-based float check: the text must parse as a float and the value's
/// own rendering must reproduce the text, where an integral value may carry
/// a trailing `.0…` tail. Representations that do not survive the round trip
/// (`007`, `1e2`, `.5`) are rejected.
pub fn is_float(text: &str) -> bool {
    let t = text.trim();
    let Ok(v) = t.parse::<f64>() else { return false };
    if !v.is_finite() {
        return false;
    }
    if v.fract() == 0.0 {
        let rendered = format!("{}", v as i64);
        match t.strip_prefix(rendered.as_str()) {
            Some("") => true,
            Some(tail) => {
                tail.len() > 1
                    && tail.starts_with('.')
                    && tail[1..].chars().all(|c| c == '0')
            }
            None => false,
        }
    } else {
        t == format!("{v}")
    }
}

/// Whether the text is wrapped in double quotes.
pub fn is_string_literal(text: &str) -> bool {
    text.starts_with('"') && text.ends_with('"')
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_round_trip() {
        assert!(is_integer("5"));
        assert!(is_integer("0"));
        assert!(is_integer("-42"));
        assert!(is_integer("  7  "));
    }

    #[test]
    fn integer_rejects_non_canonical() {
        assert!(!is_integer("007"));
        assert!(!is_integer("+5"));
        assert!(!is_integer("5.0"));
        assert!(!is_integer("5абв"));
        assert!(!is_integer(""));
    }

    #[test]
    fn float_accepts_canonical() {
        assert!(is_float("3.14"));
        assert!(is_float("-2.5"));
        assert!(is_float("5"));
        assert!(is_float("1.0"));
        assert!(is_float("1.000"));
    }

    #[test]
    fn float_rejects_non_reproducing() {
        assert!(!is_float("007"));
        assert!(!is_float("07.5"));
        assert!(!is_float("1e2"));
        assert!(!is_float(".5"));
        assert!(!is_float("2.50"));
        assert!(!is_float("NaN"));
        assert!(!is_float("inf"));
        assert!(!is_float("дума"));
    }

    #[test]
    fn string_literal_needs_quotes() {
        assert!(is_string_literal("\"здравей\""));
        assert!(is_string_literal("\"\""));
        assert!(!is_string_literal("здравей"));
        assert!(!is_string_literal("\"отворен"));
    }
}
