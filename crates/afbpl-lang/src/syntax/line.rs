//! Line-level classification. The language has no token grammar to speak of:
//! every instruction is recognized by the keyword its trimmed line starts
//! with, and unrecognized indented lines are deliberately inert.

pub const KW_START: &str = "начало";
pub const KW_END: &str = "край";
pub const KW_OUTPUT: &str = "изход";
pub const KW_INPUT: &str = "вход";
pub const KW_IF: &str = "ако";
pub const KW_ELSE: &str = "иначе";
pub const KW_LET: &str = "нека";
pub const KW_GOTO: &str = "иди";
/// The single comparison operator, also accepted in declarations next to `=`.
pub const KW_EQ: &str = "е";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    Start,
    End,
    Output,
    Input,
    Conditional,
    Else,
    Declaration,
    Goto,
    /// A base-indent line matching no keyword: a jump-target declaration.
    Label,
    /// An indented line matching no keyword. Silently skipped.
    Inert,
}

/// Classify a raw instruction line, in keyword priority order.
/// `base_indent` is the indentation of the start marker.
pub fn classify(raw: &str, base_indent: usize) -> LineKind {
    let t = raw.trim();
    if t.is_empty() {
        return LineKind::Blank;
    }
    if t == KW_START {
        return LineKind::Start;
    }
    if t == KW_END {
        return LineKind::End;
    }
    if t.starts_with(KW_OUTPUT) {
        return LineKind::Output;
    }
    if t.starts_with(KW_INPUT) {
        return LineKind::Input;
    }
    if t.starts_with(KW_IF) {
        return LineKind::Conditional;
    }
    if t.starts_with(KW_ELSE) {
        return LineKind::Else;
    }
    if t.starts_with(KW_LET) {
        return LineKind::Declaration;
    }
    if t.starts_with(KW_GOTO) {
        return LineKind::Goto;
    }
    if indent_of(raw) == base_indent { LineKind::Label } else { LineKind::Inert }
}

/// Leading-space count of a non-blank line.
/// Panics on all-blank input — callers classify first.
pub fn indent_of(raw: &str) -> usize {
    match raw.find(|c: char| c != ' ') {
        Some(i) => i,
        None => panic!("indent_of called on a blank line"),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines() {
        assert_eq!(classify("", 0), LineKind::Blank);
        assert_eq!(classify("   ", 0), LineKind::Blank);
    }

    #[test]
    fn markers_match_exactly() {
        assert_eq!(classify("начало", 0), LineKind::Start);
        assert_eq!(classify("  край  ", 0), LineKind::End);
        // A marker with trailing text is not a marker.
        assert_eq!(classify("начало на нещо", 0), LineKind::Label);
    }

    #[test]
    fn keyword_prefixes() {
        assert_eq!(classify("  изход \"здравей\"", 0), LineKind::Output);
        assert_eq!(classify("  вход име", 0), LineKind::Input);
        assert_eq!(classify("  ако x е 5", 0), LineKind::Conditional);
        assert_eq!(classify("  иначе", 0), LineKind::Else);
        assert_eq!(classify("  нека x е 5", 0), LineKind::Declaration);
        assert_eq!(classify("  иди начало_на_цикъла", 0), LineKind::Goto);
    }

    #[test]
    fn label_only_at_base_indent() {
        assert_eq!(classify("цикъл", 0), LineKind::Label);
        assert_eq!(classify("  цикъл", 0), LineKind::Inert);
        assert_eq!(classify("  цикъл", 2), LineKind::Label);
    }

    #[test]
    fn indent_counts_spaces() {
        assert_eq!(indent_of("изход"), 0);
        assert_eq!(indent_of("    изход"), 4);
    }

    #[test]
    #[should_panic]
    fn indent_of_blank_panics() {
        indent_of("   ");
    }
}
