//! The engine-facing half of the source collaborator: an ordered view of the
//! instruction lines plus an annotation store for syntax highlighting and
//! error display.
//!
//! The store and the rendering are two independent stages: annotations live
//! in an ordered, deduplicated map keyed by span; producing the decorated
//! text view is a separate read-only pass.

use std::collections::BTreeMap;

/// Annotation categories, one per recognizable construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    KeywordStart,
    KeywordEnd,
    KeywordLabel,
    OperatorGoto,
    OperatorOutput,
    OperatorInput,
    OperatorConditional,
    OperatorElse,
    OperatorDeclaration,
    Arithmetic,
    LiteralString,
    LiteralInt,
    LiteralFloat,
    Variable,
    Error,
}

impl Category {
    /// Coarse styling class used by the rendering stage.
    pub fn css_class(self) -> &'static str {
        match self {
            Self::KeywordStart | Self::KeywordEnd | Self::KeywordLabel => "codeKeyword",
            Self::OperatorGoto
            | Self::OperatorOutput
            | Self::OperatorInput
            | Self::OperatorConditional
            | Self::OperatorElse
            | Self::OperatorDeclaration => "codeOperator",
            Self::Arithmetic => "codeArithmetic",
            Self::LiteralString | Self::LiteralInt | Self::LiteralFloat => "codeLiteral",
            Self::Variable => "codeVariable",
            Self::Error => "codeError",
        }
    }
}

/// A highlighted span over the flattened raw text. Offsets are byte
/// positions; `start..end` never crosses a newline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Annotation {
    pub category: Category,
    pub start: usize,
    pub end: usize,
}

/// The raw program text, split into instruction lines, with the annotations
/// collected while interpreting it.
pub struct SourceCode {
    raw: String,
    lines: Vec<String>,
    /// Byte offset of each line's first character in `raw`.
    line_starts: Vec<usize>,
    annotations: BTreeMap<(usize, usize), Category>,
}

impl SourceCode {
    pub fn new(raw: &str) -> Self {
        let lines: Vec<String> = raw.split('\n').map(str::to_string).collect();
        let mut line_starts = Vec::with_capacity(lines.len());
        let mut pos = 0;
        for line in &lines {
            line_starts.push(pos);
            pos += line.len() + 1;
        }
        Self { raw: raw.to_string(), lines, line_starts, annotations: BTreeMap::new() }
    }

    pub fn instructions(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> &str {
        &self.lines[index]
    }

    /// Record a span annotation, offsets relative to the line. Re-annotating
    /// an identical span is a no-op; the first category recorded wins.
    pub fn mark_span(&mut self, line: usize, start: usize, end: usize, category: Category) {
        let base = self.line_starts[line];
        self.annotations.entry((base + start, base + end)).or_insert(category);
    }

    /// Annotate the first occurrence of `needle` on the line, if present.
    pub fn mark_needle(&mut self, line: usize, needle: &str, category: Category) {
        if let Some(at) = self.lines[line].find(needle) {
            self.mark_span(line, at, at + needle.len(), category);
        }
    }

    /// All recorded annotations, in ascending start order.
    pub fn annotations(&self) -> impl Iterator<Item = Annotation> + '_ {
        self.annotations
            .iter()
            .map(|(&(start, end), &category)| Annotation { category, start, end })
    }

    /// Rendering stage: the raw text with every annotated span wrapped in a
    /// styled `<span>`. Spans may overlap (an error span covers the whole
    /// line on top of earlier keyword marks), so the text is emitted segment
    /// by segment between span boundaries, reopening every covering span.
    pub fn to_html(&self) -> String {
        let mut bounds: Vec<usize> = vec![0, self.raw.len()];
        for &(start, end) in self.annotations.keys() {
            bounds.push(start);
            bounds.push(end);
        }
        bounds.sort_unstable();
        bounds.dedup();

        let mut out = String::with_capacity(self.raw.len());
        for pair in bounds.windows(2) {
            let (seg_start, seg_end) = (pair[0], pair[1]);
            let covering: Vec<&'static str> = self
                .annotations
                .iter()
                .filter(|&(&(start, end), _)| start <= seg_start && seg_end <= end)
                .map(|(_, category)| category.css_class())
                .collect();
            for class in &covering {
                out.push_str(&format!("<span class=\"{class}\">"));
            }
            out.push_str(&self.raw[seg_start..seg_end]);
            for _ in &covering {
                out.push_str("</span>");
            }
        }
        out
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_offsets_are_cumulative() {
        let src = SourceCode::new("ab\ncd\nef");
        assert_eq!(src.instructions(), ["ab", "cd", "ef"]);
        assert_eq!(src.line_starts, [0, 3, 6]);
    }

    #[test]
    fn annotations_sorted_by_start() {
        let mut src = SourceCode::new("abc\ndef");
        src.mark_span(1, 0, 3, Category::Variable);
        src.mark_span(0, 0, 3, Category::KeywordStart);
        let spans: Vec<_> = src.annotations().map(|a| (a.start, a.end)).collect();
        assert_eq!(spans, [(0, 3), (4, 7)]);
    }

    #[test]
    fn duplicate_span_suppressed() {
        let mut src = SourceCode::new("начало");
        src.mark_needle(0, "начало", Category::KeywordStart);
        src.mark_needle(0, "начало", Category::KeywordStart);
        assert_eq!(src.annotations().count(), 1);
    }

    #[test]
    fn missing_needle_is_ignored() {
        let mut src = SourceCode::new("изход");
        src.mark_needle(0, "вход", Category::OperatorInput);
        assert_eq!(src.annotations().count(), 0);
    }

    #[test]
    fn html_wraps_spans_without_disturbing_text() {
        let mut src = SourceCode::new("начало\nкрай");
        src.mark_needle(0, "начало", Category::KeywordStart);
        src.mark_needle(1, "край", Category::KeywordEnd);
        assert_eq!(
            src.to_html(),
            "<span class=\"codeKeyword\">начало</span>\n<span class=\"codeKeyword\">край</span>"
        );
    }

    #[test]
    fn html_survives_overlapping_error_span() {
        // An error span over the whole line on top of the keyword mark, as
        // the engine records on a failed instruction.
        let mut src = SourceCode::new("изход \"а");
        src.mark_needle(0, "изход", Category::OperatorOutput);
        src.mark_span(0, 0, 14, Category::Error);
        assert_eq!(
            src.to_html(),
            "<span class=\"codeOperator\"><span class=\"codeError\">изход</span></span>\
             <span class=\"codeError\"> \"а</span>"
        );
    }

    #[test]
    fn html_without_annotations_is_raw() {
        let src = SourceCode::new("а\nб");
        assert_eq!(src.to_html(), "а\nб");
    }
}
