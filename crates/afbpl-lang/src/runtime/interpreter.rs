//! The resumable execution engine.
//!
//! The engine walks the instruction list as a circular buffer, reconciles the
//! conditional-frame stack against each line's indentation, dispatches to
//! per-instruction handlers, and annotates the source as a side effect of
//! recognizing each construct. The only suspension point is the input
//! instruction: `resume` returns [`Step::AwaitingInput`] and the caller later
//! feeds one line of user text through [`Interpreter::provide_input`], which
//! stores the typed value and continues execution.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::error::{Error, ErrorCode};
use crate::runtime::value::{SymbolTable, Value};
use crate::source::{Category, SourceCode};
use crate::syntax::line::{
    self, KW_ELSE, KW_END, KW_EQ, KW_GOTO, KW_IF, KW_INPUT, KW_LET, KW_OUTPUT, KW_START, LineKind,
};
use crate::syntax::literal::{is_float, is_integer, is_string_literal};

/// Outcome of driving the engine: either the program reached `край`, or it
/// stopped at a `вход` instruction and waits for one line of user text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Completed,
    AwaitingInput,
}

/// One active guarded block.
#[derive(Debug, Clone, Copy)]
struct Frame {
    /// Indentation of the governing `ако`.
    indent: usize,
    /// Result of the guard comparison.
    holds: bool,
    /// Set once a matching `иначе` at the same indentation is seen.
    negated: bool,
}

impl Frame {
    /// Whether the lines governed by this frame currently execute.
    fn taken(&self) -> bool {
        self.holds != self.negated
    }
}

pub struct Interpreter {
    source: SourceCode,
    symbols: SymbolTable,
    /// Jump targets, recorded the first time their declaration line runs.
    labels: HashMap<String, usize>,
    frames: Vec<Frame>,
    current: usize,
    base_indent: usize,
    unit_offset: usize,
    output: Vec<String>,
    /// Destination variable of the outstanding input request, if any.
    pending: Option<String>,
    ready: bool,
    finished: bool,
}

impl Interpreter {
    pub fn new(raw_source: &str) -> Self {
        Self {
            source: SourceCode::new(raw_source),
            symbols: SymbolTable::new(),
            labels: HashMap::new(),
            frames: Vec::new(),
            current: 0,
            base_indent: 0,
            unit_offset: 0,
            output: Vec::new(),
            pending: None,
            ready: false,
            finished: false,
        }
    }

    /// Validate the program and position the cursor on `начало`.
    pub fn init(&mut self) -> Result<(), Error> {
        let start = self.find_start_line()?;
        self.base_indent = line::indent_of(self.source.line(start));
        self.unit_offset = self.compute_unit_offset(start)?;
        self.source.mark_needle(start, KW_START, Category::KeywordStart);
        self.current = start;
        self.ready = true;
        debug!(start_line = start, unit_offset = self.unit_offset, "initialized");
        Ok(())
    }

    /// Advance execution until the program completes, fails, or suspends on
    /// input. Calling this before `init`, after a terminal result, or while
    /// an input request is outstanding is a caller-contract violation and
    /// panics.
    pub fn resume(&mut self) -> Result<Step, Error> {
        assert!(self.ready, "resume called before init");
        assert!(self.pending.is_none(), "resume called while an input request is outstanding");
        assert!(!self.finished, "resume called after a terminal result");
        self.advance();
        self.run()
    }

    /// Complete the outstanding input request: store the typed value under
    /// the destination variable and keep executing from the input line.
    /// Panics when no request is outstanding.
    pub fn provide_input(&mut self, text: &str) -> Result<Step, Error> {
        let Some(name) = self.pending.take() else {
            panic!("provide_input called with no outstanding input request");
        };
        let value = Value::infer(text);
        trace!(var = name.as_str(), ?value, "input stored");
        self.symbols.assign(&name, value);
        self.advance();
        self.run()
    }

    /// Output lines produced since the last call, oldest first.
    pub fn take_output(&mut self) -> Vec<String> {
        self.output.drain(..).collect()
    }

    pub fn source(&self) -> &SourceCode {
        &self.source
    }

    pub fn value_of(&self, name: &str) -> Option<&Value> {
        self.symbols.get(name)
    }

    /// Indentation delta that represents one nesting level.
    pub fn unit_offset(&self) -> usize {
        self.unit_offset
    }

    // ─── Startup ──────────────────────────────────────────────────────────────

    /// The line of the only `начало` in the program.
    fn find_start_line(&self) -> Result<usize, Error> {
        let starts: Vec<usize> = self
            .source
            .instructions()
            .iter()
            .enumerate()
            .filter(|(_, l)| l.trim() == KW_START)
            .map(|(i, _)| i)
            .collect();
        match starts.as_slice() {
            [only] => Ok(*only),
            _ => Err(Error::new(
                ErrorCode::B001,
                0,
                format!("Програмата трябва да има точно едно начало. В момента, има {}.", starts.len()),
            )),
        }
    }

    /// Indentation difference between the start line and the first non-blank
    /// line after it. Zero is allowed only for the trivial program that ends
    /// immediately.
    fn compute_unit_offset(&self, start: usize) -> Result<usize, Error> {
        let lines = self.source.instructions();
        let mut i = start + 1;
        while i < lines.len() && lines[i].trim().is_empty() {
            i += 1;
        }
        if i < lines.len() {
            let next = line::indent_of(&lines[i]);
            if next > self.base_indent {
                return Ok(next - self.base_indent);
            }
            if next == self.base_indent && lines[i].trim() == KW_END {
                return Ok(0);
            }
        }
        Err(Error::new(
            ErrorCode::B002,
            start,
            "Първия не-празен ред след 'начало' трябва да е отместен надясно, поне с едно празно място.",
        ))
    }

    // ─── The drive loop ───────────────────────────────────────────────────────

    fn advance(&mut self) {
        self.current = (self.current + 1) % self.source.instructions().len();
    }

    fn run(&mut self) -> Result<Step, Error> {
        loop {
            let raw = self.source.line(self.current).to_string();
            if raw.trim().is_empty() {
                self.advance();
                continue;
            }
            let indent = line::indent_of(&raw);
            let kind = line::classify(&raw, self.base_indent);

            if kind == LineKind::End {
                self.source.mark_needle(self.current, KW_END, Category::KeywordEnd);
                self.finished = true;
                debug!(line = self.current, "completed");
                return Ok(Step::Completed);
            }
            if kind == LineKind::Start {
                self.source.mark_needle(self.current, KW_START, Category::KeywordStart);
                self.finished = true;
                return Err(Error::new(
                    ErrorCode::C001,
                    self.current,
                    "Изпълнението на програмата стигна повторно до 'начало', без преди това да срещне 'край'.",
                ));
            }

            // Reconcile the conditional stack against this line's indentation:
            // pop every frame whose scope has ended; a matching `иначе` flips
            // the topmost frame instead and the line itself is consumed.
            let mut consumed_else = false;
            loop {
                let Some(top) = self.frames.last_mut() else { break };
                if top.indent > indent {
                    self.frames.pop();
                    continue;
                }
                if top.indent == indent {
                    if kind == LineKind::Else {
                        top.negated = true;
                        consumed_else = true;
                        self.source.mark_needle(self.current, KW_ELSE, Category::OperatorElse);
                    } else {
                        self.frames.pop();
                    }
                }
                break;
            }
            if consumed_else {
                self.advance();
                continue;
            }

            // Guard check: any frame whose branch is not taken suppresses
            // the line.
            if self.frames.iter().any(|f| !f.taken()) {
                trace!(line = self.current, "suppressed by guard");
                self.advance();
                continue;
            }

            match kind {
                LineKind::Output => self.perform_output(&raw)?,
                LineKind::Input => return self.perform_input(&raw),
                LineKind::Conditional => self.perform_conditional(&raw, indent)?,
                LineKind::Declaration => self.perform_declaration(&raw)?,
                LineKind::Goto => self.perform_goto(&raw)?,
                LineKind::Label => self.perform_label(&raw),
                // An `иначе` with no governing frame, or an unrecognized
                // indented line: inert.
                LineKind::Else | LineKind::Inert => {}
                LineKind::Blank | LineKind::Start | LineKind::End => unreachable!(),
            }
            self.advance();
        }
    }

    /// Mark the offending span and build the fatal diagnostic.
    fn error_at(&mut self, code: ErrorCode, span: (usize, usize), message: String) -> Error {
        self.source.mark_span(self.current, span.0, span.1, Category::Error);
        self.finished = true;
        Error::with_span(code, self.current, span, message)
    }

    fn write_line(&mut self, text: &str) {
        trace!(line = self.current, text, "output");
        self.output.push(text.to_string());
    }

    // ─── Instruction handlers ─────────────────────────────────────────────────

    fn perform_output(&mut self, raw: &str) -> Result<(), Error> {
        let t = raw.trim();
        assert!(t.starts_with(KW_OUTPUT), "output handler invoked on [{raw}]");
        self.source.mark_needle(self.current, KW_OUTPUT, Category::OperatorOutput);

        let quotes: Vec<usize> = raw.match_indices('"').map(|(i, _)| i).collect();
        if !quotes.is_empty() {
            if quotes.len() != 2 {
                return Err(self.error_at(
                    ErrorCode::X001,
                    span_of(raw, t),
                    "Инструкцията за изход трябва да е последвана от текст в двойни кавички (\").".into(),
                ));
            }
            self.source
                .mark_span(self.current, quotes[0], quotes[1] + 1, Category::LiteralString);
            let text = raw[quotes[0] + 1..quotes[1]].to_string();
            self.write_line(&text);
            return Ok(());
        }

        // Bare variable form: `изход <име>`.
        let name = match t[KW_OUTPUT.len()..].strip_prefix(' ').map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => {
                return Err(self.error_at(
                    ErrorCode::X002,
                    span_of(raw, t),
                    format!("След '{KW_OUTPUT}' трябва да има едно празно място и име на променлива."),
                ));
            }
        };
        let Some(value) = self.symbols.get(name) else {
            let span = span_of(raw, name);
            return Err(self.error_at(ErrorCode::S001, span, format!("Непозната променлива '{name}'.")));
        };
        let text = value.to_string();
        let (start, end) = span_of(raw, name);
        self.source.mark_span(self.current, start, end, Category::Variable);
        self.write_line(&text);
        Ok(())
    }

    fn perform_input(&mut self, raw: &str) -> Result<Step, Error> {
        let t = raw.trim();
        assert!(t.starts_with(KW_INPUT), "input handler invoked on [{raw}]");
        self.source.mark_needle(self.current, KW_INPUT, Category::OperatorInput);

        let name = match t[KW_INPUT.len()..].strip_prefix(' ').map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => {
                return Err(self.error_at(
                    ErrorCode::X003,
                    span_of(raw, t),
                    format!("След '{KW_INPUT}' трябва да има едно празно място и име на променлива."),
                ));
            }
        };
        let (start, end) = span_of(raw, name);
        self.source.mark_span(self.current, start, end, Category::Variable);
        debug!(line = self.current, var = name, "awaiting input");
        self.pending = Some(name.to_string());
        Ok(Step::AwaitingInput)
    }

    fn perform_conditional(&mut self, raw: &str, indent: usize) -> Result<(), Error> {
        let t = raw.trim();
        assert!(t.starts_with(KW_IF), "conditional handler invoked on [{raw}]");
        self.source.mark_needle(self.current, KW_IF, Category::OperatorConditional);

        let phrase = t[KW_IF.len()..].trim();
        let Some((lhs, op, rhs)) = split_comparison(phrase) else {
            return Err(self.error_at(
                ErrorCode::X006,
                span_of(raw, t),
                format!("Условието трябва да е сравнение от вида 'а {KW_EQ} б'."),
            ));
        };
        let (start, end) = span_of(raw, op);
        self.source.mark_span(self.current, start, end, Category::Arithmetic);

        let holds = self.evaluate_comparison(raw, lhs, rhs)?;
        self.frames.push(Frame { indent, holds, negated: false });
        debug!(line = self.current, holds, "conditional evaluated");
        Ok(())
    }

    /// Compare the two sides of a conditional phrase. Both sides may be known
    /// variables (strict tag-and-value equality); otherwise the literal side
    /// is re-derived according to the known side's type.
    fn evaluate_comparison(&mut self, raw: &str, lhs: &str, rhs: &str) -> Result<bool, Error> {
        match (self.symbols.get(lhs).cloned(), self.symbols.get(rhs).cloned()) {
            (Some(a), Some(b)) => {
                self.mark_variable(raw, lhs);
                self.mark_variable(raw, rhs);
                Ok(a == b)
            }
            (Some(var), None) => {
                self.mark_variable(raw, lhs);
                self.compare_literal(raw, &var, rhs)
            }
            (None, Some(var)) => {
                self.mark_variable(raw, rhs);
                self.compare_literal(raw, &var, lhs)
            }
            (None, None) => Err(self.error_at(
                ErrorCode::S003,
                span_of(raw, raw.trim()),
                "Поне едната страна на сравнението трябва да е позната променлива.".into(),
            )),
        }
    }

    /// Re-derive a literal according to the known operand's type and compare.
    fn compare_literal(&mut self, raw: &str, var: &Value, lit: &str) -> Result<bool, Error> {
        let span = span_of(raw, lit);
        match var {
            Value::Int(v) => {
                if !is_integer(lit) {
                    return Err(self.error_at(
                        ErrorCode::S002,
                        span,
                        format!("Променливата е {}, а '{lit}' не е.", var.type_name()),
                    ));
                }
                self.source.mark_span(self.current, span.0, span.1, Category::LiteralInt);
                Ok(lit.parse::<i64>().unwrap_or(0) == *v)
            }
            Value::Float(v) => {
                if !is_float(lit) {
                    return Err(self.error_at(
                        ErrorCode::S002,
                        span,
                        format!("Променливата е {}, а '{lit}' не е.", var.type_name()),
                    ));
                }
                self.source.mark_span(self.current, span.0, span.1, Category::LiteralFloat);
                Ok(lit.parse::<f64>().unwrap_or(0.0) == *v)
            }
            Value::Text(v) => match unquote(lit) {
                Some(inner) => {
                    self.source.mark_span(self.current, span.0, span.1, Category::LiteralString);
                    Ok(inner == v)
                }
                None => Err(self.error_at(
                    ErrorCode::S002,
                    span,
                    format!("Променливата е {}, а '{lit}' не е текст в двойни кавички.", var.type_name()),
                )),
            },
        }
    }

    fn perform_declaration(&mut self, raw: &str) -> Result<(), Error> {
        let t = raw.trim();
        assert!(t.starts_with(KW_LET), "declaration handler invoked on [{raw}]");
        self.source.mark_needle(self.current, KW_LET, Category::OperatorDeclaration);

        let form = format!("Декларацията трябва да е от вида '{KW_LET} име {KW_EQ} стойност'.");
        let rest = t[KW_LET.len()..].trim_start();
        let Some((name, after)) = rest.split_once(' ') else {
            return Err(self.error_at(ErrorCode::X004, span_of(raw, t), form));
        };
        let after = after.trim_start();
        let Some((op, value_text)) = after.split_once(' ') else {
            return Err(self.error_at(ErrorCode::X004, span_of(raw, t), form));
        };
        if op != KW_EQ && op != "=" {
            return Err(self.error_at(
                ErrorCode::X004,
                span_of(raw, op),
                format!("Между името и стойността трябва да стои '{KW_EQ}' или '='."),
            ));
        }
        let (start, end) = span_of(raw, op);
        self.source.mark_span(self.current, start, end, Category::Arithmetic);

        let value_text = value_text.trim();
        let value_span = span_of(raw, value_text);
        let value = if let Some(existing) = self.symbols.get(value_text).cloned() {
            self.source
                .mark_span(self.current, value_span.0, value_span.1, Category::Variable);
            existing
        } else if let Some(inner) = unquote(value_text) {
            self.source
                .mark_span(self.current, value_span.0, value_span.1, Category::LiteralString);
            Value::Text(inner.to_string())
        } else if is_integer(value_text) {
            self.source
                .mark_span(self.current, value_span.0, value_span.1, Category::LiteralInt);
            Value::Int(value_text.parse().unwrap_or(0))
        } else if is_float(value_text) {
            self.source
                .mark_span(self.current, value_span.0, value_span.1, Category::LiteralFloat);
            Value::Float(value_text.parse().unwrap_or(0.0))
        } else {
            return Err(self.error_at(
                ErrorCode::X005,
                value_span,
                format!("'{value_text}' не е име на променлива, текст в кавички или число."),
            ));
        };

        self.mark_variable(raw, name);
        trace!(var = name, ?value, "declared");
        self.symbols.assign(name, value);
        Ok(())
    }

    fn perform_label(&mut self, raw: &str) {
        let name = raw.trim();
        let (start, end) = span_of(raw, name);
        self.source.mark_span(self.current, start, end, Category::KeywordLabel);
        trace!(line = self.current, label = name, "label recorded");
        self.labels.insert(name.to_string(), self.current);
    }

    fn perform_goto(&mut self, raw: &str) -> Result<(), Error> {
        let t = raw.trim();
        assert!(t.starts_with(KW_GOTO), "goto handler invoked on [{raw}]");
        self.source.mark_needle(self.current, KW_GOTO, Category::OperatorGoto);

        let name = match t[KW_GOTO.len()..].strip_prefix(' ').map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => {
                return Err(self.error_at(
                    ErrorCode::X007,
                    span_of(raw, t),
                    format!("След '{KW_GOTO}' трябва да има име на етикет."),
                ));
            }
        };
        let Some(&target) = self.labels.get(name) else {
            let span = span_of(raw, name);
            return Err(self.error_at(ErrorCode::S004, span, format!("Непознат етикет '{name}'.")));
        };
        let (start, end) = span_of(raw, name);
        self.source.mark_span(self.current, start, end, Category::KeywordLabel);
        debug!(from = self.current, to = target, label = name, "goto");
        // The drive loop advances past the label on the next iteration.
        self.current = target;
        Ok(())
    }

    fn mark_variable(&mut self, raw: &str, name: &str) {
        let (start, end) = span_of(raw, name);
        self.source.mark_span(self.current, start, end, Category::Variable);
    }
}

// ─── Phrase helpers ───────────────────────────────────────────────────────────

/// Byte span of `part` within `raw`. `part` must be a subslice of `raw`.
fn span_of(raw: &str, part: &str) -> (usize, usize) {
    let offset = part.as_ptr() as usize - raw.as_ptr() as usize;
    (offset, offset + part.len())
}

/// Split `<ляво> е <дясно>` on the first operator token outside quotes.
fn split_comparison(phrase: &str) -> Option<(&str, &str, &str)> {
    let mut in_string = false;
    for (i, c) in phrase.char_indices() {
        if c == '"' {
            in_string = !in_string;
            continue;
        }
        if !in_string && phrase[i..].starts_with(" е ") {
            let lhs = phrase[..i].trim();
            let op = &phrase[i + 1..i + 1 + KW_EQ.len()];
            let rhs = phrase[i + 1 + KW_EQ.len() + 1..].trim();
            if lhs.is_empty() || rhs.is_empty() {
                return None;
            }
            return Some((lhs, op, rhs));
        }
    }
    None
}

/// The content between the quotes of a string literal, if the text is one.
fn unquote(text: &str) -> Option<&str> {
    if text.len() >= 2 && is_string_literal(text) {
        Some(&text[1..text.len() - 1])
    } else {
        None
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_comparison_basic() {
        assert_eq!(split_comparison("x е 5"), Some(("x", "е", "5")));
        assert_eq!(split_comparison("име е \"аз\""), Some(("име", "е", "\"аз\"")));
    }

    #[test]
    fn split_comparison_ignores_operator_inside_quotes() {
        assert_eq!(split_comparison("\"а е б\" е х"), Some(("\"а е б\"", "е", "х")));
    }

    #[test]
    fn split_comparison_rejects_missing_sides() {
        assert_eq!(split_comparison("х е"), None);
        assert_eq!(split_comparison("е 5"), None);
        assert_eq!(split_comparison("само едно"), None);
    }

    #[test]
    fn unquote_requires_both_quotes() {
        assert_eq!(unquote("\"аз\""), Some("аз"));
        assert_eq!(unquote("\"\""), Some(""));
        assert_eq!(unquote("\""), None);
        assert_eq!(unquote("аз"), None);
    }

    #[test]
    fn frame_negation_flips_branch() {
        let mut frame = Frame { indent: 2, holds: true, negated: false };
        assert!(frame.taken());
        frame.negated = true;
        assert!(!frame.taken());
    }

    #[test]
    fn span_of_subslice() {
        let raw = "  изход име";
        let name = raw.trim()[KW_OUTPUT.len() + 1..].trim();
        assert_eq!(span_of(raw, name), (13, 19));
    }
}
