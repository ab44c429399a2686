use std::collections::HashMap;
use std::fmt;

use crate::syntax::literal::{is_float, is_integer};

/// A stored program value, tagged with its inferred type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Infer a value from raw text, once, at assignment time.
    /// Precedence: integer, then float, then the text itself verbatim.
    pub fn infer(text: &str) -> Value {
        let t = text.trim();
        if is_integer(t) {
            Value::Int(t.parse().unwrap_or(0))
        } else if is_float(t) {
            Value::Float(t.parse().unwrap_or(0.0))
        } else {
            Value::Text(text.to_string())
        }
    }

    /// Bulgarian-facing type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "цяло число",
            Value::Float(_) => "дробно число",
            Value::Text(_) => "текст",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v}"),
        }
    }
}

// ─── SymbolTable ──────────────────────────────────────────────────────────────

/// Flat variable store. Created empty with the engine, mutated by declaration
/// and input instructions, alive for the engine's lifetime.
#[derive(Debug, Default)]
pub struct SymbolTable {
    vars: HashMap<String, Value>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self { vars: HashMap::new() }
    }

    /// Insert or overwrite.
    pub fn assign(&mut self, name: &str, value: Value) {
        self.vars.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inference_precedence() {
        assert_eq!(Value::infer("5"), Value::Int(5));
        assert_eq!(Value::infer("3.14"), Value::Float(3.14));
        assert_eq!(Value::infer("здравей"), Value::Text("здравей".into()));
    }

    #[test]
    fn inference_keeps_raw_text_verbatim() {
        // Quoted input stays quoted; stripping is the caller's decision.
        assert_eq!(Value::infer("\"пет\""), Value::Text("\"пет\"".into()));
        assert_eq!(Value::infer("007"), Value::Text("007".into()));
    }

    #[test]
    fn display_matches_literal_forms() {
        assert_eq!(Value::Int(-3).to_string(), "-3");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::Text("аз".into()).to_string(), "аз");
    }

    #[test]
    fn assign_overwrites() {
        let mut table = SymbolTable::new();
        table.assign("x", Value::Int(1));
        table.assign("x", Value::Text("две".into()));
        assert_eq!(table.get("x"), Some(&Value::Text("две".into())));
        assert_eq!(table.len(), 1);
    }
}
