//! The TRANSFORM primitive's operation registry (spec §4.F TRANSFORM).

use agrama_core::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashMap;
use serde_json::{json, Value};

/// A named transform: `(input, parameters) -> output`.
pub type TransformFn = fn(&Value, &Value) -> Result<Value>;

/// String-keyed registry of TRANSFORM operations. Built-ins are installed
/// by [`TransformRegistry::with_builtins`]; callers may register more.
pub struct TransformRegistry {
    operations: FxHashMap<String, TransformFn>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        TransformRegistry {
            operations: FxHashMap::default(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("parse_functions", parse_functions);
        registry.register("extract_imports", extract_imports);
        registry.register("generate_summary", generate_summary);
        registry.register("compress_text", compress_text);
        registry.register("merge_items", merge_items);
        registry
    }

    pub fn register(&mut self, name: &str, f: TransformFn) {
        self.operations.insert(name.to_string(), f);
    }

    pub fn invoke(&self, operation: &str, input: &Value, parameters: &Value) -> Result<Value> {
        let f = self
            .operations
            .get(operation)
            .ok_or_else(|| Error::UnknownOperation(operation.to_string()))?;
        f(input, parameters)
    }

    pub fn contains(&self, operation: &str) -> bool {
        self.operations.contains_key(operation)
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

static FUNCTION_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"(?m)^\s*(?:pub(?:\([^)]*\))?\s+)?fn\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap(), "rust"),
        (Regex::new(r"(?m)^\s*def\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap(), "python"),
        (
            Regex::new(r"(?m)^\s*(?:export\s+)?(?:async\s+)?function\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap(),
            "javascript",
        ),
    ]
});

static IMPORT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?m)^\s*use\s+([A-Za-z0-9_:]+)").unwrap(),
        Regex::new(r#"(?m)^\s*import\s+.*?from\s+['"]([^'"]+)['"]"#).unwrap(),
        Regex::new(r#"(?m)^\s*import\s+([A-Za-z0-9_.]+)"#).unwrap(),
        Regex::new(r"(?m)^\s*from\s+([A-Za-z0-9_.]+)\s+import").unwrap(),
    ]
});

fn text_input(input: &Value) -> Result<&str> {
    input
        .as_str()
        .ok_or_else(|| Error::InvalidInput("expected a string input".into()))
}

fn parse_functions(input: &Value, _parameters: &Value) -> Result<Value> {
    let text = text_input(input)?;
    let mut functions = Vec::new();
    for (pattern, language) in FUNCTION_PATTERNS.iter() {
        for capture in pattern.captures_iter(text) {
            let whole = capture.get(0).expect("match 0 always present");
            let name = capture.get(1).map(|m| m.as_str()).unwrap_or_default();
            functions.push(json!({
                "name": name,
                "span": [whole.start(), whole.end()],
                "language": language,
            }));
        }
    }
    Ok(Value::Array(functions))
}

fn extract_imports(input: &Value, _parameters: &Value) -> Result<Value> {
    let text = text_input(input)?;
    let mut imports = Vec::new();
    for pattern in IMPORT_PATTERNS.iter() {
        for capture in pattern.captures_iter(text) {
            if let Some(m) = capture.get(1) {
                imports.push(Value::String(m.as_str().to_string()));
            }
        }
    }
    Ok(Value::Array(imports))
}

fn generate_summary(input: &Value, parameters: &Value) -> Result<Value> {
    let text = text_input(input)?;
    let max_chars = parameters
        .get("max_chars")
        .and_then(Value::as_u64)
        .unwrap_or(200) as usize;

    let first_paragraph = text.split("\n\n").next().unwrap_or(text).trim();
    let summary: String = first_paragraph.chars().take(max_chars).collect();
    Ok(Value::String(summary))
}

fn compress_text(input: &Value, _parameters: &Value) -> Result<Value> {
    static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
    let text = text_input(input)?;
    let compressed = WHITESPACE.replace_all(text.trim(), " ").to_string();
    Ok(Value::String(compressed))
}

/// Combines already-resolved values. `merge_items` is spec'd as taking an
/// array of *keys* (spec §4.F); resolving each key to its current stored
/// value happens in `PrimitiveEngine::transform`, which holds the storage
/// handle this registry doesn't — by the time a `TransformFn` sees it, the
/// input array is values, not keys.
fn merge_items(input: &Value, parameters: &Value) -> Result<Value> {
    let values = input
        .as_array()
        .ok_or_else(|| Error::InvalidInput("merge_items expects an array of values".into()))?;
    let strategy = parameters.get("strategy").and_then(Value::as_str).unwrap_or("latest-wins");

    match strategy {
        "concatenate" => {
            let joined = values
                .iter()
                .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                .collect::<Vec<_>>()
                .join("");
            Ok(Value::String(joined))
        }
        "union" => {
            let mut seen = Vec::new();
            for value in values {
                if !seen.contains(value) {
                    seen.push(value.clone());
                }
            }
            Ok(Value::Array(seen))
        }
        "latest-wins" => values
            .last()
            .cloned()
            .ok_or_else(|| Error::InvalidInput("merge_items given an empty array".into())),
        other => Err(Error::InvalidInput(format!("unknown merge strategy: {other}"))),
    }
}
