//! Code-aware tokenizer (spec §4.B).
//!
//! Input is split on non-alphanumeric boundaries, then each token is
//! further split on case transitions (`camelCase` → `camel`, `Case`) and
//! underscores (`snake_case` → `snake`, `case`). All tokens are lowercased.
//! Tokens of length 1 are dropped.
//!
//! The source tokenizer keeps stop-words (spec §9 open question); this one
//! does too.

/// Tokenize `text` into searchable terms.
///
/// # Examples
///
/// ```
/// use agrama_lexical::tokenizer::tokenize;
///
/// assert_eq!(tokenize("calculateDistance"), vec!["calculate", "distance"]);
/// assert_eq!(tokenize("snake_case_name"), vec!["snake", "case", "name"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for word in text.split(|c: char| !c.is_alphanumeric()) {
        if word.is_empty() {
            continue;
        }
        for sub in split_on_case_and_underscore(word) {
            if sub.chars().count() > 1 {
                tokens.push(sub.to_lowercase());
            }
        }
    }
    tokens
}

/// Split a single alphanumeric word on underscores and on case
/// transitions: lower→upper (`camelCase`) and a run of uppercase followed
/// by a lowercase letter (`HTTPServer` → `HTTP`, `Server`).
fn split_on_case_and_underscore(word: &str) -> Vec<String> {
    let mut parts = Vec::new();
    for segment in word.split('_') {
        if segment.is_empty() {
            continue;
        }
        let chars: Vec<char> = segment.chars().collect();
        let mut start = 0;
        for i in 1..chars.len() {
            let prev = chars[i - 1];
            let cur = chars[i];
            let lower_to_upper = prev.is_lowercase() && cur.is_uppercase();
            let upper_run_to_lower = prev.is_uppercase()
                && cur.is_uppercase()
                && i + 1 < chars.len()
                && chars[i + 1].is_lowercase();
            if lower_to_upper || upper_run_to_lower {
                parts.push(chars[start..i].iter().collect::<String>());
                start = i;
            }
        }
        parts.push(chars[start..].iter().collect::<String>());
    }
    parts
}
