//! Variable extraction and substitution for template text.

use serde_json::Value;

/// Collect the placeholder identifiers appearing in `content`.
///
/// Scans left to right for `{{` ... `}}` spans whose inner text contains no
/// `}`, trims the inner text, and keeps the first occurrence of each
/// identifier. Malformed markers (a lone brace, an unterminated `{{`) simply
/// produce no match.
pub fn extract_variables(content: &str) -> Vec<String> {
    let mut variables: Vec<String> = Vec::new();
    let mut cursor = 0;

    while let Some(open) = content[cursor..].find("{{").map(|i| cursor + i) {
        let inner_start = open + 2;
        match content[inner_start..].find('}').map(|i| inner_start + i) {
            Some(brace) if content[brace..].starts_with("}}") => {
                let identifier = content[inner_start..brace].trim();
                if !variables.iter().any(|v| v == identifier) {
                    variables.push(identifier.to_string());
                }
                cursor = brace + 2;
            }
            Some(_) => {
                // A single '}' inside the span disqualifies this opener, but a
                // later opener may still start inside it.
                cursor = open + 1;
            }
            None => break,
        }
    }

    variables
}

/// Render `content` by substituting `{{ key }}` markers with values from
/// `variables`, one replacement pass per key.
///
/// Whitespace inside the braces is tolerated. Keys without a marker in the
/// text are no-ops; markers without a key are left intact. Replacement text
/// inserted by a pass is not rescanned for that same key, but a later key's
/// pass does see it, so substitution is sequential rather than recursive.
pub fn render_template(content: &str, variables: &serde_json::Map<String, Value>) -> String {
    let mut result = content.to_string();

    for (key, value) in variables {
        result = replace_marker(&result, key, &value_to_string(value));
    }

    result
}

/// One replacement pass: substitute every `{{ key }}` marker in `content`.
fn replace_marker(content: &str, key: &str, replacement: &str) -> String {
    let mut output = String::with_capacity(content.len());
    let mut cursor = 0;

    while let Some(open) = content[cursor..].find("{{").map(|i| cursor + i) {
        let inner_start = open + 2;
        match content[inner_start..].find('}').map(|i| inner_start + i) {
            Some(brace) if content[brace..].starts_with("}}") => {
                if content[inner_start..brace].trim() == key {
                    output.push_str(&content[cursor..open]);
                    output.push_str(replacement);
                } else {
                    output.push_str(&content[cursor..brace + 2]);
                }
                cursor = brace + 2;
            }
            Some(_) => {
                output.push_str(&content[cursor..open + 1]);
                cursor = open + 1;
            }
            None => break,
        }
    }

    output.push_str(&content[cursor..]);
    output
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        // Arrays and objects keep their JSON representation
        other => other.to_string(),
    }
}
