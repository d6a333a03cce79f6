//! Argument-list tokenizer.
//!
//! Splits the text between a declaration's parentheses into `key=value`
//! pairs. Commas nested inside `()`, `[]` or `{}`, or inside a quoted
//! string, are never split points. The tokenizer is best-effort: malformed
//! chunks are dropped and no input makes it fail.

use std::collections::BTreeMap;

/// Raw, unevaluated parameter values keyed by parameter name.
pub type Parameters = BTreeMap<String, String>;

/// Parse an argument list such as `units=64, activation="relu"`.
///
/// Chunks are split at their first `=`; key and value are trimmed and the
/// value is kept verbatim (quotes included). Chunks without `=` are
/// positional arguments and are not modelled. On duplicate keys the last
/// occurrence wins.
pub fn parse_parameters(args: &str) -> Parameters {
    let mut params = Parameters::new();

    for chunk in split_top_level(args) {
        if let Some((key, value)) = chunk.trim().split_once('=') {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            params.insert(key.to_string(), value.trim().to_string());
        }
    }

    params
}

/// Split `text` on commas at nesting depth zero, outside string literals.
///
/// An unterminated quote keeps the rest of the input inside the string, so
/// no further splits happen after it.
pub fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    parts.push(&text[start..]);
    parts
}

/// Byte index of the bracket closing the one at `open`, honouring nesting
/// and string literals. `None` when the input ends first.
pub fn find_closing(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in text.get(open..)?.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }

    None
}
