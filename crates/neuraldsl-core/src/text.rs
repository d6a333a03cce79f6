//! Small text helpers shared by the scanner and the validation rules.

/// Byte offset where a line comment (`#` or `//`) starts, ignoring markers
/// inside string literals.
pub(crate) fn comment_start(line: &str) -> Option<usize> {
    let mut in_string = false;
    let mut string_char = '"';
    let mut prev_char = '\0';

    for (i, c) in line.char_indices() {
        if !in_string {
            if c == '"' || c == '\'' {
                in_string = true;
                string_char = c;
            } else if c == '#' {
                return Some(i);
            } else if c == '/' && prev_char == '/' {
                return Some(i - 1);
            }
        } else if c == string_char && prev_char != '\\' {
            in_string = false;
        }
        prev_char = c;
    }

    None
}

/// Strip a trailing line comment, keeping comment markers inside strings.
pub(crate) fn strip_line_comment(line: &str) -> &str {
    match comment_start(line) {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Characters of `line` that sit outside string literals, with their byte
/// offsets. Quote characters themselves are not yielded.
pub(crate) fn unquoted_chars(line: &str) -> Vec<(usize, char)> {
    let mut out = Vec::with_capacity(line.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in line.char_indices() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None if c == '"' || c == '\'' => quote = Some(c),
            None => out.push((i, c)),
        }
    }

    out
}

/// Number of leading whitespace bytes.
pub(crate) fn indentation(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Strip surrounding quotes and whitespace from a raw parameter value.
pub(crate) fn unquote(value: &str) -> &str {
    value.trim().trim_matches(|c| c == '"' || c == '\'').trim()
}

/// Parse a raw parameter value as a finite number, ignoring quotes.
pub(crate) fn parse_number(value: &str) -> Option<f64> {
    unquote(value)
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// Find the closest known name within an edit distance of 2.
pub(crate) fn find_similar<'a>(name: &str, known: &[&'a str]) -> Option<&'a str> {
    let name_lower = name.to_lowercase();

    known
        .iter()
        .map(|candidate| (*candidate, levenshtein_distance(&name_lower, &candidate.to_lowercase())))
        .filter(|(_, distance)| *distance > 0 && *distance <= 2)
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate Levenshtein distance between two strings.
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}
