use crate::error::MismatchError;

const FENCE: &str = "```";

/// Splits a classifier reply into one label per line.
///
/// Surrounding code fences (optionally tagged, e.g. ```` ```text ````) and
/// stray backticks are removed, every line is trimmed and blank lines are
/// skipped. Labels are returned verbatim; only their count is checked.
pub fn parse_labels(raw: &str, expected: usize) -> Result<Vec<String>, MismatchError> {
    let labels = split_lines(raw);

    if labels.len() != expected {
        return Err(MismatchError {
            expected,
            actual: labels.len(),
        });
    }

    Ok(labels)
}

/// The reply's label lines, without the count check.
pub fn split_lines(raw: &str) -> Vec<String> {
    strip_fence(raw)
        .lines()
        .map(|line| line.trim().trim_matches('`').trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_fence(raw: &str) -> &str {
    let mut body = raw.trim();

    if let Some(rest) = body.strip_prefix(FENCE) {
        body = match rest.split_once('\n') {
            // A lone word right after the opening fence is an info string.
            Some((first, tail)) if is_info_string(first) => tail,
            _ => rest,
        };
    }
    if let Some(rest) = body.trim_end().strip_suffix(FENCE) {
        body = rest;
    }

    body.trim_matches(|c: char| c == '`' || c.is_whitespace())
}

fn is_info_string(line: &str) -> bool {
    let line = line.trim();
    line.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
