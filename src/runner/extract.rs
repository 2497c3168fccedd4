use serde_json::Value;

/// Maximum characters of stdout carried in a parse-failure diagnostic.
pub const STDOUT_EXCERPT_CHARS: usize = 500;

/// Maximum characters of stderr carried in an exit-failure diagnostic.
pub const STDERR_EXCERPT_CHARS: usize = 2000;

/// Recover the worker's structured result from its free-text stdout.
///
/// The worker prints progress lines and then one trailing JSON line as its
/// real result. Lines are scanned in reverse; the first trimmed line starting
/// with `{` or `[` that parses as a self-contained value wins. If no single
/// line parses (the worker may pretty-print its result across lines), the
/// whole trimmed buffer is parsed as one object or array.
///
/// Known limitation: a late log line that happens to be valid JSON shadows
/// the real result.
pub fn extract_result(stdout: &str) -> Option<Value> {
    for line in stdout.lines().rev() {
        let trimmed = line.trim();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            if let Ok(value) = serde_json::from_str(trimmed) {
                return Some(value);
            }
        }
    }

    let whole = stdout.trim();
    if whole.starts_with('{') || whole.starts_with('[') {
        serde_json::from_str(whole).ok()
    } else {
        None
    }
}

/// First `max_chars` characters of `text`, never splitting a UTF-8 sequence.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
