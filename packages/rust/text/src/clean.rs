//! Line cleanup passes.
//!
//! Each pass is a function `&str -> String` applied in sequence. None of them
//! validates what a line means; they only strip textual noise.

/// Literal two-character escape for a newline (`\` then `n`).
const ESCAPED_NEWLINE: &str = "\\n";

/// Sanitize one line of text or raw UTF-8 bytes.
///
/// Trims surrounding whitespace, removes every double quote and every
/// literal `\n` token, then drops one trailing apostrophe. Bytes that are
/// not valid UTF-8 are replaced with U+FFFD.
pub fn clean<T: AsRef<[u8]> + ?Sized>(line: &T) -> String {
    let text = String::from_utf8_lossy(line.as_ref());

    let mut result = text.trim().to_string();
    result = strip_quotes(&result);
    result = strip_escaped_newlines(&result);
    result = strip_trailing_apostrophe(&result);

    result
}

/// Sanitize a `label:value` header line, keeping only the value.
///
/// Everything up to and including the first `:` is discarded; later colons
/// are part of the value. A line without any `:` yields an empty string.
pub fn clean_leading<T: AsRef<[u8]> + ?Sized>(line: &T) -> String {
    let text = String::from_utf8_lossy(line.as_ref());
    clean(value_after_label(&text))
}

fn value_after_label(text: &str) -> &str {
    text.split_once(':').map(|(_label, rest)| rest).unwrap_or("")
}

// ---------------------------------------------------------------------------
// Passes
// ---------------------------------------------------------------------------

fn strip_quotes(line: &str) -> String {
    line.replace('"', "")
}

fn strip_escaped_newlines(line: &str) -> String {
    line.replace(ESCAPED_NEWLINE, "")
}

fn strip_trailing_apostrophe(line: &str) -> String {
    line.strip_suffix('\'').unwrap_or(line).to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
