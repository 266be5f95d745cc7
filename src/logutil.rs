//! Log sanitization for participant-supplied text.
//!
//! Display names and message bodies come straight from the chat platform and
//! may contain newlines or control characters that would break single-line
//! log parsing. Everything user-originated goes through [`escape_log`] before
//! it reaches a log macro.

/// Chat snippets in logs rarely need more than this.
const MAX_PREVIEW: usize = 160;

/// Escape a participant-supplied string for single-line logging. Newlines,
/// tabs, and backslashes are backslash-escaped, other control characters
/// become `\xNN`, and anything past the preview cap is dropped behind an
/// ellipsis.
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write;
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{escape_log, MAX_PREVIEW};

    #[test]
    fn escapes_line_breaks_and_controls() {
        assert_eq!(escape_log("mine\nchop\tfish"), "mine\\nchop\\tfish");
        assert_eq!(escape_log("a\x07b"), "a\\x07b");
        assert_eq!(escape_log("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn long_names_are_previewed() {
        let long = "x".repeat(MAX_PREVIEW + 50);
        let escaped = escape_log(&long);
        assert!(escaped.ends_with('…'));
        assert_eq!(escaped.chars().count(), MAX_PREVIEW + 1);
    }
}
