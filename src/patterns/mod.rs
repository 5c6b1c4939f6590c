//! Source patterns shared by detection and remediation
//!
//! The analyzer and the fix engine must agree on what counts as vulnerable:
//! a fix is only verified when the same matcher that raised the finding no
//! longer fires.

pub mod js;
pub mod python;
pub mod ruby;

/// 1-based line number of a byte offset
pub fn line_at(content: &str, offset: usize) -> u32 {
    js::line_of(content, offset)
}

/// Split into lines and remember whether the text ended with a newline
pub fn split_lines(content: &str) -> (Vec<&str>, bool) {
    let trailing = content.ends_with('\n');
    let body = content.strip_suffix('\n').unwrap_or(content);
    (body.split('\n').collect(), trailing)
}

pub fn join_lines<S: AsRef<str>>(lines: &[S], trailing_newline: bool) -> String {
    let mut out = lines.iter().map(|l| l.as_ref()).collect::<Vec<_>>().join("\n");
    if trailing_newline {
        out.push('\n');
    }
    out
}
