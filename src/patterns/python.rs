//! Prompt construction from raw user input in Python sources

use once_cell::sync::Lazy;
use regex::Regex;

static PROMPT_CONCAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*prompt\s*=.*(?:\+\s*user_input\b|\{\s*user_input\s*\})").expect("static regex")
});

static DEF_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:async\s+)?def\s+\w+").expect("static regex"));

pub static USER_INPUT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\buser_input\b").expect("static regex"));

static SANITIZED_DEF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*sanitized_input\s*=[^=]").expect("static regex"));

static SANITIZED_PROMPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*prompt\s*=.*\bsanitized_input\b").expect("static regex"));

/// Identifiers that mark a file as talking to an LLM
pub const LLM_MARKERS: &[&str] = &["openai", "anthropic", "langchain", "litellm"];

pub const SANITIZED_NAME: &str = "sanitized_input";
pub const GUARD_RAISE: &str = "raise ValueError(\"Invalid request detected\")";

pub fn mentions_llm_client(content: &str) -> bool {
    LLM_MARKERS.iter().any(|m| content.contains(m))
}

pub fn is_prompt_concat(line: &str) -> bool {
    PROMPT_CONCAT.is_match(line)
}

/// 0-based index of the first prompt line built from raw `user_input`
pub fn first_prompt_line(lines: &[&str]) -> Option<usize> {
    lines.iter().position(|l| is_prompt_concat(l))
}

/// 0-based indices of every prompt line built from raw `user_input`
pub fn prompt_lines(lines: &[&str]) -> Vec<usize> {
    (0..lines.len()).filter(|&i| is_prompt_concat(lines[i])).collect()
}

pub fn indent_of(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

/// Index of the `def` whose body holds line `idx`, or `None` at module level.
///
/// Walks upwards through ever less indented lines; closing brackets of a
/// multi-line signature and comments do not end the walk.
pub fn enclosing_def(lines: &[&str], idx: usize) -> Option<usize> {
    let mut bound = indent_of(lines[idx]).len();
    for i in (0..idx).rev() {
        let trimmed = lines[i].trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with([')', ']', '}']) {
            continue;
        }
        let indent = indent_of(lines[i]).len();
        if indent >= bound {
            continue;
        }
        if DEF_LINE.is_match(lines[i]) {
            return Some(i);
        }
        if indent == 0 {
            return None;
        }
        bound = indent;
    }
    None
}

/// True if `sanitized_input` is assigned before line `idx` in the same scope
pub fn defines_sanitized_before(lines: &[&str], idx: usize) -> bool {
    let scope = enclosing_def(lines, idx);
    (0..idx).any(|i| SANITIZED_DEF.is_match(lines[i]) && enclosing_def(lines, i) == scope)
}

/// First prompt line that reads `sanitized_input` without assigning it earlier
/// in its own scope
pub fn undefined_sanitized_use(lines: &[&str]) -> Option<usize> {
    (0..lines.len())
        .find(|&i| SANITIZED_PROMPT.is_match(lines[i]) && !defines_sanitized_before(lines, i))
}

/// Where the sanitizing preamble goes for a prompt on line `prompt_idx`, and
/// the indentation to give it.
///
/// Inside a function the preamble goes at the top of the body, after any
/// docstring; at module level it goes right before the prompt line.
pub fn preamble_site(lines: &[&str], prompt_idx: usize) -> (usize, String) {
    let fallback = (prompt_idx, indent_of(lines[prompt_idx]).to_string());

    let Some(def_idx) = enclosing_def(lines, prompt_idx) else {
        return fallback;
    };

    // signatures may span several lines; the body starts after the line ending in ':'
    let Some(sig_end) = (def_idx..prompt_idx).find(|&i| strip_comment(lines[i]).ends_with(':'))
    else {
        return fallback;
    };

    let Some(body) = (sig_end + 1..=prompt_idx).find(|&i| !lines[i].trim().is_empty()) else {
        return fallback;
    };
    let indent = indent_of(lines[body]).to_string();
    (skip_docstring(lines, body, prompt_idx), indent)
}

fn strip_comment(line: &str) -> &str {
    line.split('#').next().unwrap_or(line).trim_end()
}

fn skip_docstring(lines: &[&str], body: usize, limit: usize) -> usize {
    let first = lines[body].trim_start();
    let Some(quote) = ["\"\"\"", "'''"].into_iter().find(|q| first.starts_with(q)) else {
        return body;
    };
    if first.len() >= 6 && first[3..].contains(quote) {
        return body + 1;
    }
    (body + 1..=limit)
        .find(|&i| lines[i].contains(quote))
        .map_or(body, |end| end + 1)
}
