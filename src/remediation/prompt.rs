//! Prompt injection (CWE-1427) in Python
//!
//! Inserts a sanitizing preamble and routes the prompt through it.

use super::Verdict;
use crate::patterns::python::{self, GUARD_RAISE, SANITIZED_NAME, USER_INPUT};
use crate::patterns::{join_lines, split_lines};

fn preamble(indent: &str) -> Vec<String> {
    let inner = if indent.contains('\t') {
        format!("{}\t", indent)
    } else {
        format!("{}    ", indent)
    };
    vec![
        format!("{}import re", indent),
        format!(
            r#"{}{} = re.sub(r"[\x00-\x1f\x7f;]", "", str(user_input))"#,
            indent, SANITIZED_NAME
        ),
        format!(
            r#"{}if any(keyword in {}.lower() for keyword in ("ignore", "system")):"#,
            indent, SANITIZED_NAME
        ),
        format!("{}{}", inner, GUARD_RAISE),
    ]
}

/// Give every scope that builds a prompt from `user_input` its own preamble,
/// then switch those prompt lines to the sanitized name.
pub fn transform(content: &str) -> Option<String> {
    let (lines, trailing) = split_lines(content);
    let prompts = python::prompt_lines(&lines);
    if prompts.is_empty() {
        return None;
    }

    let mut sites: Vec<(usize, String)> = prompts
        .iter()
        .filter(|&&idx| !python::defines_sanitized_before(&lines, idx))
        .map(|&idx| python::preamble_site(&lines, idx))
        .collect();
    sites.dedup_by_key(|(at, _)| *at);

    let mut out: Vec<String> = Vec::with_capacity(lines.len() + 4 * sites.len());
    for (idx, line) in lines.iter().enumerate() {
        if let Some((_, indent)) = sites.iter().find(|(at, _)| *at == idx) {
            out.extend(preamble(indent));
        }
        if python::is_prompt_concat(line) {
            out.push(USER_INPUT.replace_all(line, SANITIZED_NAME).into_owned());
        } else {
            out.push((*line).to_string());
        }
    }
    Some(join_lines(&out, trailing))
}

pub fn verify(content: &str) -> Verdict {
    if !content.contains(SANITIZED_NAME) {
        return Verdict::failed("sanitized_input is not defined");
    }
    if !content.contains(GUARD_RAISE) {
        return Verdict::failed("no guard rejecting dangerous directives");
    }
    let (lines, _) = split_lines(content);
    if let Some(idx) = python::first_prompt_line(&lines) {
        return Verdict::failed(format!("line {} still builds the prompt from raw input", idx + 1));
    }
    match python::undefined_sanitized_use(&lines) {
        Some(idx) => Verdict::failed(format!(
            "line {} uses sanitized_input before it is defined",
            idx + 1
        )),
        None => Verdict::Passed,
    }
}
