//! Command injection (CWE-94) in Ruby

use super::Verdict;
use crate::patterns::ruby::{self, ALLOW_LIST, ExecSite, GUARD_PREFIX, WRAPPER_MARKER, WRAPPER_SOURCE};
use crate::patterns::{join_lines, line_at, split_lines};

/// Insert the allow-list check for `site`. `None` when no expression in scope
/// carries the command.
fn insert_guard(content: &str, site: &ExecSite) -> Option<String> {
    let (lines, trailing) = split_lines(content);
    let site_idx = (line_at(content, site.offset) as usize)
        .saturating_sub(1)
        .min(lines.len().saturating_sub(1));
    let input = site
        .input
        .clone()
        .or_else(|| ruby::method_parameter(&lines, site_idx))?;
    let (insert_at, indent) = ruby::guard_site(&lines, site_idx);

    let mut out: Vec<String> = lines.iter().map(|l| (*l).to_string()).collect();
    out.insert(insert_at, format!("{}{}{})", indent, GUARD_PREFIX, input));
    out.insert(insert_at, format!("{}{}", indent, ALLOW_LIST));
    Some(join_lines(&out, trailing))
}

pub fn transform(content: &str) -> Option<String> {
    let site = ruby::first_exec_site(content)?;
    let mut rewritten = if content.contains(ALLOW_LIST) {
        content.to_string()
    } else {
        insert_guard(content, &site)?
    };
    rewritten = ruby::route_through_wrapper(&rewritten);

    if !rewritten.contains(WRAPPER_MARKER) {
        if !rewritten.ends_with('\n') {
            rewritten.push('\n');
        }
        rewritten.push('\n');
        rewritten.push_str(WRAPPER_SOURCE);
    }

    (rewritten != content).then_some(rewritten)
}

pub fn verify(content: &str) -> Verdict {
    if !content.contains(ALLOW_LIST) {
        return Verdict::failed("command allow-list is missing");
    }
    if !content.contains(GUARD_PREFIX) {
        return Verdict::failed("allow-list is never checked");
    }
    match ruby::first_exec_site(content) {
        Some(site) => Verdict::failed(format!(
            "line {} still executes a shell command directly",
            line_at(content, site.offset)
        )),
        None => Verdict::Passed,
    }
}
