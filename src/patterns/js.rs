//! Raw-HTML sink assignments in JavaScript/TypeScript
//!
//! A sink assignment is `x.innerHTML = <expr>` (or `outerHTML`, or `+=`). The
//! right-hand side is split at top-level `+` into operands; an operand is unsafe
//! when it is dynamic and not wrapped in a known escaping call. Template literals
//! are unsafe when any `${…}` interpolation is unescaped.

use once_cell::sync::Lazy;
use regex::Regex;

static SINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:innerHTML|outerHTML)\s*\+?=").expect("static regex"));

/// Calls treated as HTML escaping
pub const ESCAPE_CALLS: &[&str] = &["sanitize(", "escapeHtml(", "escape(", "DOMPurify.sanitize("];

/// Name of the helper the fix injects
pub const HELPER_NAME: &str = "sanitize";

/// Marker used to detect the injected helper
pub const HELPER_MARKER: &str = "const sanitize = (str)";

pub const HELPER_SOURCE: &str = "const sanitize = (str) => String(str).replace(/&/g, '&amp;').replace(/</g, '&lt;').replace(/>/g, '&gt;').replace(/\"/g, '&quot;').replace(/'/g, '&#39;');";

/// Byte range of a sink assignment's right-hand side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkAssignment {
    pub start: usize,
    pub end: usize,
    /// 1-based line of the sink
    pub line: u32,
}

impl SinkAssignment {
    pub fn expression<'a>(&self, content: &'a str) -> &'a str {
        &content[self.start..self.end]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand<'a> {
    Literal(&'a str),
    Template(&'a str),
    Escaped(&'a str),
    Dynamic(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ctx {
    Code { parens: u32, braces: u32 },
    Single,
    Double,
    Template,
}

pub fn line_of(content: &str, offset: usize) -> u32 {
    content[..offset].matches('\n').count() as u32 + 1
}

/// All sink assignments in a file, in source order
pub fn sink_assignments(content: &str) -> Vec<SinkAssignment> {
    let mut sinks = Vec::new();
    for m in SINK.find_iter(content) {
        // `innerHTML == x` is a comparison
        if content[m.end()..].starts_with('=') {
            continue;
        }
        let rest = &content[m.end()..];
        let start = m.end() + (rest.len() - rest.trim_start().len());
        let end = expression_end(content, start);
        let trimmed_end = start + content[start..end].trim_end().len();
        if trimmed_end > start {
            sinks.push(SinkAssignment {
                start,
                end: trimmed_end,
                line: line_of(content, m.start()),
            });
        }
    }
    sinks
}

/// Offset where the expression starting at `start` ends
fn expression_end(content: &str, start: usize) -> usize {
    let mut stack = vec![Ctx::Code { parens: 0, braces: 0 }];
    let mut escaped = false;
    let mut chars = content[start..].char_indices().peekable();

    while let Some((rel, c)) = chars.next() {
        let i = start + rel;
        if escaped {
            escaped = false;
            continue;
        }
        let depth = stack.len();
        let Some(top) = stack.last_mut() else {
            return content.len();
        };
        match top {
            Ctx::Single | Ctx::Double => {
                let quote = if *top == Ctx::Single { '\'' } else { '"' };
                if c == '\\' {
                    escaped = true;
                } else if c == quote || c == '\n' {
                    stack.pop();
                }
            }
            Ctx::Template => {
                if c == '\\' {
                    escaped = true;
                } else if c == '`' {
                    stack.pop();
                } else if c == '$' && chars.peek().map(|(_, n)| *n) == Some('{') {
                    chars.next();
                    stack.push(Ctx::Code { parens: 0, braces: 0 });
                }
            }
            Ctx::Code { parens, braces } => {
                let top_level = depth == 1 && *parens == 0 && *braces == 0;
                match c {
                    '\'' => stack.push(Ctx::Single),
                    '"' => stack.push(Ctx::Double),
                    '`' => stack.push(Ctx::Template),
                    '(' | '[' => *parens += 1,
                    ')' | ']' => {
                        if *parens == 0 {
                            if depth == 1 {
                                return i;
                            }
                        } else {
                            *parens -= 1;
                        }
                    }
                    '{' => *braces += 1,
                    '}' => {
                        if *braces == 0 {
                            if depth == 1 {
                                return i;
                            }
                            stack.pop();
                        } else {
                            *braces -= 1;
                        }
                    }
                    ';' | ',' if top_level => return i,
                    '\n' if top_level && !continues_after_newline(content, start, i) => return i,
                    _ => {}
                }
            }
        }
    }
    content.len()
}

/// A newline does not end the expression when the line ends with `+` or the
/// next line starts with one.
fn continues_after_newline(content: &str, start: usize, newline: usize) -> bool {
    let before = content[start..newline].trim_end();
    let after = content[newline + 1..].trim_start();
    before.ends_with('+') || before.is_empty() || after.starts_with('+')
}

/// Split an expression at top-level `+`
fn split_operands(expr: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut stack = vec![Ctx::Code { parens: 0, braces: 0 }];
    let mut escaped = false;
    let mut last = 0;
    let mut chars = expr.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if escaped {
            escaped = false;
            continue;
        }
        let depth = stack.len();
        let Some(top) = stack.last_mut() else {
            break;
        };
        match top {
            Ctx::Single | Ctx::Double => {
                let quote = if *top == Ctx::Single { '\'' } else { '"' };
                if c == '\\' {
                    escaped = true;
                } else if c == quote {
                    stack.pop();
                }
            }
            Ctx::Template => {
                if c == '\\' {
                    escaped = true;
                } else if c == '`' {
                    stack.pop();
                } else if c == '$' && chars.peek().map(|(_, n)| *n) == Some('{') {
                    chars.next();
                    stack.push(Ctx::Code { parens: 0, braces: 0 });
                }
            }
            Ctx::Code { parens, braces } => match c {
                '\'' => stack.push(Ctx::Single),
                '"' => stack.push(Ctx::Double),
                '`' => stack.push(Ctx::Template),
                '(' | '[' => *parens += 1,
                ')' | ']' => *parens = parens.saturating_sub(1),
                '{' => *braces += 1,
                '}' => {
                    if *braces == 0 {
                        if depth > 1 {
                            stack.pop();
                        }
                    } else {
                        *braces -= 1;
                    }
                }
                '+' if depth == 1 && *parens == 0 && *braces == 0 => {
                    parts.push(&expr[last..i]);
                    last = i + 1;
                }
                _ => {}
            },
        }
    }
    parts.push(&expr[last..]);
    parts
}

fn is_escaped_call(text: &str) -> bool {
    ESCAPE_CALLS.iter().any(|call| text.starts_with(call))
}

fn classify(operand: &str) -> Operand<'_> {
    let t = operand.trim();
    let quoted = |q: char| t.len() >= 2 && t.starts_with(q) && t.ends_with(q);
    if quoted('\'') || quoted('"') {
        Operand::Literal(t)
    } else if quoted('`') {
        Operand::Template(t)
    } else if is_escaped_call(t) {
        Operand::Escaped(t)
    } else {
        Operand::Dynamic(t)
    }
}

/// Byte ranges of the expressions inside `${…}` of a template literal
fn interpolations(template: &str) -> Vec<(usize, usize)> {
    let bytes = template.as_bytes();
    let mut ranges = Vec::new();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'\\' {
            i += 2;
            continue;
        }
        if bytes[i] == b'$' && bytes[i + 1] == b'{' {
            let inner_start = i + 2;
            let mut depth = 0usize;
            let mut j = inner_start;
            while j < bytes.len() {
                match bytes[j] {
                    b'{' => depth += 1,
                    b'}' if depth == 0 => break,
                    b'}' => depth -= 1,
                    _ => {}
                }
                j += 1;
            }
            ranges.push((inner_start, j));
            i = j + 1;
            continue;
        }
        i += 1;
    }
    ranges
}

fn template_is_unsafe(template: &str) -> bool {
    interpolations(template)
        .into_iter()
        .any(|(s, e)| !is_escaped_call(template[s..e].trim()))
}

fn escape_template(template: &str) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut last = 0;
    for (s, e) in interpolations(template) {
        let inner = template[s..e].trim();
        out.push_str(&template[last..s]);
        if is_escaped_call(inner) {
            out.push_str(inner);
        } else {
            out.push_str(&format!("{}({})", HELPER_NAME, inner));
        }
        last = e;
    }
    out.push_str(&template[last..]);
    out
}

/// Returns true if a sink's right-hand side is built from a template or a
/// concatenation and still contains an unescaped dynamic part
pub fn needs_escaping(expr: &str) -> bool {
    let operands = split_operands(expr);
    if operands.len() == 1 {
        return match classify(operands[0]) {
            Operand::Template(t) => template_is_unsafe(t),
            _ => false,
        };
    }
    operands.into_iter().any(|op| match classify(op) {
        Operand::Dynamic(t) => !t.is_empty(),
        Operand::Template(t) => template_is_unsafe(t),
        Operand::Literal(_) | Operand::Escaped(_) => false,
    })
}

/// Rewrite a sink's right-hand side so every dynamic part goes through the helper
pub fn escape_expression(expr: &str) -> String {
    let operands = split_operands(expr);
    if operands.len() == 1 {
        return match classify(operands[0]) {
            Operand::Template(t) => escape_template(t),
            _ => expr.to_string(),
        };
    }
    operands
        .into_iter()
        .map(|op| match classify(op) {
            Operand::Literal(t) | Operand::Escaped(t) => t.to_string(),
            Operand::Template(t) => escape_template(t),
            Operand::Dynamic(t) => format!("{}({})", HELPER_NAME, t),
        })
        .collect::<Vec<_>>()
        .join(" + ")
}

/// First sink assignment that still needs escaping
pub fn first_unsafe_sink(content: &str) -> Option<SinkAssignment> {
    sink_assignments(content)
        .into_iter()
        .find(|s| needs_escaping(s.expression(content)))
}

/// Offset after a shebang line and any directive prologue (`'use strict';`)
pub fn helper_insertion_offset(content: &str) -> usize {
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let t = line.trim();
        let is_shebang = offset == 0 && t.starts_with("#!");
        let is_directive = (t.starts_with("'use ") || t.starts_with("\"use "))
            && (t.ends_with(';') || t.ends_with('\'') || t.ends_with('"'));
        if is_shebang || is_directive {
            offset += line.len();
        } else {
            break;
        }
    }
    offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_template_and_concatenation_sinks() {
        let src = "const a = 1;\nel.innerHTML = `<p>${name}</p>`;\nbox.outerHTML = '<b>' + title + '</b>';\n";
        let sinks = sink_assignments(src);
        assert_eq!(sinks.len(), 2);
        assert_eq!(sinks[0].expression(src), "`<p>${name}</p>`");
        assert_eq!(sinks[0].line, 2);
        assert_eq!(sinks[1].expression(src), "'<b>' + title + '</b>'");
        assert_eq!(sinks[1].line, 3);
    }

    #[test]
    fn test_comparison_is_not_a_sink() {
        assert!(sink_assignments("if (el.innerHTML === '') {}\n").is_empty());
    }

    #[test]
    fn test_multiline_template_and_continued_concatenation() {
        let src = "el.innerHTML = `\n  <div>${item.title}</div>\n`;\nother();\n";
        let sinks = sink_assignments(src);
        assert_eq!(sinks[0].expression(src), "`\n  <div>${item.title}</div>\n`");

        let src = "el.innerHTML = '<li>' +\n  label +\n  '</li>';\n";
        let sinks = sink_assignments(src);
        assert_eq!(sinks[0].expression(src), "'<li>' +\n  label +\n  '</li>'");
    }

    #[test]
    fn test_needs_escaping_rules() {
        assert!(needs_escaping("`<p>${name}</p>`"));
        assert!(!needs_escaping("`<p>${sanitize(name)}</p>`"));
        assert!(!needs_escaping("`<p>static</p>`"));
        assert!(needs_escaping("'<b>' + title"));
        assert!(!needs_escaping("'<b>' + escapeHtml(title)"));
        assert!(!needs_escaping("'<b>' + '</b>'"));
        // plain assignment is out of scope for the heuristic
        assert!(!needs_escaping("markup"));
    }

    #[test]
    fn test_escape_expression_wraps_only_dynamic_parts() {
        assert_eq!(
            escape_expression("`<p>${ user.name }</p><i>${sanitize(x)}</i>`"),
            "`<p>${sanitize(user.name)}</p><i>${sanitize(x)}</i>`"
        );
        assert_eq!(
            escape_expression("'<b>' + title + `<i>${x}</i>`"),
            "'<b>' + sanitize(title) + `<i>${sanitize(x)}</i>`"
        );
    }

    #[test]
    fn test_nested_braces_in_interpolation() {
        let expr = "`<p>${fmt({ a: 1 })}</p>`";
        assert_eq!(escape_expression(expr), "`<p>${sanitize(fmt({ a: 1 }))}</p>`");
    }

    #[test]
    fn test_helper_goes_after_directives() {
        let src = "#!/usr/bin/env node\n'use strict';\nconst x = 1;\n";
        let offset = helper_insertion_offset(src);
        assert_eq!(&src[offset..], "const x = 1;\n");
        assert_eq!(helper_insertion_offset("const x = 1;\n"), 0);
    }
}
