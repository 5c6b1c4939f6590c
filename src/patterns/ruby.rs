//! Shell execution sites in Ruby sources

use once_cell::sync::Lazy;
use regex::Regex;

/// `system(` / `exec(` not called as a method on another receiver
static EXEC_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[^.\w])(system|exec)(\s*\()").expect("static regex"));

static BACKTICK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`([^`\n]*#\{[^}\n]*\}[^`\n]*)`").expect("static regex"));

static PERCENT_X: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%x\(([^)\n]*#\{[^}\n]*\}[^)\n]*)\)").expect("static regex"));

static INTERPOLATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#\{([^}\n]+)\}").expect("static regex"));

static DEF_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*def\s+").expect("static regex"));

/// First plain parameter of a `def` line, with or without parentheses
static FIRST_PARAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*def\s+(?:self\.)?[\w?!=]+(?:\s*\(\s*|\s+)([a-z_]\w*)").expect("static regex")
});

pub const ALLOW_LIST: &str = "allowed_commands = ['update', 'check', 'create']";
pub const GUARD_PREFIX: &str = "raise ArgumentError, 'Invalid command' unless allowed_commands.include?(";
pub const WRAPPER_MARKER: &str = "def safe_execute(";

pub const WRAPPER_SOURCE: &str = "\
def safe_execute(command)
  require 'open3'
  argv = command.to_s.split
  raise ArgumentError, 'Invalid command' if argv.empty?
  stdout, status = Open3.capture2(*argv)
  raise \"Command failed: #{argv.first}\" unless status.success?
  stdout
end
";

/// A shell execution site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecSite {
    /// Byte offset of the site
    pub offset: usize,
    /// Expression that feeds the command, when one can be identified
    pub input: Option<String>,
}

/// Earliest execution site in the file
pub fn first_exec_site(content: &str) -> Option<ExecSite> {
    let call = EXEC_CALL.captures(content).and_then(|caps| {
        let name = caps.get(2)?;
        let open = caps.get(0)?.end();
        let args = call_arguments(content, open);
        Some(ExecSite {
            offset: name.start(),
            input: input_from_arguments(args),
        })
    });
    let substitution = [&*BACKTICK, &*PERCENT_X].into_iter().filter_map(|re| {
        let caps = re.captures(content)?;
        let whole = caps.get(0)?;
        let body = caps.get(1)?.as_str();
        Some(ExecSite {
            offset: whole.start(),
            input: first_interpolation(body),
        })
    });

    call.into_iter()
        .chain(substitution)
        .min_by_key(|site| site.offset)
}

/// Text between the `(` ending at `open` and its matching `)`
fn call_arguments(content: &str, open: usize) -> &str {
    let mut depth = 0usize;
    for (i, c) in content[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => return &content[open..open + i],
            ')' => depth -= 1,
            '\n' if depth == 0 => return &content[open..open + i],
            _ => {}
        }
    }
    &content[open..]
}

fn first_interpolation(text: &str) -> Option<String> {
    INTERPOLATION
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

fn input_from_arguments(args: &str) -> Option<String> {
    if let Some(expr) = first_interpolation(args) {
        return Some(expr);
    }
    let first = args.split(',').next().unwrap_or("").trim();
    let quoted = first.starts_with('"') || first.starts_with('\'') || first.starts_with('%');
    if first.is_empty() || quoted {
        None
    } else {
        Some(first.to_string())
    }
}

/// Rewrite every execution site to go through `safe_execute`
pub fn route_through_wrapper(content: &str) -> String {
    let rewritten = EXEC_CALL.replace_all(content, "${1}safe_execute${3}");
    let rewritten = BACKTICK.replace_all(&rewritten, |caps: &regex::Captures| {
        format!("safe_execute(\"{}\")", caps[1].replace('"', "\\\""))
    });
    PERCENT_X
        .replace_all(&rewritten, |caps: &regex::Captures| {
            format!("safe_execute(\"{}\")", caps[1].replace('"', "\\\""))
        })
        .into_owned()
}

fn enclosing_def(lines: &[&str], site_idx: usize) -> Option<usize> {
    let site_indent = indent_of(lines[site_idx]).len();
    (0..site_idx)
        .rev()
        .find(|&i| DEF_LINE.is_match(lines[i]) && indent_of(lines[i]).len() < site_indent)
}

/// First parameter of the method around line `site_idx`; splats, blocks and
/// parameterless methods yield `None`
pub fn method_parameter(lines: &[&str], site_idx: usize) -> Option<String> {
    let def_idx = enclosing_def(lines, site_idx)?;
    FIRST_PARAM
        .captures(lines[def_idx])
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Where the allow-list goes for a site on line `site_idx`, and its indentation
pub fn guard_site(lines: &[&str], site_idx: usize) -> (usize, String) {
    let site_indent = indent_of(lines[site_idx]);
    let def_idx = enclosing_def(lines, site_idx);

    let body = def_idx.and_then(|d| (d + 1..=site_idx).find(|&i| !lines[i].trim().is_empty()));
    match (def_idx, body) {
        (Some(d), Some(b)) => (d + 1, indent_of(lines[b]).to_string()),
        _ => (site_idx, site_indent.to_string()),
    }
}

pub fn indent_of(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}
