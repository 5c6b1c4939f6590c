//! Cross-site scripting (CWE-79) in JavaScript/TypeScript

use super::Verdict;
use crate::patterns::js::{self, HELPER_MARKER, HELPER_SOURCE};

pub fn transform(content: &str) -> Option<String> {
    let unsafe_sinks: Vec<_> = js::sink_assignments(content)
        .into_iter()
        .filter(|sink| js::needs_escaping(sink.expression(content)))
        .collect();
    if unsafe_sinks.is_empty() {
        return None;
    }

    let mut rewritten = content.to_string();
    // back to front so earlier offsets stay valid
    for sink in unsafe_sinks.iter().rev() {
        let expr = sink.expression(content);
        rewritten.replace_range(sink.start..sink.end, &js::escape_expression(expr));
    }

    if !rewritten.contains(HELPER_MARKER) {
        let at = js::helper_insertion_offset(&rewritten);
        rewritten.insert_str(at, &format!("{}\n", HELPER_SOURCE));
    }

    (rewritten != content).then_some(rewritten)
}

pub fn verify(content: &str) -> Verdict {
    if !content.contains(HELPER_MARKER) {
        return Verdict::failed("sanitize helper is missing");
    }
    match js::first_unsafe_sink(content) {
        Some(sink) => Verdict::failed(format!("line {} still injects unescaped markup", sink.line)),
        None => Verdict::Passed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escapes_template_and_concatenation() {
        let src = "const list = document.getElementById('list');\nlist.innerHTML = `<li>${item.name}</li>`;\nlist.outerHTML = '<ul>' + body + '</ul>';\n";
        let fixed = transform(src).unwrap();

        let lines: Vec<&str> = fixed.lines().collect();
        assert_eq!(lines[0], HELPER_SOURCE);
        assert_eq!(lines[2], "list.innerHTML = `<li>${sanitize(item.name)}</li>`;");
        assert_eq!(lines[3], "list.outerHTML = '<ul>' + sanitize(body) + '</ul>';");
        assert_eq!(verify(&fixed), Verdict::Passed);
    }

    #[test]
    fn test_reapplying_changes_nothing() {
        let src = "el.innerHTML = `<p>${msg}</p>`;\n";
        let fixed = transform(src).unwrap();
        assert_eq!(transform(&fixed), None);
    }

    #[test]
    fn test_no_unsafe_sink_leaves_file_alone() {
        assert_eq!(transform("el.textContent = name;\n"), None);
        assert_eq!(transform("el.innerHTML = '<b>static</b>';\n"), None);
        assert_eq!(transform("el.innerHTML = `<b>${escapeHtml(name)}</b>`;\n"), None);
    }

    #[test]
    fn test_helper_after_use_strict() {
        let src = "'use strict';\nel.innerHTML = '<b>' + title;\n";
        let fixed = transform(src).unwrap();
        assert!(fixed.starts_with(&format!("'use strict';\n{}\n", HELPER_SOURCE)));
    }

    #[test]
    fn test_verify_flags_remaining_sink() {
        let src = format!("{}\nel.innerHTML = `<p>${{raw}}</p>`;\n", HELPER_SOURCE);
        assert_eq!(
            verify(&src),
            Verdict::Failed("line 2 still injects unescaped markup".to_string())
        );
        assert_eq!(
            verify("el.innerHTML = 'static';\n"),
            Verdict::Failed("sanitize helper is missing".to_string())
        );
    }
}
