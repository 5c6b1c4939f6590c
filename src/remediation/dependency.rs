//! Vulnerable dependency pins (CWE-862)

use std::path::Path;

use super::Verdict;
use crate::config::Advisory;

/// Advisories whose manifest has the same file name as `path`
pub fn advisories_for<'a>(path: &Path, advisories: &'a [Advisory]) -> Vec<&'a Advisory> {
    let Some(name) = path.file_name() else {
        return Vec::new();
    };
    advisories
        .iter()
        .filter(|a| Path::new(&a.manifest).file_name() == Some(name))
        .collect()
}

pub fn transform(content: &str, advisories: &[&Advisory]) -> Option<String> {
    let mut rewritten = content.to_string();
    for advisory in advisories {
        if rewritten.contains(&advisory.vulnerable) {
            rewritten = rewritten.replace(&advisory.vulnerable, &advisory.fixed);
        }
    }
    (rewritten != content).then_some(rewritten)
}

pub fn verify(content: &str, advisories: &[&Advisory]) -> Verdict {
    if let Some(left) = advisories.iter().find(|a| content.contains(&a.vulnerable)) {
        return Verdict::failed(format!("{} is still pinned", left.vulnerable));
    }
    if advisories.iter().any(|a| content.contains(&a.fixed)) {
        Verdict::Passed
    } else {
        Verdict::failed("no fixed version pinned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_advisories;

    #[test]
    fn test_replaces_every_pin() {
        let advisories = default_advisories();
        let applicable = advisories_for(Path::new("/repo/requirements.txt"), &advisories);
        assert_eq!(applicable.len(), 1);

        let src = "shopify-sdk==1.2.3\nflask\n# was shopify-sdk==1.2.3\n";
        let fixed = transform(src, &applicable).unwrap();
        assert_eq!(fixed, "shopify-sdk==2.0.1\nflask\n# was shopify-sdk==2.0.1\n");
        assert_eq!(verify(&fixed, &applicable), Verdict::Passed);
        assert_eq!(transform(&fixed, &applicable), None);
    }

    #[test]
    fn test_other_manifests_do_not_apply() {
        let advisories = default_advisories();
        assert!(advisories_for(Path::new("/repo/package.json"), &advisories).is_empty());
    }

    #[test]
    fn test_verify_failures() {
        let advisories = default_advisories();
        let applicable = advisories_for(Path::new("requirements.txt"), &advisories);
        assert_eq!(
            verify("shopify-sdk==1.2.3\n", &applicable),
            Verdict::Failed("shopify-sdk==1.2.3 is still pinned".to_string())
        );
        assert_eq!(
            verify("flask\n", &applicable),
            Verdict::Failed("no fixed version pinned".to_string())
        );
    }
}
