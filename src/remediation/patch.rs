//! Fix artifacts: git-style unified diffs

use similar::TextDiff;

/// Unified diff of one file with a `diff --git` header, applicable with
/// `git apply` from the repository root.
pub fn unified_patch(relative_path: &str, before: &str, after: &str) -> String {
    let rel = relative_path.replace('\\', "/");
    let body = TextDiff::from_lines(before, after)
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{}", rel), &format!("b/{}", rel))
        .to_string();
    format!("diff --git a/{rel} b/{rel}\n{body}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_has_git_header_and_hunk() {
        let patch = unified_patch(
            "requirements.txt",
            "flask==2.0\nshopify-sdk==1.2.3\n",
            "flask==2.0\nshopify-sdk==2.0.1\n",
        );
        assert!(patch.starts_with("diff --git a/requirements.txt b/requirements.txt\n"));
        assert!(patch.contains("--- a/requirements.txt\n+++ b/requirements.txt\n"));
        assert!(patch.contains("@@ -1,2 +1,2 @@"));
        assert!(patch.contains("-shopify-sdk==1.2.3\n+shopify-sdk==2.0.1\n"));
    }
}
