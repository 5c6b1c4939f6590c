//! Heuristic ecosystem and business-domain detection

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::domain::{Domain, Ecosystem};

/// Manifest markers per ecosystem, in reporting order
const ECOSYSTEM_MARKERS: &[(Ecosystem, &[&str])] = &[
    (Ecosystem::JavaScript, &["package.json"]),
    (Ecosystem::Python, &["requirements.txt", "pyproject.toml"]),
    (Ecosystem::Ruby, &["Gemfile"]),
    (Ecosystem::Go, &["go.mod"]),
    (Ecosystem::Rust, &["Cargo.toml"]),
    (Ecosystem::Php, &["composer.json"]),
    (Ecosystem::Java, &["pom.xml", "build.gradle"]),
];

const README_CANDIDATES: &[&str] = &["README.md", "README", "README.txt", "docs/README.md"];

static AI_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bai\b").expect("static regex"));

/// Ecosystems whose manifest exists at the repository root
pub fn detect_tech_stack(root: &Path) -> Vec<Ecosystem> {
    ECOSYSTEM_MARKERS
        .iter()
        .filter(|(_, markers)| markers.iter().any(|m| root.join(m).is_file()))
        .map(|(ecosystem, _)| *ecosystem)
        .collect()
}

/// Domain inferred from README-like files; `Unspecified` when nothing matches
pub fn detect_domain(root: &Path) -> Domain {
    let text = README_CANDIDATES
        .iter()
        .filter_map(|name| std::fs::read_to_string(root.join(name)).ok())
        .collect::<Vec<_>>()
        .join("\n")
        .to_lowercase();

    classify_domain(&text)
}

/// Keyword families in priority order: commerce > AI > payments > content
pub fn classify_domain(lower: &str) -> Domain {
    let any = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if any(&["shopify", "e-commerce", "ecommerce", "storefront"]) {
        Domain::Commerce
    } else if any(&["openai", "llm", "gpt"]) || AI_WORD.is_match(lower) {
        Domain::AiIntegration
    } else if any(&["payment", "stripe"]) {
        Domain::Payments
    } else if any(&["cms", "content"]) {
        Domain::Content
    } else {
        Domain::Unspecified
    }
}
