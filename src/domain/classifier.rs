//! Weakness classifiers (CWE tags)

use serde::{Deserialize, Serialize};

/// Weakness category attached to a finding
///
/// The named variants select remediation logic. Anything else an external tool
/// reports is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Classifier {
    /// CWE-1427: improper neutralization of input used for LLM prompting
    PromptInjection,
    /// CWE-79: cross-site scripting
    CrossSiteScripting,
    /// CWE-862: missing authorization
    MissingAuthorization,
    /// CWE-94: code injection
    CodeInjection,
    Other(String),
}

impl Classifier {
    pub fn as_str(&self) -> &str {
        match self {
            Classifier::PromptInjection => "CWE-1427",
            Classifier::CrossSiteScripting => "CWE-79",
            Classifier::MissingAuthorization => "CWE-862",
            Classifier::CodeInjection => "CWE-94",
            Classifier::Other(tag) => tag,
        }
    }

    /// Parse a CWE tag. Accepts `CWE-79`, `cwe-79` and bare `79`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let number = trimmed
            .strip_prefix("CWE-")
            .or_else(|| trimmed.strip_prefix("cwe-"))
            .unwrap_or(trimmed);
        Some(match number {
            "1427" => Classifier::PromptInjection,
            "79" => Classifier::CrossSiteScripting,
            "862" => Classifier::MissingAuthorization,
            "94" => Classifier::CodeInjection,
            other if other.chars().all(|c| c.is_ascii_digit()) => {
                Classifier::Other(format!("CWE-{}", other))
            }
            _ => Classifier::Other(trimmed.to_string()),
        })
    }

    pub fn from_number(number: u32) -> Self {
        Self::from(number.to_string())
    }
}

impl From<String> for Classifier {
    fn from(raw: String) -> Self {
        Classifier::parse(&raw).unwrap_or(Classifier::Other(raw))
    }
}

impl From<Classifier> for String {
    fn from(classifier: Classifier) -> Self {
        classifier.as_str().to_string()
    }
}

impl std::fmt::Display for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
