//! Finding - a candidate weakness produced by an analyzer, before persistence

use std::path::PathBuf;

use super::{Classifier, Severity};

/// A candidate weakness surfaced by a heuristic or an external tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Stable text; together with `file_path` it identifies the issue
    pub description: String,
    pub file_path: PathBuf,
    pub line: Option<u32>,
    pub classifier: Option<Classifier>,
    pub severity: Severity,
    pub score: Option<String>,
    /// Heuristic or tool that produced this finding (not part of the identity)
    pub source: &'static str,
}

impl Finding {
    pub fn new(
        source: &'static str,
        description: impl Into<String>,
        file_path: impl Into<PathBuf>,
        severity: Severity,
    ) -> Self {
        Self {
            description: description.into(),
            file_path: file_path.into(),
            line: None,
            classifier: None,
            severity,
            score: None,
            source,
        }
    }

    pub fn with_line(mut self, line: Option<u32>) -> Self {
        self.line = line;
        self
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_optional_classifier(mut self, classifier: Option<Classifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_score(mut self, score: impl Into<String>) -> Self {
        self.score = Some(score.into());
        self
    }
}
