//! Issue model - a persisted, deduplicated finding with a lifecycle state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::{Classifier, Domain, Ecosystem};

/// Severity levels for issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }

    /// Sort weight; higher is more urgent
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 4,
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of an issue, in forward order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueState {
    Submitted,
    #[serde(rename = "Gathering Context")]
    GatheringContext,
    #[serde(rename = "Detecting Domain")]
    DetectingDomain,
    Analyzing,
    Triaging,
    #[serde(rename = "Planning Remediation")]
    PlanningRemediation,
    Fixing,
    Verifying,
    Complete,
    Failed,
}

impl IssueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueState::Submitted => "Submitted",
            IssueState::GatheringContext => "Gathering Context",
            IssueState::DetectingDomain => "Detecting Domain",
            IssueState::Analyzing => "Analyzing",
            IssueState::Triaging => "Triaging",
            IssueState::PlanningRemediation => "Planning Remediation",
            IssueState::Fixing => "Fixing",
            IssueState::Verifying => "Verifying",
            IssueState::Complete => "Complete",
            IssueState::Failed => "Failed",
        }
    }

    /// Position in the forward order. Both terminal states share the last rank.
    pub fn rank(&self) -> u8 {
        match self {
            IssueState::Submitted => 0,
            IssueState::GatheringContext => 1,
            IssueState::DetectingDomain => 2,
            IssueState::Analyzing => 3,
            IssueState::Triaging => 4,
            IssueState::PlanningRemediation => 5,
            IssueState::Fixing => 6,
            IssueState::Verifying => 7,
            IssueState::Complete | IssueState::Failed => 8,
        }
    }

    /// Returns true if no transition may leave this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, IssueState::Complete | IssueState::Failed)
    }

    /// Forward-only rule shared by every transition in the engine
    pub fn can_advance_to(&self, next: IssueState) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}

impl std::fmt::Display for IssueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked security issue
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRecord {
    /// Sequential per repository, e.g. "007"
    pub id: String,
    pub repo_path: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, rename = "cwe", skip_serializing_if = "Option::is_none")]
    pub classifier: Option<Classifier>,
    pub severity: Severity,
    /// CVSS vector, when known
    #[serde(default, rename = "cvss", skip_serializing_if = "Option::is_none")]
    pub score: Option<String>,
    pub state: IssueState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<Domain>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech_stack: Option<Vec<Ecosystem>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation_plan: Option<String>,
    #[serde(default, rename = "fixPatchPath", skip_serializing_if = "Option::is_none")]
    pub fix_artifact: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl IssueRecord {
    /// Create a new issue in `Submitted`
    pub fn new(
        id: impl Into<String>,
        repo_path: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            repo_path: repo_path.into(),
            description: description.into(),
            file_path: None,
            line: None,
            classifier: None,
            severity,
            score: None,
            state: IssueState::Submitted,
            domain: None,
            tech_stack: None,
            created_at: now,
            updated_at: now,
            remediation_plan: None,
            fix_artifact: None,
            notes: None,
        }
    }

    /// Format a sequence number as an issue id
    pub fn format_id(number: u32) -> String {
        format!("{:03}", number)
    }

    /// Numeric value of the id, if it has one
    pub fn number(&self) -> Option<u32> {
        self.id.parse().ok()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    // Builder methods
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn with_line(mut self, line: Option<u32>) -> Self {
        self.line = line;
        self
    }

    pub fn with_classifier(mut self, classifier: Option<Classifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_score(mut self, score: Option<String>) -> Self {
        self.score = score;
        self
    }

    pub fn with_context(mut self, domain: Option<Domain>, tech: Option<Vec<Ecosystem>>) -> Self {
        self.domain = domain;
        self.tech_stack = tech;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_builder() {
        let issue = IssueRecord::new("001", "/srv/shop", "XSS in preview", Severity::Medium)
            .with_file("/srv/shop/preview.js")
            .with_line(Some(12))
            .with_classifier(Some(Classifier::CrossSiteScripting));

        assert_eq!(issue.id, "001");
        assert_eq!(issue.state, IssueState::Submitted);
        assert_eq!(issue.number(), Some(1));
        assert_eq!(issue.classifier, Some(Classifier::CrossSiteScripting));
    }

    #[test]
    fn test_format_id_pads_to_three_digits() {
        assert_eq!(IssueRecord::format_id(1), "001");
        assert_eq!(IssueRecord::format_id(42), "042");
        assert_eq!(IssueRecord::format_id(1000), "1000");
    }

    #[test]
    fn test_forward_only_transitions() {
        assert!(IssueState::Submitted.can_advance_to(IssueState::Triaging));
        assert!(IssueState::Submitted.can_advance_to(IssueState::PlanningRemediation));
        assert!(IssueState::Fixing.can_advance_to(IssueState::Failed));
        assert!(!IssueState::Verifying.can_advance_to(IssueState::Fixing));
        assert!(!IssueState::Triaging.can_advance_to(IssueState::Triaging));
        assert!(!IssueState::Complete.can_advance_to(IssueState::Failed));
        assert!(!IssueState::Failed.can_advance_to(IssueState::Complete));
    }

    #[test]
    fn test_state_serializes_with_display_spelling() {
        let json = serde_json::to_string(&IssueState::PlanningRemediation).unwrap();
        assert_eq!(json, "\"Planning Remediation\"");
        let back: IssueState = serde_json::from_str("\"Gathering Context\"").unwrap();
        assert_eq!(back, IssueState::GatheringContext);
    }

    #[test]
    fn test_severity_rank_orders_critical_first() {
        let mut all = vec![Severity::Low, Severity::Critical, Severity::Medium, Severity::High];
        all.sort_by_key(|s| std::cmp::Reverse(s.rank()));
        assert_eq!(all, vec![Severity::Critical, Severity::High, Severity::Medium, Severity::Low]);
    }
}
