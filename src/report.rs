use serde::Serialize;

/// Outcome of one validation pass. An empty issue list means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<String>,
}

impl ValidationReport {
    pub fn new(issues: Vec<String>) -> Self {
        ValidationReport { issues }
    }

    pub fn single(issue: impl Into<String>) -> Self {
        ValidationReport {
            issues: vec![issue.into()],
        }
    }

    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn status(&self) -> &'static str {
        if self.is_valid() {
            "VALID"
        } else {
            "INVALID"
        }
    }

    pub(crate) fn push(&mut self, issue: impl Into<String>) {
        self.issues.push(issue.into());
    }
}
