use serde::{Deserialize, Serialize};

/// Pass/fail outcome with the diagnostics that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceVerdict {
    passed: bool,
    messages: Vec<String>,
}

impl ComplianceVerdict {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            messages: vec![message.into()],
        }
    }

    pub fn fail(messages: Vec<String>) -> Self {
        Self {
            passed: false,
            messages,
        }
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn summary(&self) -> String {
        let outcome = if self.passed { "passed" } else { "failed" };
        if self.messages.is_empty() {
            outcome.to_string()
        } else {
            format!("{outcome}: {}", self.messages.join("; "))
        }
    }
}
