//! Per-step outcomes and the console report.

use std::fmt;

use serde_json::Value;

use crate::rest::ApiResponse;

pub const PASS_GLYPH: &str = "✅";
pub const FAIL_GLYPH: &str = "❌";

#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub label: String,
    pub status: u16,
    pub passed: bool,
    /// Why a step with a successful status still failed
    pub reason: Option<String>,
    /// Raw body, kept for failed steps only
    pub body: Option<Value>,
}

impl StepOutcome {
    pub fn pass(label: impl Into<String>, status: u16) -> Self {
        Self {
            label: label.into(),
            status,
            passed: true,
            reason: None,
            body: None,
        }
    }

    pub fn fail(label: impl Into<String>, response: &ApiResponse, reason: Option<String>) -> Self {
        Self {
            label: label.into(),
            status: response.status,
            passed: false,
            reason,
            body: Some(response.json.clone()),
        }
    }

    /// Pass iff the status is 2xx.
    pub fn from_status(label: impl Into<String>, response: &ApiResponse) -> Self {
        if response.is_success() {
            Self::pass(label, response.status)
        } else {
            Self::fail(label, response, None)
        }
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let glyph = if self.passed { PASS_GLYPH } else { FAIL_GLYPH };
        write!(f, "{} {} → status {}", glyph, self.label, self.status)?;
        if let Some(reason) = &self.reason {
            write!(f, " ({})", reason)?;
        }
        if let Some(body) = &self.body {
            write!(f, " {}", body)?;
        }
        Ok(())
    }
}

/// Collected outcomes of one run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub steps: Vec<StepOutcome>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Print the outcome line and keep it. Returns whether the step passed.
    pub fn record(&mut self, outcome: StepOutcome) -> bool {
        println!("{}", outcome);
        let passed = outcome.passed;
        self.steps.push(outcome);
        passed
    }

    pub fn passed(&self) -> usize {
        self.steps.iter().filter(|s| s.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.steps.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    pub fn summary(&self) -> String {
        format!("   {}/{} checks passed", self.passed(), self.steps.len())
    }

    pub fn step(&self, label: &str) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| s.label == label)
    }
}
