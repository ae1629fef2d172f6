use serde::{Deserialize, Serialize};

use super::InstitutionRecord;

/// One labeled gold-standard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: String,
    pub dataset: String,
    pub query: String,
    #[serde(default)]
    pub expected_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeClass {
    Match,
    PrecisionError,
    RecallError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub test_id: String,
    pub query: String,
    pub institution_id: String,
    pub sut: Option<InstitutionRecord>,
    pub expected: Option<InstitutionRecord>,
    pub classification: OutcomeClass,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSummary {
    pub id: String,
    pub query: String,
    pub is_passing: bool,
    pub matches: usize,
    pub precision_errors: usize,
    pub recall_errors: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalMetrics {
    pub total: usize,
    pub passing: usize,
    pub failing: usize,
    pub percentage_passing: f64,
    pub precision: f64,
    pub recall: f64,
    pub matches: usize,
    pub precision_errors: usize,
    pub recall_errors: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalTiming {
    /// Index build plus dataset load, in seconds.
    pub setup_secs: f64,
    pub matching_secs: f64,
    pub per_test_secs: f64,
    pub total_secs: f64,
}

/// A gold-standard row that was skipped because required fields were missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowWarning {
    pub row: usize,
    pub reason: String,
}

/// Result of scoring one dataset, before report metadata is attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalRun {
    pub dataset: String,
    pub metrics: EvalMetrics,
    pub matching_secs: f64,
    pub tests: Vec<TestSummary>,
    pub outcomes: Vec<TestOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalReport {
    pub run_id: String,
    pub created_at: String,
    pub dataset: String,
    pub metrics: EvalMetrics,
    pub timing: EvalTiming,
    pub tests: Vec<TestSummary>,
    pub outcomes: Vec<TestOutcome>,
    #[serde(default)]
    pub warnings: Vec<RowWarning>,
}
