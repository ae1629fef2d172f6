use serde::{Deserialize, Serialize};

use orgid_core::models::TestCase;

#[derive(Debug, Deserialize)]
pub struct MatchQuery {
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchMatchRequest {
    pub queries: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunTestsRequest {
    #[serde(default)]
    pub tests: Option<Vec<TestCaseInput>>,
}

/// A caller-supplied test case; `dataset` defaults to the one in the path.
#[derive(Debug, Deserialize)]
pub struct TestCaseInput {
    pub id: String,
    #[serde(default)]
    pub dataset: Option<String>,
    pub query: String,
    #[serde(default)]
    pub expected_ids: Vec<String>,
}

impl TestCaseInput {
    pub fn into_test_case(self, dataset: &str) -> TestCase {
        TestCase {
            id: self.id,
            dataset: self.dataset.unwrap_or_else(|| dataset.to_string()),
            query: self.query,
            expected_ids: self.expected_ids,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub institutions: usize,
    pub keys: usize,
    pub boot_secs: f64,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub endpoints: [&'static str; 4],
}
