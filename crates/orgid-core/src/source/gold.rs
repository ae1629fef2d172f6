use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderValue, USER_AGENT};
use tracing::{info, warn};

use crate::config::GoldStandardConfig;
use crate::error::{OrgIdError, Result};
use crate::models::{RowWarning, TestCase};

use super::{column_index, field, split_list};

/// Labeled rows for one dataset plus the rows that had to be skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoldStandard {
    pub cases: Vec<TestCase>,
    pub warnings: Vec<RowWarning>,
}

#[derive(Debug, Clone)]
enum GoldLocation {
    Remote {
        url: String,
        user_agent: String,
        timeout: Duration,
    },
    Local(PathBuf),
}

/// Where the gold standard lives. Every [`GoldStandardSource::load`] call
/// reads the source again; nothing is cached between evaluation runs.
#[derive(Debug, Clone)]
pub struct GoldStandardSource {
    location: GoldLocation,
}

impl GoldStandardSource {
    /// `location` is either an `http(s)` URL or a local file path.
    pub fn new(location: &str, config: &GoldStandardConfig) -> Result<Self> {
        let location = location.trim();
        if location.is_empty() {
            return Err(OrgIdError::Validation(
                "gold standard location must not be empty".to_string(),
            ));
        }
        if !(location.starts_with("http://") || location.starts_with("https://")) {
            return Ok(Self {
                location: GoldLocation::Local(PathBuf::from(location)),
            });
        }

        let user_agent = user_agent(config);
        HeaderValue::from_str(&user_agent).map_err(|err| {
            OrgIdError::Validation(format!("invalid gold standard user agent: {err}"))
        })?;
        Ok(Self {
            location: GoldLocation::Remote {
                url: location.to_string(),
                user_agent,
                timeout: Duration::from_millis(config.http_timeout_ms),
            },
        })
    }

    pub fn from_config(config: &GoldStandardConfig) -> Result<Self> {
        Self::new(&config.url, config)
    }

    pub fn describe(&self) -> String {
        match &self.location {
            GoldLocation::Remote { url, .. } => url.clone(),
            GoldLocation::Local(path) => path.display().to_string(),
        }
    }

    /// Fetch and parse the rows for `dataset`. Blocking; async callers run
    /// this on a blocking thread.
    pub fn load(&self, dataset: &str) -> Result<GoldStandard> {
        let gold = match &self.location {
            GoldLocation::Remote {
                url,
                user_agent,
                timeout,
            } => {
                let body = fetch_text(url, user_agent, *timeout)?;
                parse_gold_standard(body.as_bytes(), Some(dataset))?
            }
            GoldLocation::Local(path) => {
                let file = File::open(path).map_err(|err| {
                    OrgIdError::Dataset(format!("open {}: {err}", path.display()))
                })?;
                parse_gold_standard(file, Some(dataset))?
            }
        };
        info!(
            source = %self.describe(),
            dataset,
            cases = gold.cases.len(),
            skipped = gold.warnings.len(),
            "loaded gold standard"
        );
        Ok(gold)
    }
}

fn fetch_text(url: &str, user_agent: &str, timeout: Duration) -> Result<String> {
    let http = Client::builder().timeout(timeout).build()?;
    let response = http
        .get(url)
        .header(USER_AGENT, user_agent)
        .send()
        .map_err(|err| OrgIdError::Dataset(format!("fetch {url}: {err}")))?;
    let status = response.status();
    if !status.is_success() {
        return Err(OrgIdError::Dataset(format!("fetch {url}: HTTP {status}")));
    }
    response
        .text()
        .map_err(|err| OrgIdError::Dataset(format!("read {url}: {err}")))
}

fn user_agent(config: &GoldStandardConfig) -> String {
    let mut agent = format!(
        "orgid/{} (mailto:{})",
        env!("CARGO_PKG_VERSION"),
        config.contact_email
    );
    if let Some(key) = config.openalex_api_key.as_deref() {
        agent.push_str(" openalex-api-key:");
        agent.push_str(key);
    }
    agent
}

/// Parse gold-standard CSV (`id`, `dataset`, `query`, `expected_ids`).
///
/// Rows missing `id`, `dataset` or `query` are skipped and reported as
/// warnings. When `dataset` is given, rows for other datasets are dropped.
pub fn parse_gold_standard<R: Read>(input: R, dataset: Option<&str>) -> Result<GoldStandard> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);
    let headers = reader
        .headers()
        .map_err(|err| OrgIdError::Dataset(format!("gold standard header: {err}")))?
        .clone();
    let column = |name: &str| {
        column_index(&headers, name).ok_or_else(|| {
            OrgIdError::Dataset(format!("gold standard is missing column '{name}'"))
        })
    };
    let id_col = column("id")?;
    let dataset_col = column("dataset")?;
    let query_col = column("query")?;
    let expected_col = column_index(&headers, "expected_ids");

    let mut gold = GoldStandard::default();
    for (idx, row) in reader.records().enumerate() {
        let row_number = idx + 1;
        let row = row.map_err(|err| {
            OrgIdError::Dataset(format!("gold standard row {row_number}: {err}"))
        })?;

        let (id, row_dataset, query) = match (
            field(&row, Some(id_col)),
            field(&row, Some(dataset_col)),
            field(&row, Some(query_col)),
        ) {
            (Some(id), Some(row_dataset), Some(query)) => (id, row_dataset, query),
            (id, row_dataset, _) => {
                let missing = if id.is_none() {
                    "id"
                } else if row_dataset.is_none() {
                    "dataset"
                } else {
                    "query"
                };
                let reason = format!("missing required field '{missing}'");
                warn!(row = row_number, %reason, "skipping malformed gold standard row");
                gold.warnings.push(RowWarning {
                    row: row_number,
                    reason,
                });
                continue;
            }
        };

        if dataset.is_some_and(|wanted| wanted != row_dataset) {
            continue;
        }
        gold.cases.push(TestCase {
            id: id.to_string(),
            dataset: row_dataset.to_string(),
            query: query.to_string(),
            expected_ids: split_list(field(&row, expected_col)),
        });
    }
    Ok(gold)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
id,dataset,query,expected_ids
t1,affiliations,\"MIT, Cambridge, USA\",https://openalex.org/I63966007
t2,affiliations,Harvard Medical School (HMS),https://openalex.org/I136199984|https://openalex.org/I1283280774
t3,other,Oxford,
,affiliations,Orphan row,
t5,affiliations,,
";

    fn config() -> GoldStandardConfig {
        GoldStandardConfig::default()
    }

    #[test]
    fn parses_rows_for_requested_dataset() {
        let gold = parse_gold_standard(SAMPLE.as_bytes(), Some("affiliations")).expect("parse");
        let ids = gold.cases.iter().map(|case| case.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["t1", "t2"]);
        assert_eq!(gold.cases[0].query, "MIT, Cambridge, USA");
        assert_eq!(gold.cases[1].expected_ids.len(), 2);
    }

    #[test]
    fn malformed_rows_become_warnings_not_errors() {
        let gold = parse_gold_standard(SAMPLE.as_bytes(), None).expect("parse");
        assert_eq!(gold.cases.len(), 3);
        assert_eq!(
            gold.warnings,
            vec![
                RowWarning {
                    row: 4,
                    reason: "missing required field 'id'".to_string(),
                },
                RowWarning {
                    row: 5,
                    reason: "missing required field 'query'".to_string(),
                },
            ]
        );
    }

    #[test]
    fn empty_expected_ids_are_allowed() {
        let gold = parse_gold_standard(SAMPLE.as_bytes(), Some("other")).expect("parse");
        assert_eq!(gold.cases.len(), 1);
        assert!(gold.cases[0].expected_ids.is_empty());
    }

    #[test]
    fn missing_columns_fail_the_whole_dataset() {
        let err = parse_gold_standard("id,query\nt1,MIT\n".as_bytes(), None).expect_err("fail");
        assert_eq!(err.code(), "DATASET_FAILURE");
    }

    #[test]
    fn local_source_reads_fresh_on_every_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gold.csv");
        std::fs::write(&path, "id,dataset,query,expected_ids\nt1,d,MIT,I1\n").expect("write");

        let source =
            GoldStandardSource::new(path.to_str().expect("utf8 path"), &config()).expect("source");
        assert_eq!(source.load("d").expect("first load").cases.len(), 1);

        std::fs::write(
            &path,
            "id,dataset,query,expected_ids\nt1,d,MIT,I1\nt2,d,CNRS,I2\n",
        )
        .expect("rewrite");
        assert_eq!(source.load("d").expect("second load").cases.len(), 2);
    }

    #[test]
    fn unreadable_local_source_is_a_dataset_failure() {
        let source = GoldStandardSource::new("/nonexistent/gold.csv", &config()).expect("source");
        let err = source.load("d").expect_err("missing file");
        assert_eq!(err.code(), "DATASET_FAILURE");
    }

    #[test]
    fn user_agent_carries_contact_and_optional_key() {
        let mut config = config();
        config.contact_email = "team@example.org".to_string();
        assert!(user_agent(&config).contains("mailto:team@example.org"));
        assert!(!user_agent(&config).contains("openalex-api-key"));
        config.openalex_api_key = Some("secret".to_string());
        assert!(user_agent(&config).ends_with("openalex-api-key:secret"));
    }

    #[test]
    fn blank_location_is_rejected() {
        let err = GoldStandardSource::new("  ", &config()).expect_err("blank");
        assert_eq!(err.code(), "VALIDATION_FAILED");
    }
}
