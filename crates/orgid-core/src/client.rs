use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::engine::MatchEngine;
use crate::error::{OrgIdError, Result};
use crate::eval::Evaluator;
use crate::geo::{Gazetteer, LocationExtractor};
use crate::index::InstitutionIndex;
use crate::models::{EvalReport, EvalRun, EvalTiming, InstitutionRecord, QueryResult, RowWarning, TestCase};
use crate::source::{GoldStandardSource, load_institutions};

/// A booted matcher: immutable indexes, a location extractor and, when
/// configured, the gold standard used for evaluation runs.
#[derive(Clone)]
pub struct OrgId {
    engine: MatchEngine,
    gold_standard: Option<GoldStandardSource>,
    boot_secs: f64,
}

impl std::fmt::Debug for OrgId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrgId")
            .field("engine", &self.engine)
            .field("boot_secs", &self.boot_secs)
            .finish_non_exhaustive()
    }
}

impl OrgId {
    /// Load the institution source, build the indexes and the gazetteer.
    /// Any failure here means the process must not serve.
    pub fn open(config: &AppConfig) -> Result<Self> {
        let started = Instant::now();
        let records = load_institutions(&config.institutions_path)?;

        let mut gazetteer = Gazetteer::from_institutions(&records);
        if let Some(path) = config.gazetteer_path.as_deref() {
            gazetteer.load_csv(path)?;
        }
        let places = gazetteer.len();
        let index = InstitutionIndex::build(records)?;
        let gold_standard = GoldStandardSource::from_config(&config.gold_standard)?;

        let boot_secs = started.elapsed().as_secs_f64();
        info!(
            institutions = index.institution_count(),
            keys = index.key_count(),
            places,
            boot_secs,
            "institution index ready"
        );
        Ok(Self {
            engine: MatchEngine::new(Arc::new(index), Arc::new(gazetteer)),
            gold_standard: Some(gold_standard),
            boot_secs,
        })
    }

    /// Build an instance from records already in memory. No gold standard is
    /// attached; see [`OrgId::with_gold_standard`].
    pub fn from_records<I>(records: I, extractor: Arc<dyn LocationExtractor>) -> Result<Self>
    where
        I: IntoIterator<Item = InstitutionRecord>,
    {
        let started = Instant::now();
        let index = InstitutionIndex::build(records)?;
        Ok(Self {
            engine: MatchEngine::new(Arc::new(index), extractor),
            gold_standard: None,
            boot_secs: started.elapsed().as_secs_f64(),
        })
    }

    #[must_use]
    pub fn with_gold_standard(mut self, source: GoldStandardSource) -> Self {
        self.gold_standard = Some(source);
        self
    }

    pub fn engine(&self) -> &MatchEngine {
        &self.engine
    }

    pub fn institution_count(&self) -> usize {
        self.engine.index().institution_count()
    }

    pub fn key_count(&self) -> usize {
        self.engine.index().key_count()
    }

    pub fn boot_secs(&self) -> f64 {
        self.boot_secs
    }

    pub fn match_query(&self, query: &str) -> QueryResult {
        self.engine.match_query(query)
    }

    pub fn match_batch<S>(&self, queries: &[S]) -> Vec<QueryResult>
    where
        S: AsRef<str> + Sync,
    {
        self.engine.match_batch(queries)
    }

    /// Score caller-supplied test cases; nothing is fetched. Setup time is the
    /// index build at boot.
    pub fn evaluate(&self, dataset: &str, tests: &[TestCase]) -> EvalReport {
        let started = Instant::now();
        let run = Evaluator::new(&self.engine).evaluate(dataset, tests);
        build_report(run, self.boot_secs, Vec::new(), started)
    }

    /// Fetch the gold standard afresh, then score the rows tagged `dataset`.
    /// Setup time is the index build plus this fetch.
    pub fn run_eval(&self, dataset: &str) -> Result<EvalReport> {
        let source = self.gold_standard.as_ref().ok_or_else(|| {
            OrgIdError::Validation("no gold standard source configured".to_string())
        })?;
        self.run_eval_from(source, dataset)
    }

    /// Like [`OrgId::run_eval`] but against an explicit source.
    pub fn run_eval_from(&self, source: &GoldStandardSource, dataset: &str) -> Result<EvalReport> {
        let dataset = dataset.trim();
        if dataset.is_empty() {
            return Err(OrgIdError::Validation(
                "dataset name must not be empty".to_string(),
            ));
        }
        let started = Instant::now();
        let gold = source.load(dataset)?;
        let setup_secs = self.boot_secs + started.elapsed().as_secs_f64();

        let run = Evaluator::new(&self.engine).evaluate(dataset, &gold.cases);
        Ok(build_report(run, setup_secs, gold.warnings, started))
    }
}

fn build_report(
    run: EvalRun,
    setup_secs: f64,
    warnings: Vec<RowWarning>,
    started: Instant,
) -> EvalReport {
    #[allow(
        clippy::cast_precision_loss,
        reason = "per-test time is a display value"
    )]
    let per_test_secs = if run.metrics.total == 0 {
        0.0
    } else {
        run.matching_secs / run.metrics.total as f64
    };

    EvalReport {
        run_id: Uuid::new_v4().to_string(),
        created_at: Utc::now().to_rfc3339(),
        dataset: run.dataset,
        metrics: run.metrics,
        timing: EvalTiming {
            setup_secs,
            matching_secs: run.matching_secs,
            per_test_secs,
            total_secs: started.elapsed().as_secs_f64(),
        },
        tests: run.tests,
        outcomes: run.outcomes,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GoldStandardConfig;

    fn records() -> Vec<InstitutionRecord> {
        vec![
            InstitutionRecord::new("I1", "https://ror.org/a", "University of Oslo")
                .with_location(Some("Oslo"), None, Some("Norway")),
            InstitutionRecord::new("I2", "https://ror.org/b", "Oslo University Hospital")
                .with_alternate_names(["OUS"])
                .with_location(Some("Oslo"), None, Some("Norway")),
        ]
    }

    fn orgid() -> OrgId {
        let gazetteer = Gazetteer::from_institutions(&records());
        OrgId::from_records(records(), Arc::new(gazetteer)).expect("boot")
    }

    #[test]
    fn counts_reflect_loaded_records() {
        let orgid = orgid();
        assert_eq!(orgid.institution_count(), 2);
        assert_eq!(orgid.key_count(), 3);
        assert!(orgid.boot_secs() >= 0.0);
    }

    #[test]
    fn evaluate_builds_a_report_with_run_metadata() {
        let tests = vec![TestCase {
            id: "t1".to_string(),
            dataset: "d".to_string(),
            query: "OUS, Oslo".to_string(),
            expected_ids: vec!["I2".to_string()],
        }];
        let orgid = orgid();
        let report = orgid.evaluate("d", &tests);
        assert!(Uuid::parse_str(&report.run_id).is_ok());
        assert!(chrono::DateTime::parse_from_rfc3339(&report.created_at).is_ok());
        assert_eq!(report.metrics.passing, 1);
        assert_eq!(report.timing.setup_secs, orgid.boot_secs());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn run_eval_without_source_is_a_validation_error() {
        let err = orgid().run_eval("d").expect_err("no source");
        assert_eq!(err.code(), "VALIDATION_FAILED");
    }

    #[test]
    fn run_eval_reads_local_gold_standard() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gold.csv");
        std::fs::write(
            &path,
            "id,dataset,query,expected_ids\nt1,d,University of Oslo,I1\n,d,broken,\n",
        )
        .expect("write gold");
        let source = GoldStandardSource::new(
            path.to_str().expect("utf8 path"),
            &GoldStandardConfig::default(),
        )
        .expect("source");

        let report = orgid()
            .with_gold_standard(source)
            .run_eval("d")
            .expect("run eval");
        assert_eq!(report.dataset, "d");
        assert_eq!(report.metrics.total, 1);
        assert_eq!(report.metrics.recall, 1.0);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn blank_dataset_is_rejected() {
        let source =
            GoldStandardSource::new("/nonexistent.csv", &GoldStandardConfig::default()).expect("source");
        let err = orgid().run_eval_from(&source, "  ").expect_err("blank");
        assert_eq!(err.code(), "VALIDATION_FAILED");
    }

    #[test]
    fn open_fails_on_missing_institution_file() {
        let mut config = AppConfig::default();
        config.institutions_path = "/nonexistent/ror.csv".into();
        let err = OrgId::open(&config).expect_err("missing source");
        assert_eq!(err.code(), "BOOT_FAILURE");
    }
}
