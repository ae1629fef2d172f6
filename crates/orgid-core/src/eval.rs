use std::collections::{HashMap, HashSet};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::engine::MatchEngine;
use crate::models::{EvalMetrics, EvalRun, OutcomeClass, TestCase, TestOutcome, TestSummary};

/// Scores the engine against labeled test cases.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    engine: &'a MatchEngine,
}

impl<'a> Evaluator<'a> {
    pub fn new(engine: &'a MatchEngine) -> Self {
        Self { engine }
    }

    /// Run every test tagged with `dataset`.
    ///
    /// Each distinct query is matched once per run. Expected identifiers are
    /// classified per test as `match` or `recall_error`; returned identifiers
    /// that no test with the same query expects become one `precision_error`
    /// each, charged to the first test carrying that query.
    pub fn evaluate(&self, dataset: &str, tests: &[TestCase]) -> EvalRun {
        let selected = tests
            .iter()
            .filter(|case| case.dataset == dataset)
            .collect::<Vec<_>>();

        let started = Instant::now();
        let found_by_query = self.match_distinct_queries(&selected);
        let matching_secs = started.elapsed().as_secs_f64();

        let mut expected_by_query = HashMap::<&str, HashSet<&str>>::new();
        for case in &selected {
            expected_by_query
                .entry(case.query.as_str())
                .or_default()
                .extend(case.expected_ids.iter().map(String::as_str));
        }

        let mut charged_queries = HashSet::<&str>::new();
        let mut outcomes = Vec::<TestOutcome>::new();
        let mut summaries = Vec::<TestSummary>::with_capacity(selected.len());

        for case in &selected {
            let found = found_by_query
                .get(case.query.as_str())
                .map(Vec::as_slice)
                .unwrap_or_default();
            let expected = distinct_ids(&case.expected_ids);
            let mut summary = TestSummary {
                id: case.id.clone(),
                query: case.query.clone(),
                is_passing: false,
                matches: 0,
                precision_errors: 0,
                recall_errors: 0,
            };

            for id in &expected {
                let classification = if found.iter().any(|candidate| candidate == id) {
                    summary.matches += 1;
                    OutcomeClass::Match
                } else {
                    summary.recall_errors += 1;
                    OutcomeClass::RecallError
                };
                outcomes.push(self.outcome(case, id, classification));
            }

            if charged_queries.insert(case.query.as_str()) {
                let wanted = expected_by_query.get(case.query.as_str());
                for id in found {
                    if wanted.is_some_and(|wanted| wanted.contains(id.as_str())) {
                        continue;
                    }
                    summary.precision_errors += 1;
                    outcomes.push(self.outcome(case, id, OutcomeClass::PrecisionError));
                }
            }

            summary.is_passing = summary.recall_errors == 0
                && found.iter().all(|id| expected.contains(&id.as_str()));
            summaries.push(summary);
        }

        let metrics = summarize(&summaries, &outcomes);
        info!(
            dataset,
            tests = metrics.total,
            passing = metrics.passing,
            precision = metrics.precision,
            recall = metrics.recall,
            matching_secs,
            "evaluated dataset"
        );
        EvalRun {
            dataset: dataset.to_string(),
            metrics,
            matching_secs,
            tests: summaries,
            outcomes,
        }
    }

    fn match_distinct_queries<'t>(&self, cases: &[&'t TestCase]) -> HashMap<&'t str, Vec<String>> {
        let mut seen = HashSet::<&str>::new();
        let queries = cases
            .iter()
            .map(|case| case.query.as_str())
            .filter(|query| seen.insert(*query))
            .collect::<Vec<_>>();
        debug!(
            tests = cases.len(),
            distinct_queries = queries.len(),
            "matching gold standard queries"
        );

        queries
            .par_iter()
            .map(|query| {
                let result = self.engine.match_query(query);
                let ids = result
                    .institution_ids()
                    .into_iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>();
                (*query, ids)
            })
            .collect()
    }

    fn outcome(&self, case: &TestCase, id: &str, classification: OutcomeClass) -> TestOutcome {
        let record = self.engine.index().get(id).cloned();
        let (sut, expected) = match classification {
            OutcomeClass::Match => (record.clone(), record),
            OutcomeClass::PrecisionError => (record, None),
            OutcomeClass::RecallError => (None, record),
        };
        TestOutcome {
            test_id: case.id.clone(),
            query: case.query.clone(),
            institution_id: id.to_string(),
            sut,
            expected,
            classification,
        }
    }
}

fn distinct_ids(ids: &[String]) -> Vec<&str> {
    let mut out = Vec::<&str>::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id.as_str()) {
            out.push(id.as_str());
        }
    }
    out
}

fn summarize(tests: &[TestSummary], outcomes: &[TestOutcome]) -> EvalMetrics {
    let count = |class: OutcomeClass| {
        outcomes
            .iter()
            .filter(|outcome| outcome.classification == class)
            .count()
    };
    let matches = count(OutcomeClass::Match);
    let precision_errors = count(OutcomeClass::PrecisionError);
    let recall_errors = count(OutcomeClass::RecallError);
    let passing = tests.iter().filter(|test| test.is_passing).count();

    EvalMetrics {
        total: tests.len(),
        passing,
        failing: tests.len() - passing,
        percentage_passing: fraction(passing, tests.len()) * 100.0,
        precision: fraction(matches, matches + precision_errors),
        recall: fraction(matches, matches + recall_errors),
        matches,
        precision_errors,
        recall_errors,
    }
}

fn fraction(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    #[allow(
        clippy::cast_precision_loss,
        reason = "evaluation counts stay far below f64 mantissa range"
    )]
    {
        numerator as f64 / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::geo::{Gazetteer, LocationExtractor};
    use crate::index::InstitutionIndex;
    use crate::models::InstitutionRecord;

    const MIT: &str = "https://openalex.org/I63966007";
    const MANIPAL: &str = "https://openalex.org/I4210097890";
    const HARVARD: &str = "https://openalex.org/I136199984";

    fn records() -> Vec<InstitutionRecord> {
        vec![
            InstitutionRecord::new(MIT, "https://ror.org/042nb2s44", "Massachusetts Institute of Technology")
                .with_alternate_names(["MIT"])
                .with_location(Some("Cambridge"), Some("Massachusetts"), Some("United States")),
            InstitutionRecord::new(MANIPAL, "https://ror.org/02xfp8v59", "Manipal Institute of Technology")
                .with_alternate_names(["MIT"])
                .with_location(Some("Manipal"), Some("Karnataka"), Some("India")),
            InstitutionRecord::new(HARVARD, "https://ror.org/03vek6s52", "Harvard University")
                .with_location(Some("Boston"), Some("Massachusetts"), Some("United States")),
        ]
    }

    fn engine_with(extractor: Arc<dyn LocationExtractor>) -> MatchEngine {
        let index = InstitutionIndex::build(records()).expect("build index");
        MatchEngine::new(Arc::new(index), extractor)
    }

    fn engine() -> MatchEngine {
        engine_with(Arc::new(Gazetteer::from_institutions(&records())))
    }

    fn case(id: &str, dataset: &str, query: &str, expected: &[&str]) -> TestCase {
        TestCase {
            id: id.to_string(),
            dataset: dataset.to_string(),
            query: query.to_string(),
            expected_ids: expected.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn perfect_dataset_scores_full_precision_and_recall() {
        let engine = engine();
        let tests = vec![
            case("t1", "d", "MIT, Cambridge, USA", &[MIT]),
            case("t2", "d", "Harvard University", &[HARVARD]),
        ];
        let run = Evaluator::new(&engine).evaluate("d", &tests);
        assert_eq!(run.metrics.precision, 1.0);
        assert_eq!(run.metrics.recall, 1.0);
        assert_eq!(run.metrics.passing, 2);
        assert_eq!(run.metrics.percentage_passing, 100.0);
        assert!(run.tests.iter().all(|test| test.is_passing));
        assert!(run
            .outcomes
            .iter()
            .all(|outcome| outcome.classification == OutcomeClass::Match
                && outcome.sut == outcome.expected
                && outcome.sut.is_some()));
    }

    #[test]
    fn extra_returned_institution_is_one_precision_error_per_query() {
        let engine = engine();
        let query = "Harvard University; MIT, Cambridge";
        let tests = vec![
            case("t1", "d", query, &[HARVARD]),
            case("t2", "d", query, &[HARVARD]),
        ];
        let run = Evaluator::new(&engine).evaluate("d", &tests);

        let precision = run
            .outcomes
            .iter()
            .filter(|outcome| outcome.classification == OutcomeClass::PrecisionError)
            .collect::<Vec<_>>();
        assert_eq!(precision.len(), 1);
        assert_eq!(precision[0].test_id, "t1");
        assert_eq!(precision[0].institution_id, MIT);
        assert!(precision[0].expected.is_none());
        assert_eq!(run.metrics.matches, 2);
        assert_eq!(run.metrics.precision, 2.0 / 3.0);
        assert_eq!(run.metrics.recall, 1.0);
        assert_eq!(run.metrics.passing, 0);
        assert_eq!(run.tests[0].precision_errors, 1);
        assert_eq!(run.tests[1].precision_errors, 0);
    }

    #[test]
    fn missed_expectations_are_recall_errors() {
        let engine = engine();
        let tests = vec![case("t1", "d", "Institute of Nowhere", &[MIT, "I-unknown"])];
        let run = Evaluator::new(&engine).evaluate("d", &tests);
        assert_eq!(run.metrics.recall_errors, 2);
        assert_eq!(run.metrics.recall, 0.0);
        assert_eq!(run.metrics.precision, 0.0);
        assert_eq!(run.outcomes[0].expected.as_ref().map(|r| r.id.as_str()), Some(MIT));
        assert!(run.outcomes[0].sut.is_none());
        assert_eq!(run.outcomes[1].institution_id, "I-unknown");
        assert!(run.outcomes[1].expected.is_none());
        assert!(!run.tests[0].is_passing);
    }

    #[test]
    fn only_the_requested_dataset_is_scored() {
        let engine = engine();
        let tests = vec![
            case("t1", "a", "Harvard University", &[HARVARD]),
            case("t2", "b", "Harvard University", &[MIT]),
        ];
        let run = Evaluator::new(&engine).evaluate("a", &tests);
        assert_eq!(run.dataset, "a");
        assert_eq!(run.metrics.total, 1);
        assert_eq!(run.tests[0].id, "t1");
        assert_eq!(run.metrics.precision_errors, 0);
    }

    #[test]
    fn empty_dataset_reports_zero_metrics() {
        let engine = engine();
        let run = Evaluator::new(&engine).evaluate("missing", &[]);
        assert_eq!(run.metrics.total, 0);
        assert_eq!(run.metrics.precision, 0.0);
        assert_eq!(run.metrics.recall, 0.0);
        assert_eq!(run.metrics.percentage_passing, 0.0);
    }

    #[test]
    fn shared_queries_are_matched_once_per_run() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let engine = engine_with(Arc::new(move |_: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            Vec::new()
        }));
        let tests = vec![
            case("t1", "d", "Harvard University", &[HARVARD]),
            case("t2", "d", "Harvard University", &[HARVARD]),
            case("t3", "d", "Manipal Institute of Technology", &[MANIPAL]),
        ];
        let run = Evaluator::new(&engine).evaluate("d", &tests);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(run.metrics.passing, 3);
    }

    #[test]
    fn fraction_guards_zero_denominator() {
        assert_eq!(fraction(0, 0), 0.0);
        assert_eq!(fraction(1, 4), 0.25);
    }
}
