mod eval;
mod institution;
mod query;

pub use eval::{
    EvalMetrics, EvalReport, EvalRun, EvalTiming, OutcomeClass, RowWarning, TestCase,
    TestOutcome, TestSummary,
};
pub use institution::InstitutionRecord;
pub use query::{Match, QueryResult, Token, TokenSource};
