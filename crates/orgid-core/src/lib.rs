// Public fallible APIs in this crate share one concrete error contract (`OrgIdError`).
// Repeating per-function `# Errors` boilerplate obscures behavior more than it clarifies.
#![allow(
    clippy::missing_errors_doc,
    reason = "crate-wide fallible API uses one explicit error type; per-item boilerplate would duplicate contract"
)]

pub mod client;
pub mod config;
pub mod disambiguate;
pub mod engine;
pub mod error;
pub mod eval;
pub mod geo;
pub mod index;
pub mod models;
pub mod source;
pub mod text;
pub mod tokenize;

pub use client::OrgId;
pub use config::{AppConfig, GoldStandardConfig, ServerConfig};
pub use engine::MatchEngine;
pub use error::{ErrorPayload, OrgIdError, Result};
pub use eval::Evaluator;
pub use geo::{Gazetteer, LocationExtractor};
pub use index::{InstitutionIndex, LookupOutcome};
pub use source::{GoldStandard, GoldStandardSource, load_institutions};
