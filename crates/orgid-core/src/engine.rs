use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use crate::disambiguate::disambiguate;
use crate::geo::LocationExtractor;
use crate::index::{InstitutionIndex, LookupOutcome};
use crate::models::{Match, QueryResult};
use crate::text::{normalize, truncate_text};
use crate::tokenize::tokenize;

const LOG_QUERY_CHARS: usize = 120;

/// Resolves affiliation strings against a shared, read-only index.
#[derive(Clone)]
pub struct MatchEngine {
    index: Arc<InstitutionIndex>,
    extractor: Arc<dyn LocationExtractor>,
}

impl std::fmt::Debug for MatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchEngine")
            .field("institutions", &self.index.institution_count())
            .field("keys", &self.index.key_count())
            .finish_non_exhaustive()
    }
}

impl MatchEngine {
    pub fn new(index: Arc<InstitutionIndex>, extractor: Arc<dyn LocationExtractor>) -> Self {
        Self { index, extractor }
    }

    pub fn index(&self) -> &InstitutionIndex {
        &self.index
    }

    /// Tokenize `query`, look every token up and keep the ones that resolve to
    /// exactly one institution, directly or through the geography tie-break.
    pub fn match_query(&self, query: &str) -> QueryResult {
        let geonames = self.extractor.extract_location_names(query);
        let tokens = tokenize(query);
        let mut matches = Vec::<Match>::new();

        for token in &tokens {
            let key = normalize(&token.text);
            let (institution, is_token_unique) = match self.index.lookup(&key) {
                LookupOutcome::NoMatch => continue,
                LookupOutcome::Unique(record) => (record, true),
                LookupOutcome::Ambiguous(candidates) => {
                    let Some(record) = disambiguate(&candidates, &geonames) else {
                        debug!(
                            token = %token.text,
                            candidates = candidates.len(),
                            "ambiguous token left unresolved"
                        );
                        continue;
                    };
                    (record, false)
                }
            };
            matches.push(Match {
                token: token.text.clone(),
                token_source: token.source,
                institution: institution.clone(),
                is_token_unique,
            });
        }

        debug!(
            query = %truncate_text(query, LOG_QUERY_CHARS),
            tokens = tokens.len(),
            geonames = geonames.len(),
            matches = matches.len(),
            "matched query"
        );
        QueryResult {
            query: query.to_string(),
            geonames,
            matches,
        }
    }

    /// Match every query in parallel; results keep the input order.
    pub fn match_batch<S>(&self, queries: &[S]) -> Vec<QueryResult>
    where
        S: AsRef<str> + Sync,
    {
        queries
            .par_iter()
            .map(|query| self.match_query(query.as_ref()))
            .collect()
    }
}
