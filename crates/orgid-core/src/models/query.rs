use serde::{Deserialize, Serialize};

use super::InstitutionRecord;

/// Which tokenizer pass produced a token. Carried for debugging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenSource {
    Uppercase,
    Parenthetical,
    Divider,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub source: TokenSource,
}

impl Token {
    pub fn new(text: impl Into<String>, source: TokenSource) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub token: String,
    pub token_source: TokenSource,
    pub institution: InstitutionRecord,
    /// True when the token named exactly one institution, false when the
    /// geography tie-break picked the winner.
    pub is_token_unique: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub query: String,
    #[serde(default)]
    pub geonames: Vec<String>,
    #[serde(default)]
    pub matches: Vec<Match>,
}

impl QueryResult {
    /// Distinct resolved institution IDs in the order they were first matched.
    pub fn institution_ids(&self) -> Vec<&str> {
        let mut ids = Vec::<&str>::with_capacity(self.matches.len());
        for matched in &self.matches {
            let id = matched.institution.id.as_str();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}
