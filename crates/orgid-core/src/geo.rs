use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::error::{OrgIdError, Result};
use crate::models::InstitutionRecord;
use crate::source::{column_index, field};
use crate::text::location_key;
use crate::tokenize::is_divider;

/// Finds place names (cities, regions, countries) mentioned anywhere in a query.
pub trait LocationExtractor: Send + Sync {
    fn extract_location_names(&self, text: &str) -> Vec<String>;
}

impl<F> LocationExtractor for F
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
{
    fn extract_location_names(&self, text: &str) -> Vec<String> {
        self(text)
    }
}

/// Dictionary-backed extractor.
///
/// Matching is case- and accent-insensitive and prefers the longest known
/// phrase at each position, so "New South Wales" wins over "Wales".
#[derive(Debug, Clone, Default)]
pub struct Gazetteer {
    phrases: HashMap<String, String>,
    max_words: usize,
}

impl Gazetteer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with every location field of the given institutions.
    pub fn from_institutions<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a InstitutionRecord>,
    {
        let mut gazetteer = Self::new();
        for record in records {
            for place in record.location_fields() {
                gazetteer.insert(place);
            }
        }
        gazetteer
    }

    pub fn insert(&mut self, name: &str) {
        self.insert_alias(name, name);
    }

    /// Register `alias` as another spelling of `canonical`. The first
    /// canonical name registered for a phrase is kept.
    pub fn insert_alias(&mut self, alias: &str, canonical: &str) {
        let canonical = canonical.trim();
        let words = phrase_words(alias);
        if words.is_empty() || canonical.is_empty() {
            return;
        }
        self.max_words = self.max_words.max(words.len());
        self.phrases
            .entry(words.join(" "))
            .or_insert_with(|| canonical.to_string());
    }

    /// Add names from a CSV file with a `name` column and an optional
    /// `aliases` column holding `|`-separated alternate spellings.
    pub fn load_csv(&mut self, path: &Path) -> Result<usize> {
        let describe = |err: &dyn std::fmt::Display| {
            OrgIdError::Boot(format!("gazetteer {}: {err}", path.display()))
        };
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|err| describe(&err))?;
        let headers = reader.headers().map_err(|err| describe(&err))?.clone();
        let name_col = column_index(&headers, "name")
            .ok_or_else(|| describe(&"missing required column 'name'"))?;
        let aliases_col = column_index(&headers, "aliases");

        let mut added = 0usize;
        for row in reader.records() {
            let row = row.map_err(|err| describe(&err))?;
            let Some(name) = field(&row, Some(name_col)) else {
                continue;
            };
            self.insert(name);
            added += 1;
            if let Some(aliases) = field(&row, aliases_col) {
                for alias in aliases.split('|') {
                    self.insert_alias(alias, name);
                }
            }
        }
        debug!(path = %path.display(), added, "loaded gazetteer file");
        Ok(added)
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}

impl LocationExtractor for Gazetteer {
    fn extract_location_names(&self, text: &str) -> Vec<String> {
        let words = phrase_words(text);
        let mut found = Vec::<String>::new();
        let mut start = 0usize;
        while start < words.len() {
            let longest = (1..=self.max_words.min(words.len() - start))
                .rev()
                .find_map(|len| {
                    self.phrases
                        .get(&words[start..start + len].join(" "))
                        .map(|canonical| (len, canonical))
                });
            match longest {
                Some((len, canonical)) => {
                    if !found.contains(canonical) {
                        found.push(canonical.clone());
                    }
                    start += len;
                }
                None => start += 1,
            }
        }
        found
    }
}

fn is_phrase_separator(ch: char) -> bool {
    ch.is_whitespace() || is_divider(ch) || matches!(ch, '(' | ')' | '[' | ']' | '/' | '&')
}

fn phrase_words(text: &str) -> Vec<String> {
    text.split(is_phrase_separator)
        .map(location_key)
        .filter(|word| !word.is_empty())
        .collect()
}
