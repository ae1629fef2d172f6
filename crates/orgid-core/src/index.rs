use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;

use crate::error::{OrgIdError, Result};
use crate::models::InstitutionRecord;
use crate::text::normalize;

mod name;
mod reverse;

pub use name::NameIndex;
pub use reverse::ReverseIndex;

/// Result of looking one normalized token up in the name index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome<'a> {
    NoMatch,
    Unique(&'a InstitutionRecord),
    Ambiguous(Vec<&'a InstitutionRecord>),
}

/// Name index and reverse index, built together once and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct InstitutionIndex {
    names: NameIndex,
    records: ReverseIndex,
}

impl InstitutionIndex {
    /// Build both indexes from the loaded institution records.
    ///
    /// Every name and alternate name of every record is posted under its
    /// normalized form; homonyms share a key. A record whose identifier was
    /// already seen is skipped.
    pub fn build<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = InstitutionRecord>,
    {
        let mut index = Self::default();
        let mut seen = HashSet::<Arc<str>>::new();

        for (position, record) in records.into_iter().enumerate() {
            validate_record(position, &record)?;
            let id: Arc<str> = Arc::from(record.id.as_str());
            if !seen.insert(Arc::clone(&id)) {
                warn!(
                    institution_id = %id,
                    position,
                    "duplicate institution id in source; keeping the first record"
                );
                continue;
            }
            for name in record.names() {
                let key = normalize(name);
                if key.is_empty() {
                    continue;
                }
                index.names.post(key, Arc::clone(&id));
            }
            index.records.insert(id, record);
        }

        if index.records.is_empty() {
            return Err(OrgIdError::Boot(
                "institution source contained no records".to_string(),
            ));
        }
        Ok(index)
    }

    pub fn names(&self) -> &NameIndex {
        &self.names
    }

    pub fn records(&self) -> &ReverseIndex {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&InstitutionRecord> {
        self.records.get(id)
    }

    pub fn institution_count(&self) -> usize {
        self.records.len()
    }

    pub fn key_count(&self) -> usize {
        self.names.len()
    }

    /// Candidates for an already-normalized key, counted per distinct institution.
    pub fn lookup(&self, normalized_key: &str) -> LookupOutcome<'_> {
        let mut candidates = Vec::<&InstitutionRecord>::new();
        for id in self.names.postings(normalized_key) {
            let Some(record) = self.records.get(id) else {
                continue;
            };
            if !candidates.iter().any(|existing| existing.id == record.id) {
                candidates.push(record);
            }
        }
        match candidates.len() {
            0 => LookupOutcome::NoMatch,
            1 => LookupOutcome::Unique(candidates[0]),
            _ => LookupOutcome::Ambiguous(candidates),
        }
    }
}

fn validate_record(position: usize, record: &InstitutionRecord) -> Result<()> {
    let missing = [
        ("id", record.id.as_str()),
        ("ror", record.ror.as_str()),
        ("name", record.name.as_str()),
    ]
    .into_iter()
    .find(|(_, value)| value.trim().is_empty());
    if let Some((field, _)) = missing {
        return Err(OrgIdError::Boot(format!(
            "institution record {position} is missing required field '{field}'"
        )));
    }
    Ok(())
}
