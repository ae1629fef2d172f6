use std::collections::HashMap;
use std::sync::Arc;

/// Normalized name to the identifiers of every institution carrying it.
///
/// Posting lists keep insertion order and are not deduplicated.
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    postings: HashMap<String, Vec<Arc<str>>>,
}

impl NameIndex {
    pub(super) fn post(&mut self, key: String, id: Arc<str>) {
        self.postings.entry(key).or_default().push(id);
    }

    pub fn postings(&self, key: &str) -> Vec<&str> {
        self.postings
            .get(key)
            .map(|ids| ids.iter().map(|id| &**id).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }
}
