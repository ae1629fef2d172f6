use std::collections::HashMap;
use std::sync::Arc;

use crate::models::InstitutionRecord;

/// Institution identifier to the full record. Sole owner of the records.
#[derive(Debug, Clone, Default)]
pub struct ReverseIndex {
    records: HashMap<Arc<str>, InstitutionRecord>,
}

impl ReverseIndex {
    pub(super) fn insert(&mut self, id: Arc<str>, record: InstitutionRecord) {
        self.records.insert(id, record);
    }

    pub fn get(&self, id: &str) -> Option<&InstitutionRecord> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
