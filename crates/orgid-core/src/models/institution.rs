use serde::{Deserialize, Serialize};

/// One institution as loaded from the source file. Never mutated after boot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstitutionRecord {
    /// OpenAlex institution ID, the identifier used across the index.
    pub id: String,
    pub ror: String,
    pub name: String,
    #[serde(default)]
    pub alternate_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_subdivision_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_name: Option<String>,
}

impl InstitutionRecord {
    pub fn new(id: impl Into<String>, ror: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ror: ror.into(),
            name: name.into(),
            alternate_names: Vec::new(),
            location_name: None,
            country_subdivision_name: None,
            country_name: None,
        }
    }

    #[must_use]
    pub fn with_alternate_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alternate_names.extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_location(
        mut self,
        location_name: Option<&str>,
        country_subdivision_name: Option<&str>,
        country_name: Option<&str>,
    ) -> Self {
        self.location_name = location_name.map(ToString::to_string);
        self.country_subdivision_name = country_subdivision_name.map(ToString::to_string);
        self.country_name = country_name.map(ToString::to_string);
        self
    }

    /// Primary name followed by every alternate name, in source order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.alternate_names.iter().map(String::as_str))
    }

    /// City, subdivision and country, skipping the ones that are not known.
    pub fn location_fields(&self) -> impl Iterator<Item = &str> {
        [
            self.location_name.as_deref(),
            self.country_subdivision_name.as_deref(),
            self.country_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|value| !value.trim().is_empty())
    }
}
