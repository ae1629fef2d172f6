use std::collections::HashSet;

use crate::models::InstitutionRecord;
use crate::text::location_key;

/// Pick the single candidate whose city, subdivision or country appears among
/// the location names extracted from the query.
///
/// Returns `None` when no candidate or more than one candidate qualifies; an
/// unresolved tie never falls back to a best guess.
pub fn disambiguate<'a, S>(
    candidates: &[&'a InstitutionRecord],
    location_names: &[S],
) -> Option<&'a InstitutionRecord>
where
    S: AsRef<str>,
{
    let wanted = location_names
        .iter()
        .map(|name| location_key(name.as_ref()))
        .filter(|key| !key.is_empty())
        .collect::<HashSet<_>>();
    if wanted.is_empty() {
        return None;
    }

    let mut qualified = candidates.iter().copied().filter(|candidate| {
        candidate
            .location_fields()
            .any(|field| wanted.contains(&location_key(field)))
    });
    let first = qualified.next()?;
    if qualified.next().is_some() {
        return None;
    }
    Some(first)
}
