use csv::StringRecord;

mod gold;
mod institutions;

pub use gold::{GoldStandard, GoldStandardSource, parse_gold_standard};
pub use institutions::{load_institutions, read_institutions};

/// Separator for multi-valued CSV cells (acronyms, names, expected IDs).
pub(crate) const LIST_SEPARATOR: char = '|';

pub(crate) fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.trim().eq_ignore_ascii_case(name))
}

pub(crate) fn first_column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|name| column_index(headers, name))
}

/// Trimmed cell value; blank cells and absent columns read as `None`.
pub(crate) fn field(row: &StringRecord, column: Option<usize>) -> Option<&str> {
    column
        .and_then(|idx| row.get(idx))
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

pub(crate) fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(LIST_SEPARATOR)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(ToString::to_string)
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_lookup_is_case_insensitive_and_trimmed() {
        let headers = StringRecord::from(vec![" ID ", "Display_Name"]);
        assert_eq!(column_index(&headers, "id"), Some(0));
        assert_eq!(first_column(&headers, &["name", "display_name"]), Some(1));
        assert_eq!(column_index(&headers, "acronyms"), None);
    }

    #[test]
    fn blank_cells_read_as_none() {
        let row = StringRecord::from(vec!["I1", "  ", "MIT | | Mass. Inst. Tech."]);
        assert_eq!(field(&row, Some(0)), Some("I1"));
        assert_eq!(field(&row, Some(1)), None);
        assert_eq!(field(&row, Some(9)), None);
        assert_eq!(field(&row, None), None);
        assert_eq!(
            split_list(field(&row, Some(2))),
            vec!["MIT".to_string(), "Mass. Inst. Tech.".to_string()]
        );
    }
}
