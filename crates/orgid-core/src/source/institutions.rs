use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::info;

use crate::error::{OrgIdError, Result};
use crate::models::InstitutionRecord;

use super::{field, first_column, split_list};

const OPENALEX_ID_COLUMNS: &[&str] = &["openalex_id"];
const ROR_ID_COLUMNS: &[&str] = &["ror_id", "ror", "id"];
const NAME_COLUMNS: &[&str] = &["display_name", "name"];
const ALTERNATE_NAME_COLUMNS: &[&str] = &["acronyms", "names", "alternate_names"];
const ROR_BASE_URL: &str = "https://ror.org/";

/// Read the institution source file. Any failure here is fatal for boot.
pub fn load_institutions(path: &Path) -> Result<Vec<InstitutionRecord>> {
    let file = File::open(path).map_err(|err| {
        OrgIdError::Boot(format!("cannot open institution source {}: {err}", path.display()))
    })?;
    let records = read_institutions(file, &path.display().to_string())?;
    info!(
        path = %path.display(),
        institutions = records.len(),
        "loaded institution source"
    );
    Ok(records)
}

/// Parse institution rows from any CSV reader; `origin` names the source in errors.
pub fn read_institutions<R: Read>(input: R, origin: &str) -> Result<Vec<InstitutionRecord>> {
    let boot = |detail: String| OrgIdError::Boot(format!("institution source {origin}: {detail}"));

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);
    let headers = reader
        .headers()
        .map_err(|err| boot(err.to_string()))?
        .clone();

    let required = |names: &[&str]| {
        first_column(&headers, names)
            .ok_or_else(|| boot(format!("missing required column '{}'", names[0])))
    };
    let openalex_col = required(OPENALEX_ID_COLUMNS)?;
    let ror_col = required(ROR_ID_COLUMNS)?;
    let name_col = required(NAME_COLUMNS)?;
    let alternate_cols = ALTERNATE_NAME_COLUMNS
        .iter()
        .filter_map(|name| super::column_index(&headers, name))
        .collect::<Vec<_>>();
    let location_col = super::column_index(&headers, "location_name");
    let subdivision_col = super::column_index(&headers, "country_subdivision_name");
    let country_col = super::column_index(&headers, "country_name");

    let mut records = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let row_number = idx + 1;
        let row = row.map_err(|err| boot(format!("row {row_number}: {err}")))?;
        let require = |column: usize, label: &str| {
            field(&row, Some(column))
                .ok_or_else(|| boot(format!("row {row_number}: missing required field '{label}'")))
        };
        let openalex_id = require(openalex_col, OPENALEX_ID_COLUMNS[0])?;
        let ror_id = require(ror_col, ROR_ID_COLUMNS[0])?;
        let name = require(name_col, NAME_COLUMNS[0])?;

        let alternate_names = alternate_cols
            .iter()
            .flat_map(|column| split_list(field(&row, Some(*column))))
            .collect::<Vec<_>>();

        records.push(
            InstitutionRecord::new(openalex_id, expand_ror_id(ror_id), name)
                .with_alternate_names(alternate_names)
                .with_location(
                    field(&row, location_col),
                    field(&row, subdivision_col),
                    field(&row, country_col),
                ),
        );
    }
    Ok(records)
}

fn expand_ror_id(raw: &str) -> String {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("{ROR_BASE_URL}{raw}")
    }
}
