//! Turning tabular rows into dataset schemas and records.
//!
//! Parsing the file format itself (CSV or otherwise) belongs to the caller;
//! these helpers start from a header and rows of raw text cells. A pair of
//! `lat`/`lng` columns (or `latitude`/`longitude`) is folded into a single
//! `location` column of type `LatLng`.

use super::record::Dataset;
use super::schema::{DatasetSchema, DatasetSchemaField};
use crate::error::{PropertyError, PropertyResult};
use crate::ids::{DatasetFieldId, SceneId};
use crate::value::{Value, ValueType};
use std::collections::HashSet;

pub const LOCATION_FIELD: &str = "location";

const LAT_NAMES: [&str; 2] = ["lat", "latitude"];
const LNG_NAMES: [&str; 3] = ["lng", "lon", "longitude"];

/// Where a schema column takes its cells from.
#[derive(Debug, Clone, Copy)]
enum ColumnSource {
    Cell(usize),
    LatLng { lat: usize, lng: usize },
}

fn find_column(header: &[String], names: &[&str]) -> Option<usize> {
    header
        .iter()
        .position(|h| names.contains(&h.trim().to_ascii_lowercase().as_str()))
}

/// Columns of the header as (name, source) pairs, with lat/lng folded.
fn plan_columns(header: &[String]) -> PropertyResult<Vec<(String, ColumnSource)>> {
    let mut seen = HashSet::new();
    for name in header {
        let name = name.trim();
        if name.is_empty() {
            return Err(PropertyError::invalid_schema("import", "empty column name"));
        }
        if !seen.insert(name) {
            return Err(PropertyError::invalid_schema(
                "import",
                format!("duplicate column '{}'", name),
            ));
        }
    }

    let location = match (find_column(header, &LAT_NAMES), find_column(header, &LNG_NAMES)) {
        (Some(lat), Some(lng)) => Some((lat, lng)),
        _ => None,
    };

    let mut columns: Vec<(String, ColumnSource)> = header
        .iter()
        .enumerate()
        .filter(|(i, _)| !matches!(location, Some((lat, lng)) if *i == lat || *i == lng))
        .map(|(i, name)| (name.trim().to_string(), ColumnSource::Cell(i)))
        .collect();

    if let Some((lat, lng)) = location {
        if seen.contains(LOCATION_FIELD) {
            return Err(PropertyError::invalid_schema(
                "import",
                "a 'location' column cannot be combined with lat/lng columns",
            ));
        }
        columns.push((LOCATION_FIELD.to_string(), ColumnSource::LatLng { lat, lng }));
    }
    Ok(columns)
}

fn check_row_width(header: &[String], rows: &[Vec<String>]) -> PropertyResult<()> {
    if let Some((index, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != header.len()) {
        return Err(PropertyError::invalid_schema(
            "import",
            format!(
                "row {} has {} cells, expected {}",
                index,
                row.len(),
                header.len()
            ),
        ));
    }
    Ok(())
}

fn cell(row: &[String], source: ColumnSource) -> Option<String> {
    match source {
        ColumnSource::Cell(i) => row.get(i).map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
        ColumnSource::LatLng { lat, lng } => {
            let lat = row.get(lat)?.trim();
            let lng = row.get(lng)?.trim();
            if lat.is_empty() || lng.is_empty() {
                return None;
            }
            Some(format!("{},{}", lat, lng))
        }
    }
}

/// Guess a dataset schema for the given rows.
///
/// A column whose non-empty cells all parse as the same type gets that type;
/// mixed or empty columns fall back to `String`. The first string column
/// becomes the representative field.
pub fn guess_schema(
    scene: SceneId,
    name: &str,
    header: &[String],
    rows: &[Vec<String>],
) -> PropertyResult<DatasetSchema> {
    check_row_width(header, rows)?;
    let mut schema = DatasetSchema::new(scene, name).with_source(format!("import:{}", name));

    for (column, source) in plan_columns(header)? {
        let value_type = match source {
            ColumnSource::LatLng { .. } => ValueType::LatLng,
            ColumnSource::Cell(_) => {
                let mut guessed: Option<ValueType> = None;
                for raw in rows.iter().filter_map(|r| cell(r, source)) {
                    let t = ValueType::guess(&raw);
                    guessed = match guessed {
                        None => Some(t),
                        Some(prev) if prev == t => Some(prev),
                        Some(_) => Some(ValueType::String),
                    };
                }
                guessed.unwrap_or(ValueType::String)
            }
        };
        schema = schema.with_field(DatasetSchemaField::new(column, value_type));
    }

    if let Some(rep) = schema.first_field_of_type(ValueType::String).map(|f| f.id.clone()) {
        schema = schema.with_representative_field(rep);
    }

    crate::log_dataset_info!(
        "Guessed dataset schema '{}' with {} fields from {} rows",
        name,
        schema.fields.len(),
        rows.len()
    );
    Ok(schema)
}

/// Verify that rows can be stored under an existing schema.
pub fn check_compatible(
    schema: &DatasetSchema,
    header: &[String],
    rows: &[Vec<String>],
) -> PropertyResult<()> {
    check_row_width(header, rows)?;
    for (column, source) in plan_columns(header)? {
        let field = schema.field_by_name(&column).ok_or_else(|| {
            PropertyError::invalid_schema(&schema.id, format!("unknown column '{}'", column))
        })?;
        for raw in rows.iter().filter_map(|r| cell(r, source)) {
            if field.value_type.parse(&raw).is_none() {
                return Err(PropertyError::invalid_value_type(
                    &column,
                    field.value_type,
                    format!("'{}'", raw),
                ));
            }
        }
    }
    Ok(())
}

/// Schema for a re-import of the table behind `old`.
///
/// When every cell still parses under the old column types, those types and
/// reference targets are kept under fresh ids. Otherwise the schema is
/// guessed afresh.
pub fn schema_for_sync(
    old: &DatasetSchema,
    header: &[String],
    rows: &[Vec<String>],
) -> PropertyResult<DatasetSchema> {
    if let Err(e) = check_compatible(old, header, rows) {
        crate::log_dataset_debug!("Guessing a new schema for {}: {}", old.id, e);
        return guess_schema(old.scene.clone(), &old.name, header, rows);
    }

    let mut schema = DatasetSchema::new(old.scene.clone(), old.name.clone());
    if let Some(source) = &old.source {
        schema = schema.with_source(source.clone());
    }
    for (column, _) in plan_columns(header)? {
        if let Some(field) = old.field_by_name(&column) {
            schema = schema.with_field(DatasetSchemaField {
                id: DatasetFieldId::new(),
                ..field.clone()
            });
        }
    }
    let representative = old
        .representative()
        .and_then(|rep| schema.field_by_name(&rep.name))
        .map(|f| f.id.clone());
    if let Some(rep) = representative {
        schema = schema.with_representative_field(rep);
    }
    Ok(schema)
}

/// Create one record per row. Cells that do not parse are left absent.
pub fn rows_to_datasets(
    schema: &DatasetSchema,
    header: &[String],
    rows: &[Vec<String>],
) -> PropertyResult<Vec<Dataset>> {
    check_row_width(header, rows)?;
    let columns: Vec<_> = plan_columns(header)?
        .into_iter()
        .filter_map(|(name, source)| schema.field_by_name(&name).map(|f| (f, source)))
        .collect();

    let records = rows
        .iter()
        .map(|row| {
            let mut record = Dataset::new(schema.id.clone());
            for (field, source) in &columns {
                let value: Option<Value> = cell(row, *source).and_then(|raw| field.value_type.parse(&raw));
                if let Some(value) = value {
                    record.set_value(field.id.clone(), value);
                }
            }
            record
        })
        .collect();
    Ok(records)
}
