//! Feature Engineer - alert table → feature bundle
//!
//! Same code path for training and inference; only the label differs.
//! Every row is engineered on its own, so the output for a row never
//! depends on its neighbours.

use super::bundle::{CategoricalRow, FeatureBundle, NumericRow};
use super::layout::{
    CATEGORICAL_COLUMNS, LABEL_COLUMN, TEXT_FIELDS, TIMESTAMP_FIELD, UNKNOWN_CATEGORY,
};
use super::time::time_features;
use crate::error::{TriageError, TriageResult};
use crate::logic::alert::{AlertRecord, AlertTable, FieldValue};

/// Engineered features of a single row
#[derive(Debug, Clone, PartialEq)]
pub struct RowFeatures {
    pub numeric: NumericRow,
    pub categorical: CategoricalRow,
    pub text: String,
}

/// Convert a table into aligned feature blocks.
///
/// With `training = true` the `is_threat` label is required and returned;
/// otherwise the label is never read.
pub fn engineer(table: &AlertTable, training: bool) -> TriageResult<FeatureBundle> {
    if table.is_empty() {
        return Err(TriageError::EmptyTable);
    }

    let mut bundle = FeatureBundle::with_capacity(table.len());
    for record in table {
        let row = engineer_row(record);
        bundle.numeric.push(row.numeric);
        bundle.categorical.push(row.categorical);
        bundle.text.push(row.text);
    }

    if training {
        bundle.labels = Some(extract_labels(table)?);
    }

    log::debug!(
        "Engineered {} rows (training: {}, blank text: {})",
        bundle.len(),
        training,
        bundle.text_is_blank()
    );
    if log::log_enabled!(log::Level::Debug) {
        if let Some(first) = bundle.row_log_entry(0) {
            log::debug!("First engineered row: {}", first);
        }
    }

    Ok(bundle)
}

/// Numeric, categorical and text features of one record
pub fn engineer_row(record: &AlertRecord) -> RowFeatures {
    let (hour, weekday) = time_features(record, TIMESTAMP_FIELD);

    RowFeatures {
        numeric: [
            hour as f64,
            weekday as f64,
            record.number_or("rule.level", 0.0),
        ],
        categorical: std::array::from_fn(|i| record.text_or(CATEGORICAL_COLUMNS[i], UNKNOWN_CATEGORY)),
        text: row_text(record),
    }
}

/// Space-joined text of whichever `TEXT_FIELDS` the record carries
pub fn row_text(record: &AlertRecord) -> String {
    TEXT_FIELDS
        .iter()
        .filter_map(|field| record.text(field))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Labels as {0, 1}; any non-zero number counts as a threat
fn extract_labels(table: &AlertTable) -> TriageResult<Vec<u8>> {
    if !table.has_column(LABEL_COLUMN) {
        return Err(TriageError::MissingColumn(LABEL_COLUMN.to_string()));
    }

    table
        .iter()
        .enumerate()
        .map(|(row, record)| match record.get(LABEL_COLUMN) {
            Some(value) => value
                .as_number()
                .map(|n| u8::from(n != 0.0))
                .ok_or_else(|| TriageError::InvalidLabel { row, value: value.as_text() }),
            None => Err(TriageError::InvalidLabel { row, value: "<missing>".to_string() }),
        })
        .collect()
}

/// Attach a label to a record (used by the auto-labeler and tests)
pub fn set_label(record: &mut AlertRecord, label: u8) {
    record.insert(LABEL_COLUMN, FieldValue::Number(label as f64));
}
