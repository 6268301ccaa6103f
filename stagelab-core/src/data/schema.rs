//! Input contract for price and metadata tables.
//!
//! A missing required column is a structural error: it aborts the batch
//! before any security is processed.

use polars::prelude::*;

/// Required columns of a price table.
pub const PRICE_COLUMNS: [&str; 7] = ["security_id", "date", "open", "high", "low", "close", "volume"];

/// Numeric price columns, read as Float64.
pub const NUMERIC_PRICE_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

/// Required metadata column; display columns are optional.
pub const META_ID_COLUMN: &str = "id";
pub const META_OPTIONAL_COLUMNS: [&str; 4] = ["name", "nse_code", "bse_code", "industry"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("missing required column '{column}' in {source_name}")]
    MissingColumn { column: String, source_name: String },

    #[error("column '{column}' in {source_name}: expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        source_name: String,
        expected: String,
        actual: String,
    },
}

/// Check that every `required` column is among `present`.
pub fn require_columns<S: AsRef<str>>(
    present: &[S],
    required: &[&str],
    source_name: &str,
) -> Result<(), SchemaError> {
    for column in required {
        if !present.iter().any(|p| p.as_ref().trim() == *column) {
            return Err(SchemaError::MissingColumn {
                column: column.to_string(),
                source_name: source_name.to_string(),
            });
        }
    }
    Ok(())
}

pub struct PriceSchema;

impl PriceSchema {
    /// Validate a CSV header row.
    pub fn validate_header<S: AsRef<str>>(header: &[S], source_name: &str) -> Result<(), SchemaError> {
        require_columns(header, &PRICE_COLUMNS, source_name)
    }

    /// Validate a DataFrame: required columns present, prices numeric,
    /// dates either Date or String.
    pub fn validate_frame(df: &DataFrame, source_name: &str) -> Result<(), SchemaError> {
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        require_columns(&names, &PRICE_COLUMNS, source_name)?;

        let schema = df.schema();
        let mismatch = |column: &str, expected: &str, actual: &DataType| SchemaError::TypeMismatch {
            column: column.to_string(),
            source_name: source_name.to_string(),
            expected: expected.to_string(),
            actual: format!("{actual:?}"),
        };

        for column in NUMERIC_PRICE_COLUMNS {
            if let Some(dtype) = schema.get(column) {
                let numeric = matches!(
                    dtype,
                    DataType::Float64
                        | DataType::Float32
                        | DataType::Int64
                        | DataType::Int32
                        | DataType::UInt64
                        | DataType::UInt32
                );
                if !numeric {
                    return Err(mismatch(column, "numeric", dtype));
                }
            }
        }
        if let Some(dtype) = schema.get("date") {
            if !matches!(dtype, DataType::Date | DataType::String) {
                return Err(mismatch("date", "Date or String", dtype));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(open: Column) -> DataFrame {
        DataFrame::new(vec![
            Column::new("security_id".into(), &["A"]),
            Column::new("date".into(), &["2024-01-02"]),
            open,
            Column::new("high".into(), &[405.0]),
            Column::new("low".into(), &[399.0]),
            Column::new("close".into(), &[403.0]),
            Column::new("volume".into(), &[1_000_000.0]),
        ])
        .unwrap()
    }

    #[test]
    fn header_with_all_columns_passes() {
        let header = ["security_id", "date", "open", "high", "low", "close", "volume", "extra"];
        assert!(PriceSchema::validate_header(&header, "prices.csv").is_ok());
    }

    #[test]
    fn header_missing_column_fails() {
        let header = ["security_id", "date", "open", "high", "low", "close"];
        let err = PriceSchema::validate_header(&header, "prices.csv").unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingColumn {
                column: "volume".into(),
                source_name: "prices.csv".into()
            }
        );
    }

    #[test]
    fn valid_frame_passes() {
        let df = frame(Column::new("open".into(), &[400.0]));
        assert!(PriceSchema::validate_frame(&df, "prices.parquet").is_ok());
    }

    #[test]
    fn frame_missing_column_fails() {
        let df = DataFrame::new(vec![
            Column::new("security_id".into(), &["A"]),
            Column::new("date".into(), &["2024-01-02"]),
        ])
        .unwrap();
        assert!(matches!(
            PriceSchema::validate_frame(&df, "prices.parquet"),
            Err(SchemaError::MissingColumn { .. })
        ));
    }

    #[test]
    fn frame_with_text_prices_fails() {
        let df = frame(Column::new("open".into(), &["not_a_number"]));
        assert!(matches!(
            PriceSchema::validate_frame(&df, "prices.parquet"),
            Err(SchemaError::TypeMismatch { .. })
        ));
    }
}
