//! Conversion of a validated price DataFrame into per-security series.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use polars::prelude::*;

use crate::data::provider::DataError;
use crate::data::schema::PriceSchema;
use crate::domain::{PriceBar, SecurityId, SecuritySeries};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

fn parquet_err(context: &str) -> impl Fn(PolarsError) -> DataError + '_ {
    move |e| DataError::Parquet(format!("{context}: {e}"))
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<f64>, DataError> {
    let series = df
        .column(name)
        .map_err(parquet_err(name))?
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(parquet_err(name))?;
    let ca = series.f64().map_err(parquet_err(name))?;
    Ok(ca.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

fn date_column(df: &DataFrame, source_name: &str) -> Result<Vec<Option<NaiveDate>>, DataError> {
    let column = df.column("date").map_err(parquet_err("date"))?;
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)
        .ok_or_else(|| DataError::Parquet("epoch date".into()))?;
    match column.dtype() {
        DataType::Date => {
            let ca = column.date().map_err(parquet_err("date"))?;
            Ok((0..ca.len())
                .map(|i| ca.get(i).map(|days| epoch + chrono::Duration::days(days as i64)))
                .collect())
        }
        _ => {
            let ca = column.str().map_err(parquet_err("date"))?;
            ca.into_iter()
                .enumerate()
                .map(|(row, v)| match v {
                    None => Ok(None),
                    Some(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
                        .map(Some)
                        .map_err(|e| DataError::InvalidRow {
                            source_name: source_name.to_string(),
                            row,
                            reason: format!("date '{s}': {e}"),
                        }),
                })
                .collect()
        }
    }
}

/// Split a price frame into series keyed by security, sorted by id.
///
/// Rows with a null id or date are dropped.
pub fn frame_to_series(df: &DataFrame, source_name: &str) -> Result<Vec<SecuritySeries>, DataError> {
    PriceSchema::validate_frame(df, source_name)?;

    let ids_series = df
        .column("security_id")
        .map_err(parquet_err("security_id"))?
        .as_materialized_series()
        .cast(&DataType::String)
        .map_err(parquet_err("security_id"))?;
    let ids = ids_series.str().map_err(parquet_err("security_id"))?;
    let dates = date_column(df, source_name)?;
    let open = float_column(df, "open")?;
    let high = float_column(df, "high")?;
    let low = float_column(df, "low")?;
    let close = float_column(df, "close")?;
    let volume = float_column(df, "volume")?;

    let mut grouped: BTreeMap<SecurityId, Vec<PriceBar>> = BTreeMap::new();
    for (i, id) in ids.into_iter().enumerate() {
        let (Some(id), Some(date)) = (id.map(str::trim).filter(|s| !s.is_empty()), dates[i]) else {
            continue;
        };
        grouped.entry(SecurityId::new(id)).or_default().push(PriceBar {
            date,
            open: open[i],
            high: high[i],
            low: low[i],
            close: close[i],
            volume: volume[i],
        });
    }

    Ok(grouped
        .into_iter()
        .map(|(id, bars)| SecuritySeries::new(id, bars))
        .collect())
}
