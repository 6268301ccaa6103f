//! File-backed data sources for the runner.
//!
//! - `CsvPriceSource`: `security_id,date,open,high,low,close,volume`
//! - `ParquetPriceSource`: the same columns in a Parquet file, read
//!   through polars
//! - `CsvMetadataSource`: `id[,name,nse_code,bse_code,industry]`
//!
//! Files are read fully and validated when opened: a missing required
//! column fails the whole batch before any security is processed. Empty
//! numeric cells load as NaN and flow through the pipeline as void bars.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use polars::prelude::*;
use serde::Deserialize;
use tracing::{debug, info};

use stagelab_core::data::frame::DATE_FORMAT;
use stagelab_core::data::schema::{require_columns, META_ID_COLUMN};
use stagelab_core::data::{
    frame_to_series, DataError, InMemoryMetadata, InMemoryPrices, MetadataSource, PriceSchema,
    PriceSource,
};
use stagelab_core::domain::{PriceBar, SecurityId, SecurityMeta, SecuritySeries};

fn io_err(path: &Path) -> impl Fn(std::io::Error) -> DataError + '_ {
    move |source| DataError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn source_name(path: &Path) -> String {
    path.display().to_string()
}

fn csv_reader(path: &Path) -> Result<csv::Reader<File>, DataError> {
    let file = File::open(path).map_err(io_err(path))?;
    Ok(csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file))
}

fn header_names(reader: &mut csv::Reader<File>) -> Result<Vec<String>, DataError> {
    Ok(reader
        .headers()
        .map_err(|e| DataError::Csv(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect())
}

#[derive(Debug, Deserialize)]
struct PriceRecord {
    security_id: String,
    date: String,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    volume: Option<f64>,
}

/// Daily bars read from a long-format CSV file.
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    inner: InMemoryPrices,
}

impl CsvPriceSource {
    pub fn open(path: &Path) -> Result<Self, DataError> {
        let name = source_name(path);
        let mut reader = csv_reader(path)?;
        PriceSchema::validate_header(&header_names(&mut reader)?, &name)?;

        let mut grouped: BTreeMap<String, Vec<PriceBar>> = BTreeMap::new();
        for (row, record) in reader.deserialize::<PriceRecord>().enumerate() {
            let record = record.map_err(|e| DataError::Csv(format!("{name}: {e}")))?;
            if record.security_id.is_empty() {
                continue;
            }
            let date = NaiveDate::parse_from_str(&record.date, DATE_FORMAT).map_err(|e| {
                DataError::InvalidRow {
                    source_name: name.clone(),
                    row: row + 1,
                    reason: format!("date '{}': {e}", record.date),
                }
            })?;
            let nan = f64::NAN;
            grouped.entry(record.security_id).or_default().push(PriceBar {
                date,
                open: record.open.unwrap_or(nan),
                high: record.high.unwrap_or(nan),
                low: record.low.unwrap_or(nan),
                close: record.close.unwrap_or(nan),
                volume: record.volume.unwrap_or(nan),
            });
        }

        info!(path = %name, securities = grouped.len(), "loaded CSV prices");
        let series = grouped
            .into_iter()
            .map(|(id, bars)| SecuritySeries::new(SecurityId::new(id), bars));
        Ok(Self {
            inner: InMemoryPrices::from_series(name, series),
        })
    }
}

impl PriceSource for CsvPriceSource {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn security_ids(&self) -> Result<Vec<SecurityId>, DataError> {
        self.inner.security_ids()
    }

    fn history(
        &self,
        security: &SecurityId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<SecuritySeries, DataError> {
        self.inner.history(security, start, end)
    }
}

/// Daily bars read from a Parquet file.
#[derive(Debug, Clone)]
pub struct ParquetPriceSource {
    inner: InMemoryPrices,
}

impl ParquetPriceSource {
    pub fn open(path: &Path) -> Result<Self, DataError> {
        let name = source_name(path);
        let file = File::open(path).map_err(io_err(path))?;
        let df = ParquetReader::new(file)
            .finish()
            .map_err(|e| DataError::Parquet(format!("read {name}: {e}")))?;
        debug!(path = %name, rows = df.height(), "read parquet frame");

        let series = frame_to_series(&df, &name)?;
        info!(path = %name, securities = series.len(), "loaded parquet prices");
        Ok(Self {
            inner: InMemoryPrices::from_series(name, series),
        })
    }
}

impl PriceSource for ParquetPriceSource {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn security_ids(&self) -> Result<Vec<SecurityId>, DataError> {
        self.inner.security_ids()
    }

    fn history(
        &self,
        security: &SecurityId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<SecuritySeries, DataError> {
        self.inner.history(security, start, end)
    }
}

/// Open a price file, choosing the reader from its extension.
pub fn open_price_source(path: &Path) -> Result<Box<dyn PriceSource>, DataError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("parquet") => {
            Ok(Box::new(ParquetPriceSource::open(path)?))
        }
        _ => Ok(Box::new(CsvPriceSource::open(path)?)),
    }
}

#[derive(Debug, Deserialize)]
struct MetaRecord {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    nse_code: Option<String>,
    #[serde(default)]
    bse_code: Option<String>,
    #[serde(default)]
    industry: Option<String>,
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.is_empty())
}

/// Reference data read from a CSV file.
#[derive(Debug, Clone, Default)]
pub struct CsvMetadataSource {
    inner: InMemoryMetadata,
}

impl CsvMetadataSource {
    pub fn open(path: &Path) -> Result<Self, DataError> {
        let name = source_name(path);
        let mut reader = csv_reader(path)?;
        require_columns(&header_names(&mut reader)?, &[META_ID_COLUMN], &name)?;

        let mut inner = InMemoryMetadata::default();
        for record in reader.deserialize::<MetaRecord>() {
            let record = record.map_err(|e| DataError::Csv(format!("{name}: {e}")))?;
            if record.id.is_empty() {
                continue;
            }
            inner.insert(
                SecurityId::new(record.id),
                SecurityMeta {
                    name: non_empty(record.name),
                    nse_code: non_empty(record.nse_code),
                    bse_code: non_empty(record.bse_code),
                    industry: non_empty(record.industry),
                },
            );
        }
        info!(path = %name, entries = inner.len(), "loaded metadata");
        Ok(Self { inner })
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl MetadataSource for CsvMetadataSource {
    fn metadata(&self, security: &SecurityId) -> Option<SecurityMeta> {
        self.inner.metadata(security)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagelab_core::data::SchemaError;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn csv_prices_grouped_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "prices.csv",
            "security_id,date,open,high,low,close,volume\n\
             B,2024-01-03,10,11,9,10.5,500\n\
             A,2024-01-03,100,102,99,101,1000\n\
             A,2024-01-02,99,101,98,100,900\n",
        );
        let source = CsvPriceSource::open(&path).unwrap();
        assert_eq!(
            source.security_ids().unwrap(),
            vec![SecurityId::from("A"), SecurityId::from("B")]
        );
        let a = source.history(&"A".into(), d(1), d(31)).unwrap();
        let closes: Vec<f64> = a.bars().iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![100.0, 101.0]);
    }

    #[test]
    fn empty_cells_become_void_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "prices.csv",
            "security_id,date,open,high,low,close,volume\nA,2024-01-02,,,,,\n",
        );
        let source = CsvPriceSource::open(&path).unwrap();
        let a = source.history(&"A".into(), d(1), d(31)).unwrap();
        assert!(a.bars()[0].close.is_nan());
        assert!(a.bars()[0].is_void());
    }

    #[test]
    fn missing_column_is_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "prices.csv",
            "security_id,date,open,high,low,close\nA,2024-01-02,1,1,1,1\n",
        );
        match CsvPriceSource::open(&path) {
            Err(DataError::Schema(SchemaError::MissingColumn { column, .. })) => {
                assert_eq!(column, "volume")
            }
            other => panic!("expected missing column, got {other:?}"),
        }
    }

    #[test]
    fn bad_date_reports_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "prices.csv",
            "security_id,date,open,high,low,close,volume\nA,02/01/2024,1,1,1,1,1\n",
        );
        assert!(matches!(
            CsvPriceSource::open(&path),
            Err(DataError::InvalidRow { row: 1, .. })
        ));
    }

    #[test]
    fn metadata_optional_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "meta.csv",
            "id,name,nse_code\n500325,Reliance Industries,RELIANCE\n532540,TCS,\n",
        );
        let meta = CsvMetadataSource::open(&path).unwrap();
        assert_eq!(meta.len(), 2);
        let rel = meta.metadata(&"500325".into()).unwrap();
        assert_eq!(rel.ticker(), Some("RELIANCE"));
        let tcs = meta.metadata(&"532540".into()).unwrap();
        assert_eq!(tcs.nse_code, None);
        assert_eq!(tcs.industry, None);
    }

    #[test]
    fn metadata_requires_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "meta.csv", "name\nAlpha\n");
        assert!(matches!(
            CsvMetadataSource::open(&path),
            Err(DataError::Schema(_))
        ));
    }

    #[test]
    fn extension_selects_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "prices.csv",
            "security_id,date,open,high,low,close,volume\nA,2024-01-02,1,1,1,1,1\n",
        );
        let source = open_price_source(&path).unwrap();
        assert_eq!(source.security_ids().unwrap().len(), 1);
    }
}
