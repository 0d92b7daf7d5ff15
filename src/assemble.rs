// src/assemble.rs

use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::csv::Writer as CsvWriter;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::error::{Result, ScrapeError};
use crate::normalize::{normalize, ColumnKind, Value};

pub const ENRICHED_HEADERS: [&str; 2] = ["Total Area", "Total Nominal GDP"];

const RENAMES: &[(&str, &str)] = &[
    ("Country(or dependent territory)", "Country"),
    ("% of world", "Percentage of World Population"),
    ("Total Area", "Total Area (km2)"),
];

pub const DROPPED_HEADERS: &[&str] = &["Date", "Source(official or UN)"];

/// Listing columns that get numeric normalization. Without them the raw text
/// would pass through as `Text`.
pub const NORMALIZED_HEADERS: &[&str] = &["Population", "Percentage of World Population"];

/// Listing headers + enrichment headers, first (rank) header removed,
/// renames applied. Dropped columns are still present.
pub fn derive_headers(listing_headers: &[String]) -> Vec<String> {
    listing_headers
        .iter()
        .map(String::as_str)
        .chain(ENRICHED_HEADERS)
        .skip(1)
        .map(|h| {
            RENAMES
                .iter()
                .find(|(from, _)| *from == h)
                .map_or(h, |(_, to)| *to)
                .to_string()
        })
        .collect()
}

pub fn column_kind(header: &str) -> ColumnKind {
    match header {
        "Percentage of World Population" => ColumnKind::Percentage,
        "Population" => ColumnKind::Population,
        "Total Area (km2)" => ColumnKind::AreaKm2,
        "Total Nominal GDP" => ColumnKind::GdpUsd,
        _ => ColumnKind::Text,
    }
}

/// Normalize every kept column and build a typed record batch.
pub fn assemble(dataset: &Dataset) -> Result<RecordBatch> {
    let headers = derive_headers(&dataset.headers);

    for (i, record) in dataset.records.iter().enumerate() {
        if record.cells.len() != headers.len() {
            return Err(ScrapeError::ColumnMismatch(format!(
                "row {i} ({}) has {} cells but there are {} headers",
                record.country_id,
                record.cells.len(),
                headers.len()
            )));
        }
    }

    for name in NORMALIZED_HEADERS {
        if !headers.iter().any(|h| h == name) {
            return Err(ScrapeError::ColumnMismatch(format!(
                "column {name:?} to normalize is missing"
            )));
        }
    }

    let mut dropped = Vec::with_capacity(DROPPED_HEADERS.len());
    for name in DROPPED_HEADERS {
        let idx = headers.iter().position(|h| h == name).ok_or_else(|| {
            ScrapeError::ColumnMismatch(format!("column {name:?} to drop is missing"))
        })?;
        dropped.push(idx);
    }

    let mut fields = Vec::with_capacity(headers.len() - dropped.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(fields.capacity());

    for (idx, name) in headers.iter().enumerate() {
        if dropped.contains(&idx) {
            continue;
        }
        let kind = column_kind(name);
        let values = dataset
            .records
            .iter()
            .map(|r| {
                normalize(kind, &r.cells[idx]).map_err(|source| ScrapeError::Normalize {
                    column: name.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<Value>>>()?;

        let (dtype, array): (DataType, ArrayRef) = if kind.is_integer() {
            let ints: Int64Array = values.iter().map(Value::as_int).collect();
            (DataType::Int64, Arc::new(ints))
        } else {
            let texts = StringArray::from_iter_values(values.iter().map(Value::to_string));
            (DataType::Utf8, Arc::new(texts))
        };
        fields.push(Field::new(name.as_str(), dtype, false));
        columns.push(array);
    }

    debug!(columns = fields.len(), rows = dataset.len(), "assembled dataset");
    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
    Ok(batch)
}

/// Write `batch` as CSV with a header row. The file only appears once it is
/// complete.
pub fn write_csv(batch: &RecordBatch, path: &Path) -> Result<()> {
    write_outputs(batch, path, None)
}

/// Same batch as Parquet, Snappy-compressed.
pub fn write_parquet(batch: &RecordBatch, path: &Path) -> Result<()> {
    let tmp = stage(path, |file| parquet_into(batch, file))?;
    commit(&tmp, path)?;
    info!(path = %path.display(), rows = batch.num_rows(), "wrote parquet");
    Ok(())
}

/// CSV plus the optional Parquet copy. Both are staged as `.partial` files
/// and renamed only once every write has succeeded, so a failure leaves
/// neither output behind.
pub fn write_outputs(batch: &RecordBatch, csv: &Path, parquet: Option<&Path>) -> Result<()> {
    let csv_tmp = stage(csv, |file| csv_into(batch, file))?;
    let parquet_tmp = match parquet {
        Some(path) => match stage(path, |file| parquet_into(batch, file)) {
            Ok(tmp) => Some((tmp, path)),
            Err(e) => {
                let _ = fs::remove_file(&csv_tmp);
                return Err(e);
            }
        },
        None => None,
    };

    commit(&csv_tmp, csv)?;
    info!(path = %csv.display(), rows = batch.num_rows(), "wrote csv");
    if let Some((tmp, path)) = parquet_tmp {
        commit(&tmp, path)?;
        info!(path = %path.display(), rows = batch.num_rows(), "wrote parquet");
    }
    Ok(())
}

fn csv_into(batch: &RecordBatch, file: File) -> Result<()> {
    let mut writer = CsvWriter::new(BufWriter::new(file));
    writer.write(batch)?;
    writer.into_inner().flush()?;
    Ok(())
}

fn parquet_into(batch: &RecordBatch, file: File) -> Result<()> {
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

/// Write into `<path>.partial`, removing it again on failure.
fn stage(path: &Path, write: impl FnOnce(File) -> Result<()>) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = partial_path(path);
    let file = File::create(&tmp)?;
    if let Err(e) = write(file) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(tmp)
}

fn commit(tmp: &Path, path: &Path) -> Result<()> {
    if let Err(e) = fs::rename(tmp, path) {
        let _ = fs::remove_file(tmp);
        return Err(e.into());
    }
    Ok(())
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::CountryRecord;
    use parquet::file::reader::{FileReader, SerializedFileReader};
    use tempfile::tempdir;

    fn headers() -> Vec<String> {
        [
            "Rank",
            "Country(or dependent territory)",
            "Population",
            "% of world",
            "Date",
            "Source(official or UN)",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn record(id: &str, cells: &[&str]) -> CountryRecord {
        CountryRecord {
            country_id: id.to_string(),
            cells: cells.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn sample() -> Dataset {
        Dataset {
            headers: headers(),
            records: vec![
                record(
                    "India",
                    &[
                        "India",
                        "1,402,112,000",
                        "17.7%",
                        "1 Mar 2021",
                        "National projection[3]",
                        "3,287,263 km2 (1,269,219 sq mi)[4]",
                        "$2.9 trillion[5]",
                    ],
                ),
                record(
                    "Nauru",
                    &[
                        "Nauru (Australia)",
                        "11,550",
                        "0%",
                        "2019",
                        "UN",
                        "21 sq mi",
                        "$133 million",
                    ],
                ),
            ],
        }
    }

    #[test]
    fn headers_are_sliced_and_renamed() {
        assert_eq!(
            derive_headers(&headers()),
            vec![
                "Country",
                "Population",
                "Percentage of World Population",
                "Date",
                "Source(official or UN)",
                "Total Area (km2)",
                "Total Nominal GDP",
            ]
        );
    }

    #[test]
    fn assemble_types_and_drops_columns() {
        let batch = assemble(&sample()).unwrap();
        let schema = batch.schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Country",
                "Population",
                "Percentage of World Population",
                "Total Area (km2)",
                "Total Nominal GDP",
            ]
        );
        assert_eq!(schema.field(3).data_type(), &DataType::Int64);

        let area = batch
            .column(3)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(area.value(0), 3_287_263);
        assert_eq!(area.value(1), 54);

        let gdp = batch
            .column(4)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(gdp.value(0), 3_190_000_000_000);
        assert_eq!(gdp.value(1), 146_300_000);
    }

    #[test]
    fn short_row_is_a_column_mismatch() {
        let mut ds = sample();
        ds.records[1].cells.pop();
        assert!(matches!(
            assemble(&ds),
            Err(ScrapeError::ColumnMismatch(_))
        ));
    }

    #[test]
    fn missing_dropped_column_is_a_column_mismatch() {
        let mut ds = sample();
        ds.headers[4] = "Census date".to_string();
        assert!(matches!(
            assemble(&ds),
            Err(ScrapeError::ColumnMismatch(_))
        ));
    }

    #[test]
    fn renamed_percentage_header_is_a_column_mismatch() {
        let mut ds = sample();
        ds.headers[3] = "% of world population".to_string();
        match assemble(&ds) {
            Err(ScrapeError::ColumnMismatch(msg)) => {
                assert!(msg.contains("Percentage of World Population"), "{msg}")
            }
            other => panic!("expected column mismatch, got {other:?}"),
        }
    }

    #[test]
    fn missing_population_header_is_a_column_mismatch() {
        let mut ds = sample();
        ds.headers[2] = "Population (2021)".to_string();
        assert!(matches!(
            assemble(&ds),
            Err(ScrapeError::ColumnMismatch(_))
        ));
    }

    #[test]
    fn malformed_gdp_names_its_column() {
        let mut ds = sample();
        ds.records[0].cells[6] = "unknown".to_string();
        match assemble(&ds) {
            Err(ScrapeError::Normalize { column, .. }) => assert_eq!(column, "Total Nominal GDP"),
            other => panic!("expected normalize error, got {other:?}"),
        }
    }

    #[test]
    fn writes_csv_and_parquet() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let csv_path = dir.path().join("out").join("Dataset.csv");
        let pq_path = dir.path().join("Dataset.parquet");

        let batch = assemble(&sample())?;
        write_csv(&batch, &csv_path)?;
        write_parquet(&batch, &pq_path)?;

        let text = fs::read_to_string(&csv_path)?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Country,Population,Percentage of World Population,Total Area (km2),Total Nominal GDP",
                "India,1402112000,17.7,3287263,3190000000000",
                "Nauru,11550,0,54,146300000",
            ]
        );
        assert!(!partial_path(&csv_path).exists());

        let reader = SerializedFileReader::new(File::open(&pq_path)?)?;
        assert_eq!(reader.metadata().file_metadata().num_rows(), 2);
        Ok(())
    }

    #[test]
    fn failed_parquet_copy_leaves_no_csv() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let csv_path = dir.path().join("Dataset.csv");
        // A plain file where the parquet directory should be.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"")?;
        let pq_path = blocker.join("Dataset.parquet");

        let batch = assemble(&sample())?;
        assert!(write_outputs(&batch, &csv_path, Some(&pq_path)).is_err());

        assert!(!csv_path.exists());
        assert!(!partial_path(&csv_path).exists());
        Ok(())
    }
}
