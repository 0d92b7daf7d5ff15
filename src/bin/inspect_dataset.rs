use anyhow::{Context, Result};
use arrow::array::{Array, Int64Array, StringArray};
use arrow::compute::{max, min};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::{env, fs::File, path::Path, process::exit};

const PREVIEW_ROWS: usize = 5;

fn main() {
    // Expect exactly one CLI argument: the Parquet copy written by popscraper.
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <DATASET.parquet>", args[0]);
        exit(1);
    }
    if let Err(e) = inspect_dataset(Path::new(&args[1])) {
        eprintln!("Error: {:#}", e);
        exit(1);
    }
}

/// Print the schema, per-column summaries and the first few countries.
fn inspect_dataset(path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?
        .build()
        .context("building record batch reader")?;

    let batches = reader
        .collect::<Result<Vec<RecordBatch>, _>>()
        .context("decoding record batches")?;
    let total_rows: usize = batches.iter().map(|b| b.num_rows()).sum();

    println!("=== Dataset: {} ===", path.display());
    println!("Countries: {}", total_rows);
    println!();

    let Some(first) = batches.first() else {
        println!("(empty)");
        return Ok(());
    };

    println!("=== Columns ===");
    let schema = first.schema();
    for (idx, field) in schema.fields().iter().enumerate() {
        match field.data_type() {
            DataType::Int64 => {
                let (lo, hi, total) = int_summary(&batches, idx);
                println!(
                    "- {:<32} | Int64 | min: {:<16} max: {:<16} sum: {}",
                    field.name(),
                    fmt_opt(lo),
                    fmt_opt(hi),
                    total
                );
            }
            other => println!("- {:<32} | {:?}", field.name(), other),
        }
    }
    println!();

    println!("=== First {} rows ===", PREVIEW_ROWS.min(total_rows));
    for row in 0..first.num_rows().min(PREVIEW_ROWS) {
        let cells: Vec<String> = first
            .columns()
            .iter()
            .map(|col| cell_to_string(col.as_ref(), row))
            .collect();
        println!("  {}", cells.join(" | "));
    }

    Ok(())
}

fn int_summary(batches: &[RecordBatch], idx: usize) -> (Option<i64>, Option<i64>, i128) {
    let mut lo: Option<i64> = None;
    let mut hi: Option<i64> = None;
    let mut total: i128 = 0;
    for batch in batches {
        if let Some(col) = batch.column(idx).as_any().downcast_ref::<Int64Array>() {
            lo = match (lo, min(col)) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
            hi = match (hi, max(col)) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            };
            // GDP totals overflow i64 quickly.
            total += col.iter().flatten().map(i128::from).sum::<i128>();
        }
    }
    (lo, hi, total)
}

fn cell_to_string(col: &dyn Array, row: usize) -> String {
    if let Some(s) = col.as_any().downcast_ref::<StringArray>() {
        s.value(row).to_string()
    } else if let Some(n) = col.as_any().downcast_ref::<Int64Array>() {
        n.value(row).to_string()
    } else {
        "<?>".to_string()
    }
}

fn fmt_opt(v: Option<i64>) -> String {
    v.map_or_else(|| "-".to_string(), |n| n.to_string())
}
