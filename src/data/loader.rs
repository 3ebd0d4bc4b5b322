use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::error::ArrowError;
use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::errors::ParquetError;
use thiserror::Error;
use zip::result::ZipError;
use zip::ZipArchive;

use super::model::{Dataset, Field, RawCell, Record};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a dataset could not be loaded. Nothing downstream runs without one.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("reading archive: {0}")]
    Zip(#[from] ZipError),
    #[error("reading workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("reading CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("reading parquet: {0}")]
    Parquet(#[from] ParquetError),
    #[error("reading parquet batch: {0}")]
    Arrow(#[from] ArrowError),
    #[error("no spreadsheet file found inside {0}")]
    NoSpreadsheet(String),
    #[error("workbook has no worksheet")]
    NoWorksheet,
    #[error("required column '{0}' is missing")]
    MissingColumn(&'static str),
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),
    #[error("the dataset has no rows")]
    EmptyDataset,
}

// ---------------------------------------------------------------------------
// Source kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    Archive,
    Workbook,
    Csv,
    Parquet,
}

impl SourceKind {
    fn from_name(name: &str) -> Option<(SourceKind, String)> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        let kind = match ext.as_str() {
            "zip" => SourceKind::Archive,
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => SourceKind::Workbook,
            "csv" => SourceKind::Csv,
            "parquet" | "pq" => SourceKind::Parquet,
            _ => return None,
        };
        Some((kind, ext))
    }

    /// Entries of an archive that can hold the dataset.
    fn is_spreadsheet(self) -> bool {
        matches!(self, SourceKind::Workbook | SourceKind::Csv)
    }
}

static EMPTY: RawCell = RawCell::Empty;

/// A dataset together with the file (or archive entry) it came from.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub dataset: Dataset,
    pub source_name: String,
}

/// Headers plus cells, before any column mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawCell>>,
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the procurement dataset from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.zip`     – the first spreadsheet entry inside (workbook or CSV)
/// * `.xlsx` / `.xlsm` / `.xlsb` / `.xls` / `.ods` – first worksheet
/// * `.csv`     – comma separated, header row
/// * `.parquet` – flat string / numeric columns
pub fn load_file(path: &Path) -> Result<Loaded, LoadError> {
    let name = path.to_string_lossy();
    let (kind, ext) = SourceKind::from_name(&name).ok_or_else(|| {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_string();
        LoadError::UnsupportedExtension(ext)
    })?;
    log::debug!("Loading {} as {kind:?} (.{ext})", path.display());

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.clone().into_owned());

    let table = match kind {
        SourceKind::Archive => return read_archive(open(path)?, &file_name),
        SourceKind::Workbook => range_to_table(&first_worksheet(open_workbook_auto(path)?)?),
        SourceKind::Csv => read_csv(open(path)?)?,
        SourceKind::Parquet => read_parquet(open(path)?)?,
    };
    let dataset = table_to_dataset(table)?;
    log::info!("Loaded {} records from {file_name}", dataset.len());
    Ok(Loaded {
        dataset,
        source_name: file_name,
    })
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// ZIP archive
// ---------------------------------------------------------------------------

/// Load the first spreadsheet entry (in archive order) of a ZIP archive.
/// `label` names the archive in errors.
pub fn read_archive<R: Read + Seek>(reader: R, label: &str) -> Result<Loaded, LoadError> {
    let mut archive = ZipArchive::new(reader)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        let Some((kind, _)) = SourceKind::from_name(&name) else {
            continue;
        };
        if !kind.is_spreadsheet() {
            continue;
        }

        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).map_err(|source| LoadError::Io {
            path: PathBuf::from(label).join(&name),
            source,
        })?;

        let table = match kind {
            SourceKind::Csv => read_csv(bytes.as_slice())?,
            _ => range_to_table(&first_worksheet(open_workbook_auto_from_rs(Cursor::new(bytes))?)?),
        };
        let dataset = table_to_dataset(table)?;
        log::info!("Loaded {} records from {label}!{name}", dataset.len());
        return Ok(Loaded {
            dataset,
            source_name: name,
        });
    }

    Err(LoadError::NoSpreadsheet(label.to_string()))
}

// ---------------------------------------------------------------------------
// Workbook
// ---------------------------------------------------------------------------

fn first_worksheet<RS: Read + Seek>(mut workbook: Sheets<RS>) -> Result<Range<Data>, LoadError> {
    match workbook.worksheet_range_at(0) {
        Some(range) => Ok(range?),
        None => Err(LoadError::NoWorksheet),
    }
}

fn range_to_table(range: &Range<Data>) -> RawTable {
    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|row| {
            row.iter()
                .map(|c| data_to_cell(c).as_text().unwrap_or_default())
                .collect()
        })
        .unwrap_or_default();
    let rows = rows
        .map(|row| row.iter().map(data_to_cell).collect())
        .collect();
    RawTable { headers, rows }
}

fn data_to_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Empty | Data::Error(_) => RawCell::Empty,
        Data::String(s) => RawCell::Text(s.clone()),
        Data::Float(f) => RawCell::Number(*f),
        Data::Int(i) => RawCell::Number(*i as f64),
        other => RawCell::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per line.
/// Empty fields are nulls; everything else is kept as text.
pub fn read_csv<R: Read>(reader: R) -> Result<RawTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(
            record
                .iter()
                .map(|value| {
                    if value.is_empty() {
                        RawCell::Empty
                    } else {
                        RawCell::Text(value.to_string())
                    }
                })
                .collect(),
        );
    }
    Ok(RawTable { headers, rows })
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`). Nested columns are rendered as text.
fn read_parquet(file: File) -> Result<RawTable, LoadError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        for row in 0..batch.num_rows() {
            rows.push(
                batch
                    .columns()
                    .iter()
                    .map(|col| extract_cell(col, row))
                    .collect(),
            );
        }
    }
    Ok(RawTable { headers, rows })
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> RawCell {
    if col.is_null(row) {
        return RawCell::Empty;
    }
    match col.data_type() {
        DataType::Utf8 => RawCell::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => RawCell::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => RawCell::Number(col.as_primitive::<Int32Type>().value(row) as f64),
        DataType::Int64 => RawCell::Number(col.as_primitive::<Int64Type>().value(row) as f64),
        DataType::Float32 => RawCell::Number(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => RawCell::Number(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => RawCell::Text(col.as_boolean().value(row).to_string()),
        other => {
            let text = arrow::util::display::array_value_to_string(col.as_ref(), row)
                .unwrap_or_else(|_| format!("{other:?}"));
            RawCell::Text(text)
        }
    }
}

// ---------------------------------------------------------------------------
// Table → Dataset
// ---------------------------------------------------------------------------

/// Map a raw table onto procurement records.
///
/// Headers are trimmed, the nine mapped columns are located by name, numeric
/// columns are coerced (bad values become null) and years normalised. Other
/// columns travel along as text.
pub fn table_to_dataset(table: RawTable) -> Result<Dataset, LoadError> {
    let column_names: Vec<String> = table.headers.iter().map(|h| h.trim().to_string()).collect();

    let mut mapped = BTreeMap::new();
    for field in Field::ALL {
        let idx = column_names
            .iter()
            .position(|c| c == field.header())
            .ok_or(LoadError::MissingColumn(field.header()))?;
        mapped.insert(field, idx);
    }
    let extra_cols: Vec<(usize, &String)> = column_names
        .iter()
        .enumerate()
        .filter(|(i, _)| !mapped.values().any(|m| m == i))
        .collect();

    let mut coerced_to_null = 0usize;
    let mut records = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        if row.iter().all(|c| c.as_text().is_none()) {
            continue;
        }
        let cell = |field: Field| row.get(mapped[&field]).unwrap_or(&EMPTY);
        let mut number = |field: Field| {
            let raw = cell(field);
            let value = raw.as_number();
            if value.is_none() && raw.as_text().is_some() {
                coerced_to_null += 1;
            }
            value
        };

        let total_price = number(Field::TotalPrice);
        let unit_price = number(Field::UnitPrice);
        let quantity_purchased = number(Field::QuantityPurchased);

        let extra = extra_cols
            .iter()
            .filter_map(|(i, name)| {
                let text = row.get(*i)?.as_text()?;
                Some(((*name).clone(), text))
            })
            .collect();

        records.push(Record {
            state: cell(Field::State).as_text(),
            municipality: cell(Field::Municipality).as_text(),
            product_description: cell(Field::ProductDescription).as_text(),
            supplier: cell(Field::Supplier).as_text(),
            manufacturer: cell(Field::Manufacturer).as_text(),
            year: cell(Field::Year).as_year(),
            total_price,
            unit_price,
            quantity_purchased,
            extra,
        });
    }

    if records.is_empty() {
        return Err(LoadError::EmptyDataset);
    }
    if coerced_to_null > 0 {
        log::debug!("{coerced_to_null} numeric cells could not be parsed and were set to null");
    }

    Ok(Dataset {
        records,
        column_names,
    })
}
