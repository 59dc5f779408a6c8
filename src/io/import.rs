use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::application::{
    Normalized, RawAppointment, RawExpense, RawNumber, normalize_appointments, normalize_expenses,
};
use crate::domain::{Appointment, Expense};

/// File formats records can be loaded from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Header row with the record field names, one record per line
    Csv,
    /// A top-level array of record objects
    Json,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "csv" => Some(InputFormat::Csv),
            "json" => Some(InputFormat::Json),
            _ => None,
        }
    }
}

/// Error that occurred during import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportError {
    /// Line in a CSV file, 1-based element position in a JSON array
    pub line: usize,
    pub field: Option<String>,
    pub error: String,
}

/// Result of an import operation
#[derive(Debug, Clone)]
pub struct ImportResult<T> {
    pub records: Vec<T>,
    /// Rows read from the source, valid or not
    pub total: usize,
    pub errors: Vec<ImportError>,
}

impl<T> ImportResult<T> {
    pub fn imported(&self) -> usize {
        self.records.len()
    }

    pub fn skipped(&self) -> usize {
        self.errors.len()
    }
}

/// Rows as read from the source, before normalization.
struct RawRows<T> {
    rows: Vec<T>,
    /// Source line of each entry in `rows`
    lines: Vec<usize>,
    errors: Vec<ImportError>,
    total: usize,
}

impl<T> RawRows<T> {
    fn new() -> Self {
        Self {
            rows: Vec::new(),
            lines: Vec::new(),
            errors: Vec::new(),
            total: 0,
        }
    }

    fn normalize<U>(self, normalize: impl FnOnce(Vec<T>) -> Normalized<U>) -> ImportResult<U> {
        let RawRows {
            rows,
            lines,
            mut errors,
            total,
        } = self;
        let normalized = normalize(rows);

        for rejected in normalized.report.rejected {
            errors.push(ImportError {
                line: lines[rejected.position],
                field: rejected.error.field().map(str::to_string),
                error: rejected.error.to_string(),
            });
        }
        errors.sort_by_key(|e| e.line);

        ImportResult {
            records: normalized.records,
            total,
            errors,
        }
    }
}

/// Import appointments from CSV or JSON
pub fn import_appointments<R: Read>(
    reader: R,
    format: InputFormat,
) -> Result<ImportResult<Appointment>> {
    let rows = match format {
        InputFormat::Csv => read_csv(reader, appointment_from_row)?,
        InputFormat::Json => read_json::<_, RawAppointment>(reader)?,
    };
    let result = rows.normalize(normalize_appointments);
    tracing::debug!(
        imported = result.imported(),
        skipped = result.skipped(),
        "imported appointments"
    );
    Ok(result)
}

/// Import expenses from CSV or JSON
pub fn import_expenses<R: Read>(reader: R, format: InputFormat) -> Result<ImportResult<Expense>> {
    let rows = match format {
        InputFormat::Csv => read_csv(reader, expense_from_row)?,
        InputFormat::Json => read_json::<_, RawExpense>(reader)?,
    };
    let result = rows.normalize(normalize_expenses);
    tracing::debug!(
        imported = result.imported(),
        skipped = result.skipped(),
        "imported expenses"
    );
    Ok(result)
}

/// Load appointments from a `.csv` or `.json` file
pub fn load_appointments(path: &Path) -> Result<ImportResult<Appointment>> {
    let (file, format) = open(path)?;
    import_appointments(file, format)
        .with_context(|| format!("Failed to import appointments from {}", path.display()))
}

/// Load expenses from a `.csv` or `.json` file
pub fn load_expenses(path: &Path) -> Result<ImportResult<Expense>> {
    let (file, format) = open(path)?;
    import_expenses(file, format)
        .with_context(|| format!("Failed to import expenses from {}", path.display()))
}

fn open(path: &Path) -> Result<(File, InputFormat)> {
    let format = InputFormat::from_path(path).with_context(|| {
        format!(
            "Unsupported file type for {} (expected .csv or .json)",
            path.display()
        )
    })?;
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok((file, format))
}

fn read_json<R: Read, T: DeserializeOwned>(reader: R) -> Result<RawRows<T>> {
    let values: Vec<serde_json::Value> =
        serde_json::from_reader(reader).context("Expected a JSON array of records")?;

    let mut rows = RawRows::new();
    for (index, value) in values.into_iter().enumerate() {
        let line = index + 1;
        rows.total += 1;
        match serde_json::from_value::<T>(value) {
            Ok(row) => {
                rows.rows.push(row);
                rows.lines.push(line);
            }
            Err(e) => rows.errors.push(ImportError {
                line,
                field: None,
                error: format!("JSON parse error: {}", e),
            }),
        }
    }
    Ok(rows)
}

/// A CSV record with lookup by column name.
struct CsvRow<'a> {
    columns: &'a HashMap<String, usize>,
    record: &'a csv::StringRecord,
}

impl CsvRow<'_> {
    fn get(&self, name: &str) -> Option<String> {
        let index = *self.columns.get(&column_key(name))?;
        self.record
            .get(index)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    fn number(&self, name: &str) -> Option<RawNumber> {
        self.get(name).map(RawNumber::Text)
    }

    fn flag(&self, name: &str) -> Result<Option<bool>, (String, String)> {
        self.get(name)
            .map(|value| parse_flag(&value).ok_or((name.to_string(), value)))
            .transpose()
    }
}

/// Column names match regardless of case and underscores: `clientName`, `client_name`.
fn column_key(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "sim" => Some(true),
        "false" | "0" | "no" | "nao" | "não" => Some(false),
        _ => None,
    }
}

fn read_csv<R: Read, T>(
    reader: R,
    build: impl Fn(&CsvRow) -> Result<T, (String, String)>,
) -> Result<RawRows<T>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let columns: HashMap<String, usize> = csv_reader
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .enumerate()
        .map(|(index, name)| (column_key(name), index))
        .collect();

    let mut rows = RawRows::new();
    for (line_num, result) in csv_reader.records().enumerate() {
        let line = line_num + 2; // +2 for header and 0-indexing
        rows.total += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                rows.errors.push(ImportError {
                    line,
                    field: None,
                    error: format!("CSV parse error: {}", e),
                });
                continue;
            }
        };

        let row = CsvRow {
            columns: &columns,
            record: &record,
        };
        match build(&row) {
            Ok(raw) => {
                rows.rows.push(raw);
                rows.lines.push(line);
            }
            Err((field, value)) => rows.errors.push(ImportError {
                line,
                error: format!("invalid {}: {:?}", field, value),
                field: Some(field),
            }),
        }
    }
    Ok(rows)
}

fn appointment_from_row(row: &CsvRow) -> Result<RawAppointment, (String, String)> {
    Ok(RawAppointment {
        id: row.get("id"),
        client_id: row.get("clientId"),
        client_name: row.get("clientName"),
        service: row.get("service"),
        professional: row.get("professional"),
        date: row.get("date"),
        time: row.get("time"),
        price: row.number("price"),
        status: row.get("status"),
        duration: row.number("duration"),
        payment_method: row.get("paymentMethod"),
    })
}

fn expense_from_row(row: &CsvRow) -> Result<RawExpense, (String, String)> {
    Ok(RawExpense {
        id: row.get("id"),
        description: row.get("description"),
        category: row.get("category"),
        amount: row.number("amount"),
        date: row.get("date"),
        payment_method: row.get("paymentMethod"),
        is_paid: row.flag("isPaid")?,
        recurring: row.flag("recurring")?,
    })
}
