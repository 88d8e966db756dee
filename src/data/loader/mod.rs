
use std::fs;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tracing::{debug, info, warn};

use crate::{RecommenderError, Result};

/// Columns the raw dataset must provide
pub const REQUIRED_COLUMNS: [&str; 3] = ["Name", "Genres", "sypnopsis"];

/// The single column written to the processed dataset
pub const COMBINED_COLUMN: &str = "combined_info";

/// Field values treated as missing, in addition to blank fields
const NA_VALUES: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Loads the raw anime dataset and writes the processed, single-column CSV
#[derive(Debug, Clone)]
pub struct AnimeDataLoader {
    original_csv: PathBuf,
    processed_csv: PathBuf,
}

/// Row counts from a processing run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub rows_read: usize,
    pub rows_kept: usize,
    /// Rows with at least one missing value
    pub rows_dropped: usize,
    /// Rows that could not be parsed or had too many fields
    pub rows_skipped: usize,
}

impl AnimeDataLoader {
    #[inline]
    pub fn new(original_csv: impl Into<PathBuf>, processed_csv: impl Into<PathBuf>) -> Self {
        Self {
            original_csv: original_csv.into(),
            processed_csv: processed_csv.into(),
        }
    }

    #[inline]
    pub fn original_csv(&self) -> &Path {
        &self.original_csv
    }

    #[inline]
    pub fn processed_csv(&self) -> &Path {
        &self.processed_csv
    }

    /// Validate, clean and flatten the raw dataset. Returns the processed file path.
    #[inline]
    pub fn load_and_process(&self) -> Result<PathBuf> {
        self.process()?;
        Ok(self.processed_csv.clone())
    }

    /// Same as [`Self::load_and_process`] but reports row counts
    #[inline]
    pub fn process(&self) -> Result<LoadStats> {
        info!("Loading anime dataset from {}", self.original_csv.display());

        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.original_csv)
            .map_err(|e| {
                RecommenderError::Data(format!(
                    "Failed to open {}: {}",
                    self.original_csv.display(),
                    e
                ))
            })?;

        let headers = reader.headers()?.clone();
        let columns = RequiredColumns::locate(&headers)?;

        let mut combined = Vec::new();
        let mut stats = LoadStats::default();

        for (row, result) in reader.records().enumerate() {
            stats.rows_read += 1;

            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping unreadable row {}: {}", row, e);
                    stats.rows_skipped += 1;
                    continue;
                }
            };

            if record.len() > headers.len() {
                warn!(
                    "Skipping row {}: expected {} fields, found {}",
                    row,
                    headers.len(),
                    record.len()
                );
                stats.rows_skipped += 1;
                continue;
            }

            if has_missing_value(&record, headers.len()) {
                debug!("Dropping row {} with missing values", row);
                stats.rows_dropped += 1;
                continue;
            }

            combined.push(columns.combine(&record));
            stats.rows_kept += 1;
        }

        self.write_processed(&combined)?;

        info!(
            "Processed {} rows: {} kept, {} dropped, {} skipped -> {}",
            stats.rows_read,
            stats.rows_kept,
            stats.rows_dropped,
            stats.rows_skipped,
            self.processed_csv.display()
        );

        Ok(stats)
    }

    fn write_processed(&self, rows: &[String]) -> Result<()> {
        if let Some(parent) = self.processed_csv.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut writer = WriterBuilder::new().from_path(&self.processed_csv)?;
        writer.write_record([COMBINED_COLUMN])?;
        for row in rows {
            writer.write_record([row.as_str()])?;
        }
        writer.flush()?;

        Ok(())
    }
}

/// Positions of the required columns within the header row
struct RequiredColumns {
    name: usize,
    genres: usize,
    synopsis: usize,
}

impl RequiredColumns {
    fn locate(headers: &StringRecord) -> Result<Self> {
        let position = |column: &str| headers.iter().position(|h| h == column);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .into_iter()
            .filter(|&column| position(column).is_none())
            .map(str::to_string)
            .collect();

        match (position("Name"), position("Genres"), position("sypnopsis")) {
            (Some(name), Some(genres), Some(synopsis)) => Ok(Self {
                name,
                genres,
                synopsis,
            }),
            _ => Err(RecommenderError::MissingColumns(missing)),
        }
    }

    fn combine(&self, record: &StringRecord) -> String {
        let field = |index: usize| record.get(index).unwrap_or_default();
        format!(
            "Title: {} Overview: {} Genres: {}",
            field(self.name),
            field(self.synopsis),
            field(self.genres)
        )
    }
}

/// A row is incomplete if it is short of fields or any field is empty or an NA marker
fn has_missing_value(record: &StringRecord, expected_fields: usize) -> bool {
    record.len() < expected_fields || record.iter().any(is_missing)
}

fn is_missing(value: &str) -> bool {
    value.is_empty() || NA_VALUES.contains(&value)
}
