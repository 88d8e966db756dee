
use std::path::Path;

use csv::ReaderBuilder;
use tracing::{debug, warn};

use crate::{RecommenderError, Result};

/// One row of a CSV file rendered as `column: value` lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub content: String,
    /// Path of the CSV file the row came from
    pub source: String,
    /// Zero-based data row index
    pub row: usize,
}

/// Load every row of `csv_path` as a [`Document`]
#[inline]
pub fn load_documents(csv_path: &Path) -> Result<Vec<Document>> {
    let mut reader = ReaderBuilder::new().from_path(csv_path).map_err(|e| {
        RecommenderError::Data(format!("Failed to open {}: {}", csv_path.display(), e))
    })?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let source = csv_path.display().to_string();

    let mut documents = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping unreadable row {} in {}: {}", row, source, e);
                continue;
            }
        };

        let content = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| format!("{}: {}", header, value.trim()))
            .collect::<Vec<_>>()
            .join("\n");

        documents.push(Document {
            content,
            source: source.clone(),
            row,
        });
    }

    debug!("Loaded {} documents from {}", documents.len(), source);
    Ok(documents)
}
