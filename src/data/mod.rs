// Data preparation module
// Normalizes the raw anime CSV and loads the processed rows as documents

pub mod documents;
pub mod loader;

pub use documents::{Document, load_documents};
pub use loader::{AnimeDataLoader, COMBINED_COLUMN, LoadStats, REQUIRED_COLUMNS};
