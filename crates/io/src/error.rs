use std::path::PathBuf;

use civreg_recon::model::PersonId;
use thiserror::Error;

/// Any of these means no data is available: the engine must not run.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("file not found: {}", .0.display())]
    MissingFile(PathBuf),
    #[error("cannot open {}: {message}", .path.display())]
    Open { path: PathBuf, message: String },
    #[error("sheet '{sheet}' not found (available: {})", .available.join(", "))]
    MissingSheet { sheet: String, available: Vec<String> },
    #[error("sheet '{sheet}' has no header row")]
    MissingHeader { sheet: String },
    #[error("sheet '{sheet}': missing column '{column}'")]
    MissingColumn { sheet: String, column: String },
    /// A registry keyed by id repeats an id. Rows are 1-based sheet rows.
    #[error("sheet '{sheet}': id {id} appears at rows {first_row} and {row}")]
    DuplicateId { sheet: String, id: PersonId, first_row: usize, row: usize },
    #[error("cannot read sheet '{sheet}': {message}")]
    Read { sheet: String, message: String },
    #[error("cannot write {}: {message}", .path.display())]
    Write { path: PathBuf, message: String },
}
