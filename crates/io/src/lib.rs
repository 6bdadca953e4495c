// Registry loading (xlsx, xls, xlsb, ods, CSV directory) and export (xlsx only)

pub mod csv;
pub mod error;
pub mod sheet;
pub mod xlsx;

use std::path::Path;

use civreg_recon::model::{MarriageEvent, PersonRecord};
use civreg_recon::RegistryConfig;

pub use error::IoError;
pub use sheet::{LoadStats, SkippedRow};

/// The three record sequences handed to the engine.
#[derive(Debug, Clone, Default)]
pub struct LoadedRegistry {
    pub women: Vec<PersonRecord>,
    pub men: Vec<PersonRecord>,
    pub marriages: Vec<MarriageEvent>,
    pub stats: LoadStats,
}

/// Load from a workbook file, or from `<sheet>.csv` files when `path` is a
/// directory.
pub fn load(path: &Path, config: &RegistryConfig) -> Result<LoadedRegistry, IoError> {
    if path.is_dir() {
        csv::load_dir(path, config)
    } else {
        xlsx::load_workbook(path, config)
    }
}
