//! `civreg-recon` - civil registry reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded records, mutates the men index and
//! women table in place, returns a serializable report.
//! No CLI or IO dependencies.

pub mod config;
pub mod edit;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod index;
pub mod model;
pub mod table;

pub use config::RegistryConfig;
pub use edit::apply_partial_update;
pub use engine::{reconcile, ReconcileOutcome};
pub use error::RegistryError;
pub use index::OrderedIndex;
pub use model::{MaritalStatus, MarriageEvent, PersonId, PersonRecord, RecordUpdate, RegistryReport};
pub use table::DirectTable;
