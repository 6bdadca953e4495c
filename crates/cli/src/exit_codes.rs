//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Code | Description                                          |
//! |------|------------------------------------------------------|
//! | 0    | Success (misses during reconciliation are not errors) |
//! | 1    | General error (unspecified)                          |
//! | 2    | CLI usage error (bad args, malformed --edit)         |
//! | 3    | Load failure: no data, nothing was reconciled        |
//! | 4    | Invalid or unreadable config                         |
//! | 5    | Identifier not found                                 |
//! | 6    | Output file could not be written                     |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use civreg_io::IoError;
use civreg_recon::RegistryError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, malformed edit expressions.
pub const EXIT_USAGE: u8 = 2;

/// Input file or a required sheet/column is missing, or unreadable.
/// No index or table was built.
pub const EXIT_LOAD: u8 = 3;

/// Config file unreadable, not valid TOML, or fails validation.
pub const EXIT_CONFIG: u8 = 4;

/// `lookup` found the id in neither registry.
pub const EXIT_NOT_FOUND: u8 = 5;

/// `--output` could not be written.
pub const EXIT_OUTPUT: u8 = 6;

/// Map a loader error to its exit code.
pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::Write { .. } => EXIT_OUTPUT,
        _ => EXIT_LOAD,
    }
}

/// Map an engine error to its exit code.
pub fn registry_exit_code(err: &RegistryError) -> u8 {
    match err {
        RegistryError::ConfigParse(_) | RegistryError::ConfigValidation(_) => EXIT_CONFIG,
        RegistryError::NotFound { .. } => EXIT_NOT_FOUND,
        RegistryError::ImmutableKey(_) | RegistryError::UnknownField(_) | RegistryError::MalformedEdit(_) => {
            EXIT_USAGE
        }
        RegistryError::EmptyIndex => EXIT_ERROR,
    }
}
