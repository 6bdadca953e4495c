//! `civreg reconcile | show | lookup | validate` - registry commands.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use civreg_io::LoadedRegistry;
use civreg_recon::engine::{build_index, build_table, reconcile};
use civreg_recon::evidence::build_report;
use civreg_recon::model::{parse_edit, MarriageEvent, PersonId, RecordUpdate, RegistryReport, Sex};
use civreg_recon::{apply_partial_update, DirectTable, OrderedIndex, RegistryConfig, RegistryError};
use tracing::{info, warn};

use crate::exit_codes::{io_exit_code, registry_exit_code, EXIT_CONFIG, EXIT_NOT_FOUND, EXIT_OUTPUT, EXIT_USAGE};
use crate::render;
use crate::CliError;

fn registry_err(err: RegistryError) -> CliError {
    CliError {
        code: registry_exit_code(&err),
        message: err.to_string(),
        hint: None,
    }
}

// ============================================================================
// Shared setup
// ============================================================================

/// Config from `--config`, or the civil registry defaults.
pub fn load_config(path: Option<&Path>) -> Result<RegistryConfig, CliError> {
    let Some(path) = path else {
        return Ok(RegistryConfig::default());
    };
    let text = std::fs::read_to_string(path).map_err(|e| CliError {
        code: EXIT_CONFIG,
        message: format!("cannot read config {}: {e}", path.display()),
        hint: None,
    })?;
    RegistryConfig::from_toml(&text).map_err(registry_err)
}

/// Load the three registries. Any failure here means no data, so callers
/// return before building anything.
fn load_input(input: &Path, config: &RegistryConfig) -> Result<LoadedRegistry, CliError> {
    civreg_io::load(input, config).map_err(|e| {
        let hint = match e {
            civreg_io::IoError::MissingFile(_) => Some("pass a workbook (.xlsx/.xls/.ods) or a directory of CSV files".into()),
            civreg_io::IoError::MissingSheet { .. } => Some(format!(
                "expected sheets: {}, {}, {} (override with [sheets] in --config)",
                config.sheets.women, config.sheets.men, config.sheets.marriages
            )),
            _ => None,
        };
        CliError {
            code: io_exit_code(&e),
            message: e.to_string(),
            hint,
        }
    })
}

fn build_stores(loaded: LoadedRegistry) -> (OrderedIndex, DirectTable, Vec<MarriageEvent>) {
    let (index, men_duplicates) = build_index(loaded.men);
    let (table, women_duplicates) = build_table(loaded.women);
    if !men_duplicates.is_empty() || !women_duplicates.is_empty() {
        info!(
            men = men_duplicates.len(),
            women = women_duplicates.len(),
            "duplicate ids dropped (first row kept)"
        );
    }
    (index, table, loaded.marriages)
}

fn emit_report(
    report: &RegistryReport,
    config: &RegistryConfig,
    json_output: bool,
    output_file: Option<&Path>,
) -> Result<(), CliError> {
    if let Some(path) = output_file {
        write_output(report, config, path)?;
        eprintln!("wrote {}", path.display());
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if json_output {
        let json = serde_json::to_string_pretty(report)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        writeln!(handle, "{json}").map_err(|e| CliError::io(e.to_string()))?;
    } else {
        render::write_report(&mut handle, report, config).map_err(|e| CliError::io(e.to_string()))?;
    }
    Ok(())
}

fn write_output(report: &RegistryReport, config: &RegistryConfig, path: &Path) -> Result<(), CliError> {
    let is_xlsx = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));

    if is_xlsx {
        return civreg_io::xlsx::export_workbook(report, path, config).map_err(|e| CliError {
            code: io_exit_code(&e),
            message: e.to_string(),
            hint: None,
        });
    }

    let json = serde_json::to_string_pretty(report)
        .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
    std::fs::write(path, json).map_err(|e| CliError {
        code: EXIT_OUTPUT,
        message: format!("cannot write {}: {e}", path.display()),
        hint: None,
    })
}

// ============================================================================
// reconcile
// ============================================================================

pub fn cmd_reconcile(
    input: PathBuf,
    config_path: Option<PathBuf>,
    edits: Vec<String>,
    json_output: bool,
    output_file: Option<PathBuf>,
) -> Result<(), CliError> {
    // Malformed edits are usage errors, caught before any loading
    let edits: Vec<(PersonId, RecordUpdate)> = edits
        .iter()
        .map(|e| parse_edit(e))
        .collect::<Result<_, _>>()
        .map_err(|e| registry_err(e).with_hint("--edit takes ID:FIELD=VALUE, e.g. 21789423:status=Unión Libre"))?;

    let config = load_config(config_path.as_deref())?;
    let loaded = load_input(&input, &config)?;
    let load_summary = loaded.stats.summary();
    let (mut index, mut table, marriages) = build_stores(loaded);

    // Edits are reported and skipped on failure; the rest of the run continues
    for (id, update) in &edits {
        match apply_partial_update(&mut index, *id, update) {
            Ok(record) => eprintln!("edited {}: status {}", record.id, record.status),
            Err(e) => {
                warn!(%id, error = %e, "edit skipped");
                eprintln!("warning: edit skipped: {e}");
            }
        }
    }

    let outcome = match reconcile(&mut index, &mut table, &marriages) {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            eprintln!("warning: reconciliation skipped: {e}");
            None
        }
    };

    let report = build_report(&input.display().to_string(), &index, &table, outcome.as_ref());
    emit_report(&report, &config, json_output, output_file.as_deref())?;

    let s = &report.summary;
    eprintln!(
        "loaded {load_summary}; {} events, {} men married, {} women married, {} ids not found",
        s.events, s.men.married, s.women.married, s.misses,
    );
    Ok(())
}

// ============================================================================
// show
// ============================================================================

pub fn cmd_show(input: PathBuf, config_path: Option<PathBuf>, json_output: bool) -> Result<(), CliError> {
    let config = load_config(config_path.as_deref())?;
    let loaded = load_input(&input, &config)?;
    let (index, table, _) = build_stores(loaded);

    let report = build_report(&input.display().to_string(), &index, &table, None);
    emit_report(&report, &config, json_output, None)
}

// ============================================================================
// lookup
// ============================================================================

pub fn cmd_lookup(input: PathBuf, id: String, config_path: Option<PathBuf>, json_output: bool) -> Result<(), CliError> {
    let id: PersonId = id.parse().map_err(|_| CliError {
        code: EXIT_USAGE,
        message: format!("invalid id '{id}' (expected digits)"),
        hint: None,
    })?;

    let config = load_config(config_path.as_deref())?;
    let loaded = load_input(&input, &config)?;
    let (index, table, _) = build_stores(loaded);

    let man = index.find_by_id(id).cloned();
    let woman = table.find_by_id(id).cloned();
    if man.is_none() && woman.is_none() {
        return Err(CliError {
            code: EXIT_NOT_FOUND,
            message: format!("id {id} not found in either registry"),
            hint: None,
        });
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if json_output {
        let json = serde_json::json!({ "men": man, "women": woman });
        writeln!(handle, "{json}").map_err(|e| CliError::io(e.to_string()))?;
        return Ok(());
    }

    let found = [
        (&config.sheets.men, man, Sex::Male),
        (&config.sheets.women, woman, Sex::Female),
    ];
    for (sheet, record, sex) in found {
        if let Some(record) = record {
            writeln!(handle, "--- {} ---", sheet.to_uppercase()).map_err(|e| CliError::io(e.to_string()))?;
            render::write_people(&mut handle, &[record], sex, &config).map_err(|e| CliError::io(e.to_string()))?;
        }
    }
    Ok(())
}

// ============================================================================
// validate
// ============================================================================

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(Some(&config_path))?;
    eprintln!(
        "valid: sheets {}, {}, {}; id column '{}'",
        config.sheets.women, config.sheets.men, config.sheets.marriages, config.columns.id,
    );
    Ok(())
}
