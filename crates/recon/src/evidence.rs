use crate::engine::ReconcileOutcome;
use crate::index::OrderedIndex;
use crate::model::{MaritalStatus, PersonRecord, RegistryReport, RegistrySummary, ReportMeta, StatusCounts};
use crate::table::DirectTable;

/// Tally statuses over a sequence of records.
pub fn count_statuses<'a>(records: impl IntoIterator<Item = &'a PersonRecord>) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for record in records {
        counts.total += 1;
        match record.status {
            MaritalStatus::Single => counts.single += 1,
            MaritalStatus::Married => counts.married += 1,
            MaritalStatus::Other(_) => counts.other += 1,
        }
    }
    counts
}

/// Snapshot both stores for the reporter. `outcome` is `None` when no
/// reconciliation ran.
pub fn build_report(
    source: &str,
    index: &OrderedIndex,
    table: &DirectTable,
    outcome: Option<&ReconcileOutcome>,
) -> RegistryReport {
    let empty = ReconcileOutcome::default();
    let applied = outcome.unwrap_or(&empty);

    RegistryReport {
        meta: ReportMeta {
            source: source.to_string(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            reconciled: outcome.is_some(),
        },
        summary: RegistrySummary {
            men: count_statuses(index),
            women: count_statuses(table),
            events: applied.events,
            women_updated: applied.women_updated,
            men_updated: applied.men_updated,
            misses: applied.misses.len(),
        },
        men: index.to_ordered_vec(),
        women: table.to_vec(),
        misses: applied.misses.clone(),
    }
}
