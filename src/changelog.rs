use crate::loader::SnapshotTable;
use crate::types::{ChangeLogEntry, Status};
use crate::util::{count_delta, round_to};
use chrono::NaiveDate;

fn counts_at(table: &SnapshotTable, date: NaiveDate) -> [u64; 4] {
    let mut counts = [0u64; 4];
    for r in table.records().iter().filter(|r| r.date == date) {
        let cell = &mut counts[r.status.index()];
        *cell = cell.saturating_add(r.n_facilities);
    }
    counts
}

/// Status-by-status comparison of two snapshots. Always one entry per
/// canonical status, in pipeline order; statuses without rows count as zero.
/// `percent_change` is `None` when the previous count is zero.
pub fn build_change_log(
    table: &SnapshotTable,
    previous: NaiveDate,
    current: NaiveDate,
) -> Vec<ChangeLogEntry> {
    let before = counts_at(table, previous);
    let after = counts_at(table, current);
    tracing::debug!(%previous, %current, "building change log");

    Status::ALL
        .into_iter()
        .map(|status| {
            let previous_count = before[status.index()];
            let current_count = after[status.index()];
            let change = count_delta(previous_count, current_count);
            let percent_change = (previous_count > 0).then(|| {
                let delta = current_count as f64 - previous_count as f64;
                round_to(delta / previous_count as f64 * 100.0, 1)
            });
            ChangeLogEntry {
                status,
                previous_count,
                current_count,
                change,
                percent_change,
            }
        })
        .collect()
}

/// Default comparison pair: (second-latest, latest). With a single snapshot
/// both sides are the latest date.
pub fn default_comparison_dates(table: &SnapshotTable) -> Option<(NaiveDate, NaiveDate)> {
    match table.dates().as_slice() {
        [] => None,
        [only] => Some((*only, *only)),
        [.., prev, last] => Some((*prev, *last)),
    }
}
