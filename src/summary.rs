use crate::config::{DashboardConfig, Targets};
use crate::loader::SnapshotTable;
use crate::types::{
    FacilityMetrics, FacilitySummary, FacilityType, OverallStatistics, RolloutChart, RolloutPoint,
    RolloutRow, Status,
};
use crate::util::{count_delta, iso_date, round_to, title_case};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Dense date x status matrix of facility counts for one facility-type slice.
/// Rows are the distinct dates of the slice in ascending order; every status
/// has a column, zero where no rows exist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusMatrix {
    dates: Vec<NaiveDate>,
    counts: Vec<[u64; 4]>,
}

impl StatusMatrix {
    /// Duplicate (date, status) rows are summed, never overwritten. Sums
    /// saturate at `u64::MAX`.
    pub fn build(table: &SnapshotTable, selection: &FacilityType) -> Self {
        let mut grouped: BTreeMap<NaiveDate, [u64; 4]> = BTreeMap::new();
        for r in table
            .records()
            .iter()
            .filter(|r| selection.matches(&r.facility_type))
        {
            let cell = &mut grouped.entry(r.date).or_insert([0; 4])[r.status.index()];
            *cell = cell.saturating_add(r.n_facilities);
        }
        let (dates, counts) = grouped.into_iter().unzip();
        Self { dates, counts }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn column(&self, status: Status) -> Vec<u64> {
        self.counts.iter().map(|c| c[status.index()]).collect()
    }

    /// Row-wise sum of every status other than Energized.
    pub fn not_energized(&self) -> Vec<u64> {
        self.counts
            .iter()
            .map(|c| {
                Status::ALL
                    .into_iter()
                    .filter(|s| *s != Status::Energized)
                    .fold(0u64, |acc, s| acc.saturating_add(c[s.index()]))
            })
            .collect()
    }

    /// Long format for stacked charts: sorted by date, then pipeline order.
    pub fn points(&self) -> Vec<RolloutPoint> {
        self.dates
            .iter()
            .zip(&self.counts)
            .flat_map(|(date, c)| {
                Status::ALL.into_iter().map(move |status| RolloutPoint {
                    date: *date,
                    status,
                    n_facilities: c[status.index()],
                })
            })
            .collect()
    }

    /// Long-format points paired with the target line for the same slice.
    pub fn chart(&self, target: u64) -> RolloutChart {
        RolloutChart {
            target,
            points: self.points(),
        }
    }

    /// Wide rows carrying the target line alongside the stacked counts.
    pub fn rows(&self, target: u64) -> Vec<RolloutRow> {
        self.dates
            .iter()
            .zip(&self.counts)
            .map(|(date, c)| RolloutRow {
                date: iso_date(*date),
                under_design: c[Status::UnderDesign.index()],
                tender_launched: c[Status::TenderLaunched.index()],
                contract_awarded: c[Status::ContractAwarded.index()],
                energized: c[Status::Energized.index()],
                target,
            })
            .collect()
    }
}

/// Latest-snapshot progress figures for one facility type, or for every type
/// when the selection is `Total`. An unknown type yields all-zero figures.
pub fn extract_facility_summary(
    table: &SnapshotTable,
    selection: &FacilityType,
    targets: &Targets,
) -> FacilitySummary {
    let matrix = StatusMatrix::build(table, selection);
    let energized_trend = matrix.column(Status::Energized);
    let not_energized_trend = matrix.not_energized();

    let target = targets.lookup(selection);
    let energized = energized_trend.last().copied().unwrap_or(0);
    let in_progress = not_energized_trend.last().copied().unwrap_or(0);
    let percent = if target > 0 {
        round_to(energized as f64 / target as f64, 3)
    } else {
        0.0
    };
    let increase = match energized_trend.as_slice() {
        [.., prev, last] => count_delta(*prev, *last),
        _ => 0,
    };

    tracing::debug!(
        facility_type = %selection,
        dates = matrix.len(),
        energized,
        in_progress,
        target,
        "facility summary extracted"
    );

    let label = title_case(selection.label());
    FacilitySummary {
        facility_type: label.clone(),
        title: label,
        target,
        energized,
        in_progress,
        planned: energized.saturating_add(in_progress),
        percent,
        increase,
        energized_trend,
        dates: matrix.dates().iter().map(|d| iso_date(*d)).collect(),
    }
}

/// One summary per configured dashboard type, titled for display.
pub fn extract_all_facility_summaries(
    table: &SnapshotTable,
    config: &DashboardConfig,
) -> Vec<FacilitySummary> {
    config
        .facility_types
        .iter()
        .map(|label| {
            let selection = FacilityType::parse(label);
            let mut summary = extract_facility_summary(table, &selection, &config.targets);
            summary.title = config.title_for(&selection);
            summary
        })
        .collect()
}

/// Headline totals over Energized rows at the latest snapshot date.
pub fn overall_statistics(table: &SnapshotTable, targets: &Targets) -> OverallStatistics {
    let as_of = table.latest_date();
    let mut energized_facilities = 0u64;
    let mut metrics = FacilityMetrics::default();

    if let Some(latest) = as_of {
        for r in table
            .records()
            .iter()
            .filter(|r| r.date == latest && r.status == Status::Energized)
        {
            energized_facilities = energized_facilities.saturating_add(r.n_facilities);
            metrics.add(&r.metrics);
        }
    }

    OverallStatistics {
        as_of,
        energized_facilities,
        target: targets.total(),
        total_beneficiaries: metrics.total_beneficiaries,
        female_beneficiaries: metrics.female_beneficiaries,
        male_beneficiaries: metrics.male_beneficiaries,
        solar_capacity_kw: metrics.solar_capacity_kw,
        storage_capacity_kwh: metrics.storage_capacity_kwh,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FacilityRecord;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(date: NaiveDate, status: Status, facility_type: &str, n: u64) -> FacilityRecord {
        FacilityRecord {
            date,
            facility_type: facility_type.to_string(),
            status,
            n_facilities: n,
            metrics: FacilityMetrics::default(),
        }
    }

    fn school_table() -> SnapshotTable {
        SnapshotTable::from_records(vec![
            record(day(2024, 1, 1), Status::Energized, "School", 10),
            record(day(2024, 2, 1), Status::Energized, "School", 15),
            record(day(2024, 2, 1), Status::UnderDesign, "School", 5),
        ])
    }

    #[test]
    fn school_scenario() {
        let targets: Targets = [("School", 100)].into_iter().collect();
        let s = extract_facility_summary(&school_table(), &FacilityType::parse("School"), &targets);
        assert_eq!(s.facility_type, "School");
        assert_eq!(s.energized, 15);
        assert_eq!(s.in_progress, 5);
        assert_eq!(s.planned, 20);
        assert_eq!(s.percent, 0.15);
        assert_eq!(s.increase, 5);
        assert_eq!(s.dates, vec!["2024-01-01", "2024-02-01"]);
        assert_eq!(s.energized_trend, vec![10, 15]);
    }

    #[test]
    fn zero_target_never_divides() {
        let targets: Targets = [("Total", 0)].into_iter().collect();
        let s = extract_facility_summary(&school_table(), &FacilityType::Total, &targets);
        assert_eq!(s.target, 0);
        assert_eq!(s.percent, 0.0);
        assert!(s.percent.is_finite());
    }

    #[test]
    fn missing_type_target_uses_total() {
        let targets: Targets = [("Total", 700)].into_iter().collect();
        let s = extract_facility_summary(&school_table(), &FacilityType::parse("Well"), &targets);
        assert_eq!(s.target, 700);
    }

    #[test]
    fn unknown_type_is_all_zero() {
        let targets = Targets::default();
        let s = extract_facility_summary(&school_table(), &FacilityType::parse("Depot"), &targets);
        assert_eq!(s.energized, 0);
        assert_eq!(s.in_progress, 0);
        assert_eq!(s.planned, 0);
        assert_eq!(s.increase, 0);
        assert!(s.dates.is_empty());
        assert!(s.energized_trend.is_empty());
    }

    #[test]
    fn single_date_has_no_increase() {
        let table = SnapshotTable::from_records(vec![
            record(day(2024, 3, 1), Status::Energized, "Clinic", 8),
            record(day(2024, 3, 1), Status::Energized, "Clinic", 4),
        ]);
        let s = extract_facility_summary(&table, &FacilityType::parse("clinic"), &Targets::default());
        assert_eq!(s.increase, 0);
        // duplicate rows are summed
        assert_eq!(s.energized, 12);
        assert_eq!(s.facility_type, "Clinic");
    }

    #[test]
    fn trend_is_sorted_and_deduplicated() {
        let table = SnapshotTable::from_records(vec![
            record(day(2024, 3, 1), Status::Energized, "Well", 9),
            record(day(2024, 1, 1), Status::TenderLaunched, "Well", 2),
            record(day(2024, 2, 1), Status::Energized, "Clinic", 4),
            record(day(2024, 1, 1), Status::Energized, "Well", 1),
            record(day(2024, 3, 1), Status::ContractAwarded, "Well", 3),
        ]);
        let s = extract_facility_summary(&table, &FacilityType::Total, &Targets::default());
        assert_eq!(s.dates.len(), s.energized_trend.len());
        assert_eq!(s.dates, vec!["2024-01-01", "2024-02-01", "2024-03-01"]);
        assert_eq!(s.energized_trend, vec![1, 4, 9]);
        assert_eq!(s.in_progress, 3);
        assert_eq!(s.increase, 5);
    }

    #[test]
    fn energized_missing_from_slice_gives_zero_series() {
        let table = SnapshotTable::from_records(vec![
            record(day(2024, 1, 1), Status::UnderDesign, "Well", 2),
            record(day(2024, 2, 1), Status::UnderDesign, "Well", 6),
        ]);
        let s = extract_facility_summary(&table, &FacilityType::parse("Well"), &Targets::default());
        assert_eq!(s.energized_trend, vec![0, 0]);
        assert_eq!(s.in_progress, 6);
        assert_eq!(s.percent, 0.0);
    }

    #[test]
    fn repeated_calls_are_identical_and_leave_input_alone() {
        let table = school_table();
        let before = table.clone();
        let targets = Targets::default();
        let a = extract_facility_summary(&table, &FacilityType::parse("School"), &targets);
        let b = extract_facility_summary(&table.clone(), &FacilityType::parse("School"), &targets);
        assert_eq!(a, b);
        assert_eq!(table, before);
    }

    #[test]
    fn oversized_count_in_source_does_not_overflow() {
        let csv = "\
date,status,type,n_facilities
2024-01-01,Energized,School,99999999999999999999
2024-01-01,Energized,School,99999999999999999999
2024-01-01,Under Design,School,5
";
        let (table, _) = crate::loader::load_from_reader(csv.as_bytes(), b',').unwrap();
        let s = extract_facility_summary(&table, &FacilityType::Total, &Targets::default());
        assert_eq!(s.energized, 0);
        assert_eq!(s.in_progress, 5);
        assert_eq!(s.planned, 5);
    }

    #[test]
    fn unknown_statuses_are_not_in_progress() {
        let csv = "\
date,status,type,n_facilities
2024-01-01,Under Design,School,3
2024-01-01,Commissioned,School,40
2024-01-01,Energized,School,2
";
        let (table, report) = crate::loader::load_from_reader(csv.as_bytes(), b',').unwrap();
        assert_eq!(report.dropped_statuses, 1);
        let s = extract_facility_summary(&table, &FacilityType::Total, &Targets::default());
        assert_eq!(s.in_progress, 3);
        assert_eq!(s.planned, 5);
    }

    #[test]
    fn huge_counts_saturate_instead_of_wrapping() {
        let table = SnapshotTable::from_records(vec![
            record(day(2024, 1, 1), Status::Energized, "School", 0),
            record(day(2024, 2, 1), Status::Energized, "School", u64::MAX),
            record(day(2024, 2, 1), Status::Energized, "School", u64::MAX),
            record(day(2024, 2, 1), Status::UnderDesign, "School", u64::MAX),
            record(day(2024, 2, 1), Status::TenderLaunched, "School", 1),
        ]);
        let s = extract_facility_summary(&table, &FacilityType::Total, &Targets::default());
        assert_eq!(s.energized, u64::MAX);
        assert_eq!(s.in_progress, u64::MAX);
        assert_eq!(s.planned, u64::MAX);
        assert_eq!(s.increase, i64::MAX);
        assert_eq!(overall_statistics(&table, &Targets::default()).energized_facilities, u64::MAX);
    }

    #[test]
    fn chart_carries_target_line() {
        let matrix = StatusMatrix::build(&school_table(), &FacilityType::parse("School"));
        assert!(!matrix.is_empty());
        let chart = matrix.chart(100);
        assert_eq!(chart.target, 100);
        assert_eq!(chart.points.len(), 8);
        let json = serde_json::to_value(&chart).unwrap();
        assert_eq!(json["target"], 100);
        assert_eq!(json["points"][7]["status"], "Energized");
        assert_eq!(json["points"][7]["n_facilities"], 15);
        assert_eq!(json["points"][7]["date"], "2024-02-01");

        let empty = StatusMatrix::build(&school_table(), &FacilityType::parse("Depot"));
        assert!(empty.is_empty());
        assert!(empty.chart(700).points.is_empty());
    }

    #[test]
    fn matrix_is_dense_and_ordered() {
        let matrix = StatusMatrix::build(&school_table(), &FacilityType::Total);
        let points = matrix.points();
        assert_eq!(points.len(), 8);
        assert_eq!(points[0].status, Status::UnderDesign);
        assert_eq!(points[0].n_facilities, 0);
        assert_eq!(points[4].date, day(2024, 2, 1));
        assert_eq!(points[4].n_facilities, 5);
        assert_eq!(matrix.column(Status::Energized), vec![10, 15]);
        assert_eq!(matrix.not_energized(), vec![0, 5]);

        let rows = matrix.rows(100);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].energized, 15);
        assert_eq!(rows[1].under_design, 5);
        assert_eq!(rows[1].target, 100);
    }

    #[test]
    fn all_summaries_follow_config_order_and_titles() {
        let summaries = extract_all_facility_summaries(&school_table(), &DashboardConfig::default());
        let titles: Vec<&str> = summaries.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Educational Facilities",
                "Health Facilities",
                "Water Facilities",
                "Vaccination Facilities"
            ]
        );
        assert_eq!(summaries[0].energized, 15);
        assert_eq!(summaries[0].target, 100);
        assert_eq!(summaries[1].energized, 0);
    }

    #[test]
    fn overall_statistics_use_latest_energized_rows() {
        let mut energized = record(day(2024, 2, 1), Status::Energized, "School", 15);
        energized.metrics = FacilityMetrics {
            total_beneficiaries: 1800.0,
            female_beneficiaries: 900.0,
            male_beneficiaries: 900.0,
            solar_capacity_kw: 22.5,
            storage_capacity_kwh: 40.0,
        };
        let mut pending = record(day(2024, 2, 1), Status::UnderDesign, "School", 5);
        pending.metrics.total_beneficiaries = 400.0;
        let mut old = record(day(2024, 1, 1), Status::Energized, "Clinic", 10);
        old.metrics.total_beneficiaries = 999.0;

        let table = SnapshotTable::from_records(vec![old, energized, pending]);
        let stats = overall_statistics(&table, &Targets::default());
        assert_eq!(stats.as_of, Some(day(2024, 2, 1)));
        assert_eq!(stats.energized_facilities, 15);
        assert_eq!(stats.total_beneficiaries, 1800.0);
        assert_eq!(stats.solar_capacity_kw, 22.5);
        assert_eq!(stats.storage_capacity_kwh, 40.0);
        assert_eq!(stats.target, 700);
    }

    #[test]
    fn overall_statistics_on_empty_table() {
        let stats = overall_statistics(&SnapshotTable::default(), &Targets::default());
        assert_eq!(stats.as_of, None);
        assert_eq!(stats.energized_facilities, 0);
    }
}
