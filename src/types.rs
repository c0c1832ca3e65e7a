use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::Tabled;

/// Pipeline stage of a facility. Declaration order is the stage order, so the
/// derived `Ord` sorts Under Design first and Energized last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Status {
    #[serde(rename = "Under Design")]
    UnderDesign,
    #[serde(rename = "Tender launched")]
    TenderLaunched,
    #[serde(rename = "Contract awarded")]
    ContractAwarded,
    #[serde(rename = "Energized")]
    Energized,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::UnderDesign,
        Status::TenderLaunched,
        Status::ContractAwarded,
        Status::Energized,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Status::UnderDesign => "Under Design",
            Status::TenderLaunched => "Tender launched",
            Status::ContractAwarded => "Contract awarded",
            Status::Energized => "Energized",
        }
    }

    /// Case-sensitive match against the canonical labels; surrounding
    /// whitespace is ignored.
    pub fn parse(s: &str) -> Option<Status> {
        let s = s.trim();
        Status::ALL.into_iter().find(|st| st.label() == s)
    }

    /// Position in the pipeline, usable as an index into `[_; 4]` arrays.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Facility-type selector. `Total` aggregates across every type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FacilityType {
    Total,
    Named(String),
}

impl FacilityType {
    pub const TOTAL_LABEL: &'static str = "Total";

    pub fn parse(s: &str) -> FacilityType {
        let s = s.trim();
        if s.eq_ignore_ascii_case(Self::TOTAL_LABEL) {
            FacilityType::Total
        } else {
            FacilityType::Named(s.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            FacilityType::Total => Self::TOTAL_LABEL,
            FacilityType::Named(name) => name,
        }
    }

    /// Whether a row's `type` value belongs to this selection.
    pub fn matches(&self, row_type: &str) -> bool {
        match self {
            FacilityType::Total => true,
            FacilityType::Named(name) => name.eq_ignore_ascii_case(row_type.trim()),
        }
    }
}

impl fmt::Display for FacilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the source table as read from disk. Every column is kept as an
/// optional string so that absent or garbled cells never fail the row.
#[derive(Debug, Default, Deserialize)]
pub struct RawRow {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "type")]
    pub facility_type: Option<String>,
    #[serde(default)]
    pub n_facilities: Option<String>,
    #[serde(default)]
    pub total_beneficiaries: Option<String>,
    #[serde(default)]
    pub female_beneficiaries: Option<String>,
    #[serde(default)]
    pub male_beneficiaries: Option<String>,
    #[serde(default)]
    pub solar_capacity_kw: Option<String>,
    #[serde(default)]
    pub storage_capacity_kwh: Option<String>,
}

/// Optional numeric columns; anything absent or unparseable is zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FacilityMetrics {
    pub total_beneficiaries: f64,
    pub female_beneficiaries: f64,
    pub male_beneficiaries: f64,
    pub solar_capacity_kw: f64,
    pub storage_capacity_kwh: f64,
}

impl FacilityMetrics {
    pub fn add(&mut self, other: &FacilityMetrics) {
        self.total_beneficiaries += other.total_beneficiaries;
        self.female_beneficiaries += other.female_beneficiaries;
        self.male_beneficiaries += other.male_beneficiaries;
        self.solar_capacity_kw += other.solar_capacity_kw;
        self.storage_capacity_kwh += other.storage_capacity_kwh;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FacilityRecord {
    pub date: NaiveDate,
    pub facility_type: String,
    pub status: Status,
    pub n_facilities: u64,
    pub metrics: FacilityMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilitySummary {
    #[serde(rename = "type")]
    pub facility_type: String,
    pub title: String,
    pub target: u64,
    pub energized: u64,
    pub in_progress: u64,
    pub planned: u64,
    pub percent: f64,
    pub increase: i64,
    pub energized_trend: Vec<u64>,
    pub dates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeLogEntry {
    pub status: Status,
    pub previous_count: u64,
    pub current_count: u64,
    pub change: i64,
    pub percent_change: Option<f64>,
}

/// Headline figures for the latest snapshot, energized facilities only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallStatistics {
    pub as_of: Option<NaiveDate>,
    pub energized_facilities: u64,
    pub target: u64,
    pub total_beneficiaries: f64,
    pub female_beneficiaries: f64,
    pub male_beneficiaries: f64,
    pub solar_capacity_kw: f64,
    pub storage_capacity_kwh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RolloutPoint {
    pub date: NaiveDate,
    pub status: Status,
    pub n_facilities: u64,
}

/// Stacked-chart payload: long-format points plus the target line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RolloutChart {
    pub target: u64,
    pub points: Vec<RolloutPoint>,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SummaryRow {
    #[serde(rename = "Facilities")]
    #[tabled(rename = "Facilities")]
    pub title: String,
    #[serde(rename = "Energized")]
    #[tabled(rename = "Energized")]
    pub energized: String,
    #[serde(rename = "Increase")]
    #[tabled(rename = "Increase")]
    pub increase: String,
    #[serde(rename = "InProgress")]
    #[tabled(rename = "InProgress")]
    pub in_progress: String,
    #[serde(rename = "Planned")]
    #[tabled(rename = "Planned")]
    pub planned: String,
    #[serde(rename = "Target")]
    #[tabled(rename = "Target")]
    pub target: String,
    #[serde(rename = "TargetAchieved")]
    #[tabled(rename = "TargetAchieved")]
    pub target_achieved: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ChangeLogRow {
    #[serde(rename = "Status")]
    #[tabled(rename = "Status")]
    pub status: String,
    #[serde(rename = "Previous")]
    #[tabled(rename = "Previous")]
    pub previous: String,
    #[serde(rename = "Current")]
    #[tabled(rename = "Current")]
    pub current: String,
    #[serde(rename = "Change")]
    #[tabled(rename = "Change")]
    pub change: String,
    #[serde(rename = "PercentChange")]
    #[tabled(rename = "% Change")]
    pub percent_change: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RolloutRow {
    #[serde(rename = "date")]
    #[tabled(rename = "Date")]
    pub date: String,
    #[serde(rename = "Under Design")]
    #[tabled(rename = "Under Design")]
    pub under_design: u64,
    #[serde(rename = "Tender launched")]
    #[tabled(rename = "Tender launched")]
    pub tender_launched: u64,
    #[serde(rename = "Contract awarded")]
    #[tabled(rename = "Contract awarded")]
    pub contract_awarded: u64,
    #[serde(rename = "Energized")]
    #[tabled(rename = "Energized")]
    pub energized: u64,
    #[serde(rename = "target")]
    #[tabled(rename = "Target")]
    pub target: u64,
}
