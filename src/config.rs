// Dashboard configuration: per-type targets, which types the overview shows,
// and their display titles. Passed explicitly into every aggregation call.
use crate::types::FacilityType;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const DEFAULT_TOTAL_TARGET: u64 = 700;

static DEFAULT_TARGETS: Lazy<BTreeMap<String, u64>> = Lazy::new(|| {
    [
        ("Total", DEFAULT_TOTAL_TARGET),
        ("School", 100),
        ("Clinic", 350),
        ("Well", 200),
        ("Vaccine", 50),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
});

static DEFAULT_TITLES: Lazy<BTreeMap<String, String>> = Lazy::new(|| {
    [
        ("Total", "All Facility Types"),
        ("School", "Educational Facilities"),
        ("Clinic", "Health Facilities"),
        ("Well", "Water Facilities"),
        ("Vaccine", "Vaccination Facilities"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
});

const DEFAULT_FACILITY_TYPES: [&str; 4] = ["School", "Clinic", "Well", "Vaccine"];

/// Goal counts of energized facilities, keyed by type label. The `"Total"`
/// entry is the fallback for types without their own target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Targets(BTreeMap<String, u64>);

impl Targets {
    /// Exact key, then case-insensitive key, then `"Total"`, then 0.
    pub fn lookup(&self, facility_type: &FacilityType) -> u64 {
        let label = facility_type.label();
        self.0
            .get(label)
            .or_else(|| {
                self.0
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(label))
                    .map(|(_, v)| v)
            })
            .or_else(|| self.0.get(FacilityType::TOTAL_LABEL))
            .copied()
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.lookup(&FacilityType::Total)
    }
}

impl Default for Targets {
    fn default() -> Self {
        Self(DEFAULT_TARGETS.clone())
    }
}

impl<'a> FromIterator<(&'a str, u64)> for Targets {
    fn from_iter<I: IntoIterator<Item = (&'a str, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub targets: Targets,
    pub facility_types: Vec<String>,
    pub titles: BTreeMap<String, String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            targets: Targets::default(),
            facility_types: DEFAULT_FACILITY_TYPES.iter().map(|s| s.to_string()).collect(),
            titles: DEFAULT_TITLES.clone(),
        }
    }
}

impl DashboardConfig {
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        let mut cfg: DashboardConfig = serde_json::from_str(s)?;
        if !cfg.targets.0.contains_key(FacilityType::TOTAL_LABEL) {
            let total = DEFAULT_TOTAL_TARGET;
            tracing::warn!(total, "config has no Total target, using default");
            cfg.targets.0.insert(FacilityType::TOTAL_LABEL.to_string(), total);
        }
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(Self::from_json_str(&raw)?)
    }

    /// Display title for a type; falls back to the label itself.
    pub fn title_for(&self, facility_type: &FacilityType) -> String {
        let label = facility_type.label();
        self.titles
            .get(label)
            .or_else(|| {
                self.titles
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(label))
                    .map(|(_, v)| v)
            })
            .cloned()
            .unwrap_or_else(|| label.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_falls_back_to_total() {
        let targets: Targets = [("Total", 700)].into_iter().collect();
        assert_eq!(targets.lookup(&FacilityType::parse("Well")), 700);
        let empty: Targets = std::iter::empty().collect();
        assert_eq!(empty.lookup(&FacilityType::parse("Well")), 0);
    }

    #[test]
    fn lookup_prefers_exact_then_case_insensitive() {
        let targets: Targets = [("Total", 700), ("School", 100), ("school", 90)]
            .into_iter()
            .collect();
        assert_eq!(targets.lookup(&FacilityType::parse("School")), 100);
        assert_eq!(targets.lookup(&FacilityType::parse("school")), 90);
        assert_eq!(targets.lookup(&FacilityType::parse("SCHOOL")), 100);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg = DashboardConfig::from_json_str(r#"{"targets": {"School": 120}}"#).unwrap();
        assert_eq!(cfg.targets.lookup(&FacilityType::parse("School")), 120);
        assert_eq!(cfg.targets.total(), 700);
        assert_eq!(cfg.facility_types, vec!["School", "Clinic", "Well", "Vaccine"]);
        assert_eq!(cfg.title_for(&FacilityType::parse("clinic")), "Health Facilities");
        assert_eq!(cfg.title_for(&FacilityType::parse("Depot")), "Depot");
    }
}
