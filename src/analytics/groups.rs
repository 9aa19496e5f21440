//! Per-type group comparison: count and per-column means for every
//! distinct `Type` value present in the dataset.
//!
//! Independent of dataset-wide statistics - never touches global quantiles
//! or outlier state. The set of groups is derived from the data itself, so
//! every group has at least one row and defined means.

use crate::types::{EquipmentRecord, TypeGroupStats};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// Partition records by `Type` and aggregate each partition.
#[must_use]
pub fn type_comparison(records: &[EquipmentRecord]) -> BTreeMap<String, TypeGroupStats> {
    let mut groups: BTreeMap<&str, Vec<&EquipmentRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry(record.equipment_type.as_str())
            .or_default()
            .push(record);
    }

    groups
        .into_iter()
        .map(|(equipment_type, members)| {
            let column = |f: fn(&EquipmentRecord) -> f64| -> f64 {
                members.iter().map(|r| f(r)).mean()
            };
            let stats = TypeGroupStats {
                count: members.len(),
                avg_flowrate: column(|r| r.flowrate),
                avg_pressure: column(|r| r.pressure),
                avg_temperature: column(|r| r.temperature),
            };
            (equipment_type.to_string(), stats)
        })
        .collect()
}
