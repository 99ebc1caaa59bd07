//! Inactive computer selection.

use chrono::{DateTime, Utc};
use std::cmp::Reverse;

use crate::inventory::asset::AssetRecord;

/// Normalized asset types that count as computers.
pub const COMPUTER_TYPES: [&str; 4] = ["computer", "desktop", "laptop", "workstation"];

pub fn is_computer(record: &AssetRecord) -> bool {
    COMPUTER_TYPES.contains(&record.normalized_type().as_str())
}

/// Select inactive computers, longest silence first.
pub fn select_inactive_computers(records: &[AssetRecord]) -> Vec<AssetRecord> {
    select_inactive_computers_at(records, Utc::now())
}

/// Select inactive computers relative to `now`.
///
/// Ties keep their input order.
pub fn select_inactive_computers_at(records: &[AssetRecord], now: DateTime<Utc>) -> Vec<AssetRecord> {
    let mut selected: Vec<(i64, &AssetRecord)> = records
        .iter()
        .filter(|record| is_computer(record))
        .filter(|record| record.is_inactive_at(now))
        .map(|record| (record.days_since_last_communication_at(now), record))
        .collect();

    // sort_by_key is stable
    selected.sort_by_key(|(days, _)| Reverse(*days));
    selected.into_iter().map(|(_, record)| record.clone()).collect()
}
