//! Asset record model.
//!
//! # Responsibilities
//! - Represent one inventory asset as reported upstream
//! - Derive days since last contact and inactivity at read time
//!
//! Derived values are never stored, so they cannot go stale.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Days without communication past which an asset is inactive.
pub const INACTIVITY_THRESHOLD_DAYS: i64 = 60;

/// Sentinel age for assets that never communicated.
pub const NEVER_COMMUNICATED_DAYS: i64 = i64::MAX;

/// A single inventory asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    id: String,
    name: String,
    asset_type: String,
    serial_number: String,
    last_communication_at: Option<DateTime<Utc>>,
    public_ip: Option<String>,
}

impl AssetRecord {
    /// Create a record with no communication history.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        asset_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            asset_type: asset_type.into(),
            serial_number: String::new(),
            last_communication_at: None,
            public_ip: None,
        }
    }

    pub fn with_serial_number(mut self, serial_number: impl Into<String>) -> Self {
        self.serial_number = serial_number.into();
        self
    }

    pub fn with_last_communication(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.last_communication_at = at;
        self
    }

    pub fn with_public_ip(mut self, ip: Option<String>) -> Self {
        self.public_ip = ip;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Category as reported upstream (free-form, any casing).
    pub fn asset_type(&self) -> &str {
        &self.asset_type
    }

    /// Category trimmed and lowercased for comparisons.
    pub fn normalized_type(&self) -> String {
        self.asset_type.trim().to_lowercase()
    }

    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    pub fn last_communication_at(&self) -> Option<DateTime<Utc>> {
        self.last_communication_at
    }

    pub fn public_ip(&self) -> Option<&str> {
        self.public_ip.as_deref()
    }

    /// Whole days since last contact, relative to the current UTC instant.
    pub fn days_since_last_communication(&self) -> i64 {
        self.days_since_last_communication_at(Utc::now())
    }

    /// Whole days since last contact, relative to `now`.
    ///
    /// Returns [`NEVER_COMMUNICATED_DAYS`] when the asset never communicated
    /// and 0 for timestamps in the future.
    pub fn days_since_last_communication_at(&self, now: DateTime<Utc>) -> i64 {
        match self.last_communication_at {
            Some(at) => (now - at).num_days().max(0),
            None => NEVER_COMMUNICATED_DAYS,
        }
    }

    pub fn is_inactive(&self) -> bool {
        self.is_inactive_at(Utc::now())
    }

    pub fn is_inactive_at(&self, now: DateTime<Utc>) -> bool {
        self.days_since_last_communication_at(now) > INACTIVITY_THRESHOLD_DAYS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn aged(days: i64) -> AssetRecord {
        AssetRecord::new("1", "PC", "Computer")
            .with_last_communication(Some(now() - Duration::days(days)))
    }

    #[test]
    fn test_days_since_last_communication() {
        assert_eq!(aged(0).days_since_last_communication_at(now()), 0);
        assert_eq!(aged(15).days_since_last_communication_at(now()), 15);

        // Partial days are truncated.
        let record = AssetRecord::new("1", "PC", "Computer")
            .with_last_communication(Some(now() - Duration::hours(47)));
        assert_eq!(record.days_since_last_communication_at(now()), 1);
    }

    #[test]
    fn test_never_communicated_is_sentinel() {
        let record = AssetRecord::new("1", "PC", "Computer");
        assert_eq!(record.days_since_last_communication_at(now()), NEVER_COMMUNICATED_DAYS);
        assert!(record.is_inactive_at(now()));
    }

    #[test]
    fn test_future_timestamp_clamps_to_zero() {
        let record = AssetRecord::new("1", "PC", "Computer")
            .with_last_communication(Some(now() + Duration::days(3)));
        assert_eq!(record.days_since_last_communication_at(now()), 0);
        assert!(!record.is_inactive_at(now()));
    }

    #[test]
    fn test_inactivity_boundary() {
        assert!(!aged(60).is_inactive_at(now()));
        assert!(aged(61).is_inactive_at(now()));
    }

    #[test]
    fn test_days_monotonic_in_gap() {
        let record = aged(0);
        let mut previous = 0;
        for hours in (0..24 * 200).step_by(7) {
            let later = now() + Duration::hours(hours);
            let days = record.days_since_last_communication_at(later);
            assert!(days >= previous);
            previous = days;
        }
    }

    #[test]
    fn test_days_ignore_other_fields() {
        let at = Some(now() - Duration::days(42));
        let a = AssetRecord::new("1", "PC", "Computer").with_last_communication(at);
        let b = AssetRecord::new("2", "Other", "Printer")
            .with_serial_number("SN-9")
            .with_public_ip(Some("10.0.0.1".into()))
            .with_last_communication(at);
        assert_eq!(
            a.days_since_last_communication_at(now()),
            b.days_since_last_communication_at(now())
        );
    }

    #[test]
    fn test_normalized_type() {
        let record = AssetRecord::new("1", "PC", "  WorkStation ");
        assert_eq!(record.normalized_type(), "workstation");
        assert_eq!(record.asset_type(), "  WorkStation ");
    }
}
