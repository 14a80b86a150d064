//! Release scheduling and version retention rules

use crate::domain::calendar::{apply_frequency, month_matching_weekdays, next_month_matching_weekdays};
use crate::domain::record::VersionRecord;
use crate::error::{Result, VersionManagerError};
use chrono::{Datelike, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Weekdays versions are released on, and the week cadence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSchedule {
    days: Vec<Weekday>,
    frequency: u32,
}

impl ReleaseSchedule {
    /// Build a schedule from weekday indices (0 = Monday .. 6 = Sunday).
    ///
    /// # Returns
    /// * `Err` - No days, an index above 6, or frequency 0
    pub fn new(day_indices: &[u8], frequency: u32) -> Result<Self> {
        if day_indices.is_empty() {
            return Err(VersionManagerError::config(
                "release schedule needs at least one weekday",
            ));
        }
        if frequency == 0 {
            return Err(VersionManagerError::config(
                "release schedule frequency must be at least 1",
            ));
        }

        let mut days = Vec::with_capacity(day_indices.len());
        for &index in day_indices {
            let day = weekday_from_index(index).ok_or_else(|| {
                VersionManagerError::config(format!(
                    "weekday index {} is out of range 0 (Monday) ..= 6 (Sunday)",
                    index
                ))
            })?;
            if !days.contains(&day) {
                days.push(day);
            }
        }

        Ok(ReleaseSchedule { days, frequency })
    }

    pub fn days(&self) -> &[Weekday] {
        &self.days
    }

    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    /// Release dates in the month after `reference`.
    pub fn target_dates(&self, reference: NaiveDate) -> Vec<NaiveDate> {
        apply_frequency(
            &next_month_matching_weekdays(reference, &self.days),
            self.frequency,
        )
    }

    /// Release dates in the month of `reference` itself.
    pub fn target_dates_in_month(&self, reference: NaiveDate) -> Vec<NaiveDate> {
        apply_frequency(
            &month_matching_weekdays(reference.year(), reference.month(), &self.days),
            self.frequency,
        )
    }
}

impl Default for ReleaseSchedule {
    /// Monday to Thursday, every week.
    fn default() -> Self {
        ReleaseSchedule {
            days: vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu],
            frequency: 1,
        }
    }
}

fn weekday_from_index(index: u8) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Mon),
        1 => Some(Weekday::Tue),
        2 => Some(Weekday::Wed),
        3 => Some(Weekday::Thu),
        4 => Some(Weekday::Fri),
        5 => Some(Weekday::Sat),
        6 => Some(Weekday::Sun),
        _ => None,
    }
}

fn default_min_age_days() -> u32 {
    7
}

/// When unused versions become eligible for deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct CleanupSettings {
    #[serde(default = "default_min_age_days")]
    pub min_age_days: u32,

    #[serde(default)]
    pub include_released: bool,
}

impl Default for CleanupSettings {
    fn default() -> Self {
        CleanupSettings {
            min_age_days: default_min_age_days(),
            include_released: false,
        }
    }
}

fn default_archive_months() -> u32 {
    3
}

fn default_archive_enabled() -> bool {
    true
}

/// When released versions get archived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArchiveSettings {
    #[serde(default = "default_archive_months")]
    pub months: u32,

    #[serde(default = "default_archive_enabled")]
    pub enabled: bool,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        ArchiveSettings {
            months: default_archive_months(),
            enabled: default_archive_enabled(),
        }
    }
}

/// Whether `record` should be deleted by cleanup.
///
/// `version_date` is the date recovered from the version's name. The version
/// must be older than `min_age_days`, have a known issue count of zero, and be
/// unreleased unless released versions are included.
pub fn is_due_for_cleanup(
    record: &VersionRecord,
    version_date: Option<NaiveDate>,
    now: NaiveDate,
    settings: &CleanupSettings,
) -> bool {
    let Some(date) = version_date else {
        return false;
    };
    let old_enough = (now - date).num_days() > i64::from(settings.min_age_days);
    let unused = record.issue_count == Some(0);
    let release_ok = !record.released || settings.include_released;

    old_enough && unused && release_ok
}

/// Whether `record` should be archived.
///
/// Uses the tracker's release date, falling back to the date recovered from
/// the name.
pub fn is_due_for_archive(
    record: &VersionRecord,
    parsed_date: Option<NaiveDate>,
    now: NaiveDate,
    settings: &ArchiveSettings,
) -> bool {
    if !settings.enabled || !record.released || record.archived {
        return false;
    }
    let Some(date) = record.release_date.or(parsed_date) else {
        return false;
    };

    match now.checked_sub_months(Months::new(settings.months)) {
        Some(threshold) => date < threshold,
        None => false,
    }
}
