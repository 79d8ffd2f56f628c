use std::{collections::HashMap, sync::Arc};

use chrono::NaiveDate;

use crate::remote::entities::TimeLogEntry;

use super::{grid::WeekGrid, reference::to_reference_clock};

/// Every entry stands for one 30-minute block.
pub const SLOT_HOURS: f64 = 0.5;

pub const OTHER_LABEL: &str = "Other";

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityHours {
    pub activity: Arc<str>,
    pub hours: f64,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct LogCounts {
    pub total: usize,
    pub logged: usize,
    pub skipped: usize,
}

pub fn counts(entries: &[TimeLogEntry]) -> LogCounts {
    let skipped = entries.iter().filter(|e| e.is_skipped).count();
    LogCounts {
        total: entries.len(),
        logged: entries.len() - skipped,
        skipped,
    }
}

pub fn total_hours(entries: &[TimeLogEntry]) -> f64 {
    counts(entries).logged as f64 * SLOT_HOURS
}

/// Ranked per-activity totals for one day of the grid. Only the fixed
/// 09:00-23:30 same-day slots count; the next-day rows (e.g. a Sleep label at
/// midnight) are excluded by convention, as are skipped cells.
pub fn day_summary(grid: &WeekGrid, day_index: usize) -> Vec<ActivityHours> {
    let mut map = HashMap::<Arc<str>, f64>::new();

    for slot in grid.slots() {
        if slot.next_day {
            continue;
        }
        let Some(entry) = grid.cell(day_index, slot) else {
            continue;
        };
        if entry.is_skipped {
            continue;
        }
        if let Some(activity) = entry.activity.clone() {
            *map.entry(activity).or_insert(0.) += SLOT_HOURS;
        }
    }

    ranked(map)
}

/// Ranked distribution across `entries` with everything past the first `top`
/// activities folded into an "Other" bucket.
pub fn distribution(entries: &[TimeLogEntry], top: usize) -> Vec<ActivityHours> {
    let mut map = HashMap::<Arc<str>, f64>::new();

    for entry in entries {
        if entry.is_skipped {
            continue;
        }
        if let Some(activity) = entry.activity.clone() {
            *map.entry(activity).or_insert(0.) += SLOT_HOURS;
        }
    }

    let mut usages = ranked(map);
    if usages.len() > top {
        let other_hours: f64 = usages[top..].iter().map(|v| v.hours).sum();
        usages.truncate(top);
        usages.push(ActivityHours {
            activity: OTHER_LABEL.into(),
            hours: other_hours,
        });
    }
    usages
}

/// Per-day logged hours over `days`, in reference time, optionally restricted
/// to one activity label.
pub fn daily_hours(
    entries: &[TimeLogEntry],
    days: &[NaiveDate],
    activity: Option<&str>,
) -> Vec<(NaiveDate, f64)> {
    days.iter()
        .map(|day| {
            let hours = entries
                .iter()
                .filter(|e| !e.is_skipped)
                .filter(|e| to_reference_clock(e.timestamp).day == *day)
                .filter(|e| activity.is_none() || e.label() == activity)
                .count() as f64
                * SLOT_HOURS;
            (*day, hours)
        })
        .collect()
}

fn ranked(map: HashMap<Arc<str>, f64>) -> Vec<ActivityHours> {
    let mut usages = map
        .into_iter()
        .map(|(activity, hours)| ActivityHours { activity, hours })
        .collect::<Vec<_>>();
    usages.sort_by(|a, b| {
        b.hours
            .partial_cmp(&a.hours)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.activity.cmp(&b.activity))
    });
    usages
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, Duration, NaiveDate, Utc};

    use crate::{
        remote::entities::TimeLogEntry,
        schedule::grid::{reconcile, slot_timestamp},
    };

    use super::*;

    const WEEK_START: NaiveDate = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    fn entry(id: i64, timestamp: DateTime<Utc>, label: Option<&str>) -> TimeLogEntry {
        TimeLogEntry {
            id,
            user_id: Arc::from("user-1"),
            timestamp,
            activity: label.map(Arc::from),
            is_skipped: label.is_none(),
        }
    }

    fn hours_of(summary: &[ActivityHours], label: &str) -> Option<f64> {
        summary
            .iter()
            .find(|v| v.activity.as_ref() == label)
            .map(|v| v.hours)
    }

    #[test]
    fn day_totals_sum_half_hour_blocks() {
        let entries = vec![
            entry(1, slot_timestamp(WEEK_START, 9, 0), Some("Break")),
            entry(2, slot_timestamp(WEEK_START, 10, 0), Some("Break")),
            entry(3, slot_timestamp(WEEK_START, 13, 0), Some("Lunch")),
        ];
        let grid = reconcile(WEEK_START, entries);

        let summary = day_summary(&grid, 0);
        assert_eq!(hours_of(&summary, "Break"), Some(1.0));
        assert_eq!(hours_of(&summary, "Lunch"), Some(0.5));

        let total: f64 = summary.iter().map(|v| v.hours).sum();
        assert_eq!(total, 1.5);
        // Ranked by hours.
        assert_eq!(summary[0].activity.as_ref(), "Break");
    }

    #[test]
    fn day_summary_skips_next_day_rows_and_skipped_cells() {
        let entries = vec![
            entry(1, slot_timestamp(WEEK_START, 9, 0), Some("Break")),
            // Skipped slot.
            entry(2, slot_timestamp(WEEK_START, 10, 0), None),
            // Post-midnight sleep attributed to Monday's row, excluded from
            // its totals.
            entry(
                3,
                slot_timestamp(WEEK_START + Duration::days(1), 0, 0),
                Some("Sleep"),
            ),
        ];
        let grid = reconcile(WEEK_START, entries);

        let summary = day_summary(&grid, 0);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].activity.as_ref(), "Break");
    }

    #[test]
    fn distribution_folds_tail_into_other() {
        let entries = vec![
            entry(1, slot_timestamp(WEEK_START, 9, 0), Some("Office Work")),
            entry(2, slot_timestamp(WEEK_START, 9, 30), Some("Office Work")),
            entry(3, slot_timestamp(WEEK_START, 10, 0), Some("Workout")),
            entry(4, slot_timestamp(WEEK_START, 10, 30), Some("Lunch")),
            entry(5, slot_timestamp(WEEK_START, 11, 0), Some("Reading")),
        ];

        let usages = distribution(&entries, 2);
        assert_eq!(usages.len(), 3);
        assert_eq!(usages[0].activity.as_ref(), "Office Work");
        assert_eq!(usages[2].activity.as_ref(), OTHER_LABEL);
        assert_eq!(usages[2].hours, 1.0);

        let total: f64 = usages.iter().map(|v| v.hours).sum();
        assert_eq!(total, total_hours(&entries));
    }

    #[test]
    fn counts_split_logged_and_skipped() {
        let entries = vec![
            entry(1, slot_timestamp(WEEK_START, 9, 0), Some("Break")),
            entry(2, slot_timestamp(WEEK_START, 9, 30), None),
            entry(3, slot_timestamp(WEEK_START, 10, 0), Some("Break")),
        ];

        let counts = counts(&entries);
        assert_eq!(counts.total, 3);
        assert_eq!(counts.logged, 2);
        assert_eq!(counts.skipped, 1);
        assert_eq!(total_hours(&entries), 1.0);
    }

    #[test]
    fn daily_series_respects_reference_dates_and_filter() {
        let tuesday = WEEK_START + Duration::days(1);
        let entries = vec![
            entry(1, slot_timestamp(WEEK_START, 9, 0), Some("Break")),
            entry(2, slot_timestamp(WEEK_START, 9, 30), Some("Lunch")),
            entry(3, slot_timestamp(tuesday, 9, 0), Some("Break")),
        ];

        let days = [WEEK_START, tuesday];
        let all = daily_hours(&entries, &days, None);
        assert_eq!(all, vec![(WEEK_START, 1.0), (tuesday, 0.5)]);

        let breaks = daily_hours(&entries, &days, Some("Break"));
        assert_eq!(breaks, vec![(WEEK_START, 0.5), (tuesday, 0.5)]);
    }
}
