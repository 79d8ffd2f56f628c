use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use now::DateTimeNow;

use super::reference::{reference_offset, slot_key};

/// One fixed 30-minute position in the weekly grid template. Slots flagged
/// `next_day` (the 00:00/00:30/01:00 marks) belong to the row of the previous
/// calendar day, modelling a day that logically ends at 01:00 the next
/// morning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub hour: u32,
    pub minute: u32,
    pub next_day: bool,
}

impl Slot {
    pub fn key(&self) -> String {
        slot_key(self.hour, self.minute)
    }

    /// 12-hour label used for grid rows, e.g. `9:30 AM` or `12:00 PM`.
    pub fn display(&self) -> String {
        let display_hour = match self.hour {
            0 => 12,
            h if h > 12 => h - 12,
            h => h,
        };
        let meridiem = if self.hour >= 12 { "PM" } else { "AM" };
        format!("{display_hour}:{:02} {meridiem}", self.minute)
    }
}

/// The fixed weekly template: 09:00 through 23:30 on the same day, then
/// 00:00, 00:30 and 01:00 attributed to the following day.
pub fn slot_template() -> Vec<Slot> {
    let mut slots = Vec::with_capacity(33);
    for hour in 9..24 {
        for minute in [0, 30] {
            slots.push(Slot {
                hour,
                minute,
                next_day: false,
            });
        }
    }
    for (hour, minute) in [(0, 0), (0, 30), (1, 0)] {
        slots.push(Slot {
            hour,
            minute,
            next_day: true,
        });
    }
    slots
}

/// Monday of the week containing `instant`, evaluated in reference time.
pub fn week_start_for(instant: DateTime<Utc>) -> NaiveDate {
    instant
        .with_timezone(&reference_offset())
        .beginning_of_week()
        .date_naive()
}

/// Monday of the week containing a calendar day.
pub fn week_start_of(day: NaiveDate) -> NaiveDate {
    day - Duration::days(day.weekday().num_days_from_monday() as i64)
}

/// The seven days of the week starting at `week_start`.
pub fn week_days(week_start: NaiveDate) -> [NaiveDate; 7] {
    core::array::from_fn(|i| week_start + Duration::days(i as i64))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::*;

    #[test]
    fn template_spans_day_and_early_morning() {
        let slots = slot_template();
        assert_eq!(slots.len(), 33);

        assert_eq!(
            slots[0],
            Slot {
                hour: 9,
                minute: 0,
                next_day: false
            }
        );
        assert_eq!(
            slots[29],
            Slot {
                hour: 23,
                minute: 30,
                next_day: false
            }
        );
        assert_eq!(
            slots[32],
            Slot {
                hour: 1,
                minute: 0,
                next_day: true
            }
        );
        assert!(slots[30].next_day);
    }

    #[test]
    fn display_uses_twelve_hour_labels() {
        let labels: Vec<String> = slot_template().iter().map(Slot::display).collect();
        assert_eq!(labels[0], "9:00 AM");
        assert_eq!(labels[6], "12:00 PM");
        assert_eq!(labels[8], "1:00 PM");
        assert_eq!(labels[30], "12:00 AM");
        assert_eq!(labels[32], "1:00 AM");
    }

    #[test]
    fn weeks_start_on_monday_in_reference_time() {
        // Thursday 2024-01-04 10:00 reference time.
        let instant = Utc.with_ymd_and_hms(2024, 1, 4, 4, 30, 0).unwrap();
        let start = week_start_for(instant);
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        let days = week_days(start);
        assert_eq!(days[0], start);
        assert_eq!(days[6], NaiveDate::from_ymd_opt(2024, 1, 7).unwrap());
    }

    #[test]
    fn week_start_of_any_day_is_its_monday() {
        let thursday = NaiveDate::from_ymd_opt(2024, 1, 4).unwrap();
        let monday = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(week_start_of(thursday), monday);
        assert_eq!(week_start_of(monday), monday);
        assert_eq!(
            week_start_of(NaiveDate::from_ymd_opt(2024, 1, 7).unwrap()),
            monday
        );
    }

    #[test]
    fn reference_midnight_stays_in_previous_utc_day_week() {
        // 2024-01-07 19:00 UTC is Monday 2024-01-08 00:30 reference time, so
        // the containing week starts on the 8th.
        let instant = Utc.with_ymd_and_hms(2024, 1, 7, 19, 0, 0).unwrap();
        assert_eq!(
            week_start_for(instant),
            NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()
        );
    }
}
