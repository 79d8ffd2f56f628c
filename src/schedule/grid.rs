use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use tracing::debug;

use crate::remote::{
    entities::{LogPatch, NewLogEntry, TimeLogEntry},
    store::LogStore,
};

use super::{
    reference::{is_slot_boundary, reference_offset, to_reference_clock},
    slots::{slot_template, week_days, Slot},
};

/// The week's entries joined onto the fixed day x slot template. Built from a
/// fetched snapshot; it never mutates entries itself, writers go through
/// [commit_edit] and refetch.
pub struct WeekGrid {
    week_start: NaiveDate,
    days: [NaiveDate; 7],
    slots: Vec<Slot>,
    cells: HashMap<(NaiveDate, u32, u32), TimeLogEntry>,
}

/// Joins `entries` onto the weekly template. An entry lands in the cell whose
/// reference-time hour, minute and calendar day match; timestamps off the
/// :00/:30 marks match nothing. When duplicates exist for one slot the first
/// one in iteration order wins and the rest become invisible.
pub fn reconcile(
    week_start: NaiveDate,
    entries: impl IntoIterator<Item = TimeLogEntry>,
) -> WeekGrid {
    let mut cells = HashMap::new();
    for entry in entries {
        let clock = to_reference_clock(entry.timestamp);
        if !is_slot_boundary(clock.minute) {
            debug!("Entry {} is off the slot marks, ignoring", entry.id);
            continue;
        }
        cells
            .entry((clock.day, clock.hour, clock.minute))
            .or_insert(entry);
    }

    WeekGrid {
        week_start,
        days: week_days(week_start),
        slots: slot_template(),
        cells,
    }
}

impl WeekGrid {
    pub fn week_start(&self) -> NaiveDate {
        self.week_start
    }

    pub fn days(&self) -> &[NaiveDate; 7] {
        &self.days
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// The entry occupying `slot` on the day at `day_index`, if any. Next-day
    /// slots look up the following calendar date.
    pub fn cell(&self, day_index: usize, slot: &Slot) -> Option<&TimeLogEntry> {
        let date = self.slot_date(day_index, slot);
        self.cells.get(&(date, slot.hour, slot.minute))
    }

    /// Opens an edit on a cell, pre-filled with the existing label or empty.
    /// Cancelling is dropping the returned value.
    pub fn begin_edit(&self, day_index: usize, slot: &Slot) -> PendingEdit {
        let existing = self.cell(day_index, slot).cloned();
        let initial = existing
            .as_ref()
            .and_then(|e| e.label())
            .unwrap_or_default()
            .to_string();
        PendingEdit {
            timestamp: slot_timestamp(self.slot_date(day_index, slot), slot.hour, slot.minute),
            existing,
            initial,
        }
    }

    fn slot_date(&self, day_index: usize, slot: &Slot) -> NaiveDate {
        let day = self.days[day_index];
        if slot.next_day {
            day + Duration::days(1)
        } else {
            day
        }
    }
}

/// The instant a slot starts at on a given calendar day, in reference time.
pub fn slot_timestamp(day: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
    reference_offset()
        .from_local_datetime(&day.and_hms_opt(hour, minute, 0).unwrap())
        .single()
        .expect("fixed offset conversions are unambiguous")
        .to_utc()
}

/// An in-flight cell edit.
#[derive(Debug, Clone)]
pub struct PendingEdit {
    pub timestamp: DateTime<Utc>,
    pub existing: Option<TimeLogEntry>,
    pub initial: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditValue {
    Label(String),
    Skip,
}

#[derive(Debug, PartialEq)]
pub enum EditOutcome {
    Updated(TimeLogEntry),
    Inserted(TimeLogEntry),
    Unchanged,
}

/// Confirms an edit: update-in-place when the slot already holds an entry, an
/// insert when the slot was empty and something was chosen. An empty label on
/// an empty slot does nothing. The caller must refetch after a successful
/// write; nothing is patched locally.
pub async fn commit_edit(
    store: &dyn LogStore,
    user_id: Arc<str>,
    edit: PendingEdit,
    value: EditValue,
) -> Result<EditOutcome> {
    let (label, explicit_skip) = match value {
        EditValue::Label(label) => {
            let trimmed = label.trim().to_string();
            ((!trimmed.is_empty()).then_some(trimmed), false)
        }
        EditValue::Skip => (None, true),
    };

    match (edit.existing, label) {
        (Some(existing), Some(label)) => {
            let updated = store.update(existing.id, LogPatch::labeled(label)).await?;
            Ok(EditOutcome::Updated(updated))
        }
        (Some(existing), None) => {
            let updated = store.update(existing.id, LogPatch::skipped()).await?;
            Ok(EditOutcome::Updated(updated))
        }
        (None, Some(label)) => {
            let inserted = store
                .insert(NewLogEntry::logged(user_id, edit.timestamp, label))
                .await?;
            Ok(EditOutcome::Inserted(inserted))
        }
        (None, None) if explicit_skip => {
            let inserted = store
                .insert(NewLogEntry::skipped(user_id, edit.timestamp))
                .await?;
            Ok(EditOutcome::Inserted(inserted))
        }
        (None, None) => Ok(EditOutcome::Unchanged),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use chrono::{Duration, NaiveDate};

    use crate::remote::{
        entities::TimeLogEntry,
        store::MockLogStore,
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

    fn occupied_cells(grid: &WeekGrid) -> Vec<(usize, String, i64)> {
        let mut found = vec![];
        for day_index in 0..7 {
            for slot in grid.slots() {
                if let Some(e) = grid.cell(day_index, slot) {
                    found.push((day_index, slot.key(), e.id));
                }
            }
        }
        found
    }

    #[test]
    fn entry_lands_in_exactly_its_slot() {
        let nine_am = slot_timestamp(WEEK_START, 9, 0);
        let grid = reconcile(WEEK_START, vec![entry(1, nine_am, Some("Break"))]);

        assert_eq!(occupied_cells(&grid), vec![(0, "09:00".to_string(), 1)]);
    }

    #[test]
    fn off_mark_entries_are_invisible() {
        let quarter_past = slot_timestamp(WEEK_START, 0, 0) + Duration::minutes(15);
        let grid = reconcile(WEEK_START, vec![entry(1, quarter_past, Some("Sleep"))]);

        assert!(occupied_cells(&grid).is_empty());
    }

    #[test]
    fn post_midnight_entry_belongs_to_previous_day_row() {
        // Midnight at the start of Tuesday renders in Monday's 00:00 row.
        let tuesday_midnight = slot_timestamp(WEEK_START + Duration::days(1), 0, 0);
        let grid = reconcile(WEEK_START, vec![entry(1, tuesday_midnight, Some("Reading"))]);

        let cells = occupied_cells(&grid);
        assert_eq!(cells.len(), 1);
        let (day_index, key, _) = &cells[0];
        assert_eq!(*day_index, 0);
        assert_eq!(key, "00:00");
    }

    #[test]
    fn duplicate_slot_picks_first_match() {
        let nine_am = slot_timestamp(WEEK_START, 9, 0);
        let grid = reconcile(
            WEEK_START,
            vec![
                entry(1, nine_am, Some("Break")),
                entry(2, nine_am, Some("Lunch")),
            ],
        );

        let slot = grid.slots()[0];
        let cell = grid.cell(0, &slot).unwrap();
        assert_eq!(cell.id, 1);
        assert_eq!(cell.label(), Some("Break"));
    }

    #[test]
    fn begin_edit_prefills_existing_label() {
        let nine_am = slot_timestamp(WEEK_START, 9, 0);
        let grid = reconcile(WEEK_START, vec![entry(1, nine_am, Some("Break"))]);

        let slots = grid.slots().to_vec();
        let edit = grid.begin_edit(0, &slots[0]);
        assert_eq!(edit.initial, "Break");
        assert_eq!(edit.timestamp, nine_am);

        let vacant = grid.begin_edit(0, &slots[1]);
        assert_eq!(vacant.initial, "");
        assert!(vacant.existing.is_none());
    }

    #[test]
    fn begin_edit_targets_next_day_for_late_slots() {
        let grid = reconcile(WEEK_START, vec![]);
        let midnight = *grid.slots().last().unwrap();
        let edit = grid.begin_edit(0, &midnight);
        assert_eq!(
            edit.timestamp,
            slot_timestamp(WEEK_START + Duration::days(1), 1, 0)
        );
    }

    #[tokio::test]
    async fn commit_updates_occupied_slot_in_place() -> Result<()> {
        let nine_am = slot_timestamp(WEEK_START, 9, 0);
        let grid = reconcile(WEEK_START, vec![entry(7, nine_am, Some("Break"))]);
        let slot = grid.slots()[0];
        let edit = grid.begin_edit(0, &slot);

        let mut store = MockLogStore::new();
        store
            .expect_update()
            .withf(|id, patch| {
                *id == 7 && patch.activity.as_deref() == Some("Lunch") && !patch.is_skipped
            })
            .times(1)
            .returning(move |id, patch| {
                Ok(TimeLogEntry {
                    id,
                    user_id: Arc::from("user-1"),
                    timestamp: nine_am,
                    activity: patch.activity,
                    is_skipped: patch.is_skipped,
                })
            });

        let outcome = commit_edit(
            &store,
            Arc::from("user-1"),
            edit,
            EditValue::Label("Lunch".into()),
        )
        .await?;

        assert!(matches!(outcome, EditOutcome::Updated(e) if e.label() == Some("Lunch")));
        Ok(())
    }

    #[tokio::test]
    async fn commit_inserts_into_empty_slot() -> Result<()> {
        let grid = reconcile(WEEK_START, vec![]);
        let slot = grid.slots()[0];
        let edit = grid.begin_edit(2, &slot);
        let expected = edit.timestamp;

        let mut store = MockLogStore::new();
        store
            .expect_insert()
            .withf(move |new| {
                new.timestamp == expected
                    && new.activity.as_deref() == Some("Workout")
                    && !new.is_skipped
            })
            .times(1)
            .returning(|new| {
                Ok(TimeLogEntry {
                    id: 1,
                    user_id: new.user_id,
                    timestamp: new.timestamp,
                    activity: new.activity,
                    is_skipped: new.is_skipped,
                })
            });

        let outcome = commit_edit(
            &store,
            Arc::from("user-1"),
            edit,
            EditValue::Label("  Workout  ".into()),
        )
        .await?;

        assert!(matches!(outcome, EditOutcome::Inserted(_)));
        Ok(())
    }

    #[tokio::test]
    async fn commit_without_label_on_empty_slot_is_a_no_op() -> Result<()> {
        let grid = reconcile(WEEK_START, vec![]);
        let slot = grid.slots()[0];
        let edit = grid.begin_edit(0, &slot);

        // No expectations: any store call would panic.
        let store = MockLogStore::new();

        let outcome = commit_edit(
            &store,
            Arc::from("user-1"),
            edit,
            EditValue::Label("   ".into()),
        )
        .await?;

        assert_eq!(outcome, EditOutcome::Unchanged);
        Ok(())
    }

    #[tokio::test]
    async fn commit_skip_on_empty_slot_inserts_skipped_entry() -> Result<()> {
        let grid = reconcile(WEEK_START, vec![]);
        let slot = grid.slots()[0];
        let edit = grid.begin_edit(0, &slot);

        let mut store = MockLogStore::new();
        store
            .expect_insert()
            .withf(|new| new.is_skipped && new.activity.is_none())
            .times(1)
            .returning(|new| {
                Ok(TimeLogEntry {
                    id: 3,
                    user_id: new.user_id,
                    timestamp: new.timestamp,
                    activity: None,
                    is_skipped: true,
                })
            });

        let outcome = commit_edit(&store, Arc::from("user-1"), edit, EditValue::Skip).await?;
        assert!(matches!(outcome, EditOutcome::Inserted(e) if e.is_skipped));
        Ok(())
    }
}
