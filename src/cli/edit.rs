use std::path::Path;

use anyhow::{bail, Result};
use chrono::Duration;
use clap::Parser;

use crate::{
    remote::{
        entities::NewLogEntry,
        session::SessionConfig,
        store::{LogStore, RestLogStore, TimeRange},
    },
    schedule::{
        grid::{commit_edit, slot_timestamp, EditOutcome, EditValue, PendingEdit},
        reference::to_reference_clock,
    },
};

use super::dates::{parse_day, parse_slot_time, DateStyle};

#[derive(Debug, Parser)]
pub struct SetCommand {
    #[arg(help = "Activity label for the slot. Omit it and pass --skip to mark the slot skipped")]
    label: Option<String>,
    #[arg(
        long,
        short,
        default_value = "today",
        help = "Day of the slot. Examples are \"today\", \"yesterday\", \"15/03/2025\""
    )]
    date: String,
    #[arg(long, short, help = "Slot start on the :00/:30 marks, e.g. 14:30")]
    time: String,
    #[arg(long, help = "Mark the slot as skipped")]
    skip: bool,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

/// Fills or edits one slot: an occupied slot is updated in place, an empty
/// one gets a fresh insert.
pub async fn process_set_command(command: SetCommand, app_dir: &Path) -> Result<()> {
    let value = match (&command.label, command.skip) {
        (Some(label), false) => EditValue::Label(label.clone()),
        (None, true) => EditValue::Skip,
        (Some(_), true) => bail!("Pass either a label or --skip, not both"),
        (None, false) => bail!("Provide an activity label, or --skip"),
    };

    let session = SessionConfig::load(app_dir)?;
    let store = RestLogStore::new(session.clone());

    let day = parse_day(&command.date, command.date_style)?;
    let (hour, minute) = parse_slot_time(&command.time)?;
    let timestamp = slot_timestamp(day, hour, minute);

    // Look at the slot's half hour to find an occupying entry; duplicates
    // resolve the same way the grid resolves them, first match wins.
    let fetched = store
        .fetch_range(TimeRange::between(timestamp, timestamp + Duration::minutes(29)))
        .await?;
    let existing = fetched.into_iter().find(|e| {
        let clock = to_reference_clock(e.timestamp);
        clock.day == day && clock.hour == hour && clock.minute == minute
    });

    let initial = existing
        .as_ref()
        .and_then(|e| e.label())
        .unwrap_or_default()
        .to_string();
    let edit = PendingEdit {
        timestamp,
        existing,
        initial,
    };

    match commit_edit(&store, session.user_id.clone(), edit, value).await? {
        EditOutcome::Updated(entry) => {
            println!(
                "Updated {} {} to {}",
                day,
                command.time,
                entry.label().unwrap_or("skipped")
            );
        }
        EditOutcome::Inserted(entry) => {
            println!(
                "Logged {} {} as {}",
                day,
                command.time,
                entry.label().unwrap_or("skipped")
            );
        }
        EditOutcome::Unchanged => {
            println!("Nothing to change for {} {}", day, command.time);
        }
    }
    Ok(())
}

#[derive(Debug, Parser)]
pub struct BulkCommand {
    #[arg(
        long,
        short,
        default_value = "today",
        help = "Day to fill. Examples are \"today\", \"yesterday\", \"15/03/2025\""
    )]
    date: String,
    #[arg(long, default_value = "13:00", help = "First slot of the range")]
    from: String,
    #[arg(long, default_value = "18:00", help = "Last slot of the range, inclusive")]
    to: String,
    #[arg(
        long,
        short,
        default_value = "College time",
        help = "Activity label written into every slot"
    )]
    label: String,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

/// Inserts one entry per 30-minute slot across an inclusive range, all with
/// the same label.
pub async fn process_bulk_command(command: BulkCommand, app_dir: &Path) -> Result<()> {
    let session = SessionConfig::load(app_dir)?;
    let store = RestLogStore::new(session.clone());

    let day = parse_day(&command.date, command.date_style)?;
    let from = parse_slot_time(&command.from)?;
    let to = parse_slot_time(&command.to)?;

    let slots = range_slots(from, to)?;
    let entries: Vec<NewLogEntry> = slots
        .iter()
        .map(|(hour, minute)| {
            NewLogEntry::logged(
                session.user_id.clone(),
                slot_timestamp(day, *hour, *minute),
                command.label.as_str(),
            )
        })
        .collect();

    let inserted = store.insert_many(entries).await?;
    println!(
        "Created {} entries for {} between {} and {}",
        inserted.len(),
        day,
        command.from,
        command.to
    );
    Ok(())
}

/// All :00/:30 marks from `from` to `to`, both inclusive.
fn range_slots(from: (u32, u32), to: (u32, u32)) -> Result<Vec<(u32, u32)>> {
    let start = from.0 * 60 + from.1;
    let end = to.0 * 60 + to.1;
    if start > end {
        bail!("Range start {:02}:{:02} is after its end", from.0, from.1);
    }
    Ok((start..=end)
        .step_by(30)
        .map(|m| (m / 60, m % 60))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::range_slots;

    #[test]
    fn default_afternoon_range_names_eleven_slots() {
        let slots = range_slots((13, 0), (18, 0)).unwrap();
        assert_eq!(slots.len(), 11);
        assert_eq!(slots[0], (13, 0));
        assert_eq!(slots[1], (13, 30));
        assert_eq!(slots[10], (18, 0));
    }

    #[test]
    fn single_slot_range_is_allowed() {
        assert_eq!(range_slots((9, 30), (9, 30)).unwrap(), vec![(9, 30)]);
    }

    #[test]
    fn inverted_ranges_are_rejected() {
        assert!(range_slots((18, 0), (13, 0)).is_err());
    }
}
