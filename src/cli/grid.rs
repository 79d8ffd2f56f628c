use std::{fmt::Write as _, path::Path};

use ansi_term::{Colour, Style};
use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::{
    remote::{
        entities::TimeLogEntry,
        feed::ChangeFeed,
        session::SessionConfig,
        store::{LogStore, RestLogStore, TimeRange},
    },
    schedule::{
        analysis::{counts, day_summary, distribution, total_hours},
        grid::{reconcile, slot_timestamp},
        reference::time_until_next_slot,
        slots::{week_start_for, week_start_of},
    },
    utils::percentage::hours_percentage,
};

use super::dates::{parse_day, DateStyle};

const CELL_WIDTH: usize = 13;
const TIME_WIDTH: usize = 9;
/// Activities listed in the weekly summary before the rest folds into Other.
const SUMMARY_TOP: usize = 7;

#[derive(Debug, Parser)]
pub struct GridCommand {
    #[arg(
        long = "week",
        short,
        help = "Week to display. Examples are \"today\", \"last week\", \"15/03/2025\""
    )]
    week: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(
        long,
        help = "Keep the grid on screen and re-render whenever the backend reports a change"
    )]
    watch: bool,
}

pub async fn process_grid_command(command: GridCommand, app_dir: &Path) -> Result<()> {
    let session = SessionConfig::load(app_dir)?;
    let store = RestLogStore::new(session.clone());

    let week_start = match &command.week {
        Some(input) => week_start_of(parse_day(input, command.date_style)?),
        None => week_start_for(Utc::now()),
    };

    render(&store, week_start).await?;

    if command.watch {
        watch(store, session, week_start).await?;
    }
    Ok(())
}

/// Fetches the week and prints a fresh grid. Watch mode calls this again on
/// every invalidation; there is no local patching in between.
async fn render(store: &RestLogStore, week_start: NaiveDate) -> Result<()> {
    let entries = fetch_week(store, week_start).await?;
    print!("{}", render_week(&entries, week_start, Utc::now()));
    Ok(())
}

/// The week's fetch window also covers the following Monday up to 01:00,
/// which belongs to Sunday's next-day rows.
async fn fetch_week(store: &impl LogStore, week_start: NaiveDate) -> Result<Vec<TimeLogEntry>> {
    let start = slot_timestamp(week_start, 0, 0);
    let end = slot_timestamp(week_start + Duration::days(7), 1, 0);
    store.fetch_range(TimeRange::between(start, end)).await
}

async fn watch(store: RestLogStore, session: SessionConfig, week_start: NaiveDate) -> Result<()> {
    println!();
    println!("Watching for changes, ctrl-c to stop.");

    let (notify, mut changes) = ChangeFeed::invalidation_channel();
    let shutdown = CancellationToken::new();
    let feed_task = tokio::spawn(ChangeFeed::new(session).run(notify, shutdown.clone()));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                shutdown.cancel();
                break;
            }
            changed = changes.changed() => {
                if changed.is_err() {
                    warn!("Change feed ended");
                    break;
                }
                render(&store, week_start).await?;
            }
        }
    }

    let _ = feed_task.await;
    Ok(())
}

pub(crate) fn render_week(
    entries: &[TimeLogEntry],
    week_start: NaiveDate,
    now: DateTime<Utc>,
) -> String {
    let grid = reconcile(week_start, entries.to_vec());
    let log_counts = counts(entries);

    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} {}   Total: {}  Logged: {}  Skipped: {}  Next prompt: {}",
        Style::new().bold().paint("Week of"),
        Style::new().bold().paint(week_start.format("%d %b %Y").to_string()),
        log_counts.total,
        Colour::Green.paint(log_counts.logged.to_string()),
        Colour::Red.paint(log_counts.skipped.to_string()),
        time_until_next_slot(now),
    );
    let _ = writeln!(out);

    // Header row with day names and dates.
    let _ = write!(out, "{:<TIME_WIDTH$}", "Time");
    for day in grid.days() {
        let _ = write!(out, " {:<CELL_WIDTH$}", day.format("%a %d/%m"));
    }
    let _ = writeln!(out);

    for slot in grid.slots() {
        let _ = write!(out, "{:<TIME_WIDTH$}", slot.display());
        for day_index in 0..7 {
            let cell = grid.cell(day_index, slot);
            let _ = write!(out, " {}", render_cell(cell));
        }
        let _ = writeln!(out);
    }

    // Per-day logged hours across the same-day 09:00-23:30 slots.
    let _ = write!(out, "{:<TIME_WIDTH$}", "Total");
    for day_index in 0..7 {
        let hours: f64 = day_summary(&grid, day_index).iter().map(|v| v.hours).sum();
        let text = if hours > 0. { format_hours(hours) } else { String::new() };
        let _ = write!(out, " {text:<CELL_WIDTH$}");
    }
    let _ = writeln!(out);

    let whole = total_hours(entries);
    let summary = distribution(entries, SUMMARY_TOP);
    if !summary.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", Style::new().bold().paint("Activity Summary"));
        for usage in &summary {
            let share = hours_percentage(usage.hours, whole);
            let padded = format!("{:<20}", truncate(&usage.activity, 20));
            let _ = writeln!(
                out,
                "  {} {:>7}  {:>5.1}%",
                label_colour(&usage.activity).paint(padded),
                format_hours(usage.hours),
                *share,
            );
        }
        let _ = writeln!(out, "  {:<20} {:>7}    100%", "Total", format_hours(whole));
    }

    out
}

fn render_cell(cell: Option<&TimeLogEntry>) -> String {
    let Some(entry) = cell else {
        return " ".repeat(CELL_WIDTH);
    };
    if entry.is_skipped {
        let padded = format!("{:<CELL_WIDTH$}", "x");
        return Colour::Red.paint(padded).to_string();
    }
    let label = entry.label().unwrap_or_default();
    let padded = format!("{:<CELL_WIDTH$}", truncate(label, CELL_WIDTH));
    label_colour(label).paint(padded).to_string()
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut shortened: String = value.chars().take(width - 1).collect();
    shortened.push('…');
    shortened
}

/// Stable colour per label family, mirroring the grid's cell colours.
pub(crate) fn label_colour(label: &str) -> Colour {
    let text = label.to_lowercase();
    if text.contains("office") || text.contains("work") {
        Colour::Yellow
    } else if text.contains("personal") {
        Colour::Fixed(13)
    } else if text.contains("workout") || text.contains("exercise") {
        Colour::Purple
    } else if text.contains("meditation") {
        Colour::Green
    } else if text.contains("break") {
        Colour::Fixed(208)
    } else if text.contains("lunch") || text.contains("breakfast") {
        Colour::Cyan
    } else if text.contains("college") || text.contains("study") {
        Colour::Blue
    } else {
        Colour::White
    }
}

pub(crate) fn format_hours(hours: f64) -> String {
    let whole = hours.floor() as i64;
    let minutes = ((hours - whole as f64) * 60.).round() as i64;
    if whole == 0 {
        format!("{minutes}m")
    } else if minutes == 0 {
        format!("{whole}h")
    } else {
        format!("{whole}h {minutes}m")
    }
}
