use std::{fmt::Display, fmt::Write as _, path::Path};

use ansi_term::Style;
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::{Parser, ValueEnum};
use now::DateTimeNow;

use crate::{
    remote::{
        entities::TimeLogEntry,
        session::SessionConfig,
        store::{LogStore, RestLogStore, TimeRange},
    },
    schedule::{
        analysis::{counts, daily_hours, distribution, total_hours},
        reference::reference_offset,
    },
    utils::percentage::{hours_percentage, Percentage},
};

use super::grid::{format_hours, label_colour};

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum StatsRange {
    Week,
    Month,
    All,
}

impl Display for StatsRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsRange::Week => write!(f, "week"),
            StatsRange::Month => write!(f, "month"),
            StatsRange::All => write!(f, "all"),
        }
    }
}

#[derive(Debug, Parser)]
pub struct StatsCommand {
    #[arg(long, short, default_value_t = StatsRange::Week, help = "Aggregation window")]
    range: StatsRange,
    #[arg(long, short, help = "Restrict the per-day series to one activity")]
    activity: Option<String>,
    #[arg(
        long,
        default_value_t = 7,
        help = "How many activities to list before folding the rest into Other"
    )]
    top: usize,
    #[arg(
        short = 'p',
        long = "min-share",
        help = "Hide activities below this share of logged time"
    )]
    min_share: Option<Percentage>,
}

pub async fn process_stats_command(command: StatsCommand, app_dir: &Path) -> Result<()> {
    let session = SessionConfig::load(app_dir)?;
    let store = RestLogStore::new(session);

    let now = Utc::now().with_timezone(&reference_offset());
    let (range, days) = match command.range {
        StatsRange::Week => (
            TimeRange::between(now.beginning_of_week().to_utc(), now.end_of_week().to_utc()),
            Some(date_span(
                now.beginning_of_week().date_naive(),
                now.end_of_week().date_naive(),
            )),
        ),
        StatsRange::Month => (
            TimeRange::between(
                now.beginning_of_month().to_utc(),
                now.end_of_month().to_utc(),
            ),
            Some(date_span(
                now.beginning_of_month().date_naive(),
                now.end_of_month().date_naive(),
            )),
        ),
        StatsRange::All => (TimeRange::all(), None),
    };

    let entries = store.fetch_range(range).await?;
    print!(
        "{}",
        render_stats(
            &entries,
            days.as_deref(),
            command.activity.as_deref(),
            command.top,
            command.min_share,
        )
    );
    Ok(())
}

fn date_span(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = vec![];
    let mut current = start;
    while current <= end {
        days.push(current);
        current = current.succ_opt().expect("End of time should never happen");
    }
    days
}

fn render_stats(
    entries: &[TimeLogEntry],
    days: Option<&[NaiveDate]>,
    activity: Option<&str>,
    top: usize,
    min_share: Option<Percentage>,
) -> String {
    let mut out = String::new();

    let log_counts = counts(entries);
    let whole = total_hours(entries);
    let _ = writeln!(
        out,
        "{}  {}   Logged: {}  Skipped: {}",
        Style::new().bold().paint("Total hours:"),
        format_hours(whole),
        log_counts.logged,
        log_counts.skipped,
    );

    let ranked = distribution(entries, top);
    if !ranked.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", Style::new().bold().paint("Activity Distribution"));
        for usage in &ranked {
            let share = hours_percentage(usage.hours, whole);
            if matches!(min_share, Some(min) if share < min) {
                continue;
            }
            let bar = "#".repeat((*share / 5.).round() as usize);
            let padded = format!("{:<20}", usage.activity);
            let _ = writeln!(
                out,
                "  {} {:>7}  {:>5.1}%  {}",
                label_colour(&usage.activity).paint(padded),
                format_hours(usage.hours),
                *share,
                label_colour(&usage.activity).paint(bar),
            );
        }
    }

    if let Some(days) = days {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{}{}",
            Style::new().bold().paint("Per day"),
            activity
                .map(|a| format!(" ({a})"))
                .unwrap_or_default()
        );
        for (day, hours) in daily_hours(entries, days, activity) {
            if hours == 0. {
                continue;
            }
            let bar = "#".repeat((hours * 2.).round() as usize);
            let _ = writeln!(
                out,
                "  {} {:>7}  {}",
                day.format("%a %d/%m"),
                format_hours(hours),
                bar
            );
        }
    }

    out
}
