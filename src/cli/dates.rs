use std::fmt::Display;

use anyhow::{anyhow, bail, Result};
use chrono::{Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::ValueEnum;

use crate::schedule::reference::is_slot_boundary;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

/// Parses a human date ("today", "yesterday", "15/03/2025") into the calendar
/// day it names.
pub fn parse_day(input: &str, style: DateStyle) -> Result<NaiveDate> {
    let parsed = parse_date_string(input, Local::now(), style.into())
        .map_err(|e| anyhow!("Failed to parse date {input:?}: {e}"))?;
    Ok(parsed.date_naive())
}

/// Parses a slot start like `14:30`. Only the :00/:30 marks name slots.
pub fn parse_slot_time(input: &str) -> Result<(u32, u32)> {
    let Some((hour, minute)) = input.split_once(':') else {
        bail!("Expected a slot time like 14:30, got {input:?}");
    };
    let hour: u32 = hour
        .parse()
        .map_err(|_| anyhow!("Invalid hour in {input:?}"))?;
    let minute: u32 = minute
        .parse()
        .map_err(|_| anyhow!("Invalid minute in {input:?}"))?;
    if hour > 23 {
        bail!("Hour must be between 0 and 23, got {hour}");
    }
    if !is_slot_boundary(minute) {
        bail!("Slots start on the :00 and :30 marks, got :{minute:02}");
    }
    Ok((hour, minute))
}
