use std::fmt::Display;

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike, Utc};

/// All scheduling and grid-matching decisions happen in this fixed offset
/// (UTC+5:30), regardless of where the process runs. No DST.
const REFERENCE_OFFSET_SECONDS: i32 = 5 * 3600 + 30 * 60;

const SLOT_SECONDS: u32 = 30 * 60;

/// Triggering is suppressed while the reference hour is inside `[1, 9)`.
const SLEEP_WINDOW: std::ops::Range<u32> = 1..9;

pub fn reference_offset() -> FixedOffset {
    FixedOffset::east_opt(REFERENCE_OFFSET_SECONDS).expect("reference offset is in range")
}

/// Wall-clock reading of an instant in the reference timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceClock {
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub day: NaiveDate,
}

pub fn to_reference_clock(instant: DateTime<Utc>) -> ReferenceClock {
    let local = instant.with_timezone(&reference_offset());
    ReferenceClock {
        hour: local.hour(),
        minute: local.minute(),
        second: local.second(),
        day: local.date_naive(),
    }
}

/// Zero-padded `HH:MM` key identifying a slot within a day. Also the value
/// stored in the notification gate.
pub fn slot_key(hour: u32, minute: u32) -> String {
    format!("{hour:02}:{minute:02}")
}

pub fn in_sleep_window(hour: u32) -> bool {
    SLEEP_WINDOW.contains(&hour)
}

pub fn is_slot_boundary(minute: u32) -> bool {
    minute == 0 || minute == 30
}

/// Truncates an instant down to the start of its 30-minute slot.
pub fn slot_start(instant: DateTime<Utc>) -> DateTime<Utc> {
    let truncated = instant.with_second(0).unwrap().with_nanosecond(0).unwrap();
    let local = truncated.with_timezone(&reference_offset());
    if local.minute() >= 30 {
        truncated - chrono::Duration::minutes((local.minute() - 30) as i64)
    } else {
        truncated - chrono::Duration::minutes(local.minute() as i64)
    }
}

/// Countdown readout shown next to the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPrompt {
    Sleep,
    Ready,
    In { minutes: u32, seconds: u32 },
}

impl Display for NextPrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NextPrompt::Sleep => write!(f, "Sleep Time"),
            NextPrompt::Ready => write!(f, "Ready"),
            NextPrompt::In { minutes, seconds } => write!(f, "{minutes}:{seconds:02}"),
        }
    }
}

/// Time remaining until the next 30-minute boundary in reference time.
/// Reports `Ready` at the boundary itself and within the last 5 seconds
/// before it.
pub fn time_until_next_slot(instant: DateTime<Utc>) -> NextPrompt {
    let clock = to_reference_clock(instant);
    if in_sleep_window(clock.hour) {
        return NextPrompt::Sleep;
    }
    let elapsed = (clock.minute % 30) * 60 + clock.second;
    if elapsed == 0 {
        return NextPrompt::Ready;
    }
    let left = SLOT_SECONDS - elapsed;
    if left <= 5 {
        return NextPrompt::Ready;
    }
    NextPrompt::In {
        minutes: left / 60,
        seconds: left % 60,
    }
}
