//! Next-fire and remaining-time calculation.
//!
//! Every function is pure with respect to the caller-supplied `now` --
//! nothing in this module reads the wall clock. The UI owns the refresh
//! tick and passes its notion of "now" in.

use chrono::{DateTime, Days, Duration, TimeZone, Utc};

use super::model::{Alarm, AlarmKind};

/// Next occurrence of `hour:minute` strictly after `now`.
///
/// Today's instant counts as already past when it equals `now`, so the
/// result rolls to tomorrow.
pub fn next_occurrence<Tz: TimeZone>(hour: u32, minute: u32, now: &DateTime<Tz>) -> DateTime<Tz> {
    let tz = now.timezone();
    let mut date = now.date_naive();
    // A DST gap can swallow a wall-clock time; scan forward day by day.
    for _ in 0..3 {
        if let Some(candidate) = date
            .and_hms_opt(hour, minute, 0)
            .and_then(|naive| tz.from_local_datetime(&naive).earliest())
        {
            if candidate > *now {
                return candidate;
            }
        }
        date = date.checked_add_days(Days::new(1)).unwrap_or(date);
    }
    // Unreachable for validated hour/minute: a representable wall-clock
    // time exists within three days in every timezone.
    now.clone()
}

/// The next instant this alarm fires, regardless of the enabled flag.
///
/// Quick alarms return their stored trigger instant verbatim; a quick
/// alarm that has never been armed has none.
pub fn next_fire<Tz: TimeZone>(alarm: &Alarm, now: &DateTime<Tz>) -> Option<DateTime<Utc>> {
    match &alarm.kind {
        AlarmKind::Daily { hour, minute } | AlarmKind::WakeUp { hour, minute, .. } => {
            Some(next_occurrence(*hour, *minute, now).with_timezone(&Utc))
        }
        AlarmKind::Quick { trigger_time, .. } => *trigger_time,
    }
}

/// Time left until the alarm fires, or `None` when there is nothing to
/// count down to (disabled, unarmed quick alarm, or already past).
pub fn remaining<Tz: TimeZone>(alarm: &Alarm, now: &DateTime<Tz>) -> Option<Duration> {
    if !alarm.enabled {
        return None;
    }
    let target = next_fire(alarm, now)?;
    let delta = target - now.with_timezone(&Utc);
    if delta <= Duration::zero() {
        return None;
    }
    Some(delta)
}

/// Remaining-time display text with the 「あと」 prefix.
pub fn remaining_text<Tz: TimeZone>(alarm: &Alarm, now: &DateTime<Tz>) -> Option<String> {
    remaining_text_bare(alarm, now).map(|text| format!("あと{text}"))
}

/// Same text as [`remaining_text`] without the prefix, for compact UI.
pub fn remaining_text_bare<Tz: TimeZone>(alarm: &Alarm, now: &DateTime<Tz>) -> Option<String> {
    let delta = remaining(alarm, now)?;
    let text = if alarm.kind.is_quick() {
        // Seconds granularity for countdowns.
        format_quick_duration(delta.num_seconds().max(0) as u32)
    } else {
        // Minute granularity for time-of-day alarms.
        let total_min = delta.num_minutes().max(0);
        let hours = total_min / 60;
        let minutes = total_min % 60;
        if hours > 0 {
            format!("{hours}時間{minutes}分")
        } else {
            format!("{minutes}分")
        }
    };
    Some(text)
}

/// Decompose `seconds` into 「H時間M分S秒」, keeping only non-zero parts.
/// All-zero input renders 「0秒」, never the empty string.
pub fn format_quick_duration(seconds: u32) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{hours}時間"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}分"));
    }
    if secs > 0 || parts.is_empty() {
        parts.push(format!("{secs}秒"));
    }
    parts.join("")
}

/// Cosmetic UI refresh cadence: second-resolution while any enabled quick
/// alarm is counting down, minute-resolution otherwise.
pub fn refresh_interval(alarms: &[Alarm]) -> std::time::Duration {
    let any_quick = alarms.iter().any(|a| a.enabled && a.kind.is_quick());
    if any_quick {
        std::time::Duration::from_secs(1)
    } else {
        std::time::Duration::from_secs(60)
    }
}
