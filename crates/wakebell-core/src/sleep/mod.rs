//! Sleep-session logging and monthly statistics.
//!
//! Two states: awake, or one open session started by a bedtime record.
//! A wake event closes the open session into a [`SleepRecord`]; a wake
//! with no open session (notification dismissed without ever logging a
//! bedtime) still produces a record, just without bedtime or duration.

use std::sync::Mutex;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::platform::KvStore;

const SLEEP_RECORDS_KEY: &str = "sleep_records_v1";
const CURRENT_SLEEP_KEY: &str = "current_sleep_v1";

/// History retention, most-recent first.
const MAX_RECORDS: usize = 90;

/// Minutes-since-midnight boundary below which a bedtime is treated as
/// "after midnight" and shifted by a day for averaging.
const LATE_NIGHT_CUTOFF_MIN: i64 = 12 * 60;

/// One completed (or wake-only) sleep entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepRecord {
    pub id: String,
    pub bedtime: Option<DateTime<FixedOffset>>,
    pub wake_time: DateTime<FixedOffset>,
    /// Whole minutes asleep; `None` when no bedtime was logged.
    pub duration_min: Option<i64>,
    pub date: NaiveDate,
}

/// The singleton open session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentSleepSession {
    pub bedtime: DateTime<FixedOffset>,
}

/// Averages over the trailing 30 days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStats {
    pub count: usize,
    /// Average wake time-of-day, formatted `HH:MM`.
    pub avg_wake_time: Option<String>,
    /// Average bedtime time-of-day, formatted `HH:MM`.
    pub avg_bedtime: Option<String>,
    pub avg_duration_min: Option<i64>,
}

impl MonthlyStats {
    fn empty() -> Self {
        Self {
            count: 0,
            avg_wake_time: None,
            avg_bedtime: None,
            avg_duration_min: None,
        }
    }
}

pub struct SleepTracker<K: KvStore> {
    kv: K,
    write_lock: Mutex<()>,
}

impl<K: KvStore> SleepTracker<K> {
    pub fn new(kv: K) -> Self {
        Self {
            kv,
            write_lock: Mutex::new(()),
        }
    }

    /// Open a session at `now`. Rejected while another session is open --
    /// the caller decides whether to cancel the old one first.
    pub fn record_bedtime(
        &self,
        now: DateTime<FixedOffset>,
    ) -> Result<CurrentSleepSession, ValidationError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        if self.current_session().is_some() {
            return Err(ValidationError::SessionAlreadyOpen);
        }
        let session = CurrentSleepSession { bedtime: now };
        self.save_json(CURRENT_SLEEP_KEY, &session);
        Ok(session)
    }

    /// Discard the open session without producing a record.
    pub fn cancel_bedtime(&self) {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = self.kv.remove(CURRENT_SLEEP_KEY) {
            warn!(key = CURRENT_SLEEP_KEY, error = %e, "failed to clear sleep session");
        }
    }

    /// Close the open session into a record, or log a wake-only record
    /// when none is open. Either way the session slot ends cleared.
    pub fn record_wake_time(&self, now: DateTime<FixedOffset>) -> SleepRecord {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let record = match self.current_session() {
            Some(session) => {
                let delta_ms = (now - session.bedtime).num_milliseconds();
                let duration_min = (delta_ms as f64 / 60_000.0).round() as i64;
                SleepRecord {
                    id: Uuid::new_v4().to_string(),
                    bedtime: Some(session.bedtime),
                    wake_time: now,
                    duration_min: Some(duration_min),
                    date: now.date_naive(),
                }
            }
            None => SleepRecord {
                id: Uuid::new_v4().to_string(),
                bedtime: None,
                wake_time: now,
                duration_min: None,
                date: now.date_naive(),
            },
        };

        let mut records = self.records();
        records.insert(0, record.clone());
        records.truncate(MAX_RECORDS);
        self.save_json(SLEEP_RECORDS_KEY, &records);

        if let Err(e) = self.kv.remove(CURRENT_SLEEP_KEY) {
            warn!(key = CURRENT_SLEEP_KEY, error = %e, "failed to clear sleep session");
        }
        record
    }

    pub fn current_session(&self) -> Option<CurrentSleepSession> {
        match self.kv.get(CURRENT_SLEEP_KEY) {
            Ok(Some(json)) => serde_json::from_str(&json).ok(),
            Ok(None) => None,
            Err(e) => {
                warn!(key = CURRENT_SLEEP_KEY, error = %e, "failed to load sleep session");
                None
            }
        }
    }

    /// Stored history, most-recent first.
    pub fn records(&self) -> Vec<SleepRecord> {
        match self.kv.get(SLEEP_RECORDS_KEY) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!(key = SLEEP_RECORDS_KEY, error = %e, "failed to decode sleep records");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(key = SLEEP_RECORDS_KEY, error = %e, "failed to load sleep records");
                Vec::new()
            }
        }
    }

    fn save_json<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => {
                if let Err(e) = self.kv.set(key, &json) {
                    warn!(key, error = %e, "failed to save sleep data");
                }
            }
            Err(e) => warn!(key, error = %e, "failed to encode sleep data"),
        }
    }
}

/// Averages over records whose `date` falls within the 30 days before
/// `now`. Bedtimes before noon are counted as after-midnight and shifted
/// a day forward so a 23:30/00:30 mix averages near midnight instead of
/// noon.
pub fn monthly_stats(records: &[SleepRecord], now: DateTime<FixedOffset>) -> MonthlyStats {
    let cutoff = now.date_naive() - Duration::days(30);
    let monthly: Vec<&SleepRecord> = records.iter().filter(|r| r.date >= cutoff).collect();

    if monthly.is_empty() {
        return MonthlyStats::empty();
    }

    let wake_minutes: Vec<i64> = monthly
        .iter()
        .map(|r| i64::from(r.wake_time.hour()) * 60 + i64::from(r.wake_time.minute()))
        .collect();
    let avg_wake = average(&wake_minutes).map(|m| format_minutes_of_day(m.rem_euclid(1440)));

    let bed_minutes: Vec<i64> = monthly
        .iter()
        .filter_map(|r| r.bedtime)
        .map(|bed| {
            let minutes = i64::from(bed.hour()) * 60 + i64::from(bed.minute());
            if minutes < LATE_NIGHT_CUTOFF_MIN {
                minutes + 1440
            } else {
                minutes
            }
        })
        .collect();
    let avg_bedtime = average(&bed_minutes).map(|m| format_minutes_of_day(m.rem_euclid(1440)));

    let durations: Vec<i64> = monthly.iter().filter_map(|r| r.duration_min).collect();
    let avg_duration_min = average(&durations);

    MonthlyStats {
        count: monthly.len(),
        avg_wake_time: avg_wake,
        avg_bedtime,
        avg_duration_min,
    }
}

fn average(values: &[i64]) -> Option<i64> {
    if values.is_empty() {
        return None;
    }
    let sum: i64 = values.iter().sum();
    Some((sum as f64 / values.len() as f64).round() as i64)
}

fn format_minutes_of_day(minutes: i64) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// 「X時間Y分」 / 「Y分」, or 「-」 for unknown.
pub fn format_duration_min(minutes: Option<i64>) -> String {
    match minutes {
        None => "-".into(),
        Some(m) => {
            let hours = m / 60;
            let mins = m % 60;
            if hours > 0 {
                format!("{hours}時間{mins}分")
            } else {
                format!("{mins}分")
            }
        }
    }
}

/// `HH:MM` wall-clock display.
pub fn format_clock(at: DateTime<FixedOffset>) -> String {
    format!("{:02}:{:02}", at.hour(), at.minute())
}

/// 「M/D (曜)」 display.
pub fn format_date_jp(date: NaiveDate) -> String {
    let weekday = match date.weekday() {
        Weekday::Sun => "日",
        Weekday::Mon => "月",
        Weekday::Tue => "火",
        Weekday::Wed => "水",
        Weekday::Thu => "木",
        Weekday::Fri => "金",
        Weekday::Sat => "土",
    };
    format!("{}/{} ({weekday})", date.month(), date.day())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryKv;
    use chrono::TimeZone;

    fn jst(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
    }

    #[test]
    fn full_night_produces_a_completed_record() {
        let tracker = SleepTracker::new(MemoryKv::new());
        let bedtime = jst(2025, 6, 9, 23, 0);
        tracker.record_bedtime(bedtime).unwrap();
        assert!(tracker.current_session().is_some());

        // Eight hours later.
        let record = tracker.record_wake_time(jst(2025, 6, 10, 7, 0));
        assert_eq!(record.bedtime, Some(bedtime));
        assert_eq!(record.duration_min, Some(480));
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2025, 6, 10).unwrap());

        assert!(tracker.current_session().is_none());
        assert_eq!(tracker.records(), vec![record]);
    }

    #[test]
    fn wake_without_open_session_still_records() {
        let tracker = SleepTracker::new(MemoryKv::new());
        let record = tracker.record_wake_time(jst(2025, 6, 10, 7, 0));
        assert_eq!(record.bedtime, None);
        assert_eq!(record.duration_min, None);
        assert_eq!(tracker.records().len(), 1);
    }

    #[test]
    fn double_bedtime_is_rejected() {
        let tracker = SleepTracker::new(MemoryKv::new());
        tracker.record_bedtime(jst(2025, 6, 9, 23, 0)).unwrap();
        let err = tracker.record_bedtime(jst(2025, 6, 9, 23, 30)).unwrap_err();
        assert!(matches!(err, ValidationError::SessionAlreadyOpen));

        // The original session is untouched.
        assert_eq!(
            tracker.current_session().unwrap().bedtime,
            jst(2025, 6, 9, 23, 0)
        );
    }

    #[test]
    fn cancel_discards_the_open_session() {
        let tracker = SleepTracker::new(MemoryKv::new());
        tracker.record_bedtime(jst(2025, 6, 9, 23, 0)).unwrap();
        tracker.cancel_bedtime();
        assert!(tracker.current_session().is_none());
        assert!(tracker.records().is_empty());
    }

    #[test]
    fn history_keeps_the_most_recent_ninety() {
        let tracker = SleepTracker::new(MemoryKv::new());
        for day in 0..95 {
            let wake = jst(2025, 1, 1, 7, 0) + Duration::days(day);
            tracker.record_wake_time(wake);
        }
        let records = tracker.records();
        assert_eq!(records.len(), 90);
        // Most recent first.
        assert_eq!(records[0].wake_time, jst(2025, 1, 1, 7, 0) + Duration::days(94));
    }

    #[test]
    fn stats_of_empty_history_are_all_none() {
        let stats = monthly_stats(&[], jst(2025, 6, 10, 8, 0));
        assert_eq!(stats.count, 0);
        assert_eq!(stats.avg_wake_time, None);
        assert_eq!(stats.avg_bedtime, None);
        assert_eq!(stats.avg_duration_min, None);
    }

    #[test]
    fn stats_average_wake_and_duration() {
        let tracker = SleepTracker::new(MemoryKv::new());
        tracker.record_bedtime(jst(2025, 6, 8, 23, 0)).unwrap();
        tracker.record_wake_time(jst(2025, 6, 9, 7, 0)); // 480 min, wake 07:00
        tracker.record_bedtime(jst(2025, 6, 9, 23, 0)).unwrap();
        tracker.record_wake_time(jst(2025, 6, 10, 6, 0)); // 420 min, wake 06:00

        let stats = monthly_stats(&tracker.records(), jst(2025, 6, 10, 8, 0));
        assert_eq!(stats.count, 2);
        assert_eq!(stats.avg_wake_time.as_deref(), Some("06:30"));
        assert_eq!(stats.avg_bedtime.as_deref(), Some("23:00"));
        assert_eq!(stats.avg_duration_min, Some(450));
    }

    #[test]
    fn post_midnight_bedtimes_average_as_late_night() {
        // 23:30 and 00:30 should average to 00:00, not to midday.
        let records = vec![
            SleepRecord {
                id: "a".into(),
                bedtime: Some(jst(2025, 6, 8, 23, 30)),
                wake_time: jst(2025, 6, 9, 7, 0),
                duration_min: Some(450),
                date: NaiveDate::from_ymd_opt(2025, 6, 9).unwrap(),
            },
            SleepRecord {
                id: "b".into(),
                bedtime: Some(jst(2025, 6, 10, 0, 30)),
                wake_time: jst(2025, 6, 10, 7, 0),
                duration_min: Some(390),
                date: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
            },
        ];
        let stats = monthly_stats(&records, jst(2025, 6, 10, 8, 0));
        assert_eq!(stats.avg_bedtime.as_deref(), Some("00:00"));
    }

    #[test]
    fn stats_ignore_records_older_than_thirty_days() {
        let old = SleepRecord {
            id: "old".into(),
            bedtime: None,
            wake_time: jst(2025, 1, 1, 7, 0),
            duration_min: None,
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        };
        let stats = monthly_stats(&[old], jst(2025, 6, 10, 8, 0));
        assert_eq!(stats.count, 0);
    }

    #[test]
    fn display_formatting() {
        assert_eq!(format_duration_min(Some(480)), "8時間0分");
        assert_eq!(format_duration_min(Some(45)), "45分");
        assert_eq!(format_duration_min(None), "-");
        assert_eq!(format_clock(jst(2025, 6, 10, 6, 5)), "06:05");
        assert_eq!(
            format_date_jp(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()),
            "6/10 (火)"
        );
    }
}
