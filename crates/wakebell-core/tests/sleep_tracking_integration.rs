//! Integration tests for sleep tracking over real SQLite storage.

use std::rc::Rc;

use chrono::{DateTime, Duration, FixedOffset, TimeZone};

use wakebell_core::sleep::{format_duration_min, monthly_stats, SleepTracker};
use wakebell_core::storage::Database;

fn jst(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(9 * 3600)
        .unwrap()
        .with_ymd_and_hms(y, mo, d, h, mi, 0)
        .unwrap()
}

#[test]
fn open_session_survives_a_process_restart() {
    let db = Rc::new(Database::open_memory().unwrap());

    let bedtime = jst(2025, 6, 9, 23, 15);
    SleepTracker::new(db.clone()).record_bedtime(bedtime).unwrap();

    // "Restart": a fresh tracker over the same database closes the
    // session the previous process opened.
    let tracker = SleepTracker::new(db.clone());
    assert_eq!(tracker.current_session().unwrap().bedtime, bedtime);

    let record = tracker.record_wake_time(jst(2025, 6, 10, 6, 45));
    assert_eq!(record.duration_min, Some(450));
    assert_eq!(format_duration_min(record.duration_min), "7時間30分");
    assert!(tracker.current_session().is_none());
}

#[test]
fn a_week_of_nights_produces_stable_averages() {
    let db = Rc::new(Database::open_memory().unwrap());
    let tracker = SleepTracker::new(db);

    // Seven nights, 23:00 -> 07:00.
    for day in 0..7 {
        let night = jst(2025, 6, 1, 23, 0) + Duration::days(day);
        let morning = jst(2025, 6, 2, 7, 0) + Duration::days(day);
        tracker.record_bedtime(night).unwrap();
        tracker.record_wake_time(morning);
    }

    let stats = monthly_stats(&tracker.records(), jst(2025, 6, 9, 8, 0));
    assert_eq!(stats.count, 7);
    assert_eq!(stats.avg_bedtime.as_deref(), Some("23:00"));
    assert_eq!(stats.avg_wake_time.as_deref(), Some("07:00"));
    assert_eq!(stats.avg_duration_min, Some(480));
}

#[test]
fn wake_only_records_mix_into_history_without_skewing_durations() {
    let db = Rc::new(Database::open_memory().unwrap());
    let tracker = SleepTracker::new(db);

    tracker.record_bedtime(jst(2025, 6, 8, 23, 0)).unwrap();
    tracker.record_wake_time(jst(2025, 6, 9, 7, 0)); // 480 min

    // Alarm dismissed without ever logging a bedtime.
    tracker.record_wake_time(jst(2025, 6, 10, 7, 0));

    let stats = monthly_stats(&tracker.records(), jst(2025, 6, 10, 8, 0));
    assert_eq!(stats.count, 2);
    // Duration and bedtime averages only cover complete records.
    assert_eq!(stats.avg_duration_min, Some(480));
    assert_eq!(stats.avg_bedtime.as_deref(), Some("23:00"));
    assert_eq!(stats.avg_wake_time.as_deref(), Some("07:00"));
}
