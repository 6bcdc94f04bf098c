//! Integration tests for the alarm workflow over real SQLite storage.
//!
//! These tests drive the controller through the same shared database the
//! CLI uses: one connection backing both the record store and the
//! persisted notification schedule.

use std::rc::Rc;

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

use wakebell_core::alarm::{
    remaining_text, AlarmController, AlarmDraft, AlarmKind, AlarmPatch, AlarmScheduler,
    AlarmStore, KvGateway, Trigger,
};
use wakebell_core::platform::{NullHaptics, NullSpeech};
use wakebell_core::storage::Database;

type SharedDb = Rc<Database>;
type Controller = AlarmController<SharedDb, KvGateway<SharedDb>, Pcg64Mcg>;

fn controller(db: &SharedDb) -> Controller {
    AlarmController::new(
        AlarmStore::new(db.clone()),
        AlarmScheduler::with_rng(KvGateway::new(db.clone()), Pcg64Mcg::seed_from_u64(11)),
        Box::new(NullSpeech),
        Box::new(NullHaptics),
    )
}

fn jst_morning() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(9 * 3600)
        .unwrap()
        .with_ymd_and_hms(2025, 6, 10, 6, 0, 0)
        .unwrap()
}

#[test]
fn create_persists_record_and_schedule_together() {
    let db: SharedDb = Rc::new(Database::open_memory().unwrap());
    let mut c = controller(&db);

    let alarm = c.create(AlarmDraft::daily(7, 30, "起床"), &jst_morning()).unwrap();

    // A second controller over the same database sees both sides.
    let c2 = controller(&db);
    let listed = c2.list();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, alarm.id);
    assert!(listed[0].enabled);

    let pending = c2.scheduler().gateway().pending().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].trigger, Trigger::Daily { hour: 7, minute: 30 });
}

#[test]
fn full_lifecycle_create_edit_toggle_delete() {
    let db: SharedDb = Rc::new(Database::open_memory().unwrap());
    let mut c = controller(&db);
    let now = jst_morning();

    let alarm = c.create(AlarmDraft::wake_up(6, 30, "ゴミ出し"), &now).unwrap();
    assert_eq!(
        remaining_text(&alarm, &now).as_deref(),
        Some("あと30分")
    );

    // Move it later; the schedule follows.
    let patch = AlarmPatch {
        kind: Some(AlarmKind::WakeUp {
            hour: 7,
            minute: 0,
            reason: "ゴミ出し".into(),
        }),
        ..AlarmPatch::default()
    };
    c.edit(&alarm.id, patch, &now).unwrap();
    let req = c.scheduler().gateway().pending().unwrap().remove(0);
    match req.trigger {
        Trigger::At { instant } => {
            assert_eq!(instant, now.with_timezone(&Utc) + Duration::hours(1));
        }
        other => panic!("expected absolute trigger, got {other:?}"),
    }

    // Off: schedule gone, record kept.
    c.toggle(&alarm.id, &now).unwrap();
    assert!(c.scheduler().gateway().pending().unwrap().is_empty());
    assert_eq!(c.list().len(), 1);

    // Delete: record gone too.
    c.delete(&alarm.id).unwrap();
    assert!(c.list().is_empty());
}

#[test]
fn quick_countdown_survives_a_process_restart() {
    let db: SharedDb = Rc::new(Database::open_memory().unwrap());
    let now = jst_morning();

    let alarm = {
        let mut c = controller(&db);
        c.create(AlarmDraft::quick(600, ""), &now).unwrap()
    };

    // "Restart": fresh controller, same database. The stored trigger
    // instant keeps counting down from the original arming.
    let c = controller(&db);
    let reloaded = c.list().remove(0);
    assert_eq!(reloaded.id, alarm.id);

    let later = now + Duration::seconds(400);
    assert_eq!(
        remaining_text(&reloaded, &later).as_deref(),
        Some("あと3分20秒")
    );
    let after = now + Duration::seconds(601);
    assert_eq!(remaining_text(&reloaded, &after), None);
}

#[test]
fn mixed_alarm_list_round_trips_through_sqlite() {
    let db: SharedDb = Rc::new(Database::open_memory().unwrap());
    let mut c = controller(&db);
    let now = jst_morning();

    c.create(AlarmDraft::daily(7, 30, "起床"), &now).unwrap();
    c.create(AlarmDraft::quick(300, ""), &now).unwrap();
    c.create(AlarmDraft::wake_up(8, 0, "会議の準備"), &now).unwrap();

    let reloaded = controller(&db).list();
    assert_eq!(reloaded.len(), 3);
    assert!(reloaded.iter().any(|a| matches!(a.kind, AlarmKind::Daily { hour: 7, minute: 30 })));
    assert!(reloaded
        .iter()
        .any(|a| matches!(a.kind, AlarmKind::Quick { seconds: 300, .. })));
    assert!(reloaded.iter().any(
        |a| matches!(&a.kind, AlarmKind::WakeUp { reason, .. } if reason == "会議の準備")
    ));
    assert_eq!(c.scheduler().gateway().pending().unwrap().len(), 3);
}
