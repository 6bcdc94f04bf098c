//! Alarm lifecycle orchestration.
//!
//! The controller is the only writer that touches both the record store
//! and the notification schedule, and it keeps them in lock-step: at most
//! one live schedule per alarm id, none for disabled records. When the
//! platform rejects a schedule after the store write already succeeded,
//! the record is rolled back to disabled and the error propagates -- a
//! record must never claim `enabled` without a real schedule behind it.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::Rng;
use tracing::warn;

use crate::error::{CoreError, ScheduleError, ValidationError};
use crate::platform::{Haptics, KvStore, Speech, VoiceParams};

use super::model::{validate_draft, validate_kind, validate_volume, Alarm, AlarmDraft, AlarmKind, AlarmPatch};
use super::scheduler::{AlarmPayload, AlarmScheduler, NotificationGateway};
use super::store::AlarmStore;

/// User response to a delivered alarm notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationAction {
    /// The 「停止」 action button.
    Stop,
    /// The 「スヌーズ (5分)」 action button.
    Snooze,
    /// Default tap on the notification body.
    Tap,
}

pub struct AlarmController<K: KvStore, G: NotificationGateway, R: Rng> {
    store: AlarmStore<K>,
    scheduler: AlarmScheduler<G, R>,
    speech: Box<dyn Speech>,
    haptics: Box<dyn Haptics>,
    voice: VoiceParams,
}

impl<K: KvStore, G: NotificationGateway, R: Rng> AlarmController<K, G, R> {
    pub fn new(
        store: AlarmStore<K>,
        scheduler: AlarmScheduler<G, R>,
        speech: Box<dyn Speech>,
        haptics: Box<dyn Haptics>,
    ) -> Self {
        Self {
            store,
            scheduler,
            speech,
            haptics,
            voice: VoiceParams::default(),
        }
    }

    pub fn set_voice(&mut self, voice: VoiceParams) {
        self.voice = voice;
    }

    pub fn store(&self) -> &AlarmStore<K> {
        &self.store
    }

    pub fn scheduler(&self) -> &AlarmScheduler<G, R> {
        &self.scheduler
    }

    pub fn list(&self) -> Vec<Alarm> {
        self.store.list()
    }

    /// Validate and persist a new alarm, then schedule it.
    ///
    /// Quick alarms get their trigger instant stamped here, `now +
    /// seconds`. On a scheduling failure the record is rolled back to
    /// disabled and the error is returned.
    pub fn create<Tz: TimeZone>(
        &mut self,
        mut draft: AlarmDraft,
        now: &DateTime<Tz>,
    ) -> Result<Alarm, CoreError> {
        validate_draft(&draft)?;
        if let AlarmKind::Quick {
            seconds,
            trigger_time,
        } = &mut draft.kind
        {
            *trigger_time =
                Some(now.with_timezone(&Utc) + Duration::seconds(i64::from(*seconds)));
        }

        let alarm = self.store.add(draft);
        match self.schedule_by_kind(&alarm, now) {
            Ok(()) => Ok(alarm),
            Err(e) => {
                self.demote_to_disabled(&alarm.id);
                Err(e.into())
            }
        }
    }

    /// Replace an existing alarm's fields and re-schedule.
    ///
    /// The old schedule is canceled unconditionally so no stale schedule
    /// can survive an edit, whatever the record's previous enabled state.
    pub fn edit<Tz: TimeZone>(
        &mut self,
        id: &str,
        mut patch: AlarmPatch,
        now: &DateTime<Tz>,
    ) -> Result<Vec<Alarm>, CoreError> {
        let existing = self
            .store
            .find(id)
            .ok_or_else(|| ValidationError::NotFound(id.to_string()))?;
        if let Some(kind) = &mut patch.kind {
            validate_kind(kind)?;
            if let AlarmKind::Quick {
                seconds,
                trigger_time,
            } = kind
            {
                *trigger_time =
                    Some(now.with_timezone(&Utc) + Duration::seconds(i64::from(*seconds)));
            }
        } else if let AlarmKind::Quick { seconds, .. } = existing.kind {
            // Any edit of an armed quick alarm restarts its countdown, so
            // the stored trigger instant matches the fresh schedule below
            // even when the patch only touches label or volume.
            if patch.enabled.unwrap_or(existing.enabled) {
                patch.kind = Some(AlarmKind::Quick {
                    seconds,
                    trigger_time: Some(
                        now.with_timezone(&Utc) + Duration::seconds(i64::from(seconds)),
                    ),
                });
            }
        }
        if let Some(volume) = patch.volume {
            validate_volume(volume)?;
        }

        self.scheduler.cancel(id)?;
        let alarms = self.store.update(id, &patch);

        let updated = alarms.iter().find(|a| a.id == id).cloned();
        if let Some(alarm) = updated {
            if alarm.enabled {
                if let Err(e) = self.schedule_by_kind(&alarm, now) {
                    self.demote_to_disabled(id);
                    return Err(e.into());
                }
            }
        }
        Ok(self.store.list())
    }

    /// Flip the enabled state of an alarm, with the light haptic pulse
    /// of a switch press.
    pub fn toggle<Tz: TimeZone>(
        &mut self,
        id: &str,
        now: &DateTime<Tz>,
    ) -> Result<Alarm, CoreError> {
        let alarm = self
            .store
            .find(id)
            .ok_or_else(|| ValidationError::NotFound(id.to_string()))?;
        self.haptics.light();
        if alarm.enabled {
            self.toggle_off(id)
        } else {
            self.toggle_on(id, now)
        }
    }

    /// Enable and schedule. A quick alarm restarts its countdown: the
    /// trigger instant is recomputed as `now + seconds` before the store
    /// write, not reused from its previous arming.
    pub fn toggle_on<Tz: TimeZone>(
        &mut self,
        id: &str,
        now: &DateTime<Tz>,
    ) -> Result<Alarm, CoreError> {
        let alarm = self
            .store
            .find(id)
            .ok_or_else(|| ValidationError::NotFound(id.to_string()))?;

        let mut patch = AlarmPatch::enabled(true);
        if let AlarmKind::Quick { seconds, .. } = alarm.kind {
            patch.kind = Some(AlarmKind::Quick {
                seconds,
                trigger_time: Some(
                    now.with_timezone(&Utc) + Duration::seconds(i64::from(seconds)),
                ),
            });
        }
        let alarms = self.store.update(id, &patch);
        let updated = alarms
            .into_iter()
            .find(|a| a.id == id)
            .ok_or_else(|| ValidationError::NotFound(id.to_string()))?;

        match self.schedule_by_kind(&updated, now) {
            Ok(()) => Ok(updated),
            Err(e) => {
                self.demote_to_disabled(id);
                Err(e.into())
            }
        }
    }

    /// Disable and cancel any live schedule.
    pub fn toggle_off(&mut self, id: &str) -> Result<Alarm, CoreError> {
        let alarms = self.store.update(id, &AlarmPatch::enabled(false));
        let updated = alarms
            .into_iter()
            .find(|a| a.id == id)
            .ok_or_else(|| ValidationError::NotFound(id.to_string()))?;
        self.scheduler.cancel(id)?;
        Ok(updated)
    }

    /// Cancel the schedule and remove the record, whatever its state.
    pub fn delete(&mut self, id: &str) -> Result<Vec<Alarm>, CoreError> {
        self.scheduler.cancel(id)?;
        Ok(self.store.delete(id))
    }

    /// Notification delivery callback. Every alarm fires the haptic
    /// pattern; wake-up alarms additionally speak their reason.
    pub fn handle_fired(&mut self, payload: &AlarmPayload) {
        self.haptics.alarm_pattern();
        if payload.speak_reason {
            self.speech.speak(&payload.body_text(), &self.voice);
        }
    }

    /// Action-button callback. Returns the snooze notification id when
    /// one was scheduled.
    pub fn handle_action(
        &mut self,
        action: NotificationAction,
        payload: &AlarmPayload,
    ) -> Result<Option<String>, CoreError> {
        match action {
            NotificationAction::Stop => {
                self.speech.stop();
                Ok(None)
            }
            NotificationAction::Snooze => {
                self.speech.stop();
                let id = self.scheduler.schedule_snooze(payload)?;
                Ok(Some(id))
            }
            NotificationAction::Tap => Ok(None),
        }
    }

    fn schedule_by_kind<Tz: TimeZone>(
        &mut self,
        alarm: &Alarm,
        now: &DateTime<Tz>,
    ) -> Result<(), ScheduleError> {
        match alarm.kind {
            AlarmKind::Daily { .. } => self.scheduler.schedule_daily(alarm),
            AlarmKind::Quick { .. } => self.scheduler.schedule_quick(alarm),
            AlarmKind::WakeUp { .. } => self.scheduler.schedule_wake_up(alarm, now),
        }
    }

    fn demote_to_disabled(&mut self, id: &str) {
        warn!(id, "schedule failed, rolling alarm back to disabled");
        self.store.update(id, &AlarmPatch::enabled(false));
    }
}
