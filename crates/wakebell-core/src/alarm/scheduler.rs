//! Mapping alarms onto platform notifications.
//!
//! [`NotificationGateway`] is the boundary to the OS notification
//! facility; [`AlarmScheduler`] builds one request per alarm kind. The
//! gateway contract guarantees that scheduling with id X replaces any
//! existing schedule with id X -- callers that need a clean slate (edit)
//! still cancel explicitly first.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::ScheduleError;
use crate::platform::KvStore;

use super::clock::next_occurrence;
use super::model::{Alarm, AlarmKind, SoundId, CUSTOM_SOUNDS};

/// Snooze delay, fixed at five minutes.
pub const SNOOZE_SECONDS: u32 = 300;

/// Vibration pattern attached to every alarm notification.
pub const ALARM_VIBRATION: [u64; 6] = [0, 250, 250, 250, 250, 250];

/// When the platform should deliver a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "trigger", rename_all = "lowercase")]
pub enum Trigger {
    /// Repeats every day at hour:minute until canceled.
    Daily { hour: u32, minute: u32 },
    /// One-shot, `seconds` after the schedule call.
    Interval { seconds: u32 },
    /// One-shot at an absolute instant.
    At { instant: DateTime<Utc> },
}

/// Data round-tripped through the platform notification. Delivered back
/// verbatim on fire and on action-button press.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmPayload {
    pub alarm_id: String,
    #[serde(flatten)]
    pub kind: AlarmKind,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub sound: SoundId,
    /// Receiving side must speak the wake-up reason aloud.
    #[serde(default)]
    pub speak_reason: bool,
    #[serde(default)]
    pub is_snooze: bool,
}

impl AlarmPayload {
    pub fn for_alarm(alarm: &Alarm) -> Self {
        Self {
            alarm_id: alarm.id.clone(),
            kind: alarm.kind.clone(),
            label: alarm.label.clone(),
            sound: alarm.sound.clone(),
            speak_reason: matches!(alarm.kind, AlarmKind::WakeUp { .. }),
            is_snooze: false,
        }
    }

    /// The text spoken or shown when this alarm goes off.
    pub fn body_text(&self) -> String {
        if let AlarmKind::WakeUp { reason, .. } = &self.kind {
            if !reason.is_empty() {
                return reason.clone();
            }
        }
        if !self.label.is_empty() {
            return self.label.clone();
        }
        "起きる時間です！".into()
    }
}

/// A fully-resolved notification schedule request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub id: String,
    pub title: String,
    pub body: String,
    /// Concrete sound file id -- `random` is already resolved here.
    pub sound: String,
    pub vibration: Vec<u64>,
    pub payload: AlarmPayload,
    #[serde(flatten)]
    pub trigger: Trigger,
}

/// Platform notification scheduler boundary.
///
/// Scheduling with an id that already has a pending notification replaces
/// it; cancel of an unknown id is a no-op.
pub trait NotificationGateway {
    fn schedule(&self, request: NotificationRequest) -> Result<(), ScheduleError>;
    fn cancel(&self, id: &str) -> Result<(), ScheduleError>;
    /// Administrative/debug operation only -- no normal flow calls this.
    fn cancel_all(&self) -> Result<(), ScheduleError>;
}

/// Resolve a sound id to a concrete file id.
///
/// Deliberately impure for `Random`: resolution happens at schedule time
/// with the injected RNG, so each reschedule may pick a different sound.
pub fn resolve_sound<R: Rng>(sound: &SoundId, rng: &mut R) -> String {
    match sound {
        SoundId::Default => "default".into(),
        SoundId::Random => {
            let idx = rng.gen_range(0..CUSTOM_SOUNDS.len());
            CUSTOM_SOUNDS[idx].to_string()
        }
        SoundId::Named(name) => {
            if CUSTOM_SOUNDS.contains(&name.as_str()) {
                name.clone()
            } else {
                // Unknown ids fall back to the system alert sound.
                "default".into()
            }
        }
    }
}

/// Builds one platform notification per alarm kind.
pub struct AlarmScheduler<G: NotificationGateway, R: Rng> {
    gateway: G,
    rng: R,
}

impl<G: NotificationGateway, R: Rng> AlarmScheduler<G, R> {
    pub fn with_rng(gateway: G, rng: R) -> Self {
        Self { gateway, rng }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Recurring daily trigger at the alarm's hour:minute.
    pub fn schedule_daily(&mut self, alarm: &Alarm) -> Result<(), ScheduleError> {
        let AlarmKind::Daily { hour, minute } = alarm.kind else {
            return Err(ScheduleError::Rejected {
                id: alarm.id.clone(),
                message: "not a daily alarm".into(),
            });
        };
        let request = self.request_for(alarm, "毎日アラーム", Trigger::Daily { hour, minute });
        debug!(id = %alarm.id, hour, minute, "scheduling daily alarm");
        self.gateway.schedule(request)
    }

    /// One-shot countdown measured from this call, not from creation.
    pub fn schedule_quick(&mut self, alarm: &Alarm) -> Result<(), ScheduleError> {
        let AlarmKind::Quick { seconds, .. } = alarm.kind else {
            return Err(ScheduleError::Rejected {
                id: alarm.id.clone(),
                message: "not a quick alarm".into(),
            });
        };
        let request = self.request_for(alarm, "今すぐアラーム", Trigger::Interval { seconds });
        debug!(id = %alarm.id, seconds, "scheduling quick alarm");
        self.gateway.schedule(request)
    }

    /// One-shot at the next occurrence of hour:minute, carrying the
    /// spoken read-back flag.
    pub fn schedule_wake_up<Tz: TimeZone>(
        &mut self,
        alarm: &Alarm,
        now: &DateTime<Tz>,
    ) -> Result<(), ScheduleError> {
        let AlarmKind::WakeUp { hour, minute, .. } = alarm.kind else {
            return Err(ScheduleError::Rejected {
                id: alarm.id.clone(),
                message: "not a wake-up alarm".into(),
            });
        };
        let instant = next_occurrence(hour, minute, now).with_timezone(&Utc);
        let request = self.request_for(alarm, "起きるまでアラーム", Trigger::At { instant });
        debug!(id = %alarm.id, %instant, "scheduling wake-up alarm");
        self.gateway.schedule(request)
    }

    /// Re-trigger the original payload five minutes from now under a
    /// freshly generated id. Replaces nothing.
    pub fn schedule_snooze(&mut self, payload: &AlarmPayload) -> Result<String, ScheduleError> {
        let id = format!("snooze_{}", Uuid::new_v4());
        let mut snoozed = payload.clone();
        snoozed.is_snooze = true;
        let request = NotificationRequest {
            id: id.clone(),
            title: "スヌーズ".into(),
            body: snoozed.body_text(),
            sound: resolve_sound(&snoozed.sound, &mut self.rng),
            vibration: ALARM_VIBRATION.to_vec(),
            payload: snoozed,
            trigger: Trigger::Interval {
                seconds: SNOOZE_SECONDS,
            },
        };
        debug!(id = %id, "scheduling snooze");
        self.gateway.schedule(request)?;
        Ok(id)
    }

    /// Cancel the schedule for `id`. Idempotent.
    pub fn cancel(&mut self, id: &str) -> Result<(), ScheduleError> {
        debug!(id, "canceling schedule");
        self.gateway.cancel(id)
    }

    fn request_for(&mut self, alarm: &Alarm, title: &str, trigger: Trigger) -> NotificationRequest {
        let payload = AlarmPayload::for_alarm(alarm);
        NotificationRequest {
            id: alarm.id.clone(),
            title: title.into(),
            body: payload.body_text(),
            sound: resolve_sound(&alarm.sound, &mut self.rng),
            vibration: ALARM_VIBRATION.to_vec(),
            payload,
            trigger,
        }
    }
}

/// In-memory gateway with the platform's replace-by-id semantics. Used by
/// the test suites and by embedders that render pending schedules
/// themselves.
#[derive(Default)]
pub struct MemoryGateway {
    pending: Mutex<HashMap<String, NotificationRequest>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Vec<NotificationRequest> {
        let map = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        let mut requests: Vec<_> = map.values().cloned().collect();
        requests.sort_by(|a, b| a.id.cmp(&b.id));
        requests
    }

    pub fn get(&self, id: &str) -> Option<NotificationRequest> {
        let map = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        map.get(id).cloned()
    }
}

impl NotificationGateway for MemoryGateway {
    fn schedule(&self, request: NotificationRequest) -> Result<(), ScheduleError> {
        let mut map = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        map.insert(request.id.clone(), request);
        Ok(())
    }

    fn cancel(&self, id: &str) -> Result<(), ScheduleError> {
        let mut map = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        map.remove(id);
        Ok(())
    }

    fn cancel_all(&self) -> Result<(), ScheduleError> {
        let mut map = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        map.clear();
        Ok(())
    }
}

const SCHEDULES_KEY: &str = "scheduled_notifications_v1";

/// Gateway persisting pending schedules in the key-value store, so the
/// CLI (one process per invocation) can inspect and replace them across
/// runs.
pub struct KvGateway<K: KvStore> {
    kv: K,
}

impl<K: KvStore> KvGateway<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    pub fn pending(&self) -> Result<Vec<NotificationRequest>, ScheduleError> {
        let map = self.load()?;
        let mut requests: Vec<_> = map.into_values().collect();
        requests.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(requests)
    }

    fn load(&self) -> Result<HashMap<String, NotificationRequest>, ScheduleError> {
        match self.kv.get(SCHEDULES_KEY) {
            Ok(Some(json)) => {
                serde_json::from_str(&json).map_err(|e| ScheduleError::Unavailable(e.to_string()))
            }
            Ok(None) => Ok(HashMap::new()),
            Err(e) => Err(ScheduleError::Unavailable(e.to_string())),
        }
    }

    fn store(&self, map: &HashMap<String, NotificationRequest>) -> Result<(), ScheduleError> {
        let json =
            serde_json::to_string(map).map_err(|e| ScheduleError::Unavailable(e.to_string()))?;
        self.kv
            .set(SCHEDULES_KEY, &json)
            .map_err(|e| ScheduleError::Unavailable(e.to_string()))
    }
}

impl<K: KvStore> NotificationGateway for KvGateway<K> {
    fn schedule(&self, request: NotificationRequest) -> Result<(), ScheduleError> {
        let mut map = self.load()?;
        map.insert(request.id.clone(), request);
        self.store(&map)
    }

    fn cancel(&self, id: &str) -> Result<(), ScheduleError> {
        let mut map = self.load()?;
        map.remove(id);
        self.store(&map)
    }

    fn cancel_all(&self) -> Result<(), ScheduleError> {
        self.store(&HashMap::new())
    }
}
