//! Alarm collection persistence.
//!
//! The collection is stored as one JSON document under a single key and
//! every mutation is a whole-collection read-modify-write. A mutex
//! serializes those cycles so concurrent callers cannot lose updates.
//!
//! Durability is best-effort: a failed write is logged and the operation
//! still returns the in-memory result, so callers always see a
//! self-consistent collection even when the device store is flaky.

use std::sync::Mutex;

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::platform::KvStore;

use super::model::{Alarm, AlarmDraft, AlarmPatch};

const ALARMS_KEY: &str = "alarms_v2";

pub struct AlarmStore<K: KvStore> {
    kv: K,
    // Guards the read-modify-write cycle, not the kv handle itself.
    write_lock: Mutex<()>,
}

impl<K: KvStore> AlarmStore<K> {
    pub fn new(kv: K) -> Self {
        Self {
            kv,
            write_lock: Mutex::new(()),
        }
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }

    /// All stored alarms. A missing or unreadable collection reads as
    /// empty.
    pub fn list(&self) -> Vec<Alarm> {
        self.load()
    }

    pub fn find(&self, id: &str) -> Option<Alarm> {
        self.load().into_iter().find(|a| a.id == id)
    }

    /// Persist a new alarm. Assigns the id, `enabled = true` and the
    /// creation timestamp.
    pub fn add(&self, draft: AlarmDraft) -> Alarm {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let alarm = Alarm {
            id: Uuid::new_v4().to_string(),
            kind: draft.kind,
            label: draft.label,
            volume: draft.volume,
            sound: draft.sound,
            enabled: true,
            created_at: Utc::now(),
        };
        let mut alarms = self.load();
        alarms.push(alarm.clone());
        self.save(&alarms);
        alarm
    }

    /// Merge `patch` into the alarm with `id` and return the full updated
    /// collection. A missing id is a no-op.
    pub fn update(&self, id: &str, patch: &AlarmPatch) -> Vec<Alarm> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut alarms = self.load();
        if let Some(alarm) = alarms.iter_mut().find(|a| a.id == id) {
            patch.apply(alarm);
            self.save(&alarms);
        }
        alarms
    }

    /// Remove the alarm with `id` and return the remaining collection.
    pub fn delete(&self, id: &str) -> Vec<Alarm> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut alarms = self.load();
        alarms.retain(|a| a.id != id);
        self.save(&alarms);
        alarms
    }

    fn load(&self) -> Vec<Alarm> {
        match self.kv.get(ALARMS_KEY) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!(key = ALARMS_KEY, error = %e, "failed to decode alarms");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(key = ALARMS_KEY, error = %e, "failed to load alarms");
                Vec::new()
            }
        }
    }

    fn save(&self, alarms: &[Alarm]) {
        let json = match serde_json::to_string(alarms) {
            Ok(json) => json,
            Err(e) => {
                warn!(key = ALARMS_KEY, error = %e, "failed to encode alarms");
                return;
            }
        };
        if let Err(e) = self.kv.set(ALARMS_KEY, &json) {
            warn!(key = ALARMS_KEY, error = %e, "failed to save alarms");
        }
    }
}
