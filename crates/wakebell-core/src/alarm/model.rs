//! Alarm records and their validation rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The three alarm kinds, discriminated by a `type` field on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AlarmKind {
    /// Fires every day at hour:minute.
    Daily { hour: u32, minute: u32 },
    /// One-shot countdown. `trigger_time` is the absolute instant the
    /// countdown ends; recomputed on every re-enable.
    Quick {
        seconds: u32,
        trigger_time: Option<DateTime<Utc>>,
    },
    /// One-shot alarm at the next occurrence of hour:minute, with a
    /// mandatory spoken reason on firing.
    WakeUp {
        hour: u32,
        minute: u32,
        reason: String,
    },
}

impl AlarmKind {
    pub fn is_quick(&self) -> bool {
        matches!(self, AlarmKind::Quick { .. })
    }
}

/// Alarm sound selection.
///
/// `Random` is resolved to a concrete member of [`CUSTOM_SOUNDS`] at
/// schedule time, not at creation time -- each reschedule may pick a
/// different sound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundId {
    Default,
    Random,
    #[serde(untagged)]
    Named(String),
}

impl Default for SoundId {
    fn default() -> Self {
        SoundId::Default
    }
}

/// Sound ids eligible for random selection.
pub const CUSTOM_SOUNDS: [&str; 6] = ["default", "alarm", "bell", "chime", "digital", "gentle"];

/// A stored alarm record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    pub id: String,
    #[serde(flatten)]
    pub kind: AlarmKind,
    #[serde(default)]
    pub label: String,
    pub volume: f64,
    #[serde(default)]
    pub sound: SoundId,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// Input to [`AlarmStore::add`](crate::alarm::AlarmStore::add). The store
/// assigns id, `enabled = true` and `created_at`.
#[derive(Debug, Clone)]
pub struct AlarmDraft {
    pub kind: AlarmKind,
    pub label: String,
    pub volume: f64,
    pub sound: SoundId,
}

impl AlarmDraft {
    pub fn daily(hour: u32, minute: u32, label: impl Into<String>) -> Self {
        Self {
            kind: AlarmKind::Daily { hour, minute },
            label: label.into(),
            volume: 1.0,
            sound: SoundId::Default,
        }
    }

    pub fn quick(seconds: u32, label: impl Into<String>) -> Self {
        Self {
            kind: AlarmKind::Quick {
                seconds,
                trigger_time: None,
            },
            label: label.into(),
            volume: 1.0,
            sound: SoundId::Default,
        }
    }

    pub fn wake_up(hour: u32, minute: u32, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            kind: AlarmKind::WakeUp {
                hour,
                minute,
                reason: reason.clone(),
            },
            // The wake-up label is the reason itself.
            label: reason,
            volume: 1.0,
            sound: SoundId::Default,
        }
    }
}

/// Partial update applied by [`AlarmStore::update`](crate::alarm::AlarmStore::update).
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct AlarmPatch {
    pub kind: Option<AlarmKind>,
    pub label: Option<String>,
    pub volume: Option<f64>,
    pub sound: Option<SoundId>,
    pub enabled: Option<bool>,
}

impl AlarmPatch {
    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            ..Self::default()
        }
    }

    pub fn apply(&self, alarm: &mut Alarm) {
        if let Some(kind) = &self.kind {
            alarm.kind = kind.clone();
        }
        if let Some(label) = &self.label {
            alarm.label = label.clone();
        }
        if let Some(volume) = self.volume {
            alarm.volume = volume;
        }
        if let Some(sound) = &self.sound {
            alarm.sound = sound.clone();
        }
        if let Some(enabled) = self.enabled {
            alarm.enabled = enabled;
        }
    }
}

fn validate_time_of_day(hour: u32, minute: u32) -> Result<(), ValidationError> {
    if hour > 23 {
        return Err(ValidationError::InvalidValue {
            field: "hour",
            message: format!("{hour} is out of range 0-23"),
        });
    }
    if minute > 59 {
        return Err(ValidationError::InvalidValue {
            field: "minute",
            message: format!("{minute} is out of range 0-59"),
        });
    }
    Ok(())
}

/// Kind-specific creation/edit constraints. Failures block the lifecycle
/// transition before any store mutation.
pub fn validate_kind(kind: &AlarmKind) -> Result<(), ValidationError> {
    match kind {
        AlarmKind::Daily { hour, minute } => validate_time_of_day(*hour, *minute),
        AlarmKind::Quick { seconds, .. } => {
            if *seconds == 0 {
                return Err(ValidationError::InvalidValue {
                    field: "seconds",
                    message: "quick alarm duration must be greater than zero".into(),
                });
            }
            Ok(())
        }
        AlarmKind::WakeUp {
            hour,
            minute,
            reason,
        } => {
            validate_time_of_day(*hour, *minute)?;
            if reason.trim().is_empty() {
                return Err(ValidationError::MissingField("reason"));
            }
            Ok(())
        }
    }
}

pub fn validate_volume(volume: f64) -> Result<(), ValidationError> {
    if !(0.0..=1.0).contains(&volume) || volume.is_nan() {
        return Err(ValidationError::InvalidValue {
            field: "volume",
            message: format!("{volume} is out of range 0.0-1.0"),
        });
    }
    Ok(())
}

pub fn validate_draft(draft: &AlarmDraft) -> Result<(), ValidationError> {
    validate_kind(&draft.kind)?;
    validate_volume(draft.volume)
}
