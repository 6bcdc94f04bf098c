//! Alarm domain: records, persistence, time math, platform scheduling
//! and the lifecycle controller that keeps them consistent.

pub mod clock;
pub mod controller;
pub mod model;
pub mod scheduler;
pub mod store;

pub use clock::{
    format_quick_duration, next_fire, next_occurrence, refresh_interval, remaining,
    remaining_text, remaining_text_bare,
};
pub use controller::{AlarmController, NotificationAction};
pub use model::{Alarm, AlarmDraft, AlarmKind, AlarmPatch, SoundId, CUSTOM_SOUNDS};
pub use scheduler::{
    AlarmPayload, AlarmScheduler, KvGateway, MemoryGateway, NotificationGateway,
    NotificationRequest, Trigger, SNOOZE_SECONDS,
};
pub use store::AlarmStore;
