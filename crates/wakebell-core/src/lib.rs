//! # Wakebell Core Library
//!
//! This library provides the core business logic for the Wakebell alarm
//! app. It implements a CLI-first philosophy where all operations are
//! available via a standalone CLI binary, with any GUI shell being a thin
//! layer over the same core library.
//!
//! ## Architecture
//!
//! - **Alarm domain**: Alarm records, pure next-fire/remaining-time math,
//!   and a lifecycle controller that keeps the store and the platform
//!   notification scheduler consistent
//! - **Sleep tracking**: Bedtime/wake logging with monthly averages
//! - **Stopwatch**: A wall-clock engine that requires the caller to
//!   periodically invoke `tick()` for display updates
//! - **Storage**: SQLite-backed key-value persistence and TOML-based
//!   configuration
//! - **Platform**: Traits for the host-provided facilities (key-value
//!   store, speech synthesis, haptics, notification scheduling)
//!
//! ## Key Components
//!
//! - [`AlarmController`]: Alarm lifecycle orchestration
//! - [`SleepTracker`]: Sleep session logging and statistics
//! - [`Stopwatch`]: Lap-tracking stopwatch engine
//! - [`Database`]: Key-value persistence
//! - [`Config`]: Application configuration management

pub mod alarm;
pub mod error;
pub mod platform;
pub mod sleep;
pub mod stopwatch;
pub mod storage;
pub mod subscription;
pub mod weather;

pub use alarm::{
    Alarm, AlarmController, AlarmDraft, AlarmKind, AlarmPatch, AlarmScheduler, AlarmStore,
    NotificationAction, NotificationGateway, NotificationRequest, SoundId, Trigger,
};
pub use error::{CoreError, Result, ScheduleError, StorageError, ValidationError};
pub use platform::{Haptics, KvStore, Speech, VoiceParams};
pub use sleep::{MonthlyStats, SleepRecord, SleepTracker};
pub use stopwatch::{Lap, Stopwatch, StopwatchState};
pub use storage::{Config, Database};
pub use subscription::{Subscription, SubscriptionStatus, SubscriptionStore};
pub use weather::{umbrella_message, UmbrellaAdvice, WeatherProvider, WeatherReport};
