use std::rc::Rc;

use chrono::Local;
use clap::Subcommand;
use rand::rngs::ThreadRng;

use wakebell_core::alarm::{
    remaining_text, AlarmController, AlarmDraft, AlarmKind, AlarmPatch, AlarmScheduler,
    AlarmStore, KvGateway,
};
use wakebell_core::platform::{NullHaptics, NullSpeech};
use wakebell_core::storage::{Config, Database};

#[derive(Subcommand)]
pub enum AlarmAction {
    /// Add a daily repeating alarm
    AddDaily {
        /// Hour of day (0-23)
        hour: u32,
        /// Minute (0-59)
        minute: u32,
        /// Display label
        #[arg(long, default_value = "")]
        label: String,
    },
    /// Add a one-shot countdown alarm
    AddQuick {
        /// Countdown length in seconds
        seconds: u32,
        /// Display label
        #[arg(long, default_value = "")]
        label: String,
    },
    /// Add a wake-up alarm with a spoken reason
    AddWakeUp {
        /// Hour of day (0-23)
        hour: u32,
        /// Minute (0-59)
        minute: u32,
        /// Reason read aloud when the alarm fires
        reason: String,
    },
    /// Update an alarm's fields and re-schedule it
    Edit {
        /// Alarm id
        id: String,
        /// New display label
        #[arg(long)]
        label: Option<String>,
        /// New volume (0.0-1.0)
        #[arg(long)]
        volume: Option<f64>,
        /// New hour of day (daily and wake-up alarms)
        #[arg(long)]
        hour: Option<u32>,
        /// New minute (daily and wake-up alarms)
        #[arg(long)]
        minute: Option<u32>,
        /// New countdown length in seconds (quick alarms)
        #[arg(long)]
        seconds: Option<u32>,
        /// New spoken reason (wake-up alarms)
        #[arg(long)]
        reason: Option<String>,
    },
    /// List alarms with remaining time
    List {
        /// Print raw records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Flip an alarm's enabled state
    Toggle {
        /// Alarm id
        id: String,
    },
    /// Delete an alarm
    Delete {
        /// Alarm id
        id: String,
    },
    /// Print pending platform notifications as JSON
    Pending,
}

type Controller = AlarmController<Rc<Database>, KvGateway<Rc<Database>>, ThreadRng>;

fn controller(db: &Rc<Database>) -> Controller {
    AlarmController::new(
        AlarmStore::new(db.clone()),
        AlarmScheduler::with_rng(KvGateway::new(db.clone()), rand::thread_rng()),
        Box::new(NullSpeech),
        Box::new(NullHaptics),
    )
}

fn kind_summary(kind: &AlarmKind) -> String {
    match kind {
        AlarmKind::Daily { hour, minute } => format!("毎日 {hour:02}:{minute:02}"),
        AlarmKind::Quick { seconds, .. } => format!("今すぐ {seconds}秒"),
        AlarmKind::WakeUp { hour, minute, .. } => format!("起床 {hour:02}:{minute:02}"),
    }
}

pub fn run(action: AlarmAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Rc::new(Database::open()?);
    let mut c = controller(&db);
    let now = Local::now();

    match action {
        AlarmAction::AddDaily { hour, minute, label } => {
            let mut draft = AlarmDraft::daily(hour, minute, label);
            draft.volume = Config::load_or_default().notifications.default_volume;
            let alarm = c.create(draft, &now)?;
            println!("{}", serde_json::to_string_pretty(&alarm)?);
        }
        AlarmAction::AddQuick { seconds, label } => {
            let mut draft = AlarmDraft::quick(seconds, label);
            draft.volume = Config::load_or_default().notifications.default_volume;
            let alarm = c.create(draft, &now)?;
            println!("{}", serde_json::to_string_pretty(&alarm)?);
        }
        AlarmAction::AddWakeUp { hour, minute, reason } => {
            let mut draft = AlarmDraft::wake_up(hour, minute, reason);
            draft.volume = Config::load_or_default().notifications.default_volume;
            let alarm = c.create(draft, &now)?;
            println!("{}", serde_json::to_string_pretty(&alarm)?);
        }
        AlarmAction::Edit {
            id,
            label,
            volume,
            hour,
            minute,
            seconds,
            reason,
        } => {
            // Time fields merge into the alarm's existing kind; the kind
            // itself never changes through an edit.
            let kind = if hour.is_some() || minute.is_some() || seconds.is_some() || reason.is_some()
            {
                let existing = c
                    .store()
                    .find(&id)
                    .ok_or_else(|| format!("no such alarm: {id}"))?;
                Some(match existing.kind {
                    AlarmKind::Daily { hour: h, minute: m } => AlarmKind::Daily {
                        hour: hour.unwrap_or(h),
                        minute: minute.unwrap_or(m),
                    },
                    AlarmKind::Quick { seconds: s, .. } => AlarmKind::Quick {
                        seconds: seconds.unwrap_or(s),
                        trigger_time: None,
                    },
                    AlarmKind::WakeUp {
                        hour: h,
                        minute: m,
                        reason: r,
                    } => AlarmKind::WakeUp {
                        hour: hour.unwrap_or(h),
                        minute: minute.unwrap_or(m),
                        reason: reason.unwrap_or(r),
                    },
                })
            } else {
                None
            };
            let patch = AlarmPatch {
                kind,
                label,
                volume,
                ..AlarmPatch::default()
            };
            let alarms = c.edit(&id, patch, &now)?;
            if let Some(alarm) = alarms.iter().find(|a| a.id == id) {
                println!("{}", serde_json::to_string_pretty(alarm)?);
            }
        }
        AlarmAction::List { json } => {
            let alarms = c.list();
            if json {
                println!("{}", serde_json::to_string_pretty(&alarms)?);
            } else {
                for alarm in &alarms {
                    let countdown = remaining_text(alarm, &now)
                        .unwrap_or_else(|| "停止中".to_string());
                    println!("{}  {}  {}", alarm.id, kind_summary(&alarm.kind), countdown);
                }
            }
        }
        AlarmAction::Toggle { id } => {
            let alarm = c.toggle(&id, &now)?;
            println!("{}", serde_json::to_string_pretty(&alarm)?);
        }
        AlarmAction::Delete { id } => {
            c.delete(&id)?;
            println!("deleted");
        }
        AlarmAction::Pending => {
            let pending = c.scheduler().gateway().pending()?;
            println!("{}", serde_json::to_string_pretty(&pending)?);
        }
    }
    Ok(())
}
