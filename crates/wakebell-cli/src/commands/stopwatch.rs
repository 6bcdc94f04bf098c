use std::time::{SystemTime, UNIX_EPOCH};

use clap::Subcommand;

use wakebell_core::platform::KvStore;
use wakebell_core::storage::Database;
use wakebell_core::stopwatch::{format_elapsed, Stopwatch};

const ENGINE_KEY: &str = "stopwatch_engine";

#[derive(Subcommand)]
pub enum StopwatchAction {
    /// Start or resume counting
    Start,
    /// Freeze the elapsed time
    Stop,
    /// Record a lap
    Lap,
    /// Zero the elapsed time and clear laps
    Reset,
    /// Print the current engine state as JSON
    Status,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn load_engine(db: &Database) -> Stopwatch {
    if let Ok(Some(json)) = db.get(ENGINE_KEY) {
        if let Ok(engine) = serde_json::from_str::<Stopwatch>(&json) {
            return engine;
        }
    }
    Stopwatch::new()
}

fn save_engine(db: &Database, engine: &Stopwatch) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string(engine)?;
    db.set(ENGINE_KEY, &json)?;
    Ok(())
}

pub fn run(action: StopwatchAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let mut engine = load_engine(&db);
    let now = now_ms();

    match action {
        StopwatchAction::Start => {
            engine.start(now);
            println!("{}", format_elapsed(engine.elapsed_at(now)));
        }
        StopwatchAction::Stop => {
            engine.stop(now);
            println!("{}", format_elapsed(engine.elapsed_at(now)));
        }
        StopwatchAction::Lap => match engine.lap(now) {
            Some(lap) => println!("{}", serde_json::to_string_pretty(&lap)?),
            None => {
                eprintln!("stopwatch is not running");
            }
        },
        StopwatchAction::Reset => {
            engine.reset();
            println!("00:00.00");
        }
        StopwatchAction::Status => {
            engine.tick(now);
            println!("{}", serde_json::to_string_pretty(&engine)?);
        }
    }

    save_engine(&db, &engine)?;
    Ok(())
}
