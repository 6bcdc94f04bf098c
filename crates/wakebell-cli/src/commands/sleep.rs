use chrono::Local;
use clap::Subcommand;

use wakebell_core::sleep::{
    format_clock, format_date_jp, format_duration_min, monthly_stats, SleepTracker,
};
use wakebell_core::storage::Database;

#[derive(Subcommand)]
pub enum SleepAction {
    /// Log bedtime now, opening a sleep session
    Bed,
    /// Log wake-up now, closing the open session into a record
    Wake,
    /// Discard the open session without recording anything
    Cancel,
    /// Show whether a session is open
    Status,
    /// Print the sleep history
    Records {
        /// Print raw records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Averages over the trailing 30 days
    Stats,
}

pub fn run(action: SleepAction) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = SleepTracker::new(Database::open()?);
    let now = Local::now().fixed_offset();

    match action {
        SleepAction::Bed => {
            let session = tracker.record_bedtime(now)?;
            println!("就寝 {}", format_clock(session.bedtime));
        }
        SleepAction::Wake => {
            let record = tracker.record_wake_time(now);
            println!(
                "{} 起床 {} 睡眠 {}",
                format_date_jp(record.date),
                format_clock(record.wake_time),
                format_duration_min(record.duration_min)
            );
        }
        SleepAction::Cancel => {
            tracker.cancel_bedtime();
            println!("canceled");
        }
        SleepAction::Status => match tracker.current_session() {
            Some(session) => println!("就寝中 {}から", format_clock(session.bedtime)),
            None => println!("起きています"),
        },
        SleepAction::Records { json } => {
            let records = tracker.records();
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                for record in &records {
                    let bedtime = record
                        .bedtime
                        .map(format_clock)
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{}  就寝 {}  起床 {}  {}",
                        format_date_jp(record.date),
                        bedtime,
                        format_clock(record.wake_time),
                        format_duration_min(record.duration_min)
                    );
                }
            }
        }
        SleepAction::Stats => {
            let stats = monthly_stats(&tracker.records(), now);
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}
