use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "wakebell-cli", version, about = "Wakebell CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Alarm management
    Alarm {
        #[command(subcommand)]
        action: commands::alarm::AlarmAction,
    },
    /// Sleep session logging and statistics
    Sleep {
        #[command(subcommand)]
        action: commands::sleep::SleepAction,
    },
    /// Stopwatch control
    Stopwatch {
        #[command(subcommand)]
        action: commands::stopwatch::StopwatchAction,
    },
    /// Premium subscription state
    Subscription {
        #[command(subcommand)]
        action: commands::subscription::SubscriptionAction,
    },
    /// Today's umbrella reminder
    Weather,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Alarm { action } => commands::alarm::run(action),
        Commands::Sleep { action } => commands::sleep::run(action),
        Commands::Stopwatch { action } => commands::stopwatch::run(action),
        Commands::Subscription { action } => commands::subscription::run(action),
        Commands::Weather => commands::weather::run(),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
