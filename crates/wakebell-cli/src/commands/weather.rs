use wakebell_core::storage::Config;
use wakebell_core::weather::{umbrella_message, WeatherProvider};

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let threshold = config.weather.umbrella_threshold;
    let provider = WeatherProvider::new(config.weather)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let report = runtime.block_on(provider.fetch_or_none());

    let advice = umbrella_message(report.as_ref(), threshold);
    println!("{} {}", advice.icon, advice.message);
    Ok(())
}
