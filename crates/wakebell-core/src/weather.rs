//! Morning umbrella reminder backed by the Open-Meteo forecast API.
//!
//! One request per check: today's maximum precipitation probability and
//! WMO weather code for the configured location. Fetch failures never
//! break the alarm screen; the caller renders the placeholder message
//! instead.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::error::{CoreError, Result};
use crate::storage::WeatherConfig;

const OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Probability (%) at or above which the umbrella is non-negotiable.
const MUST_CARRY_THRESHOLD: u8 = 70;

/// Today's forecast, reduced to what the reminder needs.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    /// Maximum precipitation probability today, in percent.
    pub precipitation_probability: u8,
    /// WMO weather interpretation code, when the response carries one.
    pub weather_code: Option<u16>,
}

impl WeatherReport {
    pub fn needs_umbrella(&self, threshold: u8) -> bool {
        self.precipitation_probability >= threshold
    }

    /// Japanese description of the WMO weather code; 「不明」 when the
    /// response carried none.
    pub fn description(&self) -> &'static str {
        self.weather_code.map_or("不明", describe_weather_code)
    }
}

#[derive(Deserialize)]
struct ForecastResponse {
    daily: DailyBlock,
}

#[derive(Deserialize)]
struct DailyBlock {
    precipitation_probability_max: Vec<Option<f64>>,
    weather_code: Vec<Option<u16>>,
}

pub struct WeatherProvider {
    client: Client,
    base_url: String,
    config: WeatherConfig,
}

impl WeatherProvider {
    pub fn new(config: WeatherConfig) -> Result<Self> {
        Self::with_base_url(config, OPEN_METEO_URL)
    }

    /// Point the provider at a different endpoint (used by tests).
    pub fn with_base_url(config: WeatherConfig, base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CoreError::Custom(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            config,
        })
    }

    /// Fetch today's forecast for the configured location.
    pub async fn fetch(&self) -> Result<WeatherReport> {
        let url = self.request_url()?;
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CoreError::Custom(format!("weather request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(CoreError::Custom(format!(
                "weather request failed: HTTP {}",
                resp.status()
            )));
        }

        let body: ForecastResponse = resp
            .json()
            .await
            .map_err(|e| CoreError::Custom(format!("weather response malformed: {e}")))?;

        let probability = body
            .daily
            .precipitation_probability_max
            .first()
            .copied()
            .flatten()
            .ok_or_else(|| CoreError::Custom("weather response missing today's forecast".into()))?;
        let code = body.daily.weather_code.first().copied().flatten();

        Ok(WeatherReport {
            precipitation_probability: probability.clamp(0.0, 100.0).round() as u8,
            weather_code: code,
        })
    }

    /// Like [`fetch`](Self::fetch) but degrades to `None` with a log line,
    /// matching the best-effort contract of the alarm screen.
    pub async fn fetch_or_none(&self) -> Option<WeatherReport> {
        match self.fetch().await {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(error = %e, "weather fetch failed");
                None
            }
        }
    }

    pub fn umbrella_threshold(&self) -> u8 {
        self.config.umbrella_threshold
    }

    fn request_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| CoreError::Custom(format!("invalid weather endpoint: {e}")))?;
        url.query_pairs_mut()
            .append_pair("latitude", &self.config.latitude.to_string())
            .append_pair("longitude", &self.config.longitude.to_string())
            .append_pair("daily", "precipitation_probability_max,weather_code")
            .append_pair("forecast_days", "1")
            .append_pair("timezone", &self.config.timezone);
        Ok(url)
    }
}

/// The reminder line shown next to the alarm list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UmbrellaAdvice {
    pub message: String,
    pub icon: &'static str,
    pub needs_umbrella: bool,
}

/// Reminder for today's forecast. `None` means the fetch has not
/// completed (or failed) and the placeholder is shown.
pub fn umbrella_message(report: Option<&WeatherReport>, threshold: u8) -> UmbrellaAdvice {
    let Some(report) = report else {
        return UmbrellaAdvice {
            message: "天気を取得中...".into(),
            icon: "...",
            needs_umbrella: false,
        };
    };
    let p = report.precipitation_probability;
    let desc = report.description();
    if report.needs_umbrella(threshold) {
        if p >= MUST_CARRY_THRESHOLD {
            UmbrellaAdvice {
                message: format!("傘必須！ {desc} ({p}%)"),
                icon: "☔",
                needs_umbrella: true,
            }
        } else {
            UmbrellaAdvice {
                message: format!("傘があると安心 {desc} ({p}%)"),
                icon: "🌂",
                needs_umbrella: true,
            }
        }
    } else {
        UmbrellaAdvice {
            message: format!("傘は不要 {desc}"),
            icon: "☀️",
            needs_umbrella: false,
        }
    }
}

/// WMO weather interpretation codes, Japanese labels.
pub fn describe_weather_code(code: u16) -> &'static str {
    match code {
        0 => "晴れ",
        1 => "ほぼ晴れ",
        2 => "一部曇り",
        3 => "曇り",
        45 => "霧",
        48 => "霧氷",
        51 => "小雨",
        53 => "雨",
        55 => "強い雨",
        56 => "凍る霧雨",
        57 => "強い凍る霧雨",
        61 => "小雨",
        63 => "雨",
        65 => "強い雨",
        66 => "凍る雨",
        67 => "強い凍る雨",
        71 => "小雪",
        73 => "雪",
        75 => "強い雪",
        77 => "霧雪",
        80 | 81 => "にわか雨",
        82 => "激しいにわか雨",
        85 => "小雪",
        86 => "強い雪",
        95 => "雷雨",
        96 => "雹を伴う雷雨",
        99 => "強い雹を伴う雷雨",
        _ => "不明",
    }
}
