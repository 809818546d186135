//! Today's forecast for the school's location.
//!
//! Reads through an in-process cache over an Open-Meteo style daily
//! forecast. After a failed refresh the provider is left alone for
//! `retry_backoff_secs`, during which callers get `Unavailable` at once.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::WeatherConfig;

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Forecast provider returned status {0}")]
    Status(u16),

    #[error("Forecast response had no daily values")]
    MissingDaily,
}

/// Forecast returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WeatherReport {
    Available(DailyForecast),
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub temp_min: f64,
    pub temp_max: f64,
    /// Maximum precipitation probability in percent.
    pub rain_chance: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    daily: Option<DailyValues>,
}

#[derive(Debug, Deserialize)]
struct DailyValues {
    time: Vec<NaiveDate>,
    temperature_2m_min: Vec<Option<f64>>,
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_probability_max: Vec<Option<f64>>,
}

impl ForecastResponse {
    fn first_day(self) -> Option<DailyForecast> {
        let daily = self.daily?;
        Some(DailyForecast {
            date: *daily.time.first()?,
            temp_min: (*daily.temperature_2m_min.first()?)?,
            temp_max: (*daily.temperature_2m_max.first()?)?,
            rain_chance: daily
                .precipitation_probability_max
                .first()
                .copied()
                .flatten()
                .map(|p| p.round().clamp(0.0, 100.0) as u8),
        })
    }
}

struct CachedForecast {
    forecast: DailyForecast,
    fetched_at: Instant,
}

#[derive(Default)]
struct ForecastCache {
    latest: Option<CachedForecast>,
    failed_at: Option<Instant>,
}

#[derive(Clone)]
pub struct WeatherService {
    client: Option<Client>,
    config: WeatherConfig,
    cache: Arc<RwLock<ForecastCache>>,
}

impl WeatherService {
    /// A disabled service, or one whose HTTP client cannot be built, always
    /// reports `Unavailable`.
    pub fn new(config: WeatherConfig) -> Self {
        let client = if config.enabled {
            match Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
            {
                Ok(client) => Some(client),
                Err(e) => {
                    warn!(error = %e, "Failed to build weather HTTP client");
                    None
                }
            }
        } else {
            None
        };

        Self {
            client,
            config,
            cache: Arc::new(RwLock::new(ForecastCache::default())),
        }
    }

    fn ttl(&self) -> Duration {
        Duration::from_secs(self.config.cache_ttl_secs)
    }

    fn backoff(&self) -> Duration {
        Duration::from_secs(self.config.retry_backoff_secs)
    }

    pub async fn today(&self) -> WeatherReport {
        let Some(client) = &self.client else {
            return WeatherReport::Unavailable;
        };

        if let Some(report) = self.cached().await {
            return report;
        }

        let mut cache = self.cache.write().await;
        // Another request may have refreshed or failed while we waited.
        if let Some(report) = self.lookup(&cache) {
            return report;
        }

        match self.fetch(client).await {
            Ok(forecast) => {
                debug!(date = %forecast.date, "Weather forecast refreshed");
                cache.latest = Some(CachedForecast {
                    forecast: forecast.clone(),
                    fetched_at: Instant::now(),
                });
                cache.failed_at = None;
                WeatherReport::Available(forecast)
            }
            Err(e) => {
                warn!(error = %e, "Weather forecast unavailable");
                cache.failed_at = Some(Instant::now());
                WeatherReport::Unavailable
            }
        }
    }

    async fn cached(&self) -> Option<WeatherReport> {
        let cache = self.cache.read().await;
        self.lookup(&cache)
    }

    /// A fresh forecast, or `Unavailable` while backing off after a failure.
    fn lookup(&self, cache: &ForecastCache) -> Option<WeatherReport> {
        if let Some(cached) = &cache.latest {
            if cached.fetched_at.elapsed() < self.ttl() {
                return Some(WeatherReport::Available(cached.forecast.clone()));
            }
        }
        match cache.failed_at {
            Some(failed_at) if failed_at.elapsed() < self.backoff() => {
                Some(WeatherReport::Unavailable)
            }
            _ => None,
        }
    }

    async fn fetch(&self, client: &Client) -> Result<DailyForecast, WeatherError> {
        let response = client
            .get(&self.config.endpoint)
            .query(&[
                ("latitude", self.config.latitude.to_string()),
                ("longitude", self.config.longitude.to_string()),
                (
                    "daily",
                    "temperature_2m_max,temperature_2m_min,precipitation_probability_max"
                        .to_string(),
                ),
                ("timezone", self.config.timezone.clone()),
                ("forecast_days", "1".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status(status.as_u16()));
        }

        response
            .json::<ForecastResponse>()
            .await?
            .first_day()
            .ok_or(WeatherError::MissingDaily)
    }

    #[cfg(test)]
    async fn seed(&self, forecast: DailyForecast, age: Duration) {
        let fetched_at = Instant::now()
            .checked_sub(age)
            .unwrap_or_else(Instant::now);
        self.cache.write().await.latest = Some(CachedForecast {
            forecast,
            fetched_at,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DailyForecast {
        DailyForecast {
            date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            temp_min: 23.1,
            temp_max: 30.4,
            rain_chance: Some(65),
        }
    }

    fn config(endpoint: &str) -> WeatherConfig {
        WeatherConfig {
            endpoint: endpoint.to_string(),
            timeout_secs: 1,
            ..WeatherConfig::default()
        }
    }

    #[test]
    fn test_parse_first_day() {
        let body = r#"{
            "daily": {
                "time": ["2026-03-14", "2026-03-15"],
                "temperature_2m_min": [23.1, 22.0],
                "temperature_2m_max": [30.4, 29.0],
                "precipitation_probability_max": [64.6, 10]
            }
        }"#;
        let response: ForecastResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.first_day(), Some(sample()));
    }

    #[test]
    fn test_parse_missing_values() {
        let body = r#"{"daily": {"time": ["2026-03-14"], "temperature_2m_min": [null], "temperature_2m_max": [30.0]}}"#;
        let response: ForecastResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.first_day(), None);

        let response: ForecastResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.first_day(), None);
    }

    #[test]
    fn test_report_serialization() {
        let json = serde_json::to_value(WeatherReport::Available(sample())).unwrap();
        assert_eq!(json["status"], "available");
        assert_eq!(json["rain_chance"], 65);

        let json = serde_json::to_value(WeatherReport::Unavailable).unwrap();
        assert_eq!(json["status"], "unavailable");
    }

    #[tokio::test]
    async fn test_disabled_service_is_unavailable() {
        let service = WeatherService::new(WeatherConfig {
            enabled: false,
            ..WeatherConfig::default()
        });
        assert_eq!(service.today().await, WeatherReport::Unavailable);
    }

    #[tokio::test]
    async fn test_fresh_cache_is_served_without_fetching() {
        // Unroutable endpoint: any fetch attempt would fail.
        let service = WeatherService::new(config("http://127.0.0.1:9/forecast"));
        service.seed(sample(), Duration::from_secs(1)).await;
        assert_eq!(service.today().await, WeatherReport::Available(sample()));
    }

    #[tokio::test]
    async fn test_stale_cache_with_failed_refresh_is_unavailable() {
        let service = WeatherService::new(config("http://127.0.0.1:9/forecast"));
        service.seed(sample(), Duration::from_secs(3600)).await;
        assert_eq!(service.today().await, WeatherReport::Unavailable);
    }

    /// Accepts connections and never answers them.
    async fn silent_endpoint() -> (String, tokio::task::JoinHandle<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        (format!("http://{}/forecast", addr), handle)
    }

    #[tokio::test]
    async fn test_outage_does_not_serialize_callers() {
        let (endpoint, server) = silent_endpoint().await;
        let service = WeatherService::new(config(&endpoint));

        let started = Instant::now();
        let callers: Vec<_> = (0..4)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.today().await })
            })
            .collect();
        for caller in callers {
            assert_eq!(caller.await.unwrap(), WeatherReport::Unavailable);
        }

        // One provider timeout, not one per caller.
        assert!(started.elapsed() < Duration::from_millis(2500));
        server.abort();
    }

    #[tokio::test]
    async fn test_backoff_skips_fetch_after_failure() {
        let (endpoint, server) = silent_endpoint().await;
        let service = WeatherService::new(config(&endpoint));
        assert_eq!(service.today().await, WeatherReport::Unavailable);

        let started = Instant::now();
        assert_eq!(service.today().await, WeatherReport::Unavailable);
        assert!(started.elapsed() < Duration::from_millis(500));
        server.abort();
    }
}
