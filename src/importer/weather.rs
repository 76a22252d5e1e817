// ==========================================
// EEU Ingest - weather lookup collaborator
// ==========================================
// weather_string -> city / state / zip / climate zone / eGRID
// The geocoding service itself lives outside this crate.
// ==========================================

use crate::domain::{ReportType, WeatherInfo};
use async_trait::async_trait;

#[async_trait]
pub trait WeatherLookup: Send + Sync {
    /// Resolves a weather string (station name or zip code) to location info.
    ///
    /// # Returns
    /// - Ok(WeatherInfo): resolved fields, any of which may be empty
    /// - Err(String): lookup failure; the pipeline records it as a warning
    async fn weather_check(&self, weather_string: &str, report_type: ReportType) -> Result<WeatherInfo, String>;
}

/// Lookup that resolves nothing beyond a bare five-digit zip code.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopWeatherLookup;

#[async_trait]
impl WeatherLookup for NoopWeatherLookup {
    async fn weather_check(&self, weather_string: &str, _report_type: ReportType) -> Result<WeatherInfo, String> {
        let trimmed = weather_string.trim();
        let zip_code = (trimmed.len() == 5 && trimmed.chars().all(|c| c.is_ascii_digit())).then(|| trimmed.to_string());
        Ok(WeatherInfo {
            zip_code,
            ..WeatherInfo::default()
        })
    }
}
