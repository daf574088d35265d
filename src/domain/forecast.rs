//! Weather forecast as decoded from the forecast service.

use serde::{Deserialize, Serialize};

/// Number of daily blocks shown on the dashboard.
pub const FORECAST_DAYS: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    #[serde(default)]
    pub currently: CurrentConditions,
    #[serde(default)]
    pub daily: DailyForecast,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentConditions {
    pub time: Option<i64>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub visibility: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    #[serde(default)]
    pub data: Vec<DailyConditions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyConditions {
    pub time: Option<i64>,
    pub temperature_low: Option<f64>,
    pub temperature_high: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub visibility: Option<f64>,
}

impl Forecast {
    /// The first [`FORECAST_DAYS`] days, in service order.
    pub fn upcoming_days(&self) -> &[DailyConditions] {
        let len = self.daily.data.len().min(FORECAST_DAYS);
        &self.daily.data[..len]
    }

    /// Drop everything past [`FORECAST_DAYS`].
    pub fn truncate_days(&mut self) {
        self.daily.data.truncate(FORECAST_DAYS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_service_payload() {
        let payload = r#"{
            "latitude": 39.7684,
            "currently": {"time": 1453402675, "temperature": 48.71, "humidity": 0.96,
                          "windSpeed": 4.2, "visibility": 9.5, "summary": "Drizzle"},
            "daily": {"summary": "Rain", "data": [
                {"time": 1453356000, "temperatureMin": 30.0, "temperatureLow": 31.5,
                 "temperatureHigh": 44.1, "humidity": 0.8, "windSpeed": 3.0},
                {"time": 1453442400},
                {"time": 1453528800},
                {"time": 1453615200}
            ]}
        }"#;

        let forecast: Forecast = serde_json::from_str(payload).expect("decoded");
        assert_eq!(forecast.currently.temperature, Some(48.71));
        assert_eq!(forecast.currently.wind_speed, Some(4.2));
        assert_eq!(forecast.daily.data.len(), 4);
        assert_eq!(forecast.upcoming_days().len(), FORECAST_DAYS);
        assert_eq!(forecast.upcoming_days()[0].temperature_low, Some(31.5));
        assert_eq!(forecast.upcoming_days()[0].visibility, None);
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let forecast: Forecast = serde_json::from_str("{}").expect("decoded");
        assert!(forecast.upcoming_days().is_empty());
        assert_eq!(forecast.currently, CurrentConditions::default());
    }
}
