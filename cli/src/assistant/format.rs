//! # Weather Reply Formatting
//!
//! File: cli/src/assistant/format.rs

use crate::common::weather::WeatherReading;

/// Renders a reading as the fixed reply sentence. Numbers keep the
/// provider's own representation.
pub fn format_reading(reading: &WeatherReading) -> String {
    format!(
        "The current weather in {} is {}. Temperature: {}°C, Humidity: {}%, Wind Speed: {} m/s.",
        reading.city,
        reading.description,
        reading.temperature_c,
        reading.humidity_percent,
        reading.wind_speed_ms
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_reading() {
        let reading = WeatherReading {
            city: "London".into(),
            description: "light rain".into(),
            temperature_c: 12.5,
            humidity_percent: 81.0,
            wind_speed_ms: 4.12,
        };
        assert_eq!(
            format_reading(&reading),
            "The current weather in London is light rain. Temperature: 12.5°C, Humidity: 81%, Wind Speed: 4.12 m/s."
        );
    }

    #[test]
    fn test_format_negative_and_whole_numbers() {
        let reading = WeatherReading {
            city: "Oslo".into(),
            description: "snow".into(),
            temperature_c: -3.0,
            humidity_percent: 90.0,
            wind_speed_ms: 0.0,
        };
        let text = format_reading(&reading);
        assert!(text.contains("Temperature: -3°C"));
        assert!(text.contains("Wind Speed: 0 m/s."));
    }
}
