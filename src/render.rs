//! Plain-text rendering of a dashboard snapshot.

use std::fmt::{self, Write};

use chrono::{DateTime, FixedOffset, Utc};
use nimbus_weather::units::{
    degrees_to_compass, meters_to_km, probability_percent, wind_speed_display,
};
use nimbus_weather::{CurrentWeather, ForecastWindow, TemperatureUnit, WeatherSnapshot};

pub fn render_snapshot(snapshot: &WeatherSnapshot) -> Result<String, fmt::Error> {
    let mut out = String::new();
    if let Some(current) = &snapshot.current {
        out.push_str(&render_current(current, snapshot.unit)?);
        out.push('\n');
    }
    out.push_str(&render_forecast(&snapshot.forecast)?);
    Ok(out)
}

pub fn render_current(
    current: &CurrentWeather,
    unit: TemperatureUnit,
) -> Result<String, fmt::Error> {
    let symbol = unit.symbol();
    let offset = current.utc_offset();
    let mut out = String::new();

    writeln!(out, "{}, {}", current.city_name, current.country)?;
    writeln!(
        out,
        "  {} {}{}  {}",
        current.condition.glyph(),
        current.temperature,
        symbol,
        current.description
    )?;
    writeln!(
        out,
        "  Feels like {}{}   Low {}{}  High {}{}",
        current.feels_like, symbol, current.temp_min, symbol, current.temp_max, symbol
    )?;
    writeln!(
        out,
        "  Humidity {}%   Wind {} {}   Pressure {} hPa",
        current.humidity,
        wind_speed_display(current.wind_speed, unit),
        degrees_to_compass(current.wind_direction),
        current.pressure.round()
    )?;
    if let Some(visibility) = current.visibility {
        writeln!(
            out,
            "  Visibility {} km   Clouds {}%",
            meters_to_km(visibility),
            current.cloudiness
        )?;
    }
    if let (Some(sunrise), Some(sunset)) = (current.sunrise, current.sunset) {
        writeln!(
            out,
            "  Sunrise {}   Sunset {}",
            local_time(sunrise, offset),
            local_time(sunset, offset)
        )?;
    }
    Ok(out)
}

pub fn render_forecast(window: &ForecastWindow) -> Result<String, fmt::Error> {
    if window.is_empty() {
        return Ok("No forecast available\n".to_string());
    }

    let symbol = window.unit().symbol();
    let mut out = String::new();
    writeln!(
        out,
        "{:<10} {:>6} {:>6} {:>6}  {:<14} {:>4} {:>5}",
        "Day", "Low", "Avg", "High", "Conditions", "Hum", "Rain"
    )?;
    for day in window {
        writeln!(
            out,
            "{:<10} {:>6} {:>6} {:>6}  {:<14} {:>3}% {:>4}%",
            day.day_label,
            format!("{}{}", day.temp_min, symbol),
            format!("{}{}", day.temp_avg, symbol),
            format!("{}{}", day.temp_max, symbol),
            format!("{} {}", day.condition.glyph(), day.condition),
            day.humidity_avg,
            probability_percent(day.precipitation_probability_max)
        )?;
    }
    Ok(out)
}

fn local_time(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset).format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use chrono::TimeZone;
    use nimbus_weather::{aggregate, RawSample, WeatherCondition};

    fn sample(day: u32, hour: u32, kelvin: f64) -> RawSample {
        RawSample {
            timestamp: Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap(),
            temperature: kelvin,
            condition: WeatherCondition::Clouds,
            description: "broken clouds".into(),
            icon_ref: "04d".into(),
            humidity_percent: 70.0,
            wind_speed: 4.0,
            precipitation_probability: 0.35,
        }
    }

    fn current() -> CurrentWeather {
        CurrentWeather {
            temperature: 12,
            feels_like: 10,
            temp_min: 9,
            temp_max: 14,
            humidity: 81,
            pressure: 1012.0,
            wind_speed: 5.0,
            wind_direction: 225.0,
            visibility: Some(8_000.0),
            cloudiness: 75,
            condition: WeatherCondition::Rain,
            description: "light rain".into(),
            icon_ref: "10d".into(),
            city_name: "Paris".into(),
            country: "FR".into(),
            sunrise: Some(Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap()),
            sunset: Some(Utc.with_ymd_and_hms(2024, 3, 1, 17, 30, 0).unwrap()),
            observed_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            utc_offset_seconds: 3600,
        }
    }

    #[test]
    fn test_current_block() {
        let text = render_current(&current(), TemperatureUnit::Celsius).unwrap();
        assert!(text.starts_with("Paris, FR"));
        assert!(text.contains("12°C"));
        assert!(text.contains("light rain"));
        assert!(text.contains("18 km/h SW"));
        assert!(text.contains("Visibility 8 km"));
        assert!(text.contains("Sunrise 07:00"));
        assert!(text.contains("Sunset 18:30"));
    }

    #[test]
    fn test_forecast_table() {
        let samples = vec![
            sample(1, 0, 290.0),
            sample(1, 3, 295.0),
            sample(1, 6, 280.0),
            sample(1, 9, 285.0),
            sample(2, 12, 283.15),
        ];
        let window = aggregate(&samples, TemperatureUnit::Celsius);
        let text = render_forecast(&window).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("Friday"));
        assert!(lines[1].contains("7°C"));
        assert!(lines[1].contains("14°C"));
        assert!(lines[1].contains("22°C"));
        assert!(lines[1].contains("35%"));
        assert!(lines[2].starts_with("Saturday"));
    }

    #[test]
    fn test_empty_forecast() {
        let window = ForecastWindow::empty(TemperatureUnit::Fahrenheit);
        assert_eq!(render_forecast(&window).unwrap(), "No forecast available\n");
    }

    #[test]
    fn test_snapshot_without_current() {
        let snapshot = WeatherSnapshot::default();
        assert_eq!(render_snapshot(&snapshot).unwrap(), "No forecast available\n");
    }

    #[test]
    fn test_snapshot_puts_current_before_forecast() {
        let snapshot = WeatherSnapshot {
            current: Some(current()),
            ..WeatherSnapshot::default()
        };
        let text = render_snapshot(&snapshot).unwrap();
        assert!(text.starts_with("Paris, FR\n"));
        assert!(text.ends_with("\nNo forecast available\n"));
    }
}
