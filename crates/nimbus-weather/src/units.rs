//! Temperature and presentation unit conversions.
//!
//! Provider temperatures arrive in Kelvin. Rounding happens exactly once, when a
//! value is turned into a display integer.

use crate::types::TemperatureUnit;

pub const KELVIN_OFFSET: f64 = 273.15;

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Round to the nearest integer, halves toward positive infinity.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Kelvin to `unit`, unrounded.
pub fn kelvin_to(kelvin: f64, unit: TemperatureUnit) -> f64 {
    let celsius = kelvin - KELVIN_OFFSET;
    match unit {
        TemperatureUnit::Celsius => celsius,
        TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
    }
}

/// Kelvin to a rounded display value in `unit`.
///
/// Fahrenheit is composed from Kelvin directly, never from a rounded Celsius value.
pub fn convert(kelvin: f64, unit: TemperatureUnit) -> i32 {
    round_half_up(kelvin_to(kelvin, unit)) as i32
}

/// Re-express an already rounded display value in another unit.
///
/// Used when toggling units on aggregated data. A Celsius → Fahrenheit →
/// Celsius round trip may drift by one degree.
pub fn convert_display(value: i32, from: TemperatureUnit, to: TemperatureUnit) -> i32 {
    let value = f64::from(value);
    let converted = match (from, to) {
        (TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit) => value * 1.8 + 32.0,
        (TemperatureUnit::Fahrenheit, TemperatureUnit::Celsius) => (value - 32.0) / 1.8,
        _ => value,
    };
    round_half_up(converted) as i32
}

pub fn mps_to_kmh(mps: f64) -> i32 {
    round_half_up(mps * 3.6) as i32
}

pub fn mps_to_mph(mps: f64) -> i32 {
    round_half_up(mps * 2.237) as i32
}

/// Wind speed for display: km/h alongside Celsius, mph alongside Fahrenheit.
pub fn wind_speed_display(mps: f64, unit: TemperatureUnit) -> String {
    match unit {
        TemperatureUnit::Celsius => format!("{} km/h", mps_to_kmh(mps)),
        TemperatureUnit::Fahrenheit => format!("{} mph", mps_to_mph(mps)),
    }
}

pub fn meters_to_km(meters: f64) -> i32 {
    round_half_up(meters / 1000.0) as i32
}

/// Wind direction in degrees to a 16-point compass label.
pub fn degrees_to_compass(degrees: f64) -> &'static str {
    let index = (round_half_up(degrees.rem_euclid(360.0) / 22.5) as usize) % COMPASS_POINTS.len();
    COMPASS_POINTS[index]
}

/// Probability in [0, 1] as a whole percentage.
pub fn probability_percent(probability: f64) -> u8 {
    round_half_up(probability.clamp(0.0, 1.0) * 100.0) as u8
}
