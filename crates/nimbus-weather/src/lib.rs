//! Weather dashboard core for nimbus
//!
//! Fetches current conditions and the 3-hour forecast from OpenWeatherMap,
//! reduces the forecast to daily summaries, and holds the result in a
//! snapshot-based store driven by a small set of dashboard entry points.

pub mod aggregate;
pub mod dashboard;
pub mod error;
pub mod geocode;
pub mod location;
pub mod provider;
pub mod service;
pub mod state;
pub mod types;
pub mod units;

pub use aggregate::{aggregate, AggregationOutcome, DailyAggregator, TodayCutoff};
pub use dashboard::Dashboard;
pub use error::{LocationError, WeatherError};
pub use geocode::{resolve_city, search_cities};
pub use location::Geolocator;
pub use provider::{ForecastSamples, OpenWeatherClient};
pub use service::WeatherService;
pub use state::{RequestToken, WeatherSnapshot, WeatherStore};
pub use types::*;
