//! Observable dashboard state.
//!
//! Readers take cheap `Arc` snapshots; writers replace the snapshot whole. Each
//! request is stamped with a generation token and only the newest request may
//! commit, so a slow response can never overwrite a newer one.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::error::WeatherError;
use crate::types::{CurrentWeather, ForecastWindow, TemperatureUnit, WeatherReport};

/// Everything the view layer renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeatherSnapshot {
    pub current: Option<CurrentWeather>,
    pub forecast: ForecastWindow,
    pub unit: TemperatureUnit,
    pub loading: bool,
    pub error: Option<String>,
}

/// Identifies one in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

#[derive(Debug)]
struct Inner {
    snapshot: Arc<WeatherSnapshot>,
    generation: u64,
}

#[derive(Debug)]
pub struct WeatherStore {
    inner: RwLock<Inner>,
}

impl Default for WeatherStore {
    fn default() -> Self {
        Self::new(TemperatureUnit::default())
    }
}

impl WeatherStore {
    pub fn new(unit: TemperatureUnit) -> Self {
        Self {
            inner: RwLock::new(Inner {
                snapshot: Arc::new(WeatherSnapshot {
                    forecast: ForecastWindow::empty(unit),
                    unit,
                    ..WeatherSnapshot::default()
                }),
                generation: 0,
            }),
        }
    }

    pub fn snapshot(&self) -> Arc<WeatherSnapshot> {
        Arc::clone(&self.inner.read().snapshot)
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.inner.read().snapshot.unit
    }

    /// Mark a new request in flight. Any earlier token becomes stale.
    pub fn begin_request(&self) -> RequestToken {
        let mut inner = self.inner.write();
        inner.generation += 1;
        let next = WeatherSnapshot {
            loading: true,
            error: None,
            ..(*inner.snapshot).clone()
        };
        inner.snapshot = Arc::new(next);
        RequestToken(inner.generation)
    }

    /// Commit a finished request. Returns false when the token is stale and
    /// the result was discarded.
    ///
    /// On success the report replaces the data, converted to the store's unit
    /// if it was toggled while the request was in flight. On failure the
    /// previous data stays and the error message is set.
    pub fn complete(
        &self,
        token: RequestToken,
        result: Result<WeatherReport, WeatherError>,
    ) -> bool {
        let mut inner = self.inner.write();
        if token.0 != inner.generation {
            tracing::debug!(
                stale = token.0,
                current = inner.generation,
                "Discarding superseded weather result"
            );
            return false;
        }

        let previous = &inner.snapshot;
        let next = match result {
            Ok(report) => {
                let report = report.into_unit(previous.unit);
                WeatherSnapshot {
                    current: Some(report.current),
                    forecast: report.forecast,
                    unit: previous.unit,
                    loading: false,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!("Weather request failed: {}", e);
                WeatherSnapshot {
                    loading: false,
                    error: Some(e.user_message()),
                    ..(**previous).clone()
                }
            }
        };
        inner.snapshot = Arc::new(next);
        true
    }

    /// Switch units and convert the data already held. Returns the new unit.
    pub fn toggle_unit(&self) -> TemperatureUnit {
        let mut inner = self.inner.write();
        let previous = &inner.snapshot;
        let unit = previous.unit.toggle();
        let next = WeatherSnapshot {
            current: previous
                .current
                .as_ref()
                .map(|c| c.converted(previous.unit, unit)),
            forecast: previous.forecast.to_unit(unit),
            unit,
            loading: previous.loading,
            error: previous.error.clone(),
        };
        inner.snapshot = Arc::new(next);
        unit
    }

    pub fn clear_error(&self) {
        let mut inner = self.inner.write();
        if inner.snapshot.error.is_some() {
            let next = WeatherSnapshot {
                error: None,
                ..(*inner.snapshot).clone()
            };
            inner.snapshot = Arc::new(next);
        }
    }
}
