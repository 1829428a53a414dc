//! Dashboard entry points: the only operations that mutate weather state.

use std::sync::Arc;

use crate::service::WeatherService;
use crate::state::{WeatherSnapshot, WeatherStore};
use crate::types::TemperatureUnit;

/// Cloneable handle; clones share one store.
#[derive(Debug, Clone)]
pub struct Dashboard {
    store: Arc<WeatherStore>,
    service: Arc<WeatherService>,
}

impl Dashboard {
    pub fn new(service: WeatherService, unit: TemperatureUnit) -> Self {
        Self {
            store: Arc::new(WeatherStore::new(unit)),
            service: Arc::new(service),
        }
    }

    pub fn snapshot(&self) -> Arc<WeatherSnapshot> {
        self.store.snapshot()
    }

    /// Fetch the report for `city`. Blank input is ignored.
    ///
    /// Returns false when nothing was committed: blank input, or a newer
    /// request superseded this one.
    pub async fn submit_query(&self, city: &str) -> bool {
        let city = city.trim();
        if city.is_empty() {
            return false;
        }

        let token = self.store.begin_request();
        let result = self.service.report_for_city(city, self.store.unit()).await;
        self.store.complete(token, result)
    }

    /// Fetch the report for the device position.
    pub async fn submit_location_query(&self) -> bool {
        let token = self.store.begin_request();
        let result = self
            .service
            .report_for_current_location(self.store.unit())
            .await;
        self.store.complete(token, result)
    }

    pub fn toggle_unit(&self) -> TemperatureUnit {
        self.store.toggle_unit()
    }

    pub fn clear_error(&self) {
        self.store.clear_error();
    }
}
