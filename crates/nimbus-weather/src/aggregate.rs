//! Daily forecast aggregation.
//!
//! Reduces sub-daily forecast samples (three-hour steps from the provider) to
//! one [`DailySummary`] per calendar day.
//!
//! Days are keyed by the sample's date in the location's fixed UTC offset, or
//! in UTC when no offset is known. Every sample of one aggregation run uses the
//! same offset, and the weekday label is derived from the same date.
//!
//! Within a day the samples are put into a canonical order (timestamp first,
//! then every other field) before any reduction runs, so the output does not
//! depend on the order the provider delivered them in.
//!
//! Condition selection:
//! - the condition with the most samples wins
//! - ties go to the condition whose latest sample is latest
//! - if still tied, the condition declared later in [`WeatherCondition`] wins
//!
//! The description and icon come from the earliest sample carrying the winning
//! condition.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Timelike, Utc};

use crate::types::{DailySummary, ForecastWindow, RawSample, TemperatureUnit, WeatherCondition};
use crate::units::{convert, round_half_up};
pub use nimbus_core::MAX_FORECAST_DAYS;

/// Drop today's day group once the location-local clock reaches `hour`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TodayCutoff {
    pub hour: u32,
}

/// Result of one aggregation run.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationOutcome {
    pub window: ForecastWindow,
    /// Samples rejected for non-finite fields
    pub skipped: usize,
    /// Days removed by the today cutoff or the minimum sample count
    pub excluded_days: Vec<NaiveDate>,
}

/// Configurable daily aggregator. All options default to off.
#[derive(Debug, Clone)]
pub struct DailyAggregator {
    unit: TemperatureUnit,
    utc_offset: FixedOffset,
    max_days: usize,
    today_cutoff: Option<(TodayCutoff, DateTime<Utc>)>,
    min_samples_per_day: Option<usize>,
}

/// Aggregate with UTC day boundaries and no optional filters.
pub fn aggregate(samples: &[RawSample], unit: TemperatureUnit) -> ForecastWindow {
    DailyAggregator::new(unit).aggregate(samples).window
}

impl DailyAggregator {
    pub fn new(unit: TemperatureUnit) -> Self {
        Self {
            unit,
            utc_offset: Utc.fix(),
            max_days: MAX_FORECAST_DAYS,
            today_cutoff: None,
            min_samples_per_day: None,
        }
    }

    /// Group by calendar date at this offset instead of UTC.
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    /// Keep at most `max_days` days, never more than [`MAX_FORECAST_DAYS`].
    pub fn with_max_days(mut self, max_days: usize) -> Self {
        self.max_days = max_days.min(MAX_FORECAST_DAYS);
        self
    }

    /// Exclude today when `now` (shifted to the location offset) is at or past the cutoff hour.
    pub fn with_today_cutoff(mut self, cutoff: TodayCutoff, now: DateTime<Utc>) -> Self {
        self.today_cutoff = Some((cutoff, now));
        self
    }

    /// Exclude days with fewer than `min` valid samples.
    pub fn with_min_samples_per_day(mut self, min: usize) -> Self {
        self.min_samples_per_day = Some(min);
        self
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }

    /// Calendar day a timestamp belongs to.
    pub fn day_key(&self, timestamp: DateTime<Utc>) -> NaiveDate {
        timestamp.with_timezone(&self.utc_offset).date_naive()
    }

    pub fn aggregate(&self, samples: &[RawSample]) -> AggregationOutcome {
        let mut skipped = 0;
        let mut groups: BTreeMap<NaiveDate, Vec<&RawSample>> = BTreeMap::new();

        for sample in samples {
            if !sample.is_valid() {
                skipped += 1;
                continue;
            }
            groups
                .entry(self.day_key(sample.timestamp))
                .or_default()
                .push(sample);
        }

        if skipped > 0 {
            tracing::warn!(
                skipped,
                total = samples.len(),
                "Skipped forecast samples with non-finite fields"
            );
        }

        let excluded_today = self.excluded_today();
        let mut excluded_days = Vec::new();
        let mut days = Vec::with_capacity(groups.len().min(self.max_days));

        for (date, mut group) in groups {
            if Some(date) == excluded_today {
                tracing::debug!(%date, "Excluding today after cutoff");
                excluded_days.push(date);
                continue;
            }
            if let Some(min) = self.min_samples_per_day {
                if group.len() < min {
                    tracing::debug!(%date, samples = group.len(), min, "Excluding sparse day");
                    excluded_days.push(date);
                    continue;
                }
            }
            if days.len() == self.max_days {
                break;
            }

            group.sort_by(|a, b| canonical_order(a, b));
            if let Some(summary) = self.summarize(date, &group) {
                days.push(summary);
            }
        }

        AggregationOutcome {
            window: ForecastWindow::new(self.unit, days),
            skipped,
            excluded_days,
        }
    }

    fn excluded_today(&self) -> Option<NaiveDate> {
        let (cutoff, now) = self.today_cutoff?;
        let local = now.with_timezone(&self.utc_offset);
        (local.hour() >= cutoff.hour).then(|| local.date_naive())
    }

    /// Reduce one non-empty, canonically ordered group.
    fn summarize(&self, date: NaiveDate, group: &[&RawSample]) -> Option<DailySummary> {
        let representative = representative_sample(group)?;
        let count = group.len() as f64;

        let mut temp_min = f64::INFINITY;
        let mut temp_max = f64::NEG_INFINITY;
        let mut temp_sum = 0.0;
        let mut humidity_sum = 0.0;
        let mut wind_sum = 0.0;
        let mut pop_max = f64::NEG_INFINITY;

        for sample in group {
            temp_min = temp_min.min(sample.temperature);
            temp_max = temp_max.max(sample.temperature);
            temp_sum += sample.temperature;
            humidity_sum += sample.humidity_percent;
            wind_sum += sample.wind_speed;
            pop_max = pop_max.max(sample.precipitation_probability);
        }

        // Summation error must not push the mean outside the observed range
        let temp_avg = (temp_sum / count).clamp(temp_min, temp_max);

        Some(DailySummary {
            calendar_date: date,
            day_label: date.format("%A").to_string(),
            temp_min: convert(temp_min, self.unit),
            temp_max: convert(temp_max, self.unit),
            temp_avg: convert(temp_avg, self.unit),
            condition: representative.condition,
            description: representative.description.clone(),
            icon_ref: representative.icon_ref.clone(),
            humidity_avg: round_half_up(humidity_sum / count).clamp(0.0, 100.0) as u8,
            wind_speed_avg: wind_sum / count,
            precipitation_probability_max: pop_max.clamp(0.0, 1.0),
        })
    }
}

#[derive(Debug)]
struct Tally<'a> {
    count: usize,
    latest: DateTime<Utc>,
    first: &'a RawSample,
}

/// Earliest sample of the dominant condition in a canonically ordered group.
fn representative_sample<'a>(group: &[&'a RawSample]) -> Option<&'a RawSample> {
    let mut tallies: BTreeMap<WeatherCondition, Tally<'a>> = BTreeMap::new();

    for &sample in group {
        tallies
            .entry(sample.condition)
            .and_modify(|tally| {
                tally.count += 1;
                tally.latest = tally.latest.max(sample.timestamp);
            })
            .or_insert(Tally {
                count: 1,
                latest: sample.timestamp,
                first: sample,
            });
    }

    tallies
        .iter()
        .max_by(|(cond_a, a), (cond_b, b)| {
            a.count
                .cmp(&b.count)
                .then(a.latest.cmp(&b.latest))
                .then(cond_a.cmp(cond_b))
        })
        .map(|(_, tally)| tally.first)
}

/// Total order over samples: timestamp, then every remaining field.
fn canonical_order(a: &RawSample, b: &RawSample) -> Ordering {
    a.timestamp
        .cmp(&b.timestamp)
        .then(a.condition.cmp(&b.condition))
        .then_with(|| a.description.cmp(&b.description))
        .then_with(|| a.icon_ref.cmp(&b.icon_ref))
        .then_with(|| a.temperature.total_cmp(&b.temperature))
        .then_with(|| a.humidity_percent.total_cmp(&b.humidity_percent))
        .then_with(|| a.wind_speed.total_cmp(&b.wind_speed))
        .then_with(|| {
            a.precipitation_probability
                .total_cmp(&b.precipitation_probability)
        })
}
