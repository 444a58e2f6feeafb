//! Time-bucketed aggregation and trend-delta engine behind the charts.
//!
//! Pure and synchronous: every function here reads its arguments,
//! allocates fresh output and touches nothing else.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Utc};
use healthlog_core::{
    AggregatedPoint, ChartSeries, DeltaPoint, Granularity, HealthData, HealthError, MetricKey,
    MetricRecord, SugarReading, SugarType,
};
use serde::{Deserialize, Serialize};

/// Parse the storage layer's JSON payload into typed readings.
pub fn parse_health_data(json: &str) -> Result<HealthData, HealthError> {
    serde_json::from_str(json).map_err(|err| HealthError::Parse(err.to_string()))
}

/// Calendar-period key for a timestamp, or `None` at raw granularity.
///
/// Weekly keys follow ISO 8601: weeks start on Monday and week 1 contains
/// the year's first Thursday, so the week-year label can differ from the
/// calendar year around New Year.
pub fn bucket_key(timestamp: DateTime<Utc>, granularity: Granularity) -> Option<String> {
    match granularity {
        Granularity::Raw => None,
        Granularity::Weekly => {
            let week = timestamp.iso_week();
            Some(format!("{}-W{:02}", week.year(), week.week()))
        }
        Granularity::Monthly => Some(format!("{}-{}", timestamp.year(), timestamp.month())),
        Granularity::Yearly => Some(timestamp.year().to_string()),
    }
}

/// Group readings into calendar buckets and average the requested metrics.
///
/// `Granularity::Raw` returns the input unchanged. Otherwise every reading
/// lands in exactly one bucket; a metric is averaged over the members that
/// carry a finite value for it and stays absent when none do. Averages
/// round half-up to one decimal and points come out ascending by bucket
/// timestamp, whatever order the readings arrived in.
pub fn aggregate<T>(
    readings: &[T],
    granularity: Granularity,
    metrics: &[MetricKey],
) -> ChartSeries<T>
where
    T: MetricRecord + Clone,
{
    if granularity == Granularity::Raw {
        return ChartSeries::Raw(readings.to_vec());
    }

    let points = group_by_period(readings, granularity)
        .into_iter()
        .map(|bucket| {
            let mut values = BTreeMap::new();
            for metric in metrics.iter().copied() {
                if let Some(mean) = present_mean(&bucket.members, metric) {
                    values.insert(metric, round1(mean));
                }
            }
            AggregatedPoint {
                timestamp: bucket.timestamp,
                values,
                is_averaged: true,
            }
        })
        .collect();

    ChartSeries::Averaged(points)
}

/// Week-over-week change of one weight metric.
///
/// Weeks without a present value produce no entry, so each change is
/// measured against the nearest earlier week that has data. Means are
/// taken over the raw values; only the change is rounded, half-up to two
/// decimals. Fewer than two populated weeks yield an empty series.
pub fn weekly_delta<T: MetricRecord>(readings: &[T], metric: MetricKey) -> Vec<DeltaPoint> {
    let means: Vec<(DateTime<Utc>, f64)> = group_by_period(readings, Granularity::Weekly)
        .into_iter()
        .filter_map(|bucket| {
            present_mean(&bucket.members, metric).map(|mean| (bucket.timestamp, mean))
        })
        .collect();

    means
        .windows(2)
        .map(|pair| DeltaPoint {
            timestamp: pair[1].0,
            change: round2(pair[1].1 - pair[0].1),
        })
        .collect()
}

/// Keep only sugar readings of the selected type; `None` keeps everything.
pub fn filter_by_kind(readings: &[SugarReading], filter: Option<SugarType>) -> Vec<SugarReading> {
    match filter {
        None => readings.to_vec(),
        Some(kind) => readings
            .iter()
            .filter(|reading| reading.kind == kind)
            .cloned()
            .collect(),
    }
}

/// One cuff measurement inside a bulk blood-pressure entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PressureEntry {
    pub systolic: f64,
    pub diastolic: f64,
    #[serde(default)]
    pub pulse: Option<f64>,
}

/// Collapse back-to-back cuff measurements into a single entry.
///
/// Bulk entries round with ceiling, not the half-up rounding the chart
/// averages use. Pulse is averaged over the measurements that carry one.
/// Empty input yields `None`.
pub fn average_bulk_entry(entries: &[PressureEntry]) -> Option<PressureEntry> {
    if entries.is_empty() {
        return None;
    }

    let count = entries.len() as f64;
    let systolic = (entries.iter().map(|entry| entry.systolic).sum::<f64>() / count).ceil();
    let diastolic = (entries.iter().map(|entry| entry.diastolic).sum::<f64>() / count).ceil();

    let pulses: Vec<f64> = entries
        .iter()
        .filter_map(|entry| entry.pulse)
        .filter(|value| value.is_finite())
        .collect();
    let pulse = if pulses.is_empty() {
        None
    } else {
        Some((pulses.iter().sum::<f64>() / pulses.len() as f64).ceil())
    };

    Some(PressureEntry {
        systolic,
        diastolic,
        pulse,
    })
}

struct PeriodBucket<'a, T> {
    timestamp: DateTime<Utc>,
    members: Vec<&'a T>,
}

/// Partition readings by bucket key, ascending by representative
/// timestamp. The representative is the first reading seen for the
/// period; it always lies inside the period, so ordering representatives
/// orders the periods themselves.
fn group_by_period<'a, T: MetricRecord>(
    readings: &'a [T],
    granularity: Granularity,
) -> Vec<PeriodBucket<'a, T>> {
    let mut buckets: HashMap<String, PeriodBucket<'a, T>> = HashMap::new();

    for reading in readings {
        let timestamp = reading.recorded_at();
        let Some(key) = bucket_key(timestamp, granularity) else {
            continue;
        };
        buckets
            .entry(key)
            .or_insert_with(|| PeriodBucket {
                timestamp,
                members: Vec::new(),
            })
            .members
            .push(reading);
    }

    let mut buckets: Vec<_> = buckets.into_values().collect();
    buckets.sort_by_key(|bucket| bucket.timestamp);
    buckets
}

/// Mean over the members whose value for the metric is present and
/// finite; `None` when no member qualifies.
fn present_mean<T: MetricRecord>(members: &[&T], metric: MetricKey) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;

    for member in members {
        if let Some(value) = member.metric(metric).filter(|value| value.is_finite()) {
            sum += value;
            count += 1;
        }
    }

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

// Half-up: halves go toward +∞, including for negative changes.
fn round1(value: f64) -> f64 {
    (value * 10.0 + 0.5).floor() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0 + 0.5).floor() / 100.0
}
