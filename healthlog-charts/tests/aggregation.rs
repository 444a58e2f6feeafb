use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use healthlog_charts::{
    aggregate, average_bulk_entry, bucket_key, filter_by_kind, parse_health_data, PressureEntry,
};
use healthlog_core::{
    AggregatedPoint, ChartSeries, Granularity, HealthError, MetricKey, PressureReading,
    SugarReading, SugarType,
};

fn ts(value: &str) -> DateTime<Utc> {
    value.parse().expect("timestamp hợp lệ")
}

fn pressure(
    id: &str,
    when: &str,
    systolic: f64,
    diastolic: f64,
    pulse: Option<f64>,
) -> PressureReading {
    PressureReading {
        id: id.to_string(),
        systolic,
        diastolic,
        pulse,
        timestamp: ts(when),
    }
}

fn sugar(id: &str, when: &str, value: f64, kind: SugarType) -> SugarReading {
    SugarReading {
        id: id.to_string(),
        value,
        kind,
        timestamp: ts(when),
    }
}

fn averaged_points<T>(series: ChartSeries<T>) -> Vec<AggregatedPoint> {
    match series {
        ChartSeries::Averaged(points) => points,
        ChartSeries::Raw(_) => panic!("chuỗi chưa được gộp"),
    }
}

#[test]
fn raw_granularity_returns_readings_unchanged() {
    let readings = vec![
        sugar("s1", "2024-03-05T07:30:00Z", 95.0, SugarType::Fasting),
        sugar("s2", "2024-03-04T19:00:00Z", 140.0, SugarType::AfterMeal),
    ];

    let series = aggregate(&readings, Granularity::Raw, &[MetricKey::Value]);

    assert_eq!(series, ChartSeries::Raw(readings));
}

#[test]
fn weekly_bucket_averages_its_members() {
    let readings = vec![
        pressure("p1", "2024-03-04T08:00:00Z", 80.0, 60.0, None),
        pressure("p2", "2024-03-05T08:00:00Z", 90.0, 62.0, None),
        pressure("p3", "2024-03-06T08:00:00Z", 100.0, 64.0, None),
    ];

    let points = averaged_points(aggregate(
        &readings,
        Granularity::Weekly,
        &[MetricKey::Systolic],
    ));

    assert_eq!(points.len(), 1);
    assert_eq!(points[0].values[&MetricKey::Systolic], 90.0);
    assert!(points[0].is_averaged);
}

#[test]
fn averages_round_half_up_to_one_decimal() {
    let readings = vec![
        sugar("s1", "2024-03-04T07:00:00Z", 2.0, SugarType::Fasting),
        sugar("s2", "2024-03-05T07:00:00Z", 2.5, SugarType::Fasting),
    ];

    let points = averaged_points(aggregate(
        &readings,
        Granularity::Weekly,
        &[MetricKey::Value],
    ));

    assert_eq!(points[0].values[&MetricKey::Value], 2.3);
}

#[test]
fn bucket_without_pulse_has_no_pulse_value() {
    let readings = vec![
        pressure("p1", "2024-03-04T08:00:00Z", 120.0, 80.0, None),
        pressure("p2", "2024-03-05T08:00:00Z", 124.0, 82.0, None),
    ];

    let points = averaged_points(aggregate(
        &readings,
        Granularity::Weekly,
        &[MetricKey::Systolic, MetricKey::Pulse],
    ));

    assert!(!points[0].values.contains_key(&MetricKey::Pulse));
    assert_eq!(points[0].values[&MetricKey::Systolic], 122.0);
}

#[test]
fn optional_metric_averages_only_present_members() {
    let readings = vec![
        pressure("p1", "2024-03-04T08:00:00Z", 120.0, 80.0, Some(70.0)),
        pressure("p2", "2024-03-05T08:00:00Z", 124.0, 82.0, None),
        pressure("p3", "2024-03-06T08:00:00Z", 128.0, 84.0, Some(64.0)),
    ];

    let points = averaged_points(aggregate(
        &readings,
        Granularity::Weekly,
        &[MetricKey::Pulse],
    ));

    assert_eq!(points[0].values[&MetricKey::Pulse], 67.0);
}

#[test]
fn non_finite_values_count_as_absent() {
    let readings = vec![
        pressure("p1", "2024-03-04T08:00:00Z", 120.0, 80.0, Some(f64::NAN)),
        pressure("p2", "2024-03-05T08:00:00Z", 124.0, 82.0, Some(66.0)),
    ];

    let points = averaged_points(aggregate(
        &readings,
        Granularity::Weekly,
        &[MetricKey::Pulse],
    ));

    assert_eq!(points[0].values[&MetricKey::Pulse], 66.0);
}

#[test]
fn iso_week_rolls_into_next_year_at_boundary() {
    assert_eq!(
        bucket_key(ts("2024-12-30T09:00:00Z"), Granularity::Weekly).as_deref(),
        Some("2025-W01")
    );

    let readings = vec![
        pressure("p1", "2024-12-30T09:00:00Z", 120.0, 80.0, None),
        pressure("p2", "2025-01-03T09:00:00Z", 124.0, 82.0, None),
    ];

    let points = averaged_points(aggregate(
        &readings,
        Granularity::Weekly,
        &[MetricKey::Systolic],
    ));

    assert_eq!(points.len(), 1);
    assert_eq!(points[0].values[&MetricKey::Systolic], 122.0);
}

#[test]
fn bucket_keys_follow_period_formats() {
    let at = ts("2024-03-09T12:00:00Z");

    assert_eq!(
        bucket_key(at, Granularity::Weekly).as_deref(),
        Some("2024-W10")
    );
    assert_eq!(
        bucket_key(at, Granularity::Monthly).as_deref(),
        Some("2024-3")
    );
    assert_eq!(bucket_key(at, Granularity::Yearly).as_deref(), Some("2024"));
    assert_eq!(bucket_key(at, Granularity::Raw), None);
}

#[test]
fn bucketing_partitions_readings_across_periods() {
    let readings = vec![
        pressure("p1", "2024-03-04T08:00:00Z", 118.0, 78.0, None),
        pressure("p2", "2024-03-09T08:00:00Z", 122.0, 80.0, None),
        pressure("p3", "2024-03-11T08:00:00Z", 126.0, 82.0, None),
        pressure("p4", "2024-03-19T08:00:00Z", 130.0, 84.0, None),
    ];

    let reading_keys: BTreeSet<String> = readings
        .iter()
        .map(|reading| {
            bucket_key(reading.timestamp, Granularity::Weekly).expect("có khóa tuần")
        })
        .collect();

    let points = averaged_points(aggregate(
        &readings,
        Granularity::Weekly,
        &[MetricKey::Systolic],
    ));
    let point_keys: BTreeSet<String> = points
        .iter()
        .map(|point| bucket_key(point.timestamp, Granularity::Weekly).expect("có khóa tuần"))
        .collect();

    assert_eq!(points.len(), point_keys.len());
    assert_eq!(point_keys, reading_keys);
}

#[test]
fn unsorted_input_produces_ascending_points() {
    let readings = vec![
        pressure("p1", "2024-03-19T08:00:00Z", 130.0, 84.0, None),
        pressure("p2", "2024-03-04T08:00:00Z", 118.0, 78.0, None),
        pressure("p3", "2024-03-11T08:00:00Z", 126.0, 82.0, None),
    ];

    let points = averaged_points(aggregate(
        &readings,
        Granularity::Weekly,
        &[MetricKey::Systolic],
    ));
    let times: Vec<_> = points.iter().map(|point| point.timestamp).collect();
    let mut sorted = times.clone();
    sorted.sort();

    assert_eq!(points.len(), 3);
    assert_eq!(times, sorted);
}

#[test]
fn empty_input_yields_empty_series() {
    let readings: Vec<PressureReading> = Vec::new();

    let series = aggregate(&readings, Granularity::Monthly, &[MetricKey::Systolic]);

    assert!(series.is_empty());
}

#[test]
fn single_reading_bucket_keeps_its_value() {
    let readings = vec![sugar("s1", "2024-07-01T07:00:00Z", 82.0, SugarType::Fasting)];

    let points = averaged_points(aggregate(
        &readings,
        Granularity::Yearly,
        &[MetricKey::Value],
    ));

    assert_eq!(points[0].values[&MetricKey::Value], 82.0);
    assert_eq!(points[0].timestamp, ts("2024-07-01T07:00:00Z"));
}

#[test]
fn sugar_filter_keeps_selected_kind_only() {
    let readings = vec![
        sugar("s1", "2024-03-04T07:00:00Z", 95.0, SugarType::Fasting),
        sugar("s2", "2024-03-04T19:30:00Z", 141.0, SugarType::AfterMeal),
        sugar("s3", "2024-03-05T07:00:00Z", 98.0, SugarType::Fasting),
    ];

    let filtered = filter_by_kind(&readings, Some(SugarType::Fasting));

    assert_eq!(filtered.len(), 2);
    assert!(filtered
        .iter()
        .all(|reading| reading.kind == SugarType::Fasting));
    assert_eq!(filter_by_kind(&readings, None), readings);
}

#[test]
fn bulk_entry_rounds_with_ceiling() {
    let entries = vec![
        PressureEntry {
            systolic: 121.0,
            diastolic: 79.0,
            pulse: Some(66.0),
        },
        PressureEntry {
            systolic: 118.0,
            diastolic: 78.0,
            pulse: None,
        },
    ];

    let merged = average_bulk_entry(&entries).expect("có kết quả gộp");

    assert_eq!(merged.systolic, 120.0);
    assert_eq!(merged.diastolic, 79.0);
    assert_eq!(merged.pulse, Some(66.0));
    assert_eq!(average_bulk_entry(&[]), None);
}

#[test]
fn unrecognized_granularity_is_rejected() {
    assert!(matches!(
        "weekly".parse::<Granularity>(),
        Ok(Granularity::Weekly)
    ));

    let err = "hourly"
        .parse::<Granularity>()
        .expect_err("phải bị từ chối");
    assert!(matches!(err, HealthError::InvalidGranularity(ref value) if value == "hourly"));
}

#[test]
fn unrecognized_metric_is_rejected() {
    assert!(matches!(
        "fat_mass".parse::<MetricKey>(),
        Ok(MetricKey::FatMass)
    ));

    let err = "bmi".parse::<MetricKey>().expect_err("phải bị từ chối");
    assert!(matches!(err, HealthError::InvalidMetric(ref value) if value == "bmi"));
}

#[test]
fn storage_payload_parses_with_camel_case_fields() {
    let payload = r#"{
        "pressureReadings": [
            {"id": "p1", "userId": "u1", "systolic": 120, "diastolic": 80, "pulse": null, "timestamp": "2024-03-04T08:00:00.000Z"}
        ],
        "sugarReadings": [
            {"id": "s1", "userId": "u1", "value": 95.5, "type": "before_meal", "timestamp": "2024-03-04T07:30:00.000Z"}
        ],
        "weightReadings": [
            {"id": "w1", "userId": "u1", "value": 70.5, "fatMass": 15.2, "fatPercentage": null, "muscleMass": null, "timestamp": "2024-03-04T06:00:00.000Z"}
        ]
    }"#;

    let data = parse_health_data(payload).expect("payload hợp lệ");

    assert_eq!(data.pressure_readings[0].systolic, 120.0);
    assert_eq!(data.pressure_readings[0].pulse, None);
    assert_eq!(data.sugar_readings[0].kind, SugarType::BeforeMeal);
    assert_eq!(data.weight_readings[0].fat_mass, Some(15.2));
    assert_eq!(data.weight_readings[0].muscle_mass, None);

    let err = parse_health_data("không phải json").expect_err("phải lỗi parse");
    assert!(matches!(err, HealthError::Parse(_)));
}
