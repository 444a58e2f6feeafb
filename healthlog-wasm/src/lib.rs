//! Cầu nối WASM <-> JavaScript cho tầng biểu đồ, trung lập framework.

use healthlog_charts::{aggregate, filter_by_kind, weekly_delta};
use healthlog_core::{
    Granularity, HealthError, MetricKey, PressureReading, SugarReading, SugarType, WeightReading,
};
use serde::Serialize;
use serde_wasm_bindgen::from_value;
use wasm_bindgen::prelude::*;

/// Chuỗi huyết áp đã gộp theo chế độ được chọn.
#[wasm_bindgen]
pub fn pressure_series(readings: JsValue, granularity: &str) -> Result<JsValue, JsValue> {
    install_panic_hook();

    let readings: Vec<PressureReading> = from_value(readings)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được danh sách huyết áp: {err}")))?;
    let granularity = parse_granularity(granularity)?;

    let series = aggregate(
        &readings,
        granularity,
        &[MetricKey::Systolic, MetricKey::Diastolic],
    );
    to_js(&series)
}

/// Chuỗi đường huyết đã gộp; `filter` nhận "all" hoặc một loại đo.
#[wasm_bindgen]
pub fn sugar_series(
    readings: JsValue,
    granularity: &str,
    filter: Option<String>,
) -> Result<JsValue, JsValue> {
    install_panic_hook();

    let readings: Vec<SugarReading> = from_value(readings)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được danh sách đường huyết: {err}")))?;
    let granularity = parse_granularity(granularity)?;
    let filter = parse_sugar_filter(filter.as_deref())?;

    let filtered = filter_by_kind(&readings, filter);
    let series = aggregate(&filtered, granularity, &[MetricKey::Value]);
    to_js(&series)
}

/// Chuỗi cân nặng đã gộp theo chế độ được chọn.
#[wasm_bindgen]
pub fn weight_series(readings: JsValue, granularity: &str) -> Result<JsValue, JsValue> {
    install_panic_hook();

    let readings: Vec<WeightReading> = from_value(readings)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được danh sách cân nặng: {err}")))?;
    let granularity = parse_granularity(granularity)?;

    let series = aggregate(&readings, granularity, &[MetricKey::Value]);
    to_js(&series)
}

/// Biến động tuần-so-với-tuần của một chỉ số cân nặng; mặc định là cân
/// nặng tổng.
#[wasm_bindgen]
pub fn weight_change_series(readings: JsValue, metric: Option<String>) -> Result<JsValue, JsValue> {
    install_panic_hook();

    let readings: Vec<WeightReading> = from_value(readings)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được danh sách cân nặng: {err}")))?;
    let metric = match metric.as_deref() {
        None => MetricKey::Value,
        Some(value) => parse_weight_metric(value)?,
    };

    let deltas = weekly_delta(&readings, metric);
    to_js(&deltas)
}

fn install_panic_hook() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

fn parse_granularity(value: &str) -> Result<Granularity, JsValue> {
    value
        .parse::<Granularity>()
        .map_err(|err| JsValue::from_str(&err.to_string()))
}

fn parse_sugar_filter(value: Option<&str>) -> Result<Option<SugarType>, JsValue> {
    match value {
        None | Some("all") => Ok(None),
        Some(other) => other
            .parse::<SugarType>()
            .map(Some)
            .map_err(|err| JsValue::from_str(&err.to_string())),
    }
}

fn parse_weight_metric(value: &str) -> Result<MetricKey, JsValue> {
    let key = value
        .parse::<MetricKey>()
        .map_err(|err| JsValue::from_str(&err.to_string()))?;

    match key {
        MetricKey::Value | MetricKey::FatMass | MetricKey::FatPercentage | MetricKey::MuscleMass => {
            Ok(key)
        }
        other => Err(JsValue::from_str(
            &HealthError::InvalidMetric(other.to_string()).to_string(),
        )),
    }
}

// json_compatible để map chỉ số thành object JS thường, không phải Map.
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|err| JsValue::from_str(&format!("Không serialize chuỗi: {err}")))
}
