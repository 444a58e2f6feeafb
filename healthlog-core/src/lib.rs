//! Kiểu dữ liệu lõi cho nhật ký sức khỏe gia đình và chuỗi biểu đồ.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Độ phân giải thời gian khi gộp dữ liệu cho biểu đồ.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Raw,
    Weekly,
    Monthly,
    Yearly,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Raw => "raw",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        };
        f.write_str(label)
    }
}

impl FromStr for Granularity {
    type Err = HealthError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "raw" => Ok(Self::Raw),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(HealthError::InvalidGranularity(other.to_string())),
        }
    }
}

/// Khóa chỉ số vẽ được trên biểu đồ; `Value` là đường huyết hoặc cân nặng
/// tổng tùy loại bản ghi.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    Systolic,
    Diastolic,
    Pulse,
    Value,
    FatMass,
    FatPercentage,
    MuscleMass,
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Systolic => "systolic",
            Self::Diastolic => "diastolic",
            Self::Pulse => "pulse",
            Self::Value => "value",
            Self::FatMass => "fat_mass",
            Self::FatPercentage => "fat_percentage",
            Self::MuscleMass => "muscle_mass",
        };
        f.write_str(label)
    }
}

impl FromStr for MetricKey {
    type Err = HealthError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "systolic" => Ok(Self::Systolic),
            "diastolic" => Ok(Self::Diastolic),
            "pulse" => Ok(Self::Pulse),
            "value" => Ok(Self::Value),
            "fat_mass" => Ok(Self::FatMass),
            "fat_percentage" => Ok(Self::FatPercentage),
            "muscle_mass" => Ok(Self::MuscleMass),
            other => Err(HealthError::InvalidMetric(other.to_string())),
        }
    }
}

/// Thời điểm đo đường huyết so với bữa ăn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SugarType {
    Fasting,
    BeforeMeal,
    AfterMeal,
    Random,
}

impl fmt::Display for SugarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Fasting => "fasting",
            Self::BeforeMeal => "before_meal",
            Self::AfterMeal => "after_meal",
            Self::Random => "random",
        };
        f.write_str(label)
    }
}

impl FromStr for SugarType {
    type Err = HealthError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "fasting" => Ok(Self::Fasting),
            "before_meal" => Ok(Self::BeforeMeal),
            "after_meal" => Ok(Self::AfterMeal),
            "random" => Ok(Self::Random),
            other => Err(HealthError::Parse(format!(
                "Loại đường huyết không hợp lệ: {other}"
            ))),
        }
    }
}

/// Một lần đo huyết áp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PressureReading {
    pub id: String,
    pub systolic: f64,
    pub diastolic: f64,
    #[serde(default)]
    pub pulse: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Một lần đo đường huyết.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SugarReading {
    pub id: String,
    pub value: f64,
    #[serde(rename = "type")]
    pub kind: SugarType,
    pub timestamp: DateTime<Utc>,
}

/// Một lần cân, kèm thành phần cơ thể nếu cân đo được.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeightReading {
    pub id: String,
    pub value: f64,
    #[serde(default)]
    pub fat_mass: Option<f64>,
    #[serde(default)]
    pub fat_percentage: Option<f64>,
    #[serde(default)]
    pub muscle_mass: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Toàn bộ dữ liệu tầng lưu trữ trả về cho một người dùng.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthData {
    #[serde(default)]
    pub pressure_readings: Vec<PressureReading>,
    #[serde(default)]
    pub sugar_readings: Vec<SugarReading>,
    #[serde(default)]
    pub weight_readings: Vec<WeightReading>,
}

/// Nguồn chỉ số có dấu thời gian; tầng gộp chỉ nhìn bản ghi qua trait này.
pub trait MetricRecord {
    /// Thời điểm ghi nhận bản ghi.
    fn recorded_at(&self) -> DateTime<Utc>;

    /// Giá trị của chỉ số nếu bản ghi có mang nó.
    fn metric(&self, key: MetricKey) -> Option<f64>;
}

impl MetricRecord for PressureReading {
    fn recorded_at(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn metric(&self, key: MetricKey) -> Option<f64> {
        match key {
            MetricKey::Systolic => Some(self.systolic),
            MetricKey::Diastolic => Some(self.diastolic),
            MetricKey::Pulse => self.pulse,
            _ => None,
        }
    }
}

impl MetricRecord for SugarReading {
    fn recorded_at(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn metric(&self, key: MetricKey) -> Option<f64> {
        match key {
            MetricKey::Value => Some(self.value),
            _ => None,
        }
    }
}

impl MetricRecord for WeightReading {
    fn recorded_at(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn metric(&self, key: MetricKey) -> Option<f64> {
        match key {
            MetricKey::Value => Some(self.value),
            MetricKey::FatMass => self.fat_mass,
            MetricKey::FatPercentage => self.fat_percentage,
            MetricKey::MuscleMass => self.muscle_mass,
            _ => None,
        }
    }
}

/// Một điểm đã gộp trung bình theo khoảng lịch. Chỉ số không có dữ liệu
/// trong khoảng thì vắng mặt khỏi `values`, không bao giờ là 0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedPoint {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub values: BTreeMap<MetricKey, f64>,
    pub is_averaged: bool,
}

/// Chênh lệch tuần-so-với-tuần của một chỉ số cân nặng; dương là tăng.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeltaPoint {
    pub timestamp: DateTime<Utc>,
    pub change: f64,
}

/// Chuỗi dữ liệu cho một biểu đồ: bản ghi thô giữ nguyên thứ tự và mọi
/// thuộc tính, hoặc các điểm đã gộp.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ChartSeries<T> {
    Raw(Vec<T>),
    Averaged(Vec<AggregatedPoint>),
}

impl<T> ChartSeries<T> {
    /// Số điểm trong chuỗi.
    pub fn len(&self) -> usize {
        match self {
            Self::Raw(items) => items.len(),
            Self::Averaged(points) => points.len(),
        }
    }

    /// Chuỗi không có điểm nào.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lỗi chung của tầng biểu đồ.
#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    #[error("Chế độ gộp không hợp lệ: {0}")]
    InvalidGranularity(String),
    #[error("Chỉ số không hợp lệ: {0}")]
    InvalidMetric(String),
    #[error("Không đọc được dữ liệu: {0}")]
    Parse(String),
}
