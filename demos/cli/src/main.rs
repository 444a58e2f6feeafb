use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use healthlog_charts::{aggregate, parse_health_data, weekly_delta};
use healthlog_core::{ChartSeries, Granularity, MetricKey};

#[derive(Parser, Debug)]
#[command(
    name = "healthlog-cli",
    about = "Tóm tắt nhật ký sức khỏe từ file JSON."
)]
struct Args {
    /// Đường dẫn tới file JSON dữ liệu sức khỏe.
    #[arg(short, long)]
    input: PathBuf,

    /// Chế độ gộp: raw, weekly, monthly, yearly.
    #[arg(short, long, default_value = "weekly")]
    granularity: String,

    /// In kết quả dưới dạng JSON thay vì bảng tóm tắt.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let payload = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Không đọc được file {:?}", args.input))?;

    let data = parse_health_data(&payload)?;
    let granularity: Granularity = args.granularity.parse()?;

    let pressure = aggregate(
        &data.pressure_readings,
        granularity,
        &[MetricKey::Systolic, MetricKey::Diastolic, MetricKey::Pulse],
    );
    let sugar = aggregate(&data.sugar_readings, granularity, &[MetricKey::Value]);
    let weight = aggregate(
        &data.weight_readings,
        granularity,
        &[
            MetricKey::Value,
            MetricKey::FatMass,
            MetricKey::FatPercentage,
            MetricKey::MuscleMass,
        ],
    );
    let changes = weekly_delta(&data.weight_readings, MetricKey::Value);

    if args.json {
        let output = serde_json::json!({
            "granularity": granularity,
            "pressure": pressure,
            "sugar": sugar,
            "weight": weight,
            "weight_change": changes,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "Huyết áp: {} bản ghi | Đường huyết: {} | Cân nặng: {}",
        data.pressure_readings.len(),
        data.sugar_readings.len(),
        data.weight_readings.len()
    );

    print_series("Huyết áp", &pressure);
    print_series("Đường huyết", &sugar);
    print_series("Cân nặng", &weight);

    println!("Biến động cân nặng theo tuần:");
    if changes.is_empty() {
        println!("  (chưa đủ hai tuần có dữ liệu)");
    }
    for delta in &changes {
        println!(
            "  {}  {:+.2} kg",
            delta.timestamp.format("%Y-%m-%d"),
            delta.change
        );
    }

    Ok(())
}

fn print_series<T>(label: &str, series: &ChartSeries<T>) {
    match series {
        ChartSeries::Raw(items) => println!("{label}: {} điểm thô", items.len()),
        ChartSeries::Averaged(points) => {
            println!("{label}: {} điểm đã gộp", points.len());
            for point in points {
                let values = point
                    .values
                    .iter()
                    .map(|(key, value)| format!("{key}={value}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("  {}  {}", point.timestamp.format("%Y-%m-%d"), values);
            }
        }
    }
}
