use chrono::{DateTime, Duration, Utc};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::config::ChartSize;
use crate::models::{QuoteRecord, QuoteTable, TipsTable};
use crate::services::stats_service::{self, CorrelationMatrix};

const HISTOGRAM_BINS: usize = 20;
const KDE_POINTS: usize = 200;

const PALETTE: [RGBColor; 4] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
];
const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
const MISSING_CELL: RGBColor = RGBColor(235, 235, 235);

/// Chart rendering errors
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("Failed to draw chart: {0}")]
    Draw(String),
    #[error("Not enough data to draw {0}")]
    NotEnoughData(&'static str),
    #[error("Chart file error: {0}")]
    Io(#[from] std::io::Error),
}

type Root<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Render onto a temporary PNG and return its bytes; the file is always removed
fn render_png<F>(size: ChartSize, draw: F) -> Result<Vec<u8>, ChartError>
where
    F: FnOnce(&Root<'_>) -> Result<(), String>,
{
    let temp_file: PathBuf =
        std::env::temp_dir().join(format!("finboard_chart_{}.png", Uuid::new_v4()));

    let drawn = (|| {
        let root = BitMapBackend::new(&temp_file, (size.width, size.height)).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| format!("Failed to fill canvas: {}", e))?;
        draw(&root)?;
        root.present()
            .map_err(|e| format!("Failed to render chart: {}", e))
    })();

    let result = match drawn {
        Ok(()) => std::fs::read(&temp_file).map_err(ChartError::from),
        Err(e) => Err(ChartError::Draw(e)),
    };

    if temp_file.exists() {
        if let Err(e) = std::fs::remove_file(&temp_file) {
            tracing::warn!("Failed to delete temporary chart file {:?}: {}", temp_file, e);
        }
    }
    result
}

fn utc(ts: chrono::NaiveDateTime) -> DateTime<Utc> {
    DateTime::<Utc>::from_naive_utc_and_offset(ts, Utc)
}

/// Value range with 10% padding; a flat range is widened so the axis is never empty
fn padded_range(min: f64, max: f64) -> (f64, f64) {
    let span = (max - min).max(1e-8);
    let padding = if max > min { span * 0.1 } else { max.abs().max(1.0) * 0.1 };
    (min - padding, max + padding)
}

fn time_range(table: &QuoteTable) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let first = utc(table.records.first()?.timestamp);
    let last = utc(table.records.last()?.timestamp);
    if first == last {
        Some((first - Duration::days(1), last + Duration::days(1)))
    } else {
        Some((first, last))
    }
}

/// Half the smallest gap between consecutive records, used as bar half-width
fn bar_half_width(table: &QuoteTable) -> Duration {
    let step = table
        .records
        .windows(2)
        .map(|w| w[1].timestamp - w[0].timestamp)
        .filter(|d| *d > Duration::zero())
        .min()
        .unwrap_or_else(|| Duration::days(1));
    step * 2 / 5
}

/// Map an axis position back to a category name when it sits on an integer
pub fn category_label(x: f64, labels: &[String]) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

/// Blue-white-red diverging scale over [-1, 1]
pub fn coolwarm(value: f64) -> RGBColor {
    const COLD: (f64, f64, f64) = (59.0, 76.0, 192.0);
    const MID: (f64, f64, f64) = (221.0, 221.0, 221.0);
    const WARM: (f64, f64, f64) = (180.0, 4.0, 38.0);

    let v = value.clamp(-1.0, 1.0);
    let (from, to, t) = if v < 0.0 { (MID, COLD, -v) } else { (MID, WARM, v) };
    let lerp = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    RGBColor(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}

/// Open/high/low/close lines over time, close emphasised
pub fn price_chart(table: &QuoteTable, size: ChartSize) -> Result<Vec<u8>, ChartError> {
    let (x_min, x_max) = time_range(table).ok_or(ChartError::NotEnoughData("price chart"))?;
    let min_price = table
        .records
        .iter()
        .map(|r| r.low.min(r.open).min(r.close))
        .fold(f64::INFINITY, f64::min);
    let max_price = table
        .records
        .iter()
        .map(|r| r.high.max(r.open).max(r.close))
        .fold(f64::NEG_INFINITY, f64::max);
    let (y_min, y_max) = padded_range(min_price, max_price);

    let lines: [(&str, RGBColor, u32, fn(&QuoteRecord) -> f64); 4] = [
        ("Open", PALETTE[0], 1, |r| r.open),
        ("High", PALETTE[2], 1, |r| r.high),
        ("Low", PALETTE[3], 1, |r| r.low),
        ("Close", BLACK, 3, |r| r.close),
    ];

    render_png(size, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(
                format!("{} price ({})", table.symbol, table.period),
                ("sans-serif", 30.0).into_font(),
            )
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(|e| format!("Failed to build chart: {}", e))?;

        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc("Price ($)")
            .draw()
            .map_err(|e| format!("Failed to draw mesh: {}", e))?;

        for (label, color, width, value) in lines {
            chart
                .draw_series(LineSeries::new(
                    table.records.iter().map(|r| (utc(r.timestamp), value(r))),
                    color.stroke_width(width),
                ))
                .map_err(|e| format!("Failed to draw {} line: {}", label, e))?
                .label(label)
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(width))
                });
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(|e| format!("Failed to draw legend: {}", e))
    })
}

/// Traded volume as bars
pub fn volume_chart(table: &QuoteTable, size: ChartSize) -> Result<Vec<u8>, ChartError> {
    let (x_min, x_max) = time_range(table).ok_or(ChartError::NotEnoughData("volume chart"))?;
    let half = bar_half_width(table);
    let max_volume = table
        .records
        .iter()
        .map(|r| r.volume)
        .fold(0.0, f64::max)
        .max(1.0);

    render_png(size, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(
                format!("{} volume ({})", table.symbol, table.period),
                ("sans-serif", 30.0).into_font(),
            )
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(90)
            .build_cartesian_2d((x_min - half)..(x_max + half), 0.0..max_volume * 1.1)
            .map_err(|e| format!("Failed to build chart: {}", e))?;

        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc("Volume")
            .draw()
            .map_err(|e| format!("Failed to draw mesh: {}", e))?;

        chart
            .draw_series(table.records.iter().map(|r| {
                let t = utc(r.timestamp);
                Rectangle::new([(t - half, 0.0), (t + half, r.volume)], SKY_BLUE.filled())
            }))
            .map_err(|e| format!("Failed to draw bars: {}", e))?
            .label("Volume")
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], SKY_BLUE.filled()));

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(|e| format!("Failed to draw legend: {}", e))
    })
}

fn distinct(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = values.collect();
    out.sort();
    out.dedup();
    out
}

/// Tip against total bill, coloured by smoker
pub fn tips_scatter(table: &TipsTable, size: ChartSize) -> Result<Vec<u8>, ChartError> {
    if table.is_empty() {
        return Err(ChartError::NotEnoughData("scatter plot"));
    }
    let bills: Vec<f64> = table.records.iter().map(|r| r.total_bill).collect();
    let tips = table.tips();
    let (x_min, x_max) = padded_range(
        bills.iter().copied().fold(f64::INFINITY, f64::min),
        bills.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    );
    let (y_min, y_max) = padded_range(
        tips.iter().copied().fold(f64::INFINITY, f64::min),
        tips.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    );
    let groups = distinct(table.records.iter().map(|r| r.smoker.clone()));

    render_png(size, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption("Tip vs total bill", ("sans-serif", 30.0).into_font())
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(|e| format!("Failed to build chart: {}", e))?;

        chart
            .configure_mesh()
            .x_desc("total_bill")
            .y_desc("tip")
            .draw()
            .map_err(|e| format!("Failed to draw mesh: {}", e))?;

        for (i, group) in groups.iter().enumerate() {
            let color = PALETTE[i % PALETTE.len()];
            chart
                .draw_series(
                    table
                        .records
                        .iter()
                        .filter(|r| &r.smoker == group)
                        .map(|r| Circle::new((r.total_bill, r.tip), 4, color.filled())),
                )
                .map_err(|e| format!("Failed to draw points: {}", e))?
                .label(format!("smoker = {}", group))
                .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(|e| format!("Failed to draw legend: {}", e))
    })
}

/// Distribution of tips: 20 bins plus a kernel density curve scaled to counts
pub fn tips_histogram(table: &TipsTable, size: ChartSize) -> Result<Vec<u8>, ChartError> {
    let tips = table.tips();
    let bins = stats_service::histogram(&tips, HISTOGRAM_BINS);
    let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
        return Err(ChartError::NotEnoughData("histogram"));
    };
    let (x_min, x_max) = (first.start, last.end);
    let bin_width = first.end - first.start;

    let grid: Vec<f64> = (0..KDE_POINTS)
        .map(|i| x_min + (x_max - x_min) * i as f64 / (KDE_POINTS - 1) as f64)
        .collect();
    let scale = tips.len() as f64 * bin_width;
    let curve: Vec<(f64, f64)> = grid
        .iter()
        .zip(stats_service::kde(&tips, &grid))
        .map(|(x, d)| (*x, d * scale))
        .collect();

    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0) as f64;
    let max_curve = curve.iter().map(|p| p.1).fold(0.0, f64::max);
    let y_max = max_count.max(max_curve).max(1.0) * 1.1;

    render_png(size, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption("Distribution of tips", ("sans-serif", 30.0).into_font())
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_min..x_max, 0.0..y_max)
            .map_err(|e| format!("Failed to build chart: {}", e))?;

        chart
            .configure_mesh()
            .x_desc("tip")
            .y_desc("Count")
            .draw()
            .map_err(|e| format!("Failed to draw mesh: {}", e))?;

        chart
            .draw_series(bins.iter().map(|b| {
                Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], PALETTE[0].mix(0.5).filled())
            }))
            .map_err(|e| format!("Failed to draw bins: {}", e))?;
        chart
            .draw_series(bins.iter().map(|b| {
                Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], PALETTE[0].stroke_width(1))
            }))
            .map_err(|e| format!("Failed to draw bin borders: {}", e))?;

        chart
            .draw_series(LineSeries::new(curve.iter().copied(), PALETTE[0].stroke_width(2)))
            .map_err(|e| format!("Failed to draw density: {}", e))?;
        Ok(())
    })
}

/// Tips per day, split by sex
pub fn tips_boxplot(table: &TipsTable, size: ChartSize) -> Result<Vec<u8>, ChartError> {
    if table.is_empty() {
        return Err(ChartError::NotEnoughData("boxplot"));
    }
    let days = distinct(table.records.iter().map(|r| r.day.clone()));
    let sexes = distinct(table.records.iter().map(|r| r.sex.clone()));
    let slot = 0.8 / sexes.len() as f64;

    // (sex index, x centre, stats)
    let mut boxes = Vec::new();
    for (i, day) in days.iter().enumerate() {
        for (j, sex) in sexes.iter().enumerate() {
            let values: Vec<f64> = table
                .records
                .iter()
                .filter(|r| &r.day == day && &r.sex == sex)
                .map(|r| r.tip)
                .collect();
            if let Some(stats) = stats_service::box_stats(&values) {
                let center = i as f64 - 0.4 + slot * (j as f64 + 0.5);
                boxes.push((j, center, stats));
            }
        }
    }

    let tips = table.tips();
    let (y_min, y_max) = padded_range(
        tips.iter().copied().fold(f64::INFINITY, f64::min),
        tips.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    );
    let half = slot * 0.4;

    render_png(size, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption("Tips by day", ("sans-serif", 30.0).into_font())
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5..(days.len() as f64 - 0.5), y_min..y_max)
            .map_err(|e| format!("Failed to build chart: {}", e))?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(days.len())
            .x_label_formatter(&|x| category_label(*x, &days))
            .x_desc("day")
            .y_desc("tip")
            .draw()
            .map_err(|e| format!("Failed to draw mesh: {}", e))?;

        for (j, sex) in sexes.iter().enumerate() {
            let color = PALETTE[j % PALETTE.len()];
            chart
                .draw_series(boxes.iter().filter(|b| b.0 == j).map(|(_, c, s)| {
                    Rectangle::new([(c - half, s.q1), (c + half, s.q3)], color.mix(0.7).filled())
                }))
                .map_err(|e| format!("Failed to draw boxes: {}", e))?
                .label(format!("sex = {}", sex))
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], color.filled()));
        }

        for (_, c, s) in &boxes {
            let c = *c;
            let segments = vec![
                vec![(c - half, s.median), (c + half, s.median)],
                vec![(c, s.q3), (c, s.whisker_high)],
                vec![(c, s.q1), (c, s.whisker_low)],
                vec![(c - half / 2.0, s.whisker_high), (c + half / 2.0, s.whisker_high)],
                vec![(c - half / 2.0, s.whisker_low), (c + half / 2.0, s.whisker_low)],
            ];
            chart
                .draw_series(segments.into_iter().map(|p| PathElement::new(p, BLACK.stroke_width(1))))
                .map_err(|e| format!("Failed to draw whiskers: {}", e))?;
            chart
                .draw_series(
                    s.outliers
                        .iter()
                        .map(|v| Circle::new((c, *v), 3, BLACK.stroke_width(1))),
                )
                .map_err(|e| format!("Failed to draw outliers: {}", e))?;
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(|e| format!("Failed to draw legend: {}", e))
    })
}

/// Annotated correlation heatmap, first column at the top-left
pub fn correlation_heatmap(matrix: &CorrelationMatrix, size: ChartSize) -> Result<Vec<u8>, ChartError> {
    let n = matrix.labels.len();
    if n == 0 {
        return Err(ChartError::NotEnoughData("correlation heatmap"));
    }
    let labels = &matrix.labels;
    let y_labels: Vec<String> = labels.iter().rev().cloned().collect();
    let extent = n as f64 - 0.5;

    render_png(size, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption("Correlation between variables", ("sans-serif", 30.0).into_font())
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(110)
            .build_cartesian_2d(-0.5..extent, -0.5..extent)
            .map_err(|e| format!("Failed to build chart: {}", e))?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(n)
            .y_labels(n)
            .x_label_formatter(&|x| category_label(*x, labels))
            .y_label_formatter(&|y| category_label(*y, &y_labels))
            .label_style(("sans-serif", 13))
            .draw()
            .map_err(|e| format!("Failed to draw mesh: {}", e))?;

        let cells: Vec<(usize, usize, Option<f64>)> = matrix
            .values
            .iter()
            .enumerate()
            .flat_map(|(row, values)| {
                values.iter().enumerate().map(move |(col, value)| (row, col, *value))
            })
            .collect();

        chart
            .draw_series(cells.iter().map(|(row, col, value)| {
                let x = *col as f64;
                let y = (n - 1 - row) as f64;
                let color = value.map(coolwarm).unwrap_or(MISSING_CELL);
                Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], color.filled())
            }))
            .map_err(|e| format!("Failed to draw cells: {}", e))?;

        let annotation = ("sans-serif", 14)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center));
        chart
            .draw_series(cells.iter().filter_map(|(row, col, value)| {
                value.map(|v| {
                    Text::new(
                        format!("{:.2}", v),
                        (*col as f64, (n - 1 - row) as f64),
                        annotation.clone(),
                    )
                })
            }))
            .map_err(|e| format!("Failed to draw annotations: {}", e))?;
        Ok(())
    })
}

/// Bar per group, e.g. mean tip by day
pub fn mean_bar_chart(means: &[(String, f64)], size: ChartSize) -> Result<Vec<u8>, ChartError> {
    if means.is_empty() {
        return Err(ChartError::NotEnoughData("bar chart"));
    }
    let names: Vec<String> = means.iter().map(|(k, _)| k.clone()).collect();
    let max_value = means.iter().map(|(_, v)| *v).fold(0.0, f64::max).max(1e-8);

    render_png(size, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption("Average tip by day", ("sans-serif", 30.0).into_font())
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d((0u32..names.len() as u32).into_segmented(), 0.0..max_value * 1.15)
            .map_err(|e| format!("Failed to build chart: {}", e))?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc("day")
            .y_desc("tip")
            .x_label_formatter(&|v| match v {
                SegmentValue::CenterOf(i) => names.get(*i as usize).cloned().unwrap_or_default(),
                _ => String::new(),
            })
            .draw()
            .map_err(|e| format!("Failed to draw mesh: {}", e))?;

        chart
            .draw_series(
                Histogram::vertical(&chart)
                    .style(PALETTE[0].mix(0.8).filled())
                    .margin(20)
                    .data(means.iter().enumerate().map(|(i, (_, v))| (i as u32, *v))),
            )
            .map_err(|e| format!("Failed to draw bars: {}", e))?;
        Ok(())
    })
}
