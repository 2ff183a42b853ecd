//! Builds the render instructions for each panel from its inputs alone

use thiserror::Error;
use tracing::{debug, info};

use crate::api::{QuoteError, QuoteSource};
use crate::config::ChartSize;
use crate::models::panel::{
    PREVIEW_ROWS, STOCK_CSV_MIME, STOCK_CSV_NAME, TIPS_PNG_MIME, TIPS_PNG_NAME,
};
use crate::models::{
    ChartImage, Download, Notice, Period, QuoteTable, StockPanel, TipsPanel, TipsTable, SYMBOL,
};
use crate::services::chart_service::{self, ChartError};
use crate::services::quote_service;
use crate::services::tips_service::{self, TipsError};
use crate::utils::Table;

/// Failures after the inputs were accepted
#[derive(Debug, Error)]
pub enum PanelError {
    #[error(transparent)]
    Tips(#[from] TipsError),
    #[error(transparent)]
    Chart(#[from] ChartError),
    #[error("CSV export failed: {0}")]
    Export(#[from] csv::Error),
    #[error("Chart rendering task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result of one stock panel run
pub enum StockOutcome {
    Ready(StockPanel),
    /// No table; only messages are shown
    Unavailable(Vec<Notice>),
}

/// Load quotes for the fixed symbol and build the stock panel
pub async fn stock_panel(
    source: &QuoteSource,
    period: Period,
    size: ChartSize,
) -> Result<StockOutcome, PanelError> {
    let loaded = quote_service::load_quotes(source, SYMBOL, period).await;
    let secret = source.secret().map(str::to_string);

    // Chart rendering is CPU bound
    tokio::task::spawn_blocking(move || stock_outcome(loaded, secret.as_deref(), size)).await?
}

/// Turn a load result into the panel, or into the failure notices
pub fn stock_outcome(
    loaded: Result<QuoteTable, QuoteError>,
    secret: Option<&str>,
    size: ChartSize,
) -> Result<StockOutcome, PanelError> {
    let table = match loaded {
        Ok(table) => table,
        Err(e) => {
            info!("Stock panel unavailable: {}", crate::utils::redact_secret(&e.to_string(), secret));
            return Ok(StockOutcome::Unavailable(quote_service::failure_notices(&e, secret)));
        }
    };

    let charts = vec![
        ChartImage {
            title: format!("📈 {} price", table.symbol),
            file_name: "price.png".to_string(),
            png: chart_service::price_chart(&table, size)?,
        },
        ChartImage {
            title: "📊 Trading volume".to_string(),
            file_name: "volume.png".to_string(),
            png: chart_service::volume_chart(&table, size)?,
        },
    ];
    let download = Download {
        file_name: STOCK_CSV_NAME.to_string(),
        mime: STOCK_CSV_MIME.to_string(),
        data: quote_service::to_csv(&table)?,
    };
    debug!("Stock panel ready: {} rows, {} charts", table.records.len(), charts.len());

    Ok(StockOutcome::Ready(StockPanel {
        preview: quote_preview(&table),
        table,
        charts,
        download,
    }))
}

pub fn quote_preview(table: &QuoteTable) -> Table {
    let format = if table.is_intraday() {
        "%Y-%m-%d %H:%M"
    } else {
        "%Y-%m-%d"
    };
    let mut preview = Table::new(&["date", "open", "high", "low", "close", "volume"]);
    for r in table.records.iter().take(PREVIEW_ROWS) {
        preview.add_row(vec![
            r.timestamp.format(format).to_string(),
            format!("{:.2}", r.open),
            format!("{:.2}", r.high),
            format!("{:.2}", r.low),
            format!("{:.2}", r.close),
            format!("{:.0}", r.volume),
        ]);
    }
    preview
}

pub fn tips_preview(table: &TipsTable) -> Table {
    let mut preview = Table::new(&["total_bill", "tip", "sex", "smoker", "day", "time", "size"]);
    for r in table.records.iter().take(PREVIEW_ROWS) {
        preview.add_row(vec![
            format!("{:.2}", r.total_bill),
            format!("{:.2}", r.tip),
            r.sex.clone(),
            r.smoker.clone(),
            r.day.clone(),
            r.time.clone(),
            r.size.to_string(),
        ]);
    }
    preview
}

/// Build the tips panel; `None` upload leaves the panel inactive
///
/// The upload is validated before any chart is drawn.
pub fn tips_panel(upload: Option<&[u8]>, size: ChartSize) -> Result<Option<TipsPanel>, PanelError> {
    let Some(data) = upload else {
        debug!("No tips upload, panel inactive");
        return Ok(None);
    };

    let table = tips_service::parse_tips_csv(data)?;
    info!("Rendering tips panel for {} records", table.len());

    let mean_tip_by_day = tips_service::mean_tip_by_day(&table);
    let correlation = tips_service::correlation(&table);
    let bar_png = chart_service::mean_bar_chart(&mean_tip_by_day, size)?;

    let charts = vec![
        ChartImage {
            title: "1️⃣ Tip vs total bill".to_string(),
            file_name: "tips_scatter.png".to_string(),
            png: chart_service::tips_scatter(&table, size)?,
        },
        ChartImage {
            title: "2️⃣ Distribution of tips".to_string(),
            file_name: "tips_histogram.png".to_string(),
            png: chart_service::tips_histogram(&table, size)?,
        },
        ChartImage {
            title: "3️⃣ Tips by day".to_string(),
            file_name: "tips_boxplot.png".to_string(),
            png: chart_service::tips_boxplot(&table, size)?,
        },
        ChartImage {
            title: "4️⃣ Correlation between variables".to_string(),
            file_name: "tips_correlation.png".to_string(),
            png: chart_service::correlation_heatmap(&correlation, size)?,
        },
        ChartImage {
            title: "5️⃣ Average tip by day".to_string(),
            file_name: "tips_mean_by_day.png".to_string(),
            png: bar_png.clone(),
        },
    ];

    Ok(Some(TipsPanel {
        preview: tips_preview(&table),
        table,
        charts,
        mean_tip_by_day,
        download: Download {
            file_name: TIPS_PNG_NAME.to_string(),
            mime: TIPS_PNG_MIME.to_string(),
            data: bar_png,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuoteRecord;
    use chrono::NaiveDate;

    fn unavailable(result: Result<StockOutcome, PanelError>) -> Vec<Notice> {
        match result {
            Ok(StockOutcome::Unavailable(notices)) => notices,
            Ok(StockOutcome::Ready(_)) => panic!("expected no charts"),
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    #[test]
    fn test_no_data_shows_notice_without_charts() {
        let notices = unavailable(stock_outcome(
            Err(QuoteError::NoData(Period::OneDay)),
            None,
            ChartSize::default(),
        ));
        assert!(matches!(&notices[0], Notice::Warning(m) if m.contains("No data")));
    }

    #[test]
    fn test_provider_error_returns_no_table() {
        let notices = unavailable(stock_outcome(
            Err(QuoteError::Provider("Invalid API call".into())),
            Some("KEY"),
            ChartSize::default(),
        ));
        assert!(matches!(&notices[0], Notice::Error(_)));
    }

    const SMALL: ChartSize = ChartSize {
        width: 480,
        height: 320,
    };

    fn daily_table(days: u32) -> QuoteTable {
        let records = (1..=days)
            .map(|d| QuoteRecord {
                timestamp: NaiveDate::from_ymd_opt(2024, 3, d)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
                open: 170.0 + d as f64,
                high: 172.0 + d as f64,
                low: 168.0 + d as f64,
                close: 171.0 + d as f64,
                volume: 1_000_000.0 * d as f64,
            })
            .collect();
        QuoteTable::new(SYMBOL, Period::OneMonth, records)
    }

    const TIPS: &str = "\
total_bill,tip,sex,smoker,day,time,size
16.99,1.01,Female,No,Sun,Dinner,2
10.34,1.66,Male,No,Sun,Dinner,3
21.01,3.5,Male,No,Sun,Dinner,3
20.65,3.35,Male,No,Sat,Dinner,3
17.92,4.08,Male,Yes,Sat,Dinner,2
27.2,4.0,Male,No,Thur,Lunch,4
8.77,2.0,Male,No,Sun,Dinner,2
15.04,1.96,Male,No,Fri,Lunch,2
14.78,3.23,Female,Yes,Thur,Lunch,2
";

    #[test]
    fn test_stock_panel_ready() {
        let table = daily_table(15);
        let panel = match stock_outcome(Ok(table), Some("KEY"), SMALL) {
            Ok(StockOutcome::Ready(panel)) => panel,
            Ok(StockOutcome::Unavailable(notices)) => panic!("unexpected notices: {:?}", notices),
            Err(e) => panic!("unexpected error: {}", e),
        };

        assert_eq!(panel.charts.len(), 2);
        for chart in &panel.charts {
            assert!(chart.png.starts_with(b"\x89PNG"), "{} is not a PNG", chart.file_name);
        }
        assert_eq!(panel.download.file_name, "apple_stock.csv");
        assert_eq!(panel.download.mime, "text/csv");
        assert!(panel.download.data.starts_with(b"date,open,high,low,close,volume\n"));
        assert_eq!(panel.preview.row_count(), PREVIEW_ROWS);
    }

    #[test]
    fn test_tips_panel_renders_five_charts() {
        let panel = tips_panel(Some(TIPS.as_bytes()), SMALL).unwrap().unwrap();

        assert_eq!(panel.charts.len(), 5);
        for chart in &panel.charts {
            assert!(chart.png.starts_with(b"\x89PNG"), "{} is not a PNG", chart.file_name);
        }
        assert_eq!(panel.download.file_name, "tips_analysis.png");
        assert_eq!(panel.download.mime, "image/png");
        assert_eq!(panel.charts.last().unwrap().png, panel.download.data);
        assert_eq!(panel.mean_tip_by_day.len(), 4);
        assert_eq!(panel.preview.row_count(), 9);
    }

    #[test]
    fn test_no_upload_leaves_tips_inactive() {
        let panel = tips_panel(None, ChartSize::default()).unwrap();
        assert!(panel.is_none());
    }

    #[test]
    fn test_missing_column_fails_before_charts() {
        let csv: &[u8] = b"total_bill,tip,sex,smoker,day,time\n16.99,1.01,Female,No,Sun,Dinner\n";
        let err = tips_panel(Some(csv), ChartSize::default()).err().unwrap();
        assert!(matches!(err, PanelError::Tips(TipsError::MissingColumn(ref c)) if c == "size"));
        assert_eq!(err.to_string(), "Missing required column: size");
    }

    #[test]
    fn test_quote_preview_limits_rows() {
        let records = (1..=15)
            .map(|d| QuoteRecord {
                timestamp: NaiveDate::from_ymd_opt(2024, 3, d)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
                open: 170.0,
                high: 171.0,
                low: 169.0,
                close: 170.5,
                volume: 1_000_000.0,
            })
            .collect();
        let table = QuoteTable::new(SYMBOL, Period::OneMonth, records);
        let preview = quote_preview(&table);
        assert_eq!(preview.row_count(), PREVIEW_ROWS);
        assert!(preview.render().contains("2024-03-01 | 170.00"));
    }
}
