//! Render instructions produced by one dashboard invocation

use crate::models::{QuoteTable, TipsTable};
use crate::utils::Table;

pub const STOCK_CSV_NAME: &str = "apple_stock.csv";
pub const STOCK_CSV_MIME: &str = "text/csv";
pub const TIPS_PNG_NAME: &str = "tips_analysis.png";
pub const TIPS_PNG_MIME: &str = "image/png";

/// Number of rows shown in a data preview
pub const PREVIEW_ROWS: usize = 10;

/// A rendered chart ready to be attached
#[derive(Debug, Clone)]
pub struct ChartImage {
    pub title: String,
    pub file_name: String,
    pub png: Vec<u8>,
}

/// A file offered for download
#[derive(Debug, Clone)]
pub struct Download {
    pub file_name: String,
    pub mime: String,
    pub data: Vec<u8>,
}

/// Output of the stock panel when data was loaded
pub struct StockPanel {
    pub table: QuoteTable,
    pub preview: Table,
    pub charts: Vec<ChartImage>,
    pub download: Download,
}

/// Output of the tips panel for an uploaded file
pub struct TipsPanel {
    pub table: TipsTable,
    pub preview: Table,
    pub charts: Vec<ChartImage>,
    pub mean_tip_by_day: Vec<(String, f64)>,
    pub download: Download,
}

/// A message shown in place of (or alongside) panel content
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Warning(String),
    Error(String),
}
